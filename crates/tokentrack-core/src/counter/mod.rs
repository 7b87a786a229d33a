//! Counter store: the single JSON file holding the latest token count.

pub mod file;

pub use file::{default_counter_path, CounterFile, CounterRecord, COUNTER_FILE_NAME};

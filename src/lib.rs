//! tokentrack: terminal widget showing token usage against a fixed budget.
//!
//! The sampling and budget logic lives in `tokentrack-core`; this crate holds
//! the terminal UI.

pub mod ui;

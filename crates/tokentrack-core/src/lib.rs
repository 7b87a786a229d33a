//! Core library for tokentrack.
//!
//! Samples a running token count from a gateway or a counter file, derives
//! budget usage from it, and feeds the result to a view over a channel.

pub mod config;
pub mod counter;
pub mod refresh;
pub mod source;
pub mod usage;

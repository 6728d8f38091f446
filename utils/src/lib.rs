//! Shared utilities for the relay verification bot.

pub mod time;

pub use time::{format_duration, format_latency};

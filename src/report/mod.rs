//! Run reporting: JSONL log and console output.

#[cfg(feature = "console")]
pub mod console;
pub mod jsonl;

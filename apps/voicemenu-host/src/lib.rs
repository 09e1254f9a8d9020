//! VoiceMenu host process.
//!
//! Thin embedding layer around bootkit: CLI parsing, configuration load,
//! logging init, the start/stop lifecycle hooks, and signal handling.

pub mod cli;
pub mod runtime;
pub mod signal;

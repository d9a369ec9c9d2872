//! overblur Common Utilities
//!
//! Shared infrastructure for all overblur crates:
//! - Error types and result aliases
//! - Timecode parsing and formatting for scan windows
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod timecode;

pub use config::*;
pub use error::*;
pub use timecode::*;

//! Domain model for hotspot
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - The raw sample model shared by every session and the analysis
//! - Structured error handling

pub mod errors;
pub mod sample;
pub mod types;

// Re-export common types for convenience
pub use sample::{Frame, Sample, BLOCKED_EVENT, UNKNOWN};
pub use types::{CpuId, Pid, StackId};

pub use errors::{ConfigError, HotspotError, SessionError};

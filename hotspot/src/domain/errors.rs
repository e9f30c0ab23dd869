//! Structured error types for hotspot
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::Pid;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid run parameters, rejected before any session is opened
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),

    #[error("count must be a positive integer")]
    ZeroCount,

    #[error("blocked sample flag must be 0 or 1, got {0}")]
    InvalidBlockedFlag(u8),

    #[error("unknown event \"{0}\" (expected one of: {1})")]
    UnknownEvent(String, &'static str),

    #[error("sampling frequency must be greater than zero")]
    ZeroFrequency,
}

/// Failure reported by a sampling session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("eBPF object not found at {} (build it with: cargo xtask build-ebpf)", .0.display())]
    ObjectNotFound(PathBuf),

    #[error("{0} program not found in eBPF object")]
    ProgramNotFound(&'static str),

    #[error("{0} map not found in eBPF object")]
    MapNotFound(&'static str),

    #[error("Process {0} not found")]
    ProcessGone(Pid),

    #[error("cannot {op} a session that is {state}")]
    InvalidState { op: &'static str, state: &'static str },

    #[error("replay exhausted after {0} batches")]
    ReplayExhausted(usize),

    #[error(transparent)]
    Ebpf(#[from] aya::EbpfError),

    #[error(transparent)]
    Map(#[from] aya::maps::MapError),

    #[error(transparent)]
    Program(#[from] aya::programs::ProgramError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors that end a profiling run
#[derive(Error, Debug)]
pub enum HotspotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open sampling session: {0}")]
    SessionOpen(#[source] SessionError),

    #[error("failed to enable sampling session: {0}")]
    SessionEnable(#[source] SessionError),

    #[error("read failed in cycle {cycle}: {source}")]
    Read {
        cycle: u32,
        #[source]
        source: SessionError,
    },

    #[error("failed to launch {}: {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

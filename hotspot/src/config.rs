//! Polling parameters

use crate::domain::ConfigError;
use std::time::Duration;

/// How often and how many times the driver reads the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep before each read
    pub interval: Duration,
    /// Number of read cycles
    pub count: u32,
}

impl PollConfig {
    /// # Errors
    /// `InvalidInterval` unless `interval_secs` is finite and > 0,
    /// `ZeroCount` if `count` is 0
    pub fn new(interval_secs: f64, count: u32) -> Result<Self, ConfigError> {
        Ok(Self { interval: parse_interval(interval_secs)?, count: parse_count(count)? })
    }
}

/// Validate an interval given in (fractional) seconds
///
/// # Errors
/// `InvalidInterval` unless the value is finite and > 0
pub fn parse_interval(secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::InvalidInterval(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidInterval(secs))
}

/// # Errors
/// `ZeroCount` if `count` is 0
pub fn parse_count(count: u32) -> Result<u32, ConfigError> {
    if count == 0 {
        Err(ConfigError::ZeroCount)
    } else {
        Ok(count)
    }
}

/// The blocked-sample flag is `0` or `1`
///
/// # Errors
/// `InvalidBlockedFlag` for anything else
pub fn parse_blocked_flag(flag: u8) -> Result<bool, ConfigError> {
    match flag {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ConfigError::InvalidBlockedFlag(other)),
    }
}

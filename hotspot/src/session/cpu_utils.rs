//! CPU utility functions
//!
//! Utilities for querying CPU information from /sys filesystem.

use std::fs;
use std::io;
use std::num::ParseIntError;

use crate::domain::{CpuId, SessionError};

const ONLINE_CPUS: &str = "/sys/devices/system/cpu/online";

/// Parse a kernel CPU list like "0-3" or "0-3,8-11"
///
/// # Errors
/// Returns an error if an entry is not a number or a range of numbers
pub fn parse_cpu_list(list: &str) -> Result<Vec<CpuId>, ParseIntError> {
    let mut cpus = Vec::new();

    for range in list.trim().split(',').filter(|r| !r.is_empty()) {
        if let Some((start, end)) = range.split_once('-') {
            let start: u32 = start.parse()?;
            let end: u32 = end.parse()?;
            cpus.extend((start..=end).map(CpuId));
        } else {
            cpus.push(CpuId(range.parse()?));
        }
    }

    Ok(cpus)
}

/// Get list of online CPU IDs from /sys/devices/system/cpu/online
///
/// # Errors
/// Returns an error if the file cannot be read or parsed
pub fn online_cpus() -> Result<Vec<CpuId>, SessionError> {
    let content = fs::read_to_string(ONLINE_CPUS)?;
    parse_cpu_list(&content).map_err(|e| {
        SessionError::Io(io::Error::new(io::ErrorKind::InvalidData, format!("{ONLINE_CPUS}: {e}")))
    })
}

//! Domain types providing compile-time safety and self-documentation
//!
//! Newtype wrappers keep a process id, a CPU number and a kernel stack id
//! from being passed where another one is expected.

use std::fmt;

/// Process ID (TGID) of the profiled target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(pub i32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

impl From<i32> for Pid {
    fn from(pid: i32) -> Self {
        Pid(pid)
    }
}

impl Pid {
    /// Value written to the eBPF `CONFIG` map
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn as_config_value(self) -> u64 {
        u64::from(self.0 as u32)
    }
}

/// CPU ID (0, 1, 2, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuId(pub u32);

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU:{}", self.0)
    }
}

/// Stack trace ID from eBPF
///
/// Negative values are the error code of a failed `bpf_get_stackid()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackId(pub i64);

impl StackId {
    /// Map key for `STACK_TRACES`, `None` for failed captures
    #[must_use]
    pub fn map_key(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }
}

//! Sampling sessions
//!
//! A session produces batches of raw [`Sample`]s for one target process.
//! The polling driver only sees the two traits below; the concrete sources
//! are:
//!
//! - [`EbpfBackend`] - perf_event sampling through aya (needs root)
//! - [`ReplayBackend`] - recorded batches read from a JSON file
//!
//! Lifecycle: `open` → `enable` → `read`* → `disable` → `close`.

pub mod cpu_utils;
pub mod ebpf;
pub mod replay;

pub use cpu_utils::online_cpus;
pub use ebpf::{EbpfBackend, EbpfSession, DEFAULT_OBJECT_PATH};
pub use replay::{ReplayBackend, ReplayFile, ReplaySession};

use crate::domain::{ConfigError, Pid, Sample, SessionError};
use log::info;
use std::fmt;
use std::str::FromStr;

/// Default sampling frequency in Hz
pub const DEFAULT_FREQUENCY: u64 = 4000;

/// Something that can open sampling sessions
pub trait SamplingBackend {
    type Session: SamplingSession;

    /// Prepare a session for `config`. Nothing is sampled until `enable`.
    ///
    /// # Errors
    /// Any failure here is fatal to the run
    fn open(&mut self, config: &SessionConfig) -> Result<Self::Session, SessionError>;
}

/// An open sampling session, exclusively owned by its caller
pub trait SamplingSession {
    /// Start accruing samples.
    ///
    /// # Errors
    /// Returns an error if sampling cannot be started
    fn enable(&mut self) -> Result<(), SessionError>;

    /// Take every sample accrued since the previous read (or since `enable`).
    ///
    /// # Errors
    /// Returns an error if the source can no longer deliver samples
    fn read(&mut self) -> Result<Vec<Sample>, SessionError>;

    /// Stop accruing samples.
    ///
    /// # Errors
    /// Returns an error if sampling could not be stopped cleanly
    fn disable(&mut self) -> Result<(), SessionError>;

    /// Release the session.
    ///
    /// # Errors
    /// Returns an error if resources could not be released cleanly
    fn close(self) -> Result<(), SessionError>;
}

/// PMU event a session samples on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PmuEvent {
    #[default]
    Cycles,
    Instructions,
    CacheReferences,
    CacheMisses,
    BranchMisses,
    CpuClock,
    TaskClock,
}

const EVENT_NAMES: &str = "cycles, instructions, cache-references, cache-misses, branch-misses, cpu-clock, task-clock";

impl PmuEvent {
    pub const ALL: [PmuEvent; 7] = [
        PmuEvent::Cycles,
        PmuEvent::Instructions,
        PmuEvent::CacheReferences,
        PmuEvent::CacheMisses,
        PmuEvent::BranchMisses,
        PmuEvent::CpuClock,
        PmuEvent::TaskClock,
    ];

    /// Event name as it appears on samples and on the command line
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PmuEvent::Cycles => "cycles",
            PmuEvent::Instructions => "instructions",
            PmuEvent::CacheReferences => "cache-references",
            PmuEvent::CacheMisses => "cache-misses",
            PmuEvent::BranchMisses => "branch-misses",
            PmuEvent::CpuClock => "cpu-clock",
            PmuEvent::TaskClock => "task-clock",
        }
    }

    /// Hardware counter (as opposed to a kernel software clock)
    #[must_use]
    pub fn is_hardware(self) -> bool {
        !matches!(self, PmuEvent::CpuClock | PmuEvent::TaskClock)
    }
}

impl fmt::Display for PmuEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PmuEvent {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PmuEvent::ALL
            .into_iter()
            .find(|event| event.name() == s)
            .ok_or_else(|| ConfigError::UnknownEvent(s.to_string(), EVENT_NAMES))
    }
}

/// What a session samples and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub pid: Pid,
    pub event: PmuEvent,
    /// Samples per second per CPU
    pub frequency: u64,
    /// Also produce off-CPU samples
    pub blocked_sample: bool,
    /// Capture user call stacks. Always on for hotspot reports.
    pub call_stack: bool,
}

impl SessionConfig {
    /// Validated session configuration.
    ///
    /// With `blocked_sample` the on-CPU event becomes `cpu-clock`, so on-CPU
    /// and off-CPU weights are both nanoseconds.
    ///
    /// # Errors
    /// `ZeroFrequency` if `frequency` is 0
    pub fn new(pid: Pid, event: PmuEvent, frequency: u64, blocked_sample: bool) -> Result<Self, ConfigError> {
        if frequency == 0 {
            return Err(ConfigError::ZeroFrequency);
        }

        let event = if blocked_sample && event != PmuEvent::CpuClock {
            info!("Blocked sampling enabled: sampling {} instead of {event}", PmuEvent::CpuClock);
            PmuEvent::CpuClock
        } else {
            event
        };

        Ok(Self { pid, event, frequency, blocked_sample, call_stack: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_round_trip() {
        for event in PmuEvent::ALL {
            assert_eq!(event.name().parse::<PmuEvent>().unwrap(), event);
        }
    }

    #[test]
    fn test_unknown_event_rejected() {
        let err = "Cycles".parse::<PmuEvent>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEvent(ref name, _) if name == "Cycles"));
        assert!(err.to_string().contains("cache-misses"));
    }

    #[test]
    fn test_hardware_events() {
        assert!(PmuEvent::Cycles.is_hardware());
        assert!(PmuEvent::BranchMisses.is_hardware());
        assert!(!PmuEvent::CpuClock.is_hardware());
        assert!(!PmuEvent::TaskClock.is_hardware());
    }

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::new(Pid(10), PmuEvent::Cycles, DEFAULT_FREQUENCY, false).unwrap();
        assert_eq!(config.event, PmuEvent::Cycles);
        assert_eq!(config.frequency, 4000);
        assert!(config.call_stack);
        assert!(!config.blocked_sample);
    }

    #[test]
    fn test_blocked_mode_forces_cpu_clock() {
        let config = SessionConfig::new(Pid(10), PmuEvent::CacheMisses, 99, true).unwrap();
        assert_eq!(config.event, PmuEvent::CpuClock);
        assert!(config.blocked_sample);
    }

    #[test]
    fn test_zero_frequency_rejected() {
        assert_eq!(
            SessionConfig::new(Pid(10), PmuEvent::Cycles, 0, false).unwrap_err(),
            ConfigError::ZeroFrequency
        );
    }
}

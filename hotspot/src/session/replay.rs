//! Replay of recorded sample batches
//!
//! A replay file holds one batch per polling cycle:
//!
//! ```json
//! {"batches": [[{"event": "cycles", "weight": 100, "stack": [{"symbol": "foo", "module": "a.so"}]}], []]}
//! ```
//!
//! Each `read` hands out the next batch. Reading past the last batch fails,
//! the same way a live source fails once its target is gone.

use super::{SamplingBackend, SamplingSession, SessionConfig};
use crate::domain::{Sample, SessionError};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

/// On-disk format of a replay file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFile {
    pub batches: Vec<Vec<Sample>>,
}

/// Backend serving recorded batches
#[derive(Debug, Clone, Default)]
pub struct ReplayBackend {
    batches: Vec<Vec<Sample>>,
}

impl ReplayBackend {
    #[must_use]
    pub fn from_batches(batches: Vec<Vec<Sample>>) -> Self {
        Self { batches }
    }

    /// Load a replay file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid JSON
    pub fn from_path(path: &Path) -> Result<Self, SessionError> {
        let content = fs::read_to_string(path)?;
        let file: ReplayFile = serde_json::from_str(&content)?;
        info!("Loaded {} recorded batches from {}", file.batches.len(), path.display());
        Ok(Self::from_batches(file.batches))
    }

    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }
}

impl SamplingBackend for ReplayBackend {
    type Session = ReplaySession;

    fn open(&mut self, config: &SessionConfig) -> Result<ReplaySession, SessionError> {
        debug!("Opening replay session ({} batches) for {}", self.batches.len(), config.pid);
        Ok(ReplaySession {
            pending: self.batches.clone().into(),
            served: 0,
            state: ReplayState::Opened,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplayState {
    Opened,
    Enabled,
    Disabled,
}

impl ReplayState {
    fn name(self) -> &'static str {
        match self {
            ReplayState::Opened => "opened",
            ReplayState::Enabled => "enabled",
            ReplayState::Disabled => "disabled",
        }
    }
}

/// Session over an in-memory queue of batches
#[derive(Debug)]
pub struct ReplaySession {
    pending: VecDeque<Vec<Sample>>,
    served: usize,
    state: ReplayState,
}

impl ReplaySession {
    fn expect_state(&self, op: &'static str, expected: ReplayState) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState { op, state: self.state.name() })
        }
    }
}

impl SamplingSession for ReplaySession {
    fn enable(&mut self) -> Result<(), SessionError> {
        self.expect_state("enable", ReplayState::Opened)?;
        self.state = ReplayState::Enabled;
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<Sample>, SessionError> {
        self.expect_state("read", ReplayState::Enabled)?;
        let batch = self.pending.pop_front().ok_or(SessionError::ReplayExhausted(self.served))?;
        self.served += 1;
        Ok(batch)
    }

    fn disable(&mut self) -> Result<(), SessionError> {
        self.expect_state("disable", ReplayState::Enabled)?;
        self.state = ReplayState::Disabled;
        Ok(())
    }

    fn close(self) -> Result<(), SessionError> {
        if !self.pending.is_empty() {
            debug!("Closing replay session with {} unread batches", self.pending.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Pid;
    use crate::session::PmuEvent;

    fn config() -> SessionConfig {
        SessionConfig::new(Pid(1), PmuEvent::Cycles, 4000, false).unwrap()
    }

    fn sample(weight: u64) -> Sample {
        Sample { event_name: "cycles".to_string(), weight, stack: vec![] }
    }

    #[test]
    fn test_batches_served_in_order() {
        let mut backend = ReplayBackend::from_batches(vec![vec![sample(1)], vec![sample(2), sample(3)]]);
        let mut session = backend.open(&config()).unwrap();
        session.enable().unwrap();
        assert_eq!(session.read().unwrap(), vec![sample(1)]);
        assert_eq!(session.read().unwrap(), vec![sample(2), sample(3)]);
        assert!(matches!(session.read(), Err(SessionError::ReplayExhausted(2))));
        session.disable().unwrap();
        session.close().unwrap();
    }

    #[test]
    fn test_read_requires_enable() {
        let mut backend = ReplayBackend::from_batches(vec![vec![]]);
        let mut session = backend.open(&config()).unwrap();
        let err = session.read().unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { op: "read", state: "opened" }));
    }

    #[test]
    fn test_reopen_starts_over() {
        let mut backend = ReplayBackend::from_batches(vec![vec![sample(7)]]);
        for _ in 0..2 {
            let mut session = backend.open(&config()).unwrap();
            session.enable().unwrap();
            assert_eq!(session.read().unwrap(), vec![sample(7)]);
        }
    }

    #[test]
    fn test_disable_twice_rejected() {
        let mut backend = ReplayBackend::default();
        let mut session = backend.open(&config()).unwrap();
        session.enable().unwrap();
        session.disable().unwrap();
        assert!(session.disable().is_err());
    }
}

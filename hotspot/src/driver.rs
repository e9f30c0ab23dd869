//! Polling driver
//!
//! Owns the sampling session for the whole run and walks it through
//!
//! ```text
//! Idle → Opened → Enabled → ReadCycle(1..=count) → Disabled → Closed
//! ```
//!
//! Every cycle sleeps for the interval, reads one batch, and renders a
//! report built from that batch alone. A failed read ends the loop; disable
//! and close still run.

use crate::analysis::analyze_hotspots;
use crate::config::PollConfig;
use crate::domain::HotspotError;
use crate::render::{render_report, RenderOptions};
use crate::session::{SamplingBackend, SamplingSession, SessionConfig};
use log::{debug, error, info, warn};
use std::io::Write;

/// Where the driver is in the session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Opened,
    Enabled,
    /// Reading cycle `n` (1-based)
    ReadCycle(u32),
    Disabled,
    Closed,
}

/// What a completed run produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u32,
    /// Samples read over all cycles, including empty-stack ones
    pub samples: usize,
    /// Cycles whose ranking came out empty
    pub empty_cycles: u32,
}

pub struct PollingDriver<B, W> {
    backend: B,
    session_config: SessionConfig,
    poll: PollConfig,
    render: RenderOptions,
    out: W,
    state: DriverState,
}

impl<B, W> PollingDriver<B, W>
where
    B: SamplingBackend,
    W: Write,
{
    pub fn new(backend: B, session_config: SessionConfig, poll: PollConfig, render: RenderOptions, out: W) -> Self {
        Self { backend, session_config, poll, render, out, state: DriverState::Idle }
    }

    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Give back the report sink
    pub fn into_output(self) -> W {
        self.out
    }

    fn transition(&mut self, next: DriverState) {
        debug!("driver: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run the whole session: open, `count` read cycles, cleanup.
    ///
    /// # Errors
    /// `SessionOpen` and `SessionEnable` if the session never started,
    /// `Read` if a cycle failed (cleanup has run by then)
    pub async fn run(&mut self) -> Result<RunSummary, HotspotError> {
        let mut session = self.backend.open(&self.session_config).map_err(|e| {
            error!("Failed to open sampling session: {e}");
            HotspotError::SessionOpen(e)
        })?;
        self.transition(DriverState::Opened);

        if let Err(e) = session.enable() {
            error!("Failed to enable sampling session: {e}");
            self.close(session);
            return Err(HotspotError::SessionEnable(e));
        }
        self.transition(DriverState::Enabled);

        let outcome = self.read_cycles(&mut session).await;

        if let Err(e) = session.disable() {
            warn!("Failed to disable sampling session: {e}");
        }
        self.transition(DriverState::Disabled);
        self.close(session);

        outcome
    }

    async fn read_cycles(&mut self, session: &mut B::Session) -> Result<RunSummary, HotspotError> {
        let count = self.poll.count;
        let mut summary = RunSummary::default();

        for cycle in 1..=count {
            tokio::time::sleep(self.poll.interval).await;
            self.transition(DriverState::ReadCycle(cycle));

            let batch = session.read().map_err(|source| {
                error!("Read failed in cycle {cycle}/{count}: {source}");
                HotspotError::Read { cycle, source }
            })?;
            summary.samples += batch.len();

            let report = analyze_hotspots(batch);
            info!(
                "cycle {cycle}/{count}: {} hotspots from {} samples ({} without stack), total weight {}",
                report.hotspots.len(),
                report.sample_count,
                report.skipped_samples,
                report.total_weight
            );
            if report.is_empty() {
                summary.empty_cycles += 1;
            }

            let text = render_report(cycle, count, &report, &self.render);
            self.emit(&text);
            summary.cycles = cycle;
        }

        Ok(summary)
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            warn!("Failed to write report: {e}");
        }
    }

    fn close(&mut self, session: B::Session) {
        if let Err(e) = session.close() {
            warn!("Failed to close sampling session: {e}");
        }
        self.transition(DriverState::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Frame, Pid, Sample, SessionError};
    use crate::session::{PmuEvent, ReplayBackend};
    use std::time::Duration;

    fn driver(batches: Vec<Vec<Sample>>, count: u32) -> PollingDriver<ReplayBackend, Vec<u8>> {
        PollingDriver::new(
            ReplayBackend::from_batches(batches),
            SessionConfig::new(Pid(1), PmuEvent::Cycles, 4000, false).unwrap(),
            PollConfig { interval: Duration::from_millis(1), count },
            RenderOptions { color: false },
            Vec::new(),
        )
    }

    fn foo(weight: u64) -> Sample {
        Sample {
            event_name: "cycles".to_string(),
            weight,
            stack: vec![Frame { symbol_name: Some("foo".to_string()), ..Frame::default() }],
        }
    }

    #[tokio::test]
    async fn test_runs_every_cycle() {
        let mut driver = driver(vec![vec![foo(1)], vec![], vec![foo(2), foo(3)]], 3);
        let summary = driver.run().await.unwrap();

        assert_eq!(summary, RunSummary { cycles: 3, samples: 3, empty_cycles: 1 });
        assert_eq!(driver.state(), DriverState::Closed);

        let out = String::from_utf8(driver.into_output()).unwrap();
        let banners: Vec<&str> = out.lines().filter(|l| l.starts_with("cycle ")).collect();
        assert_eq!(
            banners,
            vec![
                "cycle 1/3: 1 samples, total weight 1",
                "cycle 2/3: 0 samples, total weight 0",
                "cycle 3/3: 2 samples, total weight 5",
            ]
        );
    }

    #[tokio::test]
    async fn test_read_failure_keeps_earlier_reports() {
        let mut driver = driver(vec![vec![foo(1)]], 3);
        let err = driver.run().await.unwrap_err();

        assert!(matches!(err, HotspotError::Read { cycle: 2, source: SessionError::ReplayExhausted(1) }));
        assert_eq!(driver.state(), DriverState::Closed);

        let out = String::from_utf8(driver.into_output()).unwrap();
        assert!(out.contains("cycle 1/3"));
        assert!(!out.contains("cycle 2/3"));
    }
}

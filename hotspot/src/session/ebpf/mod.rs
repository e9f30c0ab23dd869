//! Live sampling through the kernel-side eBPF programs
//!
//! ```text
//! perf_event overflow ──► on_cpu_sample ─┐
//!                                        ├─► SAMPLES ring buffer ──► read()
//! sched_switch ────────► sched_switch_hook ┘        │
//!                                                   └─ stack_id ──► STACK_TRACES
//! ```
//!
//! `read()` drains the ring buffer, turns every stack id into frames and
//! annotates them from /proc/<pid>/maps.

pub mod diagnostics;
pub mod setup;

use aya::maps::{MapData, RingBuf, StackTraceMap};
use aya::Ebpf;
use hotspot_common::{SampleEvent, MAX_STACK_DEPTH, SAMPLE_OFF_CPU};
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{online_cpus, SamplingBackend, SamplingSession, SessionConfig};
use crate::domain::{Frame, Sample, SessionError, StackId, BLOCKED_EVENT};
use crate::symbolization::ModuleMap;
use setup::Links;

/// Where `cargo xtask build-ebpf` leaves the kernel object
pub const DEFAULT_OBJECT_PATH: &str = "target/bpfel-unknown-none/release/hotspot";

/// Opens sessions from a compiled eBPF object
#[derive(Debug, Clone)]
pub struct EbpfBackend {
    object_path: PathBuf,
}

impl EbpfBackend {
    #[must_use]
    pub fn new(object_path: impl Into<PathBuf>) -> Self {
        Self { object_path: object_path.into() }
    }

    #[must_use]
    pub fn object_path(&self) -> &Path {
        &self.object_path
    }
}

impl Default for EbpfBackend {
    fn default() -> Self {
        Self::new(DEFAULT_OBJECT_PATH)
    }
}

impl SamplingBackend for EbpfBackend {
    type Session = EbpfSession;

    fn open(&mut self, config: &SessionConfig) -> Result<EbpfSession, SessionError> {
        let mut bpf = setup::load_ebpf_program(&self.object_path)?;
        setup::init_ebpf_logger(&mut bpf);
        setup::write_config(&mut bpf, config)?;
        setup::load_programs(&mut bpf, config.blocked_sample)?;

        let samples = RingBuf::try_from(bpf.take_map("SAMPLES").ok_or(SessionError::MapNotFound("SAMPLES"))?)?;
        let stack_traces =
            StackTraceMap::try_from(bpf.take_map("STACK_TRACES").ok_or(SessionError::MapNotFound("STACK_TRACES"))?)?;

        Ok(EbpfSession { bpf, samples, stack_traces, config: config.clone(), links: None })
    }
}

/// A loaded eBPF object and the maps read from it
pub struct EbpfSession {
    bpf: Ebpf,
    samples: RingBuf<MapData>,
    stack_traces: StackTraceMap<MapData>,
    config: SessionConfig,
    /// `Some` while enabled
    links: Option<Links>,
}

impl EbpfSession {
    fn state(&self) -> &'static str {
        if self.links.is_some() {
            "enabled"
        } else {
            "not enabled"
        }
    }
}

/// Instruction pointers of a captured stack, innermost first, as frames
fn resolve_stack(stack_traces: &StackTraceMap<MapData>, modules: &ModuleMap, stack_id: StackId) -> Vec<Frame> {
    let Some(key) = stack_id.map_key() else {
        debug!("No stack captured (stack_id = {})", stack_id.0);
        return Vec::new();
    };

    match stack_traces.get(&key, 0) {
        Ok(trace) => trace
            .frames()
            .iter()
            .take(MAX_STACK_DEPTH)
            .map(|frame| frame.ip)
            .take_while(|&ip| ip != 0)
            .map(|ip| modules.annotate(ip))
            .collect(),
        Err(e) => {
            debug!("Failed to read stack trace {}: {e}", stack_id.0);
            Vec::new()
        }
    }
}

impl SamplingSession for EbpfSession {
    fn enable(&mut self) -> Result<(), SessionError> {
        if self.links.is_some() {
            return Err(SessionError::InvalidState { op: "enable", state: self.state() });
        }
        let cpus = online_cpus()?;
        self.links = Some(setup::attach_programs(&mut self.bpf, &self.config, &cpus)?);
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<Sample>, SessionError> {
        if self.links.is_none() {
            return Err(SessionError::InvalidState { op: "read", state: self.state() });
        }

        // Re-read every cycle: the target may have loaded libraries since
        let modules = ModuleMap::for_pid(self.config.pid)?;
        let on_cpu_event = self.config.event.name();

        // eBPF deduplicates identical stacks, so one id shows up many times
        let mut stack_cache: HashMap<i64, Vec<Frame>> = HashMap::new();
        let mut batch = Vec::new();

        while let Some(item) = self.samples.next() {
            let bytes: &[u8] = &item;
            if bytes.len() < std::mem::size_of::<SampleEvent>() {
                continue;
            }

            // SAFETY: We verified the buffer size matches SampleEvent
            #[allow(unsafe_code)]
            let event = unsafe { std::ptr::read_unaligned(bytes.as_ptr().cast::<SampleEvent>()) };

            let stack = stack_cache
                .entry(event.stack_id)
                .or_insert_with(|| resolve_stack(&self.stack_traces, &modules, StackId(event.stack_id)))
                .clone();

            let event_name = if event.kind == SAMPLE_OFF_CPU { BLOCKED_EVENT } else { on_cpu_event };
            batch.push(Sample { event_name: event_name.to_string(), weight: event.weight, stack });
        }

        debug!("Drained {} samples ({} distinct stacks)", batch.len(), stack_cache.len());
        Ok(batch)
    }

    fn disable(&mut self) -> Result<(), SessionError> {
        let links = self.links.take().ok_or(SessionError::InvalidState { op: "disable", state: "not enabled" })?;
        setup::detach_programs(&mut self.bpf, links)
    }

    fn close(self) -> Result<(), SessionError> {
        diagnostics::log_diagnostics(&self.bpf);
        info!("Closed eBPF session for {}", self.config.pid);
        Ok(())
    }
}

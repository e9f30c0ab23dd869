use aya::maps::HashMap;
use aya::Ebpf;
use log::{info, warn};

use crate::domain::SessionError;

/// Kernel-side counters, logged when a session closes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    /// `perf_event` handler invocations, any process
    pub handler_calls: u64,
    /// Invocations that matched the target process
    pub passed_pid_filter: u64,
    /// Samples lost to a full ring buffer
    pub output_failed: u64,
}

fn read_counter(bpf: &Ebpf, name: &'static str) -> Result<u64, SessionError> {
    let map: HashMap<_, u32, u64> = HashMap::try_from(bpf.map(name).ok_or(SessionError::MapNotFound(name))?)?;
    // Never-bumped counters have no entry yet
    Ok(map.get(&0u32, 0).unwrap_or(0))
}

/// Read the debug counters maintained by the eBPF programs
///
/// # Errors
/// Returns an error if the eBPF diagnostic maps cannot be accessed
pub fn read_counters(bpf: &Ebpf) -> Result<Counters, SessionError> {
    Ok(Counters {
        handler_calls: read_counter(bpf, "PERF_EVENT_COUNTER")?,
        passed_pid_filter: read_counter(bpf, "PERF_EVENT_PASSED_PID_FILTER")?,
        output_failed: read_counter(bpf, "SAMPLE_OUTPUT_FAILED")?,
    })
}

/// Log the perf_event counters
pub fn log_diagnostics(bpf: &Ebpf) {
    match read_counters(bpf) {
        Ok(counters) => {
            info!("perf_event handler called: {} times", counters.handler_calls);
            info!("passed PID filter: {} times", counters.passed_pid_filter);
            if counters.passed_pid_filter == 0 {
                warn!("no sample matched the target process (ALL FILTERED OUT)");
            }
            if counters.output_failed > 0 {
                warn!("{} samples dropped: ring buffer full", counters.output_failed);
            }
        }
        Err(e) => warn!("Failed to read eBPF diagnostics: {e}"),
    }
}

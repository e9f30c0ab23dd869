//! # eBPF Program Loading and Attachment
//!
//! Loads the compiled kernel object and attaches its programs.
//!
//! ## Attachment Points
//!
//! - **Perf Event**: `on_cpu_sample`, once per online CPU, frequency mode
//! - **Tracepoint**: `sched/sched_switch` (off-CPU samples, blocked mode only)

use aya::{
    maps::HashMap,
    programs::{
        perf_event::{self, PerfEventLinkId, PerfTypeId},
        trace_point::TracePointLinkId,
        PerfEvent, TracePoint,
    },
    Ebpf,
};
use aya_log::EbpfLogger;
use hotspot_common::{CONFIG_BLOCKED_SAMPLE, CONFIG_TARGET_PID};
use log::{info, warn};
use std::path::Path;

use crate::domain::{CpuId, SessionError};
use crate::session::{PmuEvent, SessionConfig};

pub const ON_CPU_PROGRAM: &str = "on_cpu_sample";
pub const OFF_CPU_PROGRAM: &str = "sched_switch_hook";

/// Link handles of attached programs, needed to detach them again
#[derive(Debug, Default)]
pub struct Links {
    pub perf_events: Vec<PerfEventLinkId>,
    pub sched_switch: Option<TracePointLinkId>,
}

/// Load the eBPF object from disk
///
/// # Errors
/// `ObjectNotFound` if there is no file at `path`, otherwise any loader error
pub fn load_ebpf_program(path: &Path) -> Result<Ebpf, SessionError> {
    if !path.exists() {
        return Err(SessionError::ObjectNotFound(path.to_path_buf()));
    }
    let bpf = Ebpf::load_file(path)?;
    info!("✓ Loaded eBPF object {}", path.display());
    Ok(bpf)
}

/// Initialize eBPF logger
pub fn init_ebpf_logger(bpf: &mut Ebpf) {
    if let Err(e) = EbpfLogger::init(bpf) {
        warn!("Failed to initialize eBPF logger: {e}");
    }
}

/// Write target pid and blocked flag into the `CONFIG` map
///
/// # Errors
/// Returns an error if the map is missing or the update fails
pub fn write_config(bpf: &mut Ebpf, config: &SessionConfig) -> Result<(), SessionError> {
    let mut config_map: HashMap<_, u32, u64> =
        HashMap::try_from(bpf.map_mut("CONFIG").ok_or(SessionError::MapNotFound("CONFIG"))?)?;
    config_map.insert(CONFIG_TARGET_PID, config.pid.as_config_value(), 0)?;
    config_map.insert(CONFIG_BLOCKED_SAMPLE, u64::from(config.blocked_sample), 0)?;
    info!("✓ Set target PID: {}", config.pid.0);
    info!("✓ Blocked sampling: {}", if config.blocked_sample { "on" } else { "off" });
    Ok(())
}

fn perf_event_program<'a>(bpf: &'a mut Ebpf) -> Result<&'a mut PerfEvent, SessionError> {
    Ok(bpf.program_mut(ON_CPU_PROGRAM).ok_or(SessionError::ProgramNotFound(ON_CPU_PROGRAM))?.try_into()?)
}

fn trace_point_program<'a>(bpf: &'a mut Ebpf) -> Result<&'a mut TracePoint, SessionError> {
    Ok(bpf.program_mut(OFF_CPU_PROGRAM).ok_or(SessionError::ProgramNotFound(OFF_CPU_PROGRAM))?.try_into()?)
}

/// Load programs into the kernel without attaching them
///
/// # Errors
/// Returns an error if a program is missing or rejected by the verifier
pub fn load_programs(bpf: &mut Ebpf, blocked_sample: bool) -> Result<(), SessionError> {
    perf_event_program(bpf)?.load()?;
    if blocked_sample {
        trace_point_program(bpf)?.load()?;
    }
    Ok(())
}

/// perf_event type and config for a selected event
#[must_use]
pub fn perf_config(event: PmuEvent) -> (PerfTypeId, u64) {
    use perf_event::{perf_hw_id, perf_sw_ids};

    let config = match event {
        PmuEvent::Cycles => perf_hw_id::PERF_COUNT_HW_CPU_CYCLES as u64,
        PmuEvent::Instructions => perf_hw_id::PERF_COUNT_HW_INSTRUCTIONS as u64,
        PmuEvent::CacheReferences => perf_hw_id::PERF_COUNT_HW_CACHE_REFERENCES as u64,
        PmuEvent::CacheMisses => perf_hw_id::PERF_COUNT_HW_CACHE_MISSES as u64,
        PmuEvent::BranchMisses => perf_hw_id::PERF_COUNT_HW_BRANCH_MISSES as u64,
        PmuEvent::CpuClock => perf_sw_ids::PERF_COUNT_SW_CPU_CLOCK as u64,
        PmuEvent::TaskClock => perf_sw_ids::PERF_COUNT_SW_TASK_CLOCK as u64,
    };
    let type_id = if event.is_hardware() { PerfTypeId::Hardware } else { PerfTypeId::Software };
    (type_id, config)
}

/// Attach the sampler on every CPU, plus `sched_switch` in blocked mode
///
/// # Errors
/// Returns an error if any attachment fails
pub fn attach_programs(bpf: &mut Ebpf, config: &SessionConfig, cpus: &[CpuId]) -> Result<Links, SessionError> {
    let mut links = Links::default();

    let program = perf_event_program(bpf)?;
    for cpu in cpus {
        let (perf_type, perf_config) = perf_config(config.event);
        let link = program.attach(
            perf_type,
            perf_config,
            perf_event::PerfEventScope::AllProcessesOneCpu { cpu: cpu.0 },
            perf_event::SamplePolicy::Frequency(config.frequency),
            false,
        )?;
        links.perf_events.push(link);
    }
    info!(
        "✓ Attached {} sampler to {} CPUs at {} Hz (filtering for PID {})",
        config.event,
        cpus.len(),
        config.frequency,
        config.pid.0
    );

    if config.blocked_sample {
        let program = trace_point_program(bpf)?;
        links.sched_switch = Some(program.attach("sched", "sched_switch")?);
        info!("✓ Attached tracepoint: sched/sched_switch");
    }

    Ok(links)
}

/// Detach everything in `links`
///
/// # Errors
/// Returns the first detach failure; the remaining links are still detached
pub fn detach_programs(bpf: &mut Ebpf, links: Links) -> Result<(), SessionError> {
    let mut first_error = None;

    if !links.perf_events.is_empty() {
        let program = perf_event_program(bpf)?;
        for link in links.perf_events {
            if let Err(e) = program.detach(link) {
                warn!("Failed to detach {ON_CPU_PROGRAM}: {e}");
                first_error.get_or_insert(SessionError::Program(e));
            }
        }
    }

    if let Some(link) = links.sched_switch {
        if let Err(e) = trace_point_program(bpf)?.detach(link) {
            warn!("Failed to detach {OFF_CPU_PROGRAM}: {e}");
            first_error.get_or_insert(SessionError::Program(e));
        }
    }

    first_error.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_software_events_map_to_software_type() {
        assert!(matches!(perf_config(PmuEvent::CpuClock).0, PerfTypeId::Software));
        assert!(matches!(perf_config(PmuEvent::TaskClock).0, PerfTypeId::Software));
    }

    #[test]
    fn test_hardware_events_map_to_hardware_type() {
        for event in PmuEvent::ALL.into_iter().filter(|e| e.is_hardware()) {
            assert!(matches!(perf_config(event).0, PerfTypeId::Hardware), "{event}");
        }
        assert_eq!(perf_config(PmuEvent::Cycles).1, 0);
    }

    #[test]
    fn test_event_configs_are_distinct_within_type() {
        let hardware: Vec<u64> =
            PmuEvent::ALL.into_iter().filter(|e| e.is_hardware()).map(|e| perf_config(e).1).collect();
        let mut deduped = hardware.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), hardware.len());
        assert_ne!(perf_config(PmuEvent::CpuClock).1, perf_config(PmuEvent::TaskClock).1);
    }

    #[test]
    fn test_missing_object() {
        let err = load_ebpf_program(Path::new("/nonexistent/hotspot.o")).unwrap_err();
        assert!(matches!(err, SessionError::ObjectNotFound(_)));
    }
}

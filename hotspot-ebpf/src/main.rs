//! # eBPF Kernel-Side Sampler
//!
//! eBPF programs that run inside the Linux kernel and produce raw samples
//! for the hotspot session in userspace.
//!
//! ## Programs
//!
//! - **Perf Event**: `on_cpu_sample` - fires on every overflow of the selected
//!   PMU event, captures the user stack of the running thread
//! - **Tracepoint**: `sched_switch_hook` - records when a target thread leaves
//!   the CPU and emits an off-CPU sample when it comes back
//!
//! ## Maps (Shared with Userspace)
//!
//! - `SAMPLES` - Ring buffer (4MB) carrying [`SampleEvent`]s
//! - `STACK_TRACES` - Deduplicated user stacks by ID
//! - `CONFIG` - Target TGID and blocked-sample flag
//! - `OFF_CPU` - In-flight switch-out records per thread
//!
//! ## Build
//!
//! Always compiled in release mode (debug includes incompatible formatting code):
//! ```bash
//! cargo xtask build-ebpf --release
//! ```

#![no_std]
#![no_main]
#![allow(unused_unsafe)]

use aya_ebpf::{
    bindings::bpf_perf_event_data,
    helpers::{bpf_get_current_pid_tgid, bpf_get_smp_processor_id, bpf_ktime_get_ns},
    macros::{map, perf_event, tracepoint},
    maps::{HashMap, LruHashMap, RingBuf, StackTrace},
    programs::{PerfEventContext, TracePointContext},
    EbpfContext,
};
use aya_log_ebpf::warn;
use hotspot_common::{
    task_exiting, OffCpuStart, SampleEvent, SchedSwitchArgs, CONFIG_BLOCKED_SAMPLE,
    CONFIG_TARGET_PID, SAMPLE_OFF_CPU, SAMPLE_ON_CPU,
};

// ============================================================================
// Constants
// ============================================================================

/// Stack capture flags for `bpf_get_stackid`:
///
/// - BPF_F_USER_STACK (0x100): Capture user-space stack (not kernel)
/// - BPF_F_FAST_STACK_CMP (0x200): Compare stacks by hash only
/// - BPF_F_REUSE_STACKID (0x400): Overwrite existing entry on hash collision
const STACK_FLAGS: u64 = 0x100 | 0x200 | 0x400;

// ============================================================================
// eBPF Maps
// ============================================================================

/// Ring buffer for sending samples to userspace
///
/// Userspace drains it once per polling cycle, so it has to hold a full
/// interval worth of samples (4000 Hz × 40 bytes × CPUs).
#[map]
static SAMPLES: RingBuf = RingBuf::with_byte_size(4 * 1024 * 1024, 0);

/// Stack trace map (stack id → instruction pointers)
///
/// A full map makes `bpf_get_stackid` fail with -ENOMEM, which userspace
/// sees as samples without a stack.
#[map]
static STACK_TRACES: StackTrace = StackTrace::with_max_entries(16384, 0);

/// Map: Config key → Config value
///
/// - **Key 0**: Target TGID
/// - **Key 1**: Blocked-sample flag
#[map]
static CONFIG: HashMap<u32, u64> = HashMap::with_max_entries(16, 0);

/// Map: Thread ID → switch-out record
///
/// LRU so records of threads that never come back get evicted instead of
/// filling the map.
#[map]
static OFF_CPU: LruHashMap<u32, OffCpuStart> = LruHashMap::with_max_entries(8192, 0);

// ============================================================================
// Debug Counters
// ============================================================================

/// Total number of perf_event invocations
#[map]
static PERF_EVENT_COUNTER: HashMap<u32, u64> = HashMap::with_max_entries(1, 0);

/// Number of perf_events that matched the target process
#[map]
static PERF_EVENT_PASSED_PID_FILTER: HashMap<u32, u64> = HashMap::with_max_entries(1, 0);

/// Number of samples (both kinds) dropped because the ring buffer was full
#[map]
static SAMPLE_OUTPUT_FAILED: HashMap<u32, u64> = HashMap::with_max_entries(1, 0);

// ============================================================================
// Helpers
// ============================================================================

fn bump(counter: &HashMap<u32, u64>) {
    let key = 0u32;
    unsafe {
        let current = counter.get(&key).copied().unwrap_or(0);
        let _ = counter.insert(&key, &(current + 1), 0);
    }
}

fn target_pid() -> u32 {
    unsafe { CONFIG.get(&CONFIG_TARGET_PID).map(|v| *v as u32).unwrap_or(0) }
}

fn blocked_sample_enabled() -> bool {
    unsafe { CONFIG.get(&CONFIG_BLOCKED_SAMPLE).copied().unwrap_or(0) == 1 }
}

fn emit(event: &SampleEvent) -> Result<(), i64> {
    let result = SAMPLES.output(event, 0);
    if result.is_err() {
        bump(&SAMPLE_OUTPUT_FAILED);
    }
    result.map_err(|_| 1i64)
}

// ============================================================================
// On-CPU sampling
// ============================================================================

/// PMU overflow handler, attached once per online CPU
#[perf_event]
pub fn on_cpu_sample(ctx: PerfEventContext) -> u32 {
    match try_on_cpu_sample(&ctx) {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn try_on_cpu_sample(ctx: &PerfEventContext) -> Result<(), i64> {
    bump(&PERF_EVENT_COUNTER);

    let pid_tgid = unsafe { bpf_get_current_pid_tgid() };
    let pid = (pid_tgid >> 32) as u32;
    let tid = pid_tgid as u32;

    // Attached with AllProcessesOneCpu scope, so filter here
    let target = target_pid();
    if target != 0 && pid != target {
        return Ok(());
    }
    bump(&PERF_EVENT_PASSED_PID_FILTER);

    // Keep the raw error code so userspace can count failed captures
    let stack_id = unsafe { STACK_TRACES.get_stackid(ctx, STACK_FLAGS).unwrap_or_else(|e| e) };

    let data = ctx.as_ptr() as *const bpf_perf_event_data;
    let period = unsafe { (*data).sample_period };

    let event = SampleEvent {
        pid,
        tid,
        timestamp_ns: unsafe { bpf_ktime_get_ns() },
        stack_id,
        weight: period,
        kind: SAMPLE_ON_CPU,
        cpu_id: unsafe { bpf_get_smp_processor_id() },
    };

    emit(&event)
}

// ============================================================================
// Off-CPU (blocked) sampling
// ============================================================================

/// Hook: sched_switch tracepoint
///
/// Runs in the context of the outgoing thread, so `bpf_get_stackid` with
/// `BPF_F_USER_STACK` captures the stack it blocked in.
#[tracepoint]
pub fn sched_switch_hook(ctx: TracePointContext) -> u32 {
    match try_sched_switch(&ctx) {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn try_sched_switch(ctx: &TracePointContext) -> Result<(), i64> {
    if !blocked_sample_enabled() {
        return Ok(());
    }

    let args: *const SchedSwitchArgs = ctx.as_ptr() as *const SchedSwitchArgs;
    let prev_pid = unsafe { (*args).prev_pid as u32 };
    let prev_state = unsafe { (*args).prev_state };
    let next_pid = unsafe { (*args).next_pid as u32 };

    let now = unsafe { bpf_ktime_get_ns() };

    // An exiting thread never switches back in; its tid may be reused
    if !task_exiting(prev_state) {
        handle_switch_out(ctx, prev_pid, now)?;
    }
    handle_switch_in(next_pid, now)?;

    Ok(())
}

fn handle_switch_out(ctx: &TracePointContext, tid: u32, now: u64) -> Result<(), i64> {
    let pid_tgid = unsafe { bpf_get_current_pid_tgid() };
    let pid = (pid_tgid >> 32) as u32;

    // The idle task (tid 0) shares tgid 0 with nothing we care about
    let target = target_pid();
    if tid == 0 || target == 0 || pid != target {
        return Ok(());
    }

    let stack_id = unsafe { STACK_TRACES.get_stackid(ctx, STACK_FLAGS).unwrap_or_else(|e| e) };
    let start = OffCpuStart { start_ns: now, stack_id };

    if OFF_CPU.insert(&tid, &start, 0).is_err() {
        warn!(ctx, "OFF_CPU insert failed, dropping switch-out of tid {}", tid);
    }

    Ok(())
}

fn handle_switch_in(tid: u32, now: u64) -> Result<(), i64> {
    // Only threads we saw leaving have a record
    let Some(start) = (unsafe { OFF_CPU.get(&tid).copied() }) else {
        return Ok(());
    };
    let _ = OFF_CPU.remove(&tid);

    let event = SampleEvent {
        pid: target_pid(),
        tid,
        timestamp_ns: now,
        stack_id: start.stack_id,
        weight: now.saturating_sub(start.start_ns),
        kind: SAMPLE_OFF_CPU,
        cpu_id: unsafe { bpf_get_smp_processor_id() },
    };

    emit(&event)
}

#[cfg(all(not(test), target_os = "none"))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    unsafe { core::hint::unreachable_unchecked() }
}

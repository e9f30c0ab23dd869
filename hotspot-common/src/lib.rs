//! # Shared Data Structures (eBPF ↔ Userspace)
//!
//! Records and constants shared between the kernel-side sampler and the
//! userspace session. All types use `#[repr(C)]` so both sides agree on the
//! layout of bytes crossing the ring buffer.
//!
//! ## Sample Kinds
//!
//! 1. **On-CPU** - emitted by the `perf_event` program each time the selected
//!    PMU event overflows while a thread of the target process is running.
//! 2. **Off-CPU** - emitted by the `sched_switch` tracepoint when a thread of
//!    the target process is switched back in after having been blocked.
//!
//! ## Key Types
//!
//! - [`SampleEvent`] - One raw sample passed via the `SAMPLES` ring buffer
//! - [`OffCpuStart`] - Per-thread switch-out record kept in the `OFF_CPU` map
//! - [`SchedSwitchArgs`] - Tracepoint arguments from `sched_switch`

#![cfg_attr(not(test), no_std)]

// ============================================================================
// Sample Kinds
// ============================================================================

/// Sample taken by the PMU overflow handler while the thread was on a CPU.
pub const SAMPLE_ON_CPU: u32 = 1;

/// Sample describing time a thread spent switched out (blocked / waiting).
pub const SAMPLE_OFF_CPU: u32 = 2;

// ============================================================================
// CONFIG map keys
// ============================================================================

/// `CONFIG[0]`: TGID of the process being profiled (0 = no filter).
pub const CONFIG_TARGET_PID: u32 = 0;

/// `CONFIG[1]`: 1 when off-CPU (blocked) samples should be produced.
pub const CONFIG_BLOCKED_SAMPLE: u32 = 1;

/// Maximum number of stack frames the kernel keeps per stack id.
///
/// eBPF stack maps are limited to 127 frames.
pub const MAX_STACK_DEPTH: usize = 127;

// ============================================================================
// Task states (`prev_state` of sched_switch)
// ============================================================================

/// `exit_state`: task is being reaped
pub const EXIT_DEAD: i64 = 0x0010;

/// `exit_state`: task has exited, waiting for its parent
pub const EXIT_ZOMBIE: i64 = 0x0020;

/// `__state` of a task making its final context switch
pub const TASK_DEAD: i64 = 0x0080;

const TASK_EXIT_MASK: i64 = EXIT_DEAD | EXIT_ZOMBIE | TASK_DEAD;

/// True when the outgoing thread of a `sched_switch` is exiting
///
/// Such a thread is never switched back in, so it must not get an
/// [`OffCpuStart`] record.
#[must_use]
pub const fn task_exiting(prev_state: i64) -> bool {
    prev_state & TASK_EXIT_MASK != 0
}

// ============================================================================
// Shared Data Structures
// ============================================================================

/// Raw sample sent from eBPF to userspace via ring buffer
///
/// **Memory Layout**: `#[repr(C)]`, 40 bytes, 8-byte aligned
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleEvent {
    /// Process ID (TGID in Linux terms)
    pub pid: u32,

    /// Thread ID (PID in Linux terms)
    pub tid: u32,

    /// Timestamp in nanoseconds (from `bpf_ktime_get_ns()`)
    pub timestamp_ns: u64,

    /// Stack trace ID in the `STACK_TRACES` map
    ///
    /// Negative values are the error code returned by `bpf_get_stackid()`;
    /// userspace turns those into samples with an empty stack.
    pub stack_id: i64,

    /// Accounted weight of this sample
    ///
    /// - `SAMPLE_ON_CPU`: the perf sample period
    /// - `SAMPLE_OFF_CPU`: nanoseconds spent switched out
    pub weight: u64,

    /// `SAMPLE_ON_CPU` or `SAMPLE_OFF_CPU`
    pub kind: u32,

    /// CPU the sample was taken on
    pub cpu_id: u32,
}

const _: () = assert!(core::mem::size_of::<SampleEvent>() == 40);

/// Per-thread switch-out record
///
/// Written by `sched_switch` when a target thread leaves the CPU and consumed
/// when the same thread is switched back in.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct OffCpuStart {
    /// Timestamp of the switch-out (nanoseconds since boot)
    pub start_ns: u64,

    /// User stack captured at switch-out
    pub stack_id: i64,
}

/// Tracepoint arguments for `sched/sched_switch`
///
/// Layout defined by the Linux kernel tracepoint ABI:
/// `/sys/kernel/debug/tracing/events/sched/sched_switch/format`
///
/// - **prev_***: The thread being switched OUT (going off-CPU)
/// - **next_***: The thread being switched IN (going on-CPU)
#[repr(C)]
pub struct SchedSwitchArgs {
    /// Common tracepoint fields
    #[allow(clippy::pub_underscore_fields)]
    pub __unused__: u64,

    pub prev_comm: [u8; 16],
    pub prev_pid: i32,
    pub prev_prio: i32,

    /// Linux task state of the outgoing thread (0 = `TASK_RUNNING`, preempted)
    pub prev_state: i64,

    pub next_comm: [u8; 16],
    pub next_pid: i32,
    pub next_prio: i32,
}

#[cfg(feature = "user")]
use aya::Pod;

// Pod marks these as plain bytes for map reads and writes
#[cfg(feature = "user")]
#[allow(unsafe_code)]
unsafe impl Pod for SampleEvent {}

#[cfg(feature = "user")]
#[allow(unsafe_code)]
unsafe impl Pod for OffCpuStart {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_event_layout() {
        assert_eq!(core::mem::size_of::<SampleEvent>(), 40);
        assert_eq!(core::mem::align_of::<SampleEvent>(), 8);
    }

    #[test]
    fn test_blocked_threads_are_not_exiting() {
        // TASK_RUNNING (preempted), TASK_INTERRUPTIBLE, TASK_UNINTERRUPTIBLE
        for state in [0x0000, 0x0001, 0x0002] {
            assert!(!task_exiting(state), "{state:#x}");
        }
    }

    #[test]
    fn test_exiting_threads_are_detected() {
        for state in [EXIT_DEAD, EXIT_ZOMBIE, TASK_DEAD, EXIT_ZOMBIE | 0x0001] {
            assert!(task_exiting(state), "{state:#x}");
        }
    }
}

//! # hotspot - PMU Sampling Hotspot Reports
//!
//! hotspot samples a PMU event (cycles by default) with call stacks for one
//! process, groups identical stacks into hotspots and prints a ranked report
//! every polling interval: a flat table followed by the call tree of every
//! hotspot. Optionally, time spent off-CPU (blocked) is sampled as well and
//! highlighted in the report.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     eBPF Programs (Kernel)                      │
//! │  • Perf Events: one sampler per CPU, frequency mode             │
//! │  • Tracepoints: sched_switch (off-CPU samples)                  │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ ring buffer + stack map
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      hotspot (This Crate)                       │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │   Session    │──▶│   Analysis   │──▶│    Render    │        │
//! │  │ (eBPF/replay)│   │ (aggregate,  │   │ (table, call │        │
//! │  └──────────────┘   │    rank)     │   │    trees)    │        │
//! │         ▲           └──────────────┘   └──────────────┘        │
//! │         │                                                       │
//! │  ┌──────────────┐                                               │
//! │  │    Driver    │  open → enable → read × count → disable       │
//! │  └──────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`analysis`]: Stack signatures, hotspot aggregation and ranking
//! - [`render`]: Flat table and call tree text, name truncation, styling
//! - [`driver`]: The polling loop and session lifecycle
//! - [`session`]: Sampling sources behind `SamplingBackend` / `SamplingSession`
//!   - `ebpf`: Load and attach the kernel programs, drain samples
//!   - `replay`: Recorded batches from a JSON file
//! - [`symbolization`]: Annotate raw addresses from `/proc/<pid>/maps`
//! - [`launcher`]: Attach to a PID or launch an executable
//! - [`preflight`]: Privilege, kernel and target checks before loading eBPF
//! - [`config`]: Polling parameters
//! - [`cli`]: Command-line argument parsing
//! - [`domain`]: Core domain types (Pid, Frame, Sample) and errors
//!
//! ## Typical Usage
//!
//! ```bash
//! # Five reports, one per second, for a running process
//! sudo ./hotspot 1 5 0 <PID>
//!
//! # Launch a program and include off-CPU time
//! sudo ./hotspot 0.5 10 1 ./my-app
//!
//! # Replay recorded samples without root
//! ./hotspot 1 3 0 --replay samples.json
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod domain;
pub mod driver;
pub mod launcher;
pub mod preflight;
pub mod render;
pub mod session;
pub mod symbolization;

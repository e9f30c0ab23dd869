//! # hotspot - Main Entry Point
//!
//! Supports two sampling sources:
//! - **Live** (`hotspot <INTERVAL> <COUNT> <BLOCKED> <PID|EXECUTABLE>`): eBPF sampling, needs root
//! - **Replay** (`--replay samples.json`): recorded batches, no privileges needed

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::io;

use hotspot::cli::Args;
use hotspot::config::PollConfig;
use hotspot::domain::Pid;
use hotspot::driver::PollingDriver;
use hotspot::launcher::{LaunchedProcess, Target};
use hotspot::preflight::{check_target, run_preflight_checks};
use hotspot::render::RenderOptions;
use hotspot::session::{EbpfBackend, ReplayBackend, SamplingBackend, SessionConfig};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}").to_lowercase();
    if msg.contains("permission denied") || msg.contains("requires root") || msg.contains("operation not permitted")
    {
        EXIT_NOPERM
    } else if msg.contains("missing required argument") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let args = Args::parse();

    let poll = args.poll_config()?;
    let blocked_sample = args.blocked_sample()?;
    let render = RenderOptions { color: !args.no_color };

    if let Some(ref replay) = args.replay {
        // Only a label here; executables are never launched for a replay
        let pid = match args.target() {
            Some(Target::Pid(pid)) => pid,
            _ => Pid(0),
        };
        let backend = ReplayBackend::from_path(replay)
            .with_context(|| format!("Failed to load replay file {}", replay.display()))?;
        let session_config = SessionConfig::new(pid, args.event, args.freq, blocked_sample)?;
        return profile(backend, session_config, poll, render, args.quiet).await;
    }

    let target = args.target().context("Missing required argument: TARGET")?;

    // Run pre-flight checks before anything else
    let backend = EbpfBackend::new(&args.bpf_object);
    run_preflight_checks(backend.object_path())?;

    let (pid, launched) = match target {
        Target::Pid(pid) => (pid, None),
        Target::Executable(path) => {
            let process = LaunchedProcess::spawn(&path)?;
            (process.pid(), Some(process))
        }
    };

    let result = profile_live(&args, backend, pid, poll, blocked_sample, render).await;

    if let Some(process) = launched {
        info!("Terminating launched target {}", process.path().display());
        if let Err(e) = process.terminate() {
            warn!("Failed to terminate launched target: {e}");
        }
    }

    result
}

async fn profile_live(
    args: &Args,
    backend: EbpfBackend,
    pid: Pid,
    poll: PollConfig,
    blocked_sample: bool,
    render: RenderOptions,
) -> Result<()> {
    check_target(pid)?;
    let session_config = SessionConfig::new(pid, args.event, args.freq, blocked_sample)?;
    profile(backend, session_config, poll, render, args.quiet).await
}

async fn profile<B: SamplingBackend>(
    backend: B,
    session_config: SessionConfig,
    poll: PollConfig,
    render: RenderOptions,
    quiet: bool,
) -> Result<()> {
    if !quiet {
        println!("hotspot v{}", env!("CARGO_PKG_VERSION"));
        println!("pid: {}", session_config.pid.0);
        println!(
            "event: {}{}",
            session_config.event,
            if session_config.blocked_sample { " + context-switches (off-CPU)" } else { "" }
        );
        println!("interval: {:?} x {}", poll.interval, poll.count);
    }

    let mut driver = PollingDriver::new(backend, session_config, poll, render, io::stdout());
    let summary = driver.run().await?;

    if !quiet {
        println!(
            "done: {} cycles, {} samples, {} cycles without hotspots",
            summary.cycles, summary.samples, summary.empty_cycles
        );
    }
    Ok(())
}

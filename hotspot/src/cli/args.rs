//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::config::{parse_blocked_flag, parse_interval, PollConfig};
use crate::domain::ConfigError;
use crate::launcher::Target;
use crate::session::{PmuEvent, DEFAULT_FREQUENCY, DEFAULT_OBJECT_PATH};

#[derive(Parser, Debug)]
#[command(
    name = "hotspot",
    version,
    about = "Rank the call stacks a process spends its PMU events in",
    after_help = "\
EXAMPLES:
    sudo hotspot 1 5 0 1234                  Five 1s reports for PID 1234
    sudo hotspot 0.5 10 1 ./my-app           Launch ./my-app, include off-CPU time
    hotspot 1 3 0 --replay samples.json      Replay recorded samples (no root)"
)]
pub struct Args {
    /// Seconds between reports (fractional values allowed)
    #[arg(value_name = "INTERVAL", value_parser = parse_interval_arg)]
    pub interval: f64,

    /// Number of reports
    #[arg(value_name = "COUNT", value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// 1 to also sample time spent off-CPU (blocked), 0 otherwise
    #[arg(value_name = "BLOCKED", value_parser = clap::value_parser!(u8).range(0..=1))]
    pub blocked: u8,

    /// Process ID to attach to, or path of an executable to launch
    #[arg(value_name = "TARGET", required_unless_present = "replay")]
    pub target: Option<String>,

    /// Event to sample on (ignored with BLOCKED=1, which samples cpu-clock)
    #[arg(long, default_value = "cycles")]
    pub event: PmuEvent,

    /// Sampling frequency in Hz
    #[arg(long, value_name = "HZ", default_value_t = DEFAULT_FREQUENCY, value_parser = clap::value_parser!(u64).range(1..))]
    pub freq: u64,

    /// Compiled eBPF object to load
    #[arg(long, value_name = "PATH", default_value = DEFAULT_OBJECT_PATH)]
    pub bpf_object: PathBuf,

    /// Read recorded sample batches from FILE instead of sampling live
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Do not color off-CPU rows
    #[arg(long)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_interval_arg(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{e}"))?;
    parse_interval(secs).map_err(|e| e.to_string())?;
    Ok(secs)
}

impl Args {
    /// # Errors
    /// Returns an error if interval or count are out of range
    pub fn poll_config(&self) -> Result<PollConfig, ConfigError> {
        PollConfig::new(self.interval, self.count)
    }

    /// # Errors
    /// Returns an error if BLOCKED is neither 0 nor 1
    pub fn blocked_sample(&self) -> Result<bool, ConfigError> {
        parse_blocked_flag(self.blocked)
    }

    #[must_use]
    pub fn target(&self) -> Option<Target> {
        self.target.as_deref().map(Target::parse)
    }
}

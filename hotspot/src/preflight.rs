//! Pre-flight checks for hotspot
//!
//! Validates system requirements before attempting to load eBPF programs.
//! Provides clear, actionable error messages when requirements aren't met.

#![allow(unsafe_code)] // geteuid() requires unsafe

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::domain::Pid;

/// Minimum kernel version required for the eBPF ring buffer
const MIN_KERNEL_VERSION: (u32, u32) = (5, 8);

/// Run the system checks before eBPF loading (and before launching a target)
///
/// # Errors
/// Returns the first unmet requirement
pub fn run_preflight_checks(object_path: &Path) -> Result<()> {
    check_privileges()?;
    check_kernel_version()?;
    check_object_exists(object_path)?;
    Ok(())
}

/// Check that the target process can be profiled
///
/// # Errors
/// Returns an error if the process is gone or its maps are unreadable
pub fn check_target(pid: Pid) -> Result<()> {
    check_process_exists(pid)?;
    check_proc_access(pid)
}

/// Check if running with sufficient privileges for eBPF
fn check_privileges() -> Result<()> {
    if unsafe { libc::geteuid() } == 0 {
        return Ok(());
    }

    // CAP_BPF + CAP_PERFMON would also do, but checking capabilities
    // needs more than libc; require root
    bail!(
        "Permission denied: hotspot requires root privileges to load eBPF programs.\n\n\
         Run with: sudo hotspot ...\n\
         To analyse recorded samples without root, use --replay <FILE>."
    );
}

/// Parse "major.minor" out of a kernel release such as "6.1.0-arch1-1"
fn parse_kernel_release(release: &str) -> Option<(u32, u32)> {
    let mut parts = release.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.chars().take_while(char::is_ascii_digit).collect::<String>().parse().ok()?;
    Some((major, minor))
}

/// Check if the kernel version is sufficient for eBPF features
fn check_kernel_version() -> Result<()> {
    let version_str = std::fs::read_to_string("/proc/version")
        .context("Failed to read kernel version from /proc/version")?;

    // "Linux version 5.15.0-generic ..."
    let release = version_str.split_whitespace().nth(2).unwrap_or("unknown");

    // Can't parse, assume it's fine
    let Some((major, minor)) = parse_kernel_release(release) else {
        return Ok(());
    };

    if (major, minor) < MIN_KERNEL_VERSION {
        bail!(
            "Kernel version {major}.{minor} is too old.\n\n\
             hotspot requires Linux {}.{} or newer for eBPF ring buffer support.\n\
             Current kernel: {release}",
            MIN_KERNEL_VERSION.0,
            MIN_KERNEL_VERSION.1,
        );
    }

    Ok(())
}

/// Check that the compiled eBPF object is where we will load it from
fn check_object_exists(object_path: &Path) -> Result<()> {
    if !object_path.is_file() {
        bail!(
            "eBPF object not found: {}\n\n\
             Build it with: cargo xtask build-ebpf\n\
             or point --bpf-object at an existing build.",
            object_path.display()
        );
    }
    Ok(())
}

/// Check if the target process exists
///
/// # Errors
/// Returns an error if there is no `/proc/<pid>`
pub fn check_process_exists(pid: Pid) -> Result<()> {
    let pid = pid.0;
    if !Path::new(&format!("/proc/{pid}")).exists() {
        bail!(
            "Process {pid} not found.\n\n\
             Is the process still running? Check with: ps -p {pid}"
        );
    }
    Ok(())
}

/// Check if we can read the process's memory maps
///
/// # Errors
/// Returns an error if `/proc/<pid>/maps` is unreadable
pub fn check_proc_access(pid: Pid) -> Result<()> {
    let pid = pid.0;
    let maps_path = format!("/proc/{pid}/maps");
    std::fs::read_to_string(&maps_path).with_context(|| {
        format!(
            "Cannot read {maps_path}\n\n\
             This usually means:\n\
             - The process doesn't exist (check: ps -p {pid})\n\
             - Permission denied (run with sudo)\n\
             - /proc is not mounted"
        )
    })?;
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::Command;

const EBPF_PACKAGE: &str = "hotspot-ebpf";

#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Parser)]
enum Cmd {
    /// Build the kernel-side sampler object
    BuildEbpf {
        #[arg(long, default_value = "bpfel-unknown-none")]
        target: String,
        /// Accepted for symmetry with cargo; the object is always built in release
        #[arg(long)]
        release: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Cmd::BuildEbpf { target, release: _ } => build_ebpf(&target)?,
    }

    Ok(())
}

/// Path of the object the userspace session loads by default.
fn object_path(target: &str) -> PathBuf {
    ["target", target, "release", "hotspot"].iter().collect()
}

fn build_ebpf(target: &str) -> Result<()> {
    // Debug builds pull in formatting code the BPF linker rejects
    let status = Command::new("cargo")
        .args(["+nightly", "build", "--package", EBPF_PACKAGE, "--target", target])
        .args(["-Z", "build-std=core", "--release"])
        .status()
        .context("Failed to run cargo for the eBPF build")?;

    if !status.success() {
        anyhow::bail!("Failed to build {EBPF_PACKAGE}");
    }

    println!("✓ eBPF sampler built");
    println!("  object: {}", object_path(target).display());

    Ok(())
}

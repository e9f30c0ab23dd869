//! Busy workload - a profiling target with clear hotspots
//!
//! One thread burns CPU in two functions with a 3:1 split, another sleeps
//! most of the time (shows up as off-CPU time with BLOCKED=1).
//!
//! Run with: cargo run --release --example busy-workload
//! Then:     sudo hotspot 1 5 1 <PID>

use std::hint::black_box;
use std::thread;
use std::time::{Duration, Instant};

#[inline(never)]
fn hash_rounds(seed: u64, rounds: u64) -> u64 {
    let mut x = seed;
    for _ in 0..rounds {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
    }
    x
}

#[inline(never)]
fn heavy_compute() -> u64 {
    hash_rounds(black_box(0x9E37_79B9_7F4A_7C15), 3_000_000)
}

#[inline(never)]
fn light_compute() -> u64 {
    hash_rounds(black_box(0xD1B5_4A32_D192_ED03), 1_000_000)
}

#[inline(never)]
fn sleepy_wait() {
    thread::sleep(Duration::from_millis(50));
}

fn main() {
    println!("busy-workload PID: {}", std::process::id());

    let sleeper = thread::Builder::new()
        .name("sleeper".to_string())
        .spawn(|| loop {
            sleepy_wait();
        })
        .expect("Failed to spawn sleeper thread");

    let start = Instant::now();
    let mut acc = 0u64;
    while start.elapsed() < Duration::from_secs(120) {
        acc = acc.wrapping_add(heavy_compute());
        acc = acc.wrapping_add(light_compute());
    }
    println!("done ({acc:x})");

    drop(sleeper);
}

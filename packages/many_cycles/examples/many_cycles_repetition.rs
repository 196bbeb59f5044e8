//! Compares the fastest achievable throughput of two ways to fill a buffer.
//!
//! Run with: `cargo run --release --example many_cycles_repetition`.
//!
//! Each wave keeps running until it goes two seconds without finding a faster trial. Set
//! `RUST_LOG=many_cycles=debug` to see every new minimum as a log event.

use std::hint::black_box;
use std::time::Duration;

use many_cycles::{Clock, RepetitionTester};
use tracing_subscriber::EnvFilter;

const BUFFER_SIZE: usize = 16 * 1024 * 1024;

fn main() -> many_cycles::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let timer_frequency = Clock::new().estimate_cycle_frequency(Duration::from_millis(100));
    let byte_count = BUFFER_SIZE as u64;

    let mut buffer = vec![0_u8; BUFFER_SIZE];

    println!("--- fill (reused buffer) ---");
    let mut reused = RepetitionTester::builder().seconds_to_try(2.0).build();
    reused.new_test_wave(byte_count, timer_frequency)?;
    reused.repeat(|tester| {
        tester.measure(|| buffer.fill(0xAB));
        black_box(&buffer);
        tester.count_bytes(byte_count);
    })?;

    println!();
    println!("--- fill (fresh allocation) ---");
    let mut fresh = RepetitionTester::builder().seconds_to_try(2.0).build();
    fresh.new_test_wave(byte_count, timer_frequency)?;
    fresh.repeat(|tester| {
        let fresh_buffer = tester.measure(|| {
            let mut fresh_buffer = vec![0_u8; BUFFER_SIZE];
            fresh_buffer.fill(0xAB);
            fresh_buffer
        });
        black_box(&fresh_buffer);
        tester.count_bytes(byte_count);
    })?;

    Ok(())
}

//! Profiles a small parse-and-sum workload with nested zones and prints the report.
//!
//! Run with: `cargo run --release --example many_cycles_profile`.
//!
//! Set `RUST_LOG=many_cycles=debug` to also see the calibration diagnostics.
#![expect(
    clippy::arithmetic_side_effects,
    reason = "this is example code that does not need production-level safety"
)]

use std::fmt::Write;
use std::hint::black_box;

use many_cycles::{begin_profile, end_and_print_profile, zone};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    begin_profile();

    let input = {
        zone!("generate");
        generate_input(200_000)
    };

    let values = parse(&input);
    let total = sum(&values);

    println!("Parsed {} values with a total of {total}", values.len());
    println!();

    end_and_print_profile();
}

fn generate_input(count: u32) -> String {
    let mut input = String::new();

    for i in 0..count {
        write!(input, "{},", i.wrapping_mul(2_654_435_761) % 100_000)
            .expect("writing to a String cannot fail");
    }

    input
}

fn parse(input: &str) -> Vec<u64> {
    zone!("parse", input.len() as u64);

    input
        .split(',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            zone!("parse_token");
            token.parse::<u64>().expect("generated input only contains numbers")
        })
        .collect()
}

fn sum(values: &[u64]) -> u64 {
    zone!("sum", (values.len() * size_of::<u64>()) as u64);

    black_box(values.iter().sum())
}

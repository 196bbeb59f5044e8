#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Cycle-accurate measurement tools for hot code paths.
//!
//! This package provides two complementary tools, both measuring with the processor cycle
//! counter (`rdtsc` on x86, `cntvct_el0` on AArch64):
//!
//! - [`Profiler`] - a hierarchical zone profiler that attributes elapsed cycles to named
//!   zones, separating each zone's own (exclusive) time from the time of zones nested
//!   inside it, and reporting throughput for zones that declare how many bytes they process.
//! - [`RepetitionTester`] - runs one workload over and over until its fastest run stops
//!   improving, reporting the minimum, maximum and average cost together with throughput
//!   and the page faults charged to the process.
//!
//! Supporting types read the underlying counters directly: [`Clock`] for the cycle counter
//! and wall clock (including estimating the cycle counter frequency) and [`OsMetrics`] for
//! page fault counts.
//!
//! This package is meant for development and performance investigations, not production
//! telemetry. The profiler records into a fixed table of [`ANCHOR_CAPACITY`] anchors and never
//! allocates while measuring, so it can stay enabled around very short regions of code.
//!
//! # Profiling zones
//!
//! The [`zone!`] macro profiles the rest of the enclosing block on the current thread's
//! profiler, allocating one anchor per call site:
//!
//! ```
//! use many_cycles::{begin_profile, end_and_print_profile, zone};
//!
//! fn parse(input: &[u8]) -> usize {
//!     zone!("parse", input.len() as u64);
//!
//!     input.iter().filter(|&&b| b == b',').count()
//! }
//!
//! fn main() {
//!     begin_profile();
//!
//!     let input = b"1,2,3,4,5,6,7,8".repeat(1000);
//!
//!     {
//!         zone!("process");
//!         std::hint::black_box(parse(&input));
//!     }
//!
//!     // Total time: 0.1234ms (CPU freq 2995301000)
//!     //   process[1]: 1234 (2.10%, 100.00% w/children)
//!     //   parse[1]: 57432 (97.90%)  0.014mb at 0.41gb/s
//!     end_and_print_profile();
//! }
//! ```
//!
//! # Repetition testing
//!
//! ```
//! use std::time::Duration;
//!
//! use many_cycles::{Clock, RepetitionTester};
//!
//! let frequency = Clock::new().estimate_cycle_frequency(Duration::from_millis(10));
//! let source = vec![1_u8; 16 * 1024];
//! let mut destination = vec![0_u8; 16 * 1024];
//!
//! let mut tester = RepetitionTester::builder()
//!     .seconds_to_try(0.05)
//!     .print_new_minimums(false)
//!     .build();
//!
//! tester.new_test_wave(source.len() as u64, frequency).unwrap();
//!
//! tester
//!     .repeat(|tester| {
//!         tester.measure(|| destination.copy_from_slice(&source));
//!         tester.count_bytes(source.len() as u64);
//!     })
//!     .unwrap();
//!
//! println!("{}", tester.results());
//! ```
//!
//! # Threading
//!
//! Each thread profiles into its own profiler. Reports from different threads can be combined
//! with [`ProfileReport::merge()`], which matches anchors by [`AnchorId`]. A repetition tester
//! measures whichever thread drives it.
//!
//! # Logging
//!
//! Diagnostics (calibration problems, wave transitions, new minima and tester failures) are
//! emitted via `tracing`. Nothing is logged unless the application installs a subscriber.

mod anchor;
mod clock;
mod error;
mod macros;
mod os_metrics;
mod pal;
mod profile_report;
mod profiler;
mod repetition;
mod repetition_builder;
mod repetition_results;
mod zone;

pub use anchor::{ANCHOR_CAPACITY, AnchorId};
pub use clock::{
    Clock, DEFAULT_CALIBRATION_WAIT, WallClockReading, cycles_to_seconds,
    estimate_cycle_frequency, gigabytes_per_second, read_cycle_counter, read_wall_clock,
};
pub use error::{Error, Result};
pub use os_metrics::{OsMetrics, read_page_fault_count};
pub use profile_report::{ProfileReport, ReportAnchor};
pub use profiler::{
    Profiler, begin_profile, end_and_print_profile, end_profile, open_zone, thread_profiler,
};
pub use repetition::{RepetitionTester, TestMode};
pub use repetition_builder::{DEFAULT_SECONDS_TO_TRY, RepetitionTesterBuilder};
pub use repetition_results::{RepetitionAverage, RepetitionResults, RepetitionValue};
pub use zone::Zone;

//! Wall clock and page fault bindings for Unix-like operating systems.

use std::{io, mem};

use libc::{CLOCK_MONOTONIC, RUSAGE_SELF, rusage, timespec};

/// `CLOCK_MONOTONIC` is reported in nanoseconds.
const NANOS_PER_SECOND: u64 = 1_000_000_000;

pub(crate) const fn wall_clock_frequency() -> u64 {
    NANOS_PER_SECOND
}

#[expect(
    clippy::cast_sign_loss,
    clippy::arithmetic_side_effects,
    reason = "monotonic clock values are never negative and fit in u64 nanoseconds for ~584 years"
)]
pub(crate) fn wall_clock_ticks() -> u64 {
    // SAFETY: All-zero is a valid initial value for this type.
    let mut ts: timespec = unsafe { mem::zeroed() };

    // SAFETY: We are passing valid arguments, no other safety requirements.
    let result = unsafe { libc::clock_gettime(CLOCK_MONOTONIC, &raw mut ts) };

    assert!(result == 0, "{}", io::Error::last_os_error());

    ts.tv_sec as u64 * NANOS_PER_SECOND + ts.tv_nsec as u64
}

#[expect(
    clippy::cast_sign_loss,
    reason = "fault counters are never negative"
)]
pub(crate) fn page_fault_count() -> u64 {
    // SAFETY: All-zero is a valid initial value for this type.
    let mut usage: rusage = unsafe { mem::zeroed() };

    // SAFETY: We are passing valid arguments, no other safety requirements.
    let result = unsafe { libc::getrusage(RUSAGE_SELF, &raw mut usage) };

    assert!(result == 0, "{}", io::Error::last_os_error());

    // Minor faults are serviced without I/O, major faults required I/O.
    (usage.ru_minflt as u64).wrapping_add(usage.ru_majflt as u64)
}

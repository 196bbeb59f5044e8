//! Fake platform implementation for testing.

use std::sync::{Arc, Mutex};

use crate::pal::abstractions::Platform;

/// Internal state for the fake platform that can be shared between clones.
#[derive(Debug)]
struct FakePlatformState {
    cycles: u64,
    wall_clock_ticks: u64,
    wall_clock_frequency: u64,
    page_faults: u64,

    /// Every wall clock read first advances the wall clock by this many ticks...
    wall_ticks_per_read: u64,

    /// ...and the cycle counter by this many cycles.
    cycles_per_wall_read: u64,
}

/// Fake implementation of the platform abstraction for testing.
///
/// This implementation allows tests to control the counter values instead of
/// relying on the real processor and operating system. Multiple clones of the same
/// `FakePlatform` share the same underlying state, allowing tests to advance the
/// counters after the platform has been handed to the code under test.
///
/// By default nothing advances on its own. Tests that need a wall clock that moves
/// (e.g. to calibrate the cycle counter) can opt into advancing on every read.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    state: Arc<Mutex<FakePlatformState>>,
}

impl FakePlatform {
    /// Creates a new fake platform with zero counters and a 1 MHz wall clock.
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakePlatformState {
                cycles: 0,
                wall_clock_ticks: 0,
                wall_clock_frequency: 1_000_000,
                page_faults: 0,
                wall_ticks_per_read: 0,
                cycles_per_wall_read: 0,
            })),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakePlatformState) -> R) -> R {
        f(&mut self
            .state
            .lock()
            .expect("FakePlatform state lock should not be poisoned"))
    }

    /// Sets the cycle counter value.
    pub(crate) fn set_cycles(&self, cycles: u64) {
        self.with_state(|state| state.cycles = cycles);
    }

    /// Advances the cycle counter, simulating work being done.
    pub(crate) fn advance_cycles(&self, cycles: u64) {
        self.with_state(|state| {
            state.cycles = state
                .cycles
                .checked_add(cycles)
                .expect("test cycle counter overflow");
        });
    }

    pub(crate) fn set_wall_clock_frequency(&self, ticks_per_second: u64) {
        self.with_state(|state| state.wall_clock_frequency = ticks_per_second);
    }

    pub(crate) fn advance_wall_clock(&self, ticks: u64) {
        self.with_state(|state| {
            state.wall_clock_ticks = state
                .wall_clock_ticks
                .checked_add(ticks)
                .expect("test wall clock overflow");
        });
    }

    pub(crate) fn advance_page_faults(&self, faults: u64) {
        self.with_state(|state| {
            state.page_faults = state
                .page_faults
                .checked_add(faults)
                .expect("test page fault counter overflow");
        });
    }

    /// Makes every wall clock read advance the wall clock and the cycle counter,
    /// as if the processor was running at a fixed frequency relative to the wall clock.
    pub(crate) fn advance_on_wall_clock_read(&self, wall_ticks: u64, cycles: u64) {
        self.with_state(|state| {
            state.wall_ticks_per_read = wall_ticks;
            state.cycles_per_wall_read = cycles;
        });
    }
}

impl Platform for FakePlatform {
    fn cycle_counter(&self) -> u64 {
        self.with_state(|state| state.cycles)
    }

    fn wall_clock_ticks(&self) -> u64 {
        self.with_state(|state| {
            state.wall_clock_ticks = state.wall_clock_ticks.wrapping_add(state.wall_ticks_per_read);
            state.cycles = state.cycles.wrapping_add(state.cycles_per_wall_read);
            state.wall_clock_ticks
        })
    }

    fn wall_clock_frequency(&self) -> u64 {
        self.with_state(|state| state.wall_clock_frequency)
    }

    fn page_fault_count(&self) -> u64 {
        self.with_state(|state| state.page_faults)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn initializes_with_zero_counters() {
        let platform = FakePlatform::new();

        assert_eq!(platform.cycle_counter(), 0);
        assert_eq!(platform.wall_clock_ticks(), 0);
        assert_eq!(platform.wall_clock_frequency(), 1_000_000);
        assert_eq!(platform.page_fault_count(), 0);
    }

    #[test]
    fn advances_counters() {
        let platform = FakePlatform::new();

        platform.set_cycles(10);
        platform.advance_cycles(5);
        platform.advance_wall_clock(20);
        platform.advance_page_faults(2);

        assert_eq!(platform.cycle_counter(), 15);
        assert_eq!(platform.wall_clock_ticks(), 20);
        assert_eq!(platform.page_fault_count(), 2);
    }

    #[test]
    fn wall_clock_read_advances_when_configured() {
        let platform = FakePlatform::new();
        platform.advance_on_wall_clock_read(1_000, 3_000);

        assert_eq!(platform.wall_clock_ticks(), 1_000);
        assert_eq!(platform.wall_clock_ticks(), 2_000);
        assert_eq!(platform.cycle_counter(), 6_000);

        // Reading the cycle counter alone does not move anything.
        assert_eq!(platform.cycle_counter(), 6_000);
    }

    #[test]
    fn shared_state_between_clones() {
        let platform1 = FakePlatform::new();
        let platform2 = platform1.clone();

        platform1.advance_cycles(100);
        assert_eq!(platform2.cycle_counter(), 100);

        platform2.advance_page_faults(7);
        assert_eq!(platform1.page_fault_count(), 7);
    }
}

//! Platform abstraction trait definitions.

use std::fmt::Debug;

/// Provides the raw counters that all measurements are built from.
///
/// This trait abstracts the underlying hardware and operating system mechanisms,
/// allowing for both real implementations (processor instructions and system calls)
/// and fake implementations (for testing).
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Reads the processor cycle counter.
    ///
    /// The value is monotonic within one process but has no defined relation to
    /// wall clock time until it has been calibrated against the wall clock.
    fn cycle_counter(&self) -> u64;

    /// Reads the operating system wall clock, in ticks.
    fn wall_clock_ticks(&self) -> u64;

    /// The fixed number of wall clock ticks per second.
    fn wall_clock_frequency(&self) -> u64;

    /// The number of memory page faults charged to the current process so far.
    fn page_fault_count(&self) -> u64;
}

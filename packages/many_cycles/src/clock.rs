//! Cycle counter and wall clock access, plus calibration of one against the other.

use std::time::Duration;

use crate::pal::{Platform, PlatformFacade};

/// How long [`Clock::estimate_cycle_frequency()`] spins by default when the profiler
/// needs to convert cycles to wall clock time.
pub const DEFAULT_CALIBRATION_WAIT: Duration = Duration::from_millis(100);

/// If the wall clock reports the same value this many times in a row, we consider it stuck
/// and give up on calibration instead of spinning forever.
///
/// Even the coarsest clocks we know of (a few milliseconds of granularity) advance long
/// before a tight loop gets anywhere near this many reads.
pub(crate) const STALLED_WALL_CLOCK_READS: u32 = 1_000_000;

const GIBIBYTE: f64 = 1024.0 * 1024.0 * 1024.0;

/// A reading of the operating system wall clock.
///
/// The tick count has no meaningful epoch - only differences between two readings
/// taken in the same process are meaningful.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WallClockReading {
    ticks: u64,
    ticks_per_second: u64,
}

impl WallClockReading {
    /// The wall clock value, in ticks.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The fixed frequency of the wall clock, in ticks per second.
    #[must_use]
    pub fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }
}

/// Reads the processor cycle counter and the operating system wall clock.
///
/// The cycle counter is the measurement source for everything in this package. It is cheap
/// to read (a single instruction on x86 and AArch64) but ticks at a processor-specific rate,
/// which we estimate by spinning on the wall clock for a short while.
///
/// Cloning a `Clock` is cheap.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use many_cycles::Clock;
///
/// let clock = Clock::new();
///
/// let start = clock.cycles();
/// let mut sum = 0_u64;
/// for i in 0..10_000_u64 {
///     sum = sum.wrapping_add(i);
/// }
/// std::hint::black_box(sum);
/// let elapsed = clock.cycles().wrapping_sub(start);
///
/// let frequency = clock.estimate_cycle_frequency(Duration::from_millis(10));
/// println!("{elapsed} cycles at ~{frequency} Hz");
/// ```
#[derive(Clone, Debug)]
pub struct Clock {
    platform: PlatformFacade,
}

impl Clock {
    /// Creates a clock that reads the real processor and operating system counters.
    #[must_use]
    pub fn new() -> Self {
        Self::from_pal(PlatformFacade::real())
    }

    #[must_use]
    pub(crate) fn from_pal(platform: PlatformFacade) -> Self {
        Self { platform }
    }

    /// Reads the processor cycle counter.
    ///
    /// The value is monotonic within the current process but is not comparable across
    /// processes, nor convertible to wall clock time without [calibration][Self::estimate_cycle_frequency].
    #[inline]
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.platform.cycle_counter()
    }

    /// Reads the operating system wall clock together with its fixed frequency.
    #[must_use]
    pub fn wall_clock(&self) -> WallClockReading {
        WallClockReading {
            ticks: self.platform.wall_clock_ticks(),
            ticks_per_second: self.platform.wall_clock_frequency(),
        }
    }

    /// Estimates the frequency of the cycle counter, in cycles per second.
    ///
    /// This busy-waits on the wall clock for `wait`, sampling the cycle counter at both ends,
    /// and scales the cycles elapsed by the wall clock time elapsed.
    ///
    /// Returns zero if no wall clock time elapsed during the wait (because `wait` was zero,
    /// the wall clock reports a frequency of zero or the wall clock is stuck). Callers must
    /// treat zero as "frequency unknown" and skip any conversion to wall clock time.
    #[must_use]
    pub fn estimate_cycle_frequency(&self, wait: Duration) -> u64 {
        let wall_frequency = self.platform.wall_clock_frequency();

        let wait_ticks = u128::from(wall_frequency)
            .checked_mul(wait.as_nanos())
            .and_then(|ticks| ticks.checked_div(1_000_000_000))
            .map_or(u64::MAX, |ticks| u64::try_from(ticks).unwrap_or(u64::MAX));

        let wall_start = self.platform.wall_clock_ticks();
        let cycles_start = self.platform.cycle_counter();

        let mut wall_elapsed = 0_u64;
        let mut last_wall_ticks = wall_start;
        let mut stalled_reads = 0_u32;

        while wall_elapsed < wait_ticks {
            let wall_now = self.platform.wall_clock_ticks();

            if wall_now == last_wall_ticks {
                stalled_reads = stalled_reads.saturating_add(1);

                if stalled_reads >= STALLED_WALL_CLOCK_READS {
                    break;
                }
            } else {
                stalled_reads = 0;
                last_wall_ticks = wall_now;
            }

            wall_elapsed = wall_now.saturating_sub(wall_start);
        }

        let cycles_elapsed = self.platform.cycle_counter().wrapping_sub(cycles_start);

        if wall_elapsed == 0 {
            tracing::warn!(
                ?wait,
                wall_frequency,
                "no wall clock time elapsed while calibrating the cycle counter; frequency is unknown"
            );
            return 0;
        }

        let frequency = u128::from(cycles_elapsed)
            .checked_mul(u128::from(wall_frequency))
            .and_then(|scaled| scaled.checked_div(u128::from(wall_elapsed)))
            .map_or(u64::MAX, |frequency| {
                u64::try_from(frequency).unwrap_or(u64::MAX)
            });

        tracing::debug!(frequency, ?wait, "estimated cycle counter frequency");

        frequency
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the processor cycle counter.
///
/// See [`Clock::cycles()`].
#[inline]
#[must_use]
pub fn read_cycle_counter() -> u64 {
    Clock::new().cycles()
}

/// Reads the operating system wall clock together with its fixed frequency.
///
/// See [`Clock::wall_clock()`].
#[must_use]
pub fn read_wall_clock() -> WallClockReading {
    Clock::new().wall_clock()
}

/// Estimates the frequency of the processor cycle counter by spinning for `wait`.
///
/// See [`Clock::estimate_cycle_frequency()`].
#[must_use]
pub fn estimate_cycle_frequency(wait: Duration) -> u64 {
    Clock::new().estimate_cycle_frequency(wait)
}

/// Converts a cycle count to seconds, given the cycle counter frequency.
///
/// Returns zero if the frequency is unknown (zero).
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    reason = "frequencies are far below the 2^52 limit of exact f64 integers"
)]
pub fn cycles_to_seconds(cycles: f64, cycle_frequency: u64) -> f64 {
    if cycle_frequency == 0 {
        0.0
    } else {
        cycles / cycle_frequency as f64
    }
}

/// Calculates throughput in gigabytes (2^30 bytes) per second.
///
/// Returns zero if no time elapsed.
#[must_use]
pub fn gigabytes_per_second(bytes: f64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        bytes / (GIBIBYTE * seconds)
    } else {
        0.0
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::pal::FakePlatform;

    fn fake_clock() -> (Clock, FakePlatform) {
        let fake_platform = FakePlatform::new();
        let clock = Clock::from_pal(PlatformFacade::fake(fake_platform.clone()));
        (clock, fake_platform)
    }

    #[test]
    fn reads_cycles_from_pal() {
        let (clock, fake_platform) = fake_clock();
        fake_platform.set_cycles(1234);

        assert_eq!(clock.cycles(), 1234);
    }

    #[test]
    fn reads_wall_clock_from_pal() {
        let (clock, fake_platform) = fake_clock();
        fake_platform.set_wall_clock_frequency(10_000);
        fake_platform.advance_wall_clock(55);

        let reading = clock.wall_clock();

        assert_eq!(reading.ticks(), 55);
        assert_eq!(reading.ticks_per_second(), 10_000);
    }

    #[test]
    fn estimates_frequency_from_cycles_per_wall_tick() {
        let (clock, fake_platform) = fake_clock();

        // 1 MHz wall clock, each read is one millisecond later and 3 million cycles later.
        fake_platform.advance_on_wall_clock_read(1_000, 3_000_000);

        let frequency = clock.estimate_cycle_frequency(Duration::from_millis(100));

        assert_eq!(frequency, 3_000_000_000);
    }

    #[test]
    fn zero_wait_gives_unknown_frequency() {
        let (clock, fake_platform) = fake_clock();
        fake_platform.advance_on_wall_clock_read(1_000, 3_000_000);

        assert_eq!(clock.estimate_cycle_frequency(Duration::ZERO), 0);
    }

    #[test]
    fn zero_wall_clock_frequency_gives_unknown_frequency() {
        let (clock, fake_platform) = fake_clock();
        fake_platform.set_wall_clock_frequency(0);
        fake_platform.advance_on_wall_clock_read(1_000, 3_000_000);

        assert_eq!(clock.estimate_cycle_frequency(DEFAULT_CALIBRATION_WAIT), 0);
    }

    #[test]
    fn stuck_wall_clock_gives_unknown_frequency() {
        let (clock, fake_platform) = fake_clock();

        // The wall clock never advances but the cycle counter does.
        fake_platform.advance_on_wall_clock_read(0, 10);

        assert_eq!(clock.estimate_cycle_frequency(DEFAULT_CALIBRATION_WAIT), 0);
    }

    #[test]
    fn cycles_to_seconds_handles_unknown_frequency() {
        assert!(cycles_to_seconds(1_000.0, 0).abs() < f64::EPSILON);
        assert!((cycles_to_seconds(3_000_000_000.0, 3_000_000_000) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gigabytes_per_second_uses_binary_gigabytes() {
        assert!((gigabytes_per_second(GIBIBYTE * 2.0, 1.0) - 2.0).abs() < f64::EPSILON);
        assert!((gigabytes_per_second(GIBIBYTE, 0.5) - 2.0).abs() < f64::EPSILON);
        assert!(gigabytes_per_second(GIBIBYTE, 0.0).abs() < f64::EPSILON);
    }

    static_assertions::assert_impl_all!(Clock: Send, Sync, Clone);
    static_assertions::assert_impl_all!(WallClockReading: Send, Sync, Copy);
}

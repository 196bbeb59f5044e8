//! Real platform implementation using the processor and operating system.

use crate::pal::abstractions::Platform;
use crate::pal::os;

/// Real implementation of the platform abstraction.
///
/// The cycle counter is read directly from the processor. Everything else is
/// delegated to the operating system specific module selected at build time.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RealPlatform;

impl Platform for RealPlatform {
    #[inline]
    fn cycle_counter(&self) -> u64 {
        read_cycle_counter()
    }

    fn wall_clock_ticks(&self) -> u64 {
        os::wall_clock_ticks()
    }

    fn wall_clock_frequency(&self) -> u64 {
        os::wall_clock_frequency()
    }

    fn page_fault_count(&self) -> u64 {
        os::page_fault_count()
    }
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn read_cycle_counter() -> u64 {
    // SAFETY: RDTSC is available on every x86_64 processor and only reads a register.
    unsafe { core::arch::x86_64::_rdtsc() }
}

#[cfg(target_arch = "x86")]
#[inline(always)]
fn read_cycle_counter() -> u64 {
    // SAFETY: RDTSC is available on every processor Rust supports for this target.
    unsafe { core::arch::x86::_rdtsc() }
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
fn read_cycle_counter() -> u64 {
    let ticks: u64;

    // SAFETY: CNTVCT_EL0 is readable from user mode on every AArch64 implementation
    // and reading it has no side effects.
    unsafe {
        core::arch::asm!(
            "mrs {ticks}, cntvct_el0",
            ticks = out(reg) ticks,
            options(nomem, nostack, preserves_flags)
        );
    }

    ticks
}

// Processors without a user-mode counter fall back to nanoseconds of a monotonic clock.
// Calibration against the wall clock still works, it simply reports ~1 GHz.
#[cfg(not(any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")))]
fn read_cycle_counter() -> u64 {
    use std::sync::LazyLock;
    use std::time::Instant;

    static EPOCH: LazyLock<Instant> = LazyLock::new(Instant::now);

    u64::try_from(EPOCH.elapsed().as_nanos())
        .expect("process has been running for over 500 years - impossible")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore)] // Miri cannot execute inline assembly or talk to the OS.
    fn cycle_counter_is_monotonic() {
        let platform = RealPlatform;

        let first = platform.cycle_counter();
        let second = platform.cycle_counter();

        assert!(second >= first, "{second} < {first}");
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Miri cannot talk to the real platform.
    fn wall_clock_is_monotonic_and_has_frequency() {
        let platform = RealPlatform;

        let first = platform.wall_clock_ticks();
        let second = platform.wall_clock_ticks();

        assert!(second >= first, "{second} < {first}");
        assert_ne!(platform.wall_clock_frequency(), 0);
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Miri cannot talk to the real platform.
    fn page_fault_count_never_decreases() {
        let platform = RealPlatform;

        let before = platform.page_fault_count();

        // Touch fresh memory so there is at least a chance of new faults.
        let buffer = vec![1_u8; 4 * 1024 * 1024];
        std::hint::black_box(&buffer);

        let after = platform.page_fault_count();

        assert!(after >= before, "{after} < {before}");
    }
}

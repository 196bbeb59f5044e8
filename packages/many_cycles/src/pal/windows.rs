//! Wall clock and page fault bindings for Windows.

use std::mem;
use std::sync::OnceLock;

use ::windows::Win32::System::Performance::{QueryPerformanceCounter, QueryPerformanceFrequency};
use ::windows::Win32::System::ProcessStatus::{GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS};
use ::windows::Win32::System::Threading::GetCurrentProcess;

#[expect(
    clippy::cast_sign_loss,
    reason = "the performance counter is never negative"
)]
pub(crate) fn wall_clock_ticks() -> u64 {
    let mut ticks = 0_i64;

    // SAFETY: We are passing a valid pointer to a local, no other safety requirements.
    unsafe { QueryPerformanceCounter(&raw mut ticks) }
        .expect("QueryPerformanceCounter never fails on supported Windows versions");

    ticks as u64
}

#[expect(
    clippy::cast_sign_loss,
    reason = "the performance counter frequency is never negative"
)]
pub(crate) fn wall_clock_frequency() -> u64 {
    // The frequency is fixed at boot, so we only ask once.
    static FREQUENCY: OnceLock<u64> = OnceLock::new();

    *FREQUENCY.get_or_init(|| {
        let mut frequency = 0_i64;

        // SAFETY: We are passing a valid pointer to a local, no other safety requirements.
        unsafe { QueryPerformanceFrequency(&raw mut frequency) }
            .expect("QueryPerformanceFrequency never fails on supported Windows versions");

        frequency as u64
    })
}

pub(crate) fn page_fault_count() -> u64 {
    let size = u32::try_from(mem::size_of::<PROCESS_MEMORY_COUNTERS>())
        .expect("PROCESS_MEMORY_COUNTERS is a few dozen bytes");

    let mut counters = PROCESS_MEMORY_COUNTERS {
        cb: size,
        ..Default::default()
    };

    // SAFETY: The pseudo handle of the current process is always valid and the
    // counters structure is sized as declared in `cb`.
    unsafe { GetProcessMemoryInfo(GetCurrentProcess(), &raw mut counters, size) }
        .expect("querying memory counters of the current process never fails");

    u64::from(counters.PageFaultCount)
}

//! Operating system metrics charged to the current process.

use crate::pal::{Platform, PlatformFacade};

/// Reads operating system counters for the current process.
///
/// Create it via [`OsMetrics::initialize()`] before taking the first reading. Initialization
/// is free and captures no baseline: every reading counts from process start. On Windows page
/// faults are read through the current process pseudo handle on each call; on Unix-like systems
/// via `getrusage()`. On other platforms the page fault count is always zero.
///
/// # Examples
///
/// ```
/// use many_cycles::OsMetrics;
///
/// let metrics = OsMetrics::initialize();
///
/// let before = metrics.page_fault_count();
/// let buffer = vec![1_u8; 1024 * 1024];
/// std::hint::black_box(&buffer);
/// let after = metrics.page_fault_count();
///
/// println!("touching 1 MB caused {} page faults", after.saturating_sub(before));
/// ```
#[derive(Clone, Debug)]
pub struct OsMetrics {
    platform: PlatformFacade,
}

impl OsMetrics {
    /// Prepares the operating system metrics for reading.
    #[must_use]
    pub fn initialize() -> Self {
        Self::from_pal(PlatformFacade::real())
    }

    #[must_use]
    pub(crate) fn from_pal(platform: PlatformFacade) -> Self {
        Self { platform }
    }

    /// The number of memory page faults (minor and major) charged to the current process
    /// since it started.
    ///
    /// The value never decreases.
    #[must_use]
    pub fn page_fault_count(&self) -> u64 {
        self.platform.page_fault_count()
    }
}

/// Reads the number of memory page faults charged to the current process.
///
/// See [`OsMetrics::page_fault_count()`].
#[must_use]
pub fn read_page_fault_count() -> u64 {
    OsMetrics::initialize().page_fault_count()
}

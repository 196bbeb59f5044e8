//! Platform facade for switching between real and fake implementations.

use crate::pal::abstractions::Platform;
#[cfg(test)]
use crate::pal::fake::FakePlatform;
use crate::pal::real::RealPlatform;

/// Facade that allows switching between real and fake platform implementations.
///
/// This enum provides a unified interface to either the real platform
/// (using the processor and operating system) or the fake platform (for testing).
#[derive(Clone, Debug)]
pub(crate) enum PlatformFacade {
    /// Real platform implementation.
    Real(RealPlatform),

    /// Fake platform implementation for testing.
    #[cfg(test)]
    Fake(FakePlatform),
}

impl PlatformFacade {
    /// Creates a new platform facade using the real implementation.
    pub(crate) const fn real() -> Self {
        Self::Real(RealPlatform)
    }

    /// Creates a new platform facade using the fake implementation.
    #[cfg(test)]
    pub(crate) fn fake(fake_platform: FakePlatform) -> Self {
        Self::Fake(fake_platform)
    }
}

impl Platform for PlatformFacade {
    #[inline]
    fn cycle_counter(&self) -> u64 {
        match self {
            Self::Real(platform) => platform.cycle_counter(),
            #[cfg(test)]
            Self::Fake(platform) => platform.cycle_counter(),
        }
    }

    fn wall_clock_ticks(&self) -> u64 {
        match self {
            Self::Real(platform) => platform.wall_clock_ticks(),
            #[cfg(test)]
            Self::Fake(platform) => platform.wall_clock_ticks(),
        }
    }

    fn wall_clock_frequency(&self) -> u64 {
        match self {
            Self::Real(platform) => platform.wall_clock_frequency(),
            #[cfg(test)]
            Self::Fake(platform) => platform.wall_clock_frequency(),
        }
    }

    fn page_fault_count(&self) -> u64 {
        match self {
            Self::Real(platform) => platform.page_fault_count(),
            #[cfg(test)]
            Self::Fake(platform) => platform.page_fault_count(),
        }
    }
}

//! Platform abstraction layer for cycle counters, wall clocks and OS metrics.
//!
//! This module provides a platform abstraction that allows switching between
//! the real hardware and operating system (via `libc` or `windows`) and fake
//! implementations for testing purposes.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use self::unix as os;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use self::windows as os;

#[cfg(not(any(unix, windows)))]
mod fallback;
#[cfg(not(any(unix, windows)))]
use self::fallback as os;

pub(crate) use abstractions::Platform;
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;

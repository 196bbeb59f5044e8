//! Hierarchical cycle-counter profiler.

use std::cell::{RefCell, RefMut};
use std::rc::Rc;
use std::time::Duration;

use crate::anchor::AnchorTable;
use crate::{AnchorId, Clock, DEFAULT_CALIBRATION_WAIT, ProfileReport, Zone};

/// Mutable profiler state shared between a [`Profiler`] and its open [`Zone`]s.
#[derive(Debug)]
pub(crate) struct ProfilerState {
    pub(crate) anchors: AnchorTable,

    /// The anchor of the innermost open zone, or the root if no zone is open.
    pub(crate) active_parent: AnchorId,

    session_start: u64,
}

/// Attributes elapsed processor cycles to named zones, including nested zones.
///
/// A profiler owns a fixed-capacity table of anchors (one per instrumented region of code)
/// and tracks which zone is currently innermost, so that when a nested zone closes, its
/// cycles are moved from the exclusive time of the enclosing zone to its own.
///
/// Cloning a `Profiler` creates another handle to the same profiler.
///
/// # Threading
///
/// A profiler is single-threaded. Every thread that wants to profile uses its own profiler
/// (the free functions and the [`zone!`][crate::zone] macro use one per thread automatically)
/// and reports from different threads can be combined via [`ProfileReport::merge()`].
///
/// # Zone discipline
///
/// Zones must close in the reverse order they were opened. This happens automatically
/// when zones are closed by going out of scope. Closing an outer zone before an inner
/// one (e.g. by moving a [`Zone`] somewhere and dropping it late) corrupts the exclusive
/// time of all enclosing anchors. This is not detected - the report is meaningless
/// but nothing crashes.
///
/// # Examples
///
/// ```
/// use many_cycles::{AnchorId, Profiler};
///
/// let profiler = Profiler::new();
/// let parse = AnchorId::new(1);
/// let sum = AnchorId::new(2);
///
/// profiler.begin_profile();
///
/// {
///     let _zone = profiler.open_zone("parse", parse, 4096);
///     // Parse 4096 bytes of input here.
///
///     {
///         let _zone = profiler.open_zone("sum", sum, 0);
///         // Nested work is charged to "sum", not to "parse".
///     }
/// }
///
/// let report = profiler.end_profile();
/// println!("{report}");
/// ```
#[derive(Clone, Debug)]
pub struct Profiler {
    state: Rc<RefCell<ProfilerState>>,
    clock: Clock,
    calibration_wait: Duration,
}

impl Profiler {
    /// Creates a profiler that measures the real processor cycle counter.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Clock::new())
    }

    #[must_use]
    pub(crate) fn with_clock(clock: Clock) -> Self {
        Self {
            state: Rc::new(RefCell::new(ProfilerState {
                anchors: AnchorTable::new(),
                active_parent: AnchorId::ROOT,
                session_start: 0,
            })),
            clock,
            calibration_wait: DEFAULT_CALIBRATION_WAIT,
        }
    }

    /// Sets how long the profiler spins on the wall clock at the end of each session
    /// to estimate the cycle counter frequency.
    ///
    /// Defaults to [`DEFAULT_CALIBRATION_WAIT`]. A zero wait skips calibration, in which
    /// case reports only contain cycle counts.
    #[must_use]
    pub fn with_calibration_wait(self, wait: Duration) -> Self {
        Self {
            calibration_wait: wait,
            ..self
        }
    }

    /// Starts a profiling session by recording the current cycle counter value.
    ///
    /// Call this once before opening any zones.
    pub fn begin_profile(&self) {
        let session_start = self.clock.cycles();
        self.state_mut().session_start = session_start;
    }

    /// Opens a zone that is measured until the returned [`Zone`] is dropped.
    ///
    /// `byte_count` is the number of bytes this zone processes, used to report throughput.
    /// Pass zero for zones where throughput is not meaningful.
    ///
    /// Zones must be closed in the reverse order they were opened (see type-level docs).
    pub fn open_zone(&self, label: &'static str, anchor: AnchorId, byte_count: u64) -> Zone {
        Zone::new(self, label, anchor, byte_count)
    }

    /// Ends the profiling session and returns a report of every anchor that accumulated time.
    ///
    /// This spins for the configured calibration wait to estimate the cycle counter frequency.
    /// All anchors are reset afterwards, ready for the next session.
    #[must_use]
    pub fn end_profile(&self) -> ProfileReport {
        let session_end = self.clock.cycles();
        let cycle_frequency = self.clock.estimate_cycle_frequency(self.calibration_wait);

        let mut state = self.state_mut();

        let total_cycles = session_end.wrapping_sub(state.session_start);
        let report = ProfileReport::new(total_cycles, cycle_frequency, state.anchors.used());

        state.anchors.reset();

        report
    }

    /// Ends the profiling session and prints the report to stdout.
    ///
    /// This is a convenience method equivalent to `self.end_profile().print_to_stdout()`.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn end_and_print_profile(&self) {
        self.end_profile().print_to_stdout();
    }

    pub(crate) fn clock(&self) -> &Clock {
        &self.clock
    }

    pub(crate) fn state_mut(&self) -> RefMut<'_, ProfilerState> {
        self.state.borrow_mut()
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static THREAD_PROFILER: Profiler = Profiler::new();
}

/// Returns a handle to the profiler of the current thread.
///
/// This is the profiler used by the free functions in this module and by the
/// [`zone!`][crate::zone] macro.
#[must_use]
pub fn thread_profiler() -> Profiler {
    THREAD_PROFILER.with(Profiler::clone)
}

/// Starts a profiling session on the profiler of the current thread.
///
/// See [`Profiler::begin_profile()`].
pub fn begin_profile() {
    THREAD_PROFILER.with(Profiler::begin_profile);
}

/// Opens a zone on the profiler of the current thread.
///
/// See [`Profiler::open_zone()`]. The [`zone!`][crate::zone] macro is a more convenient way
/// to do this, allocating an anchor for each call site automatically.
pub fn open_zone(label: &'static str, anchor: AnchorId, byte_count: u64) -> Zone {
    THREAD_PROFILER.with(|profiler| profiler.open_zone(label, anchor, byte_count))
}

/// Ends the profiling session on the profiler of the current thread.
///
/// See [`Profiler::end_profile()`].
#[must_use]
pub fn end_profile() -> ProfileReport {
    THREAD_PROFILER.with(Profiler::end_profile)
}

/// Ends the profiling session on the profiler of the current thread and prints the report.
///
/// See [`Profiler::end_and_print_profile()`].
#[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
pub fn end_and_print_profile() {
    THREAD_PROFILER.with(Profiler::end_and_print_profile);
}

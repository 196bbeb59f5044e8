//! Repetition testing: run the same workload over and over until its fastest run stops improving.

use std::io::{self, Write};

use crate::pal::PlatformFacade;
use crate::repetition_results::{RepetitionResults, RepetitionValue};
use crate::{Clock, Error, OsMetrics, RepetitionTesterBuilder, Result};

/// The lifecycle state of a [`RepetitionTester`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum TestMode {
    /// No wave has been started yet.
    Uninitialized,

    /// A wave is running. Trials are being recorded.
    Testing,

    /// The last wave ran out of time without finding a new minimum. A new wave can be started.
    Completed,

    /// The tester detected a usage error. This state is terminal.
    Error,
}

/// Measures the fastest achievable run of a workload by repeating it many times.
///
/// The tester runs in waves. A wave keeps going for as long as it keeps finding new minimum
/// cycle counts: every new minimum resets the wave's time budget, so a wave only ends once
/// it has spent `seconds_to_try` seconds without improving. Noise only ever adds cost, so the
/// minimum is the best estimate of what the workload truly costs.
///
/// Every trial is one pass through the `is_testing()` loop. A trial can consist of several
/// `begin_trial()`/`end_trial()` pairs, which lets the workload exclude setup between them.
///
/// Usage errors (unbalanced begin/end calls, the wrong byte count, changing parameters between
/// waves) move the tester into [`TestMode::Error`], from which it never recovers.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use many_cycles::{Clock, RepetitionTester};
///
/// let clock = Clock::new();
/// let timer_frequency = clock.estimate_cycle_frequency(Duration::from_millis(10));
///
/// let data = vec![3_u8; 64 * 1024];
///
/// let mut tester = RepetitionTester::builder()
///     .seconds_to_try(0.05)
///     .print_new_minimums(false)
///     .build();
///
/// tester
///     .new_test_wave(data.len() as u64, timer_frequency)
///     .unwrap();
///
/// while tester.is_testing().unwrap() {
///     tester.begin_trial();
///     let sum: u64 = data.iter().map(|&b| u64::from(b)).sum();
///     std::hint::black_box(sum);
///     tester.end_trial();
///
///     tester.count_bytes(data.len() as u64);
/// }
///
/// assert!(tester.results().test_count() > 0);
/// ```
#[derive(Debug)]
pub struct RepetitionTester {
    clock: Clock,
    os_metrics: OsMetrics,

    seconds_to_try: f64,
    print_new_minimums: bool,

    mode: TestMode,

    target_bytes: u64,
    timer_frequency: u64,

    // The wave ends when this many cycles pass without a new minimum.
    try_for_cycles: u64,
    wave_started_at: u64,

    open_count: u32,
    close_count: u32,

    // The trial in progress. Between begin_trial() and end_trial() the cycle and page fault
    // counters hold the negated starting values, so they wrap around until the trial ends.
    trial: RepetitionValue,

    results: RepetitionResults,
    failure: Option<Error>,
}

impl RepetitionTester {
    /// Starts building a tester with custom settings.
    #[must_use]
    pub fn builder() -> RepetitionTesterBuilder {
        RepetitionTesterBuilder::new()
    }

    /// Creates a tester with default settings: ten seconds per wave, printing new minimums.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub(crate) fn with_settings(
        platform: PlatformFacade,
        seconds_to_try: f64,
        print_new_minimums: bool,
    ) -> Self {
        Self {
            clock: Clock::from_pal(platform.clone()),
            os_metrics: OsMetrics::from_pal(platform),
            seconds_to_try,
            print_new_minimums,
            mode: TestMode::Uninitialized,
            target_bytes: 0,
            timer_frequency: 0,
            try_for_cycles: 0,
            wave_started_at: 0,
            open_count: 0,
            close_count: 0,
            trial: RepetitionValue::default(),
            results: RepetitionResults::new(0),
            failure: None,
        }
    }

    /// Starts a new test wave using the configured `seconds_to_try`.
    ///
    /// See [`new_test_wave_for()`][Self::new_test_wave_for].
    ///
    /// # Errors
    ///
    /// See [`new_test_wave_for()`][Self::new_test_wave_for].
    pub fn new_test_wave(&mut self, target_bytes: u64, timer_frequency: u64) -> Result<()> {
        self.new_test_wave_for(target_bytes, timer_frequency, self.seconds_to_try)
    }

    /// Starts a new test wave that ends after `seconds_to_try` seconds without a new minimum.
    ///
    /// `target_bytes` is how many bytes every trial processes, as reported via
    /// [`count_bytes()`][Self::count_bytes]. `timer_frequency` is the cycle counter frequency,
    /// typically from [`Clock::estimate_cycle_frequency()`].
    ///
    /// The first wave fixes both values for the lifetime of the tester. Results accumulate
    /// across waves. Starting a wave while one is already running only restarts its time budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateCalibration`] if `timer_frequency` is zero,
    /// [`Error::TargetBytesChanged`] or [`Error::TimerFrequencyChanged`] if a later wave
    /// uses different values than the first one, or the recorded failure if the tester
    /// is already in [`TestMode::Error`].
    pub fn new_test_wave_for(
        &mut self,
        target_bytes: u64,
        timer_frequency: u64,
        seconds_to_try: f64,
    ) -> Result<()> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        match self.mode {
            TestMode::Uninitialized => {
                if timer_frequency == 0 {
                    return Err(self.fail(Error::DegenerateCalibration));
                }

                self.target_bytes = target_bytes;
                self.timer_frequency = timer_frequency;
                self.results = RepetitionResults::new(timer_frequency);
            }
            TestMode::Completed => {
                if target_bytes != self.target_bytes {
                    return Err(self.fail(Error::TargetBytesChanged {
                        previous: self.target_bytes,
                        requested: target_bytes,
                    }));
                }

                if timer_frequency != self.timer_frequency {
                    return Err(self.fail(Error::TimerFrequencyChanged {
                        previous: self.timer_frequency,
                        requested: timer_frequency,
                    }));
                }
            }
            TestMode::Testing | TestMode::Error => {}
        }

        self.mode = TestMode::Testing;
        self.try_for_cycles = seconds_to_cycles(seconds_to_try, self.timer_frequency);
        self.wave_started_at = self.clock.cycles();

        tracing::debug!(
            target_bytes,
            timer_frequency,
            seconds_to_try,
            "starting repetition test wave"
        );

        Ok(())
    }

    /// Starts (or continues) the measured part of the current trial.
    #[inline]
    pub fn begin_trial(&mut self) {
        self.open_count = self.open_count.wrapping_add(1);

        // Read the cycle counter last so the page fault read is not measured.
        self.trial.page_faults = self
            .trial
            .page_faults
            .wrapping_sub(self.os_metrics.page_fault_count());
        self.trial.cycles = self.trial.cycles.wrapping_sub(self.clock.cycles());
    }

    /// Ends the measured part of the current trial that was started by `begin_trial()`.
    #[inline]
    pub fn end_trial(&mut self) {
        // Read the cycle counter first so the page fault read is not measured.
        self.trial.cycles = self.trial.cycles.wrapping_add(self.clock.cycles());
        self.trial.page_faults = self
            .trial
            .page_faults
            .wrapping_add(self.os_metrics.page_fault_count());

        self.close_count = self.close_count.wrapping_add(1);
    }

    /// Adds to the number of bytes processed by the current trial.
    ///
    /// At the end of every trial this must equal the `target_bytes` of the wave.
    #[inline]
    pub fn count_bytes(&mut self, byte_count: u64) {
        self.trial.bytes = self.trial.bytes.wrapping_add(byte_count);
    }

    /// Finishes the current trial and decides whether to run another one.
    ///
    /// Returns `Ok(true)` while the wave is running. Returns `Ok(false)` once the wave has
    /// completed (and prints the results), or if the tester failed earlier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnbalancedTrial`] or [`Error::ByteCountMismatch`] if the trial that
    /// just ended was driven incorrectly. The error is returned only once; the tester remains
    /// in [`TestMode::Error`] and all later calls return `Ok(false)`.
    pub fn is_testing(&mut self) -> Result<bool> {
        if self.mode != TestMode::Testing {
            return Ok(false);
        }

        let now = self.clock.cycles();

        if self.open_count != 0 {
            if self.open_count != self.close_count {
                return Err(self.fail(Error::UnbalancedTrial {
                    begins: self.open_count,
                    ends: self.close_count,
                }));
            }

            if self.trial.bytes != self.target_bytes {
                return Err(self.fail(Error::ByteCountMismatch {
                    expected: self.target_bytes,
                    actual: self.trial.bytes,
                }));
            }

            let trial = RepetitionValue {
                test_count: 1,
                ..self.trial
            };

            if self.results.record(trial) {
                self.wave_started_at = now;

                tracing::debug!(
                    cycles = trial.cycles,
                    page_faults = trial.page_faults,
                    "new minimum"
                );

                if self.print_new_minimums {
                    self.print_new_minimum();
                }
            }

            self.open_count = 0;
            self.close_count = 0;
            self.trial = RepetitionValue::default();
        }

        if now.wrapping_sub(self.wave_started_at) > self.try_for_cycles {
            self.mode = TestMode::Completed;

            tracing::debug!(
                test_count = self.results.test_count(),
                "repetition test wave completed"
            );

            self.print_results();
        }

        Ok(self.mode == TestMode::Testing)
    }

    /// Runs `trial` repeatedly for as long as the current wave is running.
    ///
    /// The closure is responsible for calling `begin_trial()`, `end_trial()` and `count_bytes()`.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by [`is_testing()`][Self::is_testing].
    pub fn repeat(&mut self, mut trial: impl FnMut(&mut Self)) -> Result<()> {
        while self.is_testing()? {
            trial(self);
        }

        Ok(())
    }

    /// Measures `f` as one `begin_trial()`/`end_trial()` pair and returns its result.
    #[inline]
    pub fn measure<R>(&mut self, f: impl FnOnce() -> R) -> R {
        self.begin_trial();
        let result = f();
        self.end_trial();
        result
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn mode(&self) -> TestMode {
        self.mode
    }

    /// The results accumulated over every wave so far.
    #[must_use]
    pub fn results(&self) -> &RepetitionResults {
        &self.results
    }

    /// The error that moved the tester into [`TestMode::Error`], if any.
    #[must_use]
    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    fn fail(&mut self, error: Error) -> Error {
        self.mode = TestMode::Error;
        self.failure = Some(error.clone());

        tracing::error!(%error, "repetition tester failed");
        eprintln!("ERROR: {error}");

        error
    }

    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    fn print_new_minimum(&self) {
        let mut stdout = io::stdout().lock();

        // Overwritten in place by the next minimum. Trailing spaces clear a longer previous line.
        // Output is best-effort, a closed stdout must not stop the test.
        drop(write!(stdout, "\r{}               ", self.results.min_line()));
        drop(stdout.flush());
    }

    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    fn print_results(&self) {
        let mut stdout = io::stdout().lock();

        // Output is best-effort, a closed stdout must not stop the test.
        drop(self.write_results(&mut stdout));
        drop(stdout.flush());
    }

    fn write_results(&self, out: &mut impl Write) -> io::Result<()> {
        if self.print_new_minimums {
            // Blanks the in-place "Min" line and returns to its start, so the results replace it.
            write!(out, "\r{}\r", " ".repeat(79))?;
        }

        write!(out, "{}", self.results)
    }
}

impl Default for RepetitionTester {
    fn default() -> Self {
        Self::new()
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "frequencies are far below the 2^52 limit of exact f64 integers"
)]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "float to int casts saturate, which is the desired behavior for huge or negative budgets"
)]
fn seconds_to_cycles(seconds: f64, timer_frequency: u64) -> u64 {
    (seconds * timer_frequency as f64) as u64
}

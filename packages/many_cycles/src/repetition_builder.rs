use crate::RepetitionTester;
use crate::pal::PlatformFacade;

/// The number of seconds a wave runs without finding a new minimum before it completes,
/// unless configured otherwise.
pub const DEFAULT_SECONDS_TO_TRY: f64 = 10.0;

/// Creates instances of [`RepetitionTester`].
///
/// Use `RepetitionTester::builder()` to create a new instance of this builder.
///
/// # Examples
///
/// ```
/// use many_cycles::RepetitionTester;
///
/// let tester = RepetitionTester::builder()
///     .seconds_to_try(2.5)
///     .print_new_minimums(false)
///     .build();
/// # drop(tester);
/// ```
#[derive(Debug)]
#[must_use]
pub struct RepetitionTesterBuilder {
    seconds_to_try: f64,
    print_new_minimums: bool,
    platform: PlatformFacade,
}

impl RepetitionTesterBuilder {
    pub(crate) fn new() -> Self {
        Self {
            seconds_to_try: DEFAULT_SECONDS_TO_TRY,
            print_new_minimums: true,
            platform: PlatformFacade::real(),
        }
    }

    /// Sets how many seconds a wave keeps running without finding a new minimum.
    ///
    /// Every new minimum restarts this budget. Defaults to [`DEFAULT_SECONDS_TO_TRY`].
    /// Individual waves can override it via
    /// [`RepetitionTester::new_test_wave_for()`][crate::RepetitionTester::new_test_wave_for].
    ///
    /// # Panics
    ///
    /// Panics if `seconds` is negative or not a number.
    pub fn seconds_to_try(self, seconds: f64) -> Self {
        assert!(
            seconds >= 0.0,
            "seconds to try must be a non-negative number, got {seconds}"
        );

        Self {
            seconds_to_try: seconds,
            ..self
        }
    }

    /// Sets whether every new minimum is printed to stdout as it is found, overwriting the
    /// previous one in place.
    ///
    /// Enabled by default. The final results of each wave are printed either way.
    pub fn print_new_minimums(self, enabled: bool) -> Self {
        Self {
            print_new_minimums: enabled,
            ..self
        }
    }

    #[cfg(test)]
    pub(crate) fn platform(self, platform: PlatformFacade) -> Self {
        Self { platform, ..self }
    }

    /// Creates the tester, ready for its first wave.
    #[must_use]
    pub fn build(self) -> RepetitionTester {
        RepetitionTester::with_settings(self.platform, self.seconds_to_try, self.print_new_minimums)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::TestMode;

    #[test]
    fn builds_uninitialized_tester() {
        let tester = RepetitionTester::builder().build();

        assert_eq!(tester.mode(), TestMode::Uninitialized);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn negative_budget_panics() {
        let _builder = RepetitionTester::builder().seconds_to_try(-1.0);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn nan_budget_panics() {
        let _builder = RepetitionTester::builder().seconds_to_try(f64::NAN);
    }
}

use thiserror::Error;

/// Errors that put a [`RepetitionTester`][crate::RepetitionTester] into its terminal error state.
///
/// All of these indicate a bug in how the tester is being driven, not a transient condition,
/// so none of them are retried.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A new test wave declared a different processed byte count than the previous wave
    /// against the same tester.
    #[error("target processed byte count changed from {previous} to {requested}")]
    TargetBytesChanged {
        /// The byte count of the previous waves.
        previous: u64,

        /// The byte count the new wave asked for.
        requested: u64,
    },

    /// A new test wave declared a different cycle counter frequency than the previous wave
    /// against the same tester.
    #[error("cycle counter frequency changed from {previous} to {requested}")]
    TimerFrequencyChanged {
        /// The frequency of the previous waves.
        previous: u64,

        /// The frequency the new wave asked for.
        requested: u64,
    },

    /// A trial called `begin_trial()` and `end_trial()` a different number of times.
    #[error("unbalanced begin_trial/end_trial: {begins} begins and {ends} ends")]
    UnbalancedTrial {
        /// Number of `begin_trial()` calls in the trial.
        begins: u32,

        /// Number of `end_trial()` calls in the trial.
        ends: u32,
    },

    /// A trial processed a different number of bytes than the wave declared.
    #[error("processed byte count mismatch: expected {expected}, counted {actual}")]
    ByteCountMismatch {
        /// The byte count declared for the wave.
        expected: u64,

        /// The byte count reported by the trial via `count_bytes()`.
        actual: u64,
    },

    /// The cycle counter frequency is unknown (zero), typically because calibration
    /// against the wall clock observed no elapsed time.
    #[error("cycle counter frequency is unknown (calibration observed no elapsed time)")]
    DegenerateCalibration,
}

/// A specialized `Result` type for repetition testing, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

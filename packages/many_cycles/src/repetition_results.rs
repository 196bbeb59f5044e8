use std::fmt;

use crate::{cycles_to_seconds, gigabytes_per_second};

/// Counters accumulated over one trial, or over many trials.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RepetitionValue {
    pub(crate) test_count: u64,
    pub(crate) cycles: u64,
    pub(crate) page_faults: u64,
    pub(crate) bytes: u64,
}

impl RepetitionValue {
    /// How many trials contributed to this value.
    #[must_use]
    pub fn test_count(&self) -> u64 {
        self.test_count
    }

    /// Elapsed cycle counter ticks.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Memory page faults charged to the process.
    #[must_use]
    pub fn page_faults(&self) -> u64 {
        self.page_faults
    }

    /// Bytes processed.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    fn accumulate(&mut self, other: &Self) {
        self.test_count = self.test_count.wrapping_add(other.test_count);
        self.cycles = self.cycles.wrapping_add(other.cycles);
        self.page_faults = self.page_faults.wrapping_add(other.page_faults);
        self.bytes = self.bytes.wrapping_add(other.bytes);
    }
}

/// Per-trial averages over every trial in a [`RepetitionResults`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RepetitionAverage {
    cycles: f64,
    page_faults: f64,
    bytes: f64,
}

impl RepetitionAverage {
    /// Average cycles per trial.
    #[must_use]
    pub fn cycles(&self) -> f64 {
        self.cycles
    }

    /// Average page faults per trial.
    #[must_use]
    pub fn page_faults(&self) -> f64 {
        self.page_faults
    }

    /// Average bytes per trial.
    #[must_use]
    pub fn bytes(&self) -> f64 {
        self.bytes
    }
}

/// The results collected by a [`RepetitionTester`][crate::RepetitionTester]: the sum of every
/// trial plus the fastest and slowest trial, by cycle count.
///
/// Results accumulate across all waves run against the same tester.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RepetitionResults {
    timer_frequency: u64,
    total: RepetitionValue,
    min: RepetitionValue,
    max: RepetitionValue,
}

impl RepetitionResults {
    pub(crate) fn new(timer_frequency: u64) -> Self {
        Self {
            timer_frequency,
            total: RepetitionValue::default(),
            min: RepetitionValue {
                cycles: u64::MAX,
                ..RepetitionValue::default()
            },
            max: RepetitionValue::default(),
        }
    }

    /// Folds one finished trial into the results. Returns whether it was a new minimum.
    pub(crate) fn record(&mut self, trial: RepetitionValue) -> bool {
        self.total.accumulate(&trial);

        if trial.cycles > self.max.cycles {
            self.max = trial;
        }

        if trial.cycles < self.min.cycles {
            self.min = trial;
            true
        } else {
            false
        }
    }

    /// The cycle counter frequency the results were measured with, or zero if unknown.
    #[must_use]
    pub fn timer_frequency(&self) -> u64 {
        self.timer_frequency
    }

    /// How many trials were recorded.
    #[must_use]
    pub fn test_count(&self) -> u64 {
        self.total.test_count
    }

    /// The sum of every recorded trial.
    #[must_use]
    pub fn total(&self) -> RepetitionValue {
        self.total
    }

    /// The trial with the fewest cycles, if any trial was recorded.
    #[must_use]
    pub fn min(&self) -> Option<RepetitionValue> {
        (self.test_count() != 0).then_some(self.min)
    }

    /// The trial with the most cycles, if any trial was recorded.
    #[must_use]
    pub fn max(&self) -> Option<RepetitionValue> {
        (self.test_count() != 0).then_some(self.max)
    }

    /// Per-trial averages, or all zeroes if no trial was recorded.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "averages are an approximation, exact integer conversion is not needed"
    )]
    pub fn average(&self) -> RepetitionAverage {
        if self.test_count() == 0 {
            return RepetitionAverage::default();
        }

        let divisor = self.total.test_count as f64;

        RepetitionAverage {
            cycles: self.total.cycles as f64 / divisor,
            page_faults: self.total.page_faults as f64 / divisor,
            bytes: self.total.bytes as f64 / divisor,
        }
    }

    /// The minimum trial as a single report line, as printed while a wave is finding new minima.
    pub(crate) fn min_line(&self) -> impl fmt::Display + '_ {
        ValueLine::exact("Min", &self.min, self.timer_frequency)
    }
}

impl fmt::Display for RepetitionResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.test_count() == 0 {
            return writeln!(f, "No trials recorded.");
        }

        writeln!(
            f,
            "{}",
            ValueLine::exact("Min", &self.min, self.timer_frequency)
        )?;
        writeln!(
            f,
            "{}",
            ValueLine::exact("Max", &self.max, self.timer_frequency)
        )?;

        let average = self.average();
        writeln!(
            f,
            "{}",
            ValueLine {
                label: "Avg",
                cycles: average.cycles,
                page_faults: average.page_faults,
                bytes: average.bytes,
                timer_frequency: self.timer_frequency,
            }
        )
    }
}

/// One line of output: cycles, then time and throughput if the frequency is known, then
/// page faults if there were any.
struct ValueLine<'a> {
    label: &'a str,
    cycles: f64,
    page_faults: f64,
    bytes: f64,
    timer_frequency: u64,
}

impl<'a> ValueLine<'a> {
    #[expect(
        clippy::cast_precision_loss,
        reason = "report output is an approximation, exact integer conversion is not needed"
    )]
    fn exact(label: &'a str, value: &RepetitionValue, timer_frequency: u64) -> Self {
        Self {
            label,
            cycles: value.cycles as f64,
            page_faults: value.page_faults as f64,
            bytes: value.bytes as f64,
            timer_frequency,
        }
    }
}

impl fmt::Display for ValueLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.0}", self.label, self.cycles)?;

        if self.timer_frequency != 0 {
            let seconds = cycles_to_seconds(self.cycles, self.timer_frequency);
            write!(f, " ({:.6}ms)", seconds * 1000.0)?;

            if self.bytes > 0.0 {
                write!(f, " {:.6}gb/s", gigabytes_per_second(self.bytes, seconds))?;
            }
        }

        if self.page_faults > 0.0 {
            write!(f, " PF: {:.4}", self.page_faults)?;

            if self.bytes > 0.0 {
                write!(
                    f,
                    " ({:.4} faults/KB)",
                    self.page_faults / (self.bytes / 1024.0)
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn trial(cycles: u64, page_faults: u64, bytes: u64) -> RepetitionValue {
        RepetitionValue {
            test_count: 1,
            cycles,
            page_faults,
            bytes,
        }
    }

    #[test]
    fn new_results_have_no_min_or_max() {
        let results = RepetitionResults::new(1_000);

        assert_eq!(results.test_count(), 0);
        assert_eq!(results.min(), None);
        assert_eq!(results.max(), None);
        assert_eq!(results.average(), RepetitionAverage::default());
        assert_eq!(results.to_string().trim_end(), "No trials recorded.");
    }

    #[test]
    fn record_tracks_min_max_and_total() {
        let mut results = RepetitionResults::new(1_000);

        assert!(results.record(trial(50, 1, 10)));
        assert!(!results.record(trial(80, 0, 10)));
        assert!(results.record(trial(20, 3, 10)));
        assert!(!results.record(trial(20, 0, 10)));

        assert_eq!(results.test_count(), 4);
        assert_eq!(results.min().unwrap().cycles(), 20);
        assert_eq!(results.min().unwrap().page_faults(), 3);
        assert_eq!(results.max().unwrap().cycles(), 80);
        assert_eq!(results.total().cycles(), 170);
        assert_eq!(results.total().bytes(), 40);

        let average = results.average();
        assert!((average.cycles() - 42.5).abs() < f64::EPSILON);
        assert!((average.page_faults() - 1.0).abs() < f64::EPSILON);
        assert!((average.bytes() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn display_includes_time_throughput_and_faults() {
        let mut results = RepetitionResults::new(1_000_000);

        // 1000 cycles at 1 MHz is one millisecond; 1 GiB in 1 ms is 1000 gb/s.
        results.record(trial(1_000, 2, 1024 * 1024 * 1024));

        let output = results.to_string();
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(lines.len(), 3, "{output}");
        assert_eq!(
            lines.first().unwrap(),
            &"Min: 1000 (1.000000ms) 1000.000000gb/s PF: 2.0000 (0.0000 faults/KB)"
        );
        assert!(lines.get(1).unwrap().starts_with("Max: 1000 "));
        assert!(lines.get(2).unwrap().starts_with("Avg: 1000 "));
    }

    #[test]
    fn page_faults_without_bytes_skip_per_kilobyte_rate() {
        let mut results = RepetitionResults::new(0);
        results.record(trial(10, 4, 0));

        assert_eq!(results.min_line().to_string(), "Min: 10 PF: 4.0000");
    }

    #[test]
    fn display_without_frequency_shows_only_cycles() {
        let mut results = RepetitionResults::new(0);
        results.record(trial(123, 0, 4096));

        let output = results.to_string();

        assert_eq!(output, "Min: 123\nMax: 123\nAvg: 123\n");
    }

    #[test]
    fn min_line_matches_display() {
        let mut results = RepetitionResults::new(0);
        results.record(trial(77, 0, 0));

        assert_eq!(results.min_line().to_string(), "Min: 77");
    }

    static_assertions::assert_impl_all!(RepetitionResults: Send, Sync, Clone);
    static_assertions::assert_impl_all!(RepetitionValue: Send, Sync, Copy);
}

//! Results of a profiling session.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::anchor::Anchor;
use crate::{AnchorId, cycles_to_seconds, gigabytes_per_second};

const MEBIBYTE: f64 = 1024.0 * 1024.0;

/// The cycle accounting captured by one profiling session of a [`Profiler`][crate::Profiler].
///
/// Reports are plain data and can be sent to other threads, which allows merging the
/// reports of profilers running on different threads into one.
///
/// # Examples
///
/// ```
/// use many_cycles::{AnchorId, ProfileReport, Profiler};
///
/// let work = AnchorId::new(10);
///
/// let worker = std::thread::spawn(move || {
///     let profiler = Profiler::new();
///     profiler.begin_profile();
///     drop(profiler.open_zone("work", work, 0));
///     profiler.end_profile()
/// });
///
/// let profiler = Profiler::new();
/// profiler.begin_profile();
/// drop(profiler.open_zone("work", work, 0));
/// let local = profiler.end_profile();
///
/// let merged = ProfileReport::merge(&local, &worker.join().unwrap());
/// println!("{merged}");
/// ```
#[derive(Clone, Debug)]
pub struct ProfileReport {
    total_cycles: u64,
    cycle_frequency: u64,
    anchors: BTreeMap<AnchorId, ReportAnchor>,
}

/// The accumulated cycles of one anchor in a [`ProfileReport`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportAnchor {
    id: AnchorId,
    label: &'static str,
    hit_count: u64,
    exclusive_cycles: u64,
    inclusive_cycles: u64,
    processed_bytes: u64,
}

impl ProfileReport {
    #[must_use]
    pub(crate) fn new<'a>(
        total_cycles: u64,
        cycle_frequency: u64,
        anchors: impl IntoIterator<Item = (AnchorId, &'a Anchor)>,
    ) -> Self {
        let anchors = anchors
            .into_iter()
            .map(|(id, anchor)| {
                (
                    id,
                    ReportAnchor {
                        id,
                        label: anchor.label,
                        hit_count: anchor.hit_count,
                        exclusive_cycles: anchor.exclusive_cycles,
                        inclusive_cycles: anchor.inclusive_cycles,
                        processed_bytes: anchor.processed_bytes,
                    },
                )
            })
            .collect();

        Self {
            total_cycles,
            cycle_frequency,
            anchors,
        }
    }

    /// Merges two reports into a new report.
    ///
    /// Anchors with the same id have their counters summed. The total cycle count is the sum of
    /// both totals, so percentages in the merged report are relative to the combined time of
    /// both sessions. The cycle frequency is taken from the first report that knows it.
    #[must_use]
    pub fn merge(a: &Self, b: &Self) -> Self {
        let mut merged_anchors = a.anchors.clone();

        for (id, b_anchor) in &b.anchors {
            merged_anchors
                .entry(*id)
                .and_modify(|a_anchor| a_anchor.absorb(b_anchor))
                .or_insert_with(|| b_anchor.clone());
        }

        Self {
            total_cycles: a.total_cycles.wrapping_add(b.total_cycles),
            cycle_frequency: if a.cycle_frequency != 0 {
                a.cycle_frequency
            } else {
                b.cycle_frequency
            },
            anchors: merged_anchors,
        }
    }

    /// Cycles elapsed between the start and the end of the profiling session.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// The estimated cycle counter frequency in cycles per second, or zero if unknown.
    #[must_use]
    pub fn cycle_frequency(&self) -> u64 {
        self.cycle_frequency
    }

    /// Wall clock duration of the profiling session, if the cycle frequency is known.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "sub-cycle precision is not meaningful for a wall clock duration"
    )]
    pub fn total_duration(&self) -> Option<Duration> {
        if self.cycle_frequency == 0 {
            return None;
        }

        Some(Duration::from_secs_f64(cycles_to_seconds(
            self.total_cycles as f64,
            self.cycle_frequency,
        )))
    }

    /// The anchors that accumulated any time, in anchor id order.
    pub fn anchors(&self) -> impl Iterator<Item = &ReportAnchor> {
        self.anchors.values()
    }

    /// The data of one anchor, if it accumulated any time during the session.
    #[must_use]
    pub fn anchor(&self, id: AnchorId) -> Option<&ReportAnchor> {
        self.anchors.get(&id)
    }

    /// Whether no zone was closed during the session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Prints the report to stdout.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_to_stdout(&self) {
        println!("{self}");
    }
}

impl ReportAnchor {
    /// The id of the anchor.
    #[must_use]
    pub fn id(&self) -> AnchorId {
        self.id
    }

    /// The label of the most recently closed zone of this anchor.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// How many times a zone of this anchor was closed.
    #[must_use]
    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// Cycles spent in this anchor's zones, not counting nested zones.
    #[must_use]
    pub fn exclusive_cycles(&self) -> u64 {
        self.exclusive_cycles
    }

    /// Cycles spent in this anchor's zones, including nested zones.
    #[must_use]
    pub fn inclusive_cycles(&self) -> u64 {
        self.inclusive_cycles
    }

    /// Bytes declared as processed by this anchor's zones.
    #[must_use]
    pub fn processed_bytes(&self) -> u64 {
        self.processed_bytes
    }

    /// Whether any time was spent in zones nested inside this anchor's zones.
    #[must_use]
    pub fn has_children(&self) -> bool {
        self.inclusive_cycles != self.exclusive_cycles
    }

    /// Throughput of this anchor in gigabytes (2^30 bytes) per second of inclusive time.
    ///
    /// Returns `None` if no bytes were processed or the cycle frequency is unknown.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "throughput is an approximation, exact integer conversion is not needed"
    )]
    pub fn gigabytes_per_second(&self, cycle_frequency: u64) -> Option<f64> {
        if self.processed_bytes == 0 || cycle_frequency == 0 {
            return None;
        }

        let seconds = cycles_to_seconds(self.inclusive_cycles as f64, cycle_frequency);
        Some(gigabytes_per_second(self.processed_bytes as f64, seconds))
    }

    fn absorb(&mut self, other: &Self) {
        self.hit_count = self.hit_count.wrapping_add(other.hit_count);
        self.exclusive_cycles = self.exclusive_cycles.wrapping_add(other.exclusive_cycles);
        self.inclusive_cycles = self.inclusive_cycles.wrapping_add(other.inclusive_cycles);
        self.processed_bytes = self.processed_bytes.wrapping_add(other.processed_bytes);
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "percentages are an approximation, exact integer conversion is not needed"
)]
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

impl fmt::Display for ProfileReport {
    #[expect(
        clippy::cast_precision_loss,
        reason = "byte counts are displayed as approximate megabytes"
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(duration) = self.total_duration() {
            writeln!(
                f,
                "Total time: {:.4}ms (CPU freq {})",
                duration.as_secs_f64() * 1000.0,
                self.cycle_frequency
            )?;
        }

        if self.anchors.is_empty() {
            writeln!(f, "No profile zones captured.")?;
            return Ok(());
        }

        for anchor in self.anchors.values() {
            write!(
                f,
                "  {}[{}]: {} ({:.2}%",
                anchor.label,
                anchor.hit_count,
                anchor.exclusive_cycles,
                percent(anchor.exclusive_cycles, self.total_cycles)
            )?;

            if anchor.has_children() {
                write!(
                    f,
                    ", {:.2}% w/children",
                    percent(anchor.inclusive_cycles, self.total_cycles)
                )?;
            }

            write!(f, ")")?;

            if anchor.processed_bytes != 0 {
                write!(f, "  {:.3}mb", anchor.processed_bytes as f64 / MEBIBYTE)?;

                if let Some(gbs) = anchor.gigabytes_per_second(self.cycle_frequency) {
                    write!(f, " at {gbs:.2}gb/s")?;
                }
            }

            writeln!(f)?;
        }

        Ok(())
    }
}

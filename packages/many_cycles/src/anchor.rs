//! Anchors are the accounting buckets that profile zones accumulate their cycles into.

use std::sync::atomic::{AtomicU32, Ordering};

/// The number of anchors in the anchor table of every [`Profiler`][crate::Profiler].
///
/// One slot (index 0) is reserved for the implicit root, so the usable anchor ids are
/// `1..ANCHOR_CAPACITY`.
pub const ANCHOR_CAPACITY: usize = 4096;

/// Next index handed out by [`AnchorId::allocate()`]. Index 0 is the root.
static NEXT_ALLOCATED_INDEX: AtomicU32 = AtomicU32::new(1);

/// Identifies one anchor (an accounting bucket for one instrumented region of code)
/// in the anchor table of a [`Profiler`][crate::Profiler].
///
/// Ids are either chosen explicitly by the caller via [`AnchorId::new()`] or allocated
/// from a process-wide sequence via [`AnchorId::allocate()`]. The [`zone!`][crate::zone]
/// macro allocates one id per call site, on first use.
///
/// The same id refers to the same anchor slot in every profiler, which is what allows
/// reports from different threads to be [merged][crate::ProfileReport::merge].
///
/// Do not mix explicit and allocated ids in one program unless you reserve the explicit
/// range yourself - nothing prevents the sequence from handing out an index you also use
/// explicitly, and two regions sharing an anchor get merged into one report line.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AnchorId(u32);

impl AnchorId {
    /// The implicit root "anchor" that is the parent of every top-level zone.
    /// It never accumulates inclusive time and is never reported.
    pub(crate) const ROOT: Self = Self(0);

    /// Creates an anchor id with an explicitly chosen index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is zero (reserved) or not less than [`ANCHOR_CAPACITY`].
    #[must_use]
    pub fn new(index: u32) -> Self {
        assert!(index != 0, "anchor index 0 is reserved for the root");
        assert!(
            usize::try_from(index).is_ok_and(|index| index < ANCHOR_CAPACITY),
            "anchor index {index} is outside the anchor table (capacity {ANCHOR_CAPACITY})"
        );

        Self(index)
    }

    /// Allocates the next unused anchor id from a process-wide sequence.
    ///
    /// # Panics
    ///
    /// Panics if all [`ANCHOR_CAPACITY`] anchors have already been allocated.
    #[must_use]
    pub fn allocate() -> Self {
        let index = NEXT_ALLOCATED_INDEX.fetch_add(1, Ordering::Relaxed);

        assert!(
            usize::try_from(index).is_ok_and(|index| index < ANCHOR_CAPACITY),
            "all {ANCHOR_CAPACITY} anchors have already been allocated"
        );

        Self(index)
    }

    /// The index of this anchor in the anchor table.
    #[must_use]
    pub fn index(self) -> u32 {
        self.0
    }

    fn slot(self) -> usize {
        usize::try_from(self.0).expect("anchor indexes are below ANCHOR_CAPACITY, fit in usize")
    }
}

/// Cycle accounting for one anchor.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Anchor {
    pub(crate) label: &'static str,

    /// Cycles spent in zones of this anchor, not counting nested zones.
    ///
    /// While a zone of this anchor is open, nested zones that have already closed are
    /// debited from this counter before the zone itself credits its elapsed time, so
    /// the value may transiently wrap around "below zero". Wrapping arithmetic is used
    /// throughout and the value is correct again once the zone closes.
    pub(crate) exclusive_cycles: u64,

    /// Cycles spent in zones of this anchor, including nested zones.
    ///
    /// Recursive entries do not double count: every activation overwrites this with the
    /// value at its entry plus its own elapsed time.
    pub(crate) inclusive_cycles: u64,

    pub(crate) hit_count: u64,
    pub(crate) processed_bytes: u64,
}

/// Fixed-capacity table of anchors, indexed by [`AnchorId`].
///
/// Allocated once when the profiler is created; the hot path never allocates.
#[derive(Debug)]
pub(crate) struct AnchorTable {
    anchors: Box<[Anchor]>,
}

impl AnchorTable {
    pub(crate) fn new() -> Self {
        Self {
            anchors: vec![Anchor::default(); ANCHOR_CAPACITY].into_boxed_slice(),
        }
    }

    #[cfg(test)]
    #[expect(
        clippy::indexing_slicing,
        reason = "AnchorId is always within the table, guaranteed by its constructors"
    )]
    pub(crate) fn get(&self, id: AnchorId) -> &Anchor {
        &self.anchors[id.slot()]
    }

    #[inline]
    #[expect(
        clippy::indexing_slicing,
        reason = "AnchorId is always within the table, guaranteed by its constructors"
    )]
    pub(crate) fn get_mut(&mut self, id: AnchorId) -> &mut Anchor {
        &mut self.anchors[id.slot()]
    }

    /// Anchors that accumulated any time, in index order. The root is never included.
    pub(crate) fn used(&self) -> impl Iterator<Item = (AnchorId, &Anchor)> {
        self.anchors
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, anchor)| anchor.inclusive_cycles != 0)
            .map(|(index, anchor)| {
                (
                    AnchorId(u32::try_from(index).expect("ANCHOR_CAPACITY fits in u32")),
                    anchor,
                )
            })
    }

    pub(crate) fn reset(&mut self) {
        self.anchors.fill(Anchor::default());
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn explicit_ids_keep_their_index() {
        assert_eq!(AnchorId::new(1).index(), 1);
        assert_eq!(AnchorId::new(4095).index(), 4095);
    }

    #[test]
    #[should_panic(expected = "reserved for the root")]
    fn zero_is_reserved() {
        let _id = AnchorId::new(0);
    }

    #[test]
    #[should_panic(expected = "outside the anchor table")]
    fn index_beyond_capacity_panics() {
        let _id = AnchorId::new(4096);
    }

    #[test]
    fn allocated_ids_are_unique_and_never_root() {
        let first = AnchorId::allocate();
        let second = AnchorId::allocate();

        assert_ne!(first, second);
        assert_ne!(first, AnchorId::ROOT);
        assert_ne!(second, AnchorId::ROOT);
    }

    #[test]
    fn used_skips_root_and_idle_anchors() {
        let mut table = AnchorTable::new();

        table.get_mut(AnchorId::ROOT).inclusive_cycles = 5;
        table.get_mut(AnchorId::new(3)).inclusive_cycles = 10;
        table.get_mut(AnchorId::new(7)).inclusive_cycles = 20;
        table.get_mut(AnchorId::new(9)).hit_count = 1;

        let used: Vec<_> = table.used().map(|(id, _)| id.index()).collect();

        assert_eq!(used, vec![3, 7]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut table = AnchorTable::new();

        let anchor = table.get_mut(AnchorId::new(2));
        anchor.label = "work";
        anchor.inclusive_cycles = 10;
        anchor.hit_count = 3;

        table.reset();

        assert_eq!(table.used().count(), 0);
        assert_eq!(table.get(AnchorId::new(2)).hit_count, 0);
        assert_eq!(table.get(AnchorId::new(2)).label, "");
    }
}

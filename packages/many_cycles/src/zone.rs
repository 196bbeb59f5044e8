use std::mem;

use crate::{AnchorId, Profiler};

/// A measured region of code, open from the moment it is created until it is dropped.
///
/// Create one via [`Profiler::open_zone()`], the free function [`open_zone()`][crate::open_zone]
/// or (most conveniently) the [`zone!`][crate::zone] macro.
///
/// When a zone closes, the cycles elapsed since it opened are credited to its anchor and
/// debited from the anchor of the enclosing zone, so that each anchor's exclusive time
/// only includes the cycles not spent in nested zones.
///
/// This type is single-threaded and zones must be closed in the reverse order they were opened.
#[derive(Debug)]
#[must_use = "the zone is measured until the Zone is dropped; dropping it immediately measures nothing"]
pub struct Zone {
    profiler: Profiler,
    anchor: AnchorId,
    label: &'static str,

    // The anchor that was innermost when we opened, restored when we close.
    parent: AnchorId,

    inclusive_cycles_at_entry: u64,
    start_cycles: u64,
}

impl Zone {
    pub(crate) fn new(
        profiler: &Profiler,
        label: &'static str,
        anchor: AnchorId,
        byte_count: u64,
    ) -> Self {
        let (parent, inclusive_cycles_at_entry) = {
            let mut state = profiler.state_mut();

            let parent = mem::replace(&mut state.active_parent, anchor);

            let entry = state.anchors.get_mut(anchor);
            entry.processed_bytes = entry.processed_bytes.wrapping_add(byte_count);

            (parent, entry.inclusive_cycles)
        };

        let profiler = profiler.clone();

        // Everything above is bookkeeping that must not be charged to the zone.
        let start_cycles = profiler.clock().cycles();

        Self {
            profiler,
            anchor,
            label,
            parent,
            inclusive_cycles_at_entry,
            start_cycles,
        }
    }

    /// The anchor this zone accumulates into.
    #[must_use]
    pub fn anchor(&self) -> AnchorId {
        self.anchor
    }

    /// Closes the zone. Equivalent to dropping it.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Zone {
    fn drop(&mut self) {
        let elapsed = self
            .profiler
            .clock()
            .cycles()
            .wrapping_sub(self.start_cycles);

        let mut state = self.profiler.state_mut();

        state.active_parent = self.parent;

        let parent = state.anchors.get_mut(self.parent);
        parent.exclusive_cycles = parent.exclusive_cycles.wrapping_sub(elapsed);

        let anchor = state.anchors.get_mut(self.anchor);
        anchor.exclusive_cycles = anchor.exclusive_cycles.wrapping_add(elapsed);
        anchor.inclusive_cycles = self.inclusive_cycles_at_entry.wrapping_add(elapsed);
        anchor.hit_count = anchor.hit_count.wrapping_add(1);
        anchor.label = self.label;
    }
}

use tracing::{debug, debug_span};

use henkan_core::candidates::{make_candidates, sort_candidates};
use henkan_core::segment::{make_segments, sort_metawords};
use henkan_core::splitter::SplitterContext;

use super::types::ChangeState;
use super::{lock, ConversionContext};

impl ConversionContext {
    /// Start converting `text`, replacing any conversion in progress.
    pub fn set_string(&mut self, text: &str) {
        let _span = debug_span!("set_string", len = text.chars().count()).entered();
        let engine = self.engine.clone();
        let mut store = lock(&self.store);
        let mut sc = SplitterContext::new(&engine, text, self.direction, &mut store);
        let n = sc.len();
        sc.mark_border(&engine, 0, 0, n);
        drop(store);

        self.segments.clear();
        self.split = Some(sc);
        self.rebuild_from(0, 0);

        // Borders as first proposed; the learner compares resizes against them.
        if let Some(sc) = self.split.as_mut() {
            for seg in &self.segments {
                sc.set_initial_seg_len(seg.from, seg.len);
            }
        }
        self.change = ChangeState::ALL;
    }

    /// Grow (`delta > 0`) or shrink segment `nth`, then segment the rest
    /// again. Returns false and changes nothing when the new length would
    /// be empty or run past the input.
    pub fn resize_segment(&mut self, nth: usize, delta: isize) -> bool {
        let Some(seg) = self.segments.get(nth) else {
            return false;
        };
        let Some(sc) = self.split.as_mut() else {
            return false;
        };
        let n = sc.len();
        let (from, len) = (seg.from, seg.len);
        let new_len = len as isize + delta;
        if new_len < 1 || from + new_len as usize > n {
            debug!(nth, delta, "resize rejected");
            return false;
        }
        let _span = debug_span!("resize_segment", nth, delta).entered();
        let to = from + new_len as usize;

        for i in from + 1..n {
            sc.set_border(i, false);
        }
        sc.set_border(to, true);
        sc.set_border(n, true);
        sc.clear_best_mw_from(from);
        sc.mark_border(&self.engine, from, to, n);

        self.rebuild_from(nth, from);
        self.change = ChangeState::ALL;
        true
    }

    /// Replace segments `nth..` with fresh ones starting at offset `from`,
    /// then generate and rank their candidates.
    fn rebuild_from(&mut self, nth: usize, from: usize) {
        let Some(sc) = self.split.as_mut() else {
            return;
        };
        let engine = &self.engine;
        self.segments.truncate(nth);
        self.segments.extend(make_segments(sc, from));
        sort_metawords(sc, engine, &mut self.segments, nth);
        for seg in &mut self.segments[nth..] {
            make_candidates(engine, sc, seg);
        }
        let mut store = lock(&self.store);
        sort_candidates(engine, sc, &mut store, &mut self.segments, nth);
        debug!(segments = self.segments.len(), rebuilt_from = nth);
    }
}

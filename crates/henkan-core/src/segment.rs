//! Per-segment conversion state.

use crate::candidates::Candidate;
use crate::engine::Engine;
use crate::pos::SegClass;
use crate::splitter::{MwId, SplitterContext};

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub from: usize,
    pub len: usize,
    /// Input text of the segment.
    pub text: String,
    pub best_seg_class: SegClass,
    /// Compound leaf the lattice pinned to this offset, if any.
    pub best_mw: Option<MwId>,
    /// Metawords exactly covering the segment, best structure first once sorted.
    pub mw_array: Vec<MwId>,
    pub candidates: Vec<Candidate>,
    /// Candidate the user selected; `None` until something is chosen.
    pub committed: Option<usize>,
}

impl Segment {
    pub fn new(sc: &SplitterContext, from: usize, len: usize) -> Self {
        Segment {
            from,
            len,
            text: sc.text(from, len),
            best_seg_class: sc.best_seg_class(from),
            best_mw: sc.best_mw(from),
            mw_array: sc.metaword_array(from, len),
            candidates: Vec::new(),
            committed: None,
        }
    }

    pub fn end(&self) -> usize {
        self.from + self.len
    }

    /// Index of the candidate that will be committed.
    pub fn committed_index(&self) -> usize {
        self.committed.unwrap_or(0)
    }

    pub fn committed_candidate(&self) -> Option<&Candidate> {
        self.candidates.get(self.committed_index())
    }
}

/// Segments for the borders currently marked from offset `from` on.
pub fn make_segments(sc: &SplitterContext, from: usize) -> Vec<Segment> {
    sc.segment_spans(from)
        .into_iter()
        .map(|(from, len)| Segment::new(sc, from, len))
        .collect()
}

/// Give every offered metaword of `segments[nth..]` its structural score
/// and sort each segment's array by it. The previous segment's class is
/// the context.
pub fn sort_metawords(
    sc: &mut SplitterContext,
    engine: &Engine,
    segments: &mut [Segment],
    nth: usize,
) {
    let mut prev = match nth.checked_sub(1).and_then(|i| segments.get(i)) {
        Some(seg) => seg.best_seg_class,
        None => SegClass::HEAD,
    };
    for seg in segments.iter_mut().skip(nth) {
        sc.sort_by_structure(engine, &mut seg.mw_array, prev);
        prev = seg.best_seg_class;
    }
}

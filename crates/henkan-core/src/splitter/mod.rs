//! Segmentation of one input string.
//!
//! A [`SplitterContext`] owns every word list and metaword built for its
//! input. Both live in flat arenas and refer to each other by index
//! ([`WlId`], [`MwId`]), so composed metawords share children without
//! reference counting and everything is dropped with the context.
//!
//! The pipeline:
//! 1. [`wordlist`] enumerates word lists through the dependent-word graph.
//! 2. [`metaword`] composes them into metawords.
//! 3. [`constraint`] marks which metawords respect a requested border.
//! 4. [`lattice`] picks the most probable path and marks segment borders.
//! 5. [`structure`] scores the metawords offered for one segment.

mod constraint;
mod lattice;
mod metaword;
mod structure;
#[cfg(test)]
mod tests;
mod wordlist;

pub use metaword::{CanUse, MetaWord, MwKind, MwStatus};
pub use wordlist::{Part, PartKind, WordList, NR_PARTS};

use tracing::{debug, debug_span};

use crate::dict::Direction;
use crate::engine::Engine;
use crate::pos::SegClass;
use crate::record::RecordStore;
use crate::unicode::{char_class, CharClass};

/// Index of a word list in its context's arena.
pub type WlId = usize;
/// Index of a metaword in its context's arena.
pub type MwId = usize;

/// Border state the lattice writes: one slot per offset, `len + 1` slots.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Borders {
    pub seg_border: Vec<bool>,
    pub best_seg_class: Vec<SegClass>,
    pub best_mw: Vec<Option<MwId>>,
}

impl Borders {
    fn new(n: usize) -> Self {
        let mut seg_border = vec![false; n + 1];
        seg_border[0] = true;
        seg_border[n] = true;
        Borders {
            seg_border,
            best_seg_class: vec![SegClass::HEAD; n + 1],
            best_mw: vec![None; n + 1],
        }
    }
}

pub struct SplitterContext {
    chars: Vec<char>,
    classes: Vec<CharClass>,
    dir: Direction,
    word_lists: Vec<WordList>,
    metawords: Vec<MetaWord>,
    /// Metawords starting at each offset, in creation order.
    mw_at: Vec<Vec<MwId>>,
    borders: Borders,
    /// Segment length chosen by the first segmentation, per start offset.
    initial_seg_len: Vec<usize>,
}

impl SplitterContext {
    /// Build word lists and metawords for `text`.
    ///
    /// The store is read for learned expansions and phrases; phrases that
    /// get replayed are marked used.
    pub fn new(engine: &Engine, text: &str, dir: Direction, store: &mut RecordStore) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let n = chars.len();
        let _span = debug_span!("splitter_init", n).entered();
        let classes: Vec<CharClass> = chars.iter().map(|&c| char_class(c)).collect();

        let by_from = wordlist::make_word_lists(engine, &chars, &classes, dir);
        let word_lists: Vec<WordList> = by_from.into_iter().flatten().collect();

        let mut sc = SplitterContext {
            chars,
            classes,
            dir,
            word_lists,
            metawords: Vec::new(),
            mw_at: vec![Vec::new(); n + 1],
            borders: Borders::new(n),
            initial_seg_len: vec![0; n + 1],
        };
        metaword::make_metaword_all(&mut sc, engine, store);
        debug!(
            word_lists = sc.word_lists.len(),
            metawords = sc.metawords.len()
        );
        sc
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }

    /// Input text of `[from, from + len)`.
    pub fn text(&self, from: usize, len: usize) -> String {
        self.chars[from..from + len].iter().collect()
    }

    pub fn class_at(&self, i: usize) -> CharClass {
        self.classes.get(i).copied().unwrap_or(CharClass::NONE)
    }

    pub fn word_list(&self, id: WlId) -> &WordList {
        &self.word_lists[id]
    }

    pub fn word_lists(&self) -> &[WordList] {
        &self.word_lists
    }

    pub fn metaword(&self, id: MwId) -> &MetaWord {
        &self.metawords[id]
    }

    pub(crate) fn metaword_mut(&mut self, id: MwId) -> &mut MetaWord {
        &mut self.metawords[id]
    }

    pub fn metawords(&self) -> &[MetaWord] {
        &self.metawords
    }

    /// Metawords starting at offset `i`.
    pub fn metawords_at(&self, i: usize) -> &[MwId] {
        self.mw_at.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_border(&self, i: usize) -> bool {
        self.borders.seg_border.get(i).copied().unwrap_or(false)
    }

    pub fn set_border(&mut self, i: usize, on: bool) {
        if let Some(b) = self.borders.seg_border.get_mut(i) {
            *b = on;
        }
    }

    /// Segment class the lattice chose for the segment starting at `i`.
    pub fn best_seg_class(&self, i: usize) -> SegClass {
        self.borders
            .best_seg_class
            .get(i)
            .copied()
            .unwrap_or(SegClass::HEAD)
    }

    /// Metaword the lattice chose for the segment starting at `i`.
    pub fn best_mw(&self, i: usize) -> Option<MwId> {
        self.borders.best_mw.get(i).copied().flatten()
    }

    /// Forget the lattice's choices from offset `from` on.
    pub fn clear_best_mw_from(&mut self, from: usize) {
        for slot in self.borders.best_mw.iter_mut().skip(from) {
            *slot = None;
        }
    }

    pub fn initial_seg_len(&self, i: usize) -> usize {
        self.initial_seg_len.get(i).copied().unwrap_or(0)
    }

    pub fn set_initial_seg_len(&mut self, i: usize, len: usize) {
        if let Some(slot) = self.initial_seg_len.get_mut(i) {
            *slot = len;
        }
    }

    /// Segment spans `(from, len)` implied by the current borders, starting at `from`.
    pub fn segment_spans(&self, from: usize) -> Vec<(usize, usize)> {
        let n = self.len();
        let mut spans = Vec::new();
        let mut start = from;
        while start < n {
            let end = (start + 1..=n).find(|&i| self.is_border(i)).unwrap_or(n);
            spans.push((start, end - start));
            start = end;
        }
        spans
    }

    /// Re-run the constraint check and the lattice over `[from, to)`.
    ///
    /// `from2` is a border the caller insists on: metawords starting in
    /// `[from, from2)` must end exactly there. Only slots inside
    /// `[from, to)` are updated.
    pub fn mark_border(&mut self, engine: &Engine, from: usize, from2: usize, to: usize) {
        if to <= from || to > self.len() {
            return;
        }
        let _span = debug_span!("mark_border", from, from2, to).entered();
        let mut work = self.borders.clone();
        constraint::eval_border(self, engine, &mut work, from, from2, to);
        self.borders.seg_border[from..to].copy_from_slice(&work.seg_border[from..to]);
        self.borders.best_seg_class[from..to].copy_from_slice(&work.best_seg_class[from..to]);
        self.borders.best_mw[from..to].copy_from_slice(&work.best_mw[from..to]);
    }

    /// Usable metawords exactly covering a segment, longest match first.
    ///
    /// When nothing covers `[from, from + len)` the span is shortened one
    /// character at a time, skipping cuts before a combining character.
    pub fn metaword_array(&self, from: usize, len: usize) -> Vec<MwId> {
        for l in (1..=len).rev() {
            if l < len && self.class_at(from + l).intersects(CharClass::PART) {
                continue;
            }
            let found: Vec<MwId> = self
                .metawords_at(from)
                .iter()
                .copied()
                .filter(|&id| {
                    let mw = &self.metawords[id];
                    mw.len == l && mw.can_use == CanUse::Ok
                })
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Compute the structural score of `mw_ids` and sort them by it.
    pub fn sort_by_structure(&mut self, engine: &Engine, mw_ids: &mut [MwId], prev: SegClass) {
        structure::sort_by_structure(self, engine, mw_ids, prev);
    }
}

impl std::fmt::Debug for SplitterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitterContext")
            .field("text", &self.chars.iter().collect::<String>())
            .field("word_lists", &self.word_lists.len())
            .field("metawords", &self.metawords.len())
            .finish()
    }
}

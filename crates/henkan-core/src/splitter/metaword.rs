//! Metaword composition.
//!
//! Every word list becomes one metaword. Metawords are then combined with
//! their right neighbours (verb stems with adjective or noun tails,
//! numerals with numerals), compound dictionary entries are unfolded,
//! learned expansions and phrases are replayed, and trailing symbol runs
//! are wrapped.

use tracing::{debug, debug_span};

use super::{MwId, SplitterContext, WlId, NR_PARTS};
use crate::dict::CompoundEntry;
use crate::engine::Engine;
use crate::feature::MwFeatures;
use crate::grammar::RATIO_BASE;
use crate::pos::{ConjType, DepClass, Pos, Scos, SegClass, WordType, WT_A_TAIL_OF_V_RENYOU};
use crate::record::{RecordStore, Row, EXPANDPAIR, OCHAIRE};
use crate::settings::settings;
use crate::unicode::CharClass;

use super::wordlist::{PartKind, WordList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MwKind {
    /// Span the user expanded a segment to before.
    Dummy,
    Single,
    /// A metaword plus a trailing run of symbols.
    Wrap,
    CompoundHead,
    Compound,
    CompoundLeaf,
    CompoundPart,
    /// Verb renyou form followed by an adjective-forming tail.
    VRenyouA,
    /// Verb renyou form followed by a noun-forming tail.
    VRenyouNoun,
    Number,
    /// One segment of a learned phrase.
    Ochaire,
}

/// How candidates are produced from a metaword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MwStatus {
    None,
    Wrapped,
    Compound,
    CompoundPart,
    Combined,
    Ochaire,
}

/// How a metaword is checked against a requested border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MwCheck {
    None,
    Single,
    Wrap,
    Compound,
    Border,
    Number,
    Ochaire,
}

impl MwKind {
    fn bonus(self) -> i64 {
        match self {
            MwKind::VRenyouA | MwKind::VRenyouNoun => 100,
            _ => 0,
        }
    }

    pub fn status(self) -> MwStatus {
        match self {
            MwKind::Dummy | MwKind::Single | MwKind::CompoundHead | MwKind::Compound => {
                MwStatus::None
            }
            MwKind::Wrap => MwStatus::Wrapped,
            MwKind::CompoundLeaf => MwStatus::Compound,
            MwKind::CompoundPart => MwStatus::CompoundPart,
            MwKind::VRenyouA | MwKind::VRenyouNoun | MwKind::Number => MwStatus::Combined,
            MwKind::Ochaire => MwStatus::Ochaire,
        }
    }

    pub(crate) fn check(self) -> MwCheck {
        match self {
            MwKind::Dummy | MwKind::Single | MwKind::CompoundPart => MwCheck::Single,
            MwKind::Wrap => MwCheck::Wrap,
            MwKind::CompoundHead => MwCheck::Compound,
            MwKind::Compound | MwKind::CompoundLeaf => MwCheck::None,
            MwKind::VRenyouA | MwKind::VRenyouNoun => MwCheck::Border,
            MwKind::Number => MwCheck::Number,
            MwKind::Ochaire => MwCheck::Ochaire,
        }
    }
}

/// Whether a metaword may be used under the current border constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanUse {
    #[default]
    Unchecked,
    Ok,
    Ng,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetaWord {
    pub kind: MwKind,
    pub from: usize,
    pub len: usize,
    pub score: i64,
    /// Structural score set when the metaword is offered for a segment.
    pub struct_score: i64,
    pub weak_len: usize,
    pub seg_class: SegClass,
    pub dep_class: DepClass,
    pub dep_word_hash: u32,
    pub features: MwFeatures,
    pub core_wt: WordType,
    pub nr_parts: usize,
    pub wl: Option<WlId>,
    pub mw1: Option<MwId>,
    pub mw2: Option<MwId>,
    /// Literal carried by compound and learned-phrase metawords.
    pub hint: String,
    pub can_use: CanUse,
}

impl MetaWord {
    fn new(kind: MwKind, from: usize, len: usize) -> Self {
        MetaWord {
            kind,
            from,
            len,
            score: 0,
            struct_score: 0,
            weak_len: 0,
            seg_class: SegClass::HEAD,
            dep_class: DepClass::None,
            dep_word_hash: 0,
            features: MwFeatures::NONE,
            core_wt: WordType::default(),
            nr_parts: 1,
            wl: None,
            mw1: None,
            mw2: None,
            hint: String::new(),
            can_use: CanUse::Ok,
        }
    }

    pub fn end(&self) -> usize {
        self.from + self.len
    }

    /// Take segment class and dependent-word features from another metaword.
    fn inherit_tail(&mut self, other: &MetaWord) {
        self.seg_class = other.seg_class;
        self.dep_class = other.dep_class;
        self.dep_word_hash = other.dep_word_hash;
        self.features = other.features;
        self.core_wt = other.core_wt;
    }

    fn inherit_word_list(&mut self, wl: &WordList) {
        self.seg_class = wl.seg_class;
        self.dep_class = wl.part(PartKind::DepWord).dc;
        self.dep_word_hash = wl.dep_word_hash;
        self.features = wl.features;
        self.core_wt = wl.core().wt;
    }
}

/// Base score of a word-list metaword: 1000 scaled by the tail's connection ratio.
fn word_list_score(wl: &WordList) -> i64 {
    let ratio = wl.part(PartKind::DepWord).ratio as i64;
    (1000 * ratio / RATIO_BASE as i64).max(1)
}

impl SplitterContext {
    /// Add a metaword to the arena, applying its kind's score bonus.
    pub(super) fn commit_metaword(&mut self, mut mw: MetaWord) -> MwId {
        mw.score += mw.kind.bonus();
        let id = self.metawords.len();
        self.mw_at[mw.from].push(id);
        self.metawords.push(mw);
        id
    }

    /// Join two metawords; `b` may be absent to wrap `a` alone.
    fn cons_metaword(&mut self, kind: MwKind, a: MwId, b: Option<MwId>, weak: bool) -> MwId {
        let left = self.metawords[a].clone();
        let right = b.map(|id| self.metawords[id].clone());
        let mut n = MetaWord::new(kind, left.from, left.len);
        n.mw1 = Some(a);
        n.mw2 = b;
        match &right {
            Some(r) => {
                n.len += r.len;
                n.weak_len = if weak {
                    left.weak_len + r.len
                } else {
                    left.weak_len + r.weak_len
                };
                n.score = ((left.score as f64).sqrt() * (r.score as f64).sqrt()) as i64;
                n.nr_parts = left.nr_parts + r.nr_parts;
                n.inherit_tail(r);
            }
            None => {
                n.weak_len = left.weak_len;
                n.score = left.score;
                n.nr_parts = left.nr_parts;
                n.inherit_tail(&left);
            }
        }
        self.commit_metaword(n)
    }

    fn list_metaword(&mut self, kind: MwKind, a: MwId, b: MwId, weak: bool) -> MwId {
        let tail = self.cons_metaword(kind, b, None, weak);
        self.cons_metaword(kind, a, Some(tail), weak)
    }
}

pub(super) fn make_metaword_all(sc: &mut SplitterContext, engine: &Engine, store: &mut RecordStore) {
    let _span = debug_span!("make_metaword_all", n = sc.len()).entered();
    make_metaword_from_word_lists(sc, engine);
    let simple = sc.metawords.len();
    combine_metaword_all(sc, engine);
    let combined = sc.metawords.len() - simple;
    make_expanded_metaword_all(sc, store);
    make_metaword_with_depchar_all(sc);
    make_ochaire_metaword_all(sc, store);
    bias_to_single_char_metaword(sc);
    debug!(simple, combined, total = sc.metawords.len());
}

fn make_metaword_from_word_lists(sc: &mut SplitterContext, engine: &Engine) {
    for wl_id in 0..sc.word_lists.len() {
        let wl = sc.word_lists[wl_id];
        if wl.is_compound {
            let key = sc.text(wl.core().from, wl.core().len);
            let Some(se) = engine.dict().lookup_in(&key, sc.dir) else {
                continue;
            };
            for ce in &se.compounds {
                if ce.reading_len() != wl.core().len || ce.segments.is_empty() {
                    continue;
                }
                make_compound_part_metaword(sc, &wl, ce);
                make_compound_metaword(sc, &wl, ce);
            }
        } else {
            let mut mw = MetaWord::new(MwKind::Single, wl.from, wl.len);
            mw.wl = Some(wl_id);
            mw.weak_len = wl.weak_len;
            mw.score = word_list_score(&wl);
            mw.nr_parts = NR_PARTS;
            mw.inherit_word_list(&wl);
            sc.commit_metaword(mw);
        }
    }
}

/// Metaword for the `nth` segment of a compound entry. The first segment
/// takes the prefix and the last one the postfix and dependent tail.
fn compound_nth_metaword(
    sc: &SplitterContext,
    wl: &WordList,
    ce: &CompoundEntry,
    nth: usize,
    kind: MwKind,
) -> MetaWord {
    let pre_len = wl.part(PartKind::Prefix).len;
    let post_len = wl.part(PartKind::Postfix).len + wl.part(PartKind::DepWord).len;
    let last = ce.segments.len() - 1;

    let mut from = wl.from;
    let mut len = 0;
    for (i, seg) in ce.segments.iter().enumerate().take(nth + 1) {
        from += len;
        len = seg.len;
        if i == 0 {
            len += pre_len;
        }
        if i == last {
            len += post_len;
        }
    }

    let mut mw = MetaWord::new(kind, from, len);
    mw.score = word_list_score(wl);
    mw.inherit_word_list(wl);
    if nth == 0 {
        mw.hint.push_str(&sc.text(wl.from, pre_len));
    }
    mw.hint.push_str(&ce.segments[nth].surface);
    if nth == last {
        mw.hint.push_str(&sc.text(wl.end() - post_len, post_len));
    }
    mw
}

/// One leaf per segment, chained from the right into a head.
fn make_compound_metaword(sc: &mut SplitterContext, wl: &WordList, ce: &CompoundEntry) {
    let mut rest: Option<MwId> = None;
    for j in (0..ce.segments.len()).rev() {
        let leaf = compound_nth_metaword(sc, wl, ce, j, MwKind::CompoundLeaf);
        let leaf = sc.commit_metaword(leaf);
        let kind = if j == 0 {
            MwKind::CompoundHead
        } else {
            MwKind::Compound
        };
        rest = Some(sc.cons_metaword(kind, leaf, rest, false));
    }
}

/// Runs of two or more consecutive compound segments as single metawords.
fn make_compound_part_metaword(sc: &mut SplitterContext, wl: &WordList, ce: &CompoundEntry) {
    for j in (0..ce.segments.len()).rev() {
        let mut right = compound_nth_metaword(sc, wl, ce, j, MwKind::CompoundPart);
        for k in (0..j).rev() {
            let mut left = compound_nth_metaword(sc, wl, ce, k, MwKind::CompoundPart);
            left.len += right.len;
            left.score += right.score;
            left.hint.push_str(&right.hint);
            sc.commit_metaword(left.clone());
            right = left;
        }
    }
}

fn combine_metaword_all(sc: &mut SplitterContext, engine: &Engine) {
    // Metawords made by combining are combined further only through
    // the explicit recursion for numerals.
    let base = sc.metawords.len();
    for i in (0..sc.len()).rev() {
        let ids: Vec<MwId> = sc.mw_at[i].iter().copied().filter(|&id| id < base).collect();
        for id in ids {
            combine_metaword(sc, engine, id);
        }
    }
}

fn combine_metaword(sc: &mut SplitterContext, engine: &Engine, mw: MwId) {
    if sc.metawords[mw].seg_class.is_depword() {
        return;
    }
    let from = sc.metawords[mw].from;
    for i in (0..from).rev() {
        let lefts = sc.mw_at[i].clone();
        for left in lefts {
            if sc.metawords[left].end() == from {
                try_combine_metaword(sc, engine, left, mw);
            }
        }
    }
}

fn try_combine_metaword(sc: &mut SplitterContext, engine: &Engine, left: MwId, right: MwId) {
    let Some(wl1) = sc.metawords[left].wl.map(|id| sc.word_lists[id]) else {
        return;
    };
    let wl2 = sc.metawords[right].wl.map(|id| sc.word_lists[id]);
    // The right side must not start with a prefix.
    if wl2.is_some_and(|wl| wl.part(PartKind::Prefix).len > 0) {
        return;
    }
    if let Some(wl2) = wl2 {
        try_combine_v_renyou(sc, engine, &wl1, &wl2, left, right);
    }
    try_combine_number(sc, engine, &wl1, wl2, left, right);
}

fn try_combine_v_renyou(
    sc: &mut SplitterContext,
    engine: &Engine,
    wl1: &WordList,
    wl2: &WordList,
    left: MwId,
    right: MwId,
) {
    if wl1.head_pos != Pos::V || wl1.tail_ct != ConjType::Renyou {
        return;
    }
    let w2 = wl2.core().wt;
    if w2.pos == Pos::A {
        let key = sc.text(wl2.core().from, wl2.core().len);
        let is_tail = engine
            .dict()
            .lookup_in(&key, sc.dir)
            .is_some_and(|se| se.wtype_freq(&WT_A_TAIL_OF_V_RENYOU) > 0);
        if is_tail {
            sc.list_metaword(MwKind::VRenyouA, left, right, false);
        }
    }
    if w2.pos == Pos::Noun && w2.scos == Scos::T40 {
        sc.list_metaword(MwKind::VRenyouNoun, left, right, false);
    }
}

fn try_combine_number(
    sc: &mut SplitterContext,
    engine: &Engine,
    wl1: &WordList,
    wl2: Option<WordList>,
    left: MwId,
    right: MwId,
) {
    if wl1.core().wt.pos != Pos::Number {
        return;
    }
    // Without a word list the right side must be a numeral already combined.
    let recursive = wl2.is_none();
    let wl2 = match wl2 {
        Some(wl2) => {
            if wl2.core().wt.pos != Pos::Number {
                return;
            }
            wl2
        }
        None => {
            let r = &sc.metawords[right];
            if r.kind != MwKind::Number {
                return;
            }
            match r.mw1.and_then(|id| sc.metawords[id].wl) {
                Some(id) => sc.word_lists[id],
                None => return,
            }
        }
    };
    if wl1.part(PartKind::Postfix).len > 0 || wl1.part(PartKind::DepWord).len > 0 {
        return;
    }
    if !number_can_precede(wl1.core().wt.scos, wl2.core().wt.scos) {
        return;
    }
    let combined = if recursive {
        sc.cons_metaword(MwKind::Number, left, Some(right), false)
    } else {
        sc.list_metaword(MwKind::Number, left, right, false)
    };
    combine_metaword(sc, engine, combined);
}

/// Can a numeral of magnitude `left` be directly followed by one of `right`?
///
/// 一〜九 take only 十 and up, 十〜九十 take anything but tens and larger
/// non-myriad units, and myriad units (万, 億 ...) take anything.
fn number_can_precede(left: Scos, right: Scos) -> bool {
    if right == Scos::None {
        return false;
    }
    let forbidden: &[Scos] = match left {
        Scos::N1 => &[Scos::N1, Scos::N10, Scos::N100, Scos::N1000],
        Scos::N10 => &[Scos::N10, Scos::N100, Scos::N1000],
        Scos::N100 => &[Scos::N100, Scos::N1000],
        Scos::N1000 => &[Scos::N1000],
        Scos::N10000 => &[],
        _ => return false,
    };
    !forbidden.contains(&right)
}

/// Replay spans the user expanded segments into.
fn make_expanded_metaword_all(sc: &mut SplitterContext, store: &RecordStore) {
    let Some(section) = store.section(EXPANDPAIR) else {
        return;
    };
    let n = sc.len();
    let mut dummies = Vec::new();
    for i in 0..n {
        for j in 1..n - i {
            let Some(row) = section.row(&sc.text(i, j)) else {
                continue;
            };
            for expanded in row.texts() {
                let len = expanded.chars().count();
                if len <= n - i && sc.text(i, len) == expanded {
                    dummies.push((i, len, j));
                }
            }
        }
    }
    for (from, len, orig_len) in dummies {
        make_dummy_metaword(sc, from, len, orig_len);
    }
}

fn make_dummy_metaword(sc: &mut SplitterContext, from: usize, len: usize, orig_len: usize) {
    fn best_of(sc: &SplitterContext, from: usize, len: usize) -> Option<MetaWord> {
        sc.mw_at[from]
            .iter()
            .map(|&id| &sc.metawords[id])
            .filter(|mw| mw.len == len && mw.kind != MwKind::Dummy)
            .max_by_key(|mw| mw.score)
            .cloned()
    }
    let score = best_of(sc, from, orig_len).map_or(0, |mw| mw.score);
    let mut n = MetaWord::new(MwKind::Dummy, from, len);
    n.score = 3 * score * len as i64 / orig_len as i64;
    n.nr_parts = 0;
    // The lattice scores the dummy like the span's own best reading.
    if let Some(shape) = best_of(sc, from, len).or_else(|| best_of(sc, from, orig_len)) {
        n.inherit_tail(&shape);
    }
    sc.commit_metaword(n);
}

fn make_metaword_with_depchar_all(sc: &mut SplitterContext) {
    let count = sc.metawords.len();
    for id in 0..count {
        make_metaword_with_depchar(sc, Some(id));
    }
    make_metaword_with_depchar(sc, None);
}

/// Wrap a run of symbols or combining marks following `mw` (or starting
/// the input when `mw` is `None`).
fn make_metaword_with_depchar(sc: &mut SplitterContext, mw: Option<MwId>) {
    let n = sc.len();
    let (from, len) = mw.map_or((0, 0), |id| (sc.metawords[id].from, sc.metawords[id].len));
    let start = from + len;
    if start >= n {
        return;
    }
    let ty = sc.classes[start];
    if !ty.intersects(CharClass::SYMBOL | CharClass::PART) {
        return;
    }
    let mut run = 0;
    let mut mixed = false;
    while start + run < n {
        let p = start + run;
        if sc.classes[p] != ty {
            break;
        }
        if p > 0 && p + 1 < n && sc.chars[p] != sc.chars[p + 1] {
            mixed = true;
        }
        run += 1;
    }

    let mut wrap = MetaWord::new(MwKind::Single, from, len + run);
    match mw {
        Some(id) => {
            let inner = sc.metawords[id].clone();
            wrap.kind = MwKind::Wrap;
            wrap.mw1 = Some(id);
            wrap.score = inner.score;
            wrap.nr_parts = inner.nr_parts;
            wrap.weak_len = inner.weak_len + run;
            wrap.inherit_tail(&inner);
            if mixed {
                wrap.seg_class = SegClass::DOKURITSUGO;
                wrap.score /= settings().metaword.mixed_wrap_divisor;
            }
        }
        None => {
            wrap.score = 1;
            wrap.seg_class = SegClass::DOKURITSUGO;
        }
    }
    sc.commit_metaword(wrap);
}

/// Replay the first learned phrase found in the input.
fn make_ochaire_metaword_all(sc: &mut SplitterContext, store: &mut RecordStore) {
    let n = sc.len();
    for i in 0..n {
        let found = store
            .section(OCHAIRE)
            .and_then(|s| s.longest_prefix(&sc.chars[i..], n - i))
            .map(|(key, row)| (key, row.clone()));
        let Some((key, row)) = found else {
            continue;
        };
        store.touch(OCHAIRE, &key);
        make_ochaire_metaword(sc, i, key.chars().count(), &row);
        break;
    }
}

/// Row layout: segment count, then (length, literal) per segment.
fn make_ochaire_metaword(sc: &mut SplitterContext, from: usize, key_len: usize, row: &Row) {
    let count = row.int(0).unwrap_or(0).max(0) as usize;
    let mut segs = Vec::with_capacity(count);
    for j in 0..count {
        let (Some(len), Some(lit)) = (row.int(j * 2 + 1), row.text(j * 2 + 2)) else {
            return;
        };
        if len <= 0 {
            return;
        }
        segs.push((len as usize, lit.to_string()));
    }
    let total: usize = segs.iter().map(|(len, _)| len).sum();
    if segs.is_empty() || total != key_len {
        return;
    }

    let score = settings().metaword.ochaire_score;
    let mut offset = from + total;
    let mut right: Option<MwId> = None;
    for (len, lit) in segs.into_iter().rev() {
        offset -= len;
        let mut mw = MetaWord::new(MwKind::Ochaire, offset, len);
        mw.mw1 = right;
        mw.score = score;
        mw.hint = lit;
        right = Some(sc.commit_metaword(mw));
    }
}

/// One-character segments (ignoring trailing combining marks) are rarely right.
fn bias_to_single_char_metaword(sc: &mut SplitterContext) {
    let divisor = settings().metaword.single_char_divisor;
    for i in (0..sc.len()).rev() {
        if sc.classes[i].intersects(CharClass::OPEN | CharClass::CLOSE) {
            continue;
        }
        for k in 0..sc.mw_at[i].len() {
            let id = sc.mw_at[i][k];
            let mw = &sc.metawords[id];
            if mw.seg_class.is_depword() {
                continue;
            }
            let single = (1..mw.len).all(|off| sc.classes[i + off].intersects(CharClass::PART));
            if single {
                sc.metawords[id].score /= divisor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeral_adjacency() {
        assert!(!number_can_precede(Scos::N1, Scos::N1));
        assert!(!number_can_precede(Scos::N1, Scos::N100));
        assert!(number_can_precede(Scos::N1, Scos::N10000));
        assert!(number_can_precede(Scos::N10, Scos::N1));
        assert!(!number_can_precede(Scos::N10, Scos::N10));
        assert!(number_can_precede(Scos::N100, Scos::N10));
        assert!(number_can_precede(Scos::N10000, Scos::N10000));
        assert!(!number_can_precede(Scos::N10000, Scos::None));
        assert!(!number_can_precede(Scos::T35, Scos::N1));
    }

    #[test]
    fn kind_tables() {
        assert_eq!(MwKind::VRenyouA.bonus(), 100);
        assert_eq!(MwKind::Number.status(), MwStatus::Combined);
        assert_eq!(MwKind::CompoundLeaf.check(), MwCheck::None);
        assert_eq!(MwKind::Ochaire.check(), MwCheck::Ochaire);
        assert_eq!(MwKind::Wrap.status(), MwStatus::Wrapped);
    }
}

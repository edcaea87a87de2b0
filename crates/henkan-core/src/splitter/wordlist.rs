//! Word-list enumeration.
//!
//! A word list is one way to read a stretch of the input as a single
//! segment: an optional prefix, an independent-word core, an optional
//! postfix and a dependent-word tail found by walking the grammar graph.
//! Every step of the walk produces a fresh copy of the list, so branches
//! never have to undo each other's changes.

use tracing::{debug, debug_span};

use crate::dict::{Direction, SeqEntry};
use crate::engine::Engine;
use crate::feature::{dep_word_hash, MwFeatures};
use crate::grammar::{Branch, DepGraph, RATIO_BASE, TERMINAL_NODE};
use crate::pos::{
    ConjType, DepClass, Pos, Scos, SegClass, WordType, WT_NAME_NOUN, WT_NAME_POSTFIX,
    WT_NUM_NOUN, WT_NUM_POSTFIX, WT_NUM_PREFIX, WT_SV_POSTFIX,
};
use crate::settings::settings;
use crate::unicode::CharClass;

pub const NR_PARTS: usize = 4;

/// Graph walks deeper than this are cut off (guards against empty-condition cycles).
const MAX_GRAPH_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Prefix = 0,
    Core = 1,
    Postfix = 2,
    DepWord = 3,
}

impl PartKind {
    pub const ALL: [PartKind; NR_PARTS] = [
        PartKind::Prefix,
        PartKind::Core,
        PartKind::Postfix,
        PartKind::DepWord,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Part {
    pub from: usize,
    pub len: usize,
    pub wt: WordType,
    pub freq: i32,
    /// Connection strength, fixed point over `RATIO_BASE`.
    pub ratio: i32,
    pub dc: DepClass,
}

impl Default for Part {
    fn default() -> Self {
        Part {
            from: 0,
            len: 0,
            wt: WordType::default(),
            freq: 1,
            ratio: RATIO_BASE,
            dc: DepClass::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WordList {
    pub from: usize,
    pub len: usize,
    /// Characters consumed through weak transitions.
    pub weak_len: usize,
    pub is_compound: bool,
    /// Grammar node the core entered the graph at; `None` for empty cores.
    pub node: Option<usize>,
    pub head_pos: Pos,
    pub tail_ct: ConjType,
    pub seg_class: SegClass,
    pub features: MwFeatures,
    pub dep_word_hash: u32,
    pub parts: [Part; NR_PARTS],
}

impl WordList {
    fn new(from: usize, len: usize, is_compound: bool, is_weak: bool) -> Self {
        let mut parts = [Part::default(); NR_PARTS];
        parts[PartKind::Core as usize].from = from;
        parts[PartKind::Core as usize].len = len;
        parts[PartKind::Postfix as usize].from = from + len;
        parts[PartKind::DepWord as usize].from = from + len;
        WordList {
            from,
            len,
            weak_len: 0,
            is_compound,
            node: None,
            head_pos: Pos::None,
            tail_ct: ConjType::None,
            seg_class: SegClass::HEAD,
            features: if is_weak {
                MwFeatures::WEAK_SEQ
            } else {
                MwFeatures::NONE
            },
            dep_word_hash: 0,
            parts,
        }
    }

    pub fn part(&self, kind: PartKind) -> &Part {
        &self.parts[kind as usize]
    }

    fn part_mut(&mut self, kind: PartKind) -> &mut Part {
        &mut self.parts[kind as usize]
    }

    pub fn core(&self) -> &Part {
        self.part(PartKind::Core)
    }

    pub fn end(&self) -> usize {
        self.from + self.len
    }

    /// Loose equality used to prune duplicate lists at commit.
    fn same_shape(&self, other: &WordList) -> bool {
        self.node == other.node
            && self.from == other.from
            && self.len == other.len
            && self.features == other.features
            && self.tail_ct == other.tail_ct
            && self.core().len == other.core().len
            && self.is_compound == other.is_compound
            && self.core().wt == other.core().wt
            && self.head_pos == other.head_pos
            && self.part(PartKind::DepWord).dc == other.part(PartKind::DepWord).dc
    }

    fn set_features(&mut self, high_freq_threshold: i64) {
        let core = *self.core();
        if core.wt.pos == Pos::Noun && core.wt.is_sv() {
            self.features.insert(MwFeatures::SV);
        }
        if self.part(PartKind::Postfix).len > 0 || self.part(PartKind::Prefix).len > 0 {
            self.features.insert(MwFeatures::SUFFIX);
        }
        if core.wt.pos == Pos::Number {
            self.features.insert(MwFeatures::NUM);
        }
        match core.len {
            0 => self.features.insert(MwFeatures::DEP_ONLY),
            1 => self.features.insert(MwFeatures::CORE1),
            _ => {}
        }
        if core.freq as i64 > high_freq_threshold {
            self.features.insert(MwFeatures::HIGH_FREQ);
        }
        if self.weak_len > 0 {
            self.features.insert(MwFeatures::WEAK_CONN);
        }
    }

    fn push_part_front(&mut self, len: usize, wt: WordType, freq: i32) {
        self.from -= len;
        self.len += len;
        let from = self.from;
        let prefix = self.part_mut(PartKind::Prefix);
        prefix.from = from;
        prefix.len += len;
        prefix.wt = wt;
        prefix.freq = freq;
    }

    fn push_part_back(&mut self, len: usize, wt: WordType, freq: i32) {
        self.len += len;
        let postfix = self.part_mut(PartKind::Postfix);
        postfix.len += len;
        postfix.wt = wt;
        postfix.freq = freq;
    }
}

/// An independent word (or compound) found during the dictionary scan.
struct CoreMatch {
    from: usize,
    len: usize,
    is_compound: bool,
    is_weak: bool,
}

struct WordListBuilder<'a> {
    engine: &'a Engine,
    graph: &'a DepGraph,
    chars: &'a [char],
    classes: &'a [CharClass],
    dir: Direction,
    high_freq_threshold: i64,
    /// Longest suffix-capable entry starting at each offset.
    seq_len: Vec<usize>,
    /// Longest prefix-capable entry ending at each offset.
    rev_seq_len: Vec<usize>,
    lists: Vec<Vec<WordList>>,
}

/// Enumerate every word list of `chars`, grouped by start offset.
pub(crate) fn make_word_lists(
    engine: &Engine,
    chars: &[char],
    classes: &[CharClass],
    dir: Direction,
) -> Vec<Vec<WordList>> {
    let n = chars.len();
    let _span = debug_span!("make_word_lists", n).entered();
    let mut builder = WordListBuilder {
        engine,
        graph: &engine.grammar().graph,
        chars,
        classes,
        dir,
        high_freq_threshold: settings().wordlist.high_freq_threshold,
        seq_len: vec![0; n + 1],
        rev_seq_len: vec![0; n + 1],
        lists: vec![Vec::new(); n + 1],
    };

    let cores = builder.scan_dictionary();
    for core in &cores {
        builder.make_word_list(core);
    }

    // Lists without a core: at the head of the input and after a
    // non-punctuation symbol or closing bracket.
    for i in 0..n {
        let allowed = i == 0 || {
            let prev = classes[i - 1];
            prev.intersects(CharClass::CLOSE | CharClass::SYMBOL)
                && !prev.intersects(CharClass::PUNCTUATION)
        };
        if allowed {
            let tmpl = WordList::new(i, 0, false, false);
            builder.make_following(&tmpl);
        }
    }

    let count: usize = builder.lists.iter().map(Vec::len).sum();
    debug!(cores = cores.len(), word_lists = count);
    builder.lists
}

impl<'a> WordListBuilder<'a> {
    fn key(&self, from: usize, len: usize) -> String {
        self.chars[from..from + len].iter().collect()
    }

    fn lookup(&self, from: usize, len: usize) -> Option<&'a SeqEntry> {
        self.engine.dict().lookup_in(&self.key(from, len), self.dir)
    }

    fn scan_dictionary(&mut self) -> Vec<CoreMatch> {
        let n = self.chars.len();
        let max_len = settings().wordlist.max_search_len;
        let mut cores = Vec::new();
        for i in 0..n {
            for j in (1..=max_len.min(n - i)).rev() {
                let Some(se) = self.lookup(i, j) else {
                    continue;
                };
                if j > self.seq_len[i] && se.pos_freq(Pos::Suc) > 0 {
                    self.seq_len[i] = j;
                }
                if j > self.rev_seq_len[i + j] && se.pos_freq(Pos::Pre) > 0 {
                    self.rev_seq_len[i + j] = j;
                }
                if se.has_words() && se.has_indep() {
                    cores.push(CoreMatch {
                        from: i,
                        len: j,
                        is_compound: false,
                        is_weak: self.engine.dict().is_weak(&self.key(i, j)),
                    });
                }
                if se.has_compounds() {
                    cores.push(CoreMatch {
                        from: i,
                        len: j,
                        is_compound: true,
                        is_weak: false,
                    });
                }
            }
        }
        cores
    }

    fn make_word_list(&mut self, core: &CoreMatch) {
        let Some(se) = self.lookup(core.from, core.len) else {
            return;
        };
        let base = WordList::new(core.from, core.len, core.is_compound, core.is_weak);
        let engine = self.engine;
        for rule in &engine.grammar().rules {
            let freq = if core.is_compound {
                se.compound_wtype_freq(&rule.wtype)
            } else {
                se.wtype_freq(&rule.wtype)
            };
            if freq <= 0 {
                continue;
            }
            let mut tmpl = base;
            let core_part = tmpl.part_mut(PartKind::Core);
            core_part.wt = rule.wtype;
            core_part.freq = freq;
            tmpl.node = Some(rule.node);
            tmpl.head_pos = rule.wtype.pos;
            if matches!(rule.wtype.pos, Pos::Noun | Pos::Number) {
                self.make_pre_words(&tmpl);
                self.make_suc_words(&tmpl);
            }
            self.make_following(&tmpl);
        }
    }

    /// Attach number prefixes (第, 約 ...) in front of a number core.
    fn make_pre_words(&mut self, tmpl: &WordList) {
        let core = *tmpl.core();
        if !WT_NUM_NOUN.includes(&core.wt) {
            return;
        }
        for i in 1..=self.rev_seq_len[core.from] {
            let Some(pre) = self.lookup(core.from - i, i) else {
                continue;
            };
            let freq = pre.wtype_freq(&WT_NUM_PREFIX);
            if pre.pos_freq(Pos::Pre) > 0 && freq > 0 {
                let mut next = *tmpl;
                next.push_part_front(i, WT_NUM_PREFIX, freq);
                self.make_following(&next);
                self.make_suc_words(&next);
            }
        }
    }

    /// Attach postfixes to number, person-name and suru-noun cores.
    fn make_suc_words(&mut self, tmpl: &WordList) {
        let core = *tmpl.core();
        let is_num = WT_NUM_NOUN.includes(&core.wt);
        let is_name = WT_NAME_NOUN.includes(&core.wt);
        let is_sv = core.wt.is_sv();
        if !is_num && !is_name && !is_sv {
            return;
        }
        let right = core.from + core.len;
        for i in 1..=self.seq_len[right] {
            let Some(suc) = self.lookup(right, i) else {
                continue;
            };
            if suc.pos_freq(Pos::Suc) == 0 {
                continue;
            }
            for (applies, wt) in [
                (is_num, WT_NUM_POSTFIX),
                (is_name, WT_NAME_POSTFIX),
                (is_sv, WT_SV_POSTFIX),
            ] {
                let freq = suc.wtype_freq(&wt);
                if applies && freq > 0 {
                    let mut next = *tmpl;
                    next.push_part_back(i, wt, freq);
                    self.make_following(&next);
                }
            }
        }
    }

    /// Walk the grammar graph over the text after the list.
    fn make_following(&mut self, tmpl: &WordList) {
        let mut tmpl = *tmpl;
        let postfix = *tmpl.part(PartKind::Postfix);
        tmpl.part_mut(PartKind::DepWord).from = postfix.from + postfix.len;
        let at = tmpl.end();
        match tmpl.node {
            Some(node) => self.match_nodes(&tmpl, at, node, 0),
            None => {
                // An empty core behaves like a low-grade noun.
                let engine = self.engine;
                for rule in &engine.grammar().rules {
                    if rule.wtype.pos == Pos::Noun && rule.wtype.scos == Scos::T35 {
                        let mut next = tmpl;
                        next.part_mut(PartKind::Core).wt = rule.wtype;
                        next.node = Some(rule.node);
                        next.head_pos = rule.wtype.pos;
                        self.match_nodes(&next, at, rule.node, 0);
                    }
                }
            }
        }
    }

    fn match_nodes(&mut self, wl: &WordList, at: usize, node: usize, depth: usize) {
        if depth > MAX_GRAPH_DEPTH {
            return;
        }
        let graph = self.graph;
        let Some(dn) = graph.node(node) else {
            return;
        };
        for branch in &dn.branches {
            for cond in &branch.conditions {
                let cond_len = cond.chars().count();
                if at + cond_len > self.chars.len() {
                    continue;
                }
                if !self.chars[at..at + cond_len].iter().copied().eq(cond.chars()) {
                    continue;
                }
                let mut next = *wl;
                next.part_mut(PartKind::DepWord).len += cond_len;
                self.match_branch(&next, at + cond_len, cond_len, branch, depth);
            }
        }
    }

    fn match_branch(
        &mut self,
        tmpl: &WordList,
        at: usize,
        cond_len: usize,
        branch: &Branch,
        depth: usize,
    ) {
        let rest = self.chars.len() - at;
        for t in &branch.transitions {
            let mut wl = *tmpl;
            let weak = t.weak || (t.dc == DepClass::End && rest > 0);
            if weak {
                wl.weak_len += cond_len;
            }
            let dep = wl.part_mut(PartKind::DepWord);
            dep.ratio = dep.ratio * t.trans_ratio / RATIO_BASE;
            if !weak {
                let l = cond_len as i32;
                dep.ratio += l * l * l * 3;
            }
            if t.dc != DepClass::None {
                dep.dc = t.dc;
            }
            wl.tail_ct = t.ct;
            if t.head_pos != Pos::None {
                wl.head_pos = t.head_pos;
            }

            if t.next != TERMINAL_NODE {
                self.match_nodes(&wl, at, t.next, depth + 1);
                continue;
            }
            let dep = *wl.part(PartKind::DepWord);
            wl.len += dep.len;
            // One-letter particles like は and が bind strongly.
            if dep.len == 1 && at > 0 && self.classes[at - 1].contains(CharClass::STRONG) {
                let dep = wl.part_mut(PartKind::DepWord);
                dep.ratio = dep.ratio * 3 / 2;
            }
            self.commit(wl);
        }
    }

    fn commit(&mut self, mut wl: WordList) {
        if wl.len == 0 {
            return;
        }
        wl.set_features(self.high_freq_threshold);
        let dep = *wl.part(PartKind::DepWord);
        wl.seg_class = SegClass::classify(wl.core().len > 0, wl.head_pos, dep.dc);
        wl.dep_word_hash = dep_word_hash(&self.key(dep.from, dep.len));
        let bucket = &mut self.lists[wl.from];
        if bucket.iter().any(|other| other.same_shape(&wl)) {
            return;
        }
        bucket.push(wl);
    }
}

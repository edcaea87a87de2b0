use tracing::{debug, debug_span};

use super::{CandElement, CandFlags, Candidate, WordChoice};
use crate::dict::Direction;
use crate::engine::Engine;
use crate::grammar::RATIO_BASE;
use crate::numeric;
use crate::pos::{ConjType, Pos};
use crate::segment::Segment;
use crate::splitter::{MwId, MwStatus, PartKind, SplitterContext, WordList};
use crate::unicode::{char_class, hiragana_to_katakana, to_fullwidth, to_halfwidth, CharClass};

/// Alternative forms offered for a lone punctuation mark.
static PUNCTUATION_ALTERNATIVES: &[(&str, &[&str])] = &[
    ("。", &["．", "."]),
    ("、", &["，", ","]),
    ("？", &["?"]),
    ("！", &["!"]),
    ("「", &["｢", "["]),
    ("」", &["｣", "]"]),
    ("・", &["／", "/"]),
    ("〜", &["~"]),
];

/// Fill `seg.candidates` with every candidate the segment can produce.
///
/// Always yields at least the hiragana and katakana renderings.
pub fn make_candidates(engine: &Engine, sc: &SplitterContext, seg: &mut Segment) {
    let _span = debug_span!("make_candidates", text = seg.text.as_str()).entered();
    let mut gen = Generator {
        engine,
        sc,
        seg: &*seg,
        out: Vec::new(),
    };

    // Metawords scoring below a third of the best one (capped at
    // RATIO_BASE) are not worth materializing.
    let limit = seg
        .mw_array
        .first()
        .map(|&id| sc.metaword(id).score.min(RATIO_BASE as i64) / 3)
        .unwrap_or(0);
    if let Some(best) = seg.best_mw {
        gen.proc_metaword(best, best);
    }
    for &id in &seg.mw_array {
        if sc.metaword(id).score > limit && Some(id) != seg.best_mw {
            gen.proc_metaword(id, id);
        }
    }
    let from_metawords = gen.out.len();

    gen.push_singleword();
    gen.push_noconv();
    gen.push_guessed();
    gen.push_width_and_numeral();

    debug!(
        metaword_candidates = from_metawords,
        total = gen.out.len()
    );
    let out = gen.out;
    seg.candidates = out;
}

struct Generator<'a> {
    engine: &'a Engine,
    sc: &'a SplitterContext,
    seg: &'a Segment,
    out: Vec<Candidate>,
}

impl Generator<'_> {
    fn dir(&self) -> Direction {
        self.sc.direction()
    }

    /// Candidates for `id`, scored later through `top`'s structure.
    fn proc_metaword(&mut self, id: MwId, top: MwId) {
        let sc = self.sc;
        let mw = sc.metaword(id);
        if let Some(wl) = mw.wl {
            let wl = sc.word_list(wl);
            if wl.len > 0 {
                self.from_word_lists(id, top, &[*wl]);
                return;
            }
        }
        match mw.kind.status() {
            MwStatus::Wrapped => {
                if let Some(inner) = mw.mw1 {
                    self.proc_metaword(inner, top);
                }
            }
            MwStatus::Combined => {
                let lists = self.chain_word_lists(id);
                if !lists.is_empty() {
                    self.from_word_lists(id, top, &lists);
                }
            }
            MwStatus::Compound => {
                let cand = Candidate::fixed(mw.hint.clone(), CandFlags::COMPOUND, Some(top));
                self.push(cand, top);
            }
            status @ (MwStatus::CompoundPart | MwStatus::Ochaire) => {
                let mut text = mw.hint.clone();
                if mw.len < self.seg.len {
                    // Tail of the segment the metaword does not cover.
                    text.extend(&sc.chars()[self.seg.from + mw.len..self.seg.end()]);
                }
                let flags = if status == MwStatus::Ochaire {
                    CandFlags::OCHAIRE
                } else {
                    CandFlags::COMPOUND_PART
                };
                self.push(Candidate::fixed(text, flags, Some(top)), top);
            }
            MwStatus::None => {}
        }
    }

    /// Word lists along a combination chain, left to right.
    fn chain_word_lists(&self, id: MwId) -> Vec<WordList> {
        let mut lists = Vec::new();
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            let link = self.sc.metaword(c);
            let Some(wl) = link.mw1.and_then(|m| self.sc.metaword(m).wl) else {
                break;
            };
            lists.push(*self.sc.word_list(wl));
            cursor = link.mw2;
        }
        lists
    }

    fn push(&mut self, mut cand: Candidate, top: MwId) {
        cand.struct_score = self.sc.metaword(top).struct_score;
        self.out.push(cand);
    }

    fn from_word_lists(&mut self, id: MwId, top: MwId, lists: &[WordList]) {
        let mut template = Candidate::fixed(String::new(), CandFlags::NONE, Some(top));
        if self.seg.best_mw == Some(id) {
            template.flags = CandFlags::BEST;
        }
        for wl in lists {
            let mut at = wl.from;
            for kind in PartKind::ALL {
                let part = wl.part(kind);
                if part.len == 0 {
                    continue;
                }
                if kind == PartKind::Core {
                    template.core = Some(template.elements.len());
                }
                let end = (at + part.len).min(self.sc.len());
                template.elements.push(CandElement {
                    kind,
                    reading: self.sc.chars()[at..end].iter().collect(),
                    wt: part.wt,
                    word: None,
                });
                at = end;
            }
        }
        template.struct_score = self.sc.metaword(top).struct_score;
        self.enumerate(template, 0, self.seg.from);
    }

    /// Assign dictionary words to elements depth first, one branch per
    /// matching entry.
    fn enumerate(&mut self, cand: Candidate, n: usize, at: usize) {
        let (engine, sc) = (self.engine, self.sc);
        if n == cand.elements.len() {
            let mut done = cand;
            if at < self.seg.end() {
                done.text.extend(&sc.chars()[at..self.seg.end()]);
            }
            self.out.push(done);
            return;
        }
        let elm = &cand.elements[n];
        let next_at = at + elm.reading_len();
        let entries = engine
            .dict()
            .lookup_in(&elm.reading, self.dir())
            .map(|se| se.entries.as_slice())
            .unwrap_or(&[]);

        if matches!(elm.wt.pos, Pos::Inval | Pos::None) || entries.is_empty() {
            let mut next = cand.clone();
            next.text.push_str(&elm.reading);
            self.enumerate(next, n + 1, next_at);
            return;
        }

        let pattern = elm.wt.with_ct(ConjType::None);
        for entry in entries {
            if !pattern.includes(&entry.wtype) {
                continue;
            }
            let mut next = cand.clone();
            next.text.push_str(&entry.surface);
            next.elements[n].word = Some(WordChoice {
                surface: entry.surface.clone(),
                id: entry.id,
                freq: entry.freq,
            });
            self.enumerate(next, n + 1, next_at);
        }
    }

    /// Whole-segment dictionary words in their base form.
    fn push_singleword(&mut self) {
        let engine = self.engine;
        let Some(se) = engine.dict().lookup_in(&self.seg.text, self.dir()) else {
            return;
        };
        for entry in &se.entries {
            if matches!(entry.wtype.ct, ConjType::Syusi | ConjType::None) {
                self.out.push(Candidate::fixed(
                    entry.surface.clone(),
                    CandFlags::SINGLEWORD,
                    None,
                ));
            }
        }
    }

    fn push_noconv(&mut self) {
        let text = &self.seg.text;
        self.out
            .push(Candidate::fixed(text.clone(), CandFlags::HIRAGANA, None));
        self.out.push(Candidate::fixed(
            hiragana_to_katakana(text),
            CandFlags::KATAKANA,
            None,
        ));
    }

    /// Katakana for everything but a trailing particle character.
    fn push_guessed(&mut self) {
        let chars: Vec<char> = self.seg.text.chars().collect();
        let Some((&last, stem)) = chars.split_last() else {
            return;
        };
        if chars.len() < 2 || !char_class(last).contains(CharClass::DEP) {
            return;
        }
        let stem: String = stem.iter().collect();
        let mut text = hiragana_to_katakana(&stem);
        text.push(last);
        self.out
            .push(Candidate::fixed(text, CandFlags::GUESS, None));
    }

    fn push_width_and_numeral(&mut self) {
        let text = self.seg.text.clone();
        let mut renderings: Vec<(String, CandFlags)> = Vec::new();

        if let Some(n) = numeric::parse_digits(&text) {
            renderings.push((to_halfwidth(&text), CandFlags::WIDTH));
            renderings.push((to_fullwidth(&text), CandFlags::WIDTH));
            renderings.push((numeric::to_kanji_digits(&text), CandFlags::NUMERAL));
            renderings.push((numeric::to_kanji_numeral(n), CandFlags::NUMERAL));
            if n >= 1000 {
                renderings.push((numeric::to_grouped(n), CandFlags::NUMERAL));
            }
        } else if let Some(n) = numeric::parse_kana_number(&text) {
            let digits = n.to_string();
            renderings.push((to_fullwidth(&digits), CandFlags::NUMERAL));
            renderings.push((digits, CandFlags::NUMERAL));
            renderings.push((numeric::to_kanji_numeral(n), CandFlags::NUMERAL));
        } else {
            renderings.push((to_halfwidth(&text), CandFlags::WIDTH));
            renderings.push((to_fullwidth(&text), CandFlags::WIDTH));
            if let Some((_, alts)) = PUNCTUATION_ALTERNATIVES.iter().find(|(k, _)| *k == text) {
                renderings.extend(alts.iter().map(|a| (a.to_string(), CandFlags::WIDTH)));
            }
        }

        for (rendered, flags) in renderings {
            if rendered != text {
                self.out.push(Candidate::fixed(rendered, flags, None));
            }
        }
    }
}

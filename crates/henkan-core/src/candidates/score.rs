use std::collections::HashMap;

use tracing::{debug, debug_span};

use super::{rerank, CandFlags, Candidate};
use crate::engine::Engine;
use crate::grammar::RATIO_BASE;
use crate::pos::Pos;
use crate::record::RecordStore;
use crate::segment::Segment;
use crate::settings::settings;
use crate::splitter::SplitterContext;

/// Score, deduplicate and re-rank the candidates of `segments[nth..]`.
///
/// Earlier segments are read as context for the relation passes but
/// keep their order.
pub fn sort_candidates(
    engine: &Engine,
    sc: &SplitterContext,
    store: &mut RecordStore,
    segments: &mut [Segment],
    nth: usize,
) {
    let _span = debug_span!("sort_candidates", nth, segments = segments.len()).entered();
    if nth >= segments.len() {
        return;
    }
    for seg in &mut segments[nth..] {
        let uncertain = is_uncertain(sc, seg);
        for cand in &mut seg.candidates {
            eval_candidate(cand, uncertain);
        }
        sort(&mut seg.candidates);
        mark_duplicates(&mut seg.candidates);
        sort(&mut seg.candidates);
        seg.candidates.retain(|c| c.score > 0);
    }

    rerank::apply_learning(engine, store, segments, nth);

    for seg in &mut segments[nth..] {
        sort(&mut seg.candidates);
        trim_kana(&mut seg.candidates);
        sort(&mut seg.candidates);
        debug!(
            text = seg.text.as_str(),
            candidates = seg.candidates.len(),
            top = seg.candidates.first().map(|c| c.text.as_str())
        );
    }
}

/// Stable, highest score first.
pub(super) fn sort(cands: &mut [Candidate]) {
    cands.sort_by(|a, b| b.score.cmp(&a.score));
}

/// The lattice had to stretch: the segment is much longer than its best
/// metaword, or nothing covers it at all.
pub(super) fn is_uncertain(sc: &SplitterContext, seg: &Segment) -> bool {
    match seg.mw_array.first() {
        Some(&id) => seg.len * 3 >= sc.metaword(id).len * 5,
        None => true,
    }
}

fn eval_candidate(cand: &mut Candidate, uncertain: bool) {
    let cfg = &settings().candidates;
    let flags = cand.flags;
    cand.score = if !flags.intersects(CandFlags::FIXED) {
        score_by_metaword(cand)
    } else if flags.contains(CandFlags::OCHAIRE) {
        cfg.ochaire_score
    } else if flags.contains(CandFlags::SINGLEWORD) {
        cfg.singleword_score
    } else if flags.contains(CandFlags::COMPOUND) {
        cfg.compound_score
    } else if flags.contains(CandFlags::COMPOUND_PART) {
        cfg.compound_part_score
    } else if flags.contains(CandFlags::BEST) {
        cfg.best_score
    } else if uncertain {
        let mut score = cfg.uncertain_bias;
        if flags.contains(CandFlags::KATAKANA) {
            score += 1;
        }
        if flags.contains(CandFlags::GUESS) {
            score += 2;
        }
        score
    } else {
        cfg.noconv_score
    };
    cand.score += 1;
}

/// Summed word frequency (affixes count half) scaled by the structure score.
fn score_by_metaword(cand: &Candidate) -> i64 {
    let mut score: i64 = 1;
    for elm in &cand.elements {
        let Some(word) = &elm.word else {
            continue;
        };
        let div = if matches!(elm.wt.pos, Pos::Pre | Pos::Suc) {
            2
        } else {
            1
        };
        score += word.freq as i64 / div;
    }
    if cand.mw.is_some() {
        score = score * cand.struct_score / RATIO_BASE as i64;
    }
    score
}

/// Zero every later copy of a literal and give its flags to the first.
fn mark_duplicates(cands: &mut [Candidate]) {
    let mut first: HashMap<String, usize> = HashMap::new();
    for j in 0..cands.len() {
        match first.get(&cands[j].text) {
            Some(&i) => {
                let flags = cands[j].flags;
                cands[i].flags.insert(flags);
                cands[j].score = 0;
            }
            None => {
                first.insert(cands[j].text.clone(), j);
            }
        }
    }
}

/// Unless katakana won outright, katakana renderings go to the bottom.
fn trim_kana(cands: &mut [Candidate]) {
    let Some(top) = cands.first() else {
        return;
    };
    if top.flags.contains(CandFlags::KATAKANA) {
        return;
    }
    let floor = settings().candidates.noconv_score;
    for cand in &mut cands[1..] {
        if cand.flags.contains(CandFlags::KATAKANA) {
            cand.score = floor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(text: &str, score: i64, flags: CandFlags) -> Candidate {
        let mut c = Candidate::fixed(text, flags, None);
        c.score = score;
        c
    }

    #[test]
    fn duplicates_merge_flags_upward() {
        let mut cands = vec![
            cand("１２３４", 900_002, CandFlags::KATAKANA),
            cand("1234", 900_001, CandFlags::WIDTH),
            cand("１２３４", 900_001, CandFlags::HIRAGANA),
        ];
        mark_duplicates(&mut cands);
        assert_eq!(cands[2].score, 0);
        assert!(cands[0]
            .flags
            .contains(CandFlags::KATAKANA | CandFlags::HIRAGANA));
        assert_eq!(cands[1].score, 900_001);
    }

    #[test]
    fn katakana_sinks_unless_first() {
        let mut cands = vec![
            cand("今日", 500, CandFlags::NONE),
            cand("キョウ", 400, CandFlags::KATAKANA),
        ];
        trim_kana(&mut cands);
        assert_eq!(cands[1].score, 1);

        let mut cands = vec![
            cand("キョウ", 500, CandFlags::KATAKANA),
            cand("今日", 400, CandFlags::NONE),
        ];
        trim_kana(&mut cands);
        assert_eq!(cands[1].score, 400);
    }

    #[test]
    fn fixed_bases() {
        let mut c = cand("x", 0, CandFlags::SINGLEWORD);
        eval_candidate(&mut c, false);
        assert_eq!(c.score, 11);

        let mut c = cand("x", 0, CandFlags::HIRAGANA);
        eval_candidate(&mut c, false);
        assert_eq!(c.score, 2);
        eval_candidate(&mut c, true);
        assert_eq!(c.score, 900_001);

        let mut c = cand("x", 0, CandFlags::GUESS);
        eval_candidate(&mut c, true);
        assert_eq!(c.score, 900_003);
    }

    #[test]
    fn sort_is_stable() {
        let mut cands = vec![
            cand("a", 5, CandFlags::NONE),
            cand("b", 7, CandFlags::NONE),
            cand("c", 5, CandFlags::NONE),
        ];
        sort(&mut cands);
        let order: Vec<&str> = cands.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(order, ["b", "a", "c"]);
    }
}

//! Learned re-ranking, applied lowest priority first so that later
//! passes override earlier ones: word relations and corpus
//! co-occurrence, then candidate swaps, then commit history.

use tracing::{debug, debug_span};

use super::{CandFlags, Candidate};
use crate::engine::Engine;
use crate::learn::has_learned_relation;
use crate::pos::Pos;
use crate::record::{RecordStore, CAND_HISTORY, INDEPPAIR, SUFFIX_HISTORY};
use crate::segment::Segment;
use crate::settings::settings;

/// Neighbour offsets whose top candidates form a segment's context.
const NEIGHBOURS: [isize; 3] = [-2, -1, 1];

pub(super) fn apply_learning(
    engine: &Engine,
    store: &mut RecordStore,
    segments: &mut [Segment],
    nth: usize,
) {
    let _span = debug_span!("apply_learning", nth).entered();
    reorder_by_relation(engine, store, segments, nth);
    if let Some(corpus) = engine.corpus() {
        reorder_by_corpus(corpus, segments, nth);
    }
    for seg in &mut segments[nth..] {
        if seg.candidates.is_empty() {
            continue;
        }
        proc_swap_candidate(store, &mut seg.candidates);
        reorder_by_history(store, &seg.text, &mut seg.candidates);
        reorder_by_suffix(store, &mut seg.candidates);
    }
}

fn neighbours(i: usize, n: usize) -> impl Iterator<Item = usize> {
    NEIGHBOURS
        .iter()
        .map(move |d| i as isize + d)
        .filter(move |&j| j >= 0 && (j as usize) < n)
        .map(|j| j as usize)
}

fn core_pos(cand: &Candidate) -> Option<Pos> {
    cand.core_element().map(|e| e.wt.pos)
}

/// Candidates of neighbouring segments related to a segment's top word
/// are multiplied by ten.
fn reorder_by_relation(
    engine: &Engine,
    store: &RecordStore,
    segments: &mut [Segment],
    nth: usize,
) {
    let n = segments.len();
    let mut boosted = 0usize;
    for i in nth.saturating_sub(1)..n {
        let Some(word_id) = segments[i].candidates.first().and_then(Candidate::core_id) else {
            continue;
        };
        // Segments before `nth` are settled.
        for j in neighbours(i, n).filter(|&j| j >= nth) {
            let target = &mut segments[j].candidates;
            let Some(pos) = target.first().and_then(core_pos) else {
                continue;
            };
            for cand in target.iter_mut() {
                let Some(id) = cand.core_id() else {
                    continue;
                };
                if core_pos(cand) != Some(pos) {
                    continue;
                }
                if engine.dict().check_relation(word_id, id)
                    || has_learned_relation(store, word_id, id)
                {
                    cand.flags.insert(CandFlags::USEDICT);
                    cand.score *= 10;
                    boosted += 1;
                }
            }
        }
    }
    if boosted > 0 {
        debug!(boosted, "relation");
    }
}

/// Candidates whose core word appears in the corpus next to the same
/// neighbours are doubled, unless the top candidate already fits.
fn reorder_by_corpus(corpus: &crate::dict::CorpusIndex, segments: &mut [Segment], nth: usize) {
    let n = segments.len();
    for i in nth..n {
        let context: Vec<u32> = [-2isize, -1, 1, 2]
            .iter()
            .map(|d| i as isize + d)
            .filter(|&j| j >= 0 && (j as usize) < n)
            .filter_map(|j| segments[j as usize].candidates.first()?.core_id())
            .collect();
        if context.is_empty() {
            continue;
        }
        let cands = &mut segments[i].candidates;
        let matched: Vec<usize> = cands
            .iter()
            .enumerate()
            .filter(|(_, c)| c.core_id().is_some_and(|id| corpus.is_similar(id, &context)))
            .map(|(k, _)| k)
            .collect();
        if matched.is_empty() || matched[0] == 0 {
            continue;
        }
        for k in matched {
            cands[k].flags.insert(CandFlags::CORPUS);
            cands[k].score *= 2;
        }
    }
}

/// Follow the learned "top word was replaced by" mapping one step.
///
/// `a → b → a` releases both rows; `a → b → c` is shortened to `a → c`.
fn prepare_swap_candidate(store: &mut RecordStore, key: &str) -> Option<String> {
    let target = store.row(INDEPPAIR, key)?.text(0)?.to_string();
    store.touch(INDEPPAIR, key);
    let Some(next) = store.row(INDEPPAIR, &target) else {
        return Some(target);
    };
    let next = next.text(0)?.to_string();
    if next == key {
        store.remove_row(INDEPPAIR, key);
        store.remove_row(INDEPPAIR, &target);
        return None;
    }
    store.update_row(INDEPPAIR, key, |row| row.set_text(0, &next));
    Some(next)
}

fn proc_swap_candidate(store: &mut RecordStore, cands: &mut [Candidate]) {
    let top = &cands[0];
    if top.score >= settings().candidates.ochaire_score || top.flags.contains(CandFlags::USEDICT)
    {
        return;
    }
    let Some(core) = top.core else {
        return;
    };
    let Some(key) = top.core_word().map(|w| w.surface.clone()) else {
        return;
    };
    let Some(target) = prepare_swap_candidate(store, &key) else {
        return;
    };
    let (nr_words, top_score) = (top.elements.len(), top.score);
    for cand in cands.iter_mut().skip(1) {
        if cand.elements.len() != nr_words || cand.core != Some(core) {
            continue;
        }
        if cand.core_word().is_some_and(|w| w.surface == target) {
            cand.score = top_score + 1;
            debug!(from = key.as_str(), to = target.as_str(), "swap");
            return;
        }
    }
}

/// Literals committed for this reading before gain a share of the top score.
fn reorder_by_history(store: &mut RecordStore, reading: &str, cands: &mut [Candidate]) {
    let Some(row) = store.row(CAND_HISTORY, reading) else {
        return;
    };
    let half_depth = (settings().learning.history_depth / 2).max(1) as i64;
    let top_score = cands[0].score;
    for cand in cands.iter_mut() {
        let mut weight: i64 = 0;
        for (i, past) in row.texts().enumerate() {
            if past == cand.text {
                weight += 1;
                if i == 0 {
                    weight += half_depth;
                }
            }
        }
        cand.score += top_score / half_depth * weight;
    }
    store.touch(CAND_HISTORY, reading);
}

/// Candidates using the affix literal chosen last time are lifted to the top.
fn reorder_by_suffix(store: &RecordStore, cands: &mut [Candidate]) {
    let top_score = cands[0].score;
    let mut delta = None;
    for cand in cands.iter_mut() {
        let matches = cand.elements.iter().any(|elm| {
            let Some(word) = &elm.word else {
                return false;
            };
            elm.wt.pos == Pos::Suc
                && store
                    .row(SUFFIX_HISTORY, &elm.reading)
                    .and_then(|row| row.text(0))
                    == Some(word.surface.as_str())
        });
        if matches {
            let d = *delta.get_or_insert(top_score - cand.score + 1);
            cand.score += d;
        }
    }
}

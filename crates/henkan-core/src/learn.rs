//! Commit-time learning.
//!
//! When the user commits a conversion, [`learn_commit`] writes what the
//! choice says about their preferences into the record store:
//!
//! - INDEPPAIR: the core word they picked over the top candidate
//! - EXPANDPAIR: segments they stretched over a right neighbour
//! - OCHAIRE: runs of 2 to 4 committed segments, replayed as phrases
//! - WORD_RELATION: neighbouring core words committed together
//! - CAND_HISTORY / SUFFIX_HISTORY: literals committed per reading
//! - PREDICTION: reading → literal completions with a timestamp

use tracing::{debug, debug_span};

use crate::candidates::{CandFlags, Candidate};
use crate::pos::Pos;
use crate::record::{
    RecordStore, Value, CAND_HISTORY, EXPANDPAIR, INDEPPAIR, OCHAIRE, PREDICTION, SUFFIX_HISTORY,
    WORD_RELATION,
};
use crate::segment::Segment;
use crate::settings::settings;
use crate::splitter::SplitterContext;

/// Most segments joined into one learned phrase.
const MAX_OCHAIRE_SEGMENTS: usize = 4;

/// A learned completion for a reading prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub reading: String,
    pub literal: String,
    pub timestamp: u64,
}

/// Record everything learnable from a commit. `now` stamps predictions.
pub fn learn_commit(
    sc: &SplitterContext,
    segments: &[Segment],
    store: &mut RecordStore,
    now: u64,
) {
    let _span = debug_span!("learn_commit", segments = segments.len()).entered();
    if segments.iter().any(|s| s.committed_candidate().is_none()) {
        debug!("segment without candidates, nothing learned");
        return;
    }
    learn_swapped_candidates(segments, store);
    learn_resized_segments(sc, segments, store);
    learn_ochaire(sc, segments, store);
    learn_word_relation(segments, store);
    learn_cand_history(segments, store);
    learn_prediction(segments, store, now);
}

fn learn_swapped_candidates(segments: &[Segment], store: &mut RecordStore) {
    let mut learned = 0;
    for seg in segments {
        let committed = seg.committed_index();
        if committed == 0 {
            continue;
        }
        let (old, new) = (&seg.candidates[0], &seg.candidates[committed]);
        if new.flags.contains(CandFlags::USEDICT) {
            continue;
        }
        let (Some(o), Some(n)) = (old.core_element(), new.core_element()) else {
            continue;
        };
        if o.reading_len() != n.reading_len() {
            continue;
        }
        let (Some(ow), Some(nw)) = (&o.word, &n.word) else {
            continue;
        };
        store.update_row(INDEPPAIR, &ow.surface, |row| row.set_text(0, &nw.surface));
        learned += 1;
    }
    store.truncate_section(INDEPPAIR, settings().learning.max_indep_pairs);
    debug!(learned, "swap");
}

/// Remember segments grown over the whole of their original right neighbour.
fn learn_resized_segments(sc: &SplitterContext, segments: &[Segment], store: &mut RecordStore) {
    let n = sc.len();
    for seg in segments {
        let from = seg.from;
        let initial = sc.initial_seg_len(from);
        if initial == 0 || from + initial == n {
            continue;
        }
        if initial + sc.initial_seg_len(from + initial) > seg.len {
            continue;
        }
        let real_len = seg
            .committed_candidate()
            .and_then(|c| c.mw)
            .map(|id| sc.metaword(id).len)
            .unwrap_or(0);
        if real_len <= initial {
            continue;
        }
        let key = sc.text(from, initial);
        let expanded = sc.text(from, real_len);
        let known = store
            .row(EXPANDPAIR, &key)
            .is_some_and(|row| row.texts().any(|t| t == expanded));
        if !known {
            store.update_row(EXPANDPAIR, &key, |row| row.push_text(&expanded));
            debug!(key = key.as_str(), expanded = expanded.as_str(), "expand");
        }
    }
    store.truncate_section(EXPANDPAIR, settings().learning.max_expand_pairs);
}

fn learn_ochaire(sc: &SplitterContext, segments: &[Segment], store: &mut RecordStore) {
    let max_len = settings().learning.max_ochaire_len;

    // Phrases recorded for any part of this input are stale now.
    let n = sc.len();
    for start in 0..n {
        for len in (1..=n - start).take_while(|&l| l < max_len) {
            store.remove_row(OCHAIRE, &sc.text(start, len));
        }
    }

    for count in 2..=segments.len().min(MAX_OCHAIRE_SEGMENTS) {
        for run in segments.windows(count) {
            let key: String = run.iter().map(|s| s.text.as_str()).collect();
            if key.chars().count() >= max_len {
                continue;
            }
            store.update_row(OCHAIRE, &key, |row| {
                row.truncate(0);
                row.set_int(0, count as i64);
                for (i, seg) in run.iter().enumerate() {
                    row.set_int(i * 2 + 1, seg.len as i64);
                    let literal = seg.committed_candidate().map(|c| c.text.as_str());
                    row.set_text(i * 2 + 2, literal.unwrap_or(&seg.text));
                }
            });
        }
    }
    store.truncate_section(OCHAIRE, settings().learning.max_ochaire_entries);
}

pub(crate) fn relation_key(id: u32) -> String {
    format!("{id:08x}")
}

/// Was `to` learned as a neighbour of `from`?
pub fn has_learned_relation(store: &RecordStore, from: u32, to: u32) -> bool {
    store
        .row(WORD_RELATION, &relation_key(from))
        .is_some_and(|row| {
            row.values()
                .iter()
                .any(|v| matches!(v, Value::Int(x) if *x == to as i64))
        })
}

/// The single converted word of a one-element candidate.
fn single_word(cand: &Candidate) -> Option<(Pos, u32)> {
    if cand.elements.len() != 1 {
        return None;
    }
    let elm = cand.core_element()?;
    Some((elm.wt.pos, elm.word.as_ref()?.id))
}

fn learn_word_relation(segments: &[Segment], store: &mut RecordStore) {
    let n = segments.len();
    let mut learned = 0;
    for (i, cur) in segments.iter().enumerate() {
        let committed = cur.committed_index();
        if committed == 0 {
            continue;
        }
        let Some((top_pos, _)) = single_word(&cur.candidates[0]) else {
            continue;
        };
        let Some((cur_pos, cur_id)) = single_word(&cur.candidates[committed]) else {
            continue;
        };
        if top_pos != cur_pos {
            continue;
        }
        for j in i.saturating_sub(2)..(i + 2).min(n) {
            if j == i {
                continue;
            }
            let Some((_, target_id)) = segments[j].committed_candidate().and_then(single_word)
            else {
                continue;
            };
            if has_learned_relation(store, target_id, cur_id) {
                continue;
            }
            store.update_row(WORD_RELATION, &relation_key(target_id), |row| {
                let len = row.len();
                row.set_int(len, cur_id as i64);
            });
            learned += 1;
        }
    }
    if learned > 0 {
        debug!(learned, "word relation");
    }
}

fn learn_cand_history(segments: &[Segment], store: &mut RecordStore) {
    let cfg = &settings().learning;
    let mut learned = 0;
    for seg in segments {
        let committed = seg.committed_index();
        if committed == 0 && store.row(CAND_HISTORY, &seg.text).is_none() {
            continue;
        }
        let cand = &seg.candidates[committed];
        let mut history: Vec<String> = store
            .row(CAND_HISTORY, &seg.text)
            .map(|row| row.texts().map(str::to_string).collect())
            .unwrap_or_default();
        history.insert(0, cand.text.clone());
        history.truncate(cfg.history_depth);
        store.update_row(CAND_HISTORY, &seg.text, |row| {
            row.truncate(0);
            for literal in &history {
                row.push_text(literal);
            }
        });
        learn_suffix_history(cand, store);
        learned += 1;
    }
    if learned > 0 {
        store.truncate_section(CAND_HISTORY, cfg.max_history_entries);
        store.truncate_section(SUFFIX_HISTORY, cfg.max_history_entries);
    }
}

fn learn_suffix_history(cand: &Candidate, store: &mut RecordStore) {
    for elm in &cand.elements {
        let Some(word) = &elm.word else {
            continue;
        };
        if elm.wt.pos != Pos::Suc {
            continue;
        }
        store.update_row(SUFFIX_HISTORY, &elm.reading, |row| {
            row.set_text(0, &word.surface)
        });
    }
}

/// Upsert reading → literal, refreshing the timestamp of a known literal.
fn learn_prediction(segments: &[Segment], store: &mut RecordStore, now: u64) {
    for seg in segments {
        let Some(cand) = seg.committed_candidate() else {
            continue;
        };
        let literal = cand.text.clone();
        store.update_row(PREDICTION, &seg.text, |row| {
            let pairs = row.len() / 2;
            let slot = (0..pairs)
                .find(|&k| row.text(k * 2 + 1) == Some(literal.as_str()))
                .unwrap_or(pairs);
            row.set_int(slot * 2, now as i64);
            row.set_text(slot * 2 + 1, &literal);
        });
    }
    store.truncate_section(PREDICTION, settings().learning.max_predictions);
}

/// Learned completions of readings starting with `prefix`, newest first.
pub fn predict(store: &RecordStore, prefix: &str) -> Vec<Prediction> {
    let Some(section) = store.section(PREDICTION) else {
        return Vec::new();
    };
    let mut out: Vec<Prediction> = Vec::new();
    for (reading, row) in section.with_prefix(prefix) {
        for k in 0..row.len() / 2 {
            let (Some(t), Some(literal)) = (row.int(k * 2), row.text(k * 2 + 1)) else {
                continue;
            };
            if t <= 0 {
                continue;
            }
            out.push(Prediction {
                reading: reading.to_string(),
                literal: literal.to_string(),
                timestamp: t as u64,
            });
        }
    }
    out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::{make_candidates, sort_candidates, CandElement, WordChoice};
    use crate::dict::{word_id, Direction};
    use crate::engine::Engine;
    use crate::pos::SegClass;
    use crate::segment::{make_segments, sort_metawords};
    use crate::splitter::PartKind;
    use crate::testutil::make_test_engine;

    fn convert(
        engine: &Engine,
        text: &str,
        store: &mut RecordStore,
    ) -> (SplitterContext, Vec<Segment>) {
        let mut sc = SplitterContext::new(engine, text, Direction::Forward, store);
        let n = sc.len();
        sc.mark_border(engine, 0, 0, n);
        let mut segments = make_segments(&sc, 0);
        sort_metawords(&mut sc, engine, &mut segments, 0);
        for seg in &mut segments {
            make_candidates(engine, &sc, seg);
        }
        sort_candidates(engine, &sc, store, &mut segments, 0);
        (sc, segments)
    }

    fn select(seg: &mut Segment, text: &str) {
        seg.committed = seg.candidates.iter().position(|c| c.text == text);
        assert!(seg.committed.is_some(), "no candidate {text}");
    }

    fn word(engine: &Engine, reading: &str, surface: &str) -> Candidate {
        let entry = engine
            .dict()
            .lookup(reading)
            .and_then(|se| se.entries.iter().find(|e| e.surface == surface))
            .unwrap();
        Candidate {
            text: surface.to_string(),
            score: entry.freq as i64,
            flags: CandFlags::NONE,
            elements: vec![CandElement {
                kind: PartKind::Core,
                reading: reading.to_string(),
                wt: entry.wtype,
                word: Some(WordChoice {
                    surface: surface.to_string(),
                    id: entry.id,
                    freq: entry.freq,
                }),
            }],
            core: Some(0),
            mw: None,
            struct_score: 0,
        }
    }

    fn segment(text: &str, candidates: Vec<Candidate>) -> Segment {
        Segment {
            from: 0,
            len: text.chars().count(),
            text: text.to_string(),
            best_seg_class: SegClass::HEAD,
            best_mw: None,
            mw_array: Vec::new(),
            candidates,
            committed: None,
        }
    }

    #[test]
    fn swapped_core_is_remembered() {
        let engine = make_test_engine();
        let mut store = RecordStore::new();
        let (sc, mut segments) = convert(&engine, "はし", &mut store);
        let top = segments[0].candidates[0].core_word().unwrap().surface.clone();
        assert_ne!(top, "端");
        select(&mut segments[0], "端");
        learn_commit(&sc, &segments, &mut store, 1);
        assert_eq!(store.row(INDEPPAIR, &top).unwrap().text(0), Some("端"));
    }

    #[test]
    fn committed_literal_wins_next_time() {
        let engine = make_test_engine();
        let mut store = RecordStore::new();
        let (sc, mut segments) = convert(&engine, "はし", &mut store);
        select(&mut segments[0], "端");
        learn_commit(&sc, &segments, &mut store, 1);
        assert_eq!(
            store.row(CAND_HISTORY, "はし").unwrap().text(0),
            Some("端")
        );

        let (_, segments) = convert(&engine, "はし", &mut store);
        assert_eq!(segments[0].candidates[0].text, "端");
    }

    #[test]
    fn history_keeps_most_recent_first() {
        let engine = make_test_engine();
        let mut store = RecordStore::new();
        for literal in ["端", "箸", "橋"] {
            let (sc, mut segments) = convert(&engine, "はし", &mut store);
            select(&mut segments[0], literal);
            learn_commit(&sc, &segments, &mut store, 1);
        }
        let row = store.row(CAND_HISTORY, "はし").unwrap();
        let history: Vec<&str> = row.texts().collect();
        assert_eq!(history, ["橋", "箸", "端"]);
    }

    #[test]
    fn phrase_is_recorded_per_segment() {
        let engine = make_test_engine();
        let mut store = RecordStore::new();
        let (sc, segments) = convert(&engine, "きょうはてんき", &mut store);
        assert_eq!(segments.len(), 2);
        learn_commit(&sc, &segments, &mut store, 1);

        let row = store.row(OCHAIRE, "きょうはてんき").unwrap();
        assert_eq!(row.int(0), Some(2));
        assert_eq!(row.int(1), Some(4));
        assert_eq!(row.text(2), Some(segments[0].candidates[0].text.as_str()));
        assert_eq!(row.int(3), Some(3));
        assert_eq!(row.text(4), Some(segments[1].candidates[0].text.as_str()));
    }

    #[test]
    fn nothing_learned_without_candidates() {
        let engine = make_test_engine();
        let mut store = RecordStore::new();
        let (sc, mut segments) = convert(&engine, "はし", &mut store);
        segments[0].candidates.clear();
        learn_commit(&sc, &segments, &mut store, 1);
        assert!(store.section(CAND_HISTORY).is_none());
        assert!(store.section(PREDICTION).is_none());
    }

    #[test]
    fn relation_learned_between_neighbours() {
        let engine = make_test_engine();
        let mut store = RecordStore::new();
        let mut kanji = segment(
            "かんじ",
            vec![word(&engine, "かんじ", "漢字"), word(&engine, "かんじ", "感じ")],
        );
        kanji.committed = Some(1);
        let segments = vec![segment("わたし", vec![word(&engine, "わたし", "私")]), kanji];

        learn_word_relation(&segments, &mut store);
        learn_word_relation(&segments, &mut store);
        let (from, to) = (word_id("わたし", "私"), word_id("かんじ", "感じ"));
        assert!(has_learned_relation(&store, from, to));
        assert!(!has_learned_relation(&store, to, from));
        assert_eq!(store.row(WORD_RELATION, &relation_key(from)).unwrap().len(), 1);
    }

    #[test]
    fn predictions_newest_first() {
        let engine = make_test_engine();
        let mut store = RecordStore::new();
        for (literal, now) in [("橋", 10), ("端", 20), ("橋", 30)] {
            let (sc, mut segments) = convert(&engine, "はし", &mut store);
            select(&mut segments[0], literal);
            learn_commit(&sc, &segments, &mut store, now);
        }
        let found = predict(&store, "は");
        let literals: Vec<(&str, u64)> = found
            .iter()
            .map(|p| (p.literal.as_str(), p.timestamp))
            .collect();
        assert_eq!(literals, [("橋", 30), ("端", 20)]);
        assert!(found.iter().all(|p| p.reading == "はし"));
        assert!(predict(&store, "か").is_empty());
    }
}

use proptest::prelude::*;

use super::*;
use crate::record::{EXPANDPAIR, OCHAIRE};
use crate::testutil::make_test_engine;

fn make_test_context(engine: &Engine, text: &str, store: &mut RecordStore) -> SplitterContext {
    let mut sc = SplitterContext::new(engine, text, Direction::Forward, store);
    let n = sc.len();
    sc.mark_border(engine, 0, 0, n);
    sc
}

fn find_kind(sc: &SplitterContext, from: usize, kind: MwKind) -> Vec<&MetaWord> {
    sc.metawords_at(from)
        .iter()
        .map(|&id| sc.metaword(id))
        .filter(|mw| mw.kind == kind)
        .collect()
}

#[test]
fn noun_and_particle_form_one_segment() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let sc = make_test_context(&engine, "きょうは", &mut store);
    assert_eq!(sc.segment_spans(0), vec![(0, 4)]);
    assert_eq!(sc.best_seg_class(0), SegClass::MEISHI_KAKUJOSHI);
}

#[test]
fn two_segments() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let sc = make_test_context(&engine, "きょうはてんき", &mut store);
    assert_eq!(sc.segment_spans(0), vec![(0, 4), (4, 3)]);
    assert_eq!(sc.best_seg_class(4), SegClass::MEISHI);
}

#[test]
fn compound_head_beats_compound_part() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let sc = make_test_context(&engine, "たなばた", &mut store);
    assert!(!find_kind(&sc, 0, MwKind::CompoundPart).is_empty());
    assert!(!find_kind(&sc, 0, MwKind::CompoundHead).is_empty());

    assert_eq!(sc.segment_spans(0), vec![(0, 2), (2, 2)]);
    let first = sc.metaword(sc.best_mw(0).unwrap());
    let second = sc.metaword(sc.best_mw(2).unwrap());
    assert_eq!(first.kind, MwKind::CompoundLeaf);
    assert_eq!(first.hint, "七");
    assert_eq!(second.hint, "夕");
    assert_eq!(second.can_use, CanUse::Ok);
}

#[test]
fn compound_part_joins_hints() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let sc = SplitterContext::new(&engine, "たなばた", Direction::Forward, &mut store);
    let parts = find_kind(&sc, 0, MwKind::CompoundPart);
    assert!(parts.iter().any(|mw| mw.len == 4 && mw.hint == "七夕"));
}

#[test]
fn numerals_combine() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let sc = make_test_context(&engine, "せんさん", &mut store);
    assert!(find_kind(&sc, 0, MwKind::Number).iter().any(|mw| mw.len == 4));
    assert_eq!(sc.segment_spans(0), vec![(0, 4)]);
    // The chosen numeral marks no border between せん and さん.
    assert!(!sc.is_border(2));
    assert_eq!(sc.best_mw(0), None);
}

#[test]
fn numerals_of_same_magnitude_do_not_combine() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let sc = SplitterContext::new(&engine, "さんいち", Direction::Forward, &mut store);
    assert!(find_kind(&sc, 0, MwKind::Number).is_empty());
    let sc = SplitterContext::new(&engine, "せんせん", Direction::Forward, &mut store);
    assert!(find_kind(&sc, 0, MwKind::Number).is_empty());
}

#[test]
fn numeral_chain_recurses() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let sc = SplitterContext::new(&engine, "まんせんさん", Direction::Forward, &mut store);
    assert!(find_kind(&sc, 2, MwKind::Number).iter().any(|mw| mw.len == 4));
    // まん joined onto the already combined せんさん.
    let whole: Vec<_> = find_kind(&sc, 0, MwKind::Number)
        .into_iter()
        .filter(|mw| mw.len == 6)
        .collect();
    assert!(!whole.is_empty());
    assert!(whole.iter().all(|mw| mw.mw2.is_some()));
}

#[test]
fn verb_renyou_combinations() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let sc = SplitterContext::new(&engine, "かきやすい", Direction::Forward, &mut store);
    let combined = find_kind(&sc, 0, MwKind::VRenyouA);
    assert!(combined.iter().any(|mw| mw.len == 5));
    assert_eq!(combined[0].kind.status(), MwStatus::Combined);

    let sc = SplitterContext::new(&engine, "かきかた", Direction::Forward, &mut store);
    assert!(find_kind(&sc, 0, MwKind::VRenyouNoun)
        .iter()
        .any(|mw| mw.len == 4 && mw.score >= 100));
}

#[test]
fn expanded_span_spawns_dummy() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    store.update_row(EXPANDPAIR, "きょう", |row| row.push_text("きょうは"));
    let sc = SplitterContext::new(&engine, "きょうは", Direction::Forward, &mut store);

    let best3 = sc
        .metawords_at(0)
        .iter()
        .map(|&id| sc.metaword(id))
        .filter(|mw| mw.len == 3 && mw.kind != MwKind::Dummy)
        .map(|mw| mw.score)
        .max()
        .unwrap();
    let dummy = find_kind(&sc, 0, MwKind::Dummy);
    assert_eq!(dummy.len(), 1);
    assert_eq!(dummy[0].len, 4);
    assert_eq!(dummy[0].score, 4 * best3);
    assert_eq!(dummy[0].seg_class, SegClass::MEISHI_KAKUJOSHI);
}

#[test]
fn learned_phrase_is_replayed() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    store.update_row(OCHAIRE, "きょうはてんき", |row| {
        row.set_int(0, 2);
        row.set_int(1, 4);
        row.set_text(2, "京は");
        row.set_int(3, 3);
        row.set_text(4, "転機");
    });
    let before = store.row(OCHAIRE, "きょうはてんき").unwrap().last_used();
    let sc = make_test_context(&engine, "きょうはてんき", &mut store);
    assert!(store.row(OCHAIRE, "きょうはてんき").unwrap().last_used() > before);

    let head = find_kind(&sc, 0, MwKind::Ochaire);
    assert_eq!(head.len(), 1);
    assert_eq!(head[0].hint, "京は");
    let next = sc.metaword(head[0].mw1.unwrap());
    assert_eq!((next.from, next.len, next.hint.as_str()), (4, 3, "転機"));
    assert_eq!(sc.segment_spans(0), vec![(0, 4), (4, 3)]);
}

#[test]
fn corrupt_phrase_row_is_ignored() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    store.update_row(OCHAIRE, "きょうは", |row| {
        row.set_int(0, 2);
        row.set_int(1, 4);
        row.set_text(2, "今日は");
    });
    let sc = SplitterContext::new(&engine, "きょうは", Direction::Forward, &mut store);
    assert!(find_kind(&sc, 0, MwKind::Ochaire).is_empty());
}

#[test]
fn trailing_symbols_are_wrapped() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let sc = SplitterContext::new(&engine, "きょう、", Direction::Forward, &mut store);
    let wraps = find_kind(&sc, 0, MwKind::Wrap);
    let wrap = wraps.iter().find(|mw| mw.len == 4).unwrap();
    let inner = sc.metaword(wrap.mw1.unwrap());
    assert_eq!(inner.len, 3);
    assert_eq!(wrap.score, inner.score);
    assert_eq!(wrap.seg_class, inner.seg_class);
    assert_eq!(wrap.weak_len, inner.weak_len + 1);

    let sc = SplitterContext::new(&engine, "きょう、。", Direction::Forward, &mut store);
    let wraps = find_kind(&sc, 0, MwKind::Wrap);
    let mixed = wraps.iter().find(|mw| mw.len == 5).unwrap();
    assert_eq!(mixed.seg_class, SegClass::DOKURITSUGO);
}

#[test]
fn leading_symbols_get_a_single() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let sc = make_test_context(&engine, "、、", &mut store);
    let singles = find_kind(&sc, 0, MwKind::Single);
    assert!(singles.iter().any(|mw| mw.len == 2 && mw.score == 1));
    assert_eq!(sc.segment_spans(0), vec![(0, 2)]);
}

#[test]
fn single_characters_are_penalized() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let sc = SplitterContext::new(&engine, "に", Direction::Forward, &mut store);
    let number = sc
        .metawords_at(0)
        .iter()
        .map(|&id| sc.metaword(id))
        .find(|mw| mw.kind == MwKind::Single && !mw.seg_class.is_depword())
        .unwrap();
    assert!(number.score <= 100);
    let particle = sc
        .metawords_at(0)
        .iter()
        .map(|&id| sc.metaword(id))
        .find(|mw| mw.seg_class.is_depword())
        .unwrap();
    assert!(particle.score >= 1000);
}

#[test]
fn forced_border_rejects_straddling_metawords() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let mut sc = make_test_context(&engine, "きょうはてんき", &mut store);
    sc.set_border(4, false);
    sc.set_border(3, true);
    sc.mark_border(&engine, 0, 3, 7);

    let long = sc
        .metawords_at(0)
        .iter()
        .map(|&id| sc.metaword(id))
        .find(|mw| mw.len == 4 && mw.kind == MwKind::Single)
        .unwrap();
    assert_eq!(long.can_use, CanUse::Ng);
    assert_eq!(sc.segment_spans(0)[0], (0, 3));
    assert_eq!(sc.metaword_array(0, 3).len(), 1);
}

#[test]
fn metaword_array_shortens_to_fit() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let sc = make_test_context(&engine, "きょうはてんき", &mut store);
    // Nothing covers five characters; the longest usable span wins.
    let ids = sc.metaword_array(0, 5);
    assert!(!ids.is_empty());
    assert!(ids.iter().all(|&id| sc.metaword(id).len == 4));
}

#[test]
fn structure_sort_is_descending() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let mut sc = make_test_context(&engine, "きょうは", &mut store);
    let mut ids = sc.metaword_array(0, 4);
    sc.sort_by_structure(&engine, &mut ids, SegClass::HEAD);
    let scores: Vec<i64> = ids.iter().map(|&id| sc.metaword(id).struct_score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    // cand row for this shape: p = 9 / 10, squared.
    let expected = (65536.0 * (0.1 + 0.81)) as i64;
    assert!(scores.contains(&expected));
}

#[test]
fn reverse_lookup_segments_literals() {
    let engine = make_test_engine();
    let mut store = RecordStore::new();
    let mut sc = SplitterContext::new(&engine, "天気", Direction::Reverse, &mut store);
    sc.mark_border(&engine, 0, 0, 2);
    assert_eq!(sc.direction(), Direction::Reverse);
    assert_eq!(sc.segment_spans(0), vec![(0, 2)]);
    assert!(!sc.metawords_at(0).is_empty());
}

proptest! {
    #[test]
    fn spans_partition_input(text in "[きょうはてんきのやまかわにさんじゅう、]{1,10}") {
        let engine = make_test_engine();
        let mut store = RecordStore::new();
        let sc = make_test_context(&engine, &text, &mut store);
        let spans = sc.segment_spans(0);
        let mut at = 0;
        for (from, len) in spans {
            prop_assert_eq!(from, at);
            prop_assert!(len > 0);
            at += len;
        }
        prop_assert_eq!(at, sc.len());
    }
}

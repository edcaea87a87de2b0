//! End-to-end conversions against the fixture dictionary.

use super::*;
use henkan_core::record::EXPANDPAIR;
use henkan_core::splitter::MwKind;

#[test]
fn noun_and_particle_stay_together() {
    let mut ctx = make_test_context();
    ctx.set_string("きょうは");
    assert_eq!(spans(&ctx), ["きょうは"]);
    assert_eq!(top_texts(&ctx), ["今日は"]);
}

#[test]
fn repeated_choice_becomes_first() {
    let mut ctx = make_test_context();
    ctx.set_string("たなはた");
    assert_eq!(top_texts(&ctx), ["七夕"]);
    assert_eq!(ctx.candidates(0).unwrap()[1].text, "棚機");
    assert!(ctx.select(0, 1));
    assert_eq!(ctx.commit().unwrap(), "棚機");

    for _ in 1..10 {
        ctx.set_string("たなはた");
        let rank = ctx
            .candidates(0)
            .unwrap()
            .iter()
            .position(|c| c.text == "棚機")
            .unwrap();
        // Once chosen it never falls below its original rank.
        assert!(rank <= 1);
        assert!(ctx.select(0, rank));
        assert_eq!(ctx.commit().unwrap(), "棚機");
    }
    ctx.set_string("たなはた");
    assert_eq!(top_texts(&ctx), ["棚機"]);
}

#[test]
fn fullwidth_digits_fall_back_to_renderings() {
    let mut ctx = make_test_context();
    ctx.set_string("１２３４");
    let cands = ctx.candidates(0).unwrap();
    let uncertain = cands.iter().filter(|c| c.score >= 900_000).count();
    assert!(uncertain >= 2, "{cands:?}");
}

#[test]
fn expanded_segment_is_replayed() {
    let store = make_test_store();
    let mut ctx = ConversionContext::new(make_test_engine(), store.clone());
    ctx.set_string("たなばた");
    assert_eq!(spans(&ctx), ["たな", "ばた"]);

    assert!(ctx.resize_segment(0, 2));
    assert_eq!(spans(&ctx), ["たなばた"]);
    assert!(ctx.select_text(0, "七夕"));
    ctx.commit().unwrap();
    {
        let store = store.read().unwrap();
        let row = store.row(EXPANDPAIR, "たな").unwrap();
        assert!(row.texts().any(|t| t == "たなばた"));
    }

    ctx.set_string("たなばた");
    let sc = ctx.splitter().unwrap();
    let at_head: Vec<_> = sc.metawords_at(0).iter().map(|&id| sc.metaword(id)).collect();
    let dummy = at_head
        .iter()
        .find(|mw| mw.kind == MwKind::Dummy && mw.len == 4)
        .expect("dummy metaword for the expanded span");
    let short_best = at_head
        .iter()
        .filter(|mw| mw.len == 2 && mw.kind != MwKind::Dummy)
        .map(|mw| mw.score)
        .max()
        .unwrap_or(0);
    assert!(dummy.score >= short_best);
}

#[test]
fn committed_literal_never_drops() {
    let engine = make_test_engine();
    let mut probe = ConversionContext::new(engine.clone(), make_test_store());
    probe.set_string("はし");
    let worded: Vec<(usize, String)> = probe
        .candidates(0)
        .unwrap()
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, c)| c.core_word().is_some())
        .map(|(k, c)| (k, c.text.clone()))
        .collect();
    assert!(!worded.is_empty());

    for (before, literal) in worded {
        let mut ctx = ConversionContext::new(engine.clone(), make_test_store());
        ctx.set_string("はし");
        assert!(ctx.select(0, before));
        ctx.commit().unwrap();
        ctx.set_string("はし");
        let after = ctx
            .candidates(0)
            .unwrap()
            .iter()
            .position(|c| c.text == literal)
            .unwrap();
        assert!(after <= before, "{literal}: {before} -> {after}");
    }
}

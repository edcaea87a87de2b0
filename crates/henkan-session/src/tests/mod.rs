mod proptest_resize;
mod scenarios;

use std::sync::{Arc, RwLock};

use henkan_core::dict::parse_dictionary_text;
use henkan_core::feature::parse_feature_text;
use henkan_core::grammar::parse_grammar_text;
use henkan_core::record::RecordStore;
use henkan_core::Engine;

use super::ConversionContext;

const DICT_TEXT: &str = include_str!("../../../henkan-core/testdata/dict.txt");
const GRAMMAR_TEXT: &str = include_str!("../../../henkan-core/testdata/grammar.txt");
const FEATURE_TEXT: &str = include_str!("../../../henkan-core/testdata/features.txt");

pub(super) fn make_test_engine() -> Arc<Engine> {
    let dict = parse_dictionary_text(DICT_TEXT).unwrap();
    let grammar = parse_grammar_text(GRAMMAR_TEXT).unwrap();
    let model = parse_feature_text(FEATURE_TEXT).unwrap();
    Arc::new(Engine::new(Arc::new(dict), grammar, model))
}

pub(super) fn make_test_store() -> Arc<RwLock<RecordStore>> {
    Arc::new(RwLock::new(RecordStore::new()))
}

pub(super) fn make_test_context() -> ConversionContext {
    ConversionContext::new(make_test_engine(), make_test_store())
}

/// Segment texts of the current conversion.
pub(super) fn spans(ctx: &ConversionContext) -> Vec<String> {
    ctx.segments().iter().map(|s| s.text.clone()).collect()
}

pub(super) fn top_texts(ctx: &ConversionContext) -> Vec<String> {
    ctx.segments()
        .iter()
        .map(|s| s.candidates[0].text.clone())
        .collect()
}

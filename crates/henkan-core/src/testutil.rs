//! Fixture loaders shared by the unit tests.

use std::sync::Arc;

use crate::dict::{parse_dictionary_text, MemoryDictionary};
use crate::engine::Engine;
use crate::feature::{parse_feature_text, FeatureModel};
use crate::grammar::{parse_grammar_text, Grammar};

pub(crate) const DICT_TEXT: &str = include_str!("../testdata/dict.txt");
pub(crate) const GRAMMAR_TEXT: &str = include_str!("../testdata/grammar.txt");
pub(crate) const FEATURE_TEXT: &str = include_str!("../testdata/features.txt");

pub(crate) fn make_test_dict() -> MemoryDictionary {
    parse_dictionary_text(DICT_TEXT).unwrap()
}

pub(crate) fn make_test_grammar() -> Grammar {
    parse_grammar_text(GRAMMAR_TEXT).unwrap()
}

pub(crate) fn make_test_model() -> FeatureModel {
    parse_feature_text(FEATURE_TEXT).unwrap()
}

pub(crate) fn make_test_engine() -> Engine {
    Engine::new(
        Arc::new(make_test_dict()),
        make_test_grammar(),
        make_test_model(),
    )
}

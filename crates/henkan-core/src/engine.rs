//! Shared, immutable conversion resources.
//!
//! An [`Engine`] bundles everything a conversion reads but never writes:
//! the dictionary, the dependent-word grammar, the feature model and the
//! optional example corpus. It is built once and shared (behind an `Arc`)
//! by every conversion context; per-user learning lives in the
//! [`RecordStore`](crate::record::RecordStore) instead.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::dict::{CorpusIndex, DictError, Dictionary, MemoryDictionary};
use crate::feature::FeatureModel;
use crate::grammar::Grammar;

pub struct Engine {
    dict: Arc<dyn Dictionary>,
    grammar: Grammar,
    model: FeatureModel,
    corpus: Option<CorpusIndex>,
}

impl Engine {
    pub fn new(dict: Arc<dyn Dictionary>, grammar: Grammar, model: FeatureModel) -> Self {
        Engine {
            dict,
            grammar,
            model,
            corpus: None,
        }
    }

    pub fn with_corpus(mut self, corpus: CorpusIndex) -> Self {
        self.corpus = Some(corpus);
        self
    }

    /// Load a compiled dictionary, a grammar source and a compiled feature model.
    pub fn open(dict: &Path, grammar: &Path, model: &Path) -> Result<Self, DictError> {
        let dictionary = MemoryDictionary::open(dict)?;
        let (readings, entries, compounds) = dictionary.stats();
        debug!(readings, entries, compounds, "dictionary loaded");
        let grammar = Grammar::open(grammar)?;
        let model = FeatureModel::open(model)?;
        Ok(Engine::new(Arc::new(dictionary), grammar, model))
    }

    pub fn dict(&self) -> &dyn Dictionary {
        self.dict.as_ref()
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn model(&self) -> &FeatureModel {
        &self.model
    }

    pub fn corpus(&self) -> Option<&CorpusIndex> {
        self.corpus.as_ref()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("rules", &self.grammar.rules.len())
            .field("nodes", &self.grammar.graph.len())
            .field("trans_rows", &self.model.trans.len())
            .field("cand_rows", &self.model.cand.len())
            .field("corpus", &self.corpus.as_ref().map(|c| c.len()))
            .finish()
    }
}

pub mod config_ops;
pub mod convert_ops;
pub mod dict_ops;
pub mod record_ops;

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use henkan_core::dict::{parse_dictionary_text, CorpusIndex, MemoryDictionary};
use henkan_core::feature::{parse_feature_text, FeatureModel};
use henkan_core::grammar::Grammar;
use henkan_core::Engine;

use crate::error::{CliError, Context};

const DICT_MAGIC: &[u8; 4] = b"HKDX";
const MODEL_MAGIC: &[u8; 4] = b"HKFM";
const CORPUS_MAGIC: &[u8; 4] = b"HKCP";

/// Paths of the resources a conversion needs. Dictionary, model and
/// corpus may each be compiled or in their text source form.
pub struct EnginePaths<'a> {
    pub dict: &'a str,
    pub grammar: &'a str,
    pub model: &'a str,
    pub corpus: Option<&'a str>,
}

fn has_magic(path: &Path, magic: &[u8; 4]) -> Result<bool, CliError> {
    let mut head = [0u8; 4];
    let mut file = File::open(path)?;
    Ok(file.read(&mut head)? == 4 && &head == magic)
}

pub fn load_engine(paths: &EnginePaths<'_>) -> Result<Engine, CliError> {
    let dict_path = Path::new(paths.dict);
    let dict = if has_magic(dict_path, DICT_MAGIC)? {
        MemoryDictionary::open(dict_path)
    } else {
        parse_dictionary_text(&fs::read_to_string(dict_path)?)
    }
    .context(format!("Error loading dictionary {}", paths.dict))?;

    let grammar = Grammar::open(Path::new(paths.grammar))
        .context(format!("Error loading grammar {}", paths.grammar))?;

    let model_path = Path::new(paths.model);
    let model = if has_magic(model_path, MODEL_MAGIC)? {
        FeatureModel::open(model_path)
    } else {
        parse_feature_text(&fs::read_to_string(model_path)?)
    }
    .context(format!("Error loading feature model {}", paths.model))?;

    let mut engine = Engine::new(Arc::new(dict), grammar, model);
    if let Some(corpus) = paths.corpus {
        let corpus_path = Path::new(corpus);
        let index = if has_magic(corpus_path, CORPUS_MAGIC)? {
            CorpusIndex::open(corpus_path)
        } else {
            CorpusIndex::parse_text(&fs::read_to_string(corpus_path)?)
        }
        .context(format!("Error loading corpus {corpus}"))?;
        engine = engine.with_corpus(index);
    }
    Ok(engine)
}

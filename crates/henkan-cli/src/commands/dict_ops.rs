use std::fs;
use std::path::Path;

use henkan_core::dict::{parse_dictionary_text, CorpusIndex};
use henkan_core::feature::parse_feature_text;

use crate::error::{CliError, Context};

/// Text sources `compile-dict` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    /// Dictionary source (`word`, `compound`, `weak`, `relation` lines)
    Dict,
    /// Feature tables (`[trans]` and `[cand]`)
    Model,
    /// Example sentences of `reading=literal` words
    Corpus,
}

pub fn compile(kind: SourceKind, input: &str, output: &str) -> Result<(), CliError> {
    let text = fs::read_to_string(input)?;
    let out = Path::new(output);
    match kind {
        SourceKind::Dict => {
            let dict = parse_dictionary_text(&text).context(format!("Error parsing {input}"))?;
            let (readings, entries, compounds) = dict.stats();
            eprintln!("{readings} readings, {entries} entries, {compounds} compounds");
            dict.save(out).context(format!("Error writing {output}"))?;
        }
        SourceKind::Model => {
            let model = parse_feature_text(&text).context(format!("Error parsing {input}"))?;
            eprintln!(
                "{} transition rows, {} candidate rows",
                model.trans.len(),
                model.cand.len()
            );
            model.save(out).context(format!("Error writing {output}"))?;
        }
        SourceKind::Corpus => {
            let index = CorpusIndex::parse_text(&text).context(format!("Error parsing {input}"))?;
            eprintln!("{} words, {} hash collisions", index.len(), index.collisions());
            index.save(out).context(format!("Error writing {output}"))?;
        }
    }
    eprintln!("Wrote {output}");
    Ok(())
}

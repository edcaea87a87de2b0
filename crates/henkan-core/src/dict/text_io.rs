//! Line-oriented dictionary source format.
//!
//! ```text
//! # comment
//! word      きょう  今日  noun          500
//! compound  たなはた  たな=七/はた=夕  noun  120
//! weak      は
//! relation  きょう=今日  てんき=天気
//! ```

use tracing::warn;

use super::{word_id, CompoundEntry, CompoundSegment, DictError, Dictionary, MemoryDictionary};
use crate::pos::WordType;

pub fn parse_dictionary_text(text: &str) -> Result<MemoryDictionary, DictError> {
    let mut dict = MemoryDictionary::new();
    let mut relation_words = Vec::new();
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let err = |msg: &str| DictError::Parse(format!("line {}: {msg}: {line}", lineno + 1));
        match fields.as_slice() {
            ["word", reading, surface, wtype, freq] => {
                let wtype: WordType = wtype.parse().map_err(|e| err(&format!("{e}")))?;
                let freq: i32 = freq.parse().map_err(|_| err("invalid frequency"))?;
                dict.insert_word(reading, surface, wtype, freq);
            }
            ["compound", reading, segs, wtype, freq] => {
                let wtype: WordType = wtype.parse().map_err(|e| err(&format!("{e}")))?;
                let freq: i32 = freq.parse().map_err(|_| err("invalid frequency"))?;
                let mut segments = Vec::new();
                let mut joined = String::new();
                for seg in segs.split('/') {
                    let (seg_reading, surface) =
                        seg.split_once('=').ok_or_else(|| err("segment needs reading=literal"))?;
                    joined.push_str(seg_reading);
                    segments.push(CompoundSegment {
                        len: seg_reading.chars().count(),
                        surface: surface.to_string(),
                    });
                }
                if joined != *reading || segments.iter().any(|s| s.len == 0) {
                    return Err(err("segment readings must spell the reading"));
                }
                dict.insert_compound(
                    reading,
                    CompoundEntry {
                        segments,
                        wtype,
                        freq,
                    },
                );
            }
            ["weak", reading] => dict.mark_weak(reading),
            ["relation", from, to] => {
                let (fr, fs) = from.split_once('=').ok_or_else(|| err("expected reading=literal"))?;
                let (tr, ts) = to.split_once('=').ok_or_else(|| err("expected reading=literal"))?;
                dict.add_relation(word_id(fr, fs), word_id(tr, ts));
                relation_words.push((lineno + 1, fr, fs));
                relation_words.push((lineno + 1, tr, ts));
            }
            _ => return Err(err("unrecognized line")),
        }
    }

    // Kept anyway: the relation just never fires.
    for (line, reading, surface) in relation_words {
        let known = dict
            .lookup(reading)
            .is_some_and(|se| se.entries.iter().any(|e| e.surface == surface));
        if !known {
            warn!(line, reading, surface, "relation names a word not in the dictionary");
        }
    }
    Ok(dict)
}

use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use henkan_core::candidates::{CandFlags, Candidate};
use henkan_core::record::RecordStore;
use henkan_core::Segment;
use henkan_session::ConversionContext;

use super::{load_engine, EnginePaths};
use crate::error::{CliError, Context};

pub struct ConvertOptions<'a> {
    pub paths: EnginePaths<'a>,
    pub reading: &'a str,
    /// Learning store to read (and, with `commit`, update).
    pub record: Option<&'a str>,
    /// Candidates shown per segment.
    pub n: usize,
    pub reverse: bool,
    pub commit: bool,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ConvertReport {
    input: String,
    segments: Vec<SegmentReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    committed: Option<String>,
}

#[derive(Debug, Serialize)]
struct SegmentReport {
    reading: String,
    from: usize,
    len: usize,
    candidates: Vec<CandidateReport>,
}

#[derive(Debug, Serialize)]
struct CandidateReport {
    text: String,
    score: i64,
    flags: Vec<&'static str>,
}

static FLAG_NAMES: &[(CandFlags, &str)] = &[
    (CandFlags::OCHAIRE, "ochaire"),
    (CandFlags::SINGLEWORD, "singleword"),
    (CandFlags::HIRAGANA, "hiragana"),
    (CandFlags::KATAKANA, "katakana"),
    (CandFlags::GUESS, "guess"),
    (CandFlags::COMPOUND, "compound"),
    (CandFlags::COMPOUND_PART, "compound_part"),
    (CandFlags::BEST, "best"),
    (CandFlags::USEDICT, "usedict"),
    (CandFlags::CORPUS, "corpus"),
    (CandFlags::WIDTH, "width"),
    (CandFlags::NUMERAL, "numeral"),
];

fn flag_names(flags: CandFlags) -> Vec<&'static str> {
    FLAG_NAMES
        .iter()
        .filter(|(f, _)| flags.contains(*f))
        .map(|&(_, name)| name)
        .collect()
}

fn candidate_report(cand: &Candidate) -> CandidateReport {
    CandidateReport {
        text: cand.text.clone(),
        score: cand.score,
        flags: flag_names(cand.flags),
    }
}

fn segment_report(seg: &Segment, n: usize) -> SegmentReport {
    SegmentReport {
        reading: seg.text.clone(),
        from: seg.from,
        len: seg.len,
        candidates: seg.candidates.iter().take(n).map(candidate_report).collect(),
    }
}

pub fn convert(opts: &ConvertOptions<'_>) -> Result<(), CliError> {
    let engine = Arc::new(load_engine(&opts.paths)?);
    let store = match opts.record {
        Some(path) => RecordStore::open(Path::new(path))
            .context(format!("Error opening learning store {path}"))?,
        None => RecordStore::new(),
    };
    let store = Arc::new(RwLock::new(store));

    let mut ctx = ConversionContext::new(engine, store);
    ctx.set_reverse(opts.reverse);
    ctx.set_string(opts.reading);

    let mut report = ConvertReport {
        input: opts.reading.to_string(),
        segments: ctx
            .segments()
            .iter()
            .map(|seg| segment_report(seg, opts.n))
            .collect(),
        committed: None,
    };
    if opts.commit {
        let text = ctx.commit().context("Error saving learning store")?;
        report.committed = Some(text);
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_plain(&report);
    }
    Ok(())
}

fn print_plain(report: &ConvertReport) {
    let top: Vec<&str> = report
        .segments
        .iter()
        .map(|s| s.candidates.first().map_or(s.reading.as_str(), |c| c.text.as_str()))
        .collect();
    println!("{}", top.join(" | "));

    let width = report
        .segments
        .iter()
        .map(|s| s.reading.width())
        .max()
        .unwrap_or(0);
    for seg in &report.segments {
        let pad = " ".repeat(width - seg.reading.width());
        let cands: Vec<String> = seg
            .candidates
            .iter()
            .map(|c| format!("{}({})", c.text, c.score))
            .collect();
        println!("  {}{pad}  {}", seg.reading, cands.join(" "));
    }
    if let Some(text) = &report.committed {
        println!("committed: {text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_by_name() {
        assert_eq!(
            flag_names(CandFlags::HIRAGANA | CandFlags::KATAKANA),
            ["hiragana", "katakana"]
        );
        assert!(flag_names(CandFlags::NONE).is_empty());
    }
}

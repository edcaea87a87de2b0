//! Symbolic text form of the feature model.
//!
//! ```text
//! [trans]
//! cur:MEISHI,trans:HEAD>MEISHI         2 40
//! cur:MEISHI_KAKUJOSHI,dc:kakujoshi,dw:17   1 25
//! [cand]
//! cur:MEISHI,suffix                    3 9
//! ```
//!
//! Each row is a comma-separated feature list followed by the negative and
//! positive counts. `#N` writes a raw feature id and `dw:"から"` names a
//! dependent word by its text instead of its hash.

use super::{
    cos_index, dep_word_hash, FeatureFreq, FeatureList, FeatureModel, CLASS_TRANS_BASE, COS_BASE,
    CUR_CLASS_BASE, DEP_TYPE_BASE, DEP_WORD_BASE, FEATURE_CORE1, FEATURE_HIGH_FREQ, FEATURE_NUM,
    FEATURE_SUFFIX, FEATURE_SV, FEATURE_WEAK, FEATURE_WEAK_SEQ, WORD_HASH_MAX,
};
use tracing::warn;

use crate::dict::DictError;
use crate::pos::{Cos, DepClass, SegClass, SEG_SIZE};

const FLAG_NAMES: [(u32, &str); 7] = [
    (FEATURE_SV, "sv"),
    (FEATURE_WEAK, "weak"),
    (FEATURE_SUFFIX, "suffix"),
    (FEATURE_NUM, "num"),
    (FEATURE_CORE1, "core1"),
    (FEATURE_HIGH_FREQ, "high_freq"),
    (FEATURE_WEAK_SEQ, "weak_seq"),
];

pub fn parse_feature_text(text: &str) -> Result<FeatureModel, DictError> {
    let mut model = FeatureModel::default();
    let mut in_cand = None;
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let err = |msg: &str| DictError::Parse(format!("line {}: {msg}: {line}", lineno + 1));
        match line {
            "[trans]" => {
                in_cand = Some(false);
                continue;
            }
            "[cand]" => {
                in_cand = Some(true);
                continue;
            }
            _ => {}
        }
        let cand = in_cand.ok_or_else(|| err("row outside of a section"))?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [features, neg, pos] = fields.as_slice() else {
            return Err(err("expected `features neg pos`"));
        };
        let freq = FeatureFreq {
            neg: neg.parse().map_err(|_| err("invalid negative count"))?,
            pos: pos.parse().map_err(|_| err("invalid positive count"))?,
        };
        let mut fl = FeatureList::new();
        let mut unknown = None;
        for name in features.split(',') {
            match parse_feature(name) {
                Some(id) => fl.add(id),
                None => unknown = Some(name),
            }
        }
        // A row naming a class or word this build does not know can never match.
        if let Some(name) = unknown {
            warn!(line = lineno + 1, feature = name, "skipping row with unknown feature");
            continue;
        }
        if cand {
            model.cand.insert(&fl, freq);
        } else {
            model.trans.insert(&fl, freq);
        }
    }
    Ok(model)
}

fn parse_feature(name: &str) -> Option<u32> {
    if let Some(raw) = name.strip_prefix('#') {
        return raw.parse().ok();
    }
    if let Some(class) = name.strip_prefix("cur:") {
        return Some(CUR_CLASS_BASE + SegClass::from_name(class)?.index() as u32);
    }
    if let Some(pair) = name.strip_prefix("trans:") {
        let (prev, cur) = pair.split_once('>')?;
        let prev = SegClass::from_name(prev)?.index();
        let cur = SegClass::from_name(cur)?.index();
        return Some(CLASS_TRANS_BASE + (prev * SEG_SIZE + cur) as u32);
    }
    if let Some(dc) = name.strip_prefix("dc:") {
        return Some(DEP_TYPE_BASE + DepClass::from_name(dc)?.index());
    }
    if let Some(word) = name.strip_prefix("dw:") {
        // Either a raw hash or the quoted dependent-word text.
        if let Some(text) = word.strip_prefix('"').and_then(|w| w.strip_suffix('"')) {
            return Some(DEP_WORD_BASE + dep_word_hash(text));
        }
        let hash: u32 = word.parse().ok()?;
        return (hash < WORD_HASH_MAX).then_some(DEP_WORD_BASE + hash);
    }
    if let Some(cos) = name.strip_prefix("cos:") {
        return Some(COS_BASE + cos_index(Cos::from_name(cos)?));
    }
    FLAG_NAMES.iter().find(|(_, n)| *n == name).map(|(id, _)| *id)
}

/// Symbolic name of a feature id, `#N` when it has none.
pub fn format_feature(id: u32) -> String {
    let seg = SEG_SIZE as u32;
    if id < CUR_CLASS_BASE + seg {
        return format!("cur:{}", SegClass::ALL[(id - CUR_CLASS_BASE) as usize]);
    }
    if (DEP_TYPE_BASE..DEP_TYPE_BASE + DepClass::ALL.len() as u32).contains(&id) {
        return format!("dc:{}", DepClass::ALL[(id - DEP_TYPE_BASE) as usize].name());
    }
    if (CLASS_TRANS_BASE..CLASS_TRANS_BASE + seg * seg).contains(&id) {
        let n = id - CLASS_TRANS_BASE;
        return format!(
            "trans:{}>{}",
            SegClass::ALL[(n / seg) as usize],
            SegClass::ALL[(n % seg) as usize]
        );
    }
    if (COS_BASE..COS_BASE + Cos::ALL.len() as u32).contains(&id) {
        return format!("cos:{}", Cos::ALL[(id - COS_BASE) as usize]);
    }
    if (DEP_WORD_BASE..DEP_WORD_BASE + WORD_HASH_MAX).contains(&id) {
        return format!("dw:{}", id - DEP_WORD_BASE);
    }
    match FLAG_NAMES.iter().find(|(fid, _)| *fid == id) {
        Some((_, name)) => name.to_string(),
        None => format!("#{id}"),
    }
}

impl FeatureModel {
    /// Render the model in the text form accepted by [`parse_feature_text`].
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (header, table) in [("[trans]", &self.trans), ("[cand]", &self.cand)] {
            out.push_str(header);
            out.push('\n');
            for (key, freq) in table.iter_sorted() {
                let names: Vec<String> = key.iter().map(|id| format_feature(*id)).collect();
                out.push_str(&format!("{} {} {}\n", names.join(","), freq.neg, freq.pos));
            }
        }
        out
    }
}

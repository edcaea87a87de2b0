//! Feature lists and the probability model they index.
//!
//! Every transition in the lattice and every candidate structure is
//! described by a small sorted list of integer features. The model maps a
//! feature list to `(negative, positive)` observation counts, from which
//! the transition and candidate probabilities are derived.

mod text_io;

pub use text_io::{format_feature, parse_feature_text};

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dict::{check_header, write_header, DictError};
use crate::pos::{Cos, DepClass, Pos, SegClass, WordType, SEG_SIZE};

const MAGIC: &[u8; 4] = b"HKFM";
const VERSION: u8 = 1;

/// Maximum number of features in one list; extra features are dropped.
pub const MAX_FEATURES: usize = 14;

pub(crate) const CUR_CLASS_BASE: u32 = 0;
pub(crate) const DEP_TYPE_BASE: u32 = 40;
pub(crate) const CLASS_TRANS_BASE: u32 = 50;
pub(crate) const FEATURE_SV: u32 = 1300;
pub(crate) const FEATURE_WEAK: u32 = 1301;
pub(crate) const FEATURE_SUFFIX: u32 = 1302;
pub(crate) const FEATURE_NUM: u32 = 1304;
pub(crate) const FEATURE_CORE1: u32 = 1305;
pub(crate) const FEATURE_HIGH_FREQ: u32 = 1306;
pub(crate) const FEATURE_WEAK_SEQ: u32 = 1307;
pub(crate) const COS_BASE: u32 = 1330;
pub(crate) const DEP_WORD_BASE: u32 = 1400;
/// Dependent-word hashes are folded into this many buckets.
pub const WORD_HASH_MAX: u32 = 1024;

/// Floor for transition probabilities with no (or only negative) evidence.
pub const MIN_TRANS_PROB: f64 = 1e-6;

/// Structural flags of a word list or metaword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MwFeatures(u32);

impl MwFeatures {
    pub const NONE: MwFeatures = MwFeatures(0);
    /// Noun that takes the suru-verb suffix.
    pub const SV: MwFeatures = MwFeatures(1);
    /// Joined through a weak connection.
    pub const WEAK_CONN: MwFeatures = MwFeatures(1 << 1);
    /// Has a prefix or postfix around the core.
    pub const SUFFIX: MwFeatures = MwFeatures(1 << 2);
    pub const NUM: MwFeatures = MwFeatures(1 << 4);
    /// One-character core.
    pub const CORE1: MwFeatures = MwFeatures(1 << 5);
    /// No core at all.
    pub const DEP_ONLY: MwFeatures = MwFeatures(1 << 6);
    pub const HIGH_FREQ: MwFeatures = MwFeatures(1 << 7);
    /// Reading flagged as a weak word.
    pub const WEAK_SEQ: MwFeatures = MwFeatures(1 << 8);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: MwFeatures) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: MwFeatures) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for MwFeatures {
    type Output = MwFeatures;
    fn bitor(self, rhs: MwFeatures) -> MwFeatures {
        MwFeatures(self.0 | rhs.0)
    }
}

/// A bounded list of feature ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FeatureList {
    ids: Vec<u32>,
}

impl FeatureList {
    pub fn new() -> Self {
        FeatureList {
            ids: Vec::with_capacity(MAX_FEATURES),
        }
    }

    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        let mut fl = FeatureList::new();
        for id in ids {
            fl.add(id);
        }
        fl
    }

    pub fn add(&mut self, id: u32) {
        if self.ids.len() < MAX_FEATURES {
            self.ids.push(id);
        }
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn sort(&mut self) {
        self.ids.sort_unstable();
    }

    pub fn set_cur_class(&mut self, class: SegClass) {
        self.add(CUR_CLASS_BASE + class.index() as u32);
    }

    pub fn set_class_trans(&mut self, prev: SegClass, cur: SegClass) {
        self.add(CLASS_TRANS_BASE + (prev.index() * SEG_SIZE + cur.index()) as u32);
    }

    pub fn set_dep_class(&mut self, dc: DepClass) {
        self.add(DEP_TYPE_BASE + dc.index());
    }

    pub fn set_dep_word(&mut self, hash: u32) {
        self.add(DEP_WORD_BASE + hash % WORD_HASH_MAX);
    }

    /// Only suffix-like nouns carry a sub class feature.
    pub fn set_noun_cos(&mut self, wt: &WordType) {
        if wt.pos == Pos::Noun && wt.cos == Cos::Suffix {
            self.add(COS_BASE + cos_index(wt.cos));
        }
    }

    pub fn set_mw_features(&mut self, mask: MwFeatures) {
        for (flag, id) in [
            (MwFeatures::WEAK_CONN, FEATURE_WEAK),
            (MwFeatures::SUFFIX, FEATURE_SUFFIX),
            (MwFeatures::SV, FEATURE_SV),
            (MwFeatures::NUM, FEATURE_NUM),
            (MwFeatures::CORE1, FEATURE_CORE1),
            (MwFeatures::HIGH_FREQ, FEATURE_HIGH_FREQ),
            (MwFeatures::WEAK_SEQ, FEATURE_WEAK_SEQ),
        ] {
            if mask.contains(flag) {
                self.add(id);
            }
        }
    }

    /// Sorted copy of the ids, the key used by [`FeatureTable`].
    pub fn key(&self) -> Vec<u32> {
        let mut key = self.ids.clone();
        key.sort_unstable();
        key
    }
}

/// Bucket of a dependent-word tail for the `dw:` feature (FNV-1a).
pub fn dep_word_hash(text: &str) -> u32 {
    let mut h: u32 = 0x811c_9dc5;
    for b in text.bytes() {
        h ^= b as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    h % WORD_HASH_MAX
}

pub(crate) fn cos_index(cos: Cos) -> u32 {
    Cos::ALL.iter().position(|c| *c == cos).unwrap_or(0) as u32
}

/// Observation counts of one feature list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureFreq {
    pub neg: u32,
    pub pos: u32,
}

impl FeatureFreq {
    fn total(&self) -> f64 {
        self.neg as f64 + self.pos as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: HashMap<Vec<u32>, FeatureFreq>,
}

impl FeatureTable {
    pub fn insert(&mut self, fl: &FeatureList, freq: FeatureFreq) {
        self.rows.insert(fl.key(), freq);
    }

    pub fn get(&self, fl: &FeatureList) -> Option<FeatureFreq> {
        self.rows.get(&fl.key()).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in key order.
    pub fn iter_sorted(&self) -> Vec<(&[u32], FeatureFreq)> {
        let mut rows: Vec<_> = self
            .rows
            .iter()
            .map(|(k, v)| (k.as_slice(), *v))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }
}

/// Transition and candidate-structure tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureModel {
    pub trans: FeatureTable,
    pub cand: FeatureTable,
}

impl FeatureModel {
    /// Probability that a transition described by `fl` is correct.
    pub fn trans_prob(&self, fl: &FeatureList) -> f64 {
        let Some(freq) = self.trans.get(fl) else {
            return MIN_TRANS_PROB;
        };
        let total = freq.total();
        if total <= 0.0 {
            return MIN_TRANS_PROB;
        }
        let prob = 1.0 - freq.neg as f64 / total;
        if prob <= 0.0 {
            MIN_TRANS_PROB
        } else {
            prob
        }
    }

    /// Squared positive ratio of a candidate structure, or 0 when unseen.
    pub fn cand_prob(&self, fl: &FeatureList) -> f64 {
        match self.cand.get(fl) {
            Some(freq) if freq.total() > 0.0 => {
                let p = freq.pos as f64 / freq.total();
                p * p
            }
            _ => 0.0,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DictError> {
        let payload = bincode::serialize(self).map_err(DictError::Serialize)?;
        Ok(write_header(MAGIC, VERSION, &payload))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DictError> {
        let payload = check_header(data, MAGIC, VERSION)?;
        bincode::deserialize(payload).map_err(DictError::Deserialize)
    }

    pub fn open(path: &Path) -> Result<Self, DictError> {
        Self::from_bytes(&fs::read(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), DictError> {
        Ok(fs::write(path, self.to_bytes()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_model() -> FeatureModel {
        let mut m = FeatureModel::default();
        let mut fl = FeatureList::new();
        fl.set_cur_class(SegClass::MEISHI);
        fl.set_class_trans(SegClass::HEAD, SegClass::MEISHI);
        m.trans.insert(&fl, FeatureFreq { neg: 1, pos: 3 });
        let mut all_neg = FeatureList::new();
        all_neg.set_cur_class(SegClass::DOUSHI);
        m.trans.insert(&all_neg, FeatureFreq { neg: 5, pos: 0 });
        let mut cand = FeatureList::new();
        cand.set_cur_class(SegClass::MEISHI);
        m.cand.insert(&cand, FeatureFreq { neg: 1, pos: 1 });
        m
    }

    #[test]
    fn list_is_bounded() {
        let fl = FeatureList::from_ids(0..100);
        assert_eq!(fl.len(), MAX_FEATURES);
    }

    #[test]
    fn key_is_order_independent() {
        let a = FeatureList::from_ids([5, 1, 3]);
        let b = FeatureList::from_ids([3, 5, 1]);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn feature_ids_do_not_overlap() {
        let last_trans = CLASS_TRANS_BASE + (SEG_SIZE * SEG_SIZE) as u32;
        assert!(CUR_CLASS_BASE + (SEG_SIZE as u32) <= DEP_TYPE_BASE);
        assert!(DEP_TYPE_BASE + DepClass::ALL.len() as u32 <= CLASS_TRANS_BASE);
        assert!(last_trans <= FEATURE_SV);
        assert!(COS_BASE + Cos::ALL.len() as u32 <= DEP_WORD_BASE);
    }

    #[test]
    fn trans_prob() {
        let m = make_test_model();
        let mut fl = FeatureList::new();
        fl.set_class_trans(SegClass::HEAD, SegClass::MEISHI);
        fl.set_cur_class(SegClass::MEISHI);
        assert!((m.trans_prob(&fl) - 0.75).abs() < 1e-9);

        let mut neg = FeatureList::new();
        neg.set_cur_class(SegClass::DOUSHI);
        assert_eq!(m.trans_prob(&neg), MIN_TRANS_PROB);

        let unseen = FeatureList::from_ids([999]);
        assert_eq!(m.trans_prob(&unseen), MIN_TRANS_PROB);
    }

    #[test]
    fn cand_prob() {
        let m = make_test_model();
        let mut fl = FeatureList::new();
        fl.set_cur_class(SegClass::MEISHI);
        assert!((m.cand_prob(&fl) - 0.25).abs() < 1e-9);
        assert_eq!(m.cand_prob(&FeatureList::from_ids([999])), 0.0);
    }

    #[test]
    fn mw_features_map_to_ids() {
        let mut fl = FeatureList::new();
        fl.set_mw_features(MwFeatures::SV | MwFeatures::WEAK_SEQ | MwFeatures::DEP_ONLY);
        assert_eq!(fl.key(), vec![FEATURE_SV, FEATURE_WEAK_SEQ]);
    }

    #[test]
    fn noun_cos_only_for_suffix_nouns() {
        let mut fl = FeatureList::new();
        fl.set_noun_cos(&"noun,jn".parse().unwrap());
        assert!(fl.is_empty());
        fl.set_noun_cos(&"noun,suffix".parse().unwrap());
        assert_eq!(fl.ids(), &[COS_BASE + cos_index(Cos::Suffix)]);
    }

    #[test]
    fn binary_round_trip() {
        let m = make_test_model();
        let bytes = m.to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"HKFM");
        assert_eq!(FeatureModel::from_bytes(&bytes).unwrap(), m);
        assert!(matches!(
            FeatureModel::from_bytes(b"HKDX\x01"),
            Err(DictError::InvalidMagic)
        ));
    }
}

use serde::{Deserialize, Serialize};

use crate::pos::{ConjType, Pos, WordType};

/// One word under a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    pub surface: String,
    pub wtype: WordType,
    pub freq: i32,
    /// Stable word id shared by forward and reverse lookups.
    pub id: u32,
}

/// One sub-segment of a compound: `len` reading characters rendered as `surface`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundSegment {
    pub len: usize,
    pub surface: String,
}

/// A multi-segment idiom stored under the joined reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundEntry {
    pub segments: Vec<CompoundSegment>,
    pub wtype: WordType,
    pub freq: i32,
}

impl CompoundEntry {
    /// Literal of the whole compound.
    pub fn surface(&self) -> String {
        self.segments.iter().map(|s| s.surface.as_str()).collect()
    }

    /// Total reading length in characters.
    pub fn reading_len(&self) -> usize {
        self.segments.iter().map(|s| s.len).sum()
    }
}

/// Everything stored under a single reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeqEntry {
    pub entries: Vec<DictEntry>,
    pub compounds: Vec<CompoundEntry>,
}

impl SeqEntry {
    pub fn has_words(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn has_compounds(&self) -> bool {
        !self.compounds.is_empty()
    }

    /// Summed frequency of entries with the given part of speech; at least 1 when any match.
    pub fn pos_freq(&self, pos: Pos) -> i32 {
        self.sum_matching(|wt| wt.pos == pos)
    }

    /// Like [`pos_freq`](Self::pos_freq) but also requires the conjugation form.
    pub fn pos_ct_freq(&self, pos: Pos, ct: ConjType) -> i32 {
        self.sum_matching(|wt| wt.pos == pos && wt.ct == ct)
    }

    fn sum_matching(&self, pred: impl Fn(&WordType) -> bool) -> i32 {
        let mut v = 0;
        for e in &self.entries {
            if pred(&e.wtype) {
                v += e.freq;
                if v == 0 {
                    v = 1;
                }
            }
        }
        v
    }

    /// Highest frequency among words whose type `wt` includes; at least 1 when any match.
    pub fn wtype_freq(&self, wt: &WordType) -> i32 {
        self.entries
            .iter()
            .filter(|e| wt.includes(&e.wtype))
            .map(|e| e.freq.max(1))
            .fold(0, i32::max)
    }

    /// Highest frequency among compounds whose type `wt` includes.
    pub fn compound_wtype_freq(&self, wt: &WordType) -> i32 {
        self.compounds
            .iter()
            .filter(|c| wt.includes(&c.wtype))
            .map(|c| c.freq.max(1))
            .fold(0, i32::max)
    }

    pub fn has_indep(&self) -> bool {
        self.entries.iter().any(|e| e.wtype.is_indep())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pos::WT_NOUN;

    fn entry(surface: &str, wt: &str, freq: i32) -> DictEntry {
        DictEntry {
            surface: surface.to_string(),
            wtype: wt.parse().unwrap(),
            freq,
            id: 0,
        }
    }

    #[test]
    fn frequency_aggregates() {
        let se = SeqEntry {
            entries: vec![
                entry("今日", "noun", 500),
                entry("京", "noun", 100),
                entry("強", "suc", 0),
            ],
            compounds: vec![],
        };
        assert_eq!(se.pos_freq(Pos::Noun), 600);
        assert_eq!(se.pos_freq(Pos::Suc), 1);
        assert_eq!(se.pos_freq(Pos::V), 0);
        assert_eq!(se.wtype_freq(&WT_NOUN), 500);
        assert!(se.has_indep());
    }

    #[test]
    fn compound_surface() {
        let c = CompoundEntry {
            segments: vec![
                CompoundSegment { len: 2, surface: "七".into() },
                CompoundSegment { len: 2, surface: "夕".into() },
            ],
            wtype: WT_NOUN,
            freq: 10,
        };
        assert_eq!(c.surface(), "七夕");
        assert_eq!(c.reading_len(), 4);
    }
}

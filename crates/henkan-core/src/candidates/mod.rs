//! Candidate generation, scoring and re-ranking for segments.
//!
//! [`make_candidates`] materializes literal candidates for one segment
//! from the metawords offered for it plus the fallbacks every segment
//! gets (single word, hiragana, katakana, width and numeral renderings).
//! [`sort_candidates`] scores them, drops duplicates and applies what the
//! learning store remembers.

mod generate;
mod rerank;
mod score;

pub use generate::make_candidates;
pub use score::sort_candidates;

use crate::pos::WordType;
use crate::splitter::{MwId, PartKind};

/// How a candidate was produced and what has touched its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CandFlags(u32);

impl CandFlags {
    pub const NONE: CandFlags = CandFlags(0);
    /// Replayed from a learned phrase.
    pub const OCHAIRE: CandFlags = CandFlags(1);
    /// Whole segment as one dictionary word.
    pub const SINGLEWORD: CandFlags = CandFlags(1 << 1);
    pub const HIRAGANA: CandFlags = CandFlags(1 << 2);
    pub const KATAKANA: CandFlags = CandFlags(1 << 3);
    /// Katakana stem followed by the trailing particle.
    pub const GUESS: CandFlags = CandFlags(1 << 4);
    pub const COMPOUND: CandFlags = CandFlags(1 << 5);
    pub const COMPOUND_PART: CandFlags = CandFlags(1 << 6);
    /// From the metaword the lattice settled on for this offset.
    pub const BEST: CandFlags = CandFlags(1 << 7);
    /// Boosted by a word relation.
    pub const USEDICT: CandFlags = CandFlags(1 << 8);
    /// Boosted by the example corpus.
    pub const CORPUS: CandFlags = CandFlags(1 << 9);
    /// Half- or full-width rendering.
    pub const WIDTH: CandFlags = CandFlags(1 << 10);
    pub const NUMERAL: CandFlags = CandFlags(1 << 11);

    /// Candidates whose score does not come from their metaword.
    pub const FIXED: CandFlags = CandFlags(
        Self::OCHAIRE.0
            | Self::SINGLEWORD.0
            | Self::HIRAGANA.0
            | Self::KATAKANA.0
            | Self::GUESS.0
            | Self::COMPOUND.0
            | Self::COMPOUND_PART.0
            | Self::BEST.0
            | Self::WIDTH.0
            | Self::NUMERAL.0,
    );

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: CandFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: CandFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: CandFlags) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for CandFlags {
    type Output = CandFlags;
    fn bitor(self, rhs: CandFlags) -> CandFlags {
        CandFlags(self.0 | rhs.0)
    }
}

/// Dictionary word chosen for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct WordChoice {
    pub surface: String,
    pub id: u32,
    pub freq: i32,
}

/// One word slot of a metaword-derived candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandElement {
    pub kind: PartKind,
    /// Input text covered by the element.
    pub reading: String,
    pub wt: WordType,
    /// `None` when the text was kept unconverted.
    pub word: Option<WordChoice>,
}

impl CandElement {
    pub fn reading_len(&self) -> usize {
        self.reading.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub score: i64,
    pub flags: CandFlags,
    pub elements: Vec<CandElement>,
    /// Index of the independent-word element.
    pub core: Option<usize>,
    /// Metaword the candidate was generated for.
    pub mw: Option<MwId>,
    /// Structural score of that metaword.
    pub struct_score: i64,
}

impl Candidate {
    pub(crate) fn fixed(text: impl Into<String>, flags: CandFlags, mw: Option<MwId>) -> Self {
        Candidate {
            text: text.into(),
            score: 0,
            flags,
            elements: Vec::new(),
            core: None,
            mw,
            struct_score: 0,
        }
    }

    pub fn core_element(&self) -> Option<&CandElement> {
        self.elements.get(self.core?)
    }

    /// Converted word of the core element.
    pub fn core_word(&self) -> Option<&WordChoice> {
        self.core_element()?.word.as_ref()
    }

    pub fn core_id(&self) -> Option<u32> {
        self.core_word().map(|w| w.id)
    }
}

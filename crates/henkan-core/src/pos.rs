//! Part-of-speech tags, word types and segment classes.
//!
//! A [`WordType`] is the structured part-of-speech of a dictionary entry
//! or of a word-list part. Matching is one-directional: a pattern type
//! [`includes`](WordType::includes) a concrete type when every field the
//! pattern specifies agrees with the concrete one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_name(s: &str) -> Option<$name> {
                match s {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

named_enum! {
    /// Coarse part of speech.
    Pos {
        None => "none",
        Noun => "noun",
        Prt => "prt",
        Xv => "xv",
        V => "v",
        A => "a",
        Ajv => "ajv",
        Av => "av",
        Me => "me",
        Conj => "conj",
        Ij => "ij",
        Pre => "pre",
        Suc => "suc",
        Tankanji => "tankanji",
        N2t => "n2t",
        D2ky => "d2ky",
        Number => "number",
        Inval => "inval",
        Open => "open",
        Close => "close",
    }
}

named_enum! {
    /// Conjugation form.
    ConjType {
        None => "none",
        Syusi => "syusi",
        Mizen => "mizen",
        Renyou => "renyou",
        Rentai => "rentai",
        Katei => "katei",
        Meirei => "meirei",
        Head => "head",
    }
}

named_enum! {
    /// Conjugation class.
    ConjClass {
        None => "none",
        K5 => "k5",
        C5 => "c5",
        G5 => "g5",
        S5 => "s5",
        T5 => "t5",
        N5 => "n5",
        M5 => "m5",
        B5 => "b5",
        R5 => "r5",
        L5 => "l5",
        W5 => "w5",
        U5 => "u5",
        Ks1 => "ks1",
        Rv => "rv",
        Kv => "kv",
        Sv => "svc",
        Zv => "zv",
        Srv => "srv",
        Ajv => "ajvc",
        AKu => "a_ku",
        ASiku => "a_siku",
    }
}

named_enum! {
    /// Sub class of nouns and suffixes.
    Cos {
        None => "none",
        Cn => "cn",
        Nn => "nn",
        Jn => "jn",
        Kk => "kk",
        Suffix => "suffix",
        SvSuffix => "svsuffix",
    }
}

named_enum! {
    /// Fine class: name kinds, noun-suffix ease and numeral magnitudes.
    Scos {
        None => "none",
        FamName => "famname",
        FstName => "fstname",
        T0 => "t0",
        T5 => "t5",
        T10 => "t10",
        T15 => "t15",
        T20 => "t20",
        T25 => "t25",
        T30 => "t30",
        T35 => "t35",
        T40 => "t40",
        N1 => "n1",
        N10 => "n10",
        N100 => "n100",
        N1000 => "n1000",
        N10000 => "n10000",
    }
}

/// Structured part of speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WordType {
    pub pos: Pos,
    pub cos: Cos,
    pub scos: Scos,
    pub cc: ConjClass,
    pub ct: ConjType,
    pub flags: u8,
}

impl WordType {
    /// Independent word.
    pub const INDEP: u8 = 1;
    /// Takes the suru-verb suffix.
    pub const SV: u8 = 1 << 1;

    pub const fn new(pos: Pos) -> Self {
        WordType {
            pos,
            cos: Cos::None,
            scos: Scos::None,
            cc: ConjClass::None,
            ct: ConjType::None,
            flags: 0,
        }
    }

    pub const fn with_cos(mut self, cos: Cos) -> Self {
        self.cos = cos;
        self
    }

    pub const fn with_scos(mut self, scos: Scos) -> Self {
        self.scos = scos;
        self
    }

    pub const fn with_ct(mut self, ct: ConjType) -> Self {
        self.ct = ct;
        self
    }

    pub const fn with_cc(mut self, cc: ConjClass) -> Self {
        self.cc = cc;
        self
    }

    pub const fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_indep(&self) -> bool {
        self.flags & Self::INDEP != 0
    }

    pub fn is_sv(&self) -> bool {
        self.flags & Self::SV != 0
    }

    /// True when every field set on `self` equals the same field on `other`.
    pub fn includes(&self, other: &WordType) -> bool {
        (self.pos == Pos::None || self.pos == other.pos)
            && (self.cos == Cos::None || self.cos == other.cos)
            && (self.scos == Scos::None || self.scos == other.scos)
            && (self.cc == ConjClass::None || self.cc == other.cc)
            && (self.ct == ConjType::None || self.ct == other.ct)
            && (self.flags & other.flags) == self.flags
    }

    fn default_flags(pos: Pos) -> u8 {
        match pos {
            Pos::None | Pos::Pre | Pos::Suc | Pos::Prt | Pos::Xv | Pos::Inval => 0,
            _ => Self::INDEP,
        }
    }
}

/// Pattern matching any noun.
pub const WT_NOUN: WordType = WordType::new(Pos::Noun);
/// Person-name noun.
pub const WT_NAME_NOUN: WordType = WordType::new(Pos::Noun).with_cos(Cos::Jn);
pub const WT_NUM_NOUN: WordType = WordType::new(Pos::Number);
pub const WT_NUM_PREFIX: WordType = WordType::new(Pos::Pre).with_cos(Cos::Nn);
pub const WT_NUM_POSTFIX: WordType = WordType::new(Pos::Suc).with_cos(Cos::Nn);
pub const WT_NAME_POSTFIX: WordType = WordType::new(Pos::Suc).with_cos(Cos::Jn);
pub const WT_SV_POSTFIX: WordType = WordType::new(Pos::Suc).with_cos(Cos::SvSuffix);
/// Adjective-forming tail attached to a verb's renyou form (〜やすい, 〜にくい).
pub const WT_A_TAIL_OF_V_RENYOU: WordType = WordType::new(Pos::A).with_cos(Cos::Suffix);
/// Noun-forming tail attached to a verb's renyou form (〜方).
pub const WT_N_TAIL_OF_V_RENYOU: WordType = WordType::new(Pos::Noun).with_cos(Cos::Suffix);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWordTypeError(pub String);

impl fmt::Display for ParseWordTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid word type: {}", self.0)
    }
}

impl std::error::Error for ParseWordTypeError {}

/// Text form: `pos[,attr...]`, e.g. `noun,jn`, `v,cc=k5,ct=renyou`,
/// `number,n1000`, `suc,nn,dep`.
impl FromStr for WordType {
    type Err = ParseWordTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut it = s.split(',').map(str::trim);
        let head = it.next().unwrap_or_default();
        let pos = Pos::from_name(head).ok_or_else(|| ParseWordTypeError(s.to_string()))?;
        let mut wt = WordType::new(pos).with_flags(WordType::default_flags(pos));
        for attr in it {
            if let Some(v) = attr.strip_prefix("cc=") {
                wt.cc = ConjClass::from_name(v).ok_or_else(|| ParseWordTypeError(s.to_string()))?;
            } else if let Some(v) = attr.strip_prefix("ct=") {
                wt.ct = ConjType::from_name(v).ok_or_else(|| ParseWordTypeError(s.to_string()))?;
            } else if attr == "indep" {
                wt.flags |= WordType::INDEP;
            } else if attr == "dep" {
                wt.flags &= !WordType::INDEP;
            } else if attr == "sv" {
                wt.flags |= WordType::SV;
            } else if let Some(cos) = Cos::from_name(attr) {
                wt.cos = cos;
            } else if let Some(scos) = Scos::from_name(attr) {
                wt.scos = scos;
            } else {
                return Err(ParseWordTypeError(s.to_string()));
            }
        }
        Ok(wt)
    }
}

impl fmt::Display for WordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pos.name())?;
        if self.cos != Cos::None {
            write!(f, ",{}", self.cos)?;
        }
        if self.scos != Scos::None {
            write!(f, ",{}", self.scos)?;
        }
        if self.cc != ConjClass::None {
            write!(f, ",cc={}", self.cc)?;
        }
        if self.ct != ConjType::None {
            write!(f, ",ct={}", self.ct)?;
        }
        let default = WordType::default_flags(self.pos);
        if self.is_indep() && default == 0 {
            f.write_str(",indep")?;
        } else if !self.is_indep() && default != 0 {
            f.write_str(",dep")?;
        }
        if self.is_sv() {
            f.write_str(",sv")?;
        }
        Ok(())
    }
}

/// Grammatical role of a dependent-word tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepClass {
    #[default]
    None,
    Fuzokugo,
    Kakujoshi,
    Renyou,
    Rentai,
    End,
    Raw,
}

impl DepClass {
    pub const ALL: [DepClass; 7] = [
        DepClass::None,
        DepClass::Fuzokugo,
        DepClass::Kakujoshi,
        DepClass::Renyou,
        DepClass::Rentai,
        DepClass::End,
        DepClass::Raw,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            DepClass::None => "none",
            DepClass::Fuzokugo => "fuzokugo",
            DepClass::Kakujoshi => "kakujoshi",
            DepClass::Renyou => "renyou",
            DepClass::Rentai => "rentai",
            DepClass::End => "end",
            DepClass::Raw => "raw",
        }
    }

    pub fn from_name(s: &str) -> Option<DepClass> {
        DepClass::ALL.into_iter().find(|dc| dc.name() == s)
    }
}

macro_rules! seg_classes {
    ($($variant:ident),+ $(,)?) => {
        /// Segment class: the Viterbi state of the lattice.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[allow(non_camel_case_types)]
        pub enum SegClass {
            #[default]
            $($variant),+
        }

        impl SegClass {
            pub const ALL: &'static [SegClass] = &[$(SegClass::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(SegClass::$variant => stringify!($variant)),+
                }
            }

            pub fn from_name(s: &str) -> Option<SegClass> {
                match s {
                    $(stringify!($variant) => Some(SegClass::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

seg_classes! {
    HEAD,
    TAIL,
    BUNSETSU,
    SETSUZOKUGO,
    DOKURITSUGO,
    RENTAISHI,
    FUKUSHI,
    MEISHI,
    MEISHI_FUZOKUGO,
    MEISHI_KAKUJOSHI,
    MEISHI_SHUTAN,
    MEISHI_RENYOU,
    DOUSHI,
    DOUSHI_FUZOKUGO,
    DOUSHI_SHUTAN,
    DOUSHI_RENYOU,
    DOUSHI_RENTAI,
    KEIYOUSHI,
    KEIYOUSHI_FUZOKUGO,
    KEIYOUSHI_SHUTAN,
    KEIYOUSHI_RENYOU,
    KEIYOUSHI_RENTAI,
    KEIYOUDOUSHI,
    KEIYOUDOUSHI_FUZOKUGO,
    KEIYOUDOUSHI_SHUTAN,
    KEIYOUDOUSHI_RENYOU,
    KEIYOUDOUSHI_RENTAI,
    HIRAKIKAKKO,
    TOJIKAKKO,
    FUZOKUGO,
    KAKUJOSHI,
    RENYOU,
    RENTAI,
    SHUTAN,
}

/// Number of segment classes.
pub const SEG_SIZE: usize = SegClass::ALL.len();

impl SegClass {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Classes of a segment made only of dependent words.
    pub fn is_depword(self) -> bool {
        matches!(
            self,
            SegClass::FUZOKUGO
                | SegClass::KAKUJOSHI
                | SegClass::RENYOU
                | SegClass::RENTAI
                | SegClass::SHUTAN
        )
    }

    /// Derive the class of a word list from its head part of speech and the
    /// class of its dependent tail. `has_core` is false for empty-core lists.
    pub fn classify(has_core: bool, head_pos: Pos, dc: DepClass) -> SegClass {
        use SegClass as S;
        if !has_core {
            return match dc {
                DepClass::Raw => S::FUZOKUGO,
                DepClass::End => S::SHUTAN,
                DepClass::Renyou => S::RENYOU,
                DepClass::Rentai => S::RENTAI,
                DepClass::Kakujoshi => S::KAKUJOSHI,
                _ => S::FUZOKUGO,
            };
        }
        // Variants per head: (raw, end, renyou, rentai, kakujoshi, other).
        let table = match head_pos {
            Pos::Noun | Pos::Number | Pos::N2t => [
                S::MEISHI,
                S::MEISHI_SHUTAN,
                S::MEISHI_RENYOU,
                S::MEISHI_FUZOKUGO,
                S::MEISHI_KAKUJOSHI,
                S::MEISHI_FUZOKUGO,
            ],
            Pos::V => [
                S::DOUSHI,
                S::DOUSHI_SHUTAN,
                S::DOUSHI_RENYOU,
                S::DOUSHI_RENTAI,
                S::DOUSHI_FUZOKUGO,
                S::DOUSHI_FUZOKUGO,
            ],
            Pos::A | Pos::D2ky => [
                S::KEIYOUSHI,
                S::KEIYOUSHI_SHUTAN,
                S::KEIYOUSHI_RENYOU,
                S::KEIYOUSHI_RENTAI,
                S::KEIYOUSHI_FUZOKUGO,
                S::KEIYOUSHI_FUZOKUGO,
            ],
            Pos::Ajv => [
                S::KEIYOUDOUSHI,
                S::KEIYOUDOUSHI_SHUTAN,
                S::KEIYOUDOUSHI_RENYOU,
                S::KEIYOUDOUSHI_RENTAI,
                S::KEIYOUDOUSHI_FUZOKUGO,
                S::KEIYOUDOUSHI_FUZOKUGO,
            ],
            Pos::Av => return S::FUKUSHI,
            Pos::Me => return S::RENTAISHI,
            Pos::Conj => return S::SETSUZOKUGO,
            Pos::Ij => return S::DOKURITSUGO,
            Pos::Open => return S::HIRAKIKAKKO,
            Pos::Close => return S::TOJIKAKKO,
            _ => return S::DOKURITSUGO,
        };
        match dc {
            DepClass::Raw => table[0],
            DepClass::End => table[1],
            DepClass::Renyou => table[2],
            DepClass::Rentai => table[3],
            DepClass::Kakujoshi => table[4],
            _ => table[5],
        }
    }
}

impl fmt::Display for SegClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_word_type() {
        let wt: WordType = "v,cc=k5,ct=renyou".parse().unwrap();
        assert_eq!(wt.pos, Pos::V);
        assert_eq!(wt.cc, ConjClass::K5);
        assert_eq!(wt.ct, ConjType::Renyou);
        assert!(wt.is_indep());

        let suffix: WordType = "suc,nn".parse().unwrap();
        assert!(!suffix.is_indep());
        assert_eq!(suffix.cos, Cos::Nn);

        let num: WordType = "number,n1000".parse().unwrap();
        assert_eq!(num.scos, Scos::N1000);

        assert!("bogus".parse::<WordType>().is_err());
        assert!("noun,what".parse::<WordType>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for text in ["noun,jn", "v,cc=k5,ct=renyou", "suc,nn", "noun,dep", "noun,sv"] {
            let wt: WordType = text.parse().unwrap();
            assert_eq!(wt.to_string(), text);
        }
    }

    #[test]
    fn includes_is_pattern_match() {
        let entry: WordType = "noun,jn,famname".parse().unwrap();
        assert!(WT_NOUN.includes(&entry));
        assert!(WT_NAME_NOUN.includes(&entry));
        assert!(!WT_NUM_NOUN.includes(&entry));
        assert!(!entry.includes(&WT_NOUN));
    }

    #[test]
    fn seg_class_mapping() {
        assert_eq!(SEG_SIZE, 34);
        assert_eq!(SegClass::classify(false, Pos::None, DepClass::Kakujoshi), SegClass::KAKUJOSHI);
        assert_eq!(SegClass::classify(true, Pos::Noun, DepClass::Kakujoshi), SegClass::MEISHI_KAKUJOSHI);
        assert_eq!(SegClass::classify(true, Pos::Noun, DepClass::Rentai), SegClass::MEISHI_FUZOKUGO);
        assert_eq!(SegClass::classify(true, Pos::V, DepClass::Rentai), SegClass::DOUSHI_RENTAI);
        assert_eq!(SegClass::classify(true, Pos::D2ky, DepClass::Raw), SegClass::KEIYOUSHI);
        assert_eq!(SegClass::classify(true, Pos::Me, DepClass::Raw), SegClass::RENTAISHI);
        assert_eq!(SegClass::classify(true, Pos::Tankanji, DepClass::Raw), SegClass::DOKURITSUGO);
        assert!(SegClass::SHUTAN.is_depword());
        assert!(!SegClass::MEISHI.is_depword());
        assert_eq!(SegClass::from_name("DOUSHI_RENYOU"), Some(SegClass::DOUSHI_RENYOU));
    }
}

//! Character-level Unicode classification for Japanese text.
//!
//! Besides the plain script predicates, every input character gets a
//! [`CharClass`] bit set that the splitter consults when deciding where
//! empty-core fragments may start, which characters are particles and
//! which trailing runs get wrapped.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Check the full Hiragana block (U+3040..U+309F).
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Check the full Katakana block (U+30A0..U+30FF).
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c)
}

pub fn is_kanji(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
        || ('\u{3400}'..='\u{4DBF}').contains(&c)
        || ('\u{20000}'..='\u{2A6DF}').contains(&c)
}

pub fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Convert a hiragana string to katakana.
/// Non-hiragana characters (ー, ASCII, etc.) are passed through unchanged.
pub fn hiragana_to_katakana(s: &str) -> String {
    s.chars()
        .map(|c| {
            if ('\u{3041}'..='\u{3096}').contains(&c) || ('\u{309D}'..='\u{309E}').contains(&c) {
                char::from_u32(c as u32 + 0x60).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Convert a katakana string to hiragana; ヷ-ヺ and ー have no counterpart.
pub fn katakana_to_hiragana(s: &str) -> String {
    s.chars()
        .map(|c| {
            if ('\u{30A1}'..='\u{30F6}').contains(&c) || ('\u{30FD}'..='\u{30FE}').contains(&c) {
                char::from_u32(c as u32 - 0x60).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Map printable ASCII to its full-width form (space becomes U+3000).
pub fn to_fullwidth(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' => '\u{3000}',
            '!'..='~' => char::from_u32(c as u32 + 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Map full-width ASCII variants back to plain ASCII.
pub fn to_halfwidth(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Bit set of character classes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CharClass(u32);

impl CharClass {
    pub const NONE: CharClass = CharClass(0);
    pub const HIRA: CharClass = CharClass(1);
    pub const KATA: CharClass = CharClass(1 << 1);
    pub const ASCII: CharClass = CharClass(1 << 2);
    pub const NUM: CharClass = CharClass(1 << 3);
    pub const WIDENUM: CharClass = CharClass(1 << 4);
    pub const OPEN: CharClass = CharClass(1 << 5);
    pub const CLOSE: CharClass = CharClass(1 << 6);
    /// Small kana and voicing marks: never start a word on their own.
    pub const PART: CharClass = CharClass(1 << 7);
    /// Characters that can be a one-letter particle.
    pub const DEP: CharClass = CharClass(1 << 8);
    /// Particles strong enough to earn a connection bonus.
    pub const STRONG: CharClass = CharClass(1 << 9);
    pub const SYMBOL: CharClass = CharClass(1 << 10);
    pub const KANJI: CharClass = CharClass(1 << 11);
    pub const PUNCTUATION: CharClass = CharClass(1 << 12);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: CharClass) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: CharClass) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for CharClass {
    type Output = CharClass;
    fn bitor(self, rhs: CharClass) -> CharClass {
        CharClass(self.0 | rhs.0)
    }
}

impl BitOrAssign for CharClass {
    fn bitor_assign(&mut self, rhs: CharClass) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CharClass {
    type Output = CharClass;
    fn bitand(self, rhs: CharClass) -> CharClass {
        CharClass(self.0 & rhs.0)
    }
}

impl fmt::Debug for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(CharClass, &str); 13] = [
            (CharClass::HIRA, "HIRA"),
            (CharClass::KATA, "KATA"),
            (CharClass::ASCII, "ASCII"),
            (CharClass::NUM, "NUM"),
            (CharClass::WIDENUM, "WIDENUM"),
            (CharClass::OPEN, "OPEN"),
            (CharClass::CLOSE, "CLOSE"),
            (CharClass::PART, "PART"),
            (CharClass::DEP, "DEP"),
            (CharClass::STRONG, "STRONG"),
            (CharClass::SYMBOL, "SYMBOL"),
            (CharClass::KANJI, "KANJI"),
            (CharClass::PUNCTUATION, "PUNCTUATION"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(cc, _)| self.contains(*cc))
            .map(|(_, n)| *n)
            .collect();
        write!(f, "CharClass({})", names.join("|"))
    }
}

/// Classify a single character.
pub fn char_class(c: char) -> CharClass {
    let mut cc = CharClass::NONE;
    match c {
        'と' | 'に' | 'を' => cc |= CharClass::DEP,
        'は' | 'の' | 'が' => cc |= CharClass::DEP | CharClass::STRONG,
        'ぁ' | 'ぃ' | 'ぅ' | 'ぇ' | 'ぉ' | 'ゃ' | 'ゅ' | 'ょ' | 'っ' | 'ゎ' => {
            cc |= CharClass::PART
        }
        '゛' | '゜' | '\u{3099}' | '\u{309A}' => return CharClass::PART,
        'ー' => return CharClass::HIRA | CharClass::SYMBOL,
        _ => {}
    }
    if is_hiragana(c) {
        return cc | CharClass::HIRA;
    }
    if is_katakana(c) {
        if c == '・' {
            return CharClass::SYMBOL;
        }
        return CharClass::KATA;
    }
    if is_kanji(c) {
        return CharClass::KANJI;
    }
    match c {
        '（' | '〔' | '［' | '｛' | '〈' | '《' | '「' | '『' | '【' | '(' | '[' | '{' => {
            CharClass::OPEN
        }
        '）' | '〕' | '］' | '｝' | '〉' | '》' | '」' | '』' | '】' | ')' | ']' | '}' => {
            CharClass::CLOSE
        }
        '、' | '。' | '，' | '．' => CharClass::SYMBOL | CharClass::PUNCTUATION,
        '０'..='９' => CharClass::WIDENUM,
        '0'..='9' => CharClass::NUM | CharClass::ASCII,
        '\u{3000}'..='\u{303F}' => CharClass::SYMBOL,
        '\u{FF01}'..='\u{FF0F}' | '\u{FF1A}'..='\u{FF20}' | '\u{FF3B}'..='\u{FF40}'
        | '\u{FF5B}'..='\u{FF65}' => CharClass::SYMBOL,
        '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => CharClass::NONE,
        _ if c.is_ascii_alphabetic() => CharClass::ASCII,
        _ if c.is_ascii_punctuation() => CharClass::ASCII | CharClass::SYMBOL,
        _ => CharClass::NONE,
    }
}

/// Value of a half- or full-width decimal digit.
pub fn digit_value(c: char) -> Option<u32> {
    match c {
        '0'..='9' => Some(c as u32 - '0' as u32),
        '０'..='９' => Some(c as u32 - '０' as u32),
        _ => None,
    }
}

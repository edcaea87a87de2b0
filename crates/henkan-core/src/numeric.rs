//! Numerals: reading and rendering.
//!
//! Segments spelled with digits get kanji and comma-grouped renderings;
//! segments spelled as kana number words (にじゅうさん, さんびゃく ...) get
//! digit renderings. Values up to 兆 (10^12) are supported.

const DIGIT_KANJI: [char; 10] = ['〇', '一', '二', '三', '四', '五', '六', '七', '八', '九'];

/// Large units, highest first, with their kana and kanji spellings.
const MYRIAD_UNITS: [(u64, &str, char); 3] = [
    (1_000_000_000_000, "ちょう", '兆'),
    (100_000_000, "おく", '億'),
    (10_000, "まん", '万'),
];

/// Small units, highest first. The first kana is the plain spelling,
/// the rest are sound-changed forms.
const SMALL_UNITS: [(u64, &[&str], char); 3] = [
    (1000, &["せん", "ぜん"], '千'),
    (100, &["ひゃく", "びゃく", "ぴゃく"], '百'),
    (10, &["じゅう", "じゅっ", "じっ"], '十'),
];

/// Digit words, longest spellings first so that しち wins over し.
const DIGIT_KANA: [(&str, u64); 14] = [
    ("きゅう", 9),
    ("しち", 7),
    ("よん", 4),
    ("はち", 8),
    ("ろく", 6),
    ("なな", 7),
    ("いち", 1),
    ("さん", 3),
    ("ぜろ", 0),
    ("れい", 0),
    ("に", 2),
    ("し", 4),
    ("ご", 5),
    ("く", 9),
];

/// Value of a kana number word, or `None` if the text is not one.
pub fn parse_kana_number(kana: &str) -> Option<u64> {
    if kana.is_empty() {
        return None;
    }
    if kana == "ぜろ" || kana == "れい" {
        return Some(0);
    }
    let mut rest = kana;
    let mut total: u64 = 0;
    for (unit, spelling, _) in MYRIAD_UNITS {
        let before = rest;
        let group = parse_group(&mut rest);
        if let Some(after) = rest.strip_prefix(spelling) {
            // まん alone means 一万.
            total += group.max(1) * unit;
            rest = after;
        } else {
            rest = before;
        }
    }
    total += parse_group(&mut rest);
    if !rest.is_empty() || total == 0 {
        return None;
    }
    Some(total)
}

/// Consume a value below 10000 from the front of `rest`.
fn parse_group(rest: &mut &str) -> u64 {
    let mut value = 0;
    for (unit, spellings, _) in SMALL_UNITS {
        value += parse_small_unit(rest, unit, spellings);
    }
    if let Some((d, len)) = digit_prefix(rest) {
        *rest = &rest[len..];
        value += d;
    }
    value
}

fn parse_small_unit(rest: &mut &str, unit: u64, spellings: &[&str]) -> u64 {
    let (multiplier, after) = match geminated_prefix(rest, unit).or_else(|| digit_prefix(rest)) {
        Some((d, len)) => (d, &rest[len..]),
        None => (1, *rest),
    };
    for s in spellings {
        if let Some(tail) = after.strip_prefix(s) {
            *rest = tail;
            return multiplier * unit;
        }
    }
    0
}

/// ろっぴゃく, はっぴゃく and はっせん shorten the digit before the unit.
fn geminated_prefix(s: &str, unit: u64) -> Option<(u64, usize)> {
    let forms: &[(&str, u64)] = match unit {
        100 => &[("ろっ", 6), ("はっ", 8)],
        1000 => &[("はっ", 8)],
        _ => &[],
    };
    forms
        .iter()
        .find(|(kana, _)| s.starts_with(kana))
        .map(|&(kana, d)| (d, kana.len()))
}

fn digit_prefix(s: &str) -> Option<(u64, usize)> {
    DIGIT_KANA
        .iter()
        .find(|(kana, _)| s.starts_with(kana))
        .map(|&(kana, d)| (d, kana.len()))
}

/// Value of a string of half- or full-width digits.
pub fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }
    s.chars().try_fold(0u64, |acc, c| {
        let d = crate::unicode::digit_value(c)?;
        acc.checked_mul(10)?.checked_add(d as u64)
    })
}

/// Digit-by-digit kanji: 1234 → 一二三四.
pub fn to_kanji_digits(s: &str) -> String {
    s.chars()
        .map(|c| match crate::unicode::digit_value(c) {
            Some(d) => DIGIT_KANJI[d as usize],
            None => c,
        })
        .collect()
}

/// Positional kanji numeral: 1234 → 千二百三十四, 20000 → 二万.
pub fn to_kanji_numeral(n: u64) -> String {
    if n == 0 {
        return DIGIT_KANJI[0].to_string();
    }
    let mut out = String::new();
    let mut rest = n;
    for (unit, _, kanji) in MYRIAD_UNITS {
        let group = rest / unit;
        if group > 0 {
            push_group(&mut out, group);
            out.push(kanji);
        }
        rest %= unit;
    }
    push_group(&mut out, rest);
    out
}

fn push_group(out: &mut String, mut group: u64) {
    for (unit, _, kanji) in SMALL_UNITS {
        let d = group / unit;
        if d > 1 {
            out.push(DIGIT_KANJI[d as usize]);
        }
        if d > 0 {
            out.push(kanji);
        }
        group %= unit;
    }
    if group > 0 {
        out.push(DIGIT_KANJI[group as usize]);
    }
}

/// Digits with a comma every three places: 1234567 → 1,234,567.
pub fn to_grouped(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kana_digits() {
        assert_eq!(parse_kana_number("ぜろ"), Some(0));
        assert_eq!(parse_kana_number("いち"), Some(1));
        assert_eq!(parse_kana_number("し"), Some(4));
        assert_eq!(parse_kana_number("しち"), Some(7));
        assert_eq!(parse_kana_number("きゅう"), Some(9));
    }

    #[test]
    fn kana_small_units() {
        assert_eq!(parse_kana_number("じゅう"), Some(10));
        assert_eq!(parse_kana_number("にじゅうさん"), Some(23));
        assert_eq!(parse_kana_number("さんびゃく"), Some(300));
        assert_eq!(parse_kana_number("ろっぴゃく"), Some(600));
        assert_eq!(parse_kana_number("はっせん"), Some(8000));
        assert_eq!(parse_kana_number("せんにひゃくさんじゅうよん"), Some(1234));
    }

    #[test]
    fn kana_large_units() {
        assert_eq!(parse_kana_number("まん"), Some(10_000));
        assert_eq!(parse_kana_number("じゅうまん"), Some(100_000));
        assert_eq!(parse_kana_number("いちおく"), Some(100_000_000));
        assert_eq!(
            parse_kana_number("いちまんにせんさんびゃくよんじゅうご"),
            Some(12345)
        );
    }

    #[test]
    fn not_numbers() {
        assert_eq!(parse_kana_number(""), None);
        assert_eq!(parse_kana_number("きょう"), None);
        assert_eq!(parse_kana_number("にん"), None);
        assert_eq!(parse_kana_number("さんにん"), None);
    }

    #[test]
    fn digit_strings() {
        assert_eq!(parse_digits("1234"), Some(1234));
        assert_eq!(parse_digits("１２３４"), Some(1234));
        assert_eq!(parse_digits("12a"), None);
        assert_eq!(parse_digits("99999999999999999999999"), None);
    }

    #[test]
    fn renderings() {
        assert_eq!(to_kanji_digits("１２３４"), "一二三四");
        assert_eq!(to_kanji_numeral(1234), "千二百三十四");
        assert_eq!(to_kanji_numeral(20_015), "二万十五");
        assert_eq!(to_kanji_numeral(0), "〇");
        assert_eq!(to_grouped(1234), "1,234");
        assert_eq!(to_grouped(123), "123");
        assert_eq!(to_grouped(1_234_567), "1,234,567");
    }
}

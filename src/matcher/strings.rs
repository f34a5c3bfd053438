//! String distance and phonetic primitives.
//!
//! All functions are pure and work on Unicode scalar values, not bytes.
//! Edit distance and the Jaro core come from `strsim`; the Winkler boost is
//! applied here because `strsim::jaro_winkler` only boosts above a 0.7 Jaro
//! floor, and identity matching wants the boost unconditionally.

/// Characters of shared prefix that earn the Winkler bonus.
pub const WINKLER_PREFIX_CAP: usize = 4;
/// Winkler scaling factor.
pub const WINKLER_SCALING: f64 = 0.1;
/// Length of Soundex and Metaphone keys.
pub const PHONETIC_KEY_LEN: usize = 4;

/// Levenshtein edit distance (insert, delete, substitute all cost 1).
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// `1 - distance / max_len`; two empty strings are identical.
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / max_len as f64
}

/// Plain Jaro similarity. The matching window is `max(len)/2 - 1`.
pub fn jaro(a: &str, b: &str) -> f64 {
    strsim::jaro(a, b)
}

/// Jaro–Winkler similarity with a prefix bonus capped at four characters.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let sim = jaro(a, b);
    let prefix = a
        .chars()
        .zip(b.chars())
        .take(WINKLER_PREFIX_CAP)
        .take_while(|(x, y)| x == y)
        .count();
    (sim + prefix as f64 * WINKLER_SCALING * (1.0 - sim)).min(1.0)
}

fn soundex_digit(c: char) -> char {
    match c {
        'B' | 'F' | 'P' | 'V' => '1',
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => '2',
        'D' | 'T' => '3',
        'L' => '4',
        'M' | 'N' => '5',
        'R' => '6',
        _ => '0',
    }
}

/// Four-character Soundex key, e.g. `Robert` → `R163`.
///
/// Returns an empty string when the input has no ASCII letters.
pub fn soundex(s: &str) -> String {
    let letters: Vec<char> = s
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let Some((&first, rest)) = letters.split_first() else {
        return String::new();
    };

    let mut key = String::with_capacity(PHONETIC_KEY_LEN);
    key.push(first);
    let mut prev = soundex_digit(first);
    for &c in rest {
        let digit = soundex_digit(c);
        if digit != prev && digit != '0' {
            key.push(digit);
        }
        prev = digit;
        if key.len() == PHONETIC_KEY_LEN {
            break;
        }
    }
    pad_key(key)
}

/// Approximate Metaphone key.
///
/// Only a handful of the classic rules are applied: duplicate letters
/// collapse, `GH` is silent, `PH` reads as `F`, and vowels after the first
/// letter are dropped. Keys are padded or cut to four characters.
pub fn metaphone(s: &str) -> String {
    let mut letters: Vec<char> = s
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    letters.dedup();
    if letters.is_empty() {
        return String::new();
    }

    let mut folded = Vec::with_capacity(letters.len());
    let mut i = 0;
    while i < letters.len() {
        match (letters[i], letters.get(i + 1)) {
            ('G', Some('H')) => i += 2,
            ('P', Some('H')) => {
                folded.push('F');
                i += 2;
            }
            (c, _) => {
                folded.push(c);
                i += 1;
            }
        }
    }

    let mut key: String = folded
        .iter()
        .enumerate()
        .filter(|(i, c)| *i == 0 || !matches!(c, 'A' | 'E' | 'I' | 'O' | 'U'))
        .map(|(_, c)| *c)
        .take(PHONETIC_KEY_LEN)
        .collect();
    if key.is_empty() {
        // Input was only a silent digraph.
        key.push(letters[0]);
    }
    pad_key(key)
}

fn pad_key(mut key: String) -> String {
    while key.len() < PHONETIC_KEY_LEN {
        key.push('0');
    }
    key
}

//! Field-level identity comparisons: email, phone, username, name and
//! biographical consistency.

use std::collections::{BTreeMap, BTreeSet};

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::model::{PropertyMap, Value};
use super::strings::{jaro_winkler, soundex};
use super::{Algorithm, MatchScore, Matcher};

/// Country digit prepended to bare 10-digit (domestic) numbers.
pub const DEFAULT_COUNTRY_CODE: char = '1';

/// Digits in a local number; a match on these alone is a weaker signal.
const LOCAL_NUMBER_DIGITS: usize = 7;

/// Longest E.164 number.
const MAX_PHONE_DIGITS: usize = 15;

/// Known domain aliases folded to one canonical mailbox provider.
const DOMAIN_ALIASES: &[(&str, &str)] = &[
    ("googlemail.com", "gmail.com"),
    ("hotmail.com", "outlook.com"),
    ("live.com", "outlook.com"),
    ("msn.com", "outlook.com"),
    ("passport.com", "outlook.com"),
    ("ymail.com", "yahoo.com"),
    ("rocketmail.com", "yahoo.com"),
    ("me.com", "icloud.com"),
    ("mac.com", "icloud.com"),
    ("protonmail.com", "proton.me"),
    ("pm.me", "proton.me"),
];

const USERNAME_SEPARATORS: [char; 3] = ['_', '-', '.'];

/// Biographical keys understood by [`Matcher::biographical_consistency`].
pub const BIO_BIRTH_YEAR: &str = "birth_year";
pub const BIO_TEXT_FIELDS: [&str; 3] = ["location", "school", "employer"];

// ============================================================================
// Normalizers
// ============================================================================

/// Lowercase, drop `+tag` aliasing from the local part, fold domain aliases.
///
/// Returns `None` when there is no `local@domain` shape to work with.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    let (local, domain) = email.rsplit_once('@')?;
    let local = local.split('+').next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    let domain = DOMAIN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == domain)
        .map_or(domain, |(_, canonical)| *canonical);
    Some(format!("{local}@{domain}"))
}

/// Digits-only form with the country digit.
///
/// Ten digits are read as a domestic number and get [`DEFAULT_COUNTRY_CODE`]
/// prepended. Eleven to fifteen digits are taken as already international.
/// Anything shorter or longer is not a phone number.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        10 => Some(format!("{DEFAULT_COUNTRY_CODE}{digits}")),
        11..=MAX_PHONE_DIGITS => Some(digits),
        _ => None,
    }
}

/// Spelling variants a person plausibly uses for the same handle.
///
/// Always contains the lowercased original and its separator-free form.
/// `john.smith` additionally yields `smithjohn`, `jsmith` and `smithj`.
pub fn username_variants(username: &str) -> BTreeSet<String> {
    let lower = username.trim().to_lowercase();
    let parts: Vec<&str> = lower
        .split(USERNAME_SEPARATORS)
        .filter(|p| !p.is_empty())
        .collect();

    let mut variants = BTreeSet::new();
    variants.insert(parts.concat());
    if let [first, last] = parts[..] {
        variants.insert(format!("{last}{first}"));
        if let Some(f) = first.chars().next() {
            variants.insert(format!("{f}{last}"));
            variants.insert(format!("{last}{f}"));
        }
    }
    variants.insert(lower);
    variants.retain(|v| !v.is_empty());
    variants
}

/// Diacritic-free, lowercased name tokens split on whitespace, `-` and `.`.
pub fn name_tokens(name: &str) -> Vec<String> {
    let folded: String = name.nfd().filter(|c| !is_combining_mark(*c)).collect();
    folded
        .split(|c: char| c.is_whitespace() || c == '-' || c == '.')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

// ============================================================================
// Comparisons
// ============================================================================

impl Matcher {
    /// Email addresses, after normalization.
    pub fn email_similarity(&self, a: &str, b: &str) -> MatchScore {
        let (Some(norm_a), Some(norm_b)) = (normalize_email(a), normalize_email(b)) else {
            return MatchScore::none(Algorithm::Exact, "invalid email address");
        };
        if norm_a == norm_b {
            return MatchScore::scaled(Algorithm::Exact, 1.0, "emails match after normalization")
                .with_detail("normalized", norm_a);
        }

        // Both normalized forms contain exactly one '@' boundary we split on.
        let (local_a, domain_a) = norm_a.rsplit_once('@').unwrap_or((norm_a.as_str(), ""));
        let (local_b, domain_b) = norm_b.rsplit_once('@').unwrap_or((norm_b.as_str(), ""));
        if domain_a == domain_b {
            let sim = jaro_winkler(local_a, local_b);
            if sim > self.config.email_local_threshold {
                return MatchScore::scaled(
                    Algorithm::JaroWinkler,
                    sim,
                    format!("same provider, local parts {:.0}% similar", sim * 100.0),
                )
                .with_detail("domain", domain_a);
            }
        }
        MatchScore::none(Algorithm::JaroWinkler, "different email addresses")
    }

    /// Phone numbers, after normalization to digits with a country digit.
    pub fn phone_similarity(&self, a: &str, b: &str) -> MatchScore {
        let (Some(norm_a), Some(norm_b)) = (normalize_phone(a), normalize_phone(b)) else {
            return MatchScore::none(Algorithm::Exact, "invalid phone numbers");
        };
        if norm_a == norm_b {
            return MatchScore::scaled(Algorithm::Exact, 1.0, "phone numbers match")
                .with_detail("normalized", norm_a);
        }
        let local_a = &norm_a[norm_a.len() - LOCAL_NUMBER_DIGITS..];
        let local_b = &norm_b[norm_b.len() - LOCAL_NUMBER_DIGITS..];
        if local_a == local_b {
            return MatchScore::new(Algorithm::Exact, 0.9, 90.0, "local number matches, prefix differs")
                .with_detail("local_number", local_a);
        }
        MatchScore::none(Algorithm::Exact, "different phone numbers")
    }

    /// Handles, allowing for separator and first-initial variations.
    pub fn username_similarity(&self, a: &str, b: &str) -> MatchScore {
        let lower_a = a.trim().to_lowercase();
        let lower_b = b.trim().to_lowercase();
        if lower_a == lower_b {
            return MatchScore::scaled(Algorithm::Exact, 1.0, "usernames match");
        }

        let variants_a = username_variants(a);
        let variants_b = username_variants(b);
        if let Some(shared) = variants_a.intersection(&variants_b).next() {
            return MatchScore::new(Algorithm::Exact, 0.95, 95.0, "username variants match")
                .with_detail("shared_variant", shared.as_str());
        }

        let sim = jaro_winkler(&lower_a, &lower_b);
        let reasoning = if sim > self.config.fuzzy_threshold {
            "similar usernames"
        } else {
            "usernames differ"
        };
        MatchScore::scaled(Algorithm::JaroWinkler, sim, reasoning)
    }

    /// Personal names, tolerant of order, diacritics and partial names.
    pub fn name_similarity(&self, a: &str, b: &str) -> MatchScore {
        let tokens_a = name_tokens(a);
        let tokens_b = name_tokens(b);
        if tokens_a.is_empty() || tokens_b.is_empty() {
            return MatchScore::none(Algorithm::Exact, "empty name");
        }
        if a.trim().to_lowercase() == b.trim().to_lowercase() {
            return MatchScore::scaled(Algorithm::Exact, 1.0, "names match");
        }

        let set_a: BTreeSet<&str> = tokens_a.iter().map(String::as_str).collect();
        let set_b: BTreeSet<&str> = tokens_b.iter().map(String::as_str).collect();
        let shared = set_a.intersection(&set_b).count();
        let smaller = set_a.len().min(set_b.len());

        if shared == smaller {
            return MatchScore::new(Algorithm::Exact, 0.95, 95.0, "possible name-order variation")
                .with_detail("shared_tokens", shared as i64);
        }
        if shared >= 2 {
            let overlap = shared as f64 / smaller as f64;
            return MatchScore::scaled(Algorithm::Exact, overlap, format!("{shared} name tokens shared"))
                .with_detail("shared_tokens", shared as i64);
        }

        if phonetic_names_agree(&tokens_a, &tokens_b) {
            return MatchScore::new(Algorithm::Soundex, 0.85, 85.0, "names sound alike");
        }

        let sim = jaro_winkler(&a.trim().to_lowercase(), &b.trim().to_lowercase());
        let reasoning = if sim > self.config.fuzzy_threshold { "similar names" } else { "names differ" };
        MatchScore::scaled(Algorithm::JaroWinkler, sim, reasoning)
    }

    /// Agreement of biographical facts present on both sides.
    ///
    /// Fields: `birth_year` (±1 year scores 1.0, ±2 scores 0.7),
    /// `location`, `school`, `employer` (Jaro–Winkler). Values of the wrong
    /// type are skipped. With nothing to compare the result is a neutral
    /// 0.5: no evidence is not contradicting evidence.
    pub fn biographical_consistency(&self, a: &PropertyMap, b: &PropertyMap) -> MatchScore {
        let mut compared: BTreeMap<String, Value> = BTreeMap::new();

        let years = (
            a.get(BIO_BIRTH_YEAR).and_then(Value::as_int),
            b.get(BIO_BIRTH_YEAR).and_then(Value::as_int),
        );
        if let (Some(year_a), Some(year_b)) = years {
            let score = match year_a.abs_diff(year_b) {
                0..=1 => 1.0,
                2 => 0.7,
                _ => 0.0,
            };
            compared.insert(BIO_BIRTH_YEAR.into(), Value::Float(score));
        }

        for field in BIO_TEXT_FIELDS {
            if let (Some(text_a), Some(text_b)) = (bio_text(a, field), bio_text(b, field)) {
                let score = jaro_winkler(&text_a, &text_b);
                compared.insert(field.into(), Value::Float(score));
            }
        }

        if compared.is_empty() {
            return MatchScore::scaled(Algorithm::Semantic, 0.5, "no comparable biographical fields");
        }

        let total: f64 = compared.values().filter_map(Value::as_float).sum();
        let average = total / compared.len() as f64;
        let count = compared.len();
        let mut score = MatchScore::scaled(
            Algorithm::Semantic,
            average,
            format!("{count} biographical fields compared"),
        );
        score.details = compared;
        score
    }
}

fn bio_text(map: &PropertyMap, field: &str) -> Option<String> {
    let text = map.get(field)?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_lowercase())
}

/// First tokens share a Soundex key, and so do last tokens when both names
/// have at least two.
fn phonetic_names_agree(tokens_a: &[String], tokens_b: &[String]) -> bool {
    let same_key = |x: &str, y: &str| {
        let key = soundex(x);
        !key.is_empty() && key == soundex(y)
    };
    let (Some(first_a), Some(first_b)) = (tokens_a.first(), tokens_b.first()) else {
        return false;
    };
    if !same_key(first_a, first_b) {
        return false;
    }
    if tokens_a.len() >= 2 && tokens_b.len() >= 2 {
        let (Some(last_a), Some(last_b)) = (tokens_a.last(), tokens_b.last()) else {
            return false;
        };
        return same_key(last_a, last_b);
    }
    true
}

//! Class labels encoded in directory names.
//!
//! A class directory is named `Country_Fruit` or `Country-Fruit`. The country
//! token goes through a small synonym table, everything else is title-cased,
//! so `vietnamese-mango` and `Vietnam_Mango` name the same class.

use std::fmt;

use serde::Serialize;

/// lower-cased spelling -> canonical country
const COUNTRY_SYNONYMS: &[(&str, &str)] = &[
    ("chinese", "China"),
    ("china", "China"),
    ("vietnamese", "Vietnam"),
    ("vietnam", "Vietnam"),
];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ClassLabel {
    pub country: String,
    pub fruit: String,
}

impl ClassLabel {
    pub fn new(country: impl Into<String>, fruit: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            fruit: fruit.into(),
        }
    }
}

/// `Country-Fruit`, the flat class key.
impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.country, self.fruit)
    }
}

/// Parses a class directory name into a normalized label.
///
/// `_` takes precedence over `-` as the separator. The name must split into
/// exactly two non-empty tokens, otherwise `None` is returned.
pub fn parse_label(name: &str) -> Option<ClassLabel> {
    let separator = if name.contains('_') {
        '_'
    } else if name.contains('-') {
        '-'
    } else {
        return None;
    };

    let mut tokens = name.split(separator);
    let country = tokens.next()?;
    let fruit = tokens.next()?;
    if tokens.next().is_some() || country.is_empty() || fruit.is_empty() {
        return None;
    }

    Some(ClassLabel {
        country: normalize_country(country),
        fruit: title_case(fruit),
    })
}

pub fn normalize_country(token: &str) -> String {
    let lower = token.to_lowercase();
    COUNTRY_SYNONYMS
        .iter()
        .find(|(spelling, _)| *spelling == lower)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| title_case(&lower))
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

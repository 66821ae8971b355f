//! Byte-count parsing and formatting
//!
//! Limits on the command line accept a unit suffix (B/K/M/G/T/P/E/Z/Y,
//! case-insensitive, powers of 1024); report output renders sizes with the
//! same suffixes. Formatting picks the largest unit whose multiplier is
//! strictly less than the value and prints one decimal.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Grammar for sizes with an optional unit suffix
static SIZE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+(\.[0-9]+)?)([A-Za-z]+)?$").expect("Invalid size regex")
});

/// Unit letters, indexed by power of 1024
const LETTERS: [char; 9] = ['B', 'K', 'M', 'G', 'T', 'P', 'E', 'Z', 'Y'];

/// Errors from parsing a human-readable size
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// Input does not match the `<number>[unit]` grammar
    #[error("malformed size '{0}'")]
    Malformed(String),

    /// Unit suffix is not one of B/K/M/G/T/P/E/Z/Y
    #[error("unknown unit suffix '{0}'")]
    UnknownSuffix(String),
}

/// Parse a size like `100`, `1.5K` or `2g` into a plain count.
///
/// The default unit when the suffix is absent is `B`.
pub fn from_human(input: &str) -> Result<u64, UnitError> {
    let input = input.trim();
    let caps = SIZE_REGEX
        .captures(input)
        .ok_or_else(|| UnitError::Malformed(input.to_string()))?;

    let value: f64 = caps[1]
        .parse()
        .map_err(|_| UnitError::Malformed(input.to_string()))?;

    let multiplier = match caps.get(3) {
        None => 1.0,
        Some(m) => suffix_multiplier(m.as_str())
            .ok_or_else(|| UnitError::UnknownSuffix(m.as_str().to_string()))?,
    };

    // Saturating float-to-int cast; 1Y overflows u64 on purpose.
    Ok((value * multiplier).round() as u64)
}

/// Render a count with the largest unit whose multiplier is strictly
/// below the value, one decimal place.
pub fn to_human(value: u64) -> String {
    let v = value as f64;
    for exp in (1..=8).rev() {
        let multiplier = 1024f64.powi(exp);
        if multiplier < v {
            return format!("{:.1}{}", v / multiplier, LETTERS[exp as usize]);
        }
    }
    format!("{v:.1}B")
}

fn suffix_multiplier(suffix: &str) -> Option<f64> {
    let upper = suffix.to_ascii_uppercase();
    // Accept the two-letter spellings (KB, MB, ...) as well.
    let unit = match upper.as_str() {
        u if u.len() == 2 && u.ends_with('B') => &u[..1],
        u => u,
    };
    if unit.len() != 1 {
        return None;
    }
    let letter = unit.chars().next()?;
    let exp = LETTERS.iter().position(|&l| l == letter)?;
    Some(1024f64.powi(exp as i32))
}

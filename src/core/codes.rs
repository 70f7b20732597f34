//! core::codes
//!
//! Code specifications and the match patterns derived from them.
//!
//! # Code Specifications
//!
//! Records in the count store carry a numeric code string. Countries are
//! configured against either a single code or an inclusive numeric range:
//!
//! - `"250"` - a code family; matches every code that starts with `250`
//! - `"9–11"` - an inclusive range; matches codes whose value is 9, 10 or 11
//!
//! The range delimiter is the EN DASH (`U+2013`). An ASCII hyphen is not a
//! delimiter, so `"9-11"` is read as a single code and rejected as
//! non-numeric.
//!
//! # Patterns
//!
//! Patterns are regular expressions in the dialect shared by the document
//! store and the `regex` crate (anchors, groups, character classes and
//! counted repetition only). Range patterns are anchored at both ends and do
//! not assume a fixed digit width.
//!
//! # Example
//!
//! ```
//! use countmap::core::codes::CodeSpec;
//!
//! let spec = CodeSpec::parse("9–11").unwrap();
//! assert_eq!(spec.pattern().as_str(), "^(?:9|1[0-1])$");
//!
//! let spec = CodeSpec::parse("250").unwrap();
//! assert_eq!(spec.pattern().as_str(), "^250");
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Delimiter between the bounds of a ranged specification (EN DASH).
pub const RANGE_DELIMITER: char = '\u{2013}';

/// Errors from parsing a code specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeSpecError {
    /// A ranged specification has a non-numeric bound or `low > high`.
    #[error("invalid code range '{spec}': {reason}")]
    InvalidRange { spec: String, reason: String },

    /// A single-code specification is not a non-negative integer.
    #[error("invalid code '{0}': expected a non-negative integer")]
    InvalidCode(String),
}

/// Errors from loading the code specification source.
#[derive(Debug, Error)]
pub enum CodeSourceError {
    #[error("failed to read code source '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse code source '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

/// A parsed code specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSpec {
    /// A code family, matched by prefix.
    Single(u64),
    /// An inclusive numeric range.
    Range { low: u64, high: u64 },
}

impl CodeSpec {
    /// Build a range specification, rejecting inverted bounds.
    pub fn range(low: u64, high: u64) -> Result<Self, CodeSpecError> {
        if low > high {
            return Err(CodeSpecError::InvalidRange {
                spec: format!("{}{}{}", low, RANGE_DELIMITER, high),
                reason: format!("lower bound {} exceeds upper bound {}", low, high),
            });
        }
        Ok(CodeSpec::Range { low, high })
    }

    /// Parse a specification string.
    ///
    /// # Errors
    ///
    /// - [`CodeSpecError::InvalidRange`] if a bound is not numeric or the
    ///   bounds are inverted
    /// - [`CodeSpecError::InvalidCode`] if a single code is not numeric
    pub fn parse(spec: &str) -> Result<Self, CodeSpecError> {
        let trimmed = spec.trim();

        match trimmed.split_once(RANGE_DELIMITER) {
            Some((low, high)) => {
                let low = parse_bound(spec, low)?;
                let high = parse_bound(spec, high)?;
                Self::range(low, high).map_err(|e| match e {
                    CodeSpecError::InvalidRange { reason, .. } => CodeSpecError::InvalidRange {
                        spec: spec.to_string(),
                        reason,
                    },
                    other => other,
                })
            }
            None => trimmed
                .parse::<u64>()
                .map(CodeSpec::Single)
                .map_err(|_| CodeSpecError::InvalidCode(spec.to_string())),
        }
    }

    /// Build the match pattern for this specification.
    pub fn pattern(&self) -> CodePattern {
        match *self {
            CodeSpec::Single(code) => CodePattern(format!("^{}", code)),
            CodeSpec::Range { low, high } => CodePattern(range_pattern(low, high)),
        }
    }
}

impl fmt::Display for CodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeSpec::Single(code) => write!(f, "{}", code),
            CodeSpec::Range { low, high } => write!(f, "{}{}{}", low, RANGE_DELIMITER, high),
        }
    }
}

fn parse_bound(spec: &str, bound: &str) -> Result<u64, CodeSpecError> {
    bound
        .trim()
        .parse::<u64>()
        .map_err(|_| CodeSpecError::InvalidRange {
            spec: spec.to_string(),
            reason: format!("bound '{}' is not a non-negative integer", bound.trim()),
        })
}

/// A match pattern understood by the count store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodePattern(String);

impl CodePattern {
    /// Get the pattern source.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compile the pattern for local matching.
    pub fn compile(&self) -> Result<regex::Regex, regex::Error> {
        regex::Regex::new(&self.0)
    }
}

impl fmt::Display for CodePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build an anchored pattern matching the decimal strings of `low..=high`.
///
/// The range is split into runs of equal digit width, and each run into
/// alternatives that differ in a single digit position.
pub fn range_pattern(low: u64, high: u64) -> String {
    let mut alternatives = Vec::new();
    let mut start = low;

    loop {
        let width = start.to_string().len() as u32;
        let widest = 10u64
            .checked_pow(width)
            .map(|p| p - 1)
            .unwrap_or(u64::MAX);
        let end = high.min(widest);

        alternatives.extend(same_width(&start.to_string(), &end.to_string()));

        if end >= high {
            break;
        }
        start = end + 1;
    }

    format!("^(?:{})$", alternatives.join("|"))
}

fn same_width(lo: &str, hi: &str) -> Vec<String> {
    if lo == hi {
        return vec![lo.to_string()];
    }

    let (lead_lo, rest_lo) = lo.split_at(1);
    let (lead_hi, rest_hi) = hi.split_at(1);

    if lead_lo == lead_hi {
        return same_width(rest_lo, rest_hi)
            .into_iter()
            .map(|alt| format!("{}{}", lead_lo, alt))
            .collect();
    }

    let a = lead_lo.as_bytes()[0];
    let b = lead_hi.as_bytes()[0];
    let tail = rest_lo.len();
    let lo_is_floor = rest_lo.bytes().all(|d| d == b'0');
    let hi_is_ceiling = rest_hi.bytes().all(|d| d == b'9');

    let mut alternatives = Vec::new();

    let mut first = a;
    if !lo_is_floor {
        let nines = "9".repeat(tail);
        alternatives.extend(
            same_width(rest_lo, &nines)
                .into_iter()
                .map(|alt| format!("{}{}", a as char, alt)),
        );
        first = a + 1;
    }

    let last = if hi_is_ceiling { b } else { b - 1 };
    if first <= last {
        alternatives.push(format!("{}{}", digit_class(first, last), any_digits(tail)));
    }

    if !hi_is_ceiling {
        let zeros = "0".repeat(tail);
        alternatives.extend(
            same_width(&zeros, rest_hi)
                .into_iter()
                .map(|alt| format!("{}{}", b as char, alt)),
        );
    }

    alternatives
}

fn digit_class(first: u8, last: u8) -> String {
    if first == last {
        (first as char).to_string()
    } else {
        format!("[{}-{}]", first as char, last as char)
    }
}

fn any_digits(count: usize) -> String {
    match count {
        0 => String::new(),
        1 => "[0-9]".to_string(),
        n => format!("[0-9]{{{}}}", n),
    }
}

/// One configured entry of the code source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    /// The raw specification string.
    pub spec: String,
    /// The country display name.
    pub country: String,
}

/// The configured mapping of specification strings to country names.
///
/// Entry order follows the source document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeSource {
    entries: Vec<CodeEntry>,
}

impl CodeSource {
    /// Build a source from `(spec, country)` pairs.
    pub fn from_pairs<I, S, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(spec, country)| CodeEntry {
                    spec: spec.into(),
                    country: country.into(),
                })
                .collect(),
        }
    }

    /// Load a JSON object of `spec -> country name`.
    pub fn load(path: &Path) -> Result<Self, CodeSourceError> {
        let contents = fs::read_to_string(path).map_err(|e| CodeSourceError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_json(&contents).map_err(|message| CodeSourceError::ParseError {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_json(contents: &str) -> Result<Self, String> {
        let map: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(contents).map_err(|e| e.to_string())?;

        let mut entries = Vec::with_capacity(map.len());
        for (spec, value) in map {
            let country = value
                .as_str()
                .ok_or_else(|| format!("value for '{}' must be a country name string", spec))?;
            entries.push(CodeEntry {
                spec,
                country: country.to_string(),
            });
        }

        Ok(Self { entries })
    }

    /// Parse every entry, failing on the first invalid specification.
    pub fn parse_all(&self) -> Result<Vec<(CodeSpec, &CodeEntry)>, CodeSpecError> {
        self.entries
            .iter()
            .map(|entry| CodeSpec::parse(&entry.spec).map(|spec| (spec, entry)))
            .collect()
    }

    pub fn entries(&self) -> &[CodeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

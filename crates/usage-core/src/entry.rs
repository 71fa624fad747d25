//! Parser for `label NN.NN%` lines inside a category section

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Label of the bucket that aggregates all unlisted values
pub const OTHER_LABEL: &str = "Other";

/// A labeled probability within a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub label: String,
    /// Fraction in `[0, 1]`
    pub probability: f64,
}

impl CategoryEntry {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }

    /// Whether this is the aggregate "Other" bucket
    pub fn is_other(&self) -> bool {
        self.label == OTHER_LABEL
    }
}

/// Parse an entry line, converting its percentage to a fraction
pub fn parse_entry(line: &str) -> Result<CategoryEntry> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (value, label) = match tokens.split_last() {
        Some((value, label)) if !label.is_empty() => (*value, label),
        _ => return Err(Error::malformed_entry(line, "expected a label and a percentage")),
    };

    let number = value
        .strip_suffix('%')
        .ok_or_else(|| Error::malformed_entry(line, "value does not end with '%'"))?;
    let percent: f64 = number
        .parse()
        .map_err(|_| Error::malformed_entry(line, format!("'{}' is not a number", number)))?;
    if !percent.is_finite() {
        return Err(Error::malformed_entry(line, "value is not finite"));
    }

    Ok(CategoryEntry::new(label.join(" "), percent / 100.0))
}

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// The source table could not be turned into a usable dataset. Every variant
/// is fatal for the session.
#[derive(Debug, thiserror::Error)]
pub enum DataUnavailable {
    #[error("data unavailable: cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("data unavailable: {path} is missing required column(s): {}", missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("data unavailable: {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("data unavailable: unsupported file extension '.{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },
}

/// A value or label that failed coercion. Never fatal: the value becomes
/// missing or the column is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// A value column whose label carries no usable year.
    InvalidYearLabel { label: String },
    /// Non-empty cells that did not parse as a finite number, per column.
    NonNumericValues { label: String, count: usize },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::InvalidYearLabel { label } => {
                write!(f, "column '{label}' has no year in its label; skipped")
            }
            ParseWarning::NonNumericValues { label, count } => {
                write!(f, "column '{label}': {count} non-numeric value(s) treated as missing")
            }
        }
    }
}

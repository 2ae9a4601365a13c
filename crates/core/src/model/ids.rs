use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when constructing a `BankId`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankIdError {
    #[error("bank identifier cannot be empty")]
    Empty,

    #[error("bank identifier contains a path component: {raw}")]
    PathTraversal { raw: String },
}

/// Identifier for a question bank.
///
/// Maps one-to-one onto the bank's file name stem. Identifiers containing
/// `..` or path separators are rejected so a bank id can never escape the
/// data directory.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankId(String);

impl BankId {
    /// Creates a validated `BankId`.
    ///
    /// # Errors
    ///
    /// Returns `BankIdError::Empty` for blank input and
    /// `BankIdError::PathTraversal` when the id contains `..`, `/` or `\`.
    pub fn new(raw: impl Into<String>) -> Result<Self, BankIdError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(BankIdError::Empty);
        }
        if raw.contains("..") || raw.contains('/') || raw.contains('\\') {
            return Err(BankIdError::PathTraversal { raw });
        }
        Ok(Self(raw))
    }

    /// Returns the underlying identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BankId({})", self.0)
    }
}

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BankId {
    type Err = BankIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_file_stem() {
        let id = BankId::new("Cardiologie (Février 2025)").unwrap();
        assert_eq!(id.as_str(), "Cardiologie (Février 2025)");
    }

    #[test]
    fn rejects_empty_id() {
        assert!(matches!(BankId::new("   "), Err(BankIdError::Empty)));
    }

    #[test]
    fn rejects_parent_dir_components() {
        let err = BankId::new("../etc/passwd").unwrap_err();
        assert!(matches!(err, BankIdError::PathTraversal { .. }));
    }

    #[test]
    fn rejects_path_separators() {
        assert!(BankId::new("a/b").is_err());
        assert!(BankId::new("a\\b").is_err());
    }

    #[test]
    fn round_trips_through_from_str() {
        let id: BankId = "pneumo".parse().unwrap();
        assert_eq!(id.to_string(), "pneumo");
    }
}

//! The Question Bank Store boundary.
//!
//! Banks are catalog entries backed by JSON question arrays. The store is
//! consumed through the [`BankStore`] trait object so the services layer can
//! run against the filesystem adapter or the in-memory one interchangeably.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use qcm_core::model::{BankId, BankIdError, Question, RawQuestion};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors surfaced by bank and progress storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("bank not found")]
    NotFound,

    #[error(transparent)]
    InvalidIdentifier(#[from] BankIdError),

    #[error("load error: {0}")]
    Load(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CATALOG ENTRIES ───────────────────────────────────────────────────────────
//

/// Catalog metadata for one question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankSummary {
    pub id: BankId,
    pub name: String,
    pub description: String,
    pub question_count: usize,
    pub category: String,
    pub years: Vec<String>,
    pub size_bytes: u64,
}

/// A search hit: a summary plus its ranking score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankMatch {
    pub summary: BankSummary,
    pub match_score: u32,
}

//
// ─── STORE CONTRACT ────────────────────────────────────────────────────────────
//

/// Catalog and question access for a set of banks.
#[async_trait]
pub trait BankStore: Send + Sync {
    /// List every bank with derived metadata.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the catalog itself cannot be read;
    /// individual unreadable banks degrade to stub entries instead.
    async fn list_banks(&self) -> Result<Vec<BankSummary>, StorageError>;

    /// List banks containing at least one question asked in `year`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the catalog cannot be read.
    async fn list_banks_by_year(&self, year: &str) -> Result<Vec<BankSummary>, StorageError>;

    /// Rank banks against a free-text query, best match first.
    ///
    /// Banks with no match are omitted; an empty result is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the catalog cannot be read.
    async fn search(&self, query: &str) -> Result<Vec<BankMatch>, StorageError>;

    /// Year labels available across the catalog, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the catalog cannot be read.
    async fn list_years(&self) -> Result<Vec<String>, StorageError>;

    /// Load a bank's normalized questions, optionally restricted to a year.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for a missing bank and
    /// `StorageError::Load` for malformed content.
    async fn get_questions(
        &self,
        id: &BankId,
        year: Option<&str>,
    ) -> Result<Vec<Question>, StorageError>;
}

//
// ─── METADATA DERIVATION ───────────────────────────────────────────────────────
//

pub(crate) const DEFAULT_DESCRIPTION: &str = "Fichier de questions";
pub(crate) const DEFAULT_CATEGORY: &str = "Général";

/// Derives a catalog summary from a bank's raw questions.
///
/// Title and category come from the first question (`Topic` / `Category`,
/// either casing), falling back to the id and "Général".
pub(crate) fn summarize_bank(id: &BankId, raw: &[RawQuestion], size_bytes: u64) -> BankSummary {
    let first = raw.first();
    let name = first
        .and_then(|q| q.topic.clone())
        .unwrap_or_else(|| id.as_str().to_string());
    let category = first
        .and_then(|q| q.category.clone())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    BankSummary {
        id: id.clone(),
        name,
        description: DEFAULT_DESCRIPTION.to_string(),
        question_count: raw.len(),
        category,
        years: years_of(raw),
        size_bytes,
    }
}

/// Placeholder summary for a bank whose file could not be read or parsed.
pub(crate) fn unreadable_bank(id: &BankId) -> BankSummary {
    BankSummary {
        id: id.clone(),
        name: id.as_str().to_string(),
        description: format!("{DEFAULT_DESCRIPTION} (erreur de lecture)"),
        question_count: 0,
        category: "Inconnu".to_string(),
        years: Vec::new(),
        size_bytes: 0,
    }
}

/// Unique `YearAsked` tags across a bank, in first-seen order.
pub(crate) fn years_of(raw: &[RawQuestion]) -> Vec<String> {
    let mut years = Vec::new();
    for question in raw {
        if let Some(year) = question.year_asked.as_deref() {
            if !year.is_empty() && !years.iter().any(|y| y == year) {
                years.push(year.to_string());
            }
        }
    }
    years
}

/// Builds the lowercased haystack a search query is counted against:
/// title, category, id, years, then every question's text, subtopic and
/// choice texts.
pub(crate) fn searchable_corpus(summary: &BankSummary, raw: &[RawQuestion]) -> String {
    let mut parts: Vec<String> = vec![
        summary.name.to_lowercase(),
        summary.category.to_lowercase(),
        summary.id.as_str().to_lowercase(),
        summary.description.to_lowercase(),
    ];
    parts.extend(summary.years.iter().map(|y| y.to_lowercase()));
    for question in raw {
        for field in [
            &question.question_text,
            &question.subtopic,
            &question.choice_a_text,
            &question.choice_b_text,
            &question.choice_c_text,
            &question.choice_d_text,
            &question.choice_e_text,
        ] {
            if let Some(text) = field {
                parts.push(text.to_lowercase());
            }
        }
    }
    parts.join(" ")
}

/// Counts occurrences of each whitespace-separated query term in the corpus.
#[must_use]
pub fn match_score(corpus: &str, query: &str) -> u32 {
    let query = query.to_lowercase();
    let mut score = 0_u32;
    for term in query.split_whitespace() {
        score += u32::try_from(corpus.matches(term).count()).unwrap_or(u32::MAX);
    }
    score
}

/// Sorts search hits by score descending, breaking ties by bank id.
pub(crate) fn rank_matches(mut matches: Vec<BankMatch>) -> Vec<BankMatch> {
    matches.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| a.summary.id.cmp(&b.summary.id))
    });
    matches
}

/// Year label embedded in a bank id, i.e. the parenthesized segment of the
/// original file name ("Cardiologie (Février 2025)" → "Février 2025").
pub(crate) fn year_label_of_id(id: &BankId) -> Option<String> {
    let raw = id.as_str();
    let open = raw.find('(')?;
    let close = raw[open + 1..].find(')')?;
    let label = &raw[open + 1..open + 1 + close];
    (!label.is_empty()).then(|| label.to_string())
}

/// First run of four consecutive digits in a year label, when present.
fn embedded_year(label: &str) -> Option<u32> {
    let bytes = label.as_bytes();
    bytes
        .windows(4)
        .find(|window| window.iter().all(u8::is_ascii_digit))
        .and_then(|window| std::str::from_utf8(window).ok())
        .and_then(|digits| digits.parse().ok())
}

/// Sorts year labels by embedded numeric year descending, falling back to
/// lexicographic order when either label has no 4-digit year.
pub(crate) fn sort_year_labels(mut labels: Vec<String>) -> Vec<String> {
    labels.sort_by(|a, b| match (embedded_year(a), embedded_year(b)) {
        (Some(a_year), Some(b_year)) => b_year.cmp(&a_year),
        _ => a.cmp(b),
    });
    labels
}

//
// ─── IN-MEMORY STORE ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
struct StoredBank {
    raw: Vec<RawQuestion>,
    size_bytes: u64,
}

/// Simple in-memory bank store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryBankStore {
    banks: Arc<Mutex<HashMap<BankId, StoredBank>>>,
}

impl InMemoryBankStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bank under the given id. The size is approximated from
    /// the question texts and only matters for catalog display.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Load` if the store lock is poisoned.
    pub fn insert_bank(&self, id: BankId, raw: Vec<RawQuestion>) -> Result<(), StorageError> {
        let size_bytes = raw
            .iter()
            .map(|q| {
                q.question_text.as_deref().map_or(0, str::len) as u64
                    + q.choice_a_text.as_deref().map_or(0, str::len) as u64
            })
            .sum();
        let mut guard = self
            .banks
            .lock()
            .map_err(|e| StorageError::Load(e.to_string()))?;
        guard.insert(id, StoredBank { raw, size_bytes });
        Ok(())
    }

    fn snapshot(&self) -> Result<Vec<(BankId, StoredBank)>, StorageError> {
        let guard = self
            .banks
            .lock()
            .map_err(|e| StorageError::Load(e.to_string()))?;
        let mut banks: Vec<_> = guard
            .iter()
            .map(|(id, bank)| (id.clone(), bank.clone()))
            .collect();
        banks.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(banks)
    }
}

#[async_trait]
impl BankStore for InMemoryBankStore {
    async fn list_banks(&self) -> Result<Vec<BankSummary>, StorageError> {
        Ok(self
            .snapshot()?
            .iter()
            .map(|(id, bank)| summarize_bank(id, &bank.raw, bank.size_bytes))
            .collect())
    }

    async fn list_banks_by_year(&self, year: &str) -> Result<Vec<BankSummary>, StorageError> {
        let mut summaries = Vec::new();
        for (id, bank) in self.snapshot()? {
            let mut summary = summarize_bank(&id, &bank.raw, bank.size_bytes);
            if !summary.years.iter().any(|y| y == year) {
                continue;
            }
            let year_count = bank
                .raw
                .iter()
                .filter(|q| q.year_asked.as_deref() == Some(year))
                .count();
            summary.description = format!("{year_count} questions pour l'année {year}");
            summaries.push(summary);
        }
        Ok(summaries)
    }

    async fn search(&self, query: &str) -> Result<Vec<BankMatch>, StorageError> {
        let mut matches = Vec::new();
        for (id, bank) in self.snapshot()? {
            let summary = summarize_bank(&id, &bank.raw, bank.size_bytes);
            let score = match_score(&searchable_corpus(&summary, &bank.raw), query);
            if score > 0 {
                matches.push(BankMatch {
                    summary,
                    match_score: score,
                });
            }
        }
        Ok(rank_matches(matches))
    }

    async fn list_years(&self) -> Result<Vec<String>, StorageError> {
        let mut labels = Vec::new();
        for (id, _) in self.snapshot()? {
            if let Some(label) = year_label_of_id(&id) {
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
        }
        Ok(sort_year_labels(labels))
    }

    async fn get_questions(
        &self,
        id: &BankId,
        year: Option<&str>,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .banks
            .lock()
            .map_err(|e| StorageError::Load(e.to_string()))?;
        let bank = guard.get(id).ok_or(StorageError::NotFound)?;
        Ok(bank
            .raw
            .iter()
            .filter(|q| year.is_none_or(|y| q.year_asked.as_deref() == Some(y)))
            .cloned()
            .map(Question::from_raw)
            .collect())
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

//! Filesystem-backed bank store: one JSON question array per bank, all in a
//! single data directory. The bank id is the file name stem.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use qcm_core::model::{BankId, Question, RawQuestion};

use crate::bank::{
    BankMatch, BankStore, BankSummary, StorageError, match_score, rank_matches,
    searchable_corpus, sort_year_labels, summarize_bank, unreadable_bank, year_label_of_id,
};

/// Bank store over a directory of `.json` files.
#[derive(Debug, Clone)]
pub struct FsBankStore {
    dir: PathBuf,
}

impl FsBankStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn bank_path(&self, id: &BankId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }

    /// Ids of every `.json` file in the data directory, sorted for
    /// deterministic catalog order.
    async fn bank_ids(&self) -> Result<Vec<BankId>, StorageError> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // File names are under our control on disk; one that still fails
            // id validation is simply not a bank.
            if let Ok(id) = BankId::new(stem) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn read_raw(&self, id: &BankId) -> Result<(Vec<RawQuestion>, u64), StorageError> {
        let path = self.bank_path(id);
        let content = tokio::fs::read_to_string(&path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StorageError::NotFound
            } else {
                StorageError::Io(err)
            }
        })?;
        let size_bytes = content.len() as u64;
        let raw: Vec<RawQuestion> = serde_json::from_str(&content)
            .map_err(|err| StorageError::Load(err.to_string()))?;
        Ok((raw, size_bytes))
    }
}

#[async_trait]
impl BankStore for FsBankStore {
    async fn list_banks(&self) -> Result<Vec<BankSummary>, StorageError> {
        let mut summaries = Vec::new();
        for id in self.bank_ids().await? {
            // An unreadable file still gets a catalog entry so the user can
            // see it exists and why it is unusable.
            match self.read_raw(&id).await {
                Ok((raw, size_bytes)) => summaries.push(summarize_bank(&id, &raw, size_bytes)),
                Err(_) => summaries.push(unreadable_bank(&id)),
            }
        }
        Ok(summaries)
    }

    async fn list_banks_by_year(&self, year: &str) -> Result<Vec<BankSummary>, StorageError> {
        let mut summaries = Vec::new();
        for id in self.bank_ids().await? {
            let Ok((raw, size_bytes)) = self.read_raw(&id).await else {
                continue;
            };
            let mut summary = summarize_bank(&id, &raw, size_bytes);
            if !summary.years.iter().any(|y| y == year) {
                continue;
            }
            let year_count = raw
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
        for id in self.bank_ids().await? {
            let Ok((raw, size_bytes)) = self.read_raw(&id).await else {
                continue;
            };
            let summary = summarize_bank(&id, &raw, size_bytes);
            let score = match_score(&searchable_corpus(&summary, &raw), query);
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
        for id in self.bank_ids().await? {
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
        let (raw, _) = self.read_raw(id).await?;
        Ok(raw
            .into_iter()
            .filter(|q| year.is_none_or(|y| q.year_asked.as_deref() == Some(y)))
            .map(Question::from_raw)
            .collect())
    }
}

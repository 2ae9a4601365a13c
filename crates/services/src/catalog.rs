//! Catalog browsing and search orchestration.
//!
//! Listing and year queries pass straight through to the bank store. Search
//! goes through [`SearchCoordinator`], which debounces rapid queries and
//! applies a last-request-wins policy: in-flight requests are not canceled,
//! but a response that has been superseded is discarded instead of applied.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use storage::bank::{BankMatch, BankStore, BankSummary};

use crate::error::CatalogError;

/// Quiet period coalescing rapid keystrokes into one search request.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Read-only catalog queries over the bank store.
#[derive(Clone)]
pub struct CatalogService {
    banks: Arc<dyn BankStore>,
}

impl CatalogService {
    #[must_use]
    pub fn new(banks: Arc<dyn BankStore>) -> Self {
        Self { banks }
    }

    /// Every bank with derived metadata.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::List` when the store cannot be read.
    pub async fn list_banks(&self) -> Result<Vec<BankSummary>, CatalogError> {
        self.banks.list_banks().await.map_err(CatalogError::List)
    }

    /// Banks containing questions asked in the given year.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::List` when the store cannot be read.
    pub async fn list_banks_by_year(&self, year: &str) -> Result<Vec<BankSummary>, CatalogError> {
        self.banks
            .list_banks_by_year(year)
            .await
            .map_err(CatalogError::List)
    }

    /// Year labels available for filtering, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Years` when the store cannot be read.
    pub async fn list_years(&self) -> Result<Vec<String>, CatalogError> {
        self.banks.list_years().await.map_err(CatalogError::Years)
    }

    /// One-shot ranked search, without debouncing.
    ///
    /// An empty result is an empty vec, not an error.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Search` when the store cannot be read.
    pub async fn search(&self, query: &str) -> Result<Vec<BankMatch>, CatalogError> {
        self.banks.search(query).await.map_err(CatalogError::Search)
    }
}

/// Debounced, last-request-wins search over the bank store.
///
/// Each call takes a monotonically increasing ticket. The call sleeps for the
/// debounce window, then runs only if it still holds the newest ticket, and
/// its response is applied only if that is still true afterwards. A stale
/// call resolves to `Ok(None)`.
#[derive(Clone)]
pub struct SearchCoordinator {
    banks: Arc<dyn BankStore>,
    latest: Arc<AtomicU64>,
    debounce: Duration,
}

impl SearchCoordinator {
    #[must_use]
    pub fn new(banks: Arc<dyn BankStore>) -> Self {
        Self {
            banks,
            latest: Arc::new(AtomicU64::new(0)),
            debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }

    /// Overrides the debounce window (tests use zero).
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Runs a debounced search; `Ok(None)` means a newer query superseded
    /// this one and its result must not be displayed.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Search` when the store cannot be read.
    pub async fn search(&self, query: &str) -> Result<Option<Vec<BankMatch>>, CatalogError> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if self.latest.load(Ordering::SeqCst) != ticket {
            log::debug!("search '{query}' coalesced before dispatch");
            return Ok(None);
        }

        let matches = self
            .banks
            .search(query)
            .await
            .map_err(CatalogError::Search)?;

        // The request was not canceled mid-flight; its response just loses.
        if self.latest.load(Ordering::SeqCst) != ticket {
            log::debug!("search '{query}' superseded, discarding {} hits", matches.len());
            return Ok(None);
        }
        Ok(Some(matches))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

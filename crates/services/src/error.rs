//! Shared error types for the services crate.
//!
//! Store-facing failures are caught here and surfaced to the user through
//! `user_message()`, which carries the French wording shown in the app.
//! The session state machine itself never errors: blocked navigation and
//! other expected flow control travel as return values.

use thiserror::Error;

use storage::bank::StorageError;

/// Errors emitted by `CatalogService` and `SearchCoordinator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("failed to list banks")]
    List(#[source] StorageError),
    #[error("failed to search banks")]
    Search(#[source] StorageError),
    #[error("failed to list years")]
    Years(#[source] StorageError),
}

impl CatalogError {
    /// User-facing, localized description of the failure.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            CatalogError::List(_) => "Impossible de lister les fichiers",
            CatalogError::Search(_) => "Impossible de rechercher les fichiers",
            CatalogError::Years(_) => "Impossible de récupérer les années disponibles",
        }
    }
}

/// Errors emitted by `QuizLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("bank contains no questions for this selection")]
    Empty,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QuizError {
    /// User-facing, localized description of the failure.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            QuizError::Empty => "Aucune question disponible pour cette sélection",
            QuizError::Storage(StorageError::NotFound) => "Fichier de questions non trouvé",
            QuizError::Storage(StorageError::InvalidIdentifier(_)) => "Nom de fichier invalide",
            QuizError::Storage(StorageError::Load(_)) => {
                "Impossible de charger le fichier de questions"
            }
            QuizError::Storage(_) => "Impossible de charger le fichier de questions",
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

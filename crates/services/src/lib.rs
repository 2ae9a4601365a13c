#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod quiz;

pub use qcm_core::Clock;

pub use catalog::{CatalogService, SearchCoordinator};
pub use error::{CatalogError, QuizError};
pub use quiz::{QuizLoopService, QuizSession};

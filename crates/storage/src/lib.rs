#![forbid(unsafe_code)]

pub mod bank;
pub mod fs;
pub mod progress;

pub use bank::{BankMatch, BankStore, BankSummary, InMemoryBankStore, StorageError};
pub use fs::FsBankStore;
pub use progress::{
    FileProgressStore, InMemoryProgressStore, MASTERY_KEY, MasterySnapshot, MasteryStore,
    ProgressStore,
};

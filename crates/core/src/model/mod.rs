mod answer;
mod choice;
mod ids;
mod question;

pub use answer::AnswerSet;
pub use choice::Choice;
pub use ids::{BankId, BankIdError};
pub use question::{ChoiceId, ChoiceSlot, Correctness, ParseChoiceIdError, Question, RawQuestion};

#[cfg(test)]
pub(crate) use question::test_support;

//! Content fingerprint scoping persisted mastery to its bank.

use crate::model::Question;

/// Joins every question prompt with `|` into a cheap identity string.
///
/// A missing prompt contributes an empty segment. This is a content check,
/// not a hash: two banks sharing identical prompt texts collide, which is an
/// accepted limitation.
#[must_use]
pub fn bank_fingerprint(questions: &[Question]) -> String {
    questions
        .iter()
        .map(|q| q.prompt().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("|")
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

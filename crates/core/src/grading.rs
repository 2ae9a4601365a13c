//! Pure multi-select grading.
//!
//! A verdict is set equality between the user's selection and the ground-truth
//! correct ids; there is no partial credit. A question with no explicitly
//! correct choice and an empty selection grades `true` — authored banks
//! missing their correctness flags rely on this, so the behavior is kept
//! as-is rather than repaired here.

use std::collections::BTreeSet;

use crate::model::{AnswerSet, ChoiceId, Question};

/// Ids of the used slots whose correctness flag is exactly `Correct`.
///
/// Unused (empty-text) slots never count, whatever their flag says.
#[must_use]
pub fn correct_ids(question: &Question) -> BTreeSet<ChoiceId> {
    question
        .slots()
        .filter(|(_, slot)| slot.is_used() && slot.correctness.is_correct())
        .map(|(id, _)| id)
        .collect()
}

/// Grades a multi-select answer against the question's ground truth.
///
/// Pure over its inputs; malformed or absent flags degrade to "not correct"
/// and never fail.
#[must_use]
pub fn grade_question(question: &Question, selected: &AnswerSet) -> bool {
    *selected.ids() == correct_ids(question)
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

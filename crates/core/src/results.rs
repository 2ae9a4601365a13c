//! Reduces a finished session into a score summary.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::grading::grade_question;
use crate::model::{AnswerSet, ChoiceId, Question};

/// Graded record for one question, in bank order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub selected: Vec<ChoiceId>,
    pub verdict: bool,
}

/// Summary of a completed quiz.
///
/// A view computed on demand from the session state and the question bank;
/// never stored independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    pub total_questions: usize,
    pub correct_answers: usize,
    /// Rounded percentage in `0..=100`; 0 for an empty bank.
    pub score: u8,
    pub per_question: Vec<AnswerRecord>,
}

impl QuizResult {
    /// True when the bank had no questions, in which case `score` is the
    /// 0-by-convention placeholder rather than a real percentage.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_questions == 0
    }
}

/// Grades every question in order and accumulates the score.
///
/// Unanswered questions grade against an empty selection (which, per the
/// grading rules, is correct only for a question with no correct choices).
#[must_use]
pub fn summarize(questions: &[Question], answers: &BTreeMap<usize, AnswerSet>) -> QuizResult {
    let empty = AnswerSet::new();
    let mut correct_answers = 0;
    let mut per_question = Vec::with_capacity(questions.len());

    for (question_index, question) in questions.iter().enumerate() {
        let selected = answers.get(&question_index).unwrap_or(&empty);
        let verdict = grade_question(question, selected);
        if verdict {
            correct_answers += 1;
        }
        per_question.push(AnswerRecord {
            question_index,
            selected: selected.to_vec(),
            verdict,
        });
    }

    let total_questions = questions.len();
    let score = if total_questions == 0 {
        0
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded =
            (100.0 * correct_answers as f64 / total_questions as f64).round() as u8;
        rounded
    };

    QuizResult {
        total_questions,
        correct_answers,
        score,
        per_question,
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

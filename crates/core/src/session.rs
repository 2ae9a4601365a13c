//! The in-progress quiz state machine.
//!
//! All transitions are total functions over valid state: flow control (like
//! the "answered but not yet verified" gate on [`SessionState::advance`]) is
//! reported through return values, never through errors. The machine owns no
//! questions and does no IO; `services::QuizSession` binds it to a loaded
//! bank and `services::QuizLoopService` persists the mastery set.

use std::collections::{BTreeMap, BTreeSet};

use crate::grading::grade_question;
use crate::model::{AnswerSet, ChoiceId, Question};
use crate::presentation::PresentationMode;

//
// ─── OUTCOMES AND SNAPSHOTS ────────────────────────────────────────────────────
//

/// Lifecycle phase of a loaded quiz.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuizPhase {
    /// Stepping through questions; choices are shuffled.
    #[default]
    Practicing,
    /// Finished; detailed results shown in canonical choice order.
    Reviewing,
}

/// Result of a sequential [`SessionState::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved to the next question.
    Advanced,
    /// Blocked: the current answer must be verified first.
    NeedsVerification,
    /// Was on the last question; the quiz is now in `Reviewing`.
    Completed,
}

/// Navigator badge for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Answered,
    Marked,
    Unanswered,
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// Per-session quiz state.
///
/// Invariants:
/// - `current_index` stays in `[0, question_count)`;
/// - an index is never in both `mastered` and `unvalidated_incorrect`;
/// - `marked_for_review` is advisory and may overlap either set;
/// - only `mastered` survives [`SessionState::restart`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    question_count: usize,
    current_index: usize,
    answers: BTreeMap<usize, AnswerSet>,
    marked_for_review: BTreeSet<usize>,
    unvalidated_incorrect: BTreeSet<usize>,
    mastered: BTreeSet<usize>,
    verified_current: bool,
    phase: QuizPhase,
}

impl SessionState {
    /// Fresh state at question 0 with every collection empty.
    #[must_use]
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count,
            current_index: 0,
            answers: BTreeMap::new(),
            marked_for_review: BTreeSet::new(),
            unvalidated_incorrect: BTreeSet::new(),
            mastered: BTreeSet::new(),
            verified_current: false,
            phase: QuizPhase::Practicing,
        }
    }

    // ─── Queries ───────────────────────────────────────────────────────────

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == QuizPhase::Reviewing
    }

    #[must_use]
    pub fn verified_current(&self) -> bool {
        self.verified_current
    }

    /// Presentation mode implied by the current phase.
    #[must_use]
    pub fn presentation_mode(&self) -> PresentationMode {
        match self.phase {
            QuizPhase::Practicing => PresentationMode::Practice,
            QuizPhase::Reviewing => PresentationMode::Review,
        }
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<&AnswerSet> {
        self.answers.get(&index)
    }

    /// All answer sets keyed by question index, for the results aggregator.
    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, AnswerSet> {
        &self.answers
    }

    fn answer_is_empty(&self, index: usize) -> bool {
        self.answers.get(&index).is_none_or(AnswerSet::is_empty)
    }

    #[must_use]
    pub fn marked_for_review(&self) -> &BTreeSet<usize> {
        &self.marked_for_review
    }

    #[must_use]
    pub fn unvalidated_incorrect(&self) -> &BTreeSet<usize> {
        &self.unvalidated_incorrect
    }

    #[must_use]
    pub fn mastered(&self) -> &BTreeSet<usize> {
        &self.mastered
    }

    /// Navigator badge: answered wins over marked, marked over unanswered.
    #[must_use]
    pub fn question_status(&self, index: usize) -> QuestionStatus {
        if !self.answer_is_empty(index) {
            QuestionStatus::Answered
        } else if self.marked_for_review.contains(&index) {
            QuestionStatus::Marked
        } else {
            QuestionStatus::Unanswered
        }
    }

    /// Number of questions with a non-empty answer set.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.values().filter(|a| !a.is_empty()).count()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = self.answered_count();
        SessionProgress {
            total: self.question_count,
            answered,
            remaining: self.question_count.saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    // ─── Transitions ───────────────────────────────────────────────────────

    /// Adds or removes a choice from a question's answer set.
    ///
    /// Touching the current question invalidates its verification: a changed
    /// answer must be re-verified before sequential advance.
    pub fn toggle_choice(&mut self, index: usize, id: ChoiceId, selected: bool) {
        if index >= self.question_count {
            return;
        }
        self.answers.entry(index).or_default().set_selected(id, selected);
        if index == self.current_index {
            self.verified_current = false;
        }
    }

    /// Grades the question's current answer set and classifies the index.
    ///
    /// Returns `None` without touching any state when the answer set is empty
    /// (nothing to verify). Otherwise returns the verdict, marks the current
    /// question verified, and moves the index into exactly one of mastered /
    /// unvalidated-incorrect.
    pub fn verify(&mut self, index: usize, question: &Question) -> Option<bool> {
        if index >= self.question_count || self.answer_is_empty(index) {
            return None;
        }

        let answers = self.answers.get(&index).cloned().unwrap_or_default();
        let verdict = grade_question(question, &answers);

        if index == self.current_index {
            self.verified_current = true;
        }
        if verdict {
            self.unvalidated_incorrect.remove(&index);
            self.mastered.insert(index);
        } else {
            self.mastered.remove(&index);
            self.unvalidated_incorrect.insert(index);
        }

        Some(verdict)
    }

    /// Dismisses the "checked and wrong" badge for a question after the user
    /// has read the feedback.
    pub fn validate_incorrect(&mut self, index: usize) {
        self.unvalidated_incorrect.remove(&index);
    }

    /// Moves forward one question.
    ///
    /// An answered-but-unverified current question blocks with
    /// [`AdvanceOutcome::NeedsVerification`]; skipping an unanswered question
    /// is always allowed. Advancing from the last question completes the quiz.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if !self.verified_current && !self.answer_is_empty(self.current_index) {
            return AdvanceOutcome::NeedsVerification;
        }

        self.verified_current = false;
        if self.current_index + 1 < self.question_count {
            self.current_index += 1;
            AdvanceOutcome::Advanced
        } else {
            self.phase = QuizPhase::Reviewing;
            AdvanceOutcome::Completed
        }
    }

    /// Moves back one question; never gated. Returns false at question 0.
    pub fn retreat(&mut self) -> bool {
        if self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        self.verified_current = false;
        true
    }

    /// Jumps straight to a question, bypassing the verification gate.
    ///
    /// Only sequential `advance` is gated; the index map is not. Returns
    /// false for an out-of-range index.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.question_count {
            return false;
        }
        self.current_index = index;
        self.verified_current = false;
        true
    }

    /// Toggles the advisory review flag; no effect on grading or navigation.
    pub fn toggle_review_flag(&mut self, index: usize) {
        if index >= self.question_count {
            return;
        }
        if !self.marked_for_review.remove(&index) {
            self.marked_for_review.insert(index);
        }
    }

    /// Ends the quiz unconditionally, whatever has or has not been verified.
    pub fn finish(&mut self) {
        self.phase = QuizPhase::Reviewing;
    }

    /// Back to question 0 with answers and flags cleared; mastery is kept.
    pub fn restart(&mut self) {
        self.current_index = 0;
        self.answers.clear();
        self.marked_for_review.clear();
        self.unvalidated_incorrect.clear();
        self.verified_current = false;
        self.phase = QuizPhase::Practicing;
    }

    /// Forgets every mastered question. The persisted copy is erased by the
    /// quiz loop service.
    pub fn clear_mastery(&mut self) {
        self.mastered.clear();
    }

    /// Seeds the mastered set from a persisted snapshot, dropping any index
    /// outside the loaded bank.
    pub fn restore_mastery(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.mastered = indices
            .into_iter()
            .filter(|index| *index < self.question_count)
            .collect();
        self.mastered
            .iter()
            .for_each(|index| {
                self.unvalidated_incorrect.remove(index);
            });
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::question_with_slots;

    fn question() -> Question {
        question_with_slots(&[("a", Some(true)), ("b", Some(false)), ("c", None)])
    }

    #[test]
    fn advance_blocks_until_answer_is_verified() {
        let mut state = SessionState::new(3);
        state.toggle_choice(0, ChoiceId::A, true);

        assert_eq!(state.advance(), AdvanceOutcome::NeedsVerification);
        assert_eq!(state.current_index(), 0);

        let verdict = state.verify(0, &question()).unwrap();
        assert!(verdict);
        assert_eq!(state.advance(), AdvanceOutcome::Advanced);
        assert_eq!(state.current_index(), 1);
    }

    #[test]
    fn skipping_an_unanswered_question_is_allowed() {
        let mut state = SessionState::new(2);
        assert_eq!(state.advance(), AdvanceOutcome::Advanced);
        assert_eq!(state.current_index(), 1);
    }

    #[test]
    fn changing_an_answer_invalidates_verification() {
        let mut state = SessionState::new(1);
        state.toggle_choice(0, ChoiceId::A, true);
        state.verify(0, &question());
        assert!(state.verified_current());

        state.toggle_choice(0, ChoiceId::B, true);
        assert!(!state.verified_current());
        assert_eq!(state.advance(), AdvanceOutcome::NeedsVerification);
    }

    #[test]
    fn verify_on_empty_answer_is_a_no_op() {
        let mut state = SessionState::new(1);
        assert_eq!(state.verify(0, &question()), None);
        assert!(!state.verified_current());
        assert!(state.mastered().is_empty());
        assert!(state.unvalidated_incorrect().is_empty());
    }

    #[test]
    fn verify_classifies_into_exactly_one_set() {
        let mut state = SessionState::new(1);
        state.toggle_choice(0, ChoiceId::B, true);
        assert_eq!(state.verify(0, &question()), Some(false));
        assert!(state.unvalidated_incorrect().contains(&0));
        assert!(!state.mastered().contains(&0));

        // Fix the answer; the index must move over, not be duplicated.
        state.toggle_choice(0, ChoiceId::B, false);
        state.toggle_choice(0, ChoiceId::A, true);
        assert_eq!(state.verify(0, &question()), Some(true));
        assert!(state.mastered().contains(&0));
        assert!(!state.unvalidated_incorrect().contains(&0));
    }

    #[test]
    fn validate_incorrect_dismisses_the_badge() {
        let mut state = SessionState::new(1);
        state.toggle_choice(0, ChoiceId::B, true);
        state.verify(0, &question());
        assert!(state.unvalidated_incorrect().contains(&0));

        state.validate_incorrect(0);
        assert!(state.unvalidated_incorrect().is_empty());
    }

    #[test]
    fn jump_bypasses_the_verification_gate() {
        let mut state = SessionState::new(3);
        state.toggle_choice(0, ChoiceId::A, true);
        assert_eq!(state.advance(), AdvanceOutcome::NeedsVerification);

        assert!(state.jump_to(2));
        assert_eq!(state.current_index(), 2);
        assert!(!state.jump_to(3));
    }

    #[test]
    fn retreat_is_never_gated() {
        let mut state = SessionState::new(2);
        assert!(!state.retreat());
        state.jump_to(1);
        state.toggle_choice(1, ChoiceId::A, true);
        assert!(state.retreat());
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn advancing_from_the_last_question_completes() {
        let mut state = SessionState::new(1);
        assert_eq!(state.advance(), AdvanceOutcome::Completed);
        assert!(state.is_complete());
        assert_eq!(state.presentation_mode(), PresentationMode::Review);
    }

    #[test]
    fn finish_is_always_allowed() {
        let mut state = SessionState::new(5);
        state.toggle_choice(0, ChoiceId::A, true);
        state.finish();
        assert!(state.is_complete());
    }

    #[test]
    fn restart_preserves_mastery_and_clears_the_rest() {
        let mut state = SessionState::new(3);
        state.toggle_choice(0, ChoiceId::A, true);
        state.verify(0, &question());
        state.advance();
        state.toggle_choice(1, ChoiceId::B, true);
        state.verify(1, &question());
        state.toggle_review_flag(2);
        state.finish();

        let mastered_before = state.mastered().clone();
        state.restart();

        assert_eq!(state.current_index(), 0);
        assert_eq!(state.phase(), QuizPhase::Practicing);
        assert_eq!(state.answered_count(), 0);
        assert!(state.marked_for_review().is_empty());
        assert!(state.unvalidated_incorrect().is_empty());
        assert!(!state.verified_current());
        assert_eq!(state.mastered(), &mastered_before);
        assert!(state.mastered().contains(&0));
    }

    #[test]
    fn clear_mastery_empties_the_set() {
        let mut state = SessionState::new(2);
        state.restore_mastery([0, 1]);
        state.clear_mastery();
        assert!(state.mastered().is_empty());
    }

    #[test]
    fn restore_mastery_drops_out_of_range_indices() {
        let mut state = SessionState::new(2);
        state.restore_mastery([0, 5, 1]);
        assert_eq!(state.mastered().len(), 2);
    }

    #[test]
    fn question_status_prefers_answered_over_marked() {
        let mut state = SessionState::new(2);
        state.toggle_review_flag(0);
        assert_eq!(state.question_status(0), QuestionStatus::Marked);

        state.toggle_choice(0, ChoiceId::A, true);
        assert_eq!(state.question_status(0), QuestionStatus::Answered);
        assert_eq!(state.question_status(1), QuestionStatus::Unanswered);

        // Unchecking back to empty drops the answered badge again.
        state.toggle_choice(0, ChoiceId::A, false);
        assert_eq!(state.question_status(0), QuestionStatus::Marked);
    }

    #[test]
    fn progress_counts_non_empty_answers() {
        let mut state = SessionState::new(3);
        state.toggle_choice(0, ChoiceId::A, true);
        state.toggle_choice(2, ChoiceId::B, true);
        let progress = state.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 2);
        assert_eq!(progress.remaining, 1);
        assert!(!progress.is_complete);
    }
}

//! Quiz session orchestration.
//!
//! [`QuizSession`] binds a loaded bank to the core state machine and caches
//! the display order of the current question's choices: the order is drawn
//! once per question entry (and on mode change), so unrelated state changes
//! like toggling a choice never reshuffle what is on screen.
//! [`QuizLoopService`] starts sessions and persists the mastery set
//! write-through after every verification.

use std::sync::Arc;

use qcm_core::model::{AnswerSet, BankId, Choice, ChoiceId, Question};
use qcm_core::results::QuizResult;
use qcm_core::session::{AdvanceOutcome, SessionState};
use qcm_core::{Clock, bank_fingerprint, presentation_order, summarize};
use storage::bank::{BankStore, StorageError};
use storage::progress::{MasterySnapshot, MasteryStore, ProgressStore};

use crate::error::QuizError;

//
// ─── QUIZ SESSION ──────────────────────────────────────────────────────────────
//

/// A bank loaded for practice: questions, state machine, and the cached
/// on-screen choice order for the current question.
#[derive(Debug)]
pub struct QuizSession {
    bank_id: BankId,
    questions: Vec<Question>,
    fingerprint: String,
    state: SessionState,
    display_order: Vec<ChoiceId>,
}

impl QuizSession {
    pub(crate) fn new(
        bank_id: BankId,
        questions: Vec<Question>,
        restored_mastery: Vec<usize>,
    ) -> Self {
        let mut state = SessionState::new(questions.len());
        state.restore_mastery(restored_mastery);
        let mut session = Self {
            bank_id,
            questions,
            fingerprint: String::new(),
            state,
            display_order: Vec::new(),
        };
        session.fingerprint = bank_fingerprint(&session.questions);
        session.refresh_display_order();
        session
    }

    // ─── Queries ───────────────────────────────────────────────────────────

    #[must_use]
    pub fn bank_id(&self) -> &BankId {
        &self.bank_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.state.current_index())
    }

    /// Ids of the current question's choices in on-screen order.
    #[must_use]
    pub fn display_order(&self) -> &[ChoiceId] {
        &self.display_order
    }

    /// The current question's choices in on-screen order.
    #[must_use]
    pub fn current_choices(&self) -> Vec<Choice> {
        let Some(question) = self.current_question() else {
            return Vec::new();
        };
        let canonical = question.choices();
        self.display_order
            .iter()
            .filter_map(|id| canonical.iter().find(|c| c.id == *id).cloned())
            .collect()
    }

    /// The current question's answer set (empty when untouched).
    #[must_use]
    pub fn current_answer(&self) -> AnswerSet {
        self.state
            .answer(self.state.current_index())
            .cloned()
            .unwrap_or_default()
    }

    // ─── Transitions ───────────────────────────────────────────────────────

    /// Toggles a choice on the current question. Deliberately does not touch
    /// the display order.
    pub fn toggle_choice(&mut self, id: ChoiceId, selected: bool) {
        self.state
            .toggle_choice(self.state.current_index(), id, selected);
    }

    pub(crate) fn verify_current(&mut self) -> Option<bool> {
        let index = self.state.current_index();
        let question = self.questions.get(index)?;
        self.state.verify(index, question)
    }

    pub fn advance(&mut self) -> AdvanceOutcome {
        let outcome = self.state.advance();
        match outcome {
            AdvanceOutcome::Advanced | AdvanceOutcome::Completed => {
                self.refresh_display_order();
            }
            AdvanceOutcome::NeedsVerification => {}
        }
        outcome
    }

    pub fn retreat(&mut self) -> bool {
        let moved = self.state.retreat();
        if moved {
            self.refresh_display_order();
        }
        moved
    }

    pub fn jump_to(&mut self, index: usize) -> bool {
        let moved = self.state.jump_to(index);
        if moved {
            self.refresh_display_order();
        }
        moved
    }

    pub fn toggle_review_flag(&mut self, index: usize) {
        self.state.toggle_review_flag(index);
    }

    pub fn validate_incorrect(&mut self, index: usize) {
        self.state.validate_incorrect(index);
    }

    pub fn finish(&mut self) {
        self.state.finish();
        self.refresh_display_order();
    }

    pub fn restart(&mut self) {
        self.state.restart();
        self.refresh_display_order();
    }

    pub(crate) fn clear_mastery(&mut self) {
        self.state.clear_mastery();
    }

    /// Reduces the session into its score summary.
    #[must_use]
    pub fn results(&self) -> QuizResult {
        summarize(&self.questions, self.state.answers())
    }

    /// Draws a fresh display order for the current question and mode.
    ///
    /// Called on every question entry and phase change, never on toggles.
    fn refresh_display_order(&mut self) {
        let mode = self.state.presentation_mode();
        let choices = self
            .current_question()
            .map(Question::choices)
            .unwrap_or_default();
        self.display_order = presentation_order(&choices, mode, &mut rand::rng());
    }
}

//
// ─── QUIZ LOOP SERVICE ─────────────────────────────────────────────────────────
//

/// Starts quiz sessions and owns mastery persistence.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    banks: Arc<dyn BankStore>,
    mastery: MasteryStore,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, banks: Arc<dyn BankStore>, progress: Arc<dyn ProgressStore>) -> Self {
        Self {
            clock,
            banks,
            mastery: MasteryStore::new(progress),
        }
    }

    /// Loads a bank and opens a fresh session at question 0, restoring the
    /// persisted mastery set when its fingerprint matches the loaded bank.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` when the bank (or the year selection)
    /// contains no questions, and `QuizError::Storage` for load failures.
    pub async fn start_quiz(
        &self,
        id: &BankId,
        year: Option<&str>,
    ) -> Result<QuizSession, QuizError> {
        let questions = self.banks.get_questions(id, year).await?;
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }

        let fingerprint = bank_fingerprint(&questions);
        let restored = self.mastery.load(&fingerprint).await?;
        log::info!(
            "bank '{id}' loaded: {} questions, {} mastered restored",
            questions.len(),
            restored.len()
        );

        Ok(QuizSession::new(id.clone(), questions, restored))
    }

    /// Starts a quiz from a user-supplied bank name.
    ///
    /// # Errors
    ///
    /// Rejects names failing [`BankId`] validation (empty, `..` or path
    /// separators) as `StorageError::InvalidIdentifier` before any storage
    /// access; otherwise behaves like [`Self::start_quiz`].
    pub async fn start_quiz_named(
        &self,
        raw: &str,
        year: Option<&str>,
    ) -> Result<QuizSession, QuizError> {
        let id = BankId::new(raw).map_err(StorageError::from)?;
        self.start_quiz(&id, year).await
    }

    /// Verifies the current question and persists the updated mastery set.
    ///
    /// `Ok(None)` means there was nothing to verify (empty answer set).
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` when persisting mastery fails; the
    /// in-memory verdict has been applied regardless.
    pub async fn verify_current(
        &self,
        session: &mut QuizSession,
    ) -> Result<Option<bool>, QuizError> {
        let verdict = session.verify_current();
        if verdict.is_some() {
            self.persist_mastery(session).await?;
        }
        Ok(verdict)
    }

    /// Forgets mastered questions, both in the session and on disk.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` when erasing the persisted copy fails.
    pub async fn clear_mastery(&self, session: &mut QuizSession) -> Result<(), QuizError> {
        session.clear_mastery();
        self.mastery.clear().await?;
        Ok(())
    }

    async fn persist_mastery(&self, session: &QuizSession) -> Result<(), QuizError> {
        let snapshot = MasterySnapshot {
            bank_fingerprint: session.fingerprint().to_string(),
            mastered_question_indices: session.state().mastered().iter().copied().collect(),
            saved_at: self.clock.now(),
        };
        self.mastery.save(&snapshot).await?;
        Ok(())
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

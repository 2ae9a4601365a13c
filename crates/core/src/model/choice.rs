use crate::model::question::{ChoiceId, Correctness, Question};

/// Presentable view of one used choice slot.
///
/// Recomputed from the owning [`Question`] whenever the question or the
/// presentation mode changes; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: ChoiceId,
    pub text: String,
    pub correctness: Correctness,
    pub explanation: String,
}

impl Question {
    /// Projects the used slots into [`Choice`] views, canonical A→E order.
    ///
    /// Empty-text slots are filtered out, so a returned choice never has
    /// blank text.
    #[must_use]
    pub fn choices(&self) -> Vec<Choice> {
        self.slots()
            .filter(|(_, slot)| slot.is_used())
            .map(|(id, slot)| Choice {
                id,
                text: slot.text.clone(),
                correctness: slot.correctness,
                explanation: slot.explanation.clone(),
            })
            .collect()
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::model::question::test_support::question_with_slots;
    use crate::model::question::{ChoiceId, Question};

    #[test]
    fn choices_skip_blank_slots_and_keep_order() {
        let q = question_with_slots(&[
            ("premier", Some(true)),
            ("", None),
            ("troisième", Some(false)),
            ("  ", None),
            ("cinquième", None),
        ]);

        let choices = q.choices();
        let ids: Vec<_> = choices.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![ChoiceId::A, ChoiceId::C, ChoiceId::E]);
        assert!(choices.iter().all(|c| !c.text.trim().is_empty()));
    }

    #[test]
    fn question_without_slots_yields_no_choices() {
        let q = Question::default();
        assert!(q.choices().is_empty());
    }
}

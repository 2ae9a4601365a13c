//! Display ordering of a question's choices.
//!
//! Practice mode shows a fresh uniform permutation each time a question is
//! entered; review mode always shows the canonical A→E order. Callers cache
//! the returned order per question entry so unrelated state changes do not
//! reshuffle (see `services::QuizSession`).

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{Choice, ChoiceId};

/// How a question's choices should be ordered on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    /// Uniformly shuffled, one permutation per question entry.
    Practice,
    /// Canonical A→E order.
    Review,
}

/// Computes the display order for the given choices.
///
/// `Practice` draws a uniform permutation (Fisher–Yates via
/// `SliceRandom::shuffle`); `Review` returns the input order unchanged.
/// Empty input yields an empty order.
#[must_use]
pub fn presentation_order<R: Rng + ?Sized>(
    choices: &[Choice],
    mode: PresentationMode,
    rng: &mut R,
) -> Vec<ChoiceId> {
    let mut order: Vec<ChoiceId> = choices.iter().map(|c| c.id).collect();
    if mode == PresentationMode::Practice {
        order.shuffle(rng);
    }
    order
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::question_with_slots;

    fn five_choices() -> Vec<Choice> {
        question_with_slots(&[
            ("a", Some(true)),
            ("b", None),
            ("c", None),
            ("d", None),
            ("e", None),
        ])
        .choices()
    }

    #[test]
    fn review_mode_keeps_canonical_order() {
        let choices = five_choices();
        let mut rng = rand::rng();
        for _ in 0..50 {
            let order = presentation_order(&choices, PresentationMode::Review, &mut rng);
            let expected: Vec<_> = choices.iter().map(|c| c.id).collect();
            assert_eq!(order, expected);
        }
    }

    #[test]
    fn practice_mode_emits_a_permutation() {
        let choices = five_choices();
        let mut rng = rand::rng();
        for _ in 0..1000 {
            let mut order = presentation_order(&choices, PresentationMode::Practice, &mut rng);
            assert_eq!(order.len(), 5);
            order.sort();
            order.dedup();
            assert_eq!(order.len(), 5, "every id must appear exactly once");
        }
    }

    #[test]
    fn practice_mode_is_roughly_uniform() {
        let choices = five_choices();
        let mut rng = rand::rng();
        let runs = 1000;

        // counts[position][slot index]
        let mut counts = [[0_u32; 5]; 5];
        for _ in 0..runs {
            let order = presentation_order(&choices, PresentationMode::Practice, &mut rng);
            for (position, id) in order.iter().enumerate() {
                counts[position][id.index()] += 1;
            }
        }

        // Expected 200 per cell; a wide tolerance keeps the test stable while
        // still catching a broken (e.g. identity or biased) shuffle.
        for row in &counts {
            for &count in row {
                assert!(
                    (100..=300).contains(&count),
                    "shuffle frequency out of range: {count}"
                );
            }
        }
    }

    #[test]
    fn empty_choice_list_orders_to_empty() {
        let mut rng = rand::rng();
        assert!(presentation_order(&[], PresentationMode::Practice, &mut rng).is_empty());
        assert!(presentation_order(&[], PresentationMode::Review, &mut rng).is_empty());
    }
}

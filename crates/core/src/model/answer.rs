use std::collections::BTreeSet;

use crate::model::question::ChoiceId;

/// The set of choice ids a user currently has selected for one question.
///
/// Order-irrelevant; duplicates are impossible by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    selected: BTreeSet<ChoiceId>,
}

impl AnswerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = ChoiceId>) -> Self {
        Self {
            selected: ids.into_iter().collect(),
        }
    }

    /// Adds or removes a choice. Returns true when the set changed.
    pub fn set_selected(&mut self, id: ChoiceId, selected: bool) -> bool {
        if selected {
            self.selected.insert(id)
        } else {
            self.selected.remove(&id)
        }
    }

    #[must_use]
    pub fn contains(&self, id: ChoiceId) -> bool {
        self.selected.contains(&id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn ids(&self) -> &BTreeSet<ChoiceId> {
        &self.selected
    }

    /// Selected ids in canonical order, for display and result records.
    #[must_use]
    pub fn to_vec(&self) -> Vec<ChoiceId> {
        self.selected.iter().copied().collect()
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_restores_the_empty_set() {
        let mut answers = AnswerSet::new();
        assert!(answers.set_selected(ChoiceId::B, true));
        assert!(answers.contains(ChoiceId::B));
        assert!(answers.set_selected(ChoiceId::B, false));
        assert!(answers.is_empty());
    }

    #[test]
    fn re_adding_a_choice_is_a_no_op() {
        let mut answers = AnswerSet::from_ids([ChoiceId::A]);
        assert!(!answers.set_selected(ChoiceId::A, true));
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let forward = AnswerSet::from_ids([ChoiceId::A, ChoiceId::D]);
        let backward = AnswerSet::from_ids([ChoiceId::D, ChoiceId::A]);
        assert_eq!(forward, backward);
    }
}

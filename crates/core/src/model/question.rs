use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//
// ─── CHOICE IDS ────────────────────────────────────────────────────────────────
//

/// Identifier of one of the five choice slots of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChoiceId {
    A,
    B,
    C,
    D,
    E,
}

impl ChoiceId {
    /// All slot ids in canonical A→E order.
    pub const ALL: [ChoiceId; 5] = [
        ChoiceId::A,
        ChoiceId::B,
        ChoiceId::C,
        ChoiceId::D,
        ChoiceId::E,
    ];

    /// Returns the display letter for this slot.
    #[must_use]
    pub fn letter(self) -> &'static str {
        match self {
            ChoiceId::A => "A",
            ChoiceId::B => "B",
            ChoiceId::C => "C",
            ChoiceId::D => "D",
            ChoiceId::E => "E",
        }
    }

    /// Returns the canonical slot position (A = 0 … E = 4).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            ChoiceId::A => 0,
            ChoiceId::B => 1,
            ChoiceId::C => 2,
            ChoiceId::D => 3,
            ChoiceId::E => 4,
        }
    }
}

impl fmt::Display for ChoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Error type for parsing a `ChoiceId` from a letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseChoiceIdError {
    raw: String,
}

impl fmt::Display for ParseChoiceIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a choice letter A-E: {}", self.raw)
    }
}

impl std::error::Error for ParseChoiceIdError {}

impl FromStr for ChoiceId {
    type Err = ParseChoiceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(ChoiceId::A),
            "B" => Ok(ChoiceId::B),
            "C" => Ok(ChoiceId::C),
            "D" => Ok(ChoiceId::D),
            "E" => Ok(ChoiceId::E),
            _ => Err(ParseChoiceIdError { raw: s.to_string() }),
        }
    }
}

//
// ─── CORRECTNESS ───────────────────────────────────────────────────────────────
//

/// Tri-state correctness flag of a choice slot.
///
/// Authored banks often omit the flag entirely; `Unspecified` keeps that
/// branch explicit instead of hiding it in a nullable boolean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Correctness {
    Correct,
    Incorrect,
    #[default]
    Unspecified,
}

impl Correctness {
    #[must_use]
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Correctness::Correct,
            Some(false) => Correctness::Incorrect,
            None => Correctness::Unspecified,
        }
    }

    /// True only for an explicit `Correct` flag.
    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Correctness::Correct)
    }
}

//
// ─── RAW QUESTION ──────────────────────────────────────────────────────────────
//

/// Verbatim serde mirror of the authored JSON question shape.
///
/// Every field is optional and casing of the metadata fields varies across
/// banks, so this type only exists at the store boundary; it is normalized
/// into [`Question`] before anything else sees it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawQuestion {
    #[serde(rename = "YearAsked")]
    pub year_asked: Option<String>,
    #[serde(rename = "Subtopic")]
    pub subtopic: Option<String>,
    #[serde(rename = "QuestionText")]
    pub question_text: Option<String>,
    #[serde(rename = "Topic", alias = "topic")]
    pub topic: Option<String>,
    #[serde(rename = "Category", alias = "category")]
    pub category: Option<String>,

    #[serde(rename = "Choice_A_Text")]
    pub choice_a_text: Option<String>,
    #[serde(rename = "Choice_A_isCorrect")]
    pub choice_a_is_correct: Option<bool>,
    #[serde(rename = "Choice_A_Explanation")]
    pub choice_a_explanation: Option<String>,

    #[serde(rename = "Choice_B_Text")]
    pub choice_b_text: Option<String>,
    #[serde(rename = "Choice_B_isCorrect")]
    pub choice_b_is_correct: Option<bool>,
    #[serde(rename = "Choice_B_Explanation")]
    pub choice_b_explanation: Option<String>,

    #[serde(rename = "Choice_C_Text")]
    pub choice_c_text: Option<String>,
    #[serde(rename = "Choice_C_isCorrect")]
    pub choice_c_is_correct: Option<bool>,
    #[serde(rename = "Choice_C_Explanation")]
    pub choice_c_explanation: Option<String>,

    #[serde(rename = "Choice_D_Text")]
    pub choice_d_text: Option<String>,
    #[serde(rename = "Choice_D_isCorrect")]
    pub choice_d_is_correct: Option<bool>,
    #[serde(rename = "Choice_D_Explanation")]
    pub choice_d_explanation: Option<String>,

    #[serde(rename = "Choice_E_Text")]
    pub choice_e_text: Option<String>,
    #[serde(rename = "Choice_E_isCorrect")]
    pub choice_e_is_correct: Option<bool>,
    #[serde(rename = "Choice_E_Explanation")]
    pub choice_e_explanation: Option<String>,

    #[serde(rename = "OverallExplanation")]
    pub overall_explanation: Option<String>,
}

//
// ─── NORMALIZED QUESTION ───────────────────────────────────────────────────────
//

/// One of the five authored choice slots of a question.
///
/// A slot with empty or whitespace-only text is unused: it is never presented
/// and never counted toward correctness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceSlot {
    pub text: String,
    pub correctness: Correctness,
    pub explanation: String,
}

impl ChoiceSlot {
    fn from_raw(
        text: Option<String>,
        flag: Option<bool>,
        explanation: Option<String>,
    ) -> Self {
        Self {
            text: text.unwrap_or_default(),
            correctness: Correctness::from_flag(flag),
            explanation: explanation.unwrap_or_default(),
        }
    }

    /// True when the slot carries presentable text.
    #[must_use]
    pub fn is_used(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Normalized, immutable question record.
///
/// Built once from [`RawQuestion`] at the store boundary; loaded verbatim at
/// quiz start and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Question {
    prompt: Option<String>,
    year_asked: Option<String>,
    subtopic: Option<String>,
    slots: [ChoiceSlot; 5],
    overall_explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn from_raw(raw: RawQuestion) -> Self {
        Self {
            prompt: raw.question_text,
            year_asked: raw.year_asked,
            subtopic: raw.subtopic,
            slots: [
                ChoiceSlot::from_raw(
                    raw.choice_a_text,
                    raw.choice_a_is_correct,
                    raw.choice_a_explanation,
                ),
                ChoiceSlot::from_raw(
                    raw.choice_b_text,
                    raw.choice_b_is_correct,
                    raw.choice_b_explanation,
                ),
                ChoiceSlot::from_raw(
                    raw.choice_c_text,
                    raw.choice_c_is_correct,
                    raw.choice_c_explanation,
                ),
                ChoiceSlot::from_raw(
                    raw.choice_d_text,
                    raw.choice_d_is_correct,
                    raw.choice_d_explanation,
                ),
                ChoiceSlot::from_raw(
                    raw.choice_e_text,
                    raw.choice_e_is_correct,
                    raw.choice_e_explanation,
                ),
            ],
            overall_explanation: raw.overall_explanation,
        }
    }

    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    #[must_use]
    pub fn year_asked(&self) -> Option<&str> {
        self.year_asked.as_deref()
    }

    #[must_use]
    pub fn subtopic(&self) -> Option<&str> {
        self.subtopic.as_deref()
    }

    #[must_use]
    pub fn overall_explanation(&self) -> Option<&str> {
        self.overall_explanation.as_deref()
    }

    /// Returns the slot for the given choice id, used or not.
    #[must_use]
    pub fn slot(&self, id: ChoiceId) -> &ChoiceSlot {
        &self.slots[id.index()]
    }

    /// Iterates over `(id, slot)` pairs in canonical order, including unused slots.
    pub fn slots(&self) -> impl Iterator<Item = (ChoiceId, &ChoiceSlot)> {
        ChoiceId::ALL.iter().map(|id| (*id, self.slot(*id)))
    }
}


// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correctness_from_flag_covers_all_three_states() {
        assert_eq!(Correctness::from_flag(Some(true)), Correctness::Correct);
        assert_eq!(Correctness::from_flag(Some(false)), Correctness::Incorrect);
        assert_eq!(Correctness::from_flag(None), Correctness::Unspecified);
    }

    #[test]
    fn choice_id_parses_case_insensitively() {
        assert_eq!("a".parse::<ChoiceId>().unwrap(), ChoiceId::A);
        assert_eq!(" E ".parse::<ChoiceId>().unwrap(), ChoiceId::E);
        assert!("F".parse::<ChoiceId>().is_err());
    }

    #[test]
    fn blank_slot_text_marks_slot_unused() {
        let q = test_support::question_with_slots(&[("first", Some(true)), ("   ", Some(true))]);
        assert!(q.slot(ChoiceId::A).is_used());
        assert!(!q.slot(ChoiceId::B).is_used());
        assert!(!q.slot(ChoiceId::C).is_used());
    }

    #[test]
    fn raw_question_tolerates_missing_fields() {
        let raw: RawQuestion = serde_json::from_str("{}").unwrap();
        let q = Question::from_raw(raw);
        assert!(q.prompt().is_none());
        assert!(q.slots().all(|(_, slot)| !slot.is_used()));
    }

    #[test]
    fn raw_question_accepts_lowercase_category() {
        let raw: RawQuestion =
            serde_json::from_str(r#"{"category": "Cardiologie", "Topic": "ECG"}"#).unwrap();
        assert_eq!(raw.category.as_deref(), Some("Cardiologie"));
        assert_eq!(raw.topic.as_deref(), Some("ECG"));
    }

    #[test]
    fn raw_question_accepts_null_correctness_flag() {
        let raw: RawQuestion = serde_json::from_str(
            r#"{"Choice_A_Text": "oui", "Choice_A_isCorrect": null}"#,
        )
        .unwrap();
        let q = Question::from_raw(raw);
        assert_eq!(q.slot(ChoiceId::A).correctness, Correctness::Unspecified);
    }
}

//! In-memory answer state for one attempt.

use std::collections::BTreeMap;

use crate::model::{Exercise, Question};
use crate::sentence::answer_slots;

/// The student's current answers, keyed by question index.
///
/// Multiple-choice questions hold at most one selected option (last write
/// wins). Fill-in-the-blank questions hold an ordered list of blank values
/// that grows on demand and is never truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    selections: BTreeMap<usize, String>,
    blanks: BTreeMap<usize, Vec<String>>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty sheet with every fill-in-the-blank question pre-sized to its
    /// marker count.
    pub fn for_exercise(exercise: &Exercise) -> Self {
        let mut sheet = Self::new();
        for (index, question) in exercise.questions.iter().enumerate() {
            if let Question::FillBlank(q) = question {
                sheet
                    .blanks
                    .insert(index, vec![String::new(); answer_slots(q)]);
            }
        }
        sheet
    }

    /// Record the chosen option, replacing any earlier choice.
    pub fn select_option(&mut self, question: usize, option_id: impl Into<String>) {
        self.selections.insert(question, option_id.into());
    }

    pub fn selected_option(&self, question: usize) -> Option<&str> {
        self.selections.get(&question).map(String::as_str)
    }

    /// Write one blank, padding earlier slots with empty strings if needed.
    pub fn set_blank(&mut self, question: usize, blank: usize, value: impl Into<String>) {
        let values = self.blanks.entry(question).or_default();
        if values.len() <= blank {
            values.resize(blank + 1, String::new());
        }
        values[blank] = value.into();
    }

    pub fn blanks(&self, question: usize) -> &[String] {
        self.blanks.get(&question).map(Vec::as_slice).unwrap_or(&[])
    }

    /// An option is recorded, or at least one blank has non-whitespace text.
    pub fn is_answered(&self, question: usize) -> bool {
        self.selections.contains_key(&question)
            || self
                .blanks
                .get(&question)
                .is_some_and(|values| values.iter().any(|v| !v.trim().is_empty()))
    }

    /// Number of distinct answered questions.
    pub fn answered_count(&self) -> usize {
        let mut indices: Vec<usize> = self
            .selections
            .keys()
            .chain(self.blanks.keys())
            .copied()
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices.into_iter().filter(|&q| self.is_answered(q)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.answered_count() == 0
    }

    pub fn clear(&mut self) {
        self.selections.clear();
        self.blanks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BlankDefinition, Difficulty, ExerciseMetadata, ExerciseType, FillBlankQuestion,
    };

    #[test]
    fn selection_is_last_write_wins() {
        let mut sheet = AnswerSheet::new();
        sheet.select_option(0, "a");
        sheet.select_option(0, "b");
        assert_eq!(sheet.selected_option(0), Some("b"));
        assert_eq!(sheet.answered_count(), 1);
    }

    #[test]
    fn blanks_grow_without_truncating() {
        let mut sheet = AnswerSheet::new();
        sheet.set_blank(2, 3, "x");
        assert_eq!(sheet.blanks(2), ["", "", "", "x"]);
        sheet.set_blank(2, 0, "y");
        assert_eq!(sheet.blanks(2), ["y", "", "", "x"]);
        assert!(sheet.blanks(7).is_empty());
    }

    #[test]
    fn set_is_idempotent() {
        let mut once = AnswerSheet::new();
        once.set_blank(0, 1, "chat");
        once.select_option(1, "opt");
        let mut twice = once.clone();
        twice.set_blank(0, 1, "chat");
        twice.select_option(1, "opt");
        assert_eq!(once, twice);
    }

    #[test]
    fn whitespace_blanks_do_not_count() {
        let mut sheet = AnswerSheet::new();
        sheet.set_blank(0, 0, "   ");
        assert!(!sheet.is_answered(0));
        sheet.set_blank(0, 1, " noir ");
        assert!(sheet.is_answered(0));
    }

    #[test]
    fn presized_sheet_is_unanswered() {
        let exercise = Exercise {
            id: "ex".into(),
            title: "Blanks".into(),
            description: String::new(),
            kind: ExerciseType::FillBlanks,
            subject: "s".into(),
            class: "c".into(),
            school: None,
            created_by: None,
            difficulty: Difficulty::Easy,
            questions: vec![Question::FillBlank(FillBlankQuestion {
                sentence: "___ et ___ et ___".into(),
                blanks: vec![BlankDefinition {
                    correct_answer: "un".into(),
                    alternatives: vec![],
                }],
                points: 1,
            })],
            total_points: 1,
            metadata: ExerciseMetadata::default(),
            due_date: None,
            created_at: None,
        };
        let sheet = AnswerSheet::for_exercise(&exercise);
        assert_eq!(sheet.blanks(0).len(), 3);
        assert!(sheet.is_empty());
    }
}

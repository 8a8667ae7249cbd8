//! Review annotations for graded attempts.
//!
//! The reviewer re-parses each template exactly like the answering view and
//! joins the graded record in by blank index.

use serde::Serialize;

use crate::model::{
    Exercise, FillBlankAnswerRecord, FillBlankQuestion, QcmAnswerRecord, QcmQuestion, Question,
    StudentProgress,
};
use crate::sentence::{parse_sentence, SentencePart};

/// A blank annotated with what was submitted and what was expected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlankReview {
    pub index: usize,
    /// Empty when the graded record has no entry for this blank.
    pub submitted: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReviewPart {
    Text(String),
    Blank(BlankReview),
}

/// A fill-in-the-blank question with review annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedSentence {
    pub parts: Vec<ReviewPart>,
    /// Every blank correct.
    pub fully_correct: bool,
    pub points_earned: f64,
}

impl ReviewedSentence {
    pub fn blanks(&self) -> impl Iterator<Item = &BlankReview> {
        self.parts.iter().filter_map(|p| match p {
            ReviewPart::Blank(b) => Some(b),
            ReviewPart::Text(_) => None,
        })
    }
}

/// Annotate one fill-in-the-blank question.
///
/// Blanks the graded record does not mention count as unanswered and
/// incorrect.
pub fn review_fill_blank(
    question: &FillBlankQuestion,
    graded: Option<&FillBlankAnswerRecord>,
) -> ReviewedSentence {
    let parts: Vec<ReviewPart> = parse_sentence(&question.sentence)
        .into_iter()
        .map(|part| match part {
            SentencePart::Text(text) => ReviewPart::Text(text),
            SentencePart::Blank(index) => {
                let record = graded.and_then(|g| g.blank(index));
                ReviewPart::Blank(BlankReview {
                    index,
                    submitted: record.map(|r| r.answer.clone()).unwrap_or_default(),
                    correct_answer: question
                        .blanks
                        .get(index)
                        .map(|b| b.correct_answer.clone())
                        .unwrap_or_default(),
                    is_correct: record.is_some_and(|r| r.is_correct),
                })
            }
        })
        .collect();

    let mut blanks = parts.iter().filter_map(|p| match p {
        ReviewPart::Blank(b) => Some(b.is_correct),
        ReviewPart::Text(_) => None,
    });
    let fully_correct = match blanks.next() {
        Some(first) => first && blanks.all(|correct| correct),
        None => graded.is_some_and(|g| g.is_correct),
    };

    ReviewedSentence {
        parts,
        fully_correct,
        points_earned: graded.map(|g| g.points_earned).unwrap_or(0.0),
    }
}

/// A multiple-choice question with review annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QcmReview {
    pub question: String,
    pub selected: Option<String>,
    pub selected_text: Option<String>,
    /// Option ids flagged correct, when the server disclosed them.
    pub correct: Vec<String>,
    pub is_correct: bool,
    pub points_earned: f64,
}

pub fn review_qcm(question: &QcmQuestion, graded: Option<&QcmAnswerRecord>) -> QcmReview {
    let selected = graded
        .map(|g| g.selected_option.clone())
        .filter(|s| !s.is_empty());
    let selected_text = selected
        .as_deref()
        .and_then(|key| question.option_by_key(key))
        .map(|o| o.text.clone());
    QcmReview {
        question: question.question.clone(),
        selected,
        selected_text,
        correct: question.correct_option_ids(),
        is_correct: graded.is_some_and(|g| g.is_correct),
        points_earned: graded.map(|g| g.points_earned).unwrap_or(0.0),
    }
}

/// Review of one question of an attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionReview {
    Qcm { index: usize, review: QcmReview },
    FillBlank { index: usize, review: ReviewedSentence },
}

impl QuestionReview {
    pub fn index(&self) -> usize {
        match self {
            QuestionReview::Qcm { index, .. } | QuestionReview::FillBlank { index, .. } => *index,
        }
    }

    pub fn is_correct(&self) -> bool {
        match self {
            QuestionReview::Qcm { review, .. } => review.is_correct,
            QuestionReview::FillBlank { review, .. } => review.fully_correct,
        }
    }
}

/// Review every question of `exercise` against a graded attempt.
pub fn review_progress(exercise: &Exercise, progress: &StudentProgress) -> Vec<QuestionReview> {
    exercise
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| match question {
            Question::Qcm(q) => QuestionReview::Qcm {
                index,
                review: review_qcm(q, progress.qcm_record(index)),
            },
            Question::FillBlank(q) => QuestionReview::FillBlank {
                index,
                review: review_fill_blank(q, progress.fill_blank_record(index)),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::model::BlankAnswerRecord;

    fn graded(answers: &[(&str, bool)]) -> FillBlankAnswerRecord {
        FillBlankAnswerRecord {
            question_index: 0,
            blanks: answers
                .iter()
                .enumerate()
                .map(|(i, (answer, correct))| BlankAnswerRecord {
                    blank_index: i,
                    answer: (*answer).into(),
                    is_correct: *correct,
                    points_earned: if *correct { 1.0 } else { 0.0 },
                })
                .collect(),
            is_correct: answers.iter().all(|(_, c)| *c),
            points_earned: 1.0,
        }
    }

    fn cat_question() -> FillBlankQuestion {
        fixtures::cat_sentence().questions[0]
            .as_fill_blank()
            .unwrap()
            .clone()
    }

    #[test]
    fn marks_each_blank() {
        let record = graded(&[("chat", true), ("blanc", false)]);
        let review = review_fill_blank(&cat_question(), Some(&record));
        assert_eq!(review.parts.len(), 5);
        assert_eq!(review.parts[0], ReviewPart::Text("Le ".into()));
        let blanks: Vec<&BlankReview> = review.blanks().collect();
        assert_eq!(blanks[0].submitted, "chat");
        assert!(blanks[0].is_correct);
        assert_eq!(blanks[1].submitted, "blanc");
        assert_eq!(blanks[1].correct_answer, "noir");
        assert!(!blanks[1].is_correct);
        assert!(!review.fully_correct);
    }

    #[test]
    fn all_blanks_correct_is_fully_correct() {
        let record = graded(&[("chat", true), ("noir", true)]);
        assert!(review_fill_blank(&cat_question(), Some(&record)).fully_correct);
    }

    #[test]
    fn missing_blank_is_unanswered_not_an_error() {
        let mut record = graded(&[("chat", true), ("noir", true)]);
        record.blanks.retain(|b| b.blank_index == 0);
        let review = review_fill_blank(&cat_question(), Some(&record));
        let second = review.blanks().nth(1).unwrap();
        assert_eq!(second.submitted, "");
        assert!(!second.is_correct);
        assert!(!review.fully_correct);

        let review = review_fill_blank(&cat_question(), None);
        assert_eq!(review.blanks().count(), 2);
        assert_eq!(review.points_earned, 0.0);
    }

    #[test]
    fn extra_markers_have_empty_canonical_answer() {
        let question = FillBlankQuestion {
            sentence: "___ ___ ___".into(),
            blanks: cat_question().blanks,
            points: 1,
        };
        let review = review_fill_blank(&question, None);
        assert_eq!(review.blanks().nth(2).unwrap().correct_answer, "");
    }

    #[test]
    fn reviews_whole_attempt() {
        let exercise = fixtures::three_question_qcm();
        let mut progress = fixtures::attempt(1, 33.3);
        progress.qcm_answers = vec![QcmAnswerRecord {
            question_index: 0,
            selected_option: "optA".into(),
            is_correct: true,
            points_earned: 1.0,
        }];
        let reviews = review_progress(&exercise, &progress);
        assert_eq!(reviews.len(), 3);
        assert!(reviews[0].is_correct());
        let QuestionReview::Qcm { review, .. } = &reviews[0] else {
            panic!("expected qcm review");
        };
        assert_eq!(review.selected_text.as_deref(), Some("option optA"));
        assert_eq!(review.correct, vec!["optA".to_string()]);
        assert!(!reviews[1].is_correct());
        assert_eq!(reviews[2].index(), 2);
    }
}

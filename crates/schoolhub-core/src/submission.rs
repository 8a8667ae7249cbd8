//! Turning an answer sheet into the submission wire payload.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::answers::AnswerSheet;
use crate::error::SubmitError;
use crate::model::{Exercise, ExerciseType, Question};
use crate::sentence::answer_slots;

/// Body of `POST /exercises/{id}/submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub answers: SubmittedAnswers,
}

/// Positionally aligned answers, one entry per question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswers {
    /// Selected option id per question; `""` when unanswered.
    Qcm(Vec<String>),
    /// Blank values per question.
    FillBlanks(Vec<BlankAnswers>),
}

impl SubmittedAnswers {
    pub fn len(&self) -> usize {
        match self {
            SubmittedAnswers::Qcm(v) => v.len(),
            SubmittedAnswers::FillBlanks(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlankAnswers {
    pub blanks: Vec<String>,
}

/// Build the payload for `exercise` from the current answers.
///
/// The answer array always has one entry per question, in question order.
/// Fill-in-the-blank arrays are padded to the template's marker count.
pub fn build_submission(
    exercise: &Exercise,
    sheet: &AnswerSheet,
) -> Result<SubmissionPayload, SubmitError> {
    let question_count = exercise.question_count();
    if !(0..question_count).any(|q| sheet.is_answered(q)) {
        return Err(SubmitError::NothingAnswered);
    }

    let answers = match exercise.kind {
        ExerciseType::Qcm => SubmittedAnswers::Qcm(
            (0..question_count)
                .map(|q| sheet.selected_option(q).unwrap_or_default().to_string())
                .collect(),
        ),
        ExerciseType::FillBlanks => SubmittedAnswers::FillBlanks(
            exercise
                .questions
                .iter()
                .enumerate()
                .map(|(q, question)| {
                    let slots = match question {
                        Question::FillBlank(fb) => answer_slots(fb),
                        Question::Qcm(_) => 0,
                    };
                    let mut blanks = sheet.blanks(q).to_vec();
                    if blanks.len() < slots {
                        blanks.resize(slots, String::new());
                    }
                    BlankAnswers { blanks }
                })
                .collect(),
        ),
    };

    Ok(SubmissionPayload { answers })
}

/// Identifies one attempt of one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttemptKey {
    pub exercise_id: String,
    pub attempt: u32,
}

impl AttemptKey {
    pub fn new(exercise_id: impl Into<String>, attempt: u32) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            attempt,
        }
    }
}

/// Tracks submissions in flight so the same attempt is never sent twice
/// concurrently. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SubmissionGuard {
    in_flight: Arc<Mutex<HashSet<AttemptKey>>>,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `key`. The slot is released when the returned
    /// ticket is dropped.
    pub fn begin(&self, key: AttemptKey) -> Result<InFlight, SubmitError> {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !set.insert(key.clone()) {
            return Err(SubmitError::AlreadyInFlight {
                exercise_id: key.exercise_id,
                attempt: key.attempt,
            });
        }
        Ok(InFlight {
            key,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_in_flight(&self, key: &AttemptKey) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Ticket for a submission in flight.
#[derive(Debug)]
pub struct InFlight {
    key: AttemptKey,
    in_flight: Arc<Mutex<HashSet<AttemptKey>>>,
}

impl InFlight {
    pub fn key(&self) -> &AttemptKey {
        &self.key
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

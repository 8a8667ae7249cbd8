//! One student working through one exercise: load, answer, submit, review.

use std::sync::Arc;

use crate::answers::AnswerSheet;
use crate::attempts::{latest_attempt, AttemptPolicy};
use crate::error::{ApiResult, SubmitError};
use crate::model::{Exercise, Question, StudentProgress};
use crate::review::{review_progress, QuestionReview};
use crate::sentence::{answer_slots, SentencePart};
use crate::submission::{build_submission, AttemptKey, SubmissionGuard};
use crate::traits::ExerciseApi;

/// A question prepared for display with the current answers filled in.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedQuestion {
    Qcm {
        index: usize,
        prompt: String,
        /// `(key, text)` pairs in display order.
        options: Vec<(String, String)>,
        selected: Option<String>,
    },
    FillBlank {
        index: usize,
        parts: Vec<SentencePart>,
        /// One value per blank marker.
        values: Vec<String>,
    },
}

impl RenderedQuestion {
    pub fn index(&self) -> usize {
        match self {
            RenderedQuestion::Qcm { index, .. } | RenderedQuestion::FillBlank { index, .. } => {
                *index
            }
        }
    }
}

/// State of one exercise being taken.
pub struct ExerciseSession {
    api: Arc<dyn ExerciseApi>,
    guard: SubmissionGuard,
    student_id: String,
    exercise: Exercise,
    history: Vec<StudentProgress>,
    sheet: AnswerSheet,
}

impl std::fmt::Debug for ExerciseSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExerciseSession")
            .field("exercise", &self.exercise.id)
            .field("student_id", &self.student_id)
            .field("attempts", &self.history.len())
            .field("answered", &self.sheet.answered_count())
            .finish()
    }
}

impl ExerciseSession {
    /// Fetch the exercise and the student's attempt history.
    ///
    /// If the history read fails, the latest attempt embedded in the exercise
    /// response stands in for it.
    pub async fn load(
        api: Arc<dyn ExerciseApi>,
        guard: SubmissionGuard,
        exercise_id: &str,
        student_id: &str,
    ) -> ApiResult<Self> {
        let loaded = api.get_exercise(exercise_id).await?;
        let history = match api.student_progress(exercise_id, student_id).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(exercise_id, "attempt history unavailable: {e}");
                loaded.progress.into_iter().collect()
            }
        };
        tracing::debug!(
            exercise_id,
            questions = loaded.exercise.question_count(),
            attempts = history.len(),
            "exercise loaded"
        );
        Ok(Self::from_parts(
            api,
            guard,
            student_id,
            loaded.exercise,
            history,
        ))
    }

    pub fn from_parts(
        api: Arc<dyn ExerciseApi>,
        guard: SubmissionGuard,
        student_id: impl Into<String>,
        exercise: Exercise,
        history: Vec<StudentProgress>,
    ) -> Self {
        let sheet = AnswerSheet::for_exercise(&exercise);
        Self {
            api,
            guard,
            student_id: student_id.into(),
            exercise,
            history,
            sheet,
        }
    }

    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn history(&self) -> &[StudentProgress] {
        &self.history
    }

    pub fn latest(&self) -> Option<&StudentProgress> {
        latest_attempt(&self.history)
    }

    pub fn sheet(&self) -> &AnswerSheet {
        &self.sheet
    }

    pub fn policy(&self) -> AttemptPolicy {
        AttemptPolicy::from_history(&self.exercise, &self.history)
    }

    pub fn select_option(&mut self, question: usize, option_id: impl Into<String>) {
        self.sheet.select_option(question, option_id);
    }

    pub fn set_blank(&mut self, question: usize, blank: usize, value: impl Into<String>) {
        self.sheet.set_blank(question, blank, value);
    }

    /// Every question with its current answers.
    pub fn render(&self) -> Vec<RenderedQuestion> {
        self.exercise
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| match question {
                Question::Qcm(q) => RenderedQuestion::Qcm {
                    index,
                    prompt: q.question.clone(),
                    options: q
                        .options
                        .iter()
                        .enumerate()
                        .map(|(position, option)| (option.key(position), option.text.clone()))
                        .collect(),
                    selected: self.sheet.selected_option(index).map(str::to_string),
                },
                Question::FillBlank(q) => {
                    let mut values = self.sheet.blanks(index).to_vec();
                    let slots = answer_slots(q);
                    if values.len() < slots {
                        values.resize(slots, String::new());
                    }
                    RenderedQuestion::FillBlank {
                        index,
                        parts: q.parts(),
                        values,
                    }
                }
            })
            .collect()
    }

    /// Submit the current answers as the next attempt.
    ///
    /// On success the graded attempt joins the history and the answers are
    /// cleared for a retry. On failure the answers are kept.
    pub async fn submit(&mut self) -> Result<StudentProgress, SubmitError> {
        let policy = self.policy();
        policy.ensure_can_submit()?;
        let payload = build_submission(&self.exercise, &self.sheet)?;

        let key = AttemptKey::new(self.exercise.id.clone(), policy.next_attempt_number());
        let ticket = self.guard.begin(key)?;
        let result = self
            .api
            .submit_answers(&self.exercise.id, &payload)
            .await;
        drop(ticket);

        let progress = result?;
        tracing::info!(
            exercise_id = %self.exercise.id,
            attempt = progress.attempt_number,
            accuracy = progress.accuracy,
            "attempt graded"
        );
        self.history.push(progress.clone());
        self.sheet = AnswerSheet::for_exercise(&self.exercise);
        Ok(progress)
    }

    /// Per-question review of `attempt`, or `None` while its details are
    /// still hidden.
    pub fn review(&self, attempt: &StudentProgress) -> Option<Vec<QuestionReview>> {
        if self.policy().can_view_details(attempt) {
            Some(review_progress(&self.exercise, attempt))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::fixtures;
    use crate::model::{ExerciseWithProgress, Page};
    use crate::requests::{ExerciseDraft, ExerciseQuery};
    use crate::submission::{SubmissionPayload, SubmittedAnswers};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Grades every submission as 100% and records payloads.
    struct Recorder {
        exercise: Exercise,
        fail_history: bool,
        fail_submit: bool,
        submitted: Mutex<Vec<SubmissionPayload>>,
    }

    impl Recorder {
        fn new(exercise: Exercise) -> Self {
            Self {
                exercise,
                fail_history: false,
                fail_submit: false,
                submitted: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl ExerciseApi for Recorder {
        async fn create_exercise(&self, _draft: &ExerciseDraft) -> ApiResult<Exercise> {
            Err(ApiError::Forbidden("students cannot edit exercises".into()))
        }

        async fn list_exercises(&self, _query: &ExerciseQuery) -> ApiResult<Page<Exercise>> {
            Ok(Page::single(vec![self.exercise.clone()]))
        }

        async fn get_exercise(&self, _exercise_id: &str) -> ApiResult<ExerciseWithProgress> {
            Ok(ExerciseWithProgress {
                exercise: self.exercise.clone(),
                progress: Some(fixtures::attempt(1, 40.0)),
            })
        }

        async fn update_exercise(
            &self,
            _exercise_id: &str,
            _draft: &ExerciseDraft,
        ) -> ApiResult<Exercise> {
            Err(ApiError::Forbidden("students cannot edit exercises".into()))
        }

        async fn delete_exercise(&self, _exercise_id: &str) -> ApiResult<()> {
            Err(ApiError::Forbidden("students cannot edit exercises".into()))
        }

        async fn submit_answers(
            &self,
            _exercise_id: &str,
            payload: &SubmissionPayload,
        ) -> ApiResult<StudentProgress> {
            if self.fail_submit {
                return Err(ApiError::Network("connection reset".into()));
            }
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(payload.clone());
            Ok(fixtures::attempt(submitted.len() as u32, 100.0))
        }

        async fn student_progress(
            &self,
            _exercise_id: &str,
            _student_id: &str,
        ) -> ApiResult<Vec<StudentProgress>> {
            if self.fail_history {
                Err(ApiError::NotFound("progress".into()))
            } else {
                Ok(vec![])
            }
        }

        async fn exercises_by_subject(&self, _subject_id: &str) -> ApiResult<Vec<Exercise>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn submit_sends_answers_and_resets_sheet() {
        let api = Arc::new(Recorder::new(fixtures::three_question_qcm()));
        let mut session = ExerciseSession::load(api.clone(), SubmissionGuard::new(), "ex-1", "stu-1")
            .await
            .unwrap();
        session.select_option(0, "optA");
        session.select_option(2, "optF");

        let progress = session.submit().await.unwrap();
        assert_eq!(progress.attempt_number, 1);
        assert_eq!(session.history().len(), 1);
        assert!(session.sheet().is_empty());

        let submitted = api.submitted.lock().unwrap();
        assert_eq!(
            submitted[0].answers,
            SubmittedAnswers::Qcm(vec!["optA".into(), String::new(), "optF".into()])
        );
    }

    #[tokio::test]
    async fn nothing_answered_never_reaches_the_server() {
        let api = Arc::new(Recorder::new(fixtures::three_question_qcm()));
        let mut session = ExerciseSession::load(api.clone(), SubmissionGuard::new(), "ex-1", "stu-1")
            .await
            .unwrap();
        assert!(matches!(
            session.submit().await,
            Err(SubmitError::NothingAnswered)
        ));
        assert!(api.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn exhausted_attempts_block_submission() {
        let api = Arc::new(Recorder::new(fixtures::three_question_qcm()));
        let mut session = ExerciseSession::load(api, SubmissionGuard::new(), "ex-1", "stu-1")
            .await
            .unwrap();
        session.select_option(0, "optA");
        session.submit().await.unwrap();

        session.select_option(0, "optB");
        assert!(matches!(
            session.submit().await,
            Err(SubmitError::AttemptsExhausted { max_attempts: 1 })
        ));
    }

    #[tokio::test]
    async fn failed_submit_keeps_answers_and_releases_guard() {
        let mut recorder = Recorder::new(fixtures::three_question_qcm());
        recorder.fail_submit = true;
        let guard = SubmissionGuard::new();
        let mut session = ExerciseSession::load(Arc::new(recorder), guard.clone(), "ex-1", "stu-1")
            .await
            .unwrap();
        session.select_option(1, "optD");

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, SubmitError::Api(ApiError::Network(_))));
        assert_eq!(session.sheet().selected_option(1), Some("optD"));
        assert!(!guard.is_in_flight(&AttemptKey::new("ex-1", 1)));
    }

    #[tokio::test]
    async fn history_falls_back_to_embedded_progress() {
        let mut recorder = Recorder::new(fixtures::three_question_qcm());
        recorder.fail_history = true;
        let session = ExerciseSession::load(Arc::new(recorder), SubmissionGuard::new(), "ex-1", "stu-1")
            .await
            .unwrap();
        assert_eq!(session.history().len(), 1);
        assert!(!session.policy().can_retry());
    }

    #[tokio::test]
    async fn render_pads_blanks_to_markers() {
        let api = Arc::new(Recorder::new(fixtures::cat_sentence()));
        let mut session = ExerciseSession::load(api, SubmissionGuard::new(), "ex-1", "stu-1")
            .await
            .unwrap();
        session.set_blank(0, 1, "noir");
        let rendered = session.render();
        match &rendered[0] {
            RenderedQuestion::FillBlank { parts, values, .. } => {
                assert_eq!(parts.iter().filter(|p| p.blank_index().is_some()).count(), 2);
                assert_eq!(values, &vec![String::new(), "noir".to_string()]);
            }
            other => panic!("expected fill blank, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn review_hidden_until_attempts_run_out_or_perfect() {
        let mut exercise = fixtures::three_question_qcm();
        exercise.metadata.max_attempts = Some(3);
        let api = Arc::new(Recorder::new(exercise.clone()));
        let session = ExerciseSession::from_parts(
            api,
            SubmissionGuard::new(),
            "stu-1",
            exercise,
            vec![fixtures::attempt(1, 40.0)],
        );
        assert!(session.review(&fixtures::attempt(1, 40.0)).is_none());
        let review = session.review(&fixtures::attempt(1, 100.0)).unwrap();
        assert_eq!(review.len(), 3);
    }
}

//! `/exercises` over HTTP.

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use schoolhub_core::error::ApiResult;
use schoolhub_core::model::{Exercise, ExerciseWithProgress, Page, StudentProgress};
use schoolhub_core::requests::{ExerciseDraft, ExerciseQuery};
use schoolhub_core::submission::SubmissionPayload;
use schoolhub_core::traits::ExerciseApi;
use schoolhub_core::validation::{ensure_valid, validate_exercise};

use crate::http::SchoolClient;

#[async_trait]
impl ExerciseApi for SchoolClient {
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    async fn create_exercise(&self, draft: &ExerciseDraft) -> ApiResult<Exercise> {
        ensure_valid(validate_exercise(draft))?;
        self.json(self.request(Method::POST, "/exercises").json(draft))
            .await
    }

    #[instrument(skip(self, query))]
    async fn list_exercises(&self, query: &ExerciseQuery) -> ApiResult<Page<Exercise>> {
        self.json(
            self.request(Method::GET, "/exercises")
                .query(&query.to_pairs()),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_exercise(&self, exercise_id: &str) -> ApiResult<ExerciseWithProgress> {
        self.json(self.request(Method::GET, &format!("/exercises/{exercise_id}")))
            .await
    }

    #[instrument(skip(self, draft))]
    async fn update_exercise(
        &self,
        exercise_id: &str,
        draft: &ExerciseDraft,
    ) -> ApiResult<Exercise> {
        ensure_valid(validate_exercise(draft))?;
        self.json(
            self.request(Method::PUT, &format!("/exercises/{exercise_id}"))
                .json(draft),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_exercise(&self, exercise_id: &str) -> ApiResult<()> {
        self.empty(self.request(Method::DELETE, &format!("/exercises/{exercise_id}")))
            .await
    }

    #[instrument(skip(self, payload), fields(answers = payload.answers.len()))]
    async fn submit_answers(
        &self,
        exercise_id: &str,
        payload: &SubmissionPayload,
    ) -> ApiResult<StudentProgress> {
        self.json(
            self.request(Method::POST, &format!("/exercises/{exercise_id}/submit"))
                .json(payload),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn student_progress(
        &self,
        exercise_id: &str,
        student_id: &str,
    ) -> ApiResult<Vec<StudentProgress>> {
        self.json(self.request(
            Method::GET,
            &format!("/exercises/{exercise_id}/progress/{student_id}"),
        ))
        .await
    }

    #[instrument(skip(self))]
    async fn exercises_by_subject(&self, subject_id: &str) -> ApiResult<Vec<Exercise>> {
        self.json(self.request(Method::GET, &format!("/exercises/subject/{subject_id}")))
            .await
    }
}

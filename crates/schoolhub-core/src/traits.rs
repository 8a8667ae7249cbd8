//! Service traits for the school REST API.
//!
//! Implemented over HTTP by `schoolhub-client`. Views and the exercise
//! pipeline depend only on these traits.

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::model::{
    ClassProgress, Exercise, ExerciseAnalytics, ExerciseWithProgress, Notification, Page, School,
    StudentOverview, StudentProgress,
};
use crate::requests::{
    AttachmentUpload, ExerciseDraft, ExerciseQuery, NotificationDraft, NotificationQuery,
    SchoolDraft,
};
use crate::submission::SubmissionPayload;

// ---------------------------------------------------------------------------
// Exercises
// ---------------------------------------------------------------------------

/// `/exercises`
#[async_trait]
pub trait ExerciseApi: Send + Sync {
    async fn create_exercise(&self, draft: &ExerciseDraft) -> ApiResult<Exercise>;

    async fn list_exercises(&self, query: &ExerciseQuery) -> ApiResult<Page<Exercise>>;

    /// The exercise plus the caller's latest attempt.
    async fn get_exercise(&self, exercise_id: &str) -> ApiResult<ExerciseWithProgress>;

    async fn update_exercise(&self, exercise_id: &str, draft: &ExerciseDraft)
        -> ApiResult<Exercise>;

    async fn delete_exercise(&self, exercise_id: &str) -> ApiResult<()>;

    /// Submit answers; the server grades and returns the new attempt.
    async fn submit_answers(
        &self,
        exercise_id: &str,
        payload: &SubmissionPayload,
    ) -> ApiResult<StudentProgress>;

    /// Every graded attempt of one student on one exercise.
    async fn student_progress(
        &self,
        exercise_id: &str,
        student_id: &str,
    ) -> ApiResult<Vec<StudentProgress>>;

    async fn exercises_by_subject(&self, subject_id: &str) -> ApiResult<Vec<Exercise>>;
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// `/progress`
#[async_trait]
pub trait ProgressApi: Send + Sync {
    async fn student_overview(&self, student_id: &str) -> ApiResult<StudentOverview>;

    async fn class_progress(&self, class_id: &str) -> ApiResult<ClassProgress>;

    async fn exercise_analytics(&self, exercise_id: &str) -> ApiResult<ExerciseAnalytics>;

    async fn delete_progress(&self, progress_id: &str) -> ApiResult<()>;
}

// ---------------------------------------------------------------------------
// Schools
// ---------------------------------------------------------------------------

/// `/schools`
#[async_trait]
pub trait SchoolApi: Send + Sync {
    /// Create a school and its bootstrap admin account.
    async fn create_school(&self, draft: &SchoolDraft) -> ApiResult<School>;

    /// The caller's school.
    async fn current_school(&self) -> ApiResult<School>;

    /// Flip the active/blocked flag. `reason` is recorded when blocking.
    async fn toggle_block(&self, school_id: &str, reason: Option<&str>) -> ApiResult<School>;

    async fn rename_school(&self, school_id: &str, name: &str) -> ApiResult<School>;
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// `/notifications`
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Create a notification; attachments are sent as multipart parts.
    async fn create_notification(
        &self,
        draft: &NotificationDraft,
        attachments: &[AttachmentUpload],
    ) -> ApiResult<Notification>;

    async fn list_notifications(&self, query: &NotificationQuery)
        -> ApiResult<Page<Notification>>;

    async fn get_notification(&self, notification_id: &str) -> ApiResult<Notification>;

    async fn update_notification(
        &self,
        notification_id: &str,
        draft: &NotificationDraft,
    ) -> ApiResult<Notification>;

    async fn delete_notification(&self, notification_id: &str) -> ApiResult<()>;

    async fn mark_read(&self, notification_id: &str) -> ApiResult<()>;

    async fn mark_many_read(&self, notification_ids: &[String]) -> ApiResult<()>;

    async fn mark_all_read(&self) -> ApiResult<()>;

    async fn download_attachment(
        &self,
        notification_id: &str,
        attachment_id: &str,
    ) -> ApiResult<Vec<u8>>;

    async fn search_notifications(
        &self,
        text: &str,
        query: &NotificationQuery,
    ) -> ApiResult<Page<Notification>>;

    async fn unread_count(&self) -> ApiResult<u64>;
}

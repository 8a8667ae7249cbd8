//! `/progress` over HTTP.

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use schoolhub_core::error::ApiResult;
use schoolhub_core::model::{ClassProgress, ExerciseAnalytics, StudentOverview};
use schoolhub_core::traits::ProgressApi;

use crate::http::SchoolClient;

#[async_trait]
impl ProgressApi for SchoolClient {
    #[instrument(skip(self))]
    async fn student_overview(&self, student_id: &str) -> ApiResult<StudentOverview> {
        self.json(self.request(Method::GET, &format!("/progress/student/{student_id}")))
            .await
    }

    #[instrument(skip(self))]
    async fn class_progress(&self, class_id: &str) -> ApiResult<ClassProgress> {
        self.json(self.request(Method::GET, &format!("/progress/class/{class_id}")))
            .await
    }

    #[instrument(skip(self))]
    async fn exercise_analytics(&self, exercise_id: &str) -> ApiResult<ExerciseAnalytics> {
        self.json(self.request(
            Method::GET,
            &format!("/progress/exercise/{exercise_id}/analytics"),
        ))
        .await
    }

    #[instrument(skip(self))]
    async fn delete_progress(&self, progress_id: &str) -> ApiResult<()> {
        self.empty(self.request(Method::DELETE, &format!("/progress/{progress_id}")))
            .await
    }
}

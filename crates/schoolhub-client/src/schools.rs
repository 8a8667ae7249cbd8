//! `/schools` over HTTP.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use schoolhub_core::error::ApiResult;
use schoolhub_core::model::School;
use schoolhub_core::requests::SchoolDraft;
use schoolhub_core::traits::SchoolApi;
use schoolhub_core::validation::{ensure_valid, validate_school, validate_school_name};

use crate::http::SchoolClient;

#[derive(Serialize)]
struct BlockBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Serialize)]
struct RenameBody<'a> {
    name: &'a str,
}

#[async_trait]
impl SchoolApi for SchoolClient {
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn create_school(&self, draft: &SchoolDraft) -> ApiResult<School> {
        ensure_valid(validate_school(draft))?;
        self.json(self.request(Method::POST, "/schools").json(draft))
            .await
    }

    #[instrument(skip(self))]
    async fn current_school(&self) -> ApiResult<School> {
        self.json(self.request(Method::GET, "/schools/current"))
            .await
    }

    #[instrument(skip(self))]
    async fn toggle_block(&self, school_id: &str, reason: Option<&str>) -> ApiResult<School> {
        self.json(
            self.request(Method::PATCH, &format!("/schools/{school_id}/toggle-block"))
                .json(&BlockBody { reason }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn rename_school(&self, school_id: &str, name: &str) -> ApiResult<School> {
        ensure_valid(validate_school_name(name))?;
        self.json(
            self.request(Method::PATCH, &format!("/schools/{school_id}"))
                .json(&RenameBody { name }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use schoolhub_core::requests::AdminDraft;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SchoolClient {
        SchoolClient::new(&ClientConfig {
            base_url: server.uri(),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn block_sends_reason() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/schools/sch-1/toggle-block"))
            .and(body_json(json!({"reason": "unpaid"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "sch-1", "name": "Lycée Hugo", "isActive": false, "blockReason": "unpaid"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let school = client_for(&server)
            .toggle_block("sch-1", Some("unpaid"))
            .await
            .unwrap();
        assert!(school.is_blocked());
        assert_eq!(school.block_reason.as_deref(), Some("unpaid"));
    }

    #[tokio::test]
    async fn create_with_bad_admin_is_rejected_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/schools"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let draft = SchoolDraft {
            name: "X".into(),
            admin: AdminDraft {
                first_name: "Ada".into(),
                last_name: "L".into(),
                email: "no-at-sign".into(),
                password: "123".into(),
            },
        };
        let err = client_for(&server).create_school(&draft).await.unwrap_err();
        match err {
            schoolhub_core::error::ApiError::Validation(fields) => assert_eq!(fields.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rename_patches_name() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/schools/sch-1"))
            .and(body_json(json!({"name": "Lycée Victor Hugo"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "sch-1", "name": "Lycée Victor Hugo"
            })))
            .mount(&server)
            .await;

        let school = client_for(&server)
            .rename_school("sch-1", "Lycée Victor Hugo")
            .await
            .unwrap();
        assert_eq!(school.name, "Lycée Victor Hugo");
        assert!(!school.is_blocked());
    }
}

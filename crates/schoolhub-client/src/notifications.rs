//! `/notifications` over HTTP.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use schoolhub_core::error::{ApiError, ApiResult, FieldError};
use schoolhub_core::model::{Notification, Page};
use schoolhub_core::requests::{AttachmentUpload, NotificationDraft, NotificationQuery};
use schoolhub_core::traits::NotificationApi;
use schoolhub_core::validation::{ensure_valid, validate_notification, FormMode};

use crate::http::SchoolClient;

/// Multipart field carrying each attachment.
const ATTACHMENT_FIELD: &str = "attachments";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadManyBody<'a> {
    notification_ids: &'a [String],
}

#[derive(Deserialize)]
struct UnreadCountBody {
    #[serde(alias = "unreadCount")]
    count: u64,
}

/// Flatten the draft into text fields and append one file part per
/// attachment.
fn multipart_form(draft: &NotificationDraft, attachments: &[AttachmentUpload]) -> ApiResult<Form> {
    let fields = serde_json::to_value(draft).map_err(|e| ApiError::Decode(e.to_string()))?;
    let mut form = Form::new();
    if let serde_json::Value::Object(map) = fields {
        for (name, value) in map {
            let text = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            form = form.text(name, text);
        }
    }

    for file in attachments {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.mime_type)
            .map_err(|_| {
                ApiError::Validation(vec![FieldError::new(
                    ATTACHMENT_FIELD,
                    format!("{} has an invalid MIME type", file.filename),
                )])
            })?;
        form = form.part(ATTACHMENT_FIELD, part);
    }
    Ok(form)
}

#[async_trait]
impl NotificationApi for SchoolClient {
    #[instrument(skip(self, draft, attachments), fields(title = %draft.title, files = attachments.len()))]
    async fn create_notification(
        &self,
        draft: &NotificationDraft,
        attachments: &[AttachmentUpload],
    ) -> ApiResult<Notification> {
        ensure_valid(validate_notification(
            draft,
            attachments,
            FormMode::Create,
            Utc::now(),
        ))?;
        let form = multipart_form(draft, attachments)?;
        self.json(self.request(Method::POST, "/notifications").multipart(form))
            .await
    }

    #[instrument(skip(self, query))]
    async fn list_notifications(
        &self,
        query: &NotificationQuery,
    ) -> ApiResult<Page<Notification>> {
        self.json(
            self.request(Method::GET, "/notifications")
                .query(&query.to_pairs()),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_notification(&self, notification_id: &str) -> ApiResult<Notification> {
        self.json(self.request(Method::GET, &format!("/notifications/{notification_id}")))
            .await
    }

    #[instrument(skip(self, draft))]
    async fn update_notification(
        &self,
        notification_id: &str,
        draft: &NotificationDraft,
    ) -> ApiResult<Notification> {
        ensure_valid(validate_notification(
            draft,
            &[],
            FormMode::Update,
            Utc::now(),
        ))?;
        self.json(
            self.request(Method::PUT, &format!("/notifications/{notification_id}"))
                .json(draft),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_notification(&self, notification_id: &str) -> ApiResult<()> {
        self.empty(self.request(Method::DELETE, &format!("/notifications/{notification_id}")))
            .await
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, notification_id: &str) -> ApiResult<()> {
        self.empty(self.request(
            Method::PATCH,
            &format!("/notifications/{notification_id}/read"),
        ))
        .await
    }

    #[instrument(skip(self, notification_ids), fields(count = notification_ids.len()))]
    async fn mark_many_read(&self, notification_ids: &[String]) -> ApiResult<()> {
        if notification_ids.is_empty() {
            return Ok(());
        }
        self.empty(
            self.request(Method::PATCH, "/notifications/read")
                .json(&ReadManyBody { notification_ids }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self) -> ApiResult<()> {
        self.empty(self.request(Method::PATCH, "/notifications/read-all"))
            .await
    }

    #[instrument(skip(self))]
    async fn download_attachment(
        &self,
        notification_id: &str,
        attachment_id: &str,
    ) -> ApiResult<Vec<u8>> {
        self.bytes(self.request(
            Method::GET,
            &format!("/notifications/{notification_id}/attachments/{attachment_id}"),
        ))
        .await
    }

    #[instrument(skip(self, query))]
    async fn search_notifications(
        &self,
        text: &str,
        query: &NotificationQuery,
    ) -> ApiResult<Page<Notification>> {
        let mut pairs = query.to_pairs();
        pairs.push(("q", text.to_string()));
        self.json(
            self.request(Method::GET, "/notifications/search")
                .query(&pairs),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn unread_count(&self) -> ApiResult<u64> {
        let body: UnreadCountBody = self
            .json(self.request(Method::GET, "/notifications/unread-count"))
            .await?;
        Ok(body.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use schoolhub_core::model::{Priority, TargetAudience};
    use schoolhub_core::validation::MAX_ATTACHMENTS;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SchoolClient {
        SchoolClient::new(&ClientConfig {
            base_url: server.uri(),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    fn notification_json(id: &str) -> serde_json::Value {
        json!({
            "_id": id,
            "title": "Sortie scolaire",
            "content": "Départ à 8h devant le lycée.",
            "type": "announcement",
            "priority": "high",
            "targetAudience": "students",
            "attachments": [{"_id": "att-1", "filename": "plan.pdf", "originalName": "Plan.pdf", "mimetype": "application/pdf", "size": 2048}],
            "readBy": [{"user": "stu-1"}]
        })
    }

    fn upload(name: &str, size: usize) -> AttachmentUpload {
        AttachmentUpload {
            filename: name.into(),
            mime_type: "application/pdf".into(),
            bytes: vec![0u8; size],
        }
    }

    #[tokio::test]
    async fn create_sends_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notifications"))
            .and(body_string_contains("Sortie scolaire"))
            .and(body_string_contains("filename=\"plan.pdf\""))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": notification_json("n1")
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut draft = NotificationDraft::new("Sortie scolaire", "Départ à 8h devant le lycée.");
        draft.priority = Priority::High;
        draft.target_audience = TargetAudience::Students;
        let created = client_for(&server)
            .create_notification(&draft, &[upload("plan.pdf", 16)])
            .await
            .unwrap();
        assert_eq!(created.attachments[0].display_name(), "Plan.pdf");
        assert!(created.is_read_by("stu-1"));
    }

    #[tokio::test]
    async fn attachment_limits_checked_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notifications"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let draft = NotificationDraft::new("Sortie scolaire", "Départ à 8h devant le lycée.");
        let files: Vec<_> = (0..=MAX_ATTACHMENTS)
            .map(|i| upload(&format!("f{i}.pdf"), 1))
            .collect();
        let err = client_for(&server)
            .create_notification(&draft, &files)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn unread_count_accepts_both_shapes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notifications/unread-count"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"unreadCount": 4}})),
            )
            .mount(&server)
            .await;
        assert_eq!(client_for(&server).unread_count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn list_filters_unread() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notifications"))
            .and(query_param("unread", "true"))
            .and(query_param("priority", "urgent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "notifications": [notification_json("n1"), notification_json("n2")],
                "pagination": {"currentPage": 1, "totalPages": 3, "totalItems": 6, "pageSize": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = NotificationQuery {
            priority: Some(Priority::Urgent),
            unread_only: true,
            ..Default::default()
        };
        let page = client_for(&server).list_notifications(&query).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.pagination.has_next());
    }

    #[tokio::test]
    async fn bulk_read_and_search() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/notifications/read"))
            .and(body_json(json!({"notificationIds": ["n1", "n2"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/notifications/search"))
            .and(query_param("q", "sortie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [notification_json("n1")]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        client
            .mark_many_read(&["n1".to_string(), "n2".to_string()])
            .await
            .unwrap();
        client.mark_many_read(&[]).await.unwrap();
        let found = client
            .search_notifications("sortie", &NotificationQuery::default())
            .await
            .unwrap();
        assert_eq!(found.items.len(), 1);
    }

    #[tokio::test]
    async fn download_returns_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notifications/n1/attachments/att-1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
            .mount(&server)
            .await;

        let bytes = client_for(&server)
            .download_attachment("n1", "att-1")
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.7");
    }
}

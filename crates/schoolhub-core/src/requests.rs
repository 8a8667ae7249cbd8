//! Request bodies and query parameters for the service layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{
    Difficulty, ExerciseMetadata, ExerciseType, NotificationType, Priority, Question,
    TargetAudience,
};

/// Filters for `GET /exercises`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub class: Option<String>,
    pub subject: Option<String>,
    pub kind: Option<ExerciseType>,
}

impl ExerciseQuery {
    pub fn for_class(class_id: impl Into<String>) -> Self {
        Self {
            class: Some(class_id.into()),
            ..Default::default()
        }
    }

    /// Query-string pairs, omitting unset filters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(class) = &self.class {
            pairs.push(("class", class.clone()));
        }
        if let Some(subject) = &self.subject {
            pairs.push(("subject", subject.clone()));
        }
        if let Some(kind) = self.kind {
            pairs.push(("type", kind.to_string()));
        }
        pairs
    }
}

/// Filters for `GET /notifications`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub kind: Option<NotificationType>,
    pub priority: Option<Priority>,
    pub unread_only: bool,
}

impl NotificationQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(kind) = self.kind {
            pairs.push(("type", kind.to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.to_string()));
        }
        if self.unread_only {
            pairs.push(("unread", "true".to_string()));
        }
        pairs
    }
}

/// Body for creating or updating an exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDraft {
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ExerciseType,
    pub subject: String,
    pub class: String,
    pub difficulty: Difficulty,
    pub questions: Vec<Question>,
    pub metadata: ExerciseMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Fields of a notification form. Attachments travel separately as
/// multipart parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub priority: Priority,
    pub target_audience: TargetAudience,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl NotificationDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            kind: NotificationType::default(),
            priority: Priority::default(),
            target_audience: TargetAudience::default(),
            target_class: None,
            publish_date: None,
            expiry_date: None,
        }
    }
}

/// A file to attach to a notification.
#[derive(Clone, PartialEq)]
pub struct AttachmentUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AttachmentUpload {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for AttachmentUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentUpload")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Body for creating a school together with its first admin account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolDraft {
    pub name: String,
    pub admin: AdminDraft,
}

/// Bootstrap admin account.
///
/// Note: Custom Debug impl masks the password to keep it out of logs.
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminDraft")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exercise_query_skips_unset_filters() {
        let query = ExerciseQuery {
            kind: Some(ExerciseType::FillBlanks),
            ..ExerciseQuery::for_class("cls-1")
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("class", "cls-1".to_string()),
                ("type", "fill_blanks".to_string())
            ]
        );
        assert!(ExerciseQuery::default().to_pairs().is_empty());
    }

    #[test]
    fn notification_query_pairs() {
        let query = NotificationQuery {
            page: Some(2),
            priority: Some(Priority::Urgent),
            unread_only: true,
            ..Default::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("page", "2".to_string()),
                ("priority", "urgent".to_string()),
                ("unread", "true".to_string())
            ]
        );
    }

    #[test]
    fn admin_password_is_masked() {
        let admin = AdminDraft {
            first_name: "Ada".into(),
            last_name: "L".into(),
            email: "ada@example.org".into(),
            password: "hunter22".into(),
        };
        let debug = format!("{admin:?}");
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn draft_serializes_camel_case() {
        let mut draft = NotificationDraft::new("Sortie", "Sortie au musée vendredi");
        draft.target_audience = TargetAudience::SpecificClass;
        draft.target_class = Some("cls-1".into());
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["targetAudience"], "specific_class");
        assert_eq!(json["targetClass"], "cls-1");
        assert_eq!(json["type"], "general");
        assert!(json.get("publishDate").is_none());
    }
}

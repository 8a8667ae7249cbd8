//! Client-side form validation.
//!
//! Each validator returns every violation at once. A non-empty result means
//! the request must not be sent.

use chrono::{DateTime, Utc};

use crate::error::{ApiError, FieldError};
use crate::model::{Question, TargetAudience};
use crate::requests::{AttachmentUpload, ExerciseDraft, NotificationDraft, SchoolDraft};
use crate::sentence::blank_count;

/// Maximum number of files per notification.
pub const MAX_ATTACHMENTS: usize = 5;

/// Maximum size of one attachment (10 MB).
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

const MIN_TITLE_LEN: usize = 3;
const MIN_CONTENT_LEN: usize = 10;
const MIN_SCHOOL_NAME_LEN: usize = 2;
const MIN_PASSWORD_LEN: usize = 6;

/// Whether a form creates a record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update,
}

/// Turn a list of violations into a `Result`.
pub fn ensure_valid(errors: Vec<FieldError>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

fn check_min_len(errors: &mut Vec<FieldError>, field: &str, value: &str, min: usize) {
    let len = value.trim().chars().count();
    if len == 0 {
        errors.push(FieldError::new(field, "is required"));
    } else if len < min {
        errors.push(FieldError::new(
            field,
            format!("must be at least {min} characters"),
        ));
    }
}

/// Validate a notification form and its attachments.
///
/// A publish date in the past is only rejected when creating.
pub fn validate_notification(
    draft: &NotificationDraft,
    attachments: &[AttachmentUpload],
    mode: FormMode,
    now: DateTime<Utc>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    check_min_len(&mut errors, "title", &draft.title, MIN_TITLE_LEN);
    check_min_len(&mut errors, "content", &draft.content, MIN_CONTENT_LEN);

    if mode == FormMode::Create {
        if let Some(publish) = draft.publish_date {
            if publish < now {
                errors.push(FieldError::new("publishDate", "must not be in the past"));
            }
        }
    }

    if let Some(expiry) = draft.expiry_date {
        let floor = draft.publish_date.unwrap_or(now);
        if expiry <= floor {
            errors.push(FieldError::new(
                "expiryDate",
                "must be after the publish date",
            ));
        }
    }

    if draft.target_audience == TargetAudience::SpecificClass
        && draft
            .target_class
            .as_deref()
            .map_or(true, |c| c.trim().is_empty())
    {
        errors.push(FieldError::new(
            "targetClass",
            "is required when targeting a specific class",
        ));
    }

    errors.extend(validate_attachments(attachments));
    errors
}

/// Enforce the attachment count and size limits.
pub fn validate_attachments(attachments: &[AttachmentUpload]) -> Vec<FieldError> {
    let sizes: Vec<(&str, u64)> = attachments
        .iter()
        .map(|file| (file.filename.as_str(), file.size()))
        .collect();
    validate_attachment_sizes(&sizes)
}

/// The same limits checked from `(filename, size)` pairs, so files can be
/// rejected before their contents are read.
pub fn validate_attachment_sizes(files: &[(&str, u64)]) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if files.len() > MAX_ATTACHMENTS {
        errors.push(FieldError::new(
            "attachments",
            format!("at most {MAX_ATTACHMENTS} attachments are allowed"),
        ));
    }
    for (filename, size) in files {
        if *size > MAX_ATTACHMENT_BYTES {
            errors.push(FieldError::new(
                "attachments",
                format!("{filename} exceeds the 10 MB limit"),
            ));
        }
    }
    errors
}

/// Validate an exercise form.
pub fn validate_exercise(draft: &ExerciseDraft) -> Vec<FieldError> {
    let mut errors = Vec::new();

    check_min_len(&mut errors, "title", &draft.title, MIN_TITLE_LEN);
    if draft.subject.trim().is_empty() {
        errors.push(FieldError::new("subject", "is required"));
    }
    if draft.class.trim().is_empty() {
        errors.push(FieldError::new("class", "is required"));
    }
    if draft.questions.is_empty() {
        errors.push(FieldError::new("questions", "add at least one question"));
    }
    if draft.metadata.max_attempts == Some(0) {
        errors.push(FieldError::new("metadata.maxAttempts", "must be at least 1"));
    }

    for (index, question) in draft.questions.iter().enumerate() {
        let field = format!("questions[{index}]");
        if question.points() == 0 {
            errors.push(FieldError::new(&field, "points must be positive"));
        }
        match question {
            Question::Qcm(q) => {
                if q.question.trim().is_empty() {
                    errors.push(FieldError::new(&field, "question text is required"));
                }
                if q.options.len() < 2 {
                    errors.push(FieldError::new(&field, "needs at least two options"));
                }
                if !q.options.iter().any(|o| o.is_correct == Some(true)) {
                    errors.push(FieldError::new(&field, "mark at least one option correct"));
                }
            }
            Question::FillBlank(q) => {
                let markers = blank_count(&q.sentence);
                if markers == 0 {
                    errors.push(FieldError::new(&field, "sentence has no ___ blank"));
                } else if markers != q.blanks.len() {
                    errors.push(FieldError::new(
                        &field,
                        format!(
                            "sentence has {markers} blanks but {} answers are defined",
                            q.blanks.len()
                        ),
                    ));
                }
                if q.blanks.iter().any(|b| b.correct_answer.trim().is_empty()) {
                    errors.push(FieldError::new(&field, "every blank needs an answer"));
                }
            }
        }
    }

    errors
}

/// Validate a school creation form.
pub fn validate_school(draft: &SchoolDraft) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_min_len(&mut errors, "name", &draft.name, MIN_SCHOOL_NAME_LEN);
    if draft.admin.first_name.trim().is_empty() {
        errors.push(FieldError::new("admin.firstName", "is required"));
    }
    if draft.admin.last_name.trim().is_empty() {
        errors.push(FieldError::new("admin.lastName", "is required"));
    }
    let email = draft.admin.email.trim();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        errors.push(FieldError::new("admin.email", "must be a valid email"));
    }
    if draft.admin.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "admin.password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    errors
}

/// Validate a new school name.
pub fn validate_school_name(name: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_min_len(&mut errors, "name", name, MIN_SCHOOL_NAME_LEN);
    errors
}

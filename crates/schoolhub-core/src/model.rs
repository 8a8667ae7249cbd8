//! Core data model types for schoolhub.
//!
//! These mirror the REST API's camelCase JSON documents. Every entity is
//! owned by the server; the client only holds transient copies fetched per
//! view.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sentence;

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// An entity that carries its own server identifier.
pub trait Identified {
    fn id(&self) -> &str;
}

/// A link to another entity: the server sends either the bare identifier or
/// the populated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<T> {
    Id(String),
    Embedded(T),
}

impl<T: Identified> Reference<T> {
    /// The identifier of the referenced entity, whichever form it arrived in.
    pub fn resolve_id(&self) -> &str {
        match self {
            Reference::Id(id) => id,
            Reference::Embedded(inner) => inner.id(),
        }
    }

    /// The populated document, if the server embedded it.
    pub fn embedded(&self) -> Option<&T> {
        match self {
            Reference::Id(_) => None,
            Reference::Embedded(inner) => Some(inner),
        }
    }

    /// Whether this reference points at `id`.
    pub fn is(&self, id: &str) -> bool {
        self.resolve_id() == id
    }
}

/// Free-function form of [`Reference::resolve_id`].
pub fn resolve_id<T: Identified>(reference: &Reference<T>) -> &str {
    reference.resolve_id()
}

impl<T> From<&str> for Reference<T> {
    fn from(id: &str) -> Self {
        Reference::Id(id.to_string())
    }
}

impl<T> From<String> for Reference<T> {
    fn from(id: String) -> Self {
        Reference::Id(id)
    }
}

macro_rules! identified {
    ($($ty:ty),* $(,)?) => {
        $(impl Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "superadmin")]
    SuperAdmin,
    Admin,
    Teacher,
    Student,
}

/// Populated user document as embedded in other entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl UserSummary {
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone().unwrap_or_else(|| self.id.clone())
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

identified!(
    UserSummary,
    SubjectSummary,
    ClassSummary,
    SchoolSummary,
    ExerciseSummary
);

pub type UserRef = Reference<UserSummary>;
pub type SubjectRef = Reference<SubjectSummary>;
pub type ClassRef = Reference<ClassSummary>;
pub type SchoolRef = Reference<SchoolSummary>;
pub type ExerciseRef = Reference<ExerciseSummary>;

// ---------------------------------------------------------------------------
// Exercises
// ---------------------------------------------------------------------------

/// Exercise kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Qcm,
    FillBlanks,
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseType::Qcm => write!(f, "qcm"),
            ExerciseType::FillBlanks => write!(f, "fill_blanks"),
        }
    }
}

impl FromStr for ExerciseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "qcm" | "mcq" => Ok(ExerciseType::Qcm),
            "fill_blanks" | "fill-blanks" | "blanks" => Ok(ExerciseType::FillBlanks),
            other => Err(format!("unknown exercise type: {other}")),
        }
    }
}

/// Difficulty tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// An exercise as defined by a teacher. Read-only for students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ExerciseType,
    pub subject: SubjectRef,
    pub class: ClassRef,
    #[serde(default)]
    pub school: Option<SchoolRef>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub total_points: u32,
    #[serde(default)]
    pub metadata: ExerciseMetadata,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Exercise {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Configured attempt limit; unset (or zero) means a single attempt.
    pub fn max_attempts(&self) -> u32 {
        match self.metadata.max_attempts {
            Some(n) if n > 0 => n,
            _ => 1,
        }
    }

    /// Sum of per-question points, used when `total_points` was not sent.
    pub fn computed_total_points(&self) -> u32 {
        if self.total_points > 0 {
            return self.total_points;
        }
        self.questions.iter().map(Question::points).sum()
    }

    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| due < now)
    }
}

impl Identified for Exercise {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Display and attempt settings for an exercise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseMetadata {
    #[serde(default)]
    pub instructions: Option<String>,
    /// Estimated duration in minutes.
    #[serde(default)]
    pub estimated_time: Option<u32>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub shuffle_questions: bool,
    #[serde(default)]
    pub shuffle_options: bool,
}

/// One question; its shape follows the exercise type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Question {
    Qcm(QcmQuestion),
    FillBlank(FillBlankQuestion),
}

impl Question {
    pub fn points(&self) -> u32 {
        match self {
            Question::Qcm(q) => q.points,
            Question::FillBlank(q) => q.points,
        }
    }

    pub fn as_qcm(&self) -> Option<&QcmQuestion> {
        match self {
            Question::Qcm(q) => Some(q),
            Question::FillBlank(_) => None,
        }
    }

    pub fn as_fill_blank(&self) -> Option<&FillBlankQuestion> {
        match self {
            Question::FillBlank(q) => Some(q),
            Question::Qcm(_) => None,
        }
    }
}

fn default_points() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QcmQuestion {
    pub question: String,
    pub options: Vec<QcmOption>,
    #[serde(default = "default_points")]
    pub points: u32,
}

impl QcmQuestion {
    /// Identifiers of the options flagged correct (empty for student views).
    pub fn correct_option_ids(&self) -> Vec<String> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_correct == Some(true))
            .map(|(i, o)| o.key(i))
            .collect()
    }

    pub fn option_by_key(&self, key: &str) -> Option<&QcmOption> {
        self.options
            .iter()
            .enumerate()
            .find(|(i, o)| o.key(*i) == key)
            .map(|(_, o)| o)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QcmOption {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub text: String,
    /// Hidden from students; only present in teacher views and reviews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

impl QcmOption {
    /// Identifier submitted for this option. Falls back to its position when
    /// the server did not assign one.
    pub fn key(&self, position: usize) -> String {
        if self.id.is_empty() {
            position.to_string()
        } else {
            self.id.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillBlankQuestion {
    /// Template with one `___` marker per blank.
    pub sentence: String,
    #[serde(default)]
    pub blanks: Vec<BlankDefinition>,
    #[serde(default = "default_points")]
    pub points: u32,
}

impl FillBlankQuestion {
    pub fn parts(&self) -> Vec<sentence::SentencePart> {
        sentence::parse_sentence(&self.sentence)
    }

    /// Whether the marker count agrees with the blank definitions.
    pub fn is_consistent(&self) -> bool {
        sentence::blank_count(&self.sentence) == self.blanks.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlankDefinition {
    pub correct_answer: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl BlankDefinition {
    /// Trimmed, case-insensitive match against the answer and alternatives.
    pub fn accepts(&self, answer: &str) -> bool {
        let answer = answer.trim().to_lowercase();
        if answer.is_empty() {
            return false;
        }
        std::iter::once(&self.correct_answer)
            .chain(self.alternatives.iter())
            .any(|candidate| candidate.trim().to_lowercase() == answer)
    }
}

/// Result of fetching one exercise: the definition plus the caller's latest
/// attempt, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseWithProgress {
    pub exercise: Exercise,
    #[serde(default)]
    pub progress: Option<StudentProgress>,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

fn first_attempt() -> u32 {
    1
}

/// One graded attempt of an exercise by a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub student: UserRef,
    pub exercise: ExerciseRef,
    #[serde(default)]
    pub subject: Option<SubjectRef>,
    #[serde(default)]
    pub class: Option<ClassRef>,
    #[serde(default)]
    pub qcm_answers: Vec<QcmAnswerRecord>,
    #[serde(default)]
    pub fill_blank_answers: Vec<FillBlankAnswerRecord>,
    /// Points earned across the attempt.
    #[serde(default)]
    pub total_points: f64,
    #[serde(default)]
    pub max_points: f64,
    /// Percentage in `0..=100`.
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Seconds.
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default = "first_attempt")]
    pub attempt_number: u32,
}

impl StudentProgress {
    pub fn is_perfect(&self) -> bool {
        self.accuracy >= 100.0 - f64::EPSILON
    }

    pub fn qcm_record(&self, question_index: usize) -> Option<&QcmAnswerRecord> {
        self.qcm_answers
            .iter()
            .find(|a| a.question_index == question_index)
    }

    pub fn fill_blank_record(&self, question_index: usize) -> Option<&FillBlankAnswerRecord> {
        self.fill_blank_answers
            .iter()
            .find(|a| a.question_index == question_index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QcmAnswerRecord {
    pub question_index: usize,
    #[serde(default)]
    pub selected_option: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub points_earned: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillBlankAnswerRecord {
    pub question_index: usize,
    #[serde(default, alias = "answers")]
    pub blanks: Vec<BlankAnswerRecord>,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub points_earned: f64,
}

impl FillBlankAnswerRecord {
    pub fn blank(&self, blank_index: usize) -> Option<&BlankAnswerRecord> {
        self.blanks.iter().find(|b| b.blank_index == blank_index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlankAnswerRecord {
    pub blank_index: usize,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub points_earned: f64,
}

/// Server-computed overview of one student's progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOverview {
    #[serde(default)]
    pub total_exercises: u32,
    #[serde(default)]
    pub completed_exercises: u32,
    #[serde(default)]
    pub average_accuracy: f64,
    #[serde(default)]
    pub total_time_spent: u64,
    #[serde(default)]
    pub by_subject: Vec<SubjectProgress>,
    #[serde(default)]
    pub recent: Vec<StudentProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    pub subject: SubjectRef,
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub average_accuracy: f64,
}

/// Server-computed progress of a whole class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassProgress {
    #[serde(default)]
    pub total_exercises: u32,
    #[serde(default)]
    pub students: Vec<ClassStudentProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStudentProgress {
    pub student: UserRef,
    #[serde(default)]
    pub completed_exercises: u32,
    #[serde(default)]
    pub average_accuracy: f64,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
}

/// Server-computed statistics for one exercise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseAnalytics {
    #[serde(default)]
    pub total_attempts: u32,
    #[serde(default)]
    pub unique_students: u32,
    #[serde(default)]
    pub average_accuracy: f64,
    #[serde(default)]
    pub average_time_spent: f64,
    #[serde(default)]
    pub question_stats: Vec<QuestionStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStat {
    pub question_index: usize,
    #[serde(default)]
    pub correct_rate: f64,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    #[default]
    General,
    Class,
    Exam,
    Schedule,
    Announcement,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetAudience {
    #[default]
    All,
    Students,
    Teachers,
    #[serde(alias = "class")]
    SpecificClass,
}

macro_rules! lowercase_enum_text {
    ($ty:ident { $($variant:ident => $text:literal),* $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($ty::$variant => f.write_str($text),)*
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)*
                    other => Err(format!("unknown {}: {other}", stringify!($ty))),
                }
            }
        }
    };
}

lowercase_enum_text!(NotificationType {
    General => "general",
    Class => "class",
    Exam => "exam",
    Schedule => "schedule",
    Announcement => "announcement",
});

lowercase_enum_text!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

lowercase_enum_text!(TargetAudience {
    All => "all",
    Students => "students",
    Teachers => "teachers",
    SpecificClass => "specific_class",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub target_class: Option<ClassRef>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub read_by: Vec<ReadMarker>,
    #[serde(default)]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Notification {
    pub fn is_read_by(&self, user_id: &str) -> bool {
        self.read_by.iter().any(|m| m.user.is(user_id))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry <= now)
    }

    pub fn attachment(&self, attachment_id: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.id == attachment_id)
    }
}

impl Identified for Notification {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default, alias = "mimetype")]
    pub mime_type: String,
    /// Bytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default, alias = "path")]
    pub url: String,
}

impl Attachment {
    pub fn display_name(&self) -> &str {
        self.original_name.as_deref().unwrap_or(&self.filename)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadMarker {
    pub user: UserRef,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Schools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub admin: Option<UserRef>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub block_reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl School {
    pub fn is_blocked(&self) -> bool {
        !self.is_active
    }
}

impl Identified for School {
    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "first_page", alias = "currentPage")]
    pub page: u32,
    #[serde(default, alias = "pageSize")]
    pub limit: u32,
    #[serde(default, alias = "totalItems")]
    pub total: u64,
    #[serde(default, alias = "totalPages")]
    pub pages: u32,
}

fn first_page() -> u32 {
    1
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 0,
            total: 0,
            pages: 0,
        }
    }
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

/// One page of a paged listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(alias = "data", alias = "exercises", alias = "notifications")]
    pub items: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn single(items: Vec<T>) -> Self {
        let total = items.len() as u64;
        Self {
            pagination: Pagination {
                page: 1,
                limit: items.len() as u32,
                total,
                pages: 1,
            },
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_accepts_id_or_document() {
        let bare: SubjectRef = serde_json::from_str(r#""sub-1""#).unwrap();
        let embedded: SubjectRef =
            serde_json::from_str(r#"{"_id": "sub-1", "name": "Maths"}"#).unwrap();
        assert_eq!(resolve_id(&bare), "sub-1");
        assert_eq!(resolve_id(&embedded), "sub-1");
        assert!(bare.embedded().is_none());
        assert_eq!(embedded.embedded().unwrap().name, "Maths");
    }

    #[test]
    fn exercise_type_display_and_parse() {
        assert_eq!(ExerciseType::FillBlanks.to_string(), "fill_blanks");
        assert_eq!("QCM".parse::<ExerciseType>().unwrap(), ExerciseType::Qcm);
        assert_eq!(
            "fill-blanks".parse::<ExerciseType>().unwrap(),
            ExerciseType::FillBlanks
        );
        assert!("essay".parse::<ExerciseType>().is_err());
    }

    #[test]
    fn questions_decode_by_shape() {
        let json = r#"{
            "_id": "ex-1",
            "title": "Animaux",
            "type": "fill_blanks",
            "subject": "sub-1",
            "class": {"_id": "cls-1", "name": "6A"},
            "questions": [
                {"sentence": "Le ___ est ___.", "blanks": [{"correctAnswer": "chat"}, {"correctAnswer": "noir", "alternatives": ["sombre"]}], "points": 2}
            ],
            "metadata": {"maxAttempts": 2}
        }"#;
        let exercise: Exercise = serde_json::from_str(json).unwrap();
        assert_eq!(exercise.kind, ExerciseType::FillBlanks);
        assert_eq!(exercise.max_attempts(), 2);
        let question = exercise.questions[0].as_fill_blank().unwrap();
        assert!(question.is_consistent());
        assert!(question.blanks[1].accepts(" Sombre "));
        assert_eq!(exercise.computed_total_points(), 2);

        let qcm: Question = serde_json::from_str(
            r#"{"question": "2+2?", "options": [{"_id": "a", "text": "4", "isCorrect": true}, {"_id": "b", "text": "5"}]}"#,
        )
        .unwrap();
        let qcm = qcm.as_qcm().unwrap();
        assert_eq!(qcm.points, 1);
        assert_eq!(qcm.correct_option_ids(), vec!["a".to_string()]);
    }

    #[test]
    fn max_attempts_defaults_to_one() {
        let mut metadata = ExerciseMetadata::default();
        let exercise = |metadata: ExerciseMetadata| Exercise {
            id: "e".into(),
            title: "t".into(),
            description: String::new(),
            kind: ExerciseType::Qcm,
            subject: "s".into(),
            class: "c".into(),
            school: None,
            created_by: None,
            difficulty: Difficulty::Easy,
            questions: vec![],
            total_points: 0,
            metadata,
            due_date: None,
            created_at: None,
        };
        assert_eq!(exercise(metadata.clone()).max_attempts(), 1);
        metadata.max_attempts = Some(0);
        assert_eq!(exercise(metadata.clone()).max_attempts(), 1);
        metadata.max_attempts = Some(3);
        assert_eq!(exercise(metadata).max_attempts(), 3);
    }

    #[test]
    fn page_accepts_data_alias() {
        let page: Page<SchoolSummary> = serde_json::from_str(
            r#"{"data": [{"_id": "s1", "name": "Lycée"}], "pagination": {"page": 1, "limit": 10, "total": 1, "pages": 1}}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(!page.pagination.has_next());
    }

    #[test]
    fn notification_read_markers() {
        let n: Notification = serde_json::from_str(
            r#"{"_id": "n1", "title": "Exam", "type": "exam", "priority": "urgent", "targetAudience": "class",
                "readBy": [{"user": "u1", "readAt": "2026-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();
        assert_eq!(n.target_audience, TargetAudience::SpecificClass);
        assert!(n.is_read_by("u1"));
        assert!(!n.is_read_by("u2"));
        assert!(n.is_active);
        assert!(Priority::Urgent > Priority::High);
    }
}

//! In-memory backend for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use schoolhub_core::error::{ApiError, ApiResult};
use schoolhub_core::model::{
    BlankAnswerRecord, ClassProgress, ClassStudentProgress, Exercise, ExerciseAnalytics,
    ExerciseWithProgress, FillBlankAnswerRecord, Notification, Page, QcmAnswerRecord, Question,
    ReadMarker, Reference, School, StudentOverview, StudentProgress,
};
use schoolhub_core::requests::{
    AttachmentUpload, ExerciseDraft, ExerciseQuery, NotificationDraft, NotificationQuery,
    SchoolDraft,
};
use schoolhub_core::sentence::answer_slots;
use schoolhub_core::submission::{SubmissionPayload, SubmittedAnswers};
use schoolhub_core::traits::{ExerciseApi, NotificationApi, ProgressApi, SchoolApi};
use schoolhub_core::validation::{
    ensure_valid, validate_exercise, validate_notification, validate_school, FormMode,
};

#[derive(Default)]
struct MockState {
    user_id: String,
    exercises: Vec<Exercise>,
    progress: Vec<StudentProgress>,
    notifications: Vec<Notification>,
    school: Option<School>,
    files: HashMap<(String, String), Vec<u8>>,
    failures: HashMap<String, ApiError>,
    last_submission: Option<SubmissionPayload>,
}

/// A fake school API that keeps everything in memory and grades
/// submissions the way the server does.
///
/// Every call can be delayed by a fixed latency, and any resource id can be
/// made to fail with a chosen error.
pub struct MockBackend {
    state: Mutex<MockState>,
    latency: Mutex<Option<Duration>>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Number of unread-count polls.
    unread_polls: AtomicU32,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("stu-1")
    }
}

impl MockBackend {
    /// Create an empty backend acting on behalf of `user_id`.
    pub fn new(user_id: &str) -> Self {
        Self {
            state: Mutex::new(MockState {
                user_id: user_id.to_string(),
                ..MockState::default()
            }),
            latency: Mutex::new(None),
            call_count: AtomicU32::new(0),
            unread_polls: AtomicU32::new(0),
        }
    }

    pub fn with_exercise(self, exercise: Exercise) -> Self {
        self.state().exercises.push(exercise);
        self
    }

    pub fn with_progress(self, progress: StudentProgress) -> Self {
        self.state().progress.push(progress);
        self
    }

    pub fn with_notification(self, notification: Notification) -> Self {
        self.state().notifications.push(notification);
        self
    }

    pub fn with_school(self, school: School) -> Self {
        self.state().school = Some(school);
        self
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self
            .latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(latency);
    }

    /// Make every call that names `id` fail with `error`.
    pub fn fail_on(&self, id: &str, error: ApiError) {
        self.state().failures.insert(id.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Get the number of calls made to this backend.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn unread_polls(&self) -> u32 {
        self.unread_polls.load(Ordering::Relaxed)
    }

    /// Get the last submission received.
    pub fn last_submission(&self) -> Option<SubmissionPayload> {
        self.state().last_submission.clone()
    }

    /// Attempts recorded so far.
    pub fn progress(&self) -> Vec<StudentProgress> {
        self.state().progress.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call, wait out the latency, then fail if any of `ids` is
    /// marked failing.
    async fn enter(&self, ids: &[&str]) -> ApiResult<()> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let latency = *self
            .latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let state = self.state();
        match ids.iter().find_map(|id| state.failures.get(*id)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn exercise(state: &MockState, exercise_id: &str) -> ApiResult<Exercise> {
        state
            .exercises
            .iter()
            .find(|e| e.id == exercise_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("exercise {exercise_id}")))
    }

    fn notification_index(state: &MockState, notification_id: &str) -> ApiResult<usize> {
        state
            .notifications
            .iter()
            .position(|n| n.id == notification_id)
            .ok_or_else(|| ApiError::NotFound(format!("notification {notification_id}")))
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn paginate<T: Clone>(items: &[T], page: Option<u32>, limit: Option<u32>) -> Page<T> {
    let limit = limit.filter(|&l| l > 0).unwrap_or(items.len().max(1) as u32);
    let page = page.filter(|&p| p > 0).unwrap_or(1);
    let start = ((page - 1) * limit) as usize;
    let slice: Vec<T> = items
        .iter()
        .skip(start)
        .take(limit as usize)
        .cloned()
        .collect();
    let total = items.len() as u64;
    Page {
        items: slice,
        pagination: schoolhub_core::model::Pagination {
            page,
            limit,
            total,
            pages: (total as u32).div_ceil(limit),
        },
    }
}

/// Grade a submission against the full exercise definition.
fn grade(
    exercise: &Exercise,
    payload: &SubmissionPayload,
    student_id: &str,
    attempt_number: u32,
) -> StudentProgress {
    let mut qcm_answers = Vec::new();
    let mut fill_blank_answers = Vec::new();
    let mut earned = 0.0;
    let mut max = 0.0;

    for (index, question) in exercise.questions.iter().enumerate() {
        let points = f64::from(question.points());
        max += points;
        match (question, &payload.answers) {
            (Question::Qcm(q), SubmittedAnswers::Qcm(selected)) => {
                let selected = selected.get(index).cloned().unwrap_or_default();
                let is_correct =
                    !selected.is_empty() && q.correct_option_ids().contains(&selected);
                let points_earned = if is_correct { points } else { 0.0 };
                earned += points_earned;
                qcm_answers.push(QcmAnswerRecord {
                    question_index: index,
                    selected_option: selected,
                    is_correct,
                    points_earned,
                });
            }
            (Question::FillBlank(q), SubmittedAnswers::FillBlanks(answers)) => {
                let values = answers
                    .get(index)
                    .map(|a| a.blanks.clone())
                    .unwrap_or_default();
                let slots = answer_slots(q).max(1);
                let per_blank = points / slots as f64;
                let blanks: Vec<BlankAnswerRecord> = q
                    .blanks
                    .iter()
                    .enumerate()
                    .map(|(blank_index, definition)| {
                        let answer = values.get(blank_index).cloned().unwrap_or_default();
                        let is_correct = definition.accepts(&answer);
                        BlankAnswerRecord {
                            blank_index,
                            answer,
                            is_correct,
                            points_earned: if is_correct { per_blank } else { 0.0 },
                        }
                    })
                    .collect();
                let points_earned: f64 = blanks.iter().map(|b| b.points_earned).sum();
                earned += points_earned;
                fill_blank_answers.push(FillBlankAnswerRecord {
                    question_index: index,
                    is_correct: !blanks.is_empty() && blanks.iter().all(|b| b.is_correct),
                    blanks,
                    points_earned,
                });
            }
            _ => {}
        }
    }

    let now = Utc::now();
    StudentProgress {
        id: new_id(),
        student: Reference::Id(student_id.to_string()),
        exercise: Reference::Id(exercise.id.clone()),
        subject: Some(exercise.subject.resolve_id().into()),
        class: Some(exercise.class.resolve_id().into()),
        qcm_answers,
        fill_blank_answers,
        total_points: earned,
        max_points: max,
        accuracy: if max > 0.0 { earned / max * 100.0 } else { 0.0 },
        started_at: Some(now),
        completed_at: Some(now),
        time_spent: 0,
        attempt_number,
    }
}

fn exercise_from_draft(id: String, draft: &ExerciseDraft, creator: &str) -> Exercise {
    Exercise {
        id,
        title: draft.title.clone(),
        description: draft.description.clone(),
        kind: draft.kind,
        subject: draft.subject.as_str().into(),
        class: draft.class.as_str().into(),
        school: None,
        created_by: Some(creator.into()),
        difficulty: draft.difficulty,
        total_points: draft.questions.iter().map(Question::points).sum(),
        questions: draft.questions.clone(),
        metadata: draft.metadata.clone(),
        due_date: draft.due_date,
        created_at: Some(Utc::now()),
    }
}

fn apply_draft(notification: &mut Notification, draft: &NotificationDraft) {
    notification.title = draft.title.clone();
    notification.content = draft.content.clone();
    notification.kind = draft.kind;
    notification.priority = draft.priority;
    notification.target_audience = draft.target_audience;
    notification.target_class = draft.target_class.as_deref().map(Into::into);
    notification.publish_date = draft.publish_date;
    notification.expiry_date = draft.expiry_date;
}

// ---------------------------------------------------------------------------
// Exercises
// ---------------------------------------------------------------------------

#[async_trait]
impl ExerciseApi for MockBackend {
    async fn create_exercise(&self, draft: &ExerciseDraft) -> ApiResult<Exercise> {
        self.enter(&[]).await?;
        ensure_valid(validate_exercise(draft))?;
        let mut state = self.state();
        let exercise = exercise_from_draft(new_id(), draft, &state.user_id);
        state.exercises.push(exercise.clone());
        Ok(exercise)
    }

    async fn list_exercises(&self, query: &ExerciseQuery) -> ApiResult<Page<Exercise>> {
        self.enter(&[]).await?;
        let state = self.state();
        let matching: Vec<Exercise> = state
            .exercises
            .iter()
            .filter(|e| query.class.as_deref().map_or(true, |c| e.class.is(c)))
            .filter(|e| query.subject.as_deref().map_or(true, |s| e.subject.is(s)))
            .filter(|e| query.kind.map_or(true, |k| e.kind == k))
            .cloned()
            .collect();
        Ok(paginate(&matching, query.page, query.limit))
    }

    async fn get_exercise(&self, exercise_id: &str) -> ApiResult<ExerciseWithProgress> {
        self.enter(&[exercise_id]).await?;
        let state = self.state();
        let exercise = Self::exercise(&state, exercise_id)?;
        let progress = state
            .progress
            .iter()
            .filter(|p| p.exercise.is(exercise_id) && p.student.is(&state.user_id))
            .max_by_key(|p| p.attempt_number)
            .cloned();
        Ok(ExerciseWithProgress { exercise, progress })
    }

    async fn update_exercise(
        &self,
        exercise_id: &str,
        draft: &ExerciseDraft,
    ) -> ApiResult<Exercise> {
        self.enter(&[exercise_id]).await?;
        ensure_valid(validate_exercise(draft))?;
        let mut state = self.state();
        let creator = state.user_id.clone();
        let slot = state
            .exercises
            .iter_mut()
            .find(|e| e.id == exercise_id)
            .ok_or_else(|| ApiError::NotFound(format!("exercise {exercise_id}")))?;
        *slot = exercise_from_draft(exercise_id.to_string(), draft, &creator);
        Ok(slot.clone())
    }

    async fn delete_exercise(&self, exercise_id: &str) -> ApiResult<()> {
        self.enter(&[exercise_id]).await?;
        let mut state = self.state();
        Self::exercise(&state, exercise_id)?;
        state.exercises.retain(|e| e.id != exercise_id);
        state.progress.retain(|p| !p.exercise.is(exercise_id));
        Ok(())
    }

    async fn submit_answers(
        &self,
        exercise_id: &str,
        payload: &SubmissionPayload,
    ) -> ApiResult<StudentProgress> {
        self.enter(&[exercise_id]).await?;
        let mut state = self.state();
        let exercise = Self::exercise(&state, exercise_id)?;
        let student_id = state.user_id.clone();
        let used = state
            .progress
            .iter()
            .filter(|p| p.exercise.is(exercise_id) && p.student.is(&student_id))
            .count() as u32;
        if used >= exercise.max_attempts() {
            return Err(ApiError::Server {
                status: 400,
                message: "Maximum attempts reached".into(),
            });
        }

        let progress = grade(&exercise, payload, &student_id, used + 1);
        state.last_submission = Some(payload.clone());
        state.progress.push(progress.clone());
        Ok(progress)
    }

    async fn student_progress(
        &self,
        exercise_id: &str,
        student_id: &str,
    ) -> ApiResult<Vec<StudentProgress>> {
        self.enter(&[exercise_id, student_id]).await?;
        let state = self.state();
        Self::exercise(&state, exercise_id)?;
        let mut attempts: Vec<StudentProgress> = state
            .progress
            .iter()
            .filter(|p| p.exercise.is(exercise_id) && p.student.is(student_id))
            .cloned()
            .collect();
        attempts.sort_by_key(|p| p.attempt_number);
        Ok(attempts)
    }

    async fn exercises_by_subject(&self, subject_id: &str) -> ApiResult<Vec<Exercise>> {
        self.enter(&[subject_id]).await?;
        Ok(self
            .state()
            .exercises
            .iter()
            .filter(|e| e.subject.is(subject_id))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[async_trait]
impl ProgressApi for MockBackend {
    async fn student_overview(&self, student_id: &str) -> ApiResult<StudentOverview> {
        self.enter(&[student_id]).await?;
        let state = self.state();
        let attempts: Vec<&StudentProgress> = state
            .progress
            .iter()
            .filter(|p| p.student.is(student_id))
            .collect();
        let mut completed: Vec<&str> = attempts.iter().map(|p| p.exercise.resolve_id()).collect();
        completed.sort_unstable();
        completed.dedup();
        let average = if attempts.is_empty() {
            0.0
        } else {
            attempts.iter().map(|p| p.accuracy).sum::<f64>() / attempts.len() as f64
        };
        Ok(StudentOverview {
            total_exercises: state.exercises.len() as u32,
            completed_exercises: completed.len() as u32,
            average_accuracy: average,
            total_time_spent: attempts.iter().map(|p| p.time_spent).sum(),
            by_subject: vec![],
            recent: attempts.into_iter().rev().take(5).cloned().collect(),
        })
    }

    async fn class_progress(&self, class_id: &str) -> ApiResult<ClassProgress> {
        self.enter(&[class_id]).await?;
        let state = self.state();
        let mut by_student: HashMap<String, Vec<&StudentProgress>> = HashMap::new();
        for p in state
            .progress
            .iter()
            .filter(|p| p.class.as_ref().is_some_and(|c| c.is(class_id)))
        {
            by_student
                .entry(p.student.resolve_id().to_string())
                .or_default()
                .push(p);
        }
        let mut students: Vec<ClassStudentProgress> = by_student
            .into_iter()
            .map(|(student, attempts)| ClassStudentProgress {
                student: Reference::Id(student),
                completed_exercises: attempts.len() as u32,
                average_accuracy: attempts.iter().map(|p| p.accuracy).sum::<f64>()
                    / attempts.len() as f64,
                last_activity: attempts.iter().filter_map(|p| p.completed_at).max(),
            })
            .collect();
        students.sort_by(|a, b| a.student.resolve_id().cmp(b.student.resolve_id()));
        Ok(ClassProgress {
            total_exercises: state
                .exercises
                .iter()
                .filter(|e| e.class.is(class_id))
                .count() as u32,
            students,
        })
    }

    async fn exercise_analytics(&self, exercise_id: &str) -> ApiResult<ExerciseAnalytics> {
        self.enter(&[exercise_id]).await?;
        let state = self.state();
        Self::exercise(&state, exercise_id)?;
        let attempts: Vec<&StudentProgress> = state
            .progress
            .iter()
            .filter(|p| p.exercise.is(exercise_id))
            .collect();
        let mut students: Vec<&str> = attempts.iter().map(|p| p.student.resolve_id()).collect();
        students.sort_unstable();
        students.dedup();
        let n = attempts.len().max(1) as f64;
        Ok(ExerciseAnalytics {
            total_attempts: attempts.len() as u32,
            unique_students: students.len() as u32,
            average_accuracy: attempts.iter().map(|p| p.accuracy).sum::<f64>() / n,
            average_time_spent: attempts.iter().map(|p| p.time_spent as f64).sum::<f64>() / n,
            question_stats: vec![],
        })
    }

    async fn delete_progress(&self, progress_id: &str) -> ApiResult<()> {
        self.enter(&[progress_id]).await?;
        let mut state = self.state();
        let before = state.progress.len();
        state.progress.retain(|p| p.id != progress_id);
        if state.progress.len() == before {
            return Err(ApiError::NotFound(format!("progress {progress_id}")));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Schools
// ---------------------------------------------------------------------------

#[async_trait]
impl SchoolApi for MockBackend {
    async fn create_school(&self, draft: &SchoolDraft) -> ApiResult<School> {
        self.enter(&[]).await?;
        ensure_valid(validate_school(draft))?;
        let school = School {
            id: new_id(),
            name: draft.name.clone(),
            admin: Some(Reference::Id(new_id())),
            is_active: true,
            block_reason: None,
            created_at: Some(Utc::now()),
        };
        self.state().school = Some(school.clone());
        Ok(school)
    }

    async fn current_school(&self) -> ApiResult<School> {
        self.enter(&[]).await?;
        self.state()
            .school
            .clone()
            .ok_or_else(|| ApiError::NotFound("school".into()))
    }

    async fn toggle_block(&self, school_id: &str, reason: Option<&str>) -> ApiResult<School> {
        self.enter(&[school_id]).await?;
        let mut state = self.state();
        let school = state
            .school
            .as_mut()
            .filter(|s| s.id == school_id)
            .ok_or_else(|| ApiError::NotFound(format!("school {school_id}")))?;
        school.is_active = !school.is_active;
        school.block_reason = if school.is_active {
            None
        } else {
            reason.map(str::to_string)
        };
        Ok(school.clone())
    }

    async fn rename_school(&self, school_id: &str, name: &str) -> ApiResult<School> {
        self.enter(&[school_id]).await?;
        let mut state = self.state();
        let school = state
            .school
            .as_mut()
            .filter(|s| s.id == school_id)
            .ok_or_else(|| ApiError::NotFound(format!("school {school_id}")))?;
        school.name = name.to_string();
        Ok(school.clone())
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[async_trait]
impl NotificationApi for MockBackend {
    async fn create_notification(
        &self,
        draft: &NotificationDraft,
        attachments: &[AttachmentUpload],
    ) -> ApiResult<Notification> {
        self.enter(&[]).await?;
        ensure_valid(validate_notification(
            draft,
            attachments,
            FormMode::Create,
            Utc::now(),
        ))?;
        let mut state = self.state();
        let id = new_id();
        let mut notification = Notification {
            id: id.clone(),
            title: String::new(),
            content: String::new(),
            kind: Default::default(),
            priority: Default::default(),
            target_audience: Default::default(),
            target_class: None,
            attachments: vec![],
            read_by: vec![],
            publish_date: None,
            expiry_date: None,
            is_active: true,
            created_by: Some(state.user_id.as_str().into()),
            created_at: Some(Utc::now()),
        };
        apply_draft(&mut notification, draft);
        for file in attachments {
            let attachment_id = new_id();
            notification.attachments.push(schoolhub_core::model::Attachment {
                id: attachment_id.clone(),
                filename: file.filename.clone(),
                original_name: Some(file.filename.clone()),
                mime_type: file.mime_type.clone(),
                size: file.size(),
                url: format!("/notifications/{id}/attachments/{attachment_id}"),
            });
            state
                .files
                .insert((id.clone(), attachment_id), file.bytes.clone());
        }
        state.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        query: &NotificationQuery,
    ) -> ApiResult<Page<Notification>> {
        self.enter(&[]).await?;
        let state = self.state();
        let matching: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.is_active)
            .filter(|n| query.kind.map_or(true, |k| n.kind == k))
            .filter(|n| query.priority.map_or(true, |p| n.priority == p))
            .filter(|n| !query.unread_only || !n.is_read_by(&state.user_id))
            .cloned()
            .collect();
        Ok(paginate(&matching, query.page, query.limit))
    }

    async fn get_notification(&self, notification_id: &str) -> ApiResult<Notification> {
        self.enter(&[notification_id]).await?;
        let state = self.state();
        let index = Self::notification_index(&state, notification_id)?;
        Ok(state.notifications[index].clone())
    }

    async fn update_notification(
        &self,
        notification_id: &str,
        draft: &NotificationDraft,
    ) -> ApiResult<Notification> {
        self.enter(&[notification_id]).await?;
        ensure_valid(validate_notification(
            draft,
            &[],
            FormMode::Update,
            Utc::now(),
        ))?;
        let mut state = self.state();
        let index = Self::notification_index(&state, notification_id)?;
        apply_draft(&mut state.notifications[index], draft);
        Ok(state.notifications[index].clone())
    }

    async fn delete_notification(&self, notification_id: &str) -> ApiResult<()> {
        self.enter(&[notification_id]).await?;
        let mut state = self.state();
        let index = Self::notification_index(&state, notification_id)?;
        state.notifications.remove(index);
        state.files.retain(|(owner, _), _| owner != notification_id);
        Ok(())
    }

    async fn mark_read(&self, notification_id: &str) -> ApiResult<()> {
        self.enter(&[notification_id]).await?;
        let mut state = self.state();
        let index = Self::notification_index(&state, notification_id)?;
        let user = state.user_id.clone();
        let notification = &mut state.notifications[index];
        if !notification.is_read_by(&user) {
            notification.read_by.push(ReadMarker {
                user: Reference::Id(user),
                read_at: Some(Utc::now()),
            });
        }
        Ok(())
    }

    async fn mark_many_read(&self, notification_ids: &[String]) -> ApiResult<()> {
        for id in notification_ids {
            self.mark_read(id).await?;
        }
        Ok(())
    }

    async fn mark_all_read(&self) -> ApiResult<()> {
        self.enter(&[]).await?;
        let mut state = self.state();
        let user = state.user_id.clone();
        for notification in &mut state.notifications {
            if !notification.is_read_by(&user) {
                notification.read_by.push(ReadMarker {
                    user: Reference::Id(user.clone()),
                    read_at: Some(Utc::now()),
                });
            }
        }
        Ok(())
    }

    async fn download_attachment(
        &self,
        notification_id: &str,
        attachment_id: &str,
    ) -> ApiResult<Vec<u8>> {
        self.enter(&[notification_id, attachment_id]).await?;
        self.state()
            .files
            .get(&(notification_id.to_string(), attachment_id.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("attachment {attachment_id}")))
    }

    async fn search_notifications(
        &self,
        text: &str,
        query: &NotificationQuery,
    ) -> ApiResult<Page<Notification>> {
        self.enter(&[]).await?;
        let needle = text.to_lowercase();
        let matching: Vec<Notification> = self
            .state()
            .notifications
            .iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&needle)
                    || n.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        Ok(paginate(&matching, query.page, query.limit))
    }

    async fn unread_count(&self) -> ApiResult<u64> {
        self.unread_polls.fetch_add(1, Ordering::Relaxed);
        self.enter(&["unread-count"]).await?;
        let state = self.state();
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.is_active && !n.is_read_by(&state.user_id))
            .count() as u64)
    }
}

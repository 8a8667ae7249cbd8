//! Concurrent fan-out reads joined with a collect-all-settled policy.
//!
//! Every read runs to completion. Failed reads become
//! [`Settled::Unavailable`] in place; the batch itself never fails.

use std::fmt::Display;
use std::future::Future;

use futures::future::join_all;

use crate::error::{ApiError, ApiResult};
use crate::model::{Exercise, ExerciseAnalytics, StudentProgress};
use crate::requests::ExerciseQuery;
use crate::traits::{ExerciseApi, ProgressApi};

/// Outcome of one read in a fan-out batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled<T> {
    Ready(T),
    Unavailable { reason: String },
}

impl<T> Settled<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Settled::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Settled::Ready(value) => Some(value),
            Settled::Unavailable { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Settled<U> {
        match self {
            Settled::Ready(value) => Settled::Ready(f(value)),
            Settled::Unavailable { reason } => Settled::Unavailable { reason },
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for Settled<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Settled::Ready(value),
            Err(e) => Settled::Unavailable {
                reason: e.to_string(),
            },
        }
    }
}

/// Run all reads concurrently and wait for every one of them.
///
/// Results keep input order.
pub async fn join_settled<I, F, T, E>(reads: I) -> Vec<Settled<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    join_all(reads)
        .await
        .into_iter()
        .enumerate()
        .map(|(index, result)| {
            if let Err(e) = &result {
                tracing::warn!(index, "fan-out read failed: {e}");
            }
            Settled::from(result)
        })
        .collect()
}

/// One exercise with the outcome of its fan-out read.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseRow<T> {
    pub exercise_id: String,
    pub title: String,
    pub data: Settled<T>,
}

/// Most pages [`list_all_exercises`] will follow.
pub const MAX_LIST_PAGES: u32 = 50;

/// Exercises gathered across pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseListing {
    pub exercises: Vec<Exercise>,
    /// More pages existed past [`MAX_LIST_PAGES`].
    pub truncated: bool,
}

/// Every exercise matching `query`, following pagination from page 1.
pub async fn list_all_exercises(
    api: &dyn ExerciseApi,
    query: &ExerciseQuery,
) -> ApiResult<ExerciseListing> {
    let mut listing = ExerciseListing::default();
    let mut page = 1;
    loop {
        let current = api
            .list_exercises(&ExerciseQuery {
                page: Some(page),
                ..query.clone()
            })
            .await?;
        let empty = current.items.is_empty();
        listing.exercises.extend(current.items);
        if empty || !current.pagination.has_next() {
            return Ok(listing);
        }
        if page == MAX_LIST_PAGES {
            tracing::warn!(pages = page, "exercise listing cut short");
            listing.truncated = true;
            return Ok(listing);
        }
        page += 1;
    }
}

/// A student's attempts for every exercise in a list.
pub async fn load_student_attempts(
    api: &dyn ExerciseApi,
    exercises: &[Exercise],
    student_id: &str,
) -> Vec<ExerciseRow<Vec<StudentProgress>>> {
    let reads = exercises
        .iter()
        .map(|exercise| api.student_progress(&exercise.id, student_id));
    rows(exercises, join_settled::<_, _, _, ApiError>(reads).await)
}

/// Server analytics for every exercise in a list.
pub async fn load_exercise_analytics(
    api: &dyn ProgressApi,
    exercises: &[Exercise],
) -> Vec<ExerciseRow<ExerciseAnalytics>> {
    let reads = exercises
        .iter()
        .map(|exercise| api.exercise_analytics(&exercise.id));
    rows(exercises, join_settled::<_, _, _, ApiError>(reads).await)
}

/// Every listed student's attempts on every exercise.
///
/// An exercise whose reads fail for any student is unavailable as a whole,
/// so its summary is never computed from a partial class.
pub async fn load_class_attempts(
    api: &dyn ExerciseApi,
    exercises: &[Exercise],
    student_ids: &[String],
) -> Vec<ExerciseRow<Vec<StudentProgress>>> {
    let reads = exercises.iter().map(|exercise| async move {
        let per_student = join_all(
            student_ids
                .iter()
                .map(|student_id| api.student_progress(&exercise.id, student_id)),
        )
        .await;
        per_student
            .into_iter()
            .collect::<Result<Vec<_>, ApiError>>()
            .map(|attempts| attempts.into_iter().flatten().collect::<Vec<_>>())
    });
    rows(exercises, join_settled(reads).await)
}

fn rows<T>(exercises: &[Exercise], settled: Vec<Settled<T>>) -> Vec<ExerciseRow<T>> {
    exercises
        .iter()
        .zip(settled)
        .map(|(exercise, data)| ExerciseRow {
            exercise_id: exercise.id.clone(),
            title: exercise.title.clone(),
            data,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn waits_for_every_read_and_keeps_order() {
        let reads = (0..4u64).map(|i| async move {
            tokio::time::sleep(Duration::from_millis(100 * (4 - i))).await;
            if i == 1 {
                Err(format!("read {i} failed"))
            } else {
                Ok(i * 10)
            }
        });
        let settled = join_settled(reads).await;
        assert_eq!(
            settled,
            vec![
                Settled::Ready(0),
                Settled::Unavailable {
                    reason: "read 1 failed".into()
                },
                Settled::Ready(20),
                Settled::Ready(30),
            ]
        );
    }

    #[tokio::test]
    async fn empty_batch() {
        let reads: Vec<std::future::Ready<Result<u8, String>>> = vec![];
        assert!(join_settled(reads).await.is_empty());
    }

    #[test]
    fn settled_helpers() {
        let ready: Settled<u32> = Ok::<_, String>(2).into();
        assert!(ready.is_ready());
        assert_eq!(ready.clone().map(|v| v * 2).ready(), Some(&4));
        let failed: Settled<u32> = Err::<u32, _>("boom").into();
        assert!(failed.ready().is_none());
    }
}

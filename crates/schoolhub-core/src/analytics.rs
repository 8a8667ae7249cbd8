//! Teacher-side aggregation of student attempts.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::fanout::{ExerciseRow, Settled};
use crate::model::{Exercise, StudentProgress};

/// Aggregate statistics over the attempts of one exercise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub attempts: usize,
    pub students: usize,
    pub average_accuracy: f64,
    pub best_accuracy: f64,
    pub perfect_scores: usize,
}

/// Summarize a set of attempts. An empty set summarizes to all zeros.
pub fn summarize_exercise(attempts: &[StudentProgress]) -> AttemptSummary {
    if attempts.is_empty() {
        return AttemptSummary::default();
    }

    let students: HashSet<&str> = attempts.iter().map(|a| a.student.resolve_id()).collect();
    let total: f64 = attempts.iter().map(|a| a.accuracy).sum();
    let best = attempts
        .iter()
        .map(|a| a.accuracy)
        .fold(f64::NEG_INFINITY, f64::max);

    AttemptSummary {
        attempts: attempts.len(),
        students: students.len(),
        average_accuracy: total / attempts.len() as f64,
        best_accuracy: best,
        perfect_scores: attempts.iter().filter(|a| a.is_perfect()).count(),
    }
}

/// Per-exercise summaries of fan-out rows. Rows whose read failed stay
/// unavailable.
pub fn summarize_class(
    rows: &[ExerciseRow<Vec<StudentProgress>>],
) -> Vec<ExerciseRow<AttemptSummary>> {
    rows.iter()
        .map(|row| ExerciseRow {
            exercise_id: row.exercise_id.clone(),
            title: row.title.clone(),
            data: row.data.clone().map(|attempts| summarize_exercise(&attempts)),
        })
        .collect()
}

/// One student's standing across the exercises in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentStanding {
    pub student_id: String,
    pub exercises_attempted: usize,
    pub average_best_accuracy: f64,
}

/// Rank students by their best attempt per exercise, averaged over the
/// exercises they attempted. Unavailable rows are skipped.
pub fn summarize_students(rows: &[ExerciseRow<Vec<StudentProgress>>]) -> Vec<StudentStanding> {
    let mut best: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for row in rows {
        let Settled::Ready(attempts) = &row.data else {
            continue;
        };
        let mut per_student: BTreeMap<&str, f64> = BTreeMap::new();
        for attempt in attempts {
            let entry = per_student
                .entry(attempt.student.resolve_id())
                .or_insert(f64::NEG_INFINITY);
            *entry = entry.max(attempt.accuracy);
        }
        for (student, accuracy) in per_student {
            best.entry(student.to_string()).or_default().push(accuracy);
        }
    }

    let mut standings: Vec<StudentStanding> = best
        .into_iter()
        .map(|(student_id, scores)| StudentStanding {
            exercises_attempted: scores.len(),
            average_best_accuracy: scores.iter().sum::<f64>() / scores.len() as f64,
            student_id,
        })
        .collect();
    standings.sort_by(|a, b| {
        b.average_best_accuracy
            .total_cmp(&a.average_best_accuracy)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    standings
}

/// Exercises a teacher owns.
///
/// Exercises with a creator match on the creator. Exercises without one fall
/// back to membership in one of the teacher's classes; this over-includes
/// exercises created by colleagues teaching the same class.
pub fn owned_exercises<'a>(
    teacher_id: &str,
    teacher_class_ids: &[String],
    exercises: &'a [Exercise],
) -> Vec<&'a Exercise> {
    exercises
        .iter()
        .filter(|exercise| match &exercise.created_by {
            Some(creator) => creator.is(teacher_id),
            None => teacher_class_ids
                .iter()
                .any(|class_id| exercise.class.is(class_id)),
        })
        .collect()
}

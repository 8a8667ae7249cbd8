//! The `schoolhub progress` command.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::Cell;
use schoolhub_core::analytics::{owned_exercises, summarize_class, summarize_students};
use schoolhub_core::fanout::{list_all_exercises, load_class_attempts, Settled};
use schoolhub_core::model::{Exercise, ExerciseRef, SubjectRef, UserRef};
use schoolhub_core::requests::ExerciseQuery;
use schoolhub_core::traits::ProgressApi;

use super::{connect, percent, table};

#[derive(Subcommand)]
pub enum ProgressTarget {
    /// One student's overview
    Student {
        /// Student id
        #[arg(long)]
        id: String,
    },

    /// A class: per-student standing and per-exercise results
    Class {
        /// Class id
        #[arg(long)]
        class: String,

        /// Only exercises owned by this teacher
        #[arg(long)]
        teacher: Option<String>,
    },

    /// Server analytics for one exercise
    Exercise {
        /// Exercise id
        #[arg(long)]
        id: String,
    },
}

pub async fn execute(config_path: Option<&Path>, target: ProgressTarget) -> Result<()> {
    let (config, client) = connect(config_path)?;
    match target {
        ProgressTarget::Student { id } => {
            let overview = client
                .student_overview(&id)
                .await
                .with_context(|| format!("failed to load progress for student {id}"))?;
            println!(
                "Completed {}/{} exercises, average {}, {} min spent",
                overview.completed_exercises,
                overview.total_exercises,
                percent(overview.average_accuracy),
                overview.total_time_spent / 60
            );

            if !overview.by_subject.is_empty() {
                let mut subjects = table(vec!["Subject", "Completed", "Average"]);
                for subject in &overview.by_subject {
                    subjects.add_row(vec![
                        Cell::new(subject_label(&subject.subject)),
                        Cell::new(subject.completed),
                        Cell::new(percent(subject.average_accuracy)),
                    ]);
                }
                println!("\n{subjects}");
            }

            if !overview.recent.is_empty() {
                let mut recent = table(vec!["Exercise", "Attempt", "Score", "Completed"]);
                for attempt in &overview.recent {
                    recent.add_row(vec![
                        Cell::new(exercise_label(&attempt.exercise)),
                        Cell::new(attempt.attempt_number),
                        Cell::new(percent(attempt.accuracy)),
                        Cell::new(
                            attempt
                                .completed_at
                                .map_or("-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string()),
                        ),
                    ]);
                }
                println!("\n{recent}");
            }
        }

        ProgressTarget::Class { class, teacher } => {
            let progress = client
                .class_progress(&class)
                .await
                .with_context(|| format!("failed to load progress for class {class}"))?;
            let listing = list_all_exercises(
                &client,
                &ExerciseQuery {
                    limit: Some(config.page_size),
                    ..ExerciseQuery::for_class(&class)
                },
            )
            .await
            .context("failed to list exercises")?;
            if listing.truncated {
                println!("Only the first {} exercises are included.", listing.exercises.len());
            }
            let exercises: Vec<Exercise> = match &teacher {
                Some(teacher_id) => owned_exercises(teacher_id, &[class.clone()], &listing.exercises)
                    .into_iter()
                    .cloned()
                    .collect(),
                None => listing.exercises,
            };

            println!(
                "Class {class}: {} students, {} exercises",
                progress.students.len(),
                progress.total_exercises
            );

            let student_ids: Vec<String> = progress
                .students
                .iter()
                .map(|s| s.student.resolve_id().to_string())
                .collect();
            let rows = load_class_attempts(&client, &exercises, &student_ids).await;

            let mut per_exercise = table(vec!["Exercise", "Attempts", "Students", "Average", "Best", "Perfect"]);
            for row in summarize_class(&rows) {
                match &row.data {
                    Settled::Ready(summary) => per_exercise.add_row(vec![
                        Cell::new(&row.title),
                        Cell::new(summary.attempts),
                        Cell::new(summary.students),
                        Cell::new(percent(summary.average_accuracy)),
                        Cell::new(percent(summary.best_accuracy)),
                        Cell::new(summary.perfect_scores),
                    ]),
                    Settled::Unavailable { reason } => per_exercise.add_row(vec![
                        Cell::new(&row.title),
                        Cell::new(format!("unavailable: {reason}")),
                    ]),
                };
            }
            println!("\n{per_exercise}");

            let mut standings = table(vec!["Student", "Exercises", "Average best", "Last activity"]);
            for standing in summarize_students(&rows) {
                let student = progress
                    .students
                    .iter()
                    .find(|s| s.student.is(&standing.student_id));
                standings.add_row(vec![
                    Cell::new(student.map_or(standing.student_id.clone(), |s| user_label(&s.student))),
                    Cell::new(standing.exercises_attempted),
                    Cell::new(percent(standing.average_best_accuracy)),
                    Cell::new(
                        student
                            .and_then(|s| s.last_activity)
                            .map_or("-".to_string(), |t| t.format("%Y-%m-%d").to_string()),
                    ),
                ]);
            }
            println!("\n{standings}");
        }

        ProgressTarget::Exercise { id } => {
            let analytics = client
                .exercise_analytics(&id)
                .await
                .with_context(|| format!("failed to load analytics for exercise {id}"))?;
            println!(
                "{} attempts by {} students, average {}, {:.0}s per attempt",
                analytics.total_attempts,
                analytics.unique_students,
                percent(analytics.average_accuracy),
                analytics.average_time_spent
            );
            if !analytics.question_stats.is_empty() {
                let mut questions = table(vec!["Question", "Correct"]);
                for stat in &analytics.question_stats {
                    questions.add_row(vec![
                        Cell::new(stat.question_index + 1),
                        Cell::new(percent(stat.correct_rate)),
                    ]);
                }
                println!("\n{questions}");
            }
        }
    }
    Ok(())
}

fn user_label(user: &UserRef) -> String {
    user.embedded()
        .map_or_else(|| user.resolve_id().to_string(), |u| u.display_name())
}

fn subject_label(subject: &SubjectRef) -> String {
    subject
        .embedded()
        .map_or_else(|| subject.resolve_id().to_string(), |s| s.name.clone())
}

fn exercise_label(exercise: &ExerciseRef) -> String {
    exercise
        .embedded()
        .map_or_else(|| exercise.resolve_id().to_string(), |e| e.title.clone())
}

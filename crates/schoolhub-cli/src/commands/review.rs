//! The `schoolhub review` command.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use schoolhub_core::model::{Exercise, Question};
use schoolhub_core::review::{QuestionReview, ReviewPart};
use schoolhub_core::session::ExerciseSession;
use schoolhub_core::submission::SubmissionGuard;

use super::{connect, percent};

pub async fn execute(
    config_path: Option<&Path>,
    exercise_id: &str,
    student_id: &str,
    attempt_number: Option<u32>,
) -> Result<()> {
    let (_, client) = connect(config_path)?;
    let session =
        ExerciseSession::load(Arc::new(client), SubmissionGuard::new(), exercise_id, student_id)
            .await
            .with_context(|| format!("failed to load exercise {exercise_id}"))?;

    let attempt = match attempt_number {
        Some(number) => session
            .history()
            .iter()
            .find(|a| a.attempt_number == number)
            .with_context(|| format!("no attempt {number} for student {student_id}"))?,
        None => session
            .latest()
            .with_context(|| format!("student {student_id} has not attempted {exercise_id}"))?,
    };

    println!(
        "{}: attempt {} scored {:.1}/{:.1} ({})",
        session.exercise().title,
        attempt.attempt_number,
        attempt.total_points,
        attempt.max_points,
        percent(attempt.accuracy)
    );

    match session.review(attempt) {
        Some(review) => print_review(session.exercise(), &review),
        None => {
            let policy = session.policy();
            println!(
                "Details hidden: {} attempt(s) remaining. Corrections appear after a perfect score or the last attempt.",
                policy.remaining_attempts()
            );
        }
    }
    Ok(())
}

/// Print one block per question with the submitted and expected answers.
pub(crate) fn print_review(exercise: &Exercise, review: &[QuestionReview]) {
    for question in review {
        let mark = if question.is_correct() { "OK" } else { "XX" };
        match question {
            QuestionReview::Qcm { index, review } => {
                println!("\n{mark} {}. {}", index + 1, review.question);
                let chosen = review
                    .selected_text
                    .as_deref()
                    .or(review.selected.as_deref())
                    .unwrap_or("(no answer)");
                println!("   answered: {chosen}");
                if !review.is_correct {
                    let expected: Vec<&str> = review
                        .correct
                        .iter()
                        .map(|key| option_text(exercise, *index, key))
                        .collect();
                    if !expected.is_empty() {
                        println!("   expected: {}", expected.join(" / "));
                    }
                }
            }
            QuestionReview::FillBlank { index, review } => {
                let line: String = review
                    .parts
                    .iter()
                    .map(|part| match part {
                        ReviewPart::Text(text) => text.clone(),
                        ReviewPart::Blank(blank) if blank.is_correct => {
                            format!("[{}]", blank.submitted)
                        }
                        ReviewPart::Blank(blank) if blank.submitted.is_empty() => {
                            format!("[_ -> {}]", blank.correct_answer)
                        }
                        ReviewPart::Blank(blank) => {
                            format!("[{} -> {}]", blank.submitted, blank.correct_answer)
                        }
                    })
                    .collect();
                println!("\n{mark} {}. {line}", index + 1);
            }
        }
    }
}

fn option_text<'a>(exercise: &'a Exercise, question: usize, key: &'a str) -> &'a str {
    match exercise.questions.get(question) {
        Some(Question::Qcm(q)) => q.option_by_key(key).map_or(key, |o| o.text.as_str()),
        _ => key,
    }
}

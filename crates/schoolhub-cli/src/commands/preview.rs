//! The `schoolhub preview` command.

use std::path::Path;

use anyhow::{Context, Result};
use schoolhub_core::model::{Exercise, Question};
use schoolhub_core::requests::ExerciseDraft;
use schoolhub_core::sentence::{answer_slots, blank_count};
use schoolhub_core::validation::validate_exercise;

use super::question_prompt;

pub fn execute(file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let exercise: Exercise = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse exercise: {}", file.display()))?;

    println!(
        "Exercise: {} ({}, {}, {} questions, {} attempt(s) allowed)",
        exercise.title,
        exercise.kind,
        exercise.difficulty,
        exercise.question_count(),
        exercise.max_attempts()
    );
    if let Some(instructions) = &exercise.metadata.instructions {
        println!("  {instructions}");
    }

    for (index, question) in exercise.questions.iter().enumerate() {
        println!(
            "\n{}. {} ({} pt)",
            index + 1,
            question_prompt(question),
            question.points()
        );
        match question {
            Question::Qcm(q) => {
                for (position, option) in q.options.iter().enumerate() {
                    let mark = if option.is_correct == Some(true) { "*" } else { " " };
                    println!("   {mark} {}) {}", option.key(position), option.text);
                }
            }
            Question::FillBlank(q) => {
                for slot in 0..answer_slots(q) {
                    match q.blanks.get(slot) {
                        Some(blank) if blank.alternatives.is_empty() => {
                            println!("   [{}] {}", slot + 1, blank.correct_answer);
                        }
                        Some(blank) => println!(
                            "   [{}] {} (also: {})",
                            slot + 1,
                            blank.correct_answer,
                            blank.alternatives.join(", ")
                        ),
                        None => println!("   [{}] <no answer defined>", slot + 1),
                    }
                }
                if !q.is_consistent() {
                    println!(
                        "   WARNING: {} blank marker(s) but {} answer(s); students get {} slot(s)",
                        blank_count(&q.sentence),
                        q.blanks.len(),
                        answer_slots(q)
                    );
                }
            }
        }
    }

    let problems = validate_exercise(&draft_of(&exercise));
    println!();
    if problems.is_empty() {
        println!("Exercise valid.");
    } else {
        for problem in &problems {
            println!("  PROBLEM: {problem}");
        }
        println!("\n{} problem(s) found.", problems.len());
    }

    Ok(())
}

fn draft_of(exercise: &Exercise) -> ExerciseDraft {
    ExerciseDraft {
        title: exercise.title.clone(),
        description: exercise.description.clone(),
        kind: exercise.kind,
        subject: exercise.subject.resolve_id().to_string(),
        class: exercise.class.resolve_id().to_string(),
        difficulty: exercise.difficulty,
        questions: exercise.questions.clone(),
        metadata: exercise.metadata.clone(),
        due_date: exercise.due_date,
    }
}

//! The `schoolhub take` command.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use schoolhub_core::model::{Exercise, Question};
use schoolhub_core::sentence::{answer_slots, render_with};
use schoolhub_core::session::{ExerciseSession, RenderedQuestion};
use schoolhub_core::submission::SubmissionGuard;

use super::{connect, percent, review::print_review};

pub async fn execute(
    config_path: Option<&Path>,
    exercise_id: &str,
    student_id: &str,
    answers: &[String],
    blanks: &[String],
) -> Result<()> {
    let (_, client) = connect(config_path)?;
    let mut session =
        ExerciseSession::load(Arc::new(client), SubmissionGuard::new(), exercise_id, student_id)
            .await
            .with_context(|| format!("failed to load exercise {exercise_id}"))?;

    let policy = session.policy();
    println!(
        "{} ({} of {} attempt(s) used)",
        session.exercise().title,
        policy.attempts_used(),
        policy.max_attempts()
    );

    if answers.is_empty() && blanks.is_empty() {
        print_questions(&session.render());
        println!("\nAnswer with --answer Q=OPTION and --blank Q.B=TEXT, then run again.");
        return Ok(());
    }

    for arg in answers {
        let (question, option) = parse_choice(arg)?;
        let key = resolve_option(session.exercise(), question, &option)?;
        session.select_option(question, key);
    }
    for arg in blanks {
        let (question, blank, value) = parse_blank(arg)?;
        check_blank(session.exercise(), question, blank)?;
        session.set_blank(question, blank, value);
    }

    print_questions(&session.render());

    let graded = session.submit().await?;
    println!(
        "\nAttempt {}: {:.1}/{:.1} points ({})",
        graded.attempt_number,
        graded.total_points,
        graded.max_points,
        percent(graded.accuracy)
    );

    let policy = session.policy();
    if policy.can_retry() {
        println!("{} attempt(s) remaining.", policy.remaining_attempts());
    } else {
        println!("No attempts remaining.");
    }

    match session.review(&graded) {
        Some(review) => print_review(session.exercise(), &review),
        None => println!("Corrections are shown once the exercise is perfect or out of attempts."),
    }

    Ok(())
}

fn print_questions(questions: &[RenderedQuestion]) {
    for question in questions {
        match question {
            RenderedQuestion::Qcm {
                index,
                prompt,
                options,
                selected,
            } => {
                println!("\n{}. {prompt}", index + 1);
                for (key, text) in options {
                    let mark = if selected.as_deref() == Some(key.as_str()) { "x" } else { " " };
                    println!("   [{mark}] {key}) {text}");
                }
            }
            RenderedQuestion::FillBlank {
                index,
                parts,
                values,
            } => {
                let line = render_with(parts, |blank| match values.get(blank) {
                    Some(value) if !value.is_empty() => format!("[{value}]"),
                    _ => format!("[{}: ___]", blank + 1),
                });
                println!("\n{}. {line}", index + 1);
            }
        }
    }
}

fn one_based(text: &str, what: &str) -> Result<usize> {
    let number: usize = text
        .trim()
        .parse()
        .with_context(|| format!("{what} must be a number, got '{text}'"))?;
    number
        .checked_sub(1)
        .ok_or_else(|| anyhow!("{what} numbers start at 1"))
}

/// `"2=b"` → `(1, "b")`.
fn parse_choice(arg: &str) -> Result<(usize, String)> {
    let (question, option) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected QUESTION=OPTION, got '{arg}'"))?;
    Ok((one_based(question, "question")?, option.trim().to_string()))
}

/// `"2.1=chat"` → `(1, 0, "chat")`. The value is kept verbatim.
fn parse_blank(arg: &str) -> Result<(usize, usize, String)> {
    let (position, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected QUESTION.BLANK=TEXT, got '{arg}'"))?;
    let (question, blank) = position
        .split_once('.')
        .ok_or_else(|| anyhow!("expected QUESTION.BLANK=TEXT, got '{arg}'"))?;
    Ok((
        one_based(question, "question")?,
        one_based(blank, "blank")?,
        value.to_string(),
    ))
}

/// The blank must exist in the question's sentence.
fn check_blank(exercise: &Exercise, question: usize, blank: usize) -> Result<()> {
    let q = match exercise.questions.get(question) {
        Some(Question::FillBlank(q)) => q,
        Some(Question::Qcm(_)) => bail!("question {} is multiple choice, use --answer", question + 1),
        None => bail!("exercise has no question {}", question + 1),
    };
    let slots = answer_slots(q);
    if blank >= slots {
        bail!(
            "question {} has {slots} blank(s), got blank {}",
            question + 1,
            blank + 1
        );
    }
    Ok(())
}

/// Match an option by its key, or by letter (`a` is the first option).
fn resolve_option(exercise: &Exercise, question: usize, option: &str) -> Result<String> {
    let q = match exercise.questions.get(question) {
        Some(Question::Qcm(q)) => q,
        Some(Question::FillBlank(_)) => {
            bail!("question {} is fill-in-the-blank, use --blank", question + 1)
        }
        None => bail!("exercise has no question {}", question + 1),
    };
    if q.option_by_key(option).is_some() {
        return Ok(option.to_string());
    }
    let mut chars = option.chars();
    if let (Some(letter), None) = (chars.next(), chars.next()) {
        if letter.is_ascii_alphabetic() {
            let position = (letter.to_ascii_lowercase() as u8 - b'a') as usize;
            if let Some(found) = q.options.get(position) {
                return Ok(found.key(position));
            }
        }
    }
    bail!("question {} has no option '{option}'", question + 1)
}

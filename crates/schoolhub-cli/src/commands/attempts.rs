//! The `schoolhub attempts` command.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::Cell;
use schoolhub_core::attempts::{latest_attempt, AttemptPolicy};
use schoolhub_core::fanout::{list_all_exercises, load_student_attempts, Settled};
use schoolhub_core::requests::ExerciseQuery;

use super::{connect, percent, table};

pub async fn execute(config_path: Option<&Path>, student_id: &str, class_id: Option<&str>) -> Result<()> {
    let (config, client) = connect(config_path)?;
    let query = ExerciseQuery {
        limit: Some(config.page_size),
        class: class_id.map(str::to_string),
        ..Default::default()
    };
    let listing = list_all_exercises(&client, &query)
        .await
        .context("failed to list exercises")?;
    let exercises = listing.exercises;
    if exercises.is_empty() {
        println!("No exercises found.");
        return Ok(());
    }

    let rows = load_student_attempts(&client, &exercises, student_id).await;

    let mut table = table(vec!["Exercise", "Attempts", "Latest", "Best", "Remaining"]);
    let mut unavailable = 0;
    for (exercise, row) in exercises.iter().zip(&rows) {
        match &row.data {
            Settled::Ready(history) => {
                let policy = AttemptPolicy::from_history(exercise, history);
                let latest = latest_attempt(history);
                let best = history.iter().map(|a| a.accuracy).fold(None, |best: Option<f64>, a| {
                    Some(best.map_or(a, |b| b.max(a)))
                });
                table.add_row(vec![
                    Cell::new(&row.title),
                    Cell::new(format!("{}/{}", policy.attempts_used(), policy.max_attempts())),
                    Cell::new(latest.map_or("-".to_string(), |a| percent(a.accuracy))),
                    Cell::new(best.map_or("-".to_string(), percent)),
                    Cell::new(policy.remaining_attempts()),
                ]);
            }
            Settled::Unavailable { .. } => {
                unavailable += 1;
                table.add_row(vec![
                    Cell::new(&row.title),
                    Cell::new("unavailable"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                ]);
            }
        }
    }

    println!("\n{table}");
    if unavailable > 0 {
        println!("{unavailable} exercise(s) could not be loaded.");
    }
    if listing.truncated {
        println!("Showing the first {} exercises only.", exercises.len());
    }
    Ok(())
}

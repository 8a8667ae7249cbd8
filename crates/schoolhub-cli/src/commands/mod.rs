//! Subcommand implementations and the helpers they share.

pub mod attempts;
pub mod init;
pub mod notifications;
pub mod prefs;
pub mod preview;
pub mod progress;
pub mod review;
pub mod school;
pub mod take;

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets, Table};
use schoolhub_client::{load_config_from, ClientConfig, SchoolClient};
use schoolhub_core::model::Question;
use schoolhub_core::sentence::render_with;

/// Load configuration and build an HTTP client.
pub(crate) fn connect(config_path: Option<&Path>) -> Result<(ClientConfig, SchoolClient)> {
    let config = load_config_from(config_path)?;
    tracing::debug!(?config, "connecting");
    let client = SchoolClient::new(&config)
        .with_context(|| format!("failed to create client for {}", config.base_url))?;
    Ok((config, client))
}

/// A table with the given header, styled per the user's preferences.
pub(crate) fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    if prefs::load().compact_tables {
        table.load_preset(presets::ASCII_FULL_CONDENSED);
    }
    table.set_header(header);
    table
}

pub(crate) fn percent(accuracy: f64) -> String {
    format!("{accuracy:.0}%")
}

/// One-line prompt for a question; blanks show as numbered slots.
pub(crate) fn question_prompt(question: &Question) -> String {
    match question {
        Question::Qcm(q) => q.question.clone(),
        Question::FillBlank(q) => render_with(&q.parts(), |index| format!("[{}]", index + 1)),
    }
}

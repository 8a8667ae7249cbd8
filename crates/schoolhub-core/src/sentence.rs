//! Fill-in-the-blank sentence templates.
//!
//! A template marks each blank with [`BLANK_MARKER`]. Parsing is a single
//! left-to-right split, so adjacent or boundary markers can never stall it.

use serde::Serialize;

use crate::model::FillBlankQuestion;

/// Three consecutive underscores.
pub const BLANK_MARKER: &str = "___";

/// One segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SentencePart {
    /// Literal text between blanks. Never empty.
    Text(String),
    /// A blank slot, numbered from 0 in reading order.
    Blank(usize),
}

impl SentencePart {
    pub fn blank_index(&self) -> Option<usize> {
        match self {
            SentencePart::Blank(index) => Some(*index),
            SentencePart::Text(_) => None,
        }
    }
}

/// Split a template into literal runs and numbered blanks.
///
/// Consecutive markers yield adjacent blanks with no empty text between
/// them; a marker at either end yields a leading or trailing blank.
pub fn parse_sentence(template: &str) -> Vec<SentencePart> {
    let mut parts = Vec::new();
    for (position, piece) in template.split(BLANK_MARKER).enumerate() {
        if position > 0 {
            parts.push(SentencePart::Blank(position - 1));
        }
        if !piece.is_empty() {
            parts.push(SentencePart::Text(piece.to_string()));
        }
    }
    parts
}

/// Number of blank markers in a template.
pub fn blank_count(template: &str) -> usize {
    template.matches(BLANK_MARKER).count()
}

/// Length of the answer array for a question.
///
/// Always the marker count: when the blank definitions disagree with the
/// template, the template wins so every rendered blank has a slot.
pub fn answer_slots(question: &FillBlankQuestion) -> usize {
    let markers = blank_count(&question.sentence);
    if markers != question.blanks.len() {
        tracing::debug!(
            markers,
            definitions = question.blanks.len(),
            "blank definitions disagree with template, sizing by markers"
        );
    }
    markers
}

/// Render a template with each blank replaced by `fill(index)`.
pub fn render_with<F>(parts: &[SentencePart], mut fill: F) -> String
where
    F: FnMut(usize) -> String,
{
    let mut out = String::new();
    for part in parts {
        match part {
            SentencePart::Text(text) => out.push_str(text),
            SentencePart::Blank(index) => out.push_str(&fill(*index)),
        }
    }
    out
}

//! schoolhub-core: Data model, exercise pipeline, and service traits.
//!
//! This crate holds everything the school-management client needs that does
//! not touch the network: the typed data model, the fill-in-the-blank
//! parser, answer tracking, submission building, result review, attempt
//! rules, validation, and the async primitives (topics, view scopes, polling,
//! fan-out) the front ends are built from.

pub mod analytics;
pub mod answers;
pub mod attempts;
pub mod error;
pub mod events;
pub mod fanout;
pub mod live;
pub mod model;
pub mod poller;
pub mod requests;
pub mod review;
pub mod scope;
pub mod sentence;
pub mod session;
pub mod submission;
pub mod traits;
pub mod validation;

#[cfg(test)]
mod fixtures;

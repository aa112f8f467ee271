//! Core pipeline orchestration and domain logic for Boardsmith.
//!
//! This crate turns fetched board items into a structural graph, drives the
//! model synthesis stages, and folds every stage's output into a [`RunState`].

pub mod extract;
pub mod graph;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod state;

pub use extract::extract_document;
pub use graph::build_graph;
pub use model::{ModelBackend, OllamaClient};
pub use pipeline::{Pipeline, ProgressReporter, SilentProgress, StageStatus};
pub use state::{RunState, StageError, StateUpdate};

//! Shared types, error model, and configuration for Boardsmith.
//!
//! This crate is the foundation depended on by all other Boardsmith crates.
//! It provides:
//! - [`BoardsmithError`], the unified error type
//! - Board types ([`Item`], [`Relation`], [`StructuralGraph`])
//! - The output schema ([`AgentSpec`] and its intermediate artifacts)
//! - Stage descriptions ([`StageSpec`], [`Variant`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod document;
pub mod error;
pub mod stage;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BoardConfig, ModelConfig, PipelineConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_board_token,
};
pub use document::{
    AgentSpec, AgentStep, AgentTool, AgentWorkflow, ComponentsArtifact, DEFAULT_AGENT_TYPE,
    SubAgent, WorkflowPlan, validate_document,
};
pub use error::{BoardsmithError, EXTRACTION_PREFIX_CHARS, ErrorKind, Result};
pub use stage::{ContextInput, StageSpec, SynthesisOutput, Variant};
pub use types::{Item, ItemType, Position, Relation, RelationType, RunId, StructuralGraph};

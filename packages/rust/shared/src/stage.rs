//! Pipeline stage descriptions.
//!
//! A pipeline is a list of [`StageSpec`] values. Variants of the pipeline
//! differ only in this list and the prompt text each synthesis stage uses.

use serde::{Deserialize, Serialize};

/// An artifact a synthesis stage can take as model context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextInput {
    /// The structural graph built from board items.
    Graph,
    /// Sub-agents and tools identified by an earlier stage.
    Components,
    /// Workflows planned by an earlier stage.
    WorkflowPlan,
}

impl ContextInput {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Components => "components",
            Self::WorkflowPlan => "workflow_plan",
        }
    }
}

/// The artifact a synthesis stage produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisOutput {
    Components,
    WorkflowPlan,
    /// The final output document.
    Document,
}

impl SynthesisOutput {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Components => "components",
            Self::WorkflowPlan => "workflow_plan",
            Self::Document => "document",
        }
    }
}

/// One named unit of work in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageSpec {
    /// Resolve the board reference and fetch its items.
    FetchBoard,
    /// Turn fetched items into the structural graph.
    BuildGraph,
    /// One model round-trip followed by response extraction.
    Synthesize {
        name: String,
        /// Built-in prompt name (`architect`, `workflow_planner`,
        /// `document`, `single_pass`) or inline instruction text.
        prompt: String,
        inputs: Vec<ContextInput>,
        output: SynthesisOutput,
    },
}

impl StageSpec {
    /// Stage name used in logs, progress output and error markers.
    pub fn name(&self) -> &str {
        match self {
            Self::FetchBoard => "fetch_board",
            Self::BuildGraph => "build_graph",
            Self::Synthesize { name, .. } => name,
        }
    }

    fn synthesize(
        name: &str,
        prompt: &str,
        inputs: &[ContextInput],
        output: SynthesisOutput,
    ) -> Self {
        Self::Synthesize {
            name: name.into(),
            prompt: prompt.into(),
            inputs: inputs.to_vec(),
            output,
        }
    }
}

/// Built-in stage lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Components → workflow plan → document, three model calls.
    #[default]
    Staged,
    /// A single model call from graph to document.
    Single,
}

impl Variant {
    /// The stage list for this variant.
    pub fn stages(&self) -> Vec<StageSpec> {
        use ContextInput::*;

        let mut stages = vec![StageSpec::FetchBoard, StageSpec::BuildGraph];
        match self {
            Self::Staged => {
                stages.push(StageSpec::synthesize(
                    "identify_components",
                    "architect",
                    &[Graph],
                    SynthesisOutput::Components,
                ));
                stages.push(StageSpec::synthesize(
                    "plan_workflows",
                    "workflow_planner",
                    &[Graph, Components],
                    SynthesisOutput::WorkflowPlan,
                ));
                stages.push(StageSpec::synthesize(
                    "synthesize_document",
                    "document",
                    &[Components, WorkflowPlan],
                    SynthesisOutput::Document,
                ));
            }
            Self::Single => {
                stages.push(StageSpec::synthesize(
                    "generate_document",
                    "single_pass",
                    &[Graph],
                    SynthesisOutput::Document,
                ));
            }
        }
        stages
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "staged" => Ok(Self::Staged),
            "single" => Ok(Self::Single),
            other => Err(format!("unknown pipeline variant '{other}': expected 'staged' or 'single'")),
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Staged => f.write_str("staged"),
            Self::Single => f.write_str("single"),
        }
    }
}

//! Staged pipeline: board reference → items → structural graph → model
//! synthesis → validated [`AgentSpec`].
//!
//! The stage list is data ([`StageSpec`]); the staged and single-pass
//! variants run through the same code. Each stage reads the current
//! [`RunState`] and returns a [`StateUpdate`]. Any fault inside a stage
//! becomes the run's error marker and every later stage is skipped.

use serde::Serialize;
use tracing::{Span, debug, info, instrument, warn};

use boardsmith_board::{BoardSource, MiroClient, parse_board_id};
use boardsmith_shared::{
    AgentSpec, AppConfig, BoardsmithError, ComponentsArtifact, ContextInput, Item, Position,
    Relation, Result, StageSpec, StructuralGraph, SynthesisOutput, WorkflowPlan, validate_document,
};

use crate::extract::extract_document;
use crate::graph::build_graph;
use crate::model::{ModelBackend, OllamaClient};
use crate::prompts;
use crate::state::{RunState, StateUpdate};

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Completed,
    Failed,
    /// An earlier stage had already failed.
    Skipped,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called before a stage runs (or is skipped).
    fn stage_started(&self, name: &str, index: usize, total: usize);
    /// Called after a stage's update has been merged.
    fn stage_finished(&self, name: &str, status: StageStatus);
    /// Called once with the final state.
    fn done(&self, state: &RunState);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage_started(&self, _name: &str, _index: usize, _total: usize) {}
    fn stage_finished(&self, _name: &str, _status: StageStatus) {}
    fn done(&self, _state: &RunState) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A configured stage list plus its external collaborators.
pub struct Pipeline {
    stages: Vec<StageSpec>,
    board: Box<dyn BoardSource>,
    model: Box<dyn ModelBackend>,
}

impl Pipeline {
    pub fn new(
        stages: Vec<StageSpec>,
        board: Box<dyn BoardSource>,
        model: Box<dyn ModelBackend>,
    ) -> Self {
        Self {
            stages,
            board,
            model,
        }
    }

    /// Build the production pipeline (Miro + Ollama) from resolved config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let board = MiroClient::from_config(&config.board)?;
        let model = OllamaClient::new(&config.model)?;
        Ok(Self::new(
            config.pipeline.resolved_stages(),
            Box::new(board),
            Box::new(model),
        ))
    }

    /// Replace the stage list, keeping the collaborators.
    pub fn with_stages(mut self, stages: Vec<StageSpec>) -> Self {
        self.stages = stages;
        self
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Run every stage in order over a fresh state for `board_ref`.
    ///
    /// Never fails: the returned state holds either the document or the
    /// error marker (see [`RunState::outcome`]).
    #[instrument(skip_all, fields(board_ref = %board_ref, run_id = tracing::field::Empty))]
    pub async fn run(&self, board_ref: &str, progress: &dyn ProgressReporter) -> RunState {
        let mut state = RunState::new(board_ref);
        Span::current().record("run_id", tracing::field::display(state.run_id()));
        let started = std::time::Instant::now();
        let total = self.stages.len();

        info!(stages = total, "starting pipeline run");

        for (index, stage) in self.stages.iter().enumerate() {
            progress.stage_started(stage.name(), index + 1, total);

            let skipped = state.is_failed();
            let update = self.run_stage(stage, &state).await;
            let status = match (&update.error, skipped) {
                (_, true) => StageStatus::Skipped,
                (Some(_), false) => StageStatus::Failed,
                (None, false) => StageStatus::Completed,
            };
            state = state.merge(update);

            progress.stage_finished(stage.name(), status);
        }

        match state.outcome() {
            Ok(spec) => info!(
                name = %spec.name,
                sub_agents = spec.sub_agents.len(),
                workflows = spec.workflows.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "pipeline run complete"
            ),
            Err(error) => warn!(
                stage = %error.stage,
                kind = %error.kind,
                message = %error.message,
                "pipeline run failed"
            ),
        }

        progress.done(&state);
        state
    }

    /// Run one stage against `state`.
    ///
    /// Returns an empty update if the error marker is already set, and an
    /// error-only update if the stage's own work fails.
    #[instrument(skip_all, fields(stage = %stage.name()))]
    pub async fn run_stage(&self, stage: &StageSpec, state: &RunState) -> StateUpdate {
        if state.is_failed() {
            debug!("earlier stage failed, skipping");
            return StateUpdate::default();
        }

        match self.execute(stage, state).await {
            Ok(update) => update,
            Err(e) => {
                warn!(error = %e, "stage failed");
                StateUpdate::failed(stage.name(), &e)
            }
        }
    }

    async fn execute(&self, stage: &StageSpec, state: &RunState) -> Result<StateUpdate> {
        match stage {
            StageSpec::FetchBoard => self.fetch_board(state).await,
            StageSpec::BuildGraph => build_graph_stage(state),
            StageSpec::Synthesize {
                name,
                prompt,
                inputs,
                output,
            } => self.synthesize(name, prompt, inputs, *output, state).await,
        }
    }

    async fn fetch_board(&self, state: &RunState) -> Result<StateUpdate> {
        let board_id = parse_board_id(state.board_ref())?;
        let items = self.board.fetch_items(&board_id).await?;
        info!(%board_id, items = items.len(), "board items fetched");

        Ok(StateUpdate {
            board_id: Some(board_id),
            items: Some(items),
            ..StateUpdate::default()
        })
    }

    async fn synthesize(
        &self,
        name: &str,
        prompt: &str,
        inputs: &[ContextInput],
        output: SynthesisOutput,
        state: &RunState,
    ) -> Result<StateUpdate> {
        let context = build_context(name, inputs, state)?;
        let reply = self.model.complete(prompts::resolve(prompt), &context).await?;
        let document = extract_document(&reply)?;

        let mut update = StateUpdate::default();
        match output {
            SynthesisOutput::Components => {
                let components: ComponentsArtifact = validate_document(document, "components")?;
                info!(
                    sub_agents = components.sub_agents.len(),
                    tools = components.tools.len(),
                    "components identified"
                );
                update.components = Some(components);
            }
            SynthesisOutput::WorkflowPlan => {
                let plan: WorkflowPlan = validate_document(document, "workflow plan")?;
                info!(workflows = plan.workflows.len(), "workflows planned");
                update.workflow_plan = Some(plan);
            }
            SynthesisOutput::Document => {
                let spec: AgentSpec = validate_document(document, "agent spec")?;
                info!(name = %spec.name, "document synthesized");
                update.document = Some(spec);
            }
        }
        Ok(update)
    }
}

fn build_graph_stage(state: &RunState) -> Result<StateUpdate> {
    let items = state
        .items()
        .ok_or_else(|| BoardsmithError::validation("build_graph requires fetched board items"))?;

    Ok(StateUpdate {
        graph: Some(build_graph(items.iter().cloned())),
        ..StateUpdate::default()
    })
}

// ---------------------------------------------------------------------------
// Model context
// ---------------------------------------------------------------------------

/// Item as shown to the model: raw metadata and style are left out.
#[derive(Serialize)]
struct ItemView<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    item_type: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
}

#[derive(Serialize)]
struct GraphView<'a> {
    items: Vec<ItemView<'a>>,
    relations: &'a [Relation],
    frames: Vec<&'a str>,
}

impl<'a> GraphView<'a> {
    fn new(graph: &'a StructuralGraph) -> Self {
        Self {
            items: graph.items.values().map(ItemView::new).collect(),
            relations: &graph.relations,
            frames: graph.frames.iter().map(String::as_str).collect(),
        }
    }
}

impl<'a> ItemView<'a> {
    fn new(item: &'a Item) -> Self {
        Self {
            id: &item.id,
            item_type: item.item_type.as_str(),
            content: &item.content,
            parent_id: item.parent_id.as_deref(),
            position: item.position,
        }
    }
}

/// Render the context payload for a synthesis stage from prior artifacts.
fn build_context(stage: &str, inputs: &[ContextInput], state: &RunState) -> Result<String> {
    let missing = |input: ContextInput| {
        BoardsmithError::validation(format!(
            "stage '{stage}' requires the {} artifact, which no earlier stage produced",
            input.as_str()
        ))
    };

    let mut sections = Vec::with_capacity(inputs.len());
    for input in inputs {
        let (heading, json) = match input {
            ContextInput::Graph => {
                let graph = state.graph().ok_or_else(|| missing(*input))?;
                ("Structural graph of the board", to_json(&GraphView::new(graph))?)
            }
            ContextInput::Components => {
                let components = state.components().ok_or_else(|| missing(*input))?;
                ("Identified sub-agents and tools", to_json(components)?)
            }
            ContextInput::WorkflowPlan => {
                let plan = state.workflow_plan().ok_or_else(|| missing(*input))?;
                ("Planned workflows", to_json(plan)?)
            }
        };
        sections.push(format!("{heading}:\n{json}"));
    }

    Ok(sections.join("\n\n"))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| BoardsmithError::validation(format!("failed to serialize context: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

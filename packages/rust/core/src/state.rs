//! The per-run state record and its reducer.
//!
//! A [`RunState`] is only changed by [`RunState::merge`], which folds a
//! stage's [`StateUpdate`] into a new state value. Once the error marker is
//! set, every later merge is a no-op.

use boardsmith_shared::{
    AgentSpec, BoardsmithError, ComponentsArtifact, ErrorKind, Item, RunId, StructuralGraph,
    WorkflowPlan,
};

/// The run's error marker: which stage failed, and how.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stage '{stage}' failed ({kind}): {message}")]
pub struct StageError {
    pub stage: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(stage: impl Into<String>, error: &BoardsmithError) -> Self {
        Self {
            stage: stage.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// A stage's partial update. `None` fields leave the state untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub board_id: Option<String>,
    pub items: Option<Vec<Item>>,
    pub graph: Option<StructuralGraph>,
    pub components: Option<ComponentsArtifact>,
    pub workflow_plan: Option<WorkflowPlan>,
    pub document: Option<AgentSpec>,
    pub error: Option<StageError>,
}

impl StateUpdate {
    /// An update carrying only the error marker.
    pub fn failed(stage: impl Into<String>, error: &BoardsmithError) -> Self {
        Self {
            error: Some(StageError::new(stage, error)),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Accumulated artifacts of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    run_id: RunId,
    board_ref: String,
    board_id: Option<String>,
    items: Option<Vec<Item>>,
    graph: Option<StructuralGraph>,
    components: Option<ComponentsArtifact>,
    workflow_plan: Option<WorkflowPlan>,
    document: Option<AgentSpec>,
    error: Option<StageError>,
}

impl RunState {
    /// Initial state for a run over `board_ref`.
    pub fn new(board_ref: impl Into<String>) -> Self {
        Self {
            run_id: RunId::new(),
            board_ref: board_ref.into(),
            board_id: None,
            items: None,
            graph: None,
            components: None,
            workflow_plan: None,
            document: None,
            error: None,
        }
    }

    /// Fold `update` into the state.
    ///
    /// Present fields replace the current value, absent ones are kept. When
    /// the error marker is already set the update is discarded, so the first
    /// error wins and nothing changes afterwards.
    pub fn merge(self, update: StateUpdate) -> Self {
        if self.error.is_some() {
            return self;
        }

        Self {
            run_id: self.run_id,
            board_ref: self.board_ref,
            board_id: update.board_id.or(self.board_id),
            items: update.items.or(self.items),
            graph: update.graph.or(self.graph),
            components: update.components.or(self.components),
            workflow_plan: update.workflow_plan.or(self.workflow_plan),
            document: update.document.or(self.document),
            error: update.error,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn board_ref(&self) -> &str {
        &self.board_ref
    }

    pub fn board_id(&self) -> Option<&str> {
        self.board_id.as_deref()
    }

    pub fn items(&self) -> Option<&[Item]> {
        self.items.as_deref()
    }

    pub fn graph(&self) -> Option<&StructuralGraph> {
        self.graph.as_ref()
    }

    pub fn components(&self) -> Option<&ComponentsArtifact> {
        self.components.as_ref()
    }

    pub fn workflow_plan(&self) -> Option<&WorkflowPlan> {
        self.workflow_plan.as_ref()
    }

    /// The final document. Never returned alongside an error marker.
    pub fn document(&self) -> Option<&AgentSpec> {
        match self.error {
            Some(_) => None,
            None => self.document.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&StageError> {
        self.error.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// The run's terminal result: the document, or the error marker.
    pub fn outcome(&self) -> Result<&AgentSpec, StageError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        self.document.as_ref().ok_or_else(|| StageError {
            stage: "pipeline".into(),
            kind: ErrorKind::Validation,
            message: "pipeline finished without producing a document".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardsmith_shared::ItemType;
    use serde_json::json;

    fn spec() -> AgentSpec {
        serde_json::from_value(json!({"name": "X", "role": "Y", "goal": "Z"})).unwrap()
    }

    #[test]
    fn merge_keeps_absent_fields() {
        let state = RunState::new("https://miro.com/app/board/b1/").merge(StateUpdate {
            board_id: Some("b1".into()),
            items: Some(vec![Item::new("a", ItemType::Text)]),
            ..StateUpdate::default()
        });

        let state = state.merge(StateUpdate {
            graph: Some(StructuralGraph::default()),
            ..StateUpdate::default()
        });

        assert_eq!(state.board_id(), Some("b1"));
        assert_eq!(state.items().map(<[Item]>::len), Some(1));
        assert!(state.graph().is_some());
    }

    #[test]
    fn empty_update_is_identity() {
        let state = RunState::new("ref");
        let merged = state.clone().merge(StateUpdate::default());
        assert_eq!(state, merged);
        assert!(StateUpdate::default().is_empty());
    }

    #[test]
    fn first_error_wins() {
        let first = BoardsmithError::Fetch("offline".into());
        let second = BoardsmithError::ModelCall("timeout".into());

        let state = RunState::new("ref")
            .merge(StateUpdate::failed("fetch_board", &first))
            .merge(StateUpdate::failed("identify_components", &second));

        let error = state.error().unwrap();
        assert_eq!(error.stage, "fetch_board");
        assert_eq!(error.kind, ErrorKind::Fetch);
    }

    #[test]
    fn nothing_changes_after_error() {
        let failed = RunState::new("ref").merge(StateUpdate::failed(
            "fetch_board",
            &BoardsmithError::reference("no id"),
        ));
        let after = failed.clone().merge(StateUpdate {
            board_id: Some("b1".into()),
            document: Some(spec()),
            ..StateUpdate::default()
        });
        assert_eq!(failed, after);
    }

    #[test]
    fn outcome_prefers_error_over_document() {
        let state = RunState::new("ref")
            .merge(StateUpdate {
                document: Some(spec()),
                ..StateUpdate::default()
            })
            .merge(StateUpdate::failed("late", &BoardsmithError::validation("bad")));

        assert!(state.document().is_none());
        assert_eq!(state.outcome().unwrap_err().stage, "late");
    }

    #[test]
    fn outcome_without_document_is_error() {
        let err = RunState::new("ref").outcome().unwrap_err();
        assert_eq!(err.stage, "pipeline");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn outcome_returns_document() {
        let state = RunState::new("ref").merge(StateUpdate {
            document: Some(spec()),
            ..StateUpdate::default()
        });
        assert_eq!(state.outcome().unwrap().name, "X");
    }

    #[test]
    fn stage_error_display() {
        let err = StageError::new("fetch_board", &BoardsmithError::Fetch("HTTP 404".into()));
        assert_eq!(err.to_string(), "stage 'fetch_board' failed (fetch): fetch error: HTTP 404");
    }
}

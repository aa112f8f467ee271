//! Output document schema and intermediate synthesis artifacts.
//!
//! Every list and text field defaults to empty, whether missing or `null`,
//! and unknown fields land in an `extra` map, so sparse or chatty model
//! output still validates.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BoardsmithError, Result};

/// Default `type` tag of an [`AgentSpec`].
pub const DEFAULT_AGENT_TYPE: &str = "orchestrator";

/// A tool the agent system can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTool {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Argument name → description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A component agent, usually inferred from a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAgent {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One step of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStep {
    #[serde(default, deserialize_with = "lenient_step_id")]
    pub step_id: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// A sub-agent or tool name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tools_required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An ordered list of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentWorkflow {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<AgentStep>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The final output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub role: String,
    pub goal: String,
    /// `orchestrator` or `agent`; free-form to tolerate model variation.
    #[serde(
        rename = "type",
        default = "default_agent_type",
        deserialize_with = "agent_type_or_default"
    )]
    pub agent_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_agents: Vec<SubAgent>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tools: Vec<AgentTool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workflows: Vec<AgentWorkflow>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub constraints: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_agent_type() -> String {
    DEFAULT_AGENT_TYPE.into()
}

// ---------------------------------------------------------------------------
// Lenient field deserializers
// ---------------------------------------------------------------------------

/// `null` reads as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `null` or an empty string reads as [`DEFAULT_AGENT_TYPE`].
fn agent_type_or_default<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(default_agent_type))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseStepId {
    Int(u32),
    Float(f64),
    Text(String),
}

/// Accepts `1`, `1.0`, `"1"` and `null` (as 0).
fn lenient_step_id<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let integral =
        |f: f64| (f.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&f)).then_some(f as u32);

    match Option::<LooseStepId>::deserialize(deserializer)? {
        None => Ok(0),
        Some(LooseStepId::Int(n)) => Ok(n),
        Some(LooseStepId::Float(f)) => {
            integral(f).ok_or_else(|| de::Error::custom(format!("step_id {f} is not a step number")))
        }
        Some(LooseStepId::Text(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<u32>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral))
                .ok_or_else(|| de::Error::custom(format!("step_id '{s}' is not a step number")))
        }
    }
}

/// Output of the component identification stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentsArtifact {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_agents: Vec<SubAgent>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tools: Vec<AgentTool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Output of the workflow planning stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPlan {
    #[serde(default, deserialize_with = "null_as_default")]
    pub workflows: Vec<AgentWorkflow>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Validate an extracted document against a schema type.
///
/// `what` names the artifact in the error message.
pub fn validate_document<T: DeserializeOwned>(document: Map<String, Value>, what: &str) -> Result<T> {
    serde_json::from_value(Value::Object(document))
        .map_err(|e| BoardsmithError::validation(format!("{what} does not match its schema: {e}")))
}

//! Output files for a finished run: the agent spec as JSON plus a
//! human-readable markdown report next to it.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, instrument};

use boardsmith_shared::{AgentSpec, AgentWorkflow, BoardsmithError, Result};

/// Version stamped into the report footer.
const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Paths written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub report: PathBuf,
}

/// Render the markdown report for `spec`.
pub fn render_report(spec: &AgentSpec) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Agent System: {}", or_placeholder(&spec.name, "Unnamed System"));
    let _ = writeln!(out, "**Role:** {}", or_placeholder(&spec.role, "N/A"));
    let _ = writeln!(out, "**Goal:** {}", or_placeholder(&spec.goal, "N/A"));
    let _ = writeln!(out, "**Type:** {}", spec.agent_type);
    out.push('\n');

    if !spec.sub_agents.is_empty() {
        out.push_str("## Sub-Agents\n");
        for agent in &spec.sub_agents {
            let _ = writeln!(out, "### {}", agent.name);
            let _ = writeln!(out, "- **Role:** {}", or_placeholder(&agent.role, "N/A"));
            let _ = writeln!(
                out,
                "- **Goal:** {}",
                agent.goal.as_deref().map_or("N/A", |g| or_placeholder(g, "N/A"))
            );
            let _ = writeln!(out, "- **Description:** {}", agent.description);
            out.push('\n');
        }
    }

    out.push_str("## Tools\n");
    for tool in &spec.tools {
        let _ = writeln!(out, "- **{}**: {}", tool.name, tool.description);
    }
    out.push('\n');

    out.push_str("## Workflows\n");
    for workflow in &spec.workflows {
        render_workflow(&mut out, workflow);
    }

    if !spec.constraints.is_empty() {
        out.push_str("## Constraints\n");
        for constraint in &spec.constraints {
            let _ = writeln!(out, "- {constraint}");
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "---\n_Generated by Boardsmith {TOOL_VERSION} on {}_",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    out
}

fn render_workflow(out: &mut String, workflow: &AgentWorkflow) {
    let _ = writeln!(out, "### {}", workflow.name);
    if !workflow.description.is_empty() {
        let _ = writeln!(out, "_{}_", workflow.description);
    }
    out.push('\n');
    out.push_str("**Steps:**\n");

    for step in &workflow.steps {
        let assignee = step
            .assigned_to
            .as_deref()
            .filter(|a| !a.is_empty())
            .map(|a| format!("**[{a}]** "))
            .unwrap_or_default();
        let tools = if step.tools_required.is_empty() {
            String::new()
        } else {
            format!(" (Tools: {})", step.tools_required.join(", "))
        };
        let _ = writeln!(out, "{}. {assignee}{}{tools}", step.step_id, step.description);
    }
    out.push('\n');
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() { placeholder } else { value }
}

/// The report path for a JSON output path: same stem, `.md` extension.
pub fn report_path(json_path: &Path) -> PathBuf {
    json_path.with_extension("md")
}

/// Write `spec` as pretty JSON to `path` and its report next to it.
///
/// Each file is written to a temp sibling and then renamed into place.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_outputs(path: &Path, spec: &AgentSpec) -> Result<OutputPaths> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| BoardsmithError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(spec)
        .map_err(|e| BoardsmithError::validation(format!("JSON serialization failed: {e}")))?;
    write_atomic(path, &json)?;

    let report = report_path(path);
    write_atomic(&report, &render_report(spec))?;

    info!(report = %report.display(), "outputs written");

    Ok(OutputPaths {
        json: path.to_path_buf(),
        report,
    })
}

/// Write any serializable value as pretty JSON.
pub fn write_json<T: serde::Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| BoardsmithError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| BoardsmithError::validation(format!("JSON serialization failed: {e}")))?;
    write_atomic(path, &json)
}

fn write_atomic(target: &Path, content: &str) -> Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    let temp = target.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| BoardsmithError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| BoardsmithError::io(target, e))?;

    debug!(path = %target.display(), size = content.len(), "wrote file");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bs-artifacts-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn spec() -> AgentSpec {
        serde_json::from_value(json!({
            "name": "ResearchSystem",
            "role": "Orchestrator",
            "goal": "Answer research questions",
            "sub_agents": [
                {"name": "Researcher", "role": "Research", "description": "Finds sources", "goal": "Collect evidence"}
            ],
            "tools": [{"name": "web_search", "description": "Search the web"}],
            "workflows": [{
                "name": "Main",
                "description": "Research flow",
                "steps": [
                    {"step_id": 1, "description": "Search", "assigned_to": "Researcher", "tools_required": ["web_search", "fetch"]},
                    {"step_id": 2, "description": "Report"}
                ]
            }],
            "priority": "high"
        }))
        .unwrap()
    }

    #[test]
    fn report_has_header_and_sections() {
        let report = render_report(&spec());
        assert!(report.starts_with("# Agent System: ResearchSystem\n"));
        assert!(report.contains("**Role:** Orchestrator"));
        assert!(report.contains("**Type:** orchestrator"));
        assert!(report.contains("## Sub-Agents\n### Researcher\n"));
        assert!(report.contains("- **Goal:** Collect evidence"));
        assert!(report.contains("- **web_search**: Search the web"));
        assert!(report.contains("_Research flow_"));
        assert!(report.contains("_Generated by Boardsmith "));
    }

    #[test]
    fn report_numbers_steps_with_assignee_and_tools() {
        let report = render_report(&spec());
        assert!(report.contains("1. **[Researcher]** Search (Tools: web_search, fetch)\n"));
        assert!(report.contains("2. Report\n"));
    }

    #[test]
    fn report_omits_empty_sub_agents() {
        let spec: AgentSpec =
            serde_json::from_value(json!({"name": "X", "role": "", "goal": "Z"})).unwrap();
        let report = render_report(&spec);
        assert!(!report.contains("## Sub-Agents"));
        assert!(report.contains("**Role:** N/A"));
        assert!(report.contains("## Tools"));
        assert!(report.contains("## Workflows"));
    }

    #[test]
    fn report_path_swaps_extension() {
        assert_eq!(report_path(Path::new("out/agent_plan.json")), PathBuf::from("out/agent_plan.md"));
        assert_eq!(report_path(Path::new("plan")), PathBuf::from("plan.md"));
    }

    #[test]
    fn write_outputs_creates_both_files() {
        let dir = temp_dir();
        let path = dir.join("nested").join("agent_plan.json");

        let paths = write_outputs(&path, &spec()).unwrap();
        assert_eq!(paths.report, dir.join("nested").join("agent_plan.md"));

        let written: AgentSpec =
            serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(written, spec());
        assert_eq!(written.extra["priority"], json!("high"));

        let report = std::fs::read_to_string(&paths.report).unwrap();
        assert!(report.starts_with("# Agent System: ResearchSystem"));

        let leftovers: Vec<_> = std::fs::read_dir(dir.join("nested"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_json_pretty_prints() {
        let dir = temp_dir();
        let path = dir.join("graph.json");
        write_json(&path, &json!({"a": 1})).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\n  \"a\": 1\n}");
        let _ = std::fs::remove_dir_all(&dir);
    }
}

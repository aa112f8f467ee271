//! Application configuration for Boardsmith.
//!
//! User config lives at `~/.boardsmith/boardsmith.toml`.
//! CLI flags override config file values, which override defaults.
//! The resolved [`AppConfig`] is built once and handed to the pipeline and
//! its collaborators at construction time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BoardsmithError, Result};
use crate::stage::{StageSpec, Variant};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "boardsmith.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".boardsmith";

// ---------------------------------------------------------------------------
// Config structs (matching boardsmith.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Board API settings.
    #[serde(default)]
    pub board: BoardConfig,

    /// Model backend settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Stage list selection.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// `[board]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Base URL of the board REST API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the env var holding the access token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Items requested per page.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Also walk the connectors listing.
    #[serde(default = "default_true")]
    pub include_connectors: bool,

    /// Per-request timeout.
    #[serde(default = "default_board_timeout")]
    pub timeout_secs: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_env: default_token_env(),
            page_limit: default_page_limit(),
            include_connectors: true,
            timeout_secs: default_board_timeout(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.miro.com/v2".into()
}
fn default_token_env() -> String {
    "MIRO_ACCESS_TOKEN".into()
}
fn default_page_limit() -> u32 {
    50
}
fn default_true() -> bool {
    true
}
fn default_board_timeout() -> u64 {
    30
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Ollama-compatible server URL.
    #[serde(default = "default_model_base_url")]
    pub base_url: String,

    /// Model name passed to the backend.
    #[serde(default = "default_model")]
    pub model: String,

    /// Ask the backend for JSON output. The reply is still run through extraction.
    #[serde(default = "default_true")]
    pub json_format_hint: bool,

    /// Per-call timeout.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            model: default_model(),
            json_format_hint: true,
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_model_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "qwen3-coder:480b-cloud".into()
}
fn default_model_timeout() -> u64 {
    300
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Built-in stage list.
    #[serde(default)]
    pub variant: Variant,

    /// Explicit stage list; takes precedence over `variant` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<StageSpec>>,
}

impl PipelineConfig {
    /// The stage list this configuration selects.
    pub fn resolved_stages(&self) -> Vec<StageSpec> {
        match &self.stages {
            Some(stages) => stages.clone(),
            None => self.variant.stages(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.boardsmith/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BoardsmithError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.boardsmith/boardsmith.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BoardsmithError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        BoardsmithError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BoardsmithError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BoardsmithError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BoardsmithError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the board access token from the configured env var.
pub fn resolve_board_token(config: &BoardConfig) -> Result<String> {
    let var_name = &config.token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(BoardsmithError::config(format!(
            "board access token not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageSpec;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("api_base"));
        assert!(toml_str.contains("MIRO_ACCESS_TOKEN"));
        assert!(!toml_str.contains("stages"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.board.page_limit, 50);
        assert_eq!(parsed.model.base_url, "http://localhost:11434");
        assert_eq!(parsed.pipeline.variant, Variant::Staged);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[model]
model = "llama3.1"

[pipeline]
variant = "single"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.model.model, "llama3.1");
        assert!(config.model.json_format_hint);
        assert!(config.board.include_connectors);
        assert_eq!(config.pipeline.resolved_stages().len(), 3);
    }

    #[test]
    fn explicit_stages_override_variant() {
        let toml_str = r#"
[pipeline]
variant = "staged"

[[pipeline.stages]]
kind = "fetch_board"

[[pipeline.stages]]
kind = "build_graph"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(
            config.pipeline.resolved_stages(),
            vec![StageSpec::FetchBoard, StageSpec::BuildGraph]
        );
    }

    #[test]
    fn token_resolution() {
        let config = BoardConfig {
            // Use a unique env var name to avoid interfering with other tests
            token_env: "BS_TEST_NONEXISTENT_TOKEN_12345".into(),
            ..BoardConfig::default()
        };
        let result = resolve_board_token(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("access token not found"));
    }
}

//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use boardsmith_core::{Pipeline, ProgressReporter, RunState, StageStatus};
use boardsmith_shared::{AppConfig, StageSpec, Variant, init_config, load_config};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Boardsmith: turn whiteboards into agent system specifications.
#[derive(Parser)]
#[command(
    name = "boardsmith",
    version,
    about = "Turn a Miro board into a validated agent system specification.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full pipeline and write the agent spec plus its report.
    Build {
        /// Board URL (or any reference containing `board/<id>`).
        url: String,

        /// Output file for the agent spec JSON. The report is written next to it.
        #[arg(short, long, default_value = "agent_plan.json")]
        output: PathBuf,

        /// Stage list to run: staged or single.
        #[arg(long)]
        variant: Option<Variant>,

        /// Model name, overriding the config file.
        #[arg(long)]
        model: Option<String>,
    },

    /// Fetch the board and write its structural graph, without calling a model.
    Graph {
        /// Board URL.
        url: String,

        /// Output file for the graph JSON.
        #[arg(short, long, default_value = "graph.json")]
        output: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "boardsmith=info",
        1 => "boardsmith=debug",
        _ => "boardsmith=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            url,
            output,
            variant,
            model,
        } => cmd_build(&url, &output, variant, model).await,
        Command::Graph { url, output } => cmd_graph(&url, &output).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Apply command-line overrides on top of the file configuration.
fn apply_overrides(config: &mut AppConfig, variant: Option<Variant>, model: Option<String>) {
    if let Some(variant) = variant {
        config.pipeline.variant = variant;
        config.pipeline.stages = None;
    }
    if let Some(model) = model {
        config.model.model = model;
    }
}

async fn cmd_build(
    url: &str,
    output: &Path,
    variant: Option<Variant>,
    model: Option<String>,
) -> Result<()> {
    let mut config = load_config()?;
    apply_overrides(&mut config, variant, model);

    let pipeline = Pipeline::from_config(&config)?;

    info!(
        url,
        variant = %config.pipeline.variant,
        model = %config.model.model,
        stages = pipeline.stages().len(),
        "building agent spec"
    );

    let reporter = CliProgress::new();
    let state = pipeline.run(url, &reporter).await;

    let spec = match state.outcome() {
        Ok(spec) => spec,
        Err(error) => return Err(eyre!(error)),
    };

    let paths = boardsmith_artifacts::write_outputs(output, spec)?;

    println!();
    println!("  Agent spec generated!");
    println!("  Name:       {}", spec.name);
    println!("  Sub-agents: {}", spec.sub_agents.len());
    println!("  Tools:      {}", spec.tools.len());
    println!("  Workflows:  {}", spec.workflows.len());
    println!("  Spec:       {}", paths.json.display());
    println!("  Report:     {}", paths.report.display());
    println!();

    Ok(())
}

async fn cmd_graph(url: &str, output: &Path) -> Result<()> {
    let config = load_config()?;
    let pipeline = Pipeline::from_config(&config)?
        .with_stages(vec![StageSpec::FetchBoard, StageSpec::BuildGraph]);

    info!(url, "building structural graph");

    let reporter = CliProgress::new();
    let state = pipeline.run(url, &reporter).await;

    if let Some(error) = state.error() {
        return Err(eyre!(error.clone()));
    }
    let graph = state
        .graph()
        .ok_or_else(|| eyre!("pipeline finished without a structural graph"))?;

    boardsmith_artifacts::write_json(output, graph)?;

    println!();
    println!("  Structural graph built!");
    println!("  Items:     {}", graph.items.len());
    println!("  Frames:    {}", graph.frames.len());
    println!("  Relations: {}", graph.relations.len());
    println!("  Path:      {}", output.display());
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage_started(&self, name: &str, index: usize, total: usize) {
        self.spinner.set_message(format!("[{index}/{total}] {name}"));
    }

    fn stage_finished(&self, name: &str, status: StageStatus) {
        if status == StageStatus::Failed {
            self.spinner.println(format!("  ✗ {name}"));
        }
    }

    fn done(&self, _state: &RunState) {
        self.spinner.finish_and_clear();
    }
}

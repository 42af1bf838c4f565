//! CLI definition and command dispatch for `experiment`.
//!
//! ## Configuration Precedence
//!
//! 1. CLI flags (`--home`, `--config`, `--verbose`)
//! 2. Environment variables (`PBOX_HOME`, `PBOX_CONFIG`)
//! 3. Config file (`<home>/config.yaml`)
//! 4. Built-in defaults (`~/.pbox`)

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use crate::ui::{table, ColorMode, MessageType, Style};

use pbox_core::constants::{PBOX_CONFIG_ENV, PBOX_HOME_ENV};
use pbox_core::{
    commit, list_experiments, Artifact, CommitOutcome, Experiment, FileHistory, GlobalConfig,
    PboxError, SystemEditor, ValidationWarning, Workspace,
};

// ============================================================================
// CLI Definition
// ============================================================================

/// Version string including git commit hash
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Manage packing-box experiments layered over the global workspace
#[derive(Parser, Debug)]
#[command(name = "experiment")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Root of the pbox workspace (default: ~/.pbox)
    #[arg(long, global = true, env = PBOX_HOME_ENV)]
    pub home: Option<PathBuf>,

    /// Path to the configuration file (default: <home>/config.yaml)
    #[arg(long, global = true, env = PBOX_CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create (if needed) and open an experiment
    #[command(after_help = r#"EXAMPLES:
    # Start a new experiment and make it the active one
    experiment open upx-study
"#)]
    Open {
        /// Experiment name
        name: String,
    },

    /// Close the active experiment (files are kept)
    Close,

    /// List valid experiments
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show datasets, models and configuration states of the active experiment
    Show {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Resolve a name in the active experiment
    #[command(after_help = r#"EXAMPLES:
    # Configuration kind: local override if any, global definition otherwise
    experiment get packers

    # Reserved documents
    experiment get README
    experiment get commands

    # Experiment-local dataset or model
    experiment get upx-only
"#)]
    Get {
        /// Config kind, README, commands, dataset or model name
        name: String,
    },

    /// Edit a configuration kind (promoted to a local override) or a document
    Edit {
        /// Config kind, README or commands
        target: String,
    },

    /// Append the last pbox-related shell command to commands.rc
    #[command(after_help = r#"EXAMPLES:
    # Ask before committing
    experiment commit

    # Commit without asking, reading a zsh history
    experiment commit --force --history ~/.zsh_history
"#)]
    Commit {
        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,

        /// Shell history file (default: $HISTFILE or ~/.bash_history)
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,
    },

    /// Convert the datasets of the active experiment to fileless form
    Compress,

    /// Validate an experiment folder
    Validate {
        /// Experiment name
        name: String,

        /// Treat unexpected entries as errors
        #[arg(long)]
        strict: bool,
    },
}

// ============================================================================
// Entry point
// ============================================================================

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Warnings are always shown, debug details only with --verbose
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = format!("pbox_core={},pbox_cli={}", log_level, log_level);

    tracing_subscriber::fmt()
        .with_env_filter(&filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let style = Style::new(cli.color);

    let workspace = match load_workspace(&cli) {
        Ok(ws) => ws,
        Err(e) => {
            let hint = match &cli.config {
                Some(path) => format!("Check your config at {}", path.display()),
                None => "Check your global config at ~/.pbox/config.yaml".to_string(),
            };
            eprintln!(
                "{}",
                style.error_with_context(
                    "Failed to load the pbox workspace",
                    Some(&e.to_string()),
                    Some(&hint),
                )
            );
            return ExitCode::FAILURE;
        }
    };

    let result = dispatch(&style, workspace, cli.command);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = e.to_string();
            let cause = e
                .chain()
                .nth(1)
                .map(|c| c.to_string())
                .filter(|c| !message.contains(c.as_str()));
            eprintln!(
                "{}",
                style.error_with_context(&message, cause.as_deref(), hint_for(&e))
            );
            ExitCode::FAILURE
        }
    }
}

fn load_workspace(cli: &Cli) -> Result<Workspace> {
    let home = cli
        .home
        .clone()
        .or_else(GlobalConfig::default_home)
        .ok_or_else(|| anyhow!("could not determine the pbox home directory"))?;
    tracing::debug!("Using pbox home {}", home.display());

    let config = match &cli.config {
        Some(path) => GlobalConfig::from_explicit_path(path, &home)?,
        None => GlobalConfig::load_from_home(&home)?,
    };
    Ok(Workspace::load(config)?)
}

fn dispatch(style: &Style, mut workspace: Workspace, command: Command) -> Result<()> {
    match command {
        Command::Open { name } => handle_open(style, &mut workspace, &name),
        Command::Close => handle_close(style, &mut workspace),
        Command::List { json } => handle_list(style, &workspace, json),
        Command::Show { json } => handle_show(style, &workspace, json),
        Command::Get { name } => handle_get(style, &workspace, &name),
        Command::Edit { target } => handle_edit(style, &mut workspace, &target),
        Command::Commit { force, history } => handle_commit(style, &workspace, force, history),
        Command::Compress => handle_compress(style, &workspace),
        Command::Validate { name, strict } => handle_validate(style, &workspace, &name, strict),
    }
}

/// Suggest a next step for errors users commonly run into.
fn hint_for(error: &anyhow::Error) -> Option<&'static str> {
    match error.downcast_ref::<PboxError>() {
        Some(PboxError::NotFound(_)) => {
            Some("Run `experiment show` to see what the experiment contains")
        }
        Some(PboxError::UnknownConfigKind(_)) => {
            Some("Configuration kinds are listed by `experiment show`")
        }
        Some(PboxError::InvalidName(_)) => Some("Try a name like `upx-study` or `run_01`"),
        Some(PboxError::Editor(_)) => Some("Set `editor` in config.yaml or the $EDITOR variable"),
        _ if error.to_string() == NO_ACTIVE_EXPERIMENT => {
            Some("Run `experiment open <name>` first")
        }
        _ => None,
    }
}

const NO_ACTIVE_EXPERIMENT: &str = "No experiment is open";

fn active_experiment(workspace: &Workspace) -> Result<Experiment> {
    Experiment::active(workspace)?.ok_or_else(|| anyhow!(NO_ACTIVE_EXPERIMENT))
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

// ============================================================================
// Command handlers
// ============================================================================

fn handle_open(style: &Style, workspace: &mut Workspace, name: &str) -> Result<()> {
    let experiment = Experiment::new(workspace, name, true)?;
    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!("Opened experiment `{}`", experiment.name())
        )
    );
    println!(
        "{}",
        style.message_detail("Path", &style.file_path(&display(experiment.path())))
    );
    let overrides = experiment.overridden_kinds(workspace);
    if !overrides.is_empty() {
        println!("{}", style.message_detail("Overrides", &overrides.join(", ")));
    }
    Ok(())
}

fn handle_close(style: &Style, workspace: &mut Workspace) -> Result<()> {
    let name = workspace
        .active_experiment()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned());

    if workspace.close_experiment()? {
        println!(
            "{}",
            style.message(
                MessageType::Ok,
                &format!("Closed experiment `{}`", name.unwrap_or_default())
            )
        );
    } else {
        println!("{}", style.message(MessageType::Skip, "No experiment is open"));
    }
    Ok(())
}

fn handle_list(style: &Style, workspace: &Workspace, json: bool) -> Result<()> {
    let rows = list_experiments(workspace)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!(
            "{}",
            style.message(
                MessageType::Info,
                &format!(
                    "No experiment found in {}",
                    display(workspace.experiments_dir())
                )
            )
        );
        return Ok(());
    }

    println!("{}", style.section("EXPERIMENTS"));
    println!();
    println!(
        "{}",
        table::render_experiments_table(&rows, workspace.active_experiment())
    );
    Ok(())
}

fn handle_show(style: &Style, workspace: &Workspace, json: bool) -> Result<()> {
    let experiment = active_experiment(workspace)?;
    let report = experiment.report(workspace)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{}",
        style.message(MessageType::Info, &format!("Experiment `{}`", report.name))
    );
    println!(
        "{}",
        style.message_detail("Path", &style.file_path(&display(&report.path)))
    );

    for (title, artifacts, fileless) in [
        ("DATASETS", &report.datasets, true),
        ("MODELS", &report.models, false),
    ] {
        println!();
        println!("{}", style.section(title));
        if artifacts.is_empty() {
            println!("  -");
        } else {
            println!("{}", table::render_artifacts_table(artifacts, fileless));
        }
    }

    println!();
    println!("{}", style.section("CONFIGURATIONS"));
    println!("{}", table::render_configs_table(&report.configs, style));
    Ok(())
}

fn handle_get(style: &Style, workspace: &Workspace, name: &str) -> Result<()> {
    let experiment = active_experiment(workspace)?;

    let (kind, detail) = match experiment.get(workspace, name)? {
        Artifact::Document(path) => ("document", display(&path)),
        Artifact::Config(entry) => (
            "config",
            format!("{} ({})", display(entry.path()), style.config_state(&entry.state)),
        ),
        Artifact::Dataset(dataset) => ("dataset", display(dataset.path())),
        Artifact::Model(model) => ("model", display(model.path())),
    };

    println!("{}", style.message(MessageType::Ok, &format!("{} `{}`", kind, name)));
    println!("{}", style.message_detail("Path", &detail));
    Ok(())
}

fn handle_edit(style: &Style, workspace: &mut Workspace, target: &str) -> Result<()> {
    let experiment = active_experiment(workspace)?;
    let editor = SystemEditor::from_config(workspace.config());
    let path = experiment.edit(workspace, target, &editor)?;
    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!("Edited {}", style.file_path(&display(&path)))
        )
    );
    Ok(())
}

fn handle_commit(
    style: &Style,
    workspace: &Workspace,
    force: bool,
    history: Option<PathBuf>,
) -> Result<()> {
    let experiment = active_experiment(workspace)?;
    let history_path = history
        .or_else(|| workspace.config().history_path())
        .context("could not locate the shell history file")?;
    let source = FileHistory::new(history_path);

    let mut ask = |question: &str| -> bool {
        print!("{} [y/N] ", question);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    };

    match commit(&experiment, &source, &mut ask, force)? {
        CommitOutcome::Committed(entry) => println!(
            "{}",
            style.message(MessageType::Ok, &format!("Committed `{}`", entry))
        ),
        CommitOutcome::NothingToCommit => {
            println!("{}", style.message(MessageType::Skip, "Nothing to commit"))
        }
        CommitOutcome::Declined => {
            println!("{}", style.message(MessageType::Skip, "Commit declined"))
        }
    }
    Ok(())
}

fn handle_compress(style: &Style, workspace: &Workspace) -> Result<()> {
    let experiment = active_experiment(workspace)?;
    let converted = experiment.compress(workspace)?;

    if converted.is_empty() {
        println!("{}", style.message(MessageType::Skip, "No dataset to be converted"));
        return Ok(());
    }

    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!("Converted {} dataset(s) to fileless form", converted.len())
        )
    );
    for name in &converted {
        println!("{}", style.list_item("-", name));
    }
    Ok(())
}

fn handle_validate(style: &Style, workspace: &Workspace, name: &str, strict: bool) -> Result<()> {
    let validator = workspace.validator();

    let mut warnings: Vec<ValidationWarning> = Vec::new();
    let result = if strict {
        validator.validate_strict(name)
    } else {
        validator.validate_with(name, &mut warnings)
    };
    let path = result.map_err(PboxError::from)?;

    for warning in &warnings {
        println!("{}", style.message(MessageType::Warn, &warning.to_string()));
    }

    if warnings.is_empty() {
        println!(
            "{}",
            style.message(MessageType::Ok, &format!("`{}` is a valid experiment", name))
        );
    } else {
        println!(
            "{}",
            style.message(
                MessageType::Ok,
                &format!("`{}` is a valid experiment with {} warning(s)", name, warnings.len())
            )
        );
    }
    println!(
        "{}",
        style.message_detail("Path", &style.file_path(&display(&path)))
    );

    if !strict && !warnings.is_empty() {
        println!(
            "{}",
            style.message(MessageType::Hint, "Use --strict to treat these as errors")
        );
    }
    Ok(())
}

//! Keep the editor on the first unresolved build or test error.
//!
//! Runs the configured tool, opens the first diagnostic, watches its file and
//! moves on once that location no longer appears in the output.

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nexterr::core::types::Mode;
use nexterr::engine::{Engine, EngineSettings};
use nexterr::exit_codes;
use nexterr::io::config::{NexterrConfig, load_config};
use nexterr::io::editor::EditorKind;
use nexterr::io::markers::{DEFAULT_MARKER, MarkerScan};
use nexterr::io::tool::CommandTool;
use nexterr::io::watch::NotifyWatcher;
use nexterr::logging;
use nexterr::looping::{LoopEvents, run_loop};
use nexterr::pipeline::Pipeline;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "nexterr",
    version,
    about = "Keep the editor on the first unresolved build or test error"
)]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct Options {
    /// Which command produces diagnostics.
    #[arg(short, long, value_enum, default_value = "build", global = true)]
    mode: Mode,

    /// Test name pattern for `run-test` mode.
    #[arg(long = "run", value_name = "PATTERN", global = true)]
    run_pattern: Option<String>,

    /// Editor to open: vscode, goland, or cmd:<program> <args> with {file},
    /// {line}, {column} or {location} placeholders.
    #[arg(long, default_value = "vscode", global = true)]
    editor: EditorKind,

    /// Exit once a pass reports no diagnostics.
    #[arg(short = 'e', long, global = true)]
    close_on_no_error: bool,

    /// Also report source lines containing this marker (default TODO in notes mode).
    #[arg(long, global = true)]
    marker: Option<String>,

    /// Log loop events to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print each diagnostic location once it is fixed.
    #[arg(long, global = true)]
    log_on_fix: bool,

    /// Peek at the next diagnostic each time Enter is pressed.
    #[arg(short = 'k', long, global = true)]
    step_on_enter: bool,

    /// Config file, relative to the working directory.
    #[arg(long, default_value = "nexterr.toml", global = true)]
    config: PathBuf,

    /// Directory to run the tool in.
    #[arg(short = 'C', long, default_value = ".", global = true)]
    workdir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Follow diagnostics until interrupted (default).
    Watch,
    /// Run one pass and print the diagnostics.
    List {
        /// Print a JSON array instead of one location per line.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.options.verbose);

    std::env::set_current_dir(&cli.options.workdir)
        .with_context(|| format!("enter {}", cli.options.workdir.display()))?;
    let cfg = load_config(&cli.options.config)?;
    let pipeline = build_pipeline(&cli.options, &cfg)?;

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => cmd_watch(&cli.options, &cfg, pipeline).await,
        Command::List { json } => cmd_list(&pipeline, json),
    }
}

fn build_pipeline(options: &Options, cfg: &NexterrConfig) -> Result<Pipeline<CommandTool>> {
    let tool = CommandTool::for_mode(
        options.mode,
        options.run_pattern.as_deref(),
        &cfg.commands,
        cfg.output_limit_bytes,
    )?;
    let filter = cfg.filter.to_filter().for_mode(options.mode);
    Ok(Pipeline::new(tool, filter, marker_scan(options, cfg)))
}

fn marker_scan(options: &Options, cfg: &NexterrConfig) -> Option<MarkerScan> {
    let marker = options
        .marker
        .clone()
        .or_else(|| (options.mode == Mode::Notes).then(|| DEFAULT_MARKER.to_string()))?;
    Some(MarkerScan {
        root: cfg.markers.root.clone(),
        marker,
        extensions: cfg.markers.extensions.clone(),
    })
}

async fn cmd_watch(
    options: &Options,
    cfg: &NexterrConfig,
    pipeline: Pipeline<CommandTool>,
) -> Result<i32> {
    let (watcher, changes) = NotifyWatcher::new(Duration::from_millis(cfg.poll_interval_ms))?;
    let mut engine = Engine::new(
        pipeline,
        options.editor.clone(),
        watcher,
        EngineSettings {
            close_on_no_error: options.close_on_no_error,
        },
    );
    let events = LoopEvents {
        changes,
        steps: options.step_on_enter.then(spawn_stdin_steps),
    };

    let log_on_fix = options.log_on_fix;
    let stop = run_loop(
        &mut engine,
        events,
        Duration::from_secs(cfg.refresh_interval_secs),
        tokio::signal::ctrl_c(),
        |outcome| {
            if log_on_fix && let Some(fixed) = outcome.fixed() {
                println!("fixed {}", fixed.key());
            }
        },
    )
    .await?;
    info!(?stop, "loop stopped");
    Ok(exit_codes::OK)
}

fn cmd_list(pipeline: &Pipeline<CommandTool>, json: bool) -> Result<i32> {
    let set = pipeline.collect()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&set).context("serialize json")?);
    } else {
        for diagnostic in &set {
            println!("{diagnostic}");
        }
    }
    if set.is_empty() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::DIAGNOSTICS)
    }
}

/// Forward one step signal per stdin line.
fn spawn_stdin_steps() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if line.is_err() || tx.blocking_send(()).is_err() {
                break;
            }
        }
    });
    rx
}

//! Headless dispatch runner.
//!
//! This binary runs the engine without any presentation, controlled via JSON
//! on stdin/stdout. Designed for bots, CI testing, and replay verification.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p dispatch_headless
//!
//! # Play a scripted session and print the final state
//! cargo run -p dispatch_headless -- play --script scripts/easy_win.ron
//!
//! # Let a bot play and record the session
//! cargo run -p dispatch_headless -- autoplay --difficulty medium --strategy sweep --record out.ron
//!
//! # Check a replay reproduces
//! cargo run -p dispatch_headless -- verify --script out.ron --runs 5
//!
//! # Check an engine data file
//! cargo run -p dispatch_headless -- validate --config assets/data/engine.ron
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dispatch_core::config::EngineConfig;
use dispatch_core::difficulty::Difficulty;
use dispatch_headless::{
    data_loader::{load_config, load_config_or_default, load_script},
    game_runner::GameRunner,
    protocol::Response,
    runner::{HeadlessConfig, HeadlessRunner},
    strategies::StrategyKind,
};

#[derive(Parser)]
#[command(name = "dispatch_headless")]
#[command(about = "Headless dispatch engine runner for bots and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive session over stdin/stdout
    Run {
        /// Engine data file (built-in data if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output state after every command
        #[arg(long)]
        auto_state: bool,
    },

    /// Play a script and print the final state
    Play {
        /// Script or replay file
        #[arg(short, long)]
        script: PathBuf,

        /// Engine data file (built-in data if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Let a bot strategy play one session
    Autoplay {
        /// easy, medium or hard
        #[arg(short, long, default_value = "easy")]
        difficulty: Difficulty,

        /// Strategy to play with
        #[arg(short, long, value_enum, default_value_t = StrategyKind::Sweep)]
        strategy: StrategyKind,

        /// Save the session as a replay
        #[arg(long)]
        record: Option<PathBuf>,

        /// Engine data file (built-in data if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Verify a replay reproduces across runs
    Verify {
        /// Replay file path
        #[arg(short, long)]
        script: PathBuf,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Engine data file (built-in data if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate an engine data file
    Validate {
        /// Engine data file
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for protocol
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Run { config, auto_state }) => cmd_run(config, auto_state),
        Some(Commands::Play { script, config }) => cmd_play(script, config),
        Some(Commands::Autoplay {
            difficulty,
            strategy,
            record,
            config,
        }) => cmd_autoplay(difficulty, strategy, record, config),
        Some(Commands::Verify {
            script,
            runs,
            config,
        }) => cmd_verify(script, runs, config),
        Some(Commands::Validate { config }) => cmd_validate(config),
        None => cmd_run(None, false),
    }
}

fn engine_config(path: Option<PathBuf>) -> EngineConfig {
    match load_config_or_default(path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load engine config: {e}");
            std::process::exit(1);
        }
    }
}

/// Run an interactive session
fn cmd_run(config: Option<PathBuf>, auto_state: bool) {
    tracing::info!("Starting interactive session");

    let runner = HeadlessRunner::with_config(HeadlessConfig {
        auto_state_output: auto_state,
        engine: engine_config(config),
    });

    if let Err(e) = runner.run() {
        tracing::error!(error = %e, "Session I/O failed");
        std::process::exit(1);
    }
}

/// Play a script to the end and print the final state
fn cmd_play(script: PathBuf, config: Option<PathBuf>) {
    let replay = match load_script(&script) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load script: {e}");
            std::process::exit(1);
        }
    };

    let game = replay.play(engine_config(config));
    let state = Response::State {
        now_ms: game.now_ms(),
        hash: game.state_hash(),
        view: game.view(),
    };
    print!("{}", state.to_json_line());

    if let Some(summary) = game.summary() {
        eprintln!(
            "{:?} in {} with {}/{} units used",
            summary.outcome, summary.elapsed_display, summary.units_used, summary.unit_budget
        );
    } else {
        eprintln!("Session still {} at {}ms", game.phase(), game.now_ms());
    }
}

/// Let a bot play one session
fn cmd_autoplay(
    difficulty: Difficulty,
    strategy: StrategyKind,
    record: Option<PathBuf>,
    config: Option<PathBuf>,
) {
    let runner = GameRunner::new(engine_config(config));
    let result = match runner.autoplay(difficulty, strategy) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("FAIL: {e}");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&result.summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to serialize summary: {e}");
            std::process::exit(1);
        }
    }

    if let Some(path) = record {
        if let Err(e) = result.replay.save(&path) {
            eprintln!("Failed to save replay: {e}");
            std::process::exit(1);
        }
        tracing::info!(
            path = %path.display(),
            commands = result.replay.command_count(),
            "Replay saved"
        );
    }
}

/// Verify a replay reproduces
fn cmd_verify(script: PathBuf, runs: u32, config: Option<PathBuf>) {
    tracing::info!("Verifying replay: {} ({} runs)", script.display(), runs);

    let replay = match load_script(&script) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load replay: {e}");
            std::process::exit(1);
        }
    };

    eprintln!("Loaded replay:");
    eprintln!("  Label: {}", replay.label);
    eprintln!("  Commands: {}", replay.command_count());
    eprintln!("  Duration: {} ms", replay.final_ms);

    let report = GameRunner::new(engine_config(config)).verify_determinism(&replay, runs);
    let actual = report.hashes.first().copied().unwrap_or_default();

    if !report.is_deterministic {
        eprintln!("FAIL: Non-determinism detected!");
        for (run, hash) in report.hashes.iter().enumerate() {
            eprintln!("  Run {run}: {hash:016x}");
        }
        std::process::exit(1);
    }

    match (report.matches_recording, replay.final_hash) {
        (Some(false), Some(expected)) => {
            eprintln!("FAIL: Replay produced different hash!");
            eprintln!("  Expected: {expected:016x}");
            eprintln!("  Actual:   {actual:016x}");
            std::process::exit(1);
        }
        (Some(true), _) => {
            eprintln!("PASS: All {} runs matched the recorded hash {actual:016x}", report.runs);
        }
        _ => {
            eprintln!("PASS: All {} runs produced hash {actual:016x}", report.runs);
        }
    }
}

/// Validate an engine data file
fn cmd_validate(config: PathBuf) {
    match load_config(&config) {
        Ok(engine) => {
            eprintln!("OK: {}", config.display());
            eprintln!("  Base: {}", engine.base_location);
            eprintln!("  Transit: {}s", engine.transit_secs);
            eprintln!("  Clues: {}", engine.clues.len());
            for profile in engine.profiles.iter() {
                eprintln!(
                    "  {}: {} units, {}s",
                    profile.key, profile.unit_budget, profile.time_limit_secs
                );
            }
        }
        Err(e) => {
            eprintln!("INVALID: {e}");
            std::process::exit(1);
        }
    }
}

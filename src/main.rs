//! Flowstate - challenge/skill matching for perception events
//!
//! CLI entry point.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowstate::cli::demo::DemoOptions;
use flowstate::cli::process::ProcessOptions;
use flowstate::cli::session_sink;
use flowstate::config::Config;
use flowstate::error::exit_codes;
use flowstate::{DemoCommand, ProcessCommand};

// =============================================================================
// CLI Definition
// =============================================================================

/// Flowstate - challenge/skill matching for perception events
#[derive(Parser)]
#[command(name = "flowstate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one generated event on a fresh session and print the response
    Demo {
        /// Event domain (game, narrative, dao)
        #[arg(long, default_value = "game")]
        domain: String,
        /// Difficulty placed in the event payload
        #[arg(long, default_value_t = 0.8)]
        difficulty: f64,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Run one session over a JSON Lines stream of events
    Process {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,
        /// Output as JSON Lines
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("flowstate error: {}", e);
            ExitCode::from(exit_codes::FAILURE as u8)
        }
    }
}

/// Install the tracing subscriber.
///
/// Logs go to stderr so stdout stays machine-readable. Filter with
/// `RUST_LOG`; defaults to `flowstate=info`.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowstate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load();

    match cli.command {
        Commands::Demo {
            domain,
            difficulty,
            json,
            quiet,
        } => run_demo(
            config,
            DemoOptions {
                json,
                quiet,
                domain,
                difficulty,
            },
        ),
        Commands::Process { file, json, quiet } => {
            run_process(config, file, ProcessOptions { json, quiet })
        }
    }
}

fn run_demo(config: Config, options: DemoOptions) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let sink = session_sink(&config.event_log);
    let cmd = DemoCommand::new(sink, config);
    let output = cmd.run(&options);

    print!("{}", cmd.format_output(&output, &options));
    if options.json && !options.quiet {
        println!();
    }
    io::stdout().flush()?;

    let code = if output.success {
        exit_codes::SUCCESS
    } else {
        exit_codes::INVALID_INPUT
    };
    Ok(ExitCode::from(code as u8))
}

fn run_process(
    config: Config,
    file: Option<PathBuf>,
    options: ProcessOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let sink = session_sink(&config.event_log);
    let cmd = ProcessCommand::new(sink, config);

    let output = match file {
        Some(path) => {
            let file = File::open(&path)
                .map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
            cmd.run(BufReader::new(file))?
        }
        None => cmd.run(io::stdin().lock())?,
    };

    print!("{}", cmd.format_output(&output, &options));
    io::stdout().flush()?;

    Ok(ExitCode::from(output.exit_code() as u8))
}

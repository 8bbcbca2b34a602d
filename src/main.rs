//! testres - Command-line tool for recording and inspecting test results

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use testresults::commands::*;
use testresults::ui::CliUI;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "testres")]
#[command(about = "Test result store tool", long_about = None)]
struct Cli {
    /// Working directory holding .testres.conf (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    directory: Option<String>,

    /// Results directory, overriding the configuration file
    #[arg(long, global = true, env = "TESTRES_RESULTS_DIR")]
    results_dir: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the result of one test execution
    Record {
        /// Test name as reported by the runner
        name: String,

        /// Runner status (passed, failed, skipped, timedOut, interrupted)
        #[arg(short, long)]
        status: Option<String>,

        /// Duration in milliseconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// When the test started (RFC 3339)
        #[arg(long)]
        started_at: Option<String>,

        /// Error message
        #[arg(long)]
        error: Option<String>,

        /// Stack trace of the error
        #[arg(long)]
        stack_trace: Option<String>,

        #[arg(long)]
        browser: Option<String>,

        #[arg(long = "env")]
        environment: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// File with the raw screenshot image
        #[arg(long, conflicts_with = "screenshot_base64")]
        screenshot: Option<PathBuf>,

        /// File with a base64-encoded screenshot
        #[arg(long)]
        screenshot_base64: Option<PathBuf>,

        /// Free-form JSON test data
        #[arg(long)]
        test_data: Option<String>,

        /// Last known page URL
        #[arg(long)]
        url: Option<String>,
    },

    /// Show a suite's counts and most recent results
    Suite {
        /// Suite name (Authentication, Dashboard, Administration, Validation, General)
        name: String,
    },

    /// List all suites with their counts
    Suites,

    /// Write test-summary.txt with per-suite counts
    Report {
        /// Environment to print in the summary
        #[arg(long = "env")]
        environment: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let location = StoreLocation::new(cli.directory, cli.results_dir);
    let mut ui = CliUI::new();

    let exit_code = match cli.command {
        Commands::Record {
            name,
            status,
            duration,
            started_at,
            error,
            stack_trace,
            browser,
            environment,
            tags,
            screenshot,
            screenshot_base64,
            test_data,
            url,
        } => {
            let args = RecordArgs {
                test_name: name.clone(),
                status,
                duration_ms: duration,
                started_at,
                error,
                stack_trace,
                browser,
                environment,
                tags,
                screenshot,
                screenshot_base64,
                test_data,
                url,
            };
            RecordCommand::new(location, args)
                .execute(&mut ui)
                .with_context(|| format!("recording {:?}", name))?
        }
        Commands::Suite { name } => SuiteCommand::new(location, name).execute(&mut ui)?,
        Commands::Suites => SuitesCommand::new(location).execute(&mut ui)?,
        Commands::Report { environment } => {
            ReportCommand::new(location, environment).execute(&mut ui)?
        }
    };

    Ok(exit_code)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

//! Developer CLI for FlatQL.
//!
//! Compiles condition expressions against a newline-delimited JSON sample
//! file, which stands in for the warehouse sampler.

mod sample;
mod settings;
mod shell;

use clap::{Parser, Subcommand};
use flatql_core::{generate::Generator, obs::metrics_report};
use sample::NdjsonFetcher;
use serde::Serialize;
use settings::ConfigArgs;
use std::{path::PathBuf, process::ExitCode};
use thiserror::Error as ThisError;
use tracing_subscriber::EnvFilter;

///
/// Cli
///

#[derive(Debug, Parser)]
#[command(name = "flatql", version, about = "Compile field expressions into lateral-flatten queries")]
struct Cli {
    /// Source (table) name.
    #[arg(short, long, env = "FLATQL_SOURCE")]
    source: String,

    /// Column holding the JSON documents.
    #[arg(short, long, env = "FLATQL_COLUMN")]
    column: String,

    /// Newline-delimited JSON file sampled as the column's contents.
    #[arg(long, env = "FLATQL_SAMPLE")]
    sample: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,

    /// Print generator metrics to stderr on exit.
    #[arg(long, env = "FLATQL_METRICS")]
    metrics: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

///
/// Command
///

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile one condition expression.
    Compile {
        /// Expression such as `height[IN:10|30,CAST:INTEGER],product_id[=:P200]`.
        conditions: String,
    },

    /// Print the inferred schema as JSON.
    Describe,

    /// Read expressions interactively.
    Shell,
}

///
/// CliError
///

#[derive(Debug, ThisError)]
pub(crate) enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("{}", .0.to_comment())]
    Generate(#[from] flatql_core::error::Error),
}

///
/// SchemaReport
///

#[derive(Serialize)]
struct SchemaReport<'a> {
    source: &'a str,
    column: &'a str,
    paths: usize,
    schema: &'a flatql_core::schema::Schema,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = run(&cli);
    if cli.metrics {
        match serde_json::to_string_pretty(&metrics_report()) {
            Ok(report) => eprintln!("{report}"),
            Err(err) => tracing::warn!(error = %err, "failed to render metrics"),
        }
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Generate(err)) => {
            println!("{}", err.to_comment());
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("flatql: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = cli.config.resolve()?;
    tracing::debug!(?config, "resolved generator config");

    let fetcher = NdjsonFetcher::new(&cli.sample);
    let generator = Generator::new(config);

    match &cli.command {
        Command::Compile { conditions } => {
            let sql = generator.try_generate(&cli.source, &cli.column, conditions, &fetcher)?;
            println!("{sql}");
        }

        Command::Describe => {
            let schema = generator.describe(&cli.source, &cli.column, &fetcher)?;
            let report = SchemaReport {
                source: &cli.source,
                column: &cli.column,
                paths: schema.len(),
                schema: &schema,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Shell => shell::run(&generator, &cli.source, &cli.column, &fetcher)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

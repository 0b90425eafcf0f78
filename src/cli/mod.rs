//! Command-line interface for lineproc
//!
//! With no arguments the tool reads `data.txt` from the working directory,
//! uppercases every line in parallel and prints `Lines processed: <count>`.
//! Flags override the layered configuration for a single run.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

mod output;

pub use output::Output;

use crate::config::{LineprocConfig, OutputFormat};
use crate::transform::{LineTransformer, Report, Strategy, TimeoutPolicy};

/// lineproc - uppercase every line of a file in parallel
#[derive(Parser, Debug)]
#[command(
    name = "lineproc",
    author,
    version,
    about = "Uppercase every line of a text file in parallel and report the line count",
    long_about = None
)]
pub struct Cli {
    /// Input file (default: data.txt)
    #[arg(value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Concurrency strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Maximum worker threads (0 = all cores)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Bounded wait for the pooled strategy, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// What to do when the bounded wait expires
    #[arg(long, value_enum)]
    pub on_timeout: Option<TimeoutPolicy>,

    /// Print the transformed lines before the count
    #[arg(short, long)]
    pub print_lines: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Use custom configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Flags that were actually given, shaped like the config file
#[derive(Serialize, Default, Debug)]
struct CliOverrides {
    input: InputOverrides,
    processing: ProcessingOverrides,
    output: OutputOverrides,
}

#[derive(Serialize, Default, Debug)]
struct InputOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
}

#[derive(Serialize, Default, Debug)]
struct ProcessingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy: Option<Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    on_timeout: Option<TimeoutPolicy>,
}

#[derive(Serialize, Default, Debug)]
struct OutputOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    print_lines: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<OutputFormat>,
}

/// JSON summary of a run
#[derive(Serialize, Debug)]
struct RunSummary<'a> {
    lines_processed: usize,
    lines_read: usize,
    strategy: Strategy,
    workers: usize,
    cancelled: usize,
    elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    lines: Option<&'a [String]>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            input: InputOverrides {
                path: self.input.clone(),
            },
            processing: ProcessingOverrides {
                strategy: self.strategy,
                max_threads: self.threads,
                timeout_secs: self.timeout,
                on_timeout: self.on_timeout,
            },
            output: OutputOverrides {
                print_lines: self.print_lines.then_some(true),
                format: self.format,
            },
        }
    }

    /// Output handler matching the global verbosity flags
    pub fn output(&self) -> Output {
        Output::new(self.verbose > 0, self.quiet)
    }

    /// Execute the run
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);
        let output = self.output();

        let config = LineprocConfig::load(self.config.as_deref(), Some(self.overrides()))?;

        if self.show_config {
            output.result(config.to_toml()?.trim_end());
            return Ok(());
        }

        output.verbose(&format!("Processing {}", config.input.path.display()));

        let transformer = LineTransformer::new(config.processing.transform_options());
        let report = transformer.process(&config.input.path)?;

        if let Some(warning) = cancellation_warning(&report, config.processing.timeout_secs) {
            output.warning(&warning);
        }

        print_report(&report, &config, &output)
    }
}

/// Warning for a partial report; `None` when every line completed
fn cancellation_warning(report: &Report, timeout_secs: u64) -> Option<String> {
    (report.cancelled > 0).then(|| {
        format!(
            "{} of {} lines were cancelled after the {}s timeout",
            report.cancelled, report.lines_read, timeout_secs
        )
    })
}

fn print_report(report: &Report, config: &LineprocConfig, output: &Output) -> Result<()> {
    output.verbose_key_value("strategy", &format!("{:?}", report.strategy).to_lowercase());
    output.verbose_key_value("workers", &report.workers.to_string());
    output.verbose_key_value(
        "elapsed",
        &format!("{:.2}ms", report.elapsed.as_secs_f64() * 1000.0),
    );

    match config.output.format {
        OutputFormat::Text => {
            if config.output.print_lines {
                for line in report.lines.as_slice() {
                    output.result(line);
                }
            }
            output.result(&format!("Lines processed: {}", report.count()));
        }
        OutputFormat::Json => {
            let summary = RunSummary {
                lines_processed: report.count(),
                lines_read: report.lines_read,
                strategy: report.strategy,
                workers: report.workers,
                cancelled: report.cancelled,
                elapsed_ms: report.elapsed.as_millis() as u64,
                lines: config
                    .output
                    .print_lines
                    .then(|| report.lines.as_slice()),
            };
            output.result(&serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("lineproc=info"),
            2 => tracing_subscriber::EnvFilter::new("lineproc=debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // Logs share stderr with diagnostics; stdout carries only the result
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

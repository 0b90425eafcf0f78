//! Configuration management for lineproc
//!
//! Settings are layered with figment: embedded defaults, `./lineproc.toml`,
//! an explicit `--config` file, `LINEPROC_*` environment variables and
//! finally command-line flags.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::transform::{Strategy, TimeoutPolicy, TransformOptions};

mod core;

pub use self::core::{ENV_PREFIX, MAX_CHANNEL_BUFFER_MULTIPLIER, REPO_CONFIG_FILE};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LineprocConfig {
    pub input: InputConfig,
    pub processing: ProcessingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// File to read, relative to the working directory
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub strategy: Strategy,

    /// Maximum number of worker threads (0 = no limit)
    pub max_threads: usize,

    /// Percentage of CPU cores to use (1-100)
    pub thread_percentage: u8,

    /// Bounded wait for the pooled strategy, in seconds
    pub timeout_secs: u64,

    pub on_timeout: TimeoutPolicy,

    pub min_lines_for_parallel: usize,

    /// Channel buffer size multiplier (buffer = workers * multiplier)
    pub channel_buffer_multiplier: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Print every transformed line before the count
    pub print_lines: bool,

    pub format: OutputFormat,
}

/// Output format for the run summary
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `Lines processed: <count>`
    #[default]
    Text,
    /// Single JSON document with the count and run details
    Json,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data.txt"),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Ordered,
            max_threads: 0,
            thread_percentage: 100,
            timeout_secs: 60,
            on_timeout: TimeoutPolicy::Fail,
            min_lines_for_parallel: 64,
            channel_buffer_multiplier: 2,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            print_lines: false,
            format: OutputFormat::Text,
        }
    }
}

impl ProcessingConfig {
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            strategy: self.strategy,
            max_threads: self.max_threads,
            thread_percentage: self.thread_percentage,
            timeout: Duration::from_secs(self.timeout_secs),
            on_timeout: self.on_timeout,
            min_lines_for_parallel: self.min_lines_for_parallel,
            channel_buffer_multiplier: self.channel_buffer_multiplier,
        }
    }
}

//! # lineproc - parallel line transformation
//!
//! Reads a UTF-8 text file line by line, uppercases every line using the
//! machine's available parallelism and reports how many lines were processed.
//!
//! ## Strategies
//!
//! - **ordered** (default): load all lines, then a rayon data-parallel map.
//!   Output order matches input order. No timeout.
//! - **pooled**: a crossbeam worker pool fed while the file is read. Results
//!   are collected in completion order and the wait for the workers is
//!   bounded by a timeout.
//!
//! ## Quick Start
//!
//! ```bash
//! # Reads ./data.txt
//! lineproc
//! Lines processed: 3
//!
//! lineproc notes.txt --strategy pooled --timeout 5 --print-lines
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use lineproc::transform::{LineTransformer, Strategy, TransformOptions};
//!
//! let options = TransformOptions {
//!     strategy: Strategy::Pooled,
//!     ..TransformOptions::default()
//! };
//! let report = LineTransformer::new(options).process("data.txt")?;
//! println!("Lines processed: {}", report.count());
//! # Ok::<(), lineproc::ProcessError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod parallel;
pub mod transform;

pub use cli::{Cli, Output};
pub use config::LineprocConfig;
pub use error::ProcessError;
pub use transform::{LineTransformer, Report, process};

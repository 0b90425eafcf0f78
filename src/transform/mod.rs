//! Parallel line transformation
//!
//! Reads a UTF-8 text file line by line, uppercases every line on a pool of
//! workers and reports how many lines were processed. Two strategies are
//! available and each run uses exactly one of them:
//!
//! - [`Strategy::Ordered`] (default): all lines are loaded, then mapped with a
//!   rayon data-parallel map. The output keeps the input order. No timeout.
//! - [`Strategy::Pooled`]: lines are submitted to a crossbeam worker pool while
//!   the file is being read. Results land in a lock-free queue in completion
//!   order, and the wait for the workers is bounded by a timeout.

pub mod reader;

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{ProcessError, Result};
use crate::parallel::{ExecutionStrategy, PoolError, TaskPool};

pub use reader::{LineReader, read_lines};

/// The per-line transformation
pub fn to_upper(line: &str) -> String {
    line.to_uppercase()
}

/// Concurrency strategy for a run
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Load everything, then data-parallel map preserving input order
    #[default]
    Ordered,
    /// Worker pool fed while reading; unordered results, bounded wait
    Pooled,
}

/// What the pooled strategy does when its bounded wait expires
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Abort the run with [`ProcessError::WaitTimedOut`]
    #[default]
    Fail,
    /// Report the lines transformed before the deadline
    Partial,
}

#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub strategy: Strategy,
    /// Maximum worker threads (0 = no limit)
    pub max_threads: usize,
    /// Share of available cores to use (1-100)
    pub thread_percentage: u8,
    pub timeout: Duration,
    pub on_timeout: TimeoutPolicy,
    /// Below this many lines the ordered strategy stays on the calling thread
    pub min_lines_for_parallel: usize,
    /// Pool channel capacity = workers * multiplier
    pub channel_buffer_multiplier: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Ordered,
            max_threads: 0,
            thread_percentage: 100,
            timeout: Duration::from_secs(60),
            on_timeout: TimeoutPolicy::Fail,
            min_lines_for_parallel: 64,
            channel_buffer_multiplier: 2,
        }
    }
}

/// Transformed lines, tagged with the ordering guarantee they carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "order", content = "lines", rename_all = "lowercase")]
pub enum TransformedLines {
    /// Position `i` holds the transform of input line `i`
    Ordered(Vec<String>),
    /// Same multiset as the input, in completion order
    Unordered(Vec<String>),
}

impl TransformedLines {
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, TransformedLines::Ordered(_))
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            TransformedLines::Ordered(lines) | TransformedLines::Unordered(lines) => lines,
        }
    }

    /// Lines in sorted order, for multiset comparisons
    pub fn sorted(&self) -> Vec<String> {
        let mut lines = self.as_slice().to_vec();
        lines.sort();
        lines
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Lines read from the input
    pub lines_read: usize,
    pub lines: TransformedLines,
    pub strategy: Strategy,
    pub workers: usize,
    /// Lines dropped when the bounded wait expired under [`TimeoutPolicy::Partial`]
    pub cancelled: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl Report {
    /// Number of transformed lines; equals `lines_read` unless work was cancelled
    pub fn count(&self) -> usize {
        self.lines.len()
    }
}

/// Reads a file and transforms its lines with the configured strategy
pub struct LineTransformer {
    options: TransformOptions,
    transform: fn(&str) -> String,
}

impl LineTransformer {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            options,
            transform: to_upper,
        }
    }

    /// Replace the per-line transformation
    pub fn with_transform(mut self, transform: fn(&str) -> String) -> Self {
        self.transform = transform;
        self
    }

    /// Transform every line of `path`.
    ///
    /// Every worker thread has been joined by the time this returns, on the
    /// success path and on every error path.
    pub fn process(&self, path: impl AsRef<Path>) -> Result<Report> {
        let path = path.as_ref();
        let start = Instant::now();

        let optimal_workers = ExecutionStrategy::calculate_optimal_workers(
            self.options.max_threads,
            self.options.thread_percentage,
        );
        tracing::debug!(
            path = %path.display(),
            strategy = ?self.options.strategy,
            optimal_workers,
            "processing file"
        );

        let mut report = match self.options.strategy {
            Strategy::Ordered => self.process_ordered(path, optimal_workers)?,
            Strategy::Pooled => self.process_pooled(path, optimal_workers)?,
        };
        report.elapsed = start.elapsed();

        tracing::info!(
            lines = report.count(),
            workers = report.workers,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "processing completed"
        );
        Ok(report)
    }

    fn process_ordered(&self, path: &Path, optimal_workers: usize) -> Result<Report> {
        let lines = read_lines(path)?;

        let execution = ExecutionStrategy::auto(
            lines.len(),
            self.options.min_lines_for_parallel,
            optimal_workers,
        );
        tracing::debug!(lines = lines.len(), execution = ?execution, "ordered map");

        // rayon resumes a worker panic on this thread; report it like the pool does
        let transform = self.transform;
        let transformed = panic::catch_unwind(AssertUnwindSafe(|| {
            execution.execute(&lines, |line| transform(line))
        }))
        .map_err(|_| ProcessError::WorkerPanicked)??;

        Ok(Report {
            lines_read: lines.len(),
            lines: TransformedLines::Ordered(transformed),
            strategy: Strategy::Ordered,
            workers: execution.workers(),
            cancelled: 0,
            elapsed: Duration::ZERO,
        })
    }

    fn process_pooled(&self, path: &Path, optimal_workers: usize) -> Result<Report> {
        let reader = LineReader::open(path)?;
        let pool = TaskPool::new(optimal_workers, self.options.timeout)
            .with_buffer_multiplier(self.options.channel_buffer_multiplier);

        let transform = self.transform;
        let outcome = pool
            .run(reader, |line: String| transform(&line))
            .map_err(|e| match e {
                PoolError::Source(e) => e,
                PoolError::WorkerPanicked => ProcessError::WorkerPanicked,
            })?;

        if outcome.timed_out {
            match self.options.on_timeout {
                TimeoutPolicy::Fail => {
                    return Err(ProcessError::WaitTimedOut {
                        timeout: self.options.timeout,
                        completed: outcome.results.len(),
                        submitted: outcome.submitted,
                    });
                }
                TimeoutPolicy::Partial => {
                    tracing::warn!(
                        completed = outcome.results.len(),
                        cancelled = outcome.discarded,
                        "reporting partial results"
                    );
                }
            }
        }

        Ok(Report {
            lines_read: outcome.submitted,
            lines: TransformedLines::Unordered(outcome.results),
            strategy: Strategy::Pooled,
            workers: outcome.workers,
            cancelled: outcome.discarded,
            elapsed: Duration::ZERO,
        })
    }
}

/// Transform `path` with default options (ordered strategy, all cores)
pub fn process(path: impl AsRef<Path>) -> Result<Report> {
    LineTransformer::new(TransformOptions::default()).process(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_input(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("data.txt");
        fs::write(&path, content).unwrap();
        path
    }

    fn options(strategy: Strategy) -> TransformOptions {
        TransformOptions {
            strategy,
            // Force the parallel path even for tiny inputs
            min_lines_for_parallel: 0,
            ..TransformOptions::default()
        }
    }

    fn slow_upper(line: &str) -> String {
        std::thread::sleep(Duration::from_millis(200));
        line.to_uppercase()
    }

    #[test]
    fn test_ordered_scenario() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "hello\nWorld\n3\n");

        let report = LineTransformer::new(options(Strategy::Ordered))
            .process(&path)
            .unwrap();

        assert_eq!(report.count(), 3);
        assert_eq!(report.lines_read, 3);
        assert!(report.lines.is_ordered());
        assert_eq!(report.lines.as_slice(), ["HELLO", "WORLD", "3"]);
        assert_eq!(report.strategy, Strategy::Ordered);
    }

    #[test]
    fn test_pooled_scenario() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "hello\nWorld\n3\n");

        let report = LineTransformer::new(options(Strategy::Pooled))
            .process(&path)
            .unwrap();

        assert_eq!(report.count(), 3);
        assert!(!report.lines.is_ordered());
        assert_eq!(report.lines.sorted(), vec!["3", "HELLO", "WORLD"]);
        assert_eq!(report.cancelled, 0);
    }

    #[test]
    fn test_large_input_every_line_once() {
        let dir = TempDir::new().unwrap();
        let input: Vec<String> = (0..5_000).map(|i| format!("line {i} ß")).collect();
        let path = write_input(&dir, &input.join("\n"));

        let mut expected: Vec<String> = input.iter().map(|l| l.to_uppercase()).collect();

        let ordered = LineTransformer::new(options(Strategy::Ordered))
            .process(&path)
            .unwrap();
        assert_eq!(ordered.lines.as_slice(), expected.as_slice());

        let pooled = LineTransformer::new(options(Strategy::Pooled))
            .process(&path)
            .unwrap();
        expected.sort();
        assert_eq!(pooled.count(), 5_000);
        assert_eq!(pooled.lines.sorted(), expected);
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "");

        for strategy in [Strategy::Ordered, Strategy::Pooled] {
            let report = LineTransformer::new(options(strategy)).process(&path).unwrap();
            assert_eq!(report.count(), 0);
            assert!(report.lines.is_empty());
        }
    }

    #[test]
    fn test_blank_lines_are_counted() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "\n\n\n\n");

        for strategy in [Strategy::Ordered, Strategy::Pooled] {
            let report = LineTransformer::new(options(strategy)).process(&path).unwrap();
            assert_eq!(report.count(), 4);
            assert!(report.lines.as_slice().iter().all(String::is_empty));
        }
    }

    #[test]
    fn test_runs_are_repeatable() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "a\nb\nc\nd\ne\n");

        let transformer = LineTransformer::new(options(Strategy::Pooled));
        let first = transformer.process(&path).unwrap();
        let second = transformer.process(&path).unwrap();

        assert_eq!(first.count(), second.count());
        assert_eq!(first.lines.sorted(), second.lines.sorted());
    }

    #[test]
    fn test_small_input_uses_sequential_fallback() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "x\ny\n");

        let report = LineTransformer::new(TransformOptions::default())
            .process(&path)
            .unwrap();
        assert_eq!(report.workers, 1);
        assert_eq!(report.lines.as_slice(), ["X", "Y"]);
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.txt");

        for strategy in [Strategy::Ordered, Strategy::Pooled] {
            let err = LineTransformer::new(options(strategy))
                .process(&path)
                .unwrap_err();
            assert!(matches!(err, ProcessError::FileNotFound { .. }));
            assert!(err.to_string().contains("data.txt"));
        }
    }

    #[test]
    fn test_read_error_mid_stream_aborts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.txt");
        fs::write(&path, b"ok\n\xff\nafter\n").unwrap();

        for strategy in [Strategy::Ordered, Strategy::Pooled] {
            let err = LineTransformer::new(options(strategy))
                .process(&path)
                .unwrap_err();
            assert!(matches!(err, ProcessError::Io { .. }));
        }
    }

    #[test]
    fn test_pooled_timeout_fails_by_default() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "a\nb\nc\nd\ne\nf\n");

        let options = TransformOptions {
            strategy: Strategy::Pooled,
            max_threads: 1,
            timeout: Duration::from_millis(10),
            channel_buffer_multiplier: 16,
            ..TransformOptions::default()
        };
        let err = LineTransformer::new(options)
            .with_transform(slow_upper)
            .process(&path)
            .unwrap_err();

        match err {
            ProcessError::WaitTimedOut { completed, submitted, .. } => {
                assert_eq!(submitted, 6);
                assert!(completed < 6);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_pooled_timeout_partial_report() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "a\nb\nc\nd\ne\nf\n");

        let options = TransformOptions {
            strategy: Strategy::Pooled,
            max_threads: 1,
            timeout: Duration::from_millis(10),
            on_timeout: TimeoutPolicy::Partial,
            channel_buffer_multiplier: 16,
            ..TransformOptions::default()
        };
        let report = LineTransformer::new(options)
            .with_transform(slow_upper)
            .process(&path)
            .unwrap();

        assert_eq!(report.lines_read, 6);
        assert!(report.cancelled > 0);
        assert_eq!(report.count() + report.cancelled, report.lines_read);
    }

    fn upper_or_panic(line: &str) -> String {
        if line == "bad" {
            panic!("transform failed on {line}");
        }
        line.to_uppercase()
    }

    #[test]
    fn test_transform_panic_is_reported_by_both_strategies() {
        let dir = TempDir::new().unwrap();
        let path = write_input(&dir, "one\nbad\nthree\nfour\n");

        for strategy in [Strategy::Ordered, Strategy::Pooled] {
            let result = LineTransformer::new(options(strategy))
                .with_transform(upper_or_panic)
                .process(&path);
            assert!(
                matches!(result, Err(ProcessError::WorkerPanicked)),
                "{strategy:?}: {result:?}"
            );
        }
    }

    #[test]
    fn test_report_serializes_with_order_tag() {
        let report = Report {
            lines_read: 1,
            lines: TransformedLines::Ordered(vec!["A".to_string()]),
            strategy: Strategy::Ordered,
            workers: 1,
            cancelled: 0,
            elapsed: Duration::ZERO,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["lines"]["order"], "ordered");
        assert_eq!(json["lines"]["lines"][0], "A");
        assert_eq!(json["strategy"], "ordered");
    }
}

//! Generic parallel execution framework
//!
//! This module owns **system resource management** and **execution strategy**.
//! It knows nothing about lines or files; callers hand it work items and a
//! pure function to apply.
//!
//! ## What This Module Does:
//! - **Resource Discovery**: Detects available CPU cores using `num_cpus::get()`
//! - **Resource Calculation**: Applies thread percentage and max threads to available cores
//! - **Ordered Execution**: rayon data-parallel map that preserves input order
//! - **Pooled Execution**: crossbeam worker pool with a bounded wait and cancellation
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │   Client        │    │   Parallel       │    │   System        │
//! │  (Transformer)  │───▶│   Module         │───▶│   Resources     │
//! │                 │    │                  │    │                 │
//! │ • Line reading  │    │ • CPU cores      │    │ • Hardware      │
//! │ • Domain errors │    │ • Thread mgmt    │    │ • OS threads    │
//! │ • Reporting     │    │ • Bounded wait   │    │                 │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use lineproc::parallel::{ExecutionStrategy, TaskPool};
//! use std::convert::Infallible;
//! use std::time::Duration;
//!
//! let workers = ExecutionStrategy::calculate_optimal_workers(0, 100);
//!
//! // Ordered: output matches input positions
//! let lines: &[&str] = &["a", "b", "c"];
//! let strategy = ExecutionStrategy::auto(lines.len(), 2, workers);
//! let upper = strategy.execute(lines, |s| s.to_uppercase()).unwrap();
//! assert_eq!(upper, vec!["A", "B", "C"]);
//!
//! // Pooled: results arrive in completion order
//! let pool = TaskPool::new(workers, Duration::from_secs(60));
//! let items = ["a", "b", "c"].into_iter().map(Ok::<_, Infallible>);
//! let outcome = pool.run(items, |s: &str| s.to_uppercase()).unwrap();
//! assert_eq!(outcome.results.len(), 3);
//! ```

pub mod core;
pub mod pool;

pub use self::core::{ExecutionStrategy, OrderedExecutor, SequentialExecutor};
pub use pool::{PoolError, PoolOutcome, TaskPool};

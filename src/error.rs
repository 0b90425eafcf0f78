use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures of a single `process` run.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("input file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "timed out after {}s waiting for workers ({completed}/{submitted} lines transformed)",
        timeout.as_secs_f64()
    )]
    WaitTimedOut {
        timeout: Duration,
        completed: usize,
        submitted: usize,
    },

    #[error("a worker thread panicked during parallel processing")]
    WorkerPanicked,

    #[error("failed to start the worker pool")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

impl ProcessError {
    /// Classify an I/O error raised while opening or reading `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ProcessError::FileNotFound { path }
        } else {
            ProcessError::Io { path, source }
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessError>;

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::error::{ProcessError, Result};

/// Sequential line source over a single owned file handle.
///
/// Yields lines with their `\n` / `\r\n` terminator removed. The handle is
/// closed when the reader is dropped, whether or not it was exhausted.
pub struct LineReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
}

impl LineReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| ProcessError::from_io(&path, e))?;
        tracing::trace!(path = %path.display(), "opened input file");

        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
        })
    }
}

impl Iterator for LineReader {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines
            .next()
            .map(|line| line.map_err(|e| ProcessError::from_io(&self.path, e)))
    }
}

/// Read every line of `path` into memory.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    LineReader::open(path)?.collect()
}

//! Error taxonomy shared by every pipeline stage.
//!
//! Four kinds only, matching the design's error taxonomy: option errors are
//! left to `clap` at the binary layer and are not represented here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicclError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("format error in {path} at line {line}: {detail}")]
    Format {
        path: PathBuf,
        line: usize,
        detail: String,
    },

    #[error("too many format errors in {path} ({count} seen, aborting)")]
    TooManyFormatErrors { path: PathBuf, count: usize },

    #[error("logic error: {0}")]
    Logic(String),
}

impl TicclError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TicclError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(path: impl Into<PathBuf>, line: usize, detail: impl Into<String>) -> Self {
        TicclError::Format {
            path: path.into(),
            line,
            detail: detail.into(),
        }
    }

    pub fn logic(detail: impl Into<String>) -> Self {
        TicclError::Logic(detail.into())
    }
}

pub type Result<T> = std::result::Result<T, TicclError>;

/// Accumulates format errors for a single input file. The design calls for
/// logging the first 10 and then aborting the stage; this sink encodes that
/// policy so every stage applies it identically.
pub struct FormatErrorSink {
    path: PathBuf,
    limit: usize,
    seen: Vec<(usize, String)>,
}

impl FormatErrorSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_limit(path, 10)
    }

    pub fn with_limit(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
            seen: Vec::new(),
        }
    }

    /// Records a malformed line. Returns `Err` once the configured limit is
    /// exceeded, signalling the caller to abort the stage.
    pub fn record(&mut self, line: usize, detail: impl Into<String>) -> Result<()> {
        let detail = detail.into();
        tracing::warn!(path = %self.path.display(), line, %detail, "malformed line");
        self.seen.push((line, detail));
        if self.seen.len() > self.limit {
            return Err(TicclError::TooManyFormatErrors {
                path: self.path.clone(),
                count: self.seen.len(),
            });
        }
        Ok(())
    }

    pub fn errors(&self) -> &[(usize, String)] {
        &self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_aborts_after_limit() {
        let mut sink = FormatErrorSink::with_limit("x.txt", 2);
        assert!(sink.record(1, "bad").is_ok());
        assert!(sink.record(2, "bad").is_ok());
        assert!(sink.record(3, "bad").is_err());
    }
}

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures raised while reading or deriving counters.
///
/// These never leave the `system` module as faults: every caller above the
/// leaf readers converts them to a documented default and logs at `debug`.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot read {}: {source}", path.display())]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed line in {}: {detail}", path.display())]
    MalformedLine { path: PathBuf, detail: String },

    #[error("denominator `{0}` is zero")]
    DivideByZero(&'static str),
}

impl SourceError {
    pub fn unavailable(path: &Path, source: std::io::Error) -> Self {
        SourceError::FileUnavailable {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn malformed(path: &Path, detail: impl Into<String>) -> Self {
        SourceError::MalformedLine {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }

    /// True when the backing file is gone or unreadable, as opposed to present
    /// but unparseable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SourceError::FileUnavailable { .. })
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

//! Error type shared by both converters.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that halt a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("root directory not found: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("{} is not under the root directory {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("cannot decode {} as {encoding}", path.display())]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}

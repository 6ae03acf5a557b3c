use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures a conversion run can end with
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Missing or invalid settings
    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The scan produced no targets
    #[error("no matching files found under {}", .0.display())]
    EmptyResult(PathBuf),

    /// The engine ran and reported failure; `message` is its own output
    #[error("conversion of {} failed: {message}", source_path.display())]
    Engine { source_path: PathBuf, message: String },

    #[error("conversion of {} timed out after {secs}s, engine process was killed", source_path.display())]
    Timeout { source_path: PathBuf, secs: u64 },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("directory walk failed: {0}")]
    Scan(#[from] walkdir::Error),
}

impl ConvertError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        ConvertError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

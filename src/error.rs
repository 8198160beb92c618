use std::path::PathBuf;

use thiserror::Error;

/// User-input failures that abort a run.
///
/// Remote lookups never produce one of these; they degrade to "no data".
#[derive(Debug, Error)]
pub enum Error {
    #[error("Gemfile.lock not found: {}", .0.display())]
    LockfileNotFound(PathBuf),

    #[error("Failed to parse {}: line {line}: {message}", .path.display())]
    LockfileParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse configuration {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

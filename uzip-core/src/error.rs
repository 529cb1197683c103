use std::io::Error as IoError;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Missing or malformed command input.
    #[error("{0}")]
    Argument(String),
    #[error("Invalid split size '{0}'. Use formats like: 500m, 2g, 100k")]
    InvalidSplitSize(String),
    #[error("{what} not found: {}", .path.display())]
    PathNotFound { what: &'static str, path: PathBuf },

    #[error("7-Zip not found: {}", .0.display())]
    EngineNotFound(PathBuf),
    #[error("Failed to launch 7-Zip: {0}")]
    EngineLaunchFailed(#[source] IoError),
    #[error("7-Zip failed ({})", describe_exit(.code))]
    EngineExecutionFailed { code: Option<i32> },

    #[error("index.json not found: {}", .0.display())]
    ManifestNotFound(PathBuf),
    #[error("index.json is corrupt: {}", .path.display())]
    ManifestCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("No parts found in {}", .0.display())]
    ManifestEmpty(PathBuf),
    #[error("No split parts were created in {}", .0.display())]
    NoPartsProduced(PathBuf),
    #[error("First archive part not found: {}", .0.display())]
    FirstPartMissing(PathBuf),
    #[error("index.json lists a part outside its folder: {0:?}")]
    UnsafePartName(String),

    #[error("Failed to delete {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

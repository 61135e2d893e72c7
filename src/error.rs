use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Failure of a single pipeline step.
///
/// Every variant renders to a human-readable cause; the pipeline turns it
/// into the message of a failed [`crate::pipeline::Outcome`].
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to terminate the process: {name} ({reason})")]
    ProcessTermination { name: String, reason: String },

    #[error("download of {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("download of {url} failed with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("{action} {}: {source}", path.display())]
    FileSystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to extract archive: {0}")]
    ArchiveExtraction(String),

    #[error("no files or folders found in the extracted contents")]
    EmptyArchive,

    #[error("failed to create shortcut {}: {reason}", path.display())]
    ShortcutCreation { path: PathBuf, reason: String },

    #[error("another install or uninstall is already running")]
    Busy,
}

impl InstallError {
    pub fn fs(action: &'static str, path: &Path, source: io::Error) -> Self {
        InstallError::FileSystem {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn network(
        url: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        InstallError::Network {
            url: url.to_string(),
            source: source.into(),
        }
    }
}

impl From<zip::result::ZipError> for InstallError {
    fn from(err: zip::result::ZipError) -> Self {
        InstallError::ArchiveExtraction(err.to_string())
    }
}

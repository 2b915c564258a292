/*!
Error types for the gzsync core engine.
*/

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type used throughout the gzsync core.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while synchronizing compressed artifacts.
///
/// Apart from `Validation`, none of these ever abort a run: the engine catches
/// them at the directory or file they concern and logs them.
#[derive(Error, Debug)]
pub enum SyncError {
    /// I/O errors not tied to a specific stage
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A directory could not be listed
    #[error("Error scanning folder: {}: {source}", .path.display())]
    ReadDir { path: PathBuf, source: io::Error },

    /// The metadata of a candidate source file could not be read
    #[error("Error processing file: {}: {source}", .path.display())]
    SourceMetadata { path: PathBuf, source: io::Error },

    /// The read/compress/write pipeline failed for a source file
    #[error("Error compressing file: {}: {source}", .path.display())]
    Compression { path: PathBuf, source: io::Error },

    /// Invalid configuration
    #[error("Validation error: {0}")]
    Validation(String),
}

impl SyncError {
    /// Create a new directory listing error
    pub fn read_dir<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        Self::ReadDir {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a new source metadata error
    pub fn source_metadata<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        Self::SourceMetadata {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a new compression error
    pub fn compression<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        Self::Compression {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// The path this error is attributed to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::ReadDir { path, .. }
            | Self::SourceMetadata { path, .. }
            | Self::Compression { path, .. } => Some(path),
            Self::Io(_) | Self::Validation(_) => None,
        }
    }
}

//! Error types for playback position tracking

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No media is loaded, or it has not reported its duration yet
    #[error("No media loaded")]
    NoMedia,

    /// Seek target is not a finite, non-negative number of seconds
    #[error("Invalid seek position: {0}")]
    InvalidSeek(f64),

    /// The underlying player refused the command
    #[error("Player error: {0}")]
    Player(String),

    /// Path has no file name to import under
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Only MP3 files can be imported
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A file with the same name is already in the library
    #[error("Already imported: {}", .0.display())]
    AlreadyImported(std::path::PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

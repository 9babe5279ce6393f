//! Common error types used throughout reelforge.

use std::path::PathBuf;

/// Common error type for reelforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input file does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The file extension does not map to a supported media kind.
    #[error("unsupported media file: {}", path.display())]
    UnsupportedMedia { path: PathBuf },

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new FileNotFound error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new UnsupportedMedia error.
    pub fn unsupported_media(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedMedia { path: path.into() }
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::file_not_found("/tmp/missing.mp4");
        assert_eq!(err.to_string(), "file not found: /tmp/missing.mp4");

        let err = Error::unsupported_media("notes.txt");
        assert_eq!(err.to_string(), "unsupported media file: notes.txt");

        let err = Error::invalid_input("bad format");
        assert_eq!(err.to_string(), "Invalid input: bad format");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }
}

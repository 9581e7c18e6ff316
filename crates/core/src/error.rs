//! Error types for sftpblob-core
//!
//! Provides a unified error type whose variants classify into the small set of
//! kinds that generic object-storage callers branch on.

use thiserror::Error;

/// Result type alias for sftpblob-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sftpblob-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Key or path does not exist, or exists as the wrong kind
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store is in a state that does not allow the operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Key cannot be mapped onto the remote tree
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Feature not supported by this backend
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Write was cancelled before the writer was closed
    #[error("Write cancelled: {0}")]
    Cancelled(String),

    /// Failure reported by the remote session
    #[error("Remote error: {0}")]
    Remote(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    InvalidArgument,
    Unsupported,
    Cancelled,
    Unknown,
}

impl Error {
    /// Normalize an IO error raised while operating on `path`.
    ///
    /// "Does not exist" becomes [`Error::NotFound`], as does a file standing
    /// where a directory was expected. A non-empty directory becomes
    /// [`Error::InvalidState`]; everything else is kept as-is.
    pub fn from_io(err: std::io::Error, path: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => {
                Error::NotFound(path.to_string())
            }
            std::io::ErrorKind::DirectoryNotEmpty => {
                Error::InvalidState(format!("directory not empty: {path}"))
            }
            _ => Error::Io(err),
        }
    }

    /// Get the kind of this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::InvalidKey(_) => ErrorKind::InvalidArgument,
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::Cancelled(_) => ErrorKind::Cancelled,
            _ => ErrorKind::Unknown,
        }
    }

    /// Shorthand for `self.kind() == ErrorKind::NotFound`
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

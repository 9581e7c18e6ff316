//! RemoteFs trait definition
//!
//! The connected remote-filesystem handle a bucket is built on. Implemented by
//! the SFTP adapter and by [`crate::LocalFs`], and mocked in tests.

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite};

use crate::error::Result;

/// Metadata for a single remote file or directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Base name of the entry (no directory components)
    pub name: String,

    /// Whether this is a directory
    pub is_dir: bool,

    /// Size in bytes
    pub size: u64,

    /// Last modification time, when the remote reports one
    pub modified: Option<Timestamp>,
}

impl FileInfo {
    /// Create a new FileInfo for a regular file
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size,
            modified: None,
        }
    }

    /// Create a new FileInfo for a directory
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: 0,
            modified: None,
        }
    }
}

/// Decide how a symbolic link named `name` shows up in a directory listing,
/// given the result of stat'ing its target.
///
/// A link to a file is listed as that file. Links to directories and links
/// whose target cannot be resolved are left out, so a walk never leaves the
/// subtree it started in and never loops.
pub fn link_entry(name: String, target: Result<FileInfo>) -> Option<FileInfo> {
    match target {
        Ok(info) if info.is_dir => {
            tracing::debug!("not following directory link {}", name);
            None
        }
        Ok(info) => Some(FileInfo { name, ..info }),
        Err(e) => {
            tracing::debug!("skipping unresolvable link {}: {}", name, e);
            None
        }
    }
}

/// A remote file opened for reading
pub trait ReadHandle: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> ReadHandle for T {}

/// A remote file opened for writing. Shutting it down finalizes the file.
pub trait WriteHandle: AsyncWrite + Send + Unpin {}

impl<T: AsyncWrite + Send + Unpin> WriteHandle for T {}

/// Primitives a connected remote store has to offer
///
/// All paths are full remote paths. Implementations report a missing path as
/// [`crate::Error::NotFound`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteFs: Send + Sync {
    /// Get metadata for a path, following symbolic links
    async fn stat(&self, path: &str) -> Result<FileInfo>;

    /// List the entries of a directory, in no particular order.
    ///
    /// Entries are classified without following symbolic links; links are
    /// then resolved with [`link_entry`], so every backend lists the same
    /// set of entries for the same tree.
    async fn read_dir(&self, path: &str) -> Result<Vec<FileInfo>>;

    /// Open an existing file for reading
    async fn open(&self, path: &str) -> Result<Box<dyn ReadHandle>>;

    /// Create a file for writing, truncating it if it exists
    async fn create(&self, path: &str) -> Result<Box<dyn WriteHandle>>;

    /// Create a directory and all of its missing parents
    async fn mkdir_all(&self, path: &str) -> Result<()>;

    /// Remove a file
    async fn remove_file(&self, path: &str) -> Result<()>;

    /// Remove an empty directory
    async fn remove_dir(&self, path: &str) -> Result<()>;

    /// Release the session
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_link_to_file_takes_link_name() {
        let target = FileInfo::file("real.txt", 42);
        let info = link_entry("alias.txt".into(), Ok(target)).unwrap();
        assert_eq!(info.name, "alias.txt");
        assert_eq!(info.size, 42);
        assert!(!info.is_dir);
    }

    #[test]
    fn test_directory_and_broken_links_are_skipped() {
        assert!(link_entry("up".into(), Ok(FileInfo::dir("parent"))).is_none());
        assert!(link_entry("gone".into(), Err(Error::NotFound("/r/gone".into()))).is_none());
        assert!(link_entry("loop".into(), Err(Error::Remote("too many links".into()))).is_none());
    }
}

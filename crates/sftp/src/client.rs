//! SFTP client implementation
//!
//! Wraps a russh-sftp session and implements the RemoteFs trait from
//! sftpblob-core.

use async_trait::async_trait;
use russh_sftp::client::SftpSession;
use russh_sftp::client::error::Error as SftpError;
use russh_sftp::protocol::{FileAttributes, StatusCode};

use sftpblob_core::path::join_path;
use sftpblob_core::{
    BucketOptions, Error, FileInfo, ReadHandle, RemoteBucket, RemoteFs, Result, WriteHandle,
    link_entry,
};

/// SFTP session wrapper
pub struct SftpClient {
    inner: SftpSession,
}

impl SftpClient {
    /// Wrap a connected SFTP session
    pub fn new(session: SftpSession) -> Self {
        Self { inner: session }
    }

    /// Get the underlying russh-sftp session
    pub fn inner(&self) -> &SftpSession {
        &self.inner
    }
}

/// Open a bucket rooted at `root` on a connected SFTP session
pub async fn open_bucket(
    session: SftpSession,
    root: impl Into<String>,
    options: BucketOptions,
) -> Result<RemoteBucket<SftpClient>> {
    RemoteBucket::open(SftpClient::new(session), root, options).await
}

/// Map an SFTP error raised while operating on `path`
pub fn map_sftp_error(err: SftpError, path: &str) -> Error {
    match &err {
        SftpError::Status(status) if matches!(status.status_code, StatusCode::NoSuchFile) => {
            Error::NotFound(path.to_string())
        }
        _ => Error::Remote(format!("{path}: {err}")),
    }
}

fn file_info(name: String, metadata: &FileAttributes) -> FileInfo {
    FileInfo {
        name,
        is_dir: metadata.is_dir(),
        size: metadata.size.unwrap_or(0),
        modified: metadata
            .mtime
            .and_then(|t| jiff::Timestamp::from_second(i64::from(t)).ok()),
    }
}

fn base_name(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl RemoteFs for SftpClient {
    async fn stat(&self, path: &str) -> Result<FileInfo> {
        let metadata = self
            .inner
            .metadata(path)
            .await
            .map_err(|e| map_sftp_error(e, path))?;
        Ok(file_info(base_name(path), &metadata))
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<FileInfo>> {
        tracing::debug!("SFTP: read_dir {}", path);
        let entries = self
            .inner
            .read_dir(path)
            .await
            .map_err(|e| map_sftp_error(e, path))?;

        // Entry attributes come from lstat, so links are seen as links here
        let mut infos = Vec::new();
        for entry in entries {
            let name = entry.file_name();
            if name == "." || name == ".." {
                continue;
            }

            let metadata = entry.metadata();
            if metadata.is_symlink() {
                let target = self.stat(&join_path(path, &name)).await;
                infos.extend(link_entry(name, target));
            } else {
                infos.push(file_info(name, &metadata));
            }
        }
        Ok(infos)
    }

    async fn open(&self, path: &str) -> Result<Box<dyn ReadHandle>> {
        let file = self
            .inner
            .open(path)
            .await
            .map_err(|e| map_sftp_error(e, path))?;
        Ok(Box::new(file))
    }

    async fn create(&self, path: &str) -> Result<Box<dyn WriteHandle>> {
        let file = self
            .inner
            .create(path)
            .await
            .map_err(|e| map_sftp_error(e, path))?;
        Ok(Box::new(file))
    }

    async fn mkdir_all(&self, path: &str) -> Result<()> {
        let mut current = if path.starts_with('/') {
            "/".to_string()
        } else {
            String::new()
        };

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = if current.is_empty() {
                segment.to_string()
            } else {
                join_path(&current, segment)
            };

            match self.inner.metadata(current.as_str()).await {
                Ok(metadata) if metadata.is_dir() => {}
                Ok(_) => {
                    return Err(Error::InvalidState(format!(
                        "{current} exists and is not a directory"
                    )));
                }
                Err(e) => match map_sftp_error(e, &current) {
                    Error::NotFound(_) => {
                        tracing::debug!("SFTP: mkdir {}", current);
                        self.inner
                            .create_dir(current.as_str())
                            .await
                            .map_err(|e| map_sftp_error(e, &current))?;
                    }
                    other => return Err(other),
                },
            }
        }

        Ok(())
    }

    async fn remove_file(&self, path: &str) -> Result<()> {
        self.inner
            .remove_file(path)
            .await
            .map_err(|e| map_sftp_error(e, path))
    }

    async fn remove_dir(&self, path: &str) -> Result<()> {
        self.inner
            .remove_dir(path)
            .await
            .map_err(|e| map_sftp_error(e, path))
    }
}

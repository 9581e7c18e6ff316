//! Local-disk RemoteFs
//!
//! Serves the RemoteFs primitives from the local filesystem through
//! `tokio::fs`. Handy for tests and for mounting a local directory as a
//! bucket.

use std::time::SystemTime;

use async_trait::async_trait;
use jiff::Timestamp;

use crate::error::{Error, Result};
use crate::remote::{FileInfo, ReadHandle, RemoteFs, WriteHandle, link_entry};

/// RemoteFs over the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

fn file_info(name: String, metadata: &std::fs::Metadata) -> FileInfo {
    FileInfo {
        name,
        is_dir: metadata.is_dir(),
        size: metadata.len(),
        modified: metadata.modified().ok().and_then(to_timestamp),
    }
}

fn to_timestamp(time: SystemTime) -> Option<Timestamp> {
    Timestamp::try_from(time).ok()
}

fn base_name(path: &str) -> String {
    let is_sep = |c: char| c == '/' || c == std::path::MAIN_SEPARATOR;
    path.trim_end_matches(is_sep)
        .rsplit(is_sep)
        .next()
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl RemoteFs for LocalFs {
    async fn stat(&self, path: &str) -> Result<FileInfo> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| Error::from_io(e, path))?;
        Ok(file_info(base_name(path), &metadata))
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<FileInfo>> {
        let mut read_dir = tokio::fs::read_dir(path)
            .await
            .map_err(|e| Error::from_io(e, path))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| Error::from_io(e, path))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                // Removed while listing
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::from_io(e, path)),
            };

            if file_type.is_symlink() {
                let target = self.stat(&entry.path().to_string_lossy()).await;
                entries.extend(link_entry(name, target));
                continue;
            }

            match entry.metadata().await {
                Ok(metadata) => entries.push(file_info(name, &metadata)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::from_io(e, path)),
            }
        }
        Ok(entries)
    }

    async fn open(&self, path: &str) -> Result<Box<dyn ReadHandle>> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| Error::from_io(e, path))?;
        Ok(Box::new(file))
    }

    async fn create(&self, path: &str) -> Result<Box<dyn WriteHandle>> {
        let file = tokio::fs::File::create(path)
            .await
            .map_err(|e| Error::from_io(e, path))?;
        Ok(Box::new(file))
    }

    async fn mkdir_all(&self, path: &str) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| Error::from_io(e, path))
    }

    async fn remove_file(&self, path: &str) -> Result<()> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| Error::from_io(e, path))
    }

    async fn remove_dir(&self, path: &str) -> Result<()> {
        tokio::fs::remove_dir(path)
            .await
            .map_err(|e| Error::from_io(e, path))
    }
}

//! Bucket over a remote directory tree
//!
//! [`RemoteBucket`] owns a connected [`RemoteFs`] and serves the [`Bucket`]
//! contract from it: keys are resolved below a root directory, listings come
//! from [`crate::list`], and logical directories are kept alive by a hidden
//! placeholder file.

use async_trait::async_trait;
use tokio::io::AsyncSeekExt;
use tokio_util::sync::CancellationToken;

use crate::config::BucketOptions;
use crate::error::{Error, Result};
use crate::io::{BlobReader, BlobWriter};
use crate::list;
use crate::path::{RootDir, join_path};
use crate::remote::{FileInfo, RemoteFs};
use crate::traits::{Attributes, Bucket, ListOptions, ListPage, WriterOptions};

/// A bucket backed by a remote filesystem
pub struct RemoteBucket<F: RemoteFs> {
    fs: F,
    root: RootDir,
    options: BucketOptions,
}

impl<F: RemoteFs> RemoteBucket<F> {
    /// Open a bucket rooted at `root`, which must be an existing directory
    pub async fn open(fs: F, root: impl Into<String>, options: BucketOptions) -> Result<Self> {
        options.validate()?;
        let root = RootDir::new(root);

        let info = fs.stat(root.as_str()).await?;
        if !info.is_dir {
            return Err(Error::InvalidState(format!("{root} is not a directory")));
        }

        tracing::debug!("Opened bucket at {}", root);
        Ok(Self { fs, root, options })
    }

    /// Get the bucket root
    pub fn root(&self) -> &RootDir {
        &self.root
    }

    /// Get the options the bucket was opened with
    pub fn options(&self) -> &BucketOptions {
        &self.options
    }

    /// Get the underlying remote filesystem
    pub fn inner(&self) -> &F {
        &self.fs
    }

    /// Give back the underlying remote filesystem
    pub fn into_inner(self) -> F {
        self.fs
    }

    /// Resolve a key to its path and metadata; directories count as missing
    async fn for_key(&self, key: &str) -> Result<(String, FileInfo)> {
        let path = self.root.resolve(key)?;
        let info = self.fs.stat(&path).await?;
        if info.is_dir {
            return Err(Error::NotFound(path));
        }
        Ok((path, info))
    }
}

impl<F: RemoteFs> std::fmt::Debug for RemoteBucket<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBucket")
            .field("root", &self.root)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F: RemoteFs> Bucket for RemoteBucket<F> {
    async fn list_paged(&self, options: &ListOptions) -> Result<ListPage> {
        list::list_page(&self.fs, &self.root, &self.options, options).await
    }

    async fn attributes(&self, key: &str) -> Result<Attributes> {
        let (_, info) = self.for_key(key).await?;
        Ok(Attributes {
            size: info.size,
            last_modified: info.modified,
        })
    }

    async fn new_range_reader(
        &self,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> Result<BlobReader> {
        tracing::debug!("open reader {} offset={} length={:?}", key, offset, length);
        let (path, info) = self.for_key(key).await?;
        let mut file = self.fs.open(&path).await?;

        if offset > 0 {
            file.seek(std::io::SeekFrom::Start(offset)).await?;
        }

        let attributes = Attributes {
            size: info.size,
            last_modified: info.modified,
        };
        Ok(BlobReader::new(file, length, attributes))
    }

    async fn new_writer(&self, key: &str, options: WriterOptions) -> Result<BlobWriter> {
        tracing::debug!("open writer {}", key);
        let (path, parent) = self.root.resolve_file(key)?;

        self.fs.mkdir_all(&parent).await?;
        let file = self.fs.create(&path).await?;

        Ok(BlobWriter::new(file, key.to_string(), options.cancel))
    }

    async fn copy(&self, dst_key: &str, src_key: &str) -> Result<()> {
        tracing::debug!("copy {} -> {}", src_key, dst_key);
        let (src_path, _) = self.for_key(src_key).await?;
        if self.root.resolve(dst_key)? == src_path {
            return Ok(());
        }

        // Read the source directly; the ranged reader would stat it again
        let mut src = self.fs.open(&src_path).await?;

        let cancel = CancellationToken::new();
        let mut writer = self
            .new_writer(
                dst_key,
                WriterOptions {
                    cancel: cancel.clone(),
                },
            )
            .await?;

        match tokio::io::copy(&mut src, &mut writer).await {
            Ok(bytes) => {
                tracing::debug!("copied {} bytes to {}", bytes, dst_key);
                writer.close().await
            }
            Err(e) => {
                // cancel before close so the writer reports the copy as failed
                writer.abort().await;
                Err(e.into())
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        tracing::debug!("delete {}", key);
        let path = self.root.resolve(key)?;
        if path == self.root.as_str() {
            return Err(Error::InvalidState("cannot delete the bucket root".into()));
        }

        let info = self.fs.stat(&path).await?;
        if !info.is_dir {
            return self.fs.remove_file(&path).await;
        }

        let marker = join_path(&path, &self.options.placeholder);
        match self.fs.remove_file(&marker).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        self.fs.remove_dir(&path).await
    }

    async fn create_dir(&self, key: &str) -> Result<()> {
        let dir = key.trim_end_matches('/');
        if dir.is_empty() {
            return Err(Error::InvalidKey("directory key cannot be empty".into()));
        }

        let marker = format!("{dir}/{}", self.options.placeholder);
        let writer = self.new_writer(&marker, WriterOptions::default()).await?;
        writer.close().await
    }

    async fn signed_url(&self, _key: &str) -> Result<String> {
        Err(Error::Unsupported("signed URLs".into()))
    }

    async fn close(&self) -> Result<()> {
        tracing::debug!("Closing bucket at {}", self.root);
        self.fs.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::remote::MockRemoteFs;
    use mockall::Sequence;
    use mockall::predicate::eq;

    fn root_fs() -> MockRemoteFs {
        let mut fs = MockRemoteFs::new();
        fs.expect_stat()
            .with(eq("/srv"))
            .returning(|_| Ok(FileInfo::dir("srv")));
        fs
    }

    #[tokio::test]
    async fn test_open_requires_directory_root() {
        let mut fs = MockRemoteFs::new();
        fs.expect_stat()
            .returning(|_| Ok(FileInfo::file("srv", 10)));
        let err = RemoteBucket::open(fs, "/srv", BucketOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let mut fs = MockRemoteFs::new();
        fs.expect_stat()
            .returning(|p| Err(Error::NotFound(p.to_string())));
        let err = RemoteBucket::open(fs, "/missing", BucketOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_directory_removes_placeholder_first() {
        let mut fs = root_fs();
        let mut seq = Sequence::new();
        fs.expect_stat()
            .with(eq("/srv/docs"))
            .returning(|_| Ok(FileInfo::dir("docs")));
        fs.expect_remove_file()
            .with(eq("/srv/docs/.newdir"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|p| Err(Error::NotFound(p.to_string())));
        fs.expect_remove_dir()
            .with(eq("/srv/docs"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let bucket = RemoteBucket::open(fs, "/srv", BucketOptions::default())
            .await
            .unwrap();
        bucket.delete("docs/").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_propagates_placeholder_failure() {
        let mut fs = root_fs();
        fs.expect_stat()
            .with(eq("/srv/docs"))
            .returning(|_| Ok(FileInfo::dir("docs")));
        fs.expect_remove_file()
            .returning(|_| Err(Error::Remote("permission denied".into())));
        fs.expect_remove_dir().never();

        let bucket = RemoteBucket::open(fs, "/srv", BucketOptions::default())
            .await
            .unwrap();
        let err = bucket.delete("docs").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[tokio::test]
    async fn test_delete_root_refused() {
        let bucket = RemoteBucket::open(root_fs(), "/srv/", BucketOptions::default())
            .await
            .unwrap();
        let err = bucket.delete("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_attributes_of_directory_is_not_found() {
        let mut fs = root_fs();
        fs.expect_stat()
            .with(eq("/srv/a"))
            .returning(|_| Ok(FileInfo::dir("a")));
        let bucket = RemoteBucket::open(fs, "/srv", BucketOptions::default())
            .await
            .unwrap();
        assert!(bucket.attributes("a").await.unwrap_err().is_not_found());
        assert!(bucket.attributes("").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_signed_url_unsupported() {
        let bucket = RemoteBucket::open(root_fs(), "/srv", BucketOptions::default())
            .await
            .unwrap();
        let err = bucket.signed_url("a.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn test_close_releases_remote() {
        let mut fs = root_fs();
        fs.expect_close().times(1).returning(|| Ok(()));
        let bucket = RemoteBucket::open(fs, "/srv", BucketOptions::default())
            .await
            .unwrap();
        bucket.close().await.unwrap();
    }
}

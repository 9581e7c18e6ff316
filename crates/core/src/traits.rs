//! Bucket trait definition
//!
//! This trait defines the flat object-store contract a bucket satisfies,
//! independent of how the objects are actually stored.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::io::{BlobReader, BlobWriter};

/// Metadata for an object or collapsed directory in a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key; directory entries end with the delimiter
    pub key: String,

    /// Size in bytes (None for collapsed directories)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// Whether this is a directory/prefix
    pub is_dir: bool,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for a file
    pub fn file(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size: Some(size),
            last_modified: None,
            is_dir: false,
        }
    }

    /// Create a new ObjectInfo for a directory/prefix
    pub fn dir(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: None,
            last_modified: None,
            is_dir: true,
        }
    }

    pub fn with_last_modified(mut self, modified: Option<Timestamp>) -> Self {
        self.last_modified = modified;
        self
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage {
    /// Listed objects, in listing order
    pub items: Vec<ObjectInfo>,

    /// Key of the last item, present when more items follow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl ListPage {
    /// Whether more items are available after this page
    pub fn truncated(&self) -> bool {
        self.next_page_token.is_some()
    }
}

/// Options for list operations
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Only keys starting with this prefix are listed
    pub prefix: String,

    /// Delimiter for grouping (usually "/")
    pub delimiter: Option<String>,

    /// Resume after this key
    pub page_token: Option<String>,

    /// Maximum number of items per page (0 = bucket default)
    pub page_size: usize,
}

impl ListOptions {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }
}

/// Attributes of a stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Size in bytes
    pub size: u64,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
}

/// Options for opening a writer
#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    /// Once cancelled, closing the writer reports the write as failed
    pub cancel: CancellationToken,
}

/// Trait for flat object-store operations
///
/// This trait is implemented by [`crate::RemoteBucket`] and consumed by
/// generic object-storage code.
#[async_trait]
pub trait Bucket: Send + Sync {
    /// List one page of objects
    async fn list_paged(&self, options: &ListOptions) -> Result<ListPage>;

    /// Get object attributes
    async fn attributes(&self, key: &str) -> Result<Attributes>;

    /// Open an object for reading `length` bytes from `offset` (None = to the end)
    async fn new_range_reader(
        &self,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> Result<BlobReader>;

    /// Open an object for writing, creating parents as needed
    async fn new_writer(&self, key: &str, options: WriterOptions) -> Result<BlobWriter>;

    /// Copy an object
    async fn copy(&self, dst_key: &str, src_key: &str) -> Result<()>;

    /// Delete an object or an empty directory
    async fn delete(&self, key: &str) -> Result<()>;

    /// Create a logical directory
    async fn create_dir(&self, key: &str) -> Result<()>;

    /// Create a pre-authenticated URL for an object
    async fn signed_url(&self, key: &str) -> Result<String>;

    /// Release the underlying session
    async fn close(&self) -> Result<()>;

    /// Follow continuation tokens and collect every listed item
    async fn list_all(&self, options: &ListOptions) -> Result<Vec<ObjectInfo>> {
        let mut options = options.clone();
        let mut items = Vec::new();

        loop {
            let page = self.list_paged(&options).await?;
            items.extend(page.items);
            match page.next_page_token {
                Some(token) => options.page_token = Some(token),
                None => break,
            }
        }

        Ok(items)
    }

    /// Read a whole object
    async fn read_all(&self, key: &str) -> Result<Vec<u8>> {
        let mut reader = self.new_range_reader(key, 0, None).await?;
        let mut data = Vec::new();
        let read = reader.read_to_end(&mut data).await;
        reader.close().await?;
        read?;
        Ok(data)
    }

    /// Write a whole object
    async fn write_all(&self, key: &str, data: &[u8]) -> Result<()> {
        let mut writer = self.new_writer(key, WriterOptions::default()).await?;
        if let Err(e) = writer.write_all(data).await {
            writer.abort().await;
            return Err(e.into());
        }
        writer.close().await
    }
}

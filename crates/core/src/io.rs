//! Object reader and writer handles
//!
//! Both wrap a remote file handle. Callers close them explicitly on every
//! exit path; dropping releases the remote handle as well.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf, Take};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::remote::{ReadHandle, WriteHandle};
use crate::traits::Attributes;

/// Sequential reader over a (possibly bounded) byte range of an object
pub struct BlobReader {
    inner: Take<Box<dyn ReadHandle>>,
    attributes: Attributes,
}

impl BlobReader {
    /// Wrap an already positioned handle, limiting it to `length` bytes
    pub(crate) fn new(
        handle: Box<dyn ReadHandle>,
        length: Option<u64>,
        attributes: Attributes,
    ) -> Self {
        Self {
            inner: handle.take(length.unwrap_or(u64::MAX)),
            attributes,
        }
    }

    /// Attributes captured when the reader was opened
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Release the remote file handle
    pub async fn close(self) -> Result<()> {
        drop(self.inner);
        Ok(())
    }
}

impl std::fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobReader")
            .field("remaining", &self.inner.limit())
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl AsyncRead for BlobReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

/// Sequential writer for an object
pub struct BlobWriter {
    inner: Box<dyn WriteHandle>,
    key: String,
    cancel: CancellationToken,
}

impl BlobWriter {
    pub(crate) fn new(inner: Box<dyn WriteHandle>, key: String, cancel: CancellationToken) -> Self {
        Self { inner, key, cancel }
    }

    /// Key this writer stores to
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Finalize the object.
    ///
    /// Fails with [`Error::Cancelled`] when the writer's token was cancelled
    /// before close; the written bytes must then be treated as partial.
    pub async fn close(mut self) -> Result<()> {
        self.inner.shutdown().await?;

        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled(self.key));
        }

        Ok(())
    }

    /// Cancel and close, logging instead of returning the close outcome
    pub async fn abort(self) {
        self.cancel.cancel();
        let key = self.key.clone();
        match self.close().await {
            Err(Error::Cancelled(_)) => {}
            Err(e) => tracing::warn!("Failed to close aborted writer for {}: {}", key, e),
            Ok(()) => {}
        }
    }
}

impl std::fmt::Debug for BlobWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobWriter")
            .field("key", &self.key)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl AsyncWrite for BlobWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn attrs(size: u64) -> Attributes {
        Attributes {
            size,
            last_modified: None,
        }
    }

    #[tokio::test]
    async fn test_reader_respects_length() {
        let handle: Box<dyn ReadHandle> = Box::new(Cursor::new(b"0123456789".to_vec()));
        let mut reader = BlobReader::new(handle, Some(4), attrs(10));
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"0123");
        assert_eq!(reader.attributes().size, 10);
        reader.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_reader_unbounded() {
        let handle: Box<dyn ReadHandle> = Box::new(Cursor::new(b"abc".to_vec()));
        let mut reader = BlobReader::new(handle, None, attrs(3));
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "abc");
    }

    #[tokio::test]
    async fn test_writer_close_after_cancel_fails() {
        let cancel = CancellationToken::new();
        let mut writer = BlobWriter::new(Box::new(Vec::<u8>::new()), "k".into(), cancel.clone());
        writer.write_all(b"partial").await.unwrap();
        cancel.cancel();

        let err = writer.close().await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_writer_close_ok() {
        let mut writer = BlobWriter::new(
            Box::new(Vec::<u8>::new()),
            "k".into(),
            CancellationToken::new(),
        );
        writer.write_all(b"data").await.unwrap();
        assert_eq!(writer.key(), "k");
        writer.close().await.unwrap();
    }
}

//! Depth-first traversal of a remote directory tree
//!
//! [`Walker`] visits every entry below a start directory in ascending key
//! order. Siblings are ordered by their key form (`name` for files, `name/`
//! for directories), which makes a depth-first walk produce keys in strictly
//! ascending byte order. Directories are read lazily, so a caller can prune
//! the directory it was just handed with [`Walker::skip_subtree`].

use crate::error::Result;
use crate::path::join_path;
use crate::remote::{FileInfo, RemoteFs};

/// A single entry produced by [`Walker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Key of the entry; directory keys end with `/`
    pub key: String,

    /// Full remote path
    pub path: String,

    /// Remote metadata
    pub info: FileInfo,
}

impl WalkEntry {
    pub fn is_dir(&self) -> bool {
        self.info.is_dir
    }
}

/// Explicit-stack depth-first walker over a [`RemoteFs`]
pub struct Walker<'a, F: RemoteFs + ?Sized> {
    fs: &'a F,
    /// One frame per open directory, sorted descending so `pop` yields the
    /// smallest remaining key
    stack: Vec<Vec<WalkEntry>>,
    /// Directory yielded last, read on the next call unless skipped
    pending: Option<WalkEntry>,
}

impl<'a, F: RemoteFs + ?Sized> Walker<'a, F> {
    /// Start walking the directory at `path`, whose entries get keys
    /// beginning with `key_prefix`.
    ///
    /// A missing start directory yields an empty walk.
    pub async fn new(fs: &'a F, path: &str, key_prefix: &str) -> Result<Self> {
        let mut walker = Self {
            fs,
            stack: Vec::new(),
            pending: None,
        };
        match read_frame(fs, path, key_prefix).await {
            Ok(frame) => walker.stack.push(frame),
            Err(e) if e.is_not_found() => {
                tracing::debug!("walk root {} does not exist", path);
            }
            Err(e) => return Err(e),
        }
        Ok(walker)
    }

    /// Do not descend into the directory returned by the last `next` call
    pub fn skip_subtree(&mut self) {
        self.pending = None;
    }

    /// Advance to the next entry in key order
    pub async fn next(&mut self) -> Result<Option<WalkEntry>> {
        if let Some(dir) = self.pending.take() {
            match read_frame(self.fs, &dir.path, &dir.key).await {
                Ok(frame) => self.stack.push(frame),
                // Removed between being listed and being read
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        while let Some(frame) = self.stack.last_mut() {
            match frame.pop() {
                Some(entry) => {
                    if entry.is_dir() {
                        self.pending = Some(entry.clone());
                    }
                    return Ok(Some(entry));
                }
                None => {
                    self.stack.pop();
                }
            }
        }

        Ok(None)
    }
}

async fn read_frame<F: RemoteFs + ?Sized>(
    fs: &F,
    path: &str,
    key_prefix: &str,
) -> Result<Vec<WalkEntry>> {
    let mut frame: Vec<WalkEntry> = fs
        .read_dir(path)
        .await?
        .into_iter()
        .filter(|info| info.name != "." && info.name != "..")
        .map(|info| {
            let key = if info.is_dir {
                format!("{key_prefix}{}/", info.name)
            } else {
                format!("{key_prefix}{}", info.name)
            };
            WalkEntry {
                key,
                path: join_path(path, &info.name),
                info,
            }
        })
        .collect();
    frame.sort_by(|a, b| b.key.as_bytes().cmp(a.key.as_bytes()));
    Ok(frame)
}

//! Key resolution
//!
//! Maps slash-separated object keys onto paths below a remote root directory.
//! Remote paths always use `/`, independent of the local platform.

use crate::error::{Error, Result};

/// The root directory that all keys of a bucket are resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDir {
    dir: String,
}

impl RootDir {
    /// Create a new RootDir. An empty string denotes the remote `/`.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = dir.into();
        let trimmed = dir.trim_end_matches('/');
        let dir = if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
        Self { dir }
    }

    /// Get the root path without a trailing slash (except for `/` itself)
    pub fn as_str(&self) -> &str {
        &self.dir
    }

    /// Resolve a key to its full remote path.
    ///
    /// The empty key resolves to the root itself.
    pub fn resolve(&self, key: &str) -> Result<String> {
        let segments = key_segments(key)?;
        Ok(segments
            .iter()
            .fold(self.dir.clone(), |path, segment| join_path(&path, segment)))
    }

    /// Resolve a key that must name a file, returning `(path, parent)`.
    pub fn resolve_file(&self, key: &str) -> Result<(String, String)> {
        if key.ends_with('/') {
            return Err(Error::InvalidKey(format!(
                "'{key}' names a directory, not an object"
            )));
        }
        let segments = key_segments(key)?;
        let Some((name, dirs)) = segments.split_last() else {
            return Err(Error::InvalidKey("key cannot be empty".into()));
        };
        let parent = dirs
            .iter()
            .fold(self.dir.clone(), |path, segment| join_path(&path, segment));
        Ok((join_path(&parent, name), parent))
    }

    /// Compute where a listing for `prefix` has to start scanning.
    ///
    /// Returns the remote path of the scan root and the key prefix that
    /// entries found directly below it share (empty, or ending in `/`).
    pub fn scan_root(&self, prefix: &str) -> Result<(String, String)> {
        match prefix.rfind('/') {
            Some(pos) => {
                let dir_key = &prefix[..=pos];
                Ok((self.resolve(dir_key)?, dir_key.to_string()))
            }
            None => Ok((self.dir.clone(), String::new())),
        }
    }
}

impl std::fmt::Display for RootDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.dir)
    }
}

/// Join a single path component onto a remote path
pub fn join_path(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}

/// Split a key into its path segments, dropping empty and `.` segments
fn key_segments(key: &str) -> Result<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in key.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(Error::InvalidKey(format!(
                    "'{key}' escapes the bucket root"
                )));
            }
            s => segments.push(s),
        }
    }
    Ok(segments)
}

//! Listing engine
//!
//! Turns a remote directory tree into pages of [`ObjectInfo`] for a prefix,
//! an optional delimiter and a continuation token.
//!
//! The recursive strategy walks everything below the scan root (the prefix
//! cut at its last `/`) in ascending key order, collapses keys that still
//! contain the delimiter after the prefix into a single directory entry, and
//! prunes subtrees that cannot contribute to the page. The flat strategy reads
//! one directory level and orders it directories first.

use std::cmp::Ordering;

use crate::config::{BucketOptions, ListStrategy};
use crate::error::Result;
use crate::path::RootDir;
use crate::remote::{FileInfo, RemoteFs};
use crate::sort;
use crate::traits::{ListOptions, ListPage, ObjectInfo};
use crate::walk::{WalkEntry, Walker};

/// List one page below `root` according to `options`
pub async fn list_page<F: RemoteFs + ?Sized>(
    fs: &F,
    root: &RootDir,
    bucket: &BucketOptions,
    options: &ListOptions,
) -> Result<ListPage> {
    match bucket.strategy {
        ListStrategy::Recursive => list_recursive(fs, root, bucket, options).await,
        ListStrategy::Flat => list_flat(fs, root, bucket, options).await,
    }
}

/// Accumulates a page and records the continuation token when it overflows
struct PageBuilder {
    page_size: usize,
    items: Vec<ObjectInfo>,
    next_page_token: Option<String>,
}

impl PageBuilder {
    fn new(requested: usize, default: usize) -> Self {
        let page_size = if requested == 0 { default } else { requested }.max(1);
        Self {
            page_size,
            items: Vec::new(),
            next_page_token: None,
        }
    }

    /// Add an item; returns false (and drops the item) once the page is full
    fn push(&mut self, item: ObjectInfo) -> bool {
        if self.items.len() >= self.page_size {
            self.next_page_token = self.items.last().map(|i| i.key.clone());
            return false;
        }
        self.items.push(item);
        true
    }

    fn finish(self) -> ListPage {
        ListPage {
            items: self.items,
            next_page_token: self.next_page_token,
        }
    }
}

async fn list_recursive<F: RemoteFs + ?Sized>(
    fs: &F,
    root: &RootDir,
    bucket: &BucketOptions,
    options: &ListOptions,
) -> Result<ListPage> {
    let prefix = options.prefix.as_str();
    let delimiter = options.delimiter.as_deref().filter(|d| !d.is_empty());
    let token = options.page_token.as_deref();

    let (scan_path, scan_key) = root.scan_root(prefix)?;
    tracing::debug!(
        "list prefix={:?} delimiter={:?} token={:?} scan_root={}",
        prefix,
        delimiter,
        token,
        scan_path
    );

    let mut walker = Walker::new(fs, &scan_path, &scan_key).await?;
    let mut page = PageBuilder::new(options.page_size, bucket.page_size);
    let mut last_prefix: Option<String> = None;

    while let Some(entry) = walker.next().await? {
        let WalkEntry { key, info, .. } = entry;

        if info.is_dir {
            if !should_descend(&key, prefix, delimiter, last_prefix.as_deref(), token) {
                tracing::debug!("prune {}", key);
                walker.skip_subtree();
            }
            continue;
        }

        let Some(rest) = key.strip_prefix(prefix) else {
            continue;
        };

        let item = match delimiter.and_then(|d| rest.find(d).map(|pos| pos + d.len())) {
            Some(end) => {
                let dir_key = format!("{prefix}{}", &rest[..end]);
                if last_prefix.as_deref() == Some(dir_key.as_str()) {
                    continue;
                }
                last_prefix = Some(dir_key.clone());
                ObjectInfo::dir(dir_key)
            }
            None => {
                if is_hidden_placeholder(bucket, &info) {
                    continue;
                }
                ObjectInfo::file(key.as_str(), info.size).with_last_modified(info.modified)
            }
        };

        if token.is_some_and(|t| item.key.as_str() <= t) {
            continue;
        }
        if !page.push(item) {
            break;
        }
    }

    Ok(page.finish())
}

/// Decide whether the directory keyed `dir_key` (ending in `/`) can hold
/// anything for this page
fn should_descend(
    dir_key: &str,
    prefix: &str,
    delimiter: Option<&str>,
    last_prefix: Option<&str>,
    token: Option<&str>,
) -> bool {
    if !dir_key.starts_with(prefix) && !prefix.starts_with(dir_key) {
        return false;
    }

    // Everything below was already reported as one collapsed entry
    if last_prefix.is_some_and(|p| dir_key.starts_with(p)) {
        return false;
    }

    if let Some(token) = token {
        // Every key below sorts before the token
        if token > dir_key && !token.starts_with(dir_key) {
            return false;
        }
        // Every key below collapses into an entry at or before the token
        if let Some(collapsed) = collapsed_key(dir_key, prefix, delimiter) {
            if collapsed <= token {
                return false;
            }
        }
    }

    true
}

/// The collapsed entry every key below `dir_key` maps to, if there is one
fn collapsed_key<'k>(dir_key: &'k str, prefix: &str, delimiter: Option<&str>) -> Option<&'k str> {
    let rest = dir_key.strip_prefix(prefix)?;
    let end = rest.find(delimiter?)? + delimiter?.len();
    Some(&dir_key[..prefix.len() + end])
}

fn is_hidden_placeholder(bucket: &BucketOptions, info: &FileInfo) -> bool {
    !bucket.list_placeholders && info.name == bucket.placeholder
}

async fn list_flat<F: RemoteFs + ?Sized>(
    fs: &F,
    root: &RootDir,
    bucket: &BucketOptions,
    options: &ListOptions,
) -> Result<ListPage> {
    let prefix = options.prefix.as_str();
    let (scan_path, scan_key) = root.scan_root(prefix)?;
    tracing::debug!("flat list prefix={:?} scan_root={}", prefix, scan_path);

    let entries = match fs.read_dir(&scan_path).await {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => return Err(e),
    };

    let mut items: Vec<ObjectInfo> = entries
        .into_iter()
        .filter(|info| info.name != "." && info.name != "..")
        .filter(|info| info.is_dir || !is_hidden_placeholder(bucket, info))
        .map(|info| {
            if info.is_dir {
                ObjectInfo::dir(format!("{scan_key}{}/", info.name))
                    .with_last_modified(info.modified)
            } else {
                ObjectInfo::file(format!("{scan_key}{}", info.name), info.size)
                    .with_last_modified(info.modified)
            }
        })
        .filter(|item| item.key.starts_with(prefix))
        .collect();
    sort::sort_dirs_first(&mut items);

    // Directory tokens end with '/', so the token's position is recoverable
    let token = options
        .page_token
        .as_deref()
        .map(|t| (t.ends_with('/'), t));

    let mut page = PageBuilder::new(options.page_size, bucket.page_size);
    for item in items {
        if let Some((token_dir, token)) = token {
            if sort::compare(item.is_dir, &item.key, token_dir, token) != Ordering::Greater {
                continue;
            }
        }
        if !page.push(item) {
            break;
        }
    }

    Ok(page.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_builder_cuts_after_page_size() {
        let mut page = PageBuilder::new(2, 1000);
        assert!(page.push(ObjectInfo::file("a", 1)));
        assert!(page.push(ObjectInfo::file("b", 1)));
        assert!(!page.push(ObjectInfo::file("c", 1)));

        let page = page.finish();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_page_token.as_deref(), Some("b"));
    }

    #[test]
    fn test_page_builder_zero_uses_default() {
        let page = PageBuilder::new(0, 3);
        assert_eq!(page.page_size, 3);
    }

    #[test]
    fn test_should_descend_prefix_match() {
        assert!(should_descend("a/", "", None, None, None));
        assert!(should_descend("a/", "a/b", None, None, None));
        assert!(should_descend("a/b/", "a/", None, None, None));
        assert!(!should_descend("b/", "a/", None, None, None));
        assert!(!should_descend("ab/", "a/", None, None, None));
    }

    #[test]
    fn test_should_descend_prunes_collapsed_and_token() {
        // already emitted "a/"
        assert!(!should_descend("a/b/", "", Some("/"), Some("a/"), None));
        // token beyond the whole subtree
        assert!(!should_descend("a/", "", None, None, Some("b")));
        // token inside the subtree
        assert!(should_descend("a/", "", None, None, Some("a/m")));
        // subtree collapses to "a/", which the token already covers
        assert!(!should_descend("a/b/", "", Some("/"), None, Some("a/")));
        assert!(should_descend("a/b/", "", None, None, Some("a/")));
    }

    #[test]
    fn test_collapsed_key() {
        assert_eq!(collapsed_key("a/b/", "", Some("/")), Some("a/"));
        assert_eq!(collapsed_key("a/b/", "a/", Some("/")), Some("a/b/"));
        assert_eq!(collapsed_key("a/b/", "a/", None), None);
        assert_eq!(collapsed_key("x/", "a/", Some("/")), None);
    }
}

//! Ordering for single-level listings: directories first, then files, each
//! group ordered byte-wise by key.

use std::cmp::Ordering;

use crate::traits::ObjectInfo;

/// Compare two listing entries, directories before files
pub fn dirs_first(a: &ObjectInfo, b: &ObjectInfo) -> Ordering {
    compare(a.is_dir, &a.key, b.is_dir, &b.key)
}

/// Same ordering as [`dirs_first`] on bare `(is_dir, key)` pairs
pub fn compare(a_dir: bool, a_key: &str, b_dir: bool, b_key: &str) -> Ordering {
    b_dir
        .cmp(&a_dir)
        .then_with(|| a_key.as_bytes().cmp(b_key.as_bytes()))
}

/// Sort entries in place with [`dirs_first`]
pub fn sort_dirs_first(items: &mut [ObjectInfo]) {
    items.sort_by(dirs_first);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_sort_before_files() {
        let mut items = vec![
            ObjectInfo::file("a.txt", 1),
            ObjectInfo::dir("z/"),
            ObjectInfo::file("B.txt", 1),
            ObjectInfo::dir("m/"),
        ];
        sort_dirs_first(&mut items);
        let keys: Vec<_> = items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, ["m/", "z/", "B.txt", "a.txt"]);
    }

    #[test]
    fn test_compare_is_bytewise() {
        assert_eq!(compare(false, "a-b", false, "a/b"), Ordering::Less);
        assert_eq!(compare(false, "é", false, "z"), Ordering::Greater);
        assert_eq!(compare(true, "z/", false, "a"), Ordering::Less);
        assert_eq!(compare(true, "a/", true, "a/"), Ordering::Equal);
    }
}

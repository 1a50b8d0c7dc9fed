//! Absolute path resolution against the directory tree.

use crate::dir;
use crate::error::{Error, Result};
use crate::image::Image;
use crate::layout::ROOT_INODE;

/// Resolves an absolute path to the inode number of its last component.
///
/// Every path must start with `/`. A trailing `/` (other than the root path
/// itself) asserts that the final component is a directory; resolving to a
/// non-directory in that case fails with [`Error::NoEntry`], matching the
/// rest of this toolkit's "looks like a directory, isn't one" handling.
pub fn resolve(image: &Image, path: &str) -> Result<u32> {
    if !path.starts_with('/') {
        return Err(Error::NoEntry);
    }

    let trailing_slash = path.len() > 1 && path.ends_with('/');
    let mut cur = ROOT_INODE;

    for token in path.split('/').filter(|s| !s.is_empty()) {
        match dir::lookup(image, cur, token.as_bytes())? {
            Some(next) => cur = next,
            None => return Err(Error::NoEntry),
        }
    }

    if trailing_slash && !image.inode(cur).is_dir() {
        return Err(Error::NoEntry);
    }

    Ok(cur)
}

/// Returns the path to the parent of the last component of `path`, always
/// ending in `/`. `parent_path("/a/b/c") == "/a/b/"`, `parent_path("/a") ==
/// "/"`.
pub fn parent_path(path: &str) -> String {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rfind('/') {
        Some(idx) => trimmed[..=idx].to_string(),
        None => "/".to_string(),
    }
}

/// Returns the last component of `path`, with any trailing `/` ignored.
pub fn basename(path: &str) -> &str {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_and_basename() {
        assert_eq!(parent_path("/a/b/c"), "/a/b/");
        assert_eq!(parent_path("/a/b/c/"), "/a/b/");
        assert_eq!(parent_path("/a"), "/");
        assert_eq!(basename("/a/b/c"), "c");
        assert_eq!(basename("/a/b/c/"), "c");
        assert_eq!(basename("/a"), "a");
    }
}

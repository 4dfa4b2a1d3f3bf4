//! Recursive directory traversal
//!
//! Enumerates every entry below a root directory with `walkdir`. Each step
//! yields its own `Result`, so an unreadable subtree is reported and skipped
//! while the rest of the tree is still visited.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};

/// Options controlling the traversal
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Descend into symlinked directories (walkdir then detects loops)
    pub follow_links: bool,
}

/// A filesystem entry found below the root
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Full path of the entry (root joined with the relative path)
    pub path: PathBuf,
    /// Whether the entry is, or links to, a regular file
    pub is_regular_file: bool,
}

/// Lazy, single-use walk over the descendants of a root directory
pub struct TreeWalker {
    root: PathBuf,
    inner: walkdir::IntoIter,
}

impl TreeWalker {
    /// Start a walk below `root`
    ///
    /// Fails with [`Error::InvalidRoot`] if `root` does not exist or is not a
    /// directory; no entries are produced in that case.
    pub fn new<P: AsRef<Path>>(root: P, options: &WalkOptions) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(Error::InvalidRoot(root)),
        }

        let inner = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(options.follow_links)
            .into_iter();

        Ok(Self { root, inner })
    }

    /// The directory this walk started from
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Iterator for TreeWalker {
    type Item = Result<Candidate>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(Error::Walk(e))),
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let candidate = Candidate {
                is_regular_file: is_regular_file(&entry),
                path: entry.into_path(),
            };
            debug!(path = %candidate.path.display(), regular = candidate.is_regular_file, "candidate");
            return Some(Ok(candidate));
        }
    }
}

/// Regular files, and symlinks whose target is a regular file
fn is_regular_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    if file_type.is_symlink() {
        return fs::metadata(entry.path())
            .map(|meta| meta.is_file())
            .unwrap_or(false);
    }
    false
}

//! Run configuration
//!
//! Resolves the raw command-line values (root directory, extension list,
//! archive name) into a [`RunConfig`] before any archive work starts. The
//! core never looks at process state itself; the executable directory used
//! for a `.` root is passed in by the caller.

use std::path::{Path, PathBuf};

use crate::extensions::ExtensionSet;
use crate::session::SessionOptions;
use crate::walk::WalkOptions;

/// Argument value that selects a default (root or archive name)
pub const DEFAULT_MARKER: &str = ".";

/// Archive file stem used when the root has no final component
pub const FALLBACK_ARCHIVE_STEM: &str = "Archive";

/// Fully resolved inputs of a run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory to walk
    pub root: PathBuf,
    /// Extensions selecting the files to archive
    pub extensions: ExtensionSet,
    /// Target ZIP archive
    pub archive: PathBuf,
    /// Options for staged entries
    pub session: SessionOptions,
    /// Traversal options
    pub walk: WalkOptions,
}

impl RunConfig {
    /// Resolve raw argument values
    ///
    /// * `root` - directory to walk, or `.` for `exe_dir`
    /// * `extensions` - `;`-separated extension list
    /// * `archive` - archive path; `.` derives `<root name>.zip` inside the
    ///   root, and a bare file name is placed inside the root
    /// * `exe_dir` - directory of the running executable
    pub fn resolve(root: &str, extensions: &str, archive: &str, exe_dir: &Path) -> Self {
        let root = resolve_root(root, exe_dir);
        let archive = resolve_archive(archive, &root);
        Self {
            extensions: ExtensionSet::parse(extensions),
            root,
            archive,
            session: SessionOptions::default(),
            walk: WalkOptions::default(),
        }
    }

    /// Set the options for staged entries
    pub fn with_session_options(mut self, options: SessionOptions) -> Self {
        self.session = options;
        self
    }

    /// Set the traversal options
    pub fn with_walk_options(mut self, options: WalkOptions) -> Self {
        self.walk = options;
        self
    }
}

/// `.` selects the executable's directory; anything else is used as given
pub fn resolve_root(root: &str, exe_dir: &Path) -> PathBuf {
    if root == DEFAULT_MARKER {
        exe_dir.to_path_buf()
    } else {
        PathBuf::from(root)
    }
}

/// Resolve the archive location against an already resolved root
pub fn resolve_archive(archive: &str, root: &Path) -> PathBuf {
    if archive == DEFAULT_MARKER {
        let stem = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| FALLBACK_ARCHIVE_STEM.to_string());
        return root.join(format!("{}.zip", stem));
    }

    let path = PathBuf::from(archive);
    let has_dir = path
        .parent()
        .map(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(false);
    if has_dir {
        path
    } else {
        root.join(path)
    }
}

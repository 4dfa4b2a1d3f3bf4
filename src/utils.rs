//! General utility functions for selectzip
//!
//! Mapping of filesystem paths to archive entry names, and size formatting
//! for summaries.

use std::path::{Component, Path};

/// Separator used between components of an archive entry name
pub const ENTRY_SEPARATOR: &str = "/";

/// Compute the archive entry name of `file` relative to `root`
///
/// The result is the root-relative path joined with `/` regardless of the
/// platform separator. `file` must be a descendant of `root`; `None` is
/// returned otherwise, or when nothing is left after stripping the root.
///
/// # Example
/// ```
/// use std::path::Path;
/// use selectzip::entry_name;
/// let name = entry_name(Path::new("/data"), Path::new("/data/a/b.txt"));
/// assert_eq!(name.as_deref(), Some("a/b.txt"));
/// ```
pub fn entry_name(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::CurDir => {}
            // Walk results never climb out of the root
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(parts.join(ENTRY_SEPARATOR))
}

/// Format a file size in human-readable form (B, KB, MB, GB)
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} B", size)
    }
}

//! Add-or-replace reconciliation of files against an open archive

use std::fmt;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::session::{ArchiveSession, EntrySource};

/// What was staged for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// A new entry was staged
    Added,
    /// An existing entry was staged for replacement
    Replaced,
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Added => f.write_str("Added"),
            StageOutcome::Replaced => f.write_str("Updated"),
        }
    }
}

/// Stage the file at `path` under `entry_name`
///
/// Replaces the entry if the archive already has one with exactly this
/// name, adds it otherwise. On error nothing is staged for this file and the
/// session stays usable for the next one.
pub fn stage_file(session: &mut ArchiveSession, entry_name: &str, path: &Path) -> Result<StageOutcome> {
    let source = EntrySource::from_path(path)?;

    let outcome = match session.locate_entry(entry_name) {
        Some(index) => {
            session.replace_entry(index, source)?;
            StageOutcome::Replaced
        }
        None => {
            session.add_entry(entry_name, source)?;
            StageOutcome::Added
        }
    };

    info!(entry = entry_name, outcome = %outcome, "staged");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::session::SessionOptions;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_stage_add_then_replace() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"a").unwrap();

        let mut session =
            ArchiveSession::open(dir.path().join("out.zip"), SessionOptions::default()).unwrap();

        assert_eq!(stage_file(&mut session, "a.txt", &file).unwrap(), StageOutcome::Added);
        assert_eq!(stage_file(&mut session, "a.txt", &file).unwrap(), StageOutcome::Replaced);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_stage_missing_file_leaves_session_untouched() {
        let dir = TempDir::new().unwrap();
        let mut session =
            ArchiveSession::open(dir.path().join("out.zip"), SessionOptions::default()).unwrap();

        let err = stage_file(&mut session, "gone.txt", &dir.path().join("gone.txt")).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
        assert!(session.is_empty());
        assert!(!session.has_changes());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(StageOutcome::Added.to_string(), "Added");
        assert_eq!(StageOutcome::Replaced.to_string(), "Updated");
    }
}

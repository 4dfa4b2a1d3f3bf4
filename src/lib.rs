//! # selectzip
//!
//! A Rust library for collecting files by extension into a ZIP archive.
//!
//! ## Overview
//!
//! A run walks a directory tree, keeps the regular files whose extension is
//! in a `;`-separated list, and writes them into a ZIP archive under their
//! root-relative, `/`-separated paths:
//!
//! - Entries that already exist under the same name are replaced
//! - New names are added
//! - Entries with no matching file on disk are left untouched
//!
//! All changes are staged in memory and committed to disk in one step when
//! the archive session is finalized.
//!
//! ## Example - Updating an archive
//!
//! ```rust,no_run
//! use std::path::Path;
//! use selectzip::{update_archive, NoopObserver, RunConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = RunConfig::resolve("C:/Data", "txt;cpp", "C:/Backup/data.zip", Path::new("."));
//!     let report = update_archive(&config, &mut NoopObserver)?;
//!
//!     println!("Done! Total {} files processed.", report.processed);
//!     Ok(())
//! }
//! ```
//!
//! ## Example - Using a session directly
//!
//! ```rust,no_run
//! use selectzip::{ArchiveSession, EntrySource, SessionOptions};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut session = ArchiveSession::open("data.zip", SessionOptions::default())?;
//!     let source = EntrySource::from_path("notes/today.txt")?;
//!
//!     match session.locate_entry("notes/today.txt") {
//!         Some(index) => session.replace_entry(index, source)?,
//!         None => {
//!             session.add_entry("notes/today.txt", source)?;
//!         }
//!     }
//!
//!     session.finalize()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod extensions;
pub mod ops;
pub mod reconcile;
pub mod session;
pub mod utils;
pub mod walk;

pub use config::RunConfig;
pub use error::{Error, Result};
pub use extensions::ExtensionSet;
pub use ops::{update_archive, FileFailure, NoopObserver, RunObserver, RunReport};
pub use reconcile::{stage_file, StageOutcome};
pub use session::{ArchiveSession, CommitSummary, CompressionMethod, EntrySource, SessionOptions};
pub use utils::{entry_name, format_size};
pub use walk::{Candidate, TreeWalker, WalkOptions};

//! ZIP archive session
//!
//! An [`ArchiveSession`] owns the target archive for one run. It is opened
//! (or created) once, accumulates add/replace operations in memory, and is
//! committed by [`ArchiveSession::finalize`], which consumes the session so no
//! operation can follow it.
//!
//! Nothing touches the target path before finalize. Finalize writes the
//! complete archive to a sibling temporary file and renames it over the
//! target, so a failed commit leaves a pre-existing archive as it was.
//! Unchanged entries are copied raw, without recompression.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local, Timelike};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// Sources of at least this size are written with ZIP64 extensions
const ZIP64_THRESHOLD: u64 = 0xFFFF_FFFF;

/// Deflate levels accepted by the writer
pub const DEFLATE_LEVELS: RangeInclusive<u32> = 1..=9;

/// Compression methods available for new and replaced entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// No compression (stored as-is)
    Store,
    /// Standard DEFLATE compression
    Deflate,
}

impl From<CompressionMethod> for zip::CompressionMethod {
    fn from(method: CompressionMethod) -> Self {
        match method {
            CompressionMethod::Store => zip::CompressionMethod::Stored,
            CompressionMethod::Deflate => zip::CompressionMethod::Deflated,
        }
    }
}

/// Options for writing staged entries
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Compression method for added and replaced entries
    pub compression: CompressionMethod,
    /// Compression level for Deflate (1-9, default 6); ignored by Store
    pub compression_level: u32,
}

impl SessionOptions {
    /// Check that the writer will accept these options
    pub fn validate(&self) -> Result<()> {
        if self.compression == CompressionMethod::Deflate
            && !DEFLATE_LEVELS.contains(&self.compression_level)
        {
            return Err(Error::InvalidCompressionLevel(self.compression_level));
        }
        Ok(())
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflate,
            compression_level: 6,
        }
    }
}

/// A file on disk whose content will be written into an entry
///
/// Creating a source checks that the file can be opened for reading; the
/// handle itself is released right away and reopened when the archive is
/// written, so large trees do not hold one descriptor per file.
#[derive(Debug, Clone)]
pub struct EntrySource {
    path: PathBuf,
    size: u64,
    modified: Option<SystemTime>,
    mode: Option<u32>,
}

impl EntrySource {
    /// Bind a source to the file at `path`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let unavailable = |source: io::Error| Error::SourceUnavailable {
            path: path.clone(),
            source,
        };

        let file = File::open(&path).map_err(unavailable)?;
        let meta = file.metadata().map_err(unavailable)?;
        if !meta.is_file() {
            return Err(unavailable(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }

        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            Some(meta.permissions().mode())
        };
        #[cfg(not(unix))]
        let mode = None;

        Ok(Self {
            size: meta.len(),
            modified: meta.modified().ok(),
            mode,
            path,
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the file when the source was created
    pub fn size(&self) -> u64 {
        self.size
    }

    fn open(&self) -> io::Result<File> {
        File::open(&self.path)
    }

    fn file_options(&self, options: &SessionOptions) -> SimpleFileOptions {
        let mut file_options = SimpleFileOptions::default()
            .compression_method(options.compression.into())
            .large_file(self.size >= ZIP64_THRESHOLD);

        if options.compression == CompressionMethod::Deflate {
            file_options = file_options.compression_level(Some(i64::from(options.compression_level)));
        }
        if let Some(time) = self.modified.and_then(zip_datetime) {
            file_options = file_options.last_modified_time(time);
        }
        if let Some(mode) = self.mode {
            file_options = file_options.unix_permissions(mode);
        }
        file_options
    }
}

/// One entry of the archive being assembled
#[derive(Debug)]
struct Slot {
    name: String,
    /// Index in the archive as it was opened, if the entry existed
    origin: Option<usize>,
    /// New content, if the entry was added or replaced in this session
    staged: Option<EntrySource>,
}

/// Outcome of a successful finalize
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Whether the archive file was (re)written
    pub written: bool,
    /// Entries in the resulting archive
    pub entries_total: usize,
    /// Entries copied unchanged from the previous archive
    pub entries_kept: usize,
    /// New entries
    pub entries_added: usize,
    /// Existing entries whose content was replaced
    pub entries_replaced: usize,
    /// Size of the archive file on disk after the commit
    pub archive_size: u64,
}

/// Exclusive, single-use handle on the target archive
pub struct ArchiveSession {
    path: PathBuf,
    options: SessionOptions,
    existing: Option<ZipArchive<File>>,
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
}

impl ArchiveSession {
    /// Open the archive at `path` for update, or prepare to create it
    ///
    /// A missing file, or an existing empty one, starts an empty archive.
    /// Anything else must be a readable ZIP archive. Options the writer
    /// would reject fail here rather than at finalize.
    pub fn open<P: AsRef<Path>>(path: P, options: SessionOptions) -> Result<Self> {
        options.validate()?;
        let path = path.as_ref().to_path_buf();
        let existing = open_existing(&path).map_err(|e| Error::ArchiveOpen {
            path: path.clone(),
            source: Box::new(e),
        })?;

        let mut session = Self {
            path,
            options,
            existing: None,
            slots: Vec::new(),
            index: HashMap::new(),
        };

        if let Some(mut archive) = existing {
            for i in 0..archive.len() {
                let name = archive
                    .by_index_raw(i)
                    .map_err(|e| Error::ArchiveOpen {
                        path: session.path.clone(),
                        source: Box::new(e.into()),
                    })?
                    .name()
                    .to_string();
                session.push_slot(name, Some(i), None);
            }
            session.existing = Some(archive);
        }

        info!(
            path = %session.path.display(),
            entries = session.slots.len(),
            "opened archive"
        );
        Ok(session)
    }

    /// Path of the target archive
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries the archive would contain if finalized now
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the archive would be empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Entry names in archive order
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    /// Check whether any add or replace has been staged
    pub fn has_changes(&self) -> bool {
        self.slots.iter().any(|slot| slot.staged.is_some())
    }

    /// Find the index of the entry with exactly this name (case-sensitive)
    pub fn locate_entry(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Stage a new entry; fails if the name is already taken
    pub fn add_entry(&mut self, name: &str, source: EntrySource) -> Result<usize> {
        if self.index.contains_key(name) {
            return Err(Error::EntryExists(name.to_string()));
        }
        debug!(name, source = %source.path().display(), "staged add");
        Ok(self.push_slot(name.to_string(), None, Some(source)))
    }

    /// Stage new content for the entry at `index`
    pub fn replace_entry(&mut self, index: usize, source: EntrySource) -> Result<()> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::InvalidIndex(index))?;
        debug!(name = %slot.name, source = %source.path().display(), "staged replace");
        slot.staged = Some(source);
        Ok(())
    }

    /// Commit every staged operation to disk, consuming the session
    ///
    /// A session without staged changes writes nothing. On failure the
    /// target path is left as it was before the session was opened.
    pub fn finalize(self) -> Result<CommitSummary> {
        let path = self.path.clone();
        self.commit().map_err(|e| Error::Finalize {
            path,
            source: Box::new(e),
        })
    }

    fn push_slot(&mut self, name: String, origin: Option<usize>, staged: Option<EntrySource>) -> usize {
        let index = self.slots.len();
        self.index.entry(name.clone()).or_insert(index);
        self.slots.push(Slot {
            name,
            origin,
            staged,
        });
        index
    }

    fn summary(&self) -> CommitSummary {
        let mut summary = CommitSummary {
            entries_total: self.slots.len(),
            ..CommitSummary::default()
        };
        for slot in &self.slots {
            match (slot.origin, &slot.staged) {
                (Some(_), None) => summary.entries_kept += 1,
                (Some(_), Some(_)) => summary.entries_replaced += 1,
                (None, _) => summary.entries_added += 1,
            }
        }
        summary
    }

    fn commit(mut self) -> Result<CommitSummary> {
        let mut summary = self.summary();
        if !self.has_changes() {
            info!(path = %self.path.display(), "archive unchanged, nothing to write");
            return Ok(summary);
        }

        let temp_path = temp_path(&self.path);
        let written = write_archive(&temp_path, &mut self.existing, &self.slots, &self.options);

        // Release the old archive before it gets replaced
        drop(self.existing.take());

        match written.and_then(|_| fs::rename(&temp_path, &self.path).map_err(Error::from)) {
            Ok(()) => {
                summary.written = true;
                summary.archive_size = fs::metadata(&self.path)?.len();
                info!(
                    path = %self.path.display(),
                    entries = summary.entries_total,
                    added = summary.entries_added,
                    replaced = summary.entries_replaced,
                    "archive written"
                );
                Ok(summary)
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }
}

fn open_existing(path: &Path) -> Result<Option<ZipArchive<File>>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            // The archive is created on finalize; its directory must exist now
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.is_dir() {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("directory {} does not exist", parent.display()),
                    )));
                }
            }
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    if file.metadata()?.len() == 0 {
        return Ok(None);
    }
    Ok(Some(ZipArchive::new(file)?))
}

fn write_archive(
    temp_path: &Path,
    existing: &mut Option<ZipArchive<File>>,
    slots: &[Slot],
    options: &SessionOptions,
) -> Result<()> {
    let file = File::create(temp_path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));

    for slot in slots {
        match (&slot.staged, slot.origin) {
            (Some(source), _) => {
                writer.start_file(slot.name.as_str(), source.file_options(options))?;
                let mut input = source.open()?;
                io::copy(&mut input, &mut writer)?;
            }
            (None, Some(index)) => {
                let archive = existing.as_mut().ok_or(Error::InvalidIndex(index))?;
                writer.raw_copy_file(archive.by_index_raw(index)?)?;
            }
            (None, None) => {}
        }
    }

    let mut output = writer.finish()?;
    output.flush()?;
    output.get_ref().sync_all()?;
    Ok(())
}

/// `archive.zip` -> `archive.zip.tmp` in the same directory
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("archive.zip"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Convert a file time to the archive's DOS timestamp in local time
///
/// Returns `None` for times the format cannot represent (before 1980 or
/// after 2107).
fn zip_datetime(time: SystemTime) -> Option<zip::DateTime> {
    let local = DateTime::<Local>::from(time);
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}

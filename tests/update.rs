//! End-to-end tests for archive update runs.
//!
//! Each test builds a directory tree in a temporary directory, runs
//! `update_archive` against it and reads the resulting archive back.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use selectzip::{update_archive, Error, NoopObserver, RunConfig, RunObserver};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (name, data) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, data).unwrap();
    }
}

fn read_archive(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries: Vec<_> = (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect();
    entries.sort();
    entries
}

fn seed_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

fn config(root: &Path, extensions: &str, archive: &Path) -> RunConfig {
    RunConfig::resolve(
        &root.to_string_lossy(),
        extensions,
        &archive.to_string_lossy(),
        root,
    )
}

fn entry(name: &str, data: &[u8]) -> (String, Vec<u8>) {
    (name.to_string(), data.to_vec())
}

#[test]
fn test_selects_by_extension() {
    let root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_tree(
        root.path(),
        &[("a/b.txt", b"bee"), ("a/c.cpp", b"int main() {}"), ("d.md", b"# doc")],
    );
    let archive = out.path().join("out.zip");

    let report = update_archive(&config(root.path(), "txt;cpp", &archive), &mut NoopObserver).unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.added, 2);
    assert_eq!(
        read_archive(&archive),
        vec![entry("a/b.txt", b"bee"), entry("a/c.cpp", b"int main() {}")]
    );
}

#[test]
fn test_extensions_are_case_insensitive() {
    let root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_tree(root.path(), &[("UPPER.TXT", b"1"), ("lower.txt", b"2"), ("other.dat", b"3")]);
    let archive = out.path().join("out.zip");

    let report = update_archive(&config(root.path(), ".Txt", &archive), &mut NoopObserver).unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(
        read_archive(&archive),
        vec![entry("UPPER.TXT", b"1"), entry("lower.txt", b"2")]
    );
}

#[test]
fn test_merge_keeps_unmatched_entries() {
    let root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let archive = out.path().join("out.zip");
    seed_archive(&archive, &[("keep.txt", b"kept"), ("old.txt", b"stale")]);
    write_tree(root.path(), &[("old.txt", b"fresh"), ("new.txt", b"brand new")]);

    let report = update_archive(&config(root.path(), "txt", &archive), &mut NoopObserver).unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.added, 1);
    assert_eq!(report.replaced, 1);
    assert_eq!(report.commit.entries_kept, 1);
    assert_eq!(
        read_archive(&archive),
        vec![
            entry("keep.txt", b"kept"),
            entry("new.txt", b"brand new"),
            entry("old.txt", b"fresh"),
        ]
    );
}

#[test]
fn test_second_run_is_idempotent() {
    let root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_tree(root.path(), &[("x/one.txt", b"one"), ("two.txt", b"two")]);
    let archive = out.path().join("out.zip");
    let cfg = config(root.path(), "txt", &archive);

    update_archive(&cfg, &mut NoopObserver).unwrap();
    let first = read_archive(&archive);

    let report = update_archive(&cfg, &mut NoopObserver).unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.replaced, 2);
    assert_eq!(report.added, 0);
    assert_eq!(read_archive(&archive), first);
}

#[test]
fn test_missing_root_is_setup_error() {
    let out = TempDir::new().unwrap();
    let archive = out.path().join("out.zip");

    let err = update_archive(
        &config(&out.path().join("does-not-exist"), "txt", &archive),
        &mut NoopObserver,
    )
    .unwrap_err();

    assert!(matches!(err, Error::InvalidRoot(_)));
    assert!(!archive.exists());
}

#[test]
fn test_no_matches_leaves_existing_archive_untouched() {
    let root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let archive = out.path().join("out.zip");
    seed_archive(&archive, &[("keep.txt", b"kept")]);
    let before = fs::read(&archive).unwrap();
    write_tree(root.path(), &[("image.png", b"png")]);

    let report = update_archive(&config(root.path(), "txt", &archive), &mut NoopObserver).unwrap();

    assert_eq!(report.processed, 0);
    assert!(!report.commit.written);
    assert_eq!(fs::read(&archive).unwrap(), before);
}

#[test]
fn test_corrupt_archive_is_setup_error() {
    let root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let archive = out.path().join("out.zip");
    fs::write(&archive, b"this is not a zip file").unwrap();
    write_tree(root.path(), &[("a.txt", b"a")]);

    let err = update_archive(&config(root.path(), "txt", &archive), &mut NoopObserver).unwrap_err();

    assert!(matches!(err, Error::ArchiveOpen { .. }));
    assert_eq!(fs::read(&archive).unwrap(), b"this is not a zip file");
}

/// Removes one file between enumeration and staging
struct VanishingFile {
    victim: PathBuf,
    failures: Vec<PathBuf>,
}

impl RunObserver for VanishingFile {
    fn on_file(&mut self, _entry_name: &str, path: &Path) {
        if path == self.victim {
            fs::remove_file(path).unwrap();
        }
    }

    fn on_file_error(&mut self, path: &Path, error: &Error) {
        assert!(matches!(error, Error::SourceUnavailable { .. }));
        self.failures.push(path.to_path_buf());
    }
}

#[test]
fn test_source_failure_skips_only_that_file() {
    let root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_tree(root.path(), &[("a.txt", b"a"), ("b.txt", b"b"), ("c.txt", b"c")]);
    let archive = out.path().join("out.zip");

    let mut observer = VanishingFile {
        victim: root.path().join("b.txt"),
        failures: Vec::new(),
    };
    let report = update_archive(&config(root.path(), "txt", &archive), &mut observer).unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, root.path().join("b.txt"));
    assert_eq!(observer.failures, vec![root.path().join("b.txt")]);
    assert_eq!(read_archive(&archive), vec![entry("a.txt", b"a"), entry("c.txt", b"c")]);
}

#[test]
fn test_bare_archive_name_is_created_in_root() {
    let root = TempDir::new().unwrap();
    write_tree(root.path(), &[("notes.txt", b"n")]);

    let cfg = RunConfig::resolve(&root.path().to_string_lossy(), "txt", "bundle.zip", root.path());
    let report = update_archive(&cfg, &mut NoopObserver).unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(read_archive(&root.path().join("bundle.zip")), vec![entry("notes.txt", b"n")]);
}

//! Edge-case coverage for the pipeline and operations.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use dupsweep::duplicates::{all_records, CandidateFilter, CriterionSet};
use dupsweep::ops::relocate::{move_back, move_duplicates};
use dupsweep::scanner::{Indexer, IndexerConfig, Prober, ProberConfig};
use tempfile::TempDir;

fn write_file(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(&path).unwrap().write_all(content).unwrap();
    path
}

fn narrow_default(root: &Path) -> dupsweep::duplicates::Narrowed {
    let indexed = Indexer::new(root, IndexerConfig::default()).index().unwrap();
    CandidateFilter::new(
        CriterionSet::default_set(),
        Prober::new(ProberConfig::default()),
    )
    .narrow(indexed.records)
    .unwrap()
}

#[test]
fn empty_files_never_appear_in_any_group() {
    let dir = TempDir::new().unwrap();
    File::create(dir.path().join("empty1.txt")).unwrap();
    File::create(dir.path().join("empty2.txt")).unwrap();

    let indexed = Indexer::new(dir.path(), IndexerConfig::default())
        .index()
        .unwrap();
    assert!(indexed.records.is_empty());

    let narrowed = narrow_default(dir.path());
    assert!(narrowed.is_empty());
}

#[test]
fn very_small_files_still_compare_by_content() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "small1.txt", b"a");
    write_file(dir.path(), "small2.txt", b"a");
    write_file(dir.path(), "small3.txt", b"b");

    let narrowed = narrow_default(dir.path());
    assert_eq!(narrowed.groups.len(), 1);
    assert_eq!(narrowed.groups[0].len(), 2);
    assert_eq!(narrowed.groups[0].master().size, 1);
}

#[test]
fn unicode_and_special_filenames_survive_a_move_round_trip() {
    let dir = TempDir::new().unwrap();
    let originals = vec![
        write_file(dir.path(), "file with spaces.txt", b"payload"),
        write_file(dir.path(), "café_[draft].txt", b"payload"),
        write_file(dir.path(), "särskild/ünïcode.txt", b"payload"),
    ];

    let narrowed = narrow_default(dir.path());
    assert_eq!(narrowed.groups.len(), 1);

    let moved = move_duplicates(dir.path(), all_records(&narrowed.groups)).unwrap();
    assert!(moved.all_succeeded());

    let restored = move_back(dir.path()).unwrap();
    assert!(restored.all_succeeded());
    for original in &originals {
        assert!(original.exists(), "{} missing", original.display());
        assert_eq!(fs::read(original).unwrap(), b"payload");
    }
}

#[test]
fn deeply_nested_duplicates_are_found() {
    let dir = TempDir::new().unwrap();
    let mut deep = dir.path().to_path_buf();
    for i in 0..15 {
        deep = deep.join(format!("level_{i}"));
    }
    fs::create_dir_all(&deep).unwrap();
    let mut f = File::create(deep.join("deep.txt")).unwrap();
    f.write_all(b"deep content").unwrap();
    write_file(dir.path(), "shallow.txt", b"deep content");

    let narrowed = narrow_default(dir.path());
    assert_eq!(narrowed.groups.len(), 1);
    assert_eq!(narrowed.groups[0].len(), 2);
}

#[test]
fn over_long_relative_paths_are_skipped_not_truncated() {
    let dir = TempDir::new().unwrap();
    let mut deep_rel = String::new();
    for i in 0..25 {
        if i > 0 {
            deep_rel.push('/');
        }
        deep_rel.push_str(&format!("very-long-directory-name-{i:02}"));
    }
    let deep = write_file(dir.path(), &format!("{deep_rel}/a.txt"), b"payload");
    let shallow = write_file(dir.path(), "b.txt", b"payload");

    let narrowed = narrow_default(dir.path());
    assert_eq!(narrowed.groups.len(), 1);

    let outcome = move_duplicates(dir.path(), all_records(&narrowed.groups)).unwrap();
    // The deep file cannot be encoded within the filename limit: it is
    // reported and left exactly where it was.
    assert_eq!(outcome.failure_count(), 1);
    assert_eq!(outcome.success_count(), 1);
    assert!(deep.exists());
    assert!(!shallow.exists());
}

#[test]
fn duplicate_content_with_different_names_and_times_matches_by_default() {
    let dir = TempDir::new().unwrap();
    let a = write_file(dir.path(), "left.bin", b"same bytes everywhere");
    let b = write_file(dir.path(), "right.bin", b"same bytes everywhere");
    filetime::set_file_mtime(&a, filetime::FileTime::from_unix_time(1_500_000_000, 0)).unwrap();
    filetime::set_file_mtime(&b, filetime::FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

    // Default criteria are size + checksum; names and times don't matter.
    let narrowed = narrow_default(dir.path());
    assert_eq!(narrowed.groups.len(), 1);
}

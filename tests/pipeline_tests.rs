//! End-to-end tests of the index -> narrow pipeline.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use dupsweep::duplicates::{CandidateFilter, Criterion, CriterionSet};
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

fn narrow(root: &Path, criteria: &[Criterion]) -> dupsweep::duplicates::Narrowed {
    let indexed = Indexer::new(root, IndexerConfig::default()).index().unwrap();
    let filter = CandidateFilter::new(
        CriterionSet::from_criteria(criteria.iter().copied()),
        Prober::new(ProberConfig::default()),
    );
    filter.narrow(indexed.records).unwrap()
}

#[test]
fn finds_exact_duplicates_across_subdirectories() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.txt", b"shared payload");
    write_file(dir.path(), "sub/b.txt", b"shared payload");
    write_file(dir.path(), "sub/deeper/c.txt", b"shared payload");
    write_file(dir.path(), "unique.txt", b"different payload!!");

    let narrowed = narrow(dir.path(), &[Criterion::Size, Criterion::Checksum]);

    assert_eq!(narrowed.groups.len(), 1);
    assert_eq!(narrowed.groups[0].len(), 3);
}

#[test]
fn distinct_sizes_never_share_a_group() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "one.bin", b"1");
    write_file(dir.path(), "two.bin", b"22");
    write_file(dir.path(), "three.bin", b"333");

    let narrowed = narrow(dir.path(), &[Criterion::Size]);
    assert!(narrowed.is_empty());
}

#[test]
fn size_groups_then_checksum_splits_master_is_first_indexed() {
    let dir = TempDir::new().unwrap();
    // A and B identical content at different paths, C different content,
    // same size as A. Sorted walk order: a.dat, b.dat, c.dat.
    let a = write_file(dir.path(), "a.dat", b"identical-bytes");
    let b = write_file(dir.path(), "b.dat", b"identical-bytes");
    write_file(dir.path(), "c.dat", b"different-bytes");

    let by_size = narrow(dir.path(), &[Criterion::Size]);
    assert_eq!(by_size.groups.len(), 1);
    assert_eq!(by_size.groups[0].len(), 3);

    let narrowed = narrow(dir.path(), &[Criterion::Size, Criterion::Checksum]);
    assert_eq!(narrowed.groups.len(), 1);
    let group = &narrowed.groups[0];
    assert_eq!(group.len(), 2);
    assert_eq!(group.master().path, a);
    assert_eq!(group.extras().len(), 1);
    assert_eq!(group.extras()[0].path, b);
}

#[test]
fn headtail_collision_resolved_by_checksum() {
    let dir = TempDir::new().unwrap();
    // Same size, same first and last 10 bytes, different middle.
    let mut content_a = Vec::new();
    content_a.extend_from_slice(b"SAME-HEAD!");
    content_a.extend_from_slice(&[0u8; 1004]);
    content_a.extend_from_slice(b"SAME-TAIL!");
    let mut content_b = content_a.clone();
    content_b[512] = 0xFF;
    assert_eq!(content_a.len(), 1024);

    write_file(dir.path(), "a.bin", &content_a);
    write_file(dir.path(), "b.bin", &content_b);

    let by_headtail = narrow(dir.path(), &[Criterion::Size, Criterion::HeadTail]);
    assert_eq!(by_headtail.groups.len(), 1, "headtail alone wrongly groups");

    let by_checksum = narrow(
        dir.path(),
        &[Criterion::Size, Criterion::HeadTail, Criterion::Checksum],
    );
    assert!(by_checksum.is_empty(), "checksum must split them apart");
}

#[test]
fn name_and_extension_criteria_combine_as_intersection() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "report.pdf", b"a");
    write_file(dir.path(), "sub/report.pdf", b"bb");
    write_file(dir.path(), "report.txt", b"c");
    write_file(dir.path(), "other.pdf", b"d");

    // Name alone: both report.pdf files plus report.txt share "report".
    let by_name = narrow(dir.path(), &[Criterion::Name]);
    assert_eq!(by_name.groups.len(), 1);
    assert_eq!(by_name.groups[0].len(), 3);

    // Name + extension: only the two report.pdf files agree on both.
    let by_both = narrow(dir.path(), &[Criterion::Name, Criterion::Extension]);
    assert_eq!(by_both.groups.len(), 1);
    assert_eq!(by_both.groups[0].len(), 2);
}

#[test]
fn extension_matching_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "photo1.JPG", b"xx");
    write_file(dir.path(), "photo2.jpg", b"yyyy");

    let narrowed = narrow(dir.path(), &[Criterion::Extension]);
    assert_eq!(narrowed.groups.len(), 1);
    assert_eq!(narrowed.groups[0].len(), 2);
}

#[test]
fn no_extension_does_not_match_empty_extension() {
    let dir = TempDir::new().unwrap();
    // "Makefile" has no extension; "dump." has an empty one.
    write_file(dir.path(), "Makefile", b"xx");
    write_file(dir.path(), "dump.", b"yy");

    let narrowed = narrow(dir.path(), &[Criterion::Extension]);
    assert!(narrowed.is_empty());
}

#[test]
fn master_selection_is_deterministic_across_runs() {
    let dir = TempDir::new().unwrap();
    for name in ["m.dat", "n.dat", "o.dat"] {
        write_file(dir.path(), name, b"same content here");
    }

    let first = narrow(dir.path(), &[Criterion::Size, Criterion::Checksum]);
    let second = narrow(dir.path(), &[Criterion::Size, Criterion::Checksum]);

    assert_eq!(
        first.groups[0].master().path,
        second.groups[0].master().path
    );
    let extras_first: Vec<_> = first.groups[0].extras().iter().map(|r| &r.path).collect();
    let extras_second: Vec<_> = second.groups[0].extras().iter().map(|r| &r.path).collect();
    assert_eq!(extras_first, extras_second);
}

#[test]
fn depth_bound_excludes_deeper_duplicates() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "top1.txt", b"payload");
    write_file(dir.path(), "top2.txt", b"payload");
    write_file(dir.path(), "deep/nested/top3.txt", b"payload");

    let indexed = Indexer::new(
        dir.path(),
        IndexerConfig::default().with_max_depth(Some(1)),
    )
    .index()
    .unwrap();
    let filter = CandidateFilter::new(
        CriterionSet::default_set(),
        Prober::new(ProberConfig::default()),
    );
    let narrowed = filter.narrow(indexed.records).unwrap();

    assert_eq!(narrowed.groups.len(), 1);
    assert_eq!(narrowed.groups[0].len(), 2);
}

#[test]
fn modtime_matching_is_exact() {
    let dir = TempDir::new().unwrap();
    let a = write_file(dir.path(), "a.log", b"same");
    let b = write_file(dir.path(), "b.log", b"same");

    filetime::set_file_mtime(&a, filetime::FileTime::from_unix_time(1_700_000_000, 0)).unwrap();
    filetime::set_file_mtime(&b, filetime::FileTime::from_unix_time(1_700_000_000, 500)).unwrap();

    // Half a microsecond apart: not bit-identical, no match.
    let narrowed = narrow(dir.path(), &[Criterion::ModTime]);
    assert!(narrowed.is_empty());
}

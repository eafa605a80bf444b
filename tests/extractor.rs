//! Listing, extraction and verification against the filesystem.

use std::path::Path;

use runtar::{Load, LocalFileLoader, TarExtractor, Verification};
use similar_asserts::assert_eq;

const IN_TEXT: &str = "abc";
const OUT_TEXT: &str = "xy";

fn create_tar(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut data = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut data);
        for (path, content) in files {
            let mut header = tar::Header::new_ustar();
            header.set_mode(0o644);
            header.set_size(content.len() as u64);
            header.set_entry_type(tar::EntryType::Regular);
            builder.append_data(&mut header, path, *content).unwrap();
        }
        builder.finish().unwrap();
    }
    data
}

fn scenario_tar() -> Vec<u8> {
    create_tar(&[
        ("temp.in.txt", IN_TEXT.as_bytes()),
        ("temp.out.txt", OUT_TEXT.as_bytes()),
    ])
}

#[test]
fn test_list_entries() {
    let extractor = TarExtractor::new(scenario_tar());
    let entries = extractor.list_entries().unwrap();

    let listing: Vec<_> = entries
        .iter()
        .map(|e| format!("{} {} {} {}", e.file_name, e.size, e.offset, e.span))
        .collect();
    assert_eq!(
        listing,
        vec![
            "temp.in.txt 3 0 1024".to_string(),
            "temp.out.txt 2 1024 1024".to_string(),
        ]
    );
    assert_eq!(extractor.data().len(), 3072);
}

#[test]
fn test_extract_to_memory() {
    let extractor = TarExtractor::new(scenario_tar());
    let entries = extractor.list_entries().unwrap();

    let second = extractor.extract_to_memory(&entries[1]).unwrap();
    assert_eq!(String::from_utf8(second).unwrap().as_str(), OUT_TEXT);
    let first = extractor.extract_to_memory(&entries[0]).unwrap();
    assert_eq!(String::from_utf8(first).unwrap().as_str(), IN_TEXT);
}

#[test]
fn test_extract_to_memory_rejects_stale_entry() {
    let extractor = TarExtractor::new(scenario_tar());
    let mut entry = extractor.list_entries().unwrap().remove(0);
    entry.file_name = "renamed.txt".to_string();
    assert!(extractor.extract_to_memory(&entry).is_err());

    entry.offset = 100;
    assert!(extractor.extract_to_memory(&entry).is_err());
}

#[tokio::test]
async fn test_extract_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let extractor = TarExtractor::new(create_tar(&[
        ("nested/deeper/file.txt", b"nested content"),
        ("empty.txt", b""),
    ]));

    for entry in extractor.list_entries().unwrap() {
        assert!(entry.is_safe_path());
        extractor
            .extract_to_file(&entry, &dir.path().join(&entry.file_name))
            .await
            .unwrap();
    }

    let nested = std::fs::read_to_string(dir.path().join("nested/deeper/file.txt")).unwrap();
    assert_eq!(nested.as_str(), "nested content");
    assert_eq!(std::fs::read(dir.path().join("empty.txt")).unwrap().len(), 0);
}

#[tokio::test]
async fn test_verify_entries() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("temp.in.txt"), IN_TEXT).unwrap();
    std::fs::write(dir.path().join("temp.out.txt"), OUT_TEXT).unwrap();

    let extractor = TarExtractor::new(scenario_tar());
    let entries = extractor.list_entries().unwrap();

    for entry in &entries {
        let path = dir.path().join(&entry.file_name);
        assert_eq!(
            extractor.verify_entry(entry, &path).await.unwrap(),
            Verification::Match
        );
    }

    std::fs::write(dir.path().join("temp.out.txt"), "xz").unwrap();
    assert_eq!(
        extractor
            .verify_entry(&entries[1], &dir.path().join("temp.out.txt"))
            .await
            .unwrap(),
        Verification::ContentMismatch { offset: 1 }
    );

    std::fs::write(dir.path().join("temp.in.txt"), "abcd").unwrap();
    assert_eq!(
        extractor
            .verify_entry(&entries[0], &dir.path().join("temp.in.txt"))
            .await
            .unwrap(),
        Verification::SizeMismatch {
            archived: 3,
            on_disk: 4
        }
    );

    assert_eq!(
        extractor
            .verify_entry(&entries[0], &dir.path().join("absent.txt"))
            .await
            .unwrap(),
        Verification::Missing
    );
}

#[tokio::test]
async fn test_verify_skips_unsafe_names() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("out");
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(root.path().join("temp.in.txt"), IN_TEXT).unwrap();

    let extractor = TarExtractor::new(scenario_tar());
    let mut entry = extractor.list_entries().unwrap().remove(0);

    for name in ["../temp.in.txt", "/etc/passwd", "out/../../temp.in.txt"] {
        entry.file_name = name.to_string();
        assert_eq!(
            extractor.verify_entry_in(&entry, &dir).await.unwrap(),
            Verification::UnsafePath
        );
    }

    entry.file_name = "temp.in.txt".to_string();
    std::fs::write(dir.join("temp.in.txt"), IN_TEXT).unwrap();
    assert_eq!(
        extractor.verify_entry_in(&entry, &dir).await.unwrap(),
        Verification::Match
    );
}

#[tokio::test]
async fn test_stale_entry_rejected_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("renamed.txt"), IN_TEXT).unwrap();

    let extractor = TarExtractor::new(scenario_tar());
    let mut entry = extractor.list_entries().unwrap().remove(0);
    entry.file_name = "renamed.txt".to_string();

    assert!(extractor.extract_to_memory(&entry).is_err());
    assert!(extractor.extract_to_stdout(&entry).await.is_err());
    assert!(
        extractor
            .verify_entry(&entry, &dir.path().join("renamed.txt"))
            .await
            .is_err()
    );
    assert!(extractor.verify_entry_in(&entry, dir.path()).await.is_err());
}

#[tokio::test]
async fn test_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foo.tar");
    std::fs::write(&path, scenario_tar()).unwrap();

    let loader = LocalFileLoader::new(Path::new(&path)).unwrap();
    assert_eq!(loader.source(), path.display().to_string().as_str());

    let extractor = TarExtractor::new(loader.load().await.unwrap());
    let names: Vec<_> = extractor
        .list_entries()
        .unwrap()
        .into_iter()
        .map(|e| e.file_name)
        .collect();
    assert_eq!(names, vec!["temp.in.txt".to_string(), "temp.out.txt".to_string()]);
}

//! End-to-end behaviour of import tasks: format sniffing, reader selection,
//! entry access and source cleanup.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use bytes::BytesMut;
use zip::write::SimpleFileOptions;

use archive_import::archive::MemoryForm;
use archive_import::{DeletePolicy, ImportError, ImportSource, ImportTask, ReaderKind};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x10";

fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, contents) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    fs::write(path, zip_bytes(entries)).unwrap();
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

#[test]
fn test_zip_named_osz_resolves_to_zip_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.osz");
    write_zip(
        &path,
        &[
            ("audio.mp3", b"ID3\x04"),
            ("beatmap.osu", b"osu file format v14"),
        ],
    );

    let mut task = ImportTask::from_path(&path);
    let mut reader = task.get_reader().unwrap();

    assert_eq!(reader.kind(), ReaderKind::Zip);
    assert_eq!(reader.name(), "song.osz");
    let entries = reader.entries().unwrap();
    assert!(entries.contains(&"audio.mp3".to_string()));
    assert!(entries.contains(&"beatmap.osu".to_string()));
    assert_eq!(reader.read_entry("beatmap.osu").unwrap(), b"osu file format v14");
}

#[test]
fn test_sniffing_ignores_extension() {
    let dir = tempfile::tempdir().unwrap();

    let disguised = dir.path().join("skin.txt");
    write_zip(&disguised, &[("skin.ini", b"[General]")]);
    let mut task = ImportTask::from_path(&disguised);
    assert_eq!(task.get_reader().unwrap().kind(), ReaderKind::Zip);

    let fake = dir.path().join("not-really.zip");
    fs::write(&fake, b"plain text").unwrap();
    let mut task = ImportTask::from_path(&fake);
    let reader = task.get_reader().unwrap();
    assert_eq!(reader.kind(), ReaderKind::SingleFile);
    assert_eq!(reader.entries().unwrap(), vec!["not-really.zip"]);
}

#[test]
fn test_directory_lists_all_files_recursively() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("123 Artist - Title");
    fs::create_dir_all(root.join("sb").join("layer")).unwrap();
    fs::write(root.join("beatmap.osu"), b"v14").unwrap();
    fs::write(root.join("sb").join("bg.png"), PNG_BYTES).unwrap();
    fs::write(root.join("sb").join("layer").join("fg.png"), PNG_BYTES).unwrap();

    let mut task = ImportTask::from_path(&root);
    let mut reader = task.get_reader().unwrap();

    assert_eq!(reader.kind(), ReaderKind::Directory);
    assert_eq!(reader.name(), "123 Artist - Title");
    assert_eq!(
        sorted(reader.entries().unwrap()),
        vec!["beatmap.osu", "sb/bg.png", "sb/layer/fg.png"]
    );
    assert_eq!(reader.read_entry("sb/layer/fg.png").unwrap(), PNG_BYTES);
}

#[test]
fn test_single_file_has_one_entry_named_after_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replay.osr");
    fs::write(&path, b"replay data").unwrap();

    let mut task = ImportTask::from_path(&path);
    let mut reader = task.get_reader().unwrap();

    assert_eq!(reader.kind(), ReaderKind::SingleFile);
    assert_eq!(reader.entries().unwrap(), vec!["replay.osr"]);
    assert_eq!(reader.read_entry("replay.osr").unwrap(), b"replay data");
}

#[test]
fn test_misnamed_buffer_round_trips() {
    let mut task = ImportTask::from_buffer(BytesMut::from(PNG_BYTES), "cover.jpg");
    let mut reader = task.get_reader().unwrap();

    assert_eq!(reader.kind(), ReaderKind::Memory(MemoryForm::Buffer));
    assert_eq!(reader.entries().unwrap(), vec!["cover.jpg"]);

    let mut content = Vec::new();
    reader
        .open_entry("cover.jpg")
        .unwrap()
        .read_to_end(&mut content)
        .unwrap();
    assert_eq!(content, PNG_BYTES);
}

#[test]
fn test_zip_buffer_resolves_to_zip_reader() {
    let data = zip_bytes(&[("beatmap.osu", b"v14"), ("audio.mp3", b"ID3")]);
    let mut task = ImportTask::from_source(
        ImportSource::Buffer(BytesMut::from(&data[..])),
        "downloaded.osz",
    );

    let mut reader = task.get_reader().unwrap();
    assert_eq!(reader.kind(), ReaderKind::Zip);
    assert_eq!(reader.name(), "downloaded.osz");
    assert_eq!(sorted(reader.entries().unwrap()), vec!["audio.mp3", "beatmap.osu"]);
    assert_eq!(reader.read_entry("audio.mp3").unwrap(), b"ID3");

    // Readers are re-derived on every call
    let again = task.get_reader().unwrap();
    assert_eq!(again.entries().unwrap().len(), 2);
}

#[test]
fn test_plain_stream_is_materialized_into_byte_array() {
    let mut task = ImportTask::from_stream(Cursor::new(PNG_BYTES.to_vec()), "cover.png");
    let mut reader = task.get_reader().unwrap();

    assert_eq!(reader.kind(), ReaderKind::Memory(MemoryForm::ByteArray));
    assert_eq!(reader.read_entry("cover.png").unwrap(), PNG_BYTES);
}

#[test]
fn test_missing_path_is_invalid_format() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.osz");

    let mut task = ImportTask::from_path(&missing);
    let err = task.get_reader().err().unwrap();

    assert!(matches!(err, ImportError::InvalidFormat { .. }));
    assert_eq!(err.to_string(), format!("{} is not a valid archive", missing.display()));
}

#[test]
fn test_missing_entry_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.osz");
    write_zip(&path, &[("beatmap.osu", b"v14")]);

    let mut task = ImportTask::from_path(&path);
    let mut reader = task.get_reader().unwrap();
    let err = reader.open_entry("audio.mp3").err().unwrap();
    assert!(matches!(err, ImportError::EntryNotFound { ref entry, .. } if entry == "audio.mp3"));
}

#[test]
fn test_corrupt_zip_surfaces_zip_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.osz");
    fs::write(&path, b"PK\x03\x04truncated").unwrap();

    let mut task = ImportTask::from_path(&path);
    assert!(matches!(task.get_reader().err(), Some(ImportError::Zip { .. })));
}

#[test]
fn test_delete_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.osz");
    write_zip(&path, &[("beatmap.osu", b"v14")]);

    let task = ImportTask::from_path(&path);
    task.delete_file().unwrap();
    assert!(!path.exists());
    task.delete_file().unwrap();
}

#[test]
fn test_retained_task_keeps_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.osz");
    write_zip(&path, &[("beatmap.osu", b"v14")]);

    let task = ImportTask::from_path(&path).with_delete_policy(DeletePolicy::Retain);
    task.delete_file().unwrap();
    assert!(path.exists());
}

#[test]
fn test_task_display_is_base_name() {
    assert_eq!(ImportTask::from_path("/tmp/song.osz").to_string(), "song.osz");
    let task = ImportTask::from_stream(std::io::empty(), "nested/cover.jpg");
    assert_eq!(task.to_string(), "cover.jpg");
}

#[test]
fn test_reader_close_is_idempotent_for_every_kind() {
    let dir = tempfile::tempdir().unwrap();
    let zip_path = dir.path().join("song.osz");
    write_zip(&zip_path, &[("beatmap.osu", b"v14")]);
    let file_path = dir.path().join("replay.osr");
    fs::write(&file_path, b"r").unwrap();

    let mut tasks = vec![
        ImportTask::from_path(&zip_path),
        ImportTask::from_path(dir.path()),
        ImportTask::from_path(&file_path),
        ImportTask::from_buffer(BytesMut::from(&b"x"[..]), "x.bin"),
    ];

    for task in &mut tasks {
        let mut reader = task.get_reader().unwrap();
        reader.close();
        reader.close();
        assert!(matches!(reader.entries(), Err(ImportError::Closed { .. })));
    }
}

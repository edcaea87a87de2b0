use std::fs;
use std::path::Path;

use super::*;

fn make_test_store() -> RecordStore {
    let mut store = RecordStore::new();
    store.update_row(INDEPPAIR, "今日", |row| row.set_text(0, "京"));
    store.update_row(CAND_HISTORY, "きょう", |row| {
        row.set_text(0, "今日");
        row.set_text(1, "京");
    });
    store.update_row(OCHAIRE, "きょうは", |row| {
        row.set_int(0, 2);
        row.set_int(1, 3);
        row.set_text(2, "今日");
        row.set_int(3, 1);
        row.set_text(4, "は");
    });
    store
}

#[test]
fn test_row_values() {
    let store = make_test_store();
    let row = store.row(OCHAIRE, "きょうは").unwrap();
    assert_eq!(row.int(0), Some(2));
    assert_eq!(row.text(2), Some("今日"));
    assert_eq!(row.text(0), None);
    assert_eq!(row.int(9), None);
    assert_eq!(store.row(INDEPPAIR, "今日").unwrap().text(0), Some("京"));
    assert!(store.row(INDEPPAIR, "明日").is_none());
    assert!(store.row("NOPE", "今日").is_none());
}

#[test]
fn test_set_past_end_pads() {
    let mut store = RecordStore::new();
    store.update_row(PREDICTION, "あ", |row| row.set_text(3, "亜"));
    let row = store.row(PREDICTION, "あ").unwrap();
    assert_eq!(row.len(), 4);
    assert_eq!(row.values()[0], Value::Empty);
}

#[test]
fn test_truncate_section_keeps_recent() {
    let mut store = RecordStore::new();
    for i in 0..5 {
        store.update_row(INDEPPAIR, &format!("k{i}"), |row| row.set_int(0, i));
    }
    // k0 becomes the most recently used
    assert!(store.touch(INDEPPAIR, "k0"));
    store.truncate_section(INDEPPAIR, 2);
    let sec = store.section(INDEPPAIR).unwrap();
    assert_eq!(sec.len(), 2);
    assert!(sec.row("k0").is_some());
    assert!(sec.row("k4").is_some());
}

#[test]
fn test_touch_missing_row() {
    let mut store = RecordStore::new();
    assert!(!store.touch(INDEPPAIR, "none"));
    assert!(store.pending().is_empty());
}

#[test]
fn test_longest_prefix() {
    let mut store = RecordStore::new();
    store.update_row(OCHAIRE, "きょう", |row| row.set_int(0, 1));
    store.update_row(OCHAIRE, "きょうは", |row| row.set_int(0, 2));
    let text: Vec<char> = "きょうはいい".chars().collect();
    let sec = store.section(OCHAIRE).unwrap();
    let (key, row) = sec.longest_prefix(&text, 32).unwrap();
    assert_eq!(key, "きょうは");
    assert_eq!(row.int(0), Some(2));
    let (key, _) = sec.longest_prefix(&text, 3).unwrap();
    assert_eq!(key, "きょう");
    assert!(sec.longest_prefix(&text[1..], 32).is_none());
}

#[test]
fn test_with_prefix() {
    let mut store = RecordStore::new();
    for key in ["か", "かな", "かんじ", "き"] {
        store.update_row(PREDICTION, key, |row| row.set_int(0, 1));
    }
    let sec = store.section(PREDICTION).unwrap();
    let keys: Vec<&str> = sec.with_prefix("か").map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["か", "かな", "かんじ"]);
}

#[test]
fn test_release_and_remove() {
    let mut store = make_test_store();
    assert!(store.remove_row(INDEPPAIR, "今日"));
    assert!(!store.remove_row(INDEPPAIR, "今日"));
    store.release_section(CAND_HISTORY);
    assert!(store.section(CAND_HISTORY).is_none());
    let names: Vec<&str> = store.section_names().collect();
    assert_eq!(names, vec![INDEPPAIR, OCHAIRE]);
}

#[test]
fn test_serialize_roundtrip() {
    let store = make_test_store();
    let bytes = store.to_bytes().unwrap();
    assert_eq!(&bytes[..4], b"HKLR");
    let restored = RecordStore::from_bytes(&bytes).unwrap();
    assert_eq!(restored.sections, store.sections);
    assert_eq!(restored.clock, store.clock);
}

#[test]
fn test_open_nonexistent() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(&dir.path().join("none.hklr")).unwrap();
    assert!(store.section(INDEPPAIR).is_none());
}

#[test]
fn test_bad_header() {
    assert!(RecordStore::from_bytes(b"HK").is_err());
    assert!(RecordStore::from_bytes(b"HKDX\x01").is_err());
}

#[test]
fn test_save_to_invalid_path() {
    let store = make_test_store();
    assert!(store.save(Path::new("/dev/null/sub/learning.hklr")).is_err());
}

// ---------------------------------------------------------------------------
// WAL tests
// ---------------------------------------------------------------------------

#[test]
fn test_flush_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learning.hklr");

    let mut store = RecordStore::open(&path).unwrap();
    store.update_row(INDEPPAIR, "今日", |row| row.set_text(0, "京"));
    store.flush().unwrap();
    assert!(store.pending().is_empty());
    store.update_row(EXPANDPAIR, "きょ", |row| row.set_text(0, "きょう"));
    store.remove_row(INDEPPAIR, "今日");
    store.flush().unwrap();

    let reopened = RecordStore::open(&path).unwrap();
    assert!(reopened.row(INDEPPAIR, "今日").is_none());
    assert_eq!(reopened.row(EXPANDPAIR, "きょ").unwrap().text(0), Some("きょう"));
    assert_eq!(reopened.clock, store.clock);
}

#[test]
fn test_memory_store_flush_drops_ops() {
    let mut store = make_test_store();
    assert!(!store.pending().is_empty());
    store.flush().unwrap();
    assert!(store.pending().is_empty());
    assert!(store.row(INDEPPAIR, "今日").is_some());
}

#[test]
fn test_checkpoint_truncates_wal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learning.hklr");

    let mut store = RecordStore::open(&path).unwrap();
    store.update_row(CAND_HISTORY, "はし", |row| row.set_text(0, "橋"));
    store.flush().unwrap();
    store.checkpoint().unwrap();
    assert!(path.exists(), "snapshot should exist");
    let wal = RecordWal::new(&path);
    assert_eq!(fs::read(wal.wal_path()).unwrap().len(), 0, "WAL should be empty");

    let reopened = RecordStore::open(&path).unwrap();
    assert_eq!(reopened.row(CAND_HISTORY, "はし").unwrap().text(0), Some("橋"));
}

#[test]
fn test_wal_truncated_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learning.hklr");

    let mut wal = RecordWal::new(&path);
    let mut source = RecordStore::new();
    source.update_row(INDEPPAIR, "今日", |row| row.set_text(0, "京"));
    wal.append(source.pending()).unwrap();
    source.flush().unwrap();
    source.update_row(INDEPPAIR, "明日", |row| row.set_text(0, "あした"));
    wal.append(source.pending()).unwrap();
    assert_eq!(wal.frame_count(), 2);

    let data = fs::read(wal.wal_path()).unwrap();
    fs::write(wal.wal_path(), &data[..data.len() - 5]).unwrap();

    let mut store = RecordStore::new();
    let count = RecordWal::new(&path).replay(&mut store).unwrap();
    assert_eq!(count, 1);
    assert!(store.row(INDEPPAIR, "今日").is_some());
    assert!(store.row(INDEPPAIR, "明日").is_none());
}

#[test]
fn test_wal_corrupt_crc() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learning.hklr");

    let mut wal = RecordWal::new(&path);
    let mut source = make_test_store();
    wal.append(source.pending()).unwrap();
    source.flush().unwrap();

    let mut data = fs::read(wal.wal_path()).unwrap();
    data[4] ^= 0xFF;
    fs::write(wal.wal_path(), &data).unwrap();

    let mut store = RecordStore::new();
    assert_eq!(RecordWal::new(&path).replay(&mut store).unwrap(), 0);
    assert!(store.section(INDEPPAIR).is_none());
}

#[test]
fn test_wal_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learning.hklr");
    let wal = RecordWal::new(&path);
    fs::write(wal.wal_path(), b"").unwrap();

    let store = RecordStore::open(&path).unwrap();
    assert!(store.section_names().next().is_none());
}

use super::*;

fn entry(offset: u64) -> IndexEntry {
    IndexEntry {
        segment_id: Uuid::new_v4(),
        offset,
        timestamp: 1_700_000_000,
    }
}

#[test]
fn set_then_get() {
    let mut idx = Index::new();
    let e = entry(0);
    idx.set(b"k".to_vec(), e);
    assert_eq!(idx.get(b"k"), Some(&e));
    assert_eq!(idx.len(), 1);
}

#[test]
fn get_missing_key_is_none() {
    let idx = Index::new();
    assert!(idx.get(b"nope").is_none());
}

#[test]
fn set_replaces_existing_entry() {
    let mut idx = Index::new();
    idx.set(b"k".to_vec(), entry(0));
    let newer = entry(128);
    idx.set(b"k".to_vec(), newer);
    assert_eq!(idx.get(b"k"), Some(&newer));
    assert_eq!(idx.len(), 1);
}

#[test]
fn delete_removes_key() {
    let mut idx = Index::new();
    idx.set(b"k".to_vec(), entry(0));
    idx.delete(b"k");
    assert!(idx.get(b"k").is_none());
    assert!(idx.is_empty());
}

#[test]
fn delete_absent_key_is_idempotent() {
    let mut idx = Index::new();
    idx.delete(b"never-written");
    idx.delete(b"never-written");
    assert!(idx.is_empty());
}

#[test]
fn keys_snapshot_is_detached() {
    let mut idx = Index::new();
    idx.set(b"a".to_vec(), entry(0));
    idx.set(b"b".to_vec(), entry(30));

    let mut keys = idx.keys();
    keys.sort();
    assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);

    // Mutating the index does not touch the snapshot.
    idx.delete(b"a");
    assert_eq!(keys.len(), 2);
    assert_eq!(idx.len(), 1);
}

#[test]
fn keys_compare_by_byte_content() {
    let mut idx = Index::new();
    idx.set(vec![0, 159, 146, 150], entry(0)); // arbitrary non-utf8 bytes
    assert!(idx.get(&[0, 159, 146, 150]).is_some());
    assert!(idx.get(&[0, 159, 146]).is_none());
}

use super::*;
use serde_json::json;

fn shared(mem: &MemoryStorage) -> SharedStorage { Arc::new(mem.clone()) }

#[test]
fn test_memory_storage_set_get_remove() {
    let mem = MemoryStorage::new();
    mem.set("a", "1").unwrap();
    assert_eq!(mem.get("a").unwrap().as_deref(), Some("1"));
    assert!(mem.remove("a").unwrap());
    assert!(!mem.remove("a").unwrap());
    assert!(mem.is_empty());
}

#[test]
fn test_unavailable_memory_storage_fails_every_call() {
    let mem = MemoryStorage::new();
    mem.set("a", "1").unwrap();
    mem.set_available(false);
    assert!(matches!(mem.get("a"), Err(StorageError::Unavailable(_))));
    assert!(matches!(mem.set("b", "2"), Err(StorageError::Unavailable(_))));
    assert!(!is_available(&mem));
    mem.set_available(true);
    assert!(is_available(&mem));
    // check key does not linger
    assert_eq!(mem.keys().unwrap(), vec!["a".to_string()]);
}

#[test]
fn test_managed_namespace_quotes_strings_and_prefixes_keys() {
    let mem = MemoryStorage::new();
    let ns = Namespace::managed(shared(&mem), "digital_menu_");
    ns.set_str("access_token", "h.p.s").unwrap();
    assert_eq!(mem.get("digital_menu_access_token").unwrap().as_deref(), Some("\"h.p.s\""));
    assert_eq!(ns.get_str("access_token").unwrap().as_deref(), Some("h.p.s"));

    let legacy = Namespace::legacy(shared(&mem));
    legacy.set_str("access_token", "h.p.s").unwrap();
    assert_eq!(mem.get("access_token").unwrap().as_deref(), Some("h.p.s"));
}

#[test]
fn test_managed_clear_leaves_legacy_keys() {
    let mem = MemoryStorage::new();
    let managed = Namespace::managed(shared(&mem), "p_");
    let legacy = Namespace::legacy(shared(&mem));
    managed.set_json("user", &json!({"id": 1})).unwrap();
    managed.set_str("access_token", "t").unwrap();
    legacy.set_str("access_token", "t").unwrap();
    assert_eq!(managed.clear().unwrap(), 2);
    assert_eq!(legacy.clear().unwrap(), 0);
    assert_eq!(legacy.get_str("access_token").unwrap().as_deref(), Some("t"));
}

#[test]
fn test_backup_and_restore_roundtrip() {
    let mem = MemoryStorage::new();
    let managed = Namespace::managed(shared(&mem), "p_");
    managed.set_str("theme", "dark").unwrap();
    managed.set_json("settings", &json!({"id": 7})).unwrap();
    assert_eq!(managed.backup(&[]).unwrap(), 2);
    managed.remove_all(&["theme", "settings"]).unwrap();
    assert!(managed.get_str("theme").unwrap().is_none());
    assert!(managed.restore_backup().unwrap());
    assert_eq!(managed.get_str("theme").unwrap().as_deref(), Some("dark"));
    assert_eq!(managed.get_json::<serde_json::Value>("settings").unwrap().unwrap()["id"], 7);
}

#[test]
fn test_backup_skips_listed_keys() {
    let mem = MemoryStorage::new();
    let managed = Namespace::managed(shared(&mem), "p_");
    managed.set_str("access_token", "tok").unwrap();
    managed.set_str("theme", "dark").unwrap();
    assert_eq!(managed.backup(&["access_token"]).unwrap(), 1);
    managed.remove("access_token").unwrap();
    assert!(managed.restore_backup().unwrap());
    assert!(managed.get_str("access_token").unwrap().is_none());
    assert_eq!(managed.get_str("theme").unwrap().as_deref(), Some("dark"));
}

#[test]
fn test_migrate_legacy_keys_moves_and_encodes() {
    let mem = MemoryStorage::new();
    mem.set("access_token", "a.b.c").unwrap();
    mem.set("user", r#"{"id":3}"#).unwrap();
    let managed = Namespace::managed(shared(&mem), "p_");
    let moved = managed.migrate_legacy_keys(&["access_token", "user", "token"]).unwrap();
    assert_eq!(moved, vec!["access_token".to_string(), "user".to_string()]);
    assert!(mem.get("access_token").unwrap().is_none());
    assert_eq!(managed.get_str("access_token").unwrap().as_deref(), Some("a.b.c"));
    assert_eq!(mem.get("p_user").unwrap().as_deref(), Some(r#"{"id":3}"#));
}

#[test]
fn test_file_storage_persists_across_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("storage.json");
    {
        let fs = FileStorage::open(&path).unwrap();
        fs.set("access_token", "x.y.z").unwrap();
        fs.set("p_user", "{}").unwrap();
        assert_eq!(fs.remove_prefix("p_").unwrap(), 1);
    }
    let fs = FileStorage::open(&path).unwrap();
    assert_eq!(fs.get("access_token").unwrap().as_deref(), Some("x.y.z"));
    assert!(fs.get("p_user").unwrap().is_none());
}

#[test]
fn test_file_storage_recovers_from_corrupt_document() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("storage.json");
    std::fs::write(&path, b"{not json").unwrap();
    let fs = FileStorage::open(&path).unwrap();
    assert!(fs.keys().unwrap().is_empty());
    assert!(tmp.path().join("storage.corrupt").exists());
}

//! End-to-end flows across the file store, the app coordinator, and the
//! vault state machine.

use docvault_core::app::DocVault;
use docvault_core::storage::{JsonFileStore, KvStore, MemoryStore};
use docvault_core::vault::{decrypt_collection, encrypt_collection, VaultHandle};
use docvault_core::{DocumentCollection, VaultError};
use tempfile::tempdir;

#[test]
fn full_session_on_disk() {
    let dir = tempdir().unwrap();

    {
        let store = JsonFileStore::open(dir.path()).unwrap();
        let mut app = DocVault::setup(store, "Ada", Some("hunter2")).unwrap();
        app.normal_create("Shopping", "milk, eggs").unwrap();
        app.unlock_vault("hunter2").unwrap();
        app.vault_create("Passwords", "not these ones").unwrap();
        app.vault_create("Diary", "dear diary").unwrap();
        app.lock_vault();
    }

    // A fresh process sees the same records.
    let store = JsonFileStore::open(dir.path()).unwrap();
    let mut app = DocVault::load(store).unwrap().unwrap();
    assert_eq!(app.profile().display_name, "Ada");
    assert_eq!(app.normal_count(), 1);
    assert_eq!(app.vault_count(), 2);
    assert!(!app.vault_is_unlocked());

    assert!(matches!(
        app.unlock_vault("wrong"),
        Err(VaultError::AuthFailure)
    ));
    app.unlock_vault("hunter2").unwrap();
    let hits = app.vault_search("diar").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Diary");
}

#[test]
fn export_moves_between_hosts_unmodified() {
    let source = MemoryStore::new();
    let mut app = DocVault::setup(&source, "Ada", Some("hunter2")).unwrap();
    app.unlock_vault("hunter2").unwrap();
    app.vault_create("Note", "hi").unwrap();
    let exported = app.export_vault().unwrap();

    // The export is exactly the persisted record bytes.
    let persisted = source
        .get(docvault_core::vault::VAULT_STORAGE_KEY)
        .unwrap()
        .unwrap();
    let reparsed: serde_json::Value = serde_json::from_slice(&exported).unwrap();
    assert_eq!(reparsed, persisted);

    // Import on another host: locked until the original password arrives.
    let target = MemoryStore::new();
    let mut other = DocVault::setup(&target, "Grace", Some("unrelated")).unwrap();
    other.import_vault(&exported).unwrap();
    assert!(!other.vault_is_unlocked());
    assert_eq!(other.vault_count(), 1);
    assert!(matches!(
        other.unlock_vault("unrelated"),
        Err(VaultError::AuthFailure)
    ));
    other.unlock_vault("hunter2").unwrap();
    assert_eq!(other.vault_list().unwrap()[0].title, "Note");
}

#[test]
fn import_after_failed_parse_keeps_previous_vault() {
    let store = MemoryStore::new();
    let mut app = DocVault::setup(&store, "Ada", Some("hunter2")).unwrap();
    app.unlock_vault("hunter2").unwrap();
    app.vault_create("Note", "hi").unwrap();

    assert!(matches!(
        app.import_vault(b"\x00\x01garbage"),
        Err(VaultError::Format(_))
    ));
    // Still unlocked, contents intact, envelope untouched.
    assert!(app.vault_is_unlocked());
    assert_eq!(app.vault_list().unwrap().len(), 1);
    app.lock_vault();
    app.unlock_vault("hunter2").unwrap();
    assert_eq!(app.vault_list().unwrap().len(), 1);
}

#[test]
fn envelope_survives_store_roundtrip_with_many_documents() {
    let mut docs = DocumentCollection::new();
    for i in 0..50 {
        docs.create(&format!("note {i}"), &format!("body {i}"))
            .unwrap();
    }
    let envelope = encrypt_collection(&docs, "hunter2").unwrap();
    assert_eq!(envelope.item_count, 50);

    let store = MemoryStore::new();
    let mut vault = VaultHandle::new(None);
    vault.replace_envelope(&store, envelope).unwrap();

    let mut reloaded = VaultHandle::load(&store).unwrap();
    reloaded.unlock("hunter2").unwrap();
    let listed = reloaded.list().unwrap();
    assert_eq!(listed.len(), 50);
    assert_eq!(listed[49].title, "note 49");
}

#[test]
fn reseal_keeps_original_password_valid_across_many_mutations() {
    let store = MemoryStore::new();
    let mut vault = VaultHandle::new(None);
    vault.provision(&store, "hunter2").unwrap();
    vault.unlock("hunter2").unwrap();

    let mut last_nonce = None;
    for i in 0..10 {
        vault
            .create(&store, &format!("n{i}"), "body")
            .unwrap();
        let record = store
            .get(docvault_core::vault::VAULT_STORAGE_KEY)
            .unwrap()
            .unwrap();
        let envelope = docvault_core::codec::decode_envelope(&record).unwrap();
        // Every reseal draws a fresh nonce.
        assert_ne!(Some(envelope.nonce), last_nonce);
        last_nonce = Some(envelope.nonce);
        // The original password still opens every generation.
        assert_eq!(
            decrypt_collection(&envelope, "hunter2").unwrap().len(),
            i + 1
        );
    }
}

//! Session-level coordinator: profile, normal collection, vault handle.
//!
//! `DocVault` is what the presentation layer talks to. Normal-collection
//! mutations persist the plain JSON array; vault mutations go through the
//! handle's reseal path. Nothing here touches key material.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::document::{Document, DocumentCollection};
use crate::error::{Result, VaultError};
use crate::profile::Profile;
use crate::storage::KvStore;
use crate::vault::VaultHandle;

pub const NORMAL_STORAGE_KEY: &str = "docvault_normal_docs";

/// Minimum vault password length, matching setup validation.
pub const MIN_PASSWORD_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    Normal,
    Vault,
}

/// Dashboard row: a document title with its origin and recency.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentDocument {
    pub title: String,
    pub source: DocumentSource,
    pub updated_at: DateTime<Utc>,
}

pub struct DocVault<S: KvStore> {
    store: S,
    profile: Profile,
    normal: DocumentCollection,
    vault: VaultHandle,
}

impl<S: KvStore> DocVault<S> {
    /// One-time setup. Creates the profile and, when a vault password is
    /// given, seals an envelope over the empty collection immediately.
    /// Refuses to run twice.
    pub fn setup(store: S, display_name: &str, vault_password: Option<&str>) -> Result<Self> {
        if Profile::load(&store)?.is_some() {
            return Err(VaultError::Validation("profile already exists".to_string()));
        }
        if let Some(password) = vault_password {
            if password.len() < MIN_PASSWORD_LEN {
                return Err(VaultError::Validation(format!(
                    "password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
        }

        let profile = Profile::new(display_name, vault_password.is_some());
        profile.save(&store)?;

        let mut vault = VaultHandle::new(None);
        if let Some(password) = vault_password {
            vault.provision(&store, password)?;
        }
        info!(serial = %profile.serial_id, vault = profile.vault_enabled, "profile created");

        Ok(Self {
            store,
            profile,
            normal: DocumentCollection::new(),
            vault,
        })
    }

    /// Open an existing session. `None` means setup has not run yet.
    pub fn load(store: S) -> Result<Option<Self>> {
        let Some(profile) = Profile::load(&store)? else {
            return Ok(None);
        };
        let normal = match store.get(NORMAL_STORAGE_KEY)? {
            Some(record) => serde_json::from_value(record)
                .map_err(|e| VaultError::Format(format!("normal collection: {e}")))?,
            None => DocumentCollection::new(),
        };
        let vault = VaultHandle::load(&store)?;
        Ok(Some(Self {
            store,
            profile,
            normal,
            vault,
        }))
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The only profile field that may change after setup.
    pub fn set_display_name(&mut self, display_name: &str) -> Result<()> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(VaultError::Validation("display name is empty".to_string()));
        }
        self.profile.display_name = name.to_string();
        self.profile.save(&self.store)
    }

    // ── Normal collection ────────────────────────────────────────────────

    pub fn normal_create(&mut self, title: &str, content: &str) -> Result<Uuid> {
        let id = self.normal.create(title, content)?.id;
        self.persist_normal()?;
        Ok(id)
    }

    pub fn normal_update(&mut self, id: Uuid, title: &str, content: &str) -> Result<()> {
        self.normal.update(id, title, content)?;
        self.persist_normal()
    }

    pub fn normal_delete(&mut self, id: Uuid) -> Result<()> {
        self.normal.delete(id)?;
        self.persist_normal()
    }

    pub fn normal_search(&self, term: &str) -> Vec<&Document> {
        self.normal.search(term)
    }

    pub fn normal_list(&self) -> &[Document] {
        self.normal.list()
    }

    pub fn normal_count(&self) -> usize {
        self.normal.len()
    }

    fn persist_normal(&self) -> Result<()> {
        let record = serde_json::to_value(&self.normal)
            .map_err(|e| VaultError::Storage(format!("normal collection: {e}")))?;
        self.store.put(NORMAL_STORAGE_KEY, record)
    }

    // ── Vault ────────────────────────────────────────────────────────────

    pub fn unlock_vault(&mut self, password: &str) -> Result<()> {
        self.require_vault_enabled()?;
        self.vault.unlock(password)
    }

    pub fn lock_vault(&mut self) {
        self.vault.lock();
    }

    pub fn vault_is_unlocked(&self) -> bool {
        self.vault.is_unlocked()
    }

    /// Count shown on the dashboard; served from the envelope hint while
    /// locked.
    pub fn vault_count(&self) -> u32 {
        self.vault.document_count()
    }

    pub fn vault_create(&mut self, title: &str, content: &str) -> Result<Uuid> {
        self.vault.create(&self.store, title, content)
    }

    pub fn vault_update(&mut self, id: Uuid, title: &str, content: &str) -> Result<()> {
        self.vault.update(&self.store, id, title, content)
    }

    pub fn vault_delete(&mut self, id: Uuid) -> Result<()> {
        self.vault.delete(&self.store, id)
    }

    pub fn vault_search(&self, term: &str) -> Result<Vec<&Document>> {
        self.vault.search(term)
    }

    pub fn vault_list(&self) -> Result<&[Document]> {
        self.vault.list()
    }

    pub fn export_vault(&self) -> Result<Vec<u8>> {
        self.require_vault_enabled()?;
        self.vault.export()
    }

    /// Import replaces the envelope wholesale and forces a lock; the
    /// importer must re-authenticate with the envelope's own password.
    pub fn import_vault(&mut self, bytes: &[u8]) -> Result<()> {
        self.require_vault_enabled()?;
        self.vault.import(&self.store, bytes)
    }

    fn require_vault_enabled(&self) -> Result<()> {
        if self.profile.vault_enabled {
            Ok(())
        } else {
            Err(VaultError::Validation(
                "vault is disabled for this profile".to_string(),
            ))
        }
    }

    // ── Dashboard ────────────────────────────────────────────────────────

    /// Newest-first merge of normal and (if unlocked) vault documents.
    /// Locked vault documents stay invisible.
    pub fn recent_documents(&self, limit: usize) -> Vec<RecentDocument> {
        let mut rows: Vec<RecentDocument> = self
            .normal
            .list()
            .iter()
            .map(|d| recent_row(d, DocumentSource::Normal))
            .collect();
        if let Ok(docs) = self.vault.list() {
            rows.extend(docs.iter().map(|d| recent_row(d, DocumentSource::Vault)));
        }
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        rows.truncate(limit);
        rows
    }
}

fn recent_row(doc: &Document, source: DocumentSource) -> RecentDocument {
    RecentDocument {
        title: if doc.title.is_empty() {
            "(Untitled)".to_string()
        } else {
            doc.title.clone()
        },
        source,
        updated_at: doc.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn setup_rejects_short_password() {
        let store = MemoryStore::new();
        assert!(matches!(
            DocVault::setup(store, "Ada", Some("abc")),
            Err(VaultError::Validation(_))
        ));
    }

    #[test]
    fn setup_twice_on_same_store_is_rejected() {
        let store = MemoryStore::new();
        {
            DocVault::setup(&store, "Ada", None).unwrap();
        }
        assert!(matches!(
            DocVault::setup(&store, "Again", None),
            Err(VaultError::Validation(_))
        ));
    }

    #[test]
    fn normal_collection_persists_across_reload() {
        let store = MemoryStore::new();
        {
            let mut app = DocVault::setup(&store, "Ada", None).unwrap();
            app.normal_create("Note", "hi").unwrap();
        }
        let app = DocVault::load(&store).unwrap().unwrap();
        assert_eq!(app.normal_count(), 1);
        assert_eq!(app.normal_list()[0].title, "Note");
    }

    #[test]
    fn vault_flow_end_to_end() {
        let store = MemoryStore::new();
        let mut app = DocVault::setup(&store, "Ada", Some("hunter2")).unwrap();
        assert!(app.profile().vault_enabled);
        assert_eq!(app.vault_count(), 0);

        app.unlock_vault("hunter2").unwrap();
        app.vault_create("Secret", "plans").unwrap();
        assert_eq!(app.vault_count(), 1);
        app.lock_vault();

        // Reload from the same records: count visible while locked, contents
        // only after unlock.
        let mut reloaded = DocVault::load(&store).unwrap().unwrap();
        assert!(!reloaded.vault_is_unlocked());
        assert_eq!(reloaded.vault_count(), 1);
        assert!(matches!(reloaded.vault_list(), Err(VaultError::Locked)));
        reloaded.unlock_vault("hunter2").unwrap();
        assert_eq!(reloaded.vault_list().unwrap()[0].title, "Secret");
    }

    #[test]
    fn disabled_profile_cannot_touch_vault() {
        let store = MemoryStore::new();
        let mut app = DocVault::setup(&store, "Ada", None).unwrap();
        assert!(matches!(
            app.unlock_vault("pw"),
            Err(VaultError::Validation(_))
        ));
        assert!(matches!(
            app.import_vault(b"{}"),
            Err(VaultError::Validation(_))
        ));
        assert!(matches!(app.export_vault(), Err(VaultError::Validation(_))));
    }

    #[test]
    fn recent_documents_merge_and_order() {
        let store = MemoryStore::new();
        let mut app = DocVault::setup(&store, "Ada", Some("hunter2")).unwrap();
        app.normal_create("older", "n").unwrap();
        app.unlock_vault("hunter2").unwrap();
        app.vault_create("newer", "v").unwrap();

        let recent = app.recent_documents(5);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "newer");
        assert_eq!(recent[0].source, DocumentSource::Vault);
        assert_eq!(recent[1].source, DocumentSource::Normal);

        app.lock_vault();
        let recent = app.recent_documents(5);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].source, DocumentSource::Normal);
    }

    #[test]
    fn untitled_documents_get_placeholder_title() {
        let store = MemoryStore::new();
        let mut app = DocVault::setup(&store, "Ada", None).unwrap();
        app.normal_create("", "content only").unwrap();
        let recent = app.recent_documents(1);
        assert_eq!(recent[0].title, "(Untitled)");
    }

    #[test]
    fn display_name_update_persists() {
        let store = MemoryStore::new();
        {
            let mut app = DocVault::setup(&store, "Ada", None).unwrap();
            app.set_display_name("Grace").unwrap();
            assert!(matches!(
                app.set_display_name("  "),
                Err(VaultError::Validation(_))
            ));
        }
        let app = DocVault::load(&store).unwrap().unwrap();
        assert_eq!(app.profile().display_name, "Grace");
    }
}

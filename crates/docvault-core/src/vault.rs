//! Lock/unlock lifecycle and the re-encryption-on-mutation policy.
//!
//! `VaultHandle` is an owned value, not a global: independent vaults can
//! coexist (multiple stores, tests). Every operation takes `&mut self`, so
//! no operation can begin while another is mid-flight.
//!
//! While unlocked the handle holds the derived key (zeroized on drop) plus
//! the salt and iteration count that produced it. It never holds the
//! password. Every mutation reseals the whole collection under the held key
//! with a fresh nonce and replaces the persisted envelope: O(collection
//! size) per edit, one (key, nonce) pair per envelope generation.

use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::codec::{self, VaultEnvelope};
use crate::crypto::{self, DEFAULT_KDF_ITERATIONS, DERIVED_KEY_LEN, SALT_LEN};
use crate::document::{Document, DocumentCollection};
use crate::error::{Result, VaultError};
use crate::storage::KvStore;

/// Storage key for the persisted envelope record.
pub const VAULT_STORAGE_KEY: &str = "docvault_protected_vault";

enum VaultState {
    Locked {
        envelope: Option<VaultEnvelope>,
    },
    Unlocked {
        key: Zeroizing<[u8; DERIVED_KEY_LEN]>,
        salt: [u8; SALT_LEN],
        iterations: u32,
        documents: DocumentCollection,
        envelope: VaultEnvelope,
    },
}

pub struct VaultHandle {
    state: VaultState,
    storage_key: String,
}

/// Seal a collection under a password with a fresh random salt and nonce.
/// Two calls over identical inputs yield different salts, nonces, and
/// ciphertext bytes.
pub fn encrypt_collection(
    documents: &DocumentCollection,
    password: &str,
) -> Result<VaultEnvelope> {
    let salt = crypto::generate_salt();
    let nonce = crypto::generate_nonce();
    let key = crypto::derive_key(password, &salt, DEFAULT_KDF_ITERATIONS);
    let plaintext = codec::encode_documents(documents)?;
    let ciphertext = crypto::seal(&key, &nonce, &plaintext)?;
    Ok(VaultEnvelope {
        salt,
        nonce,
        iterations: DEFAULT_KDF_ITERATIONS,
        ciphertext,
        item_count: documents.len() as u32,
    })
}

/// Decrypt an envelope with a password. Wrong password and tampered
/// ciphertext are indistinguishable (`AuthFailure`).
pub fn decrypt_collection(envelope: &VaultEnvelope, password: &str) -> Result<DocumentCollection> {
    let key = crypto::derive_key(password, &envelope.salt, envelope.iterations);
    let plaintext = crypto::open(&key, &envelope.nonce, &envelope.ciphertext)?;
    codec::decode_documents(&plaintext)
}

impl VaultHandle {
    pub fn new(envelope: Option<VaultEnvelope>) -> Self {
        Self::with_storage_key(envelope, VAULT_STORAGE_KEY)
    }

    pub fn with_storage_key(envelope: Option<VaultEnvelope>, storage_key: &str) -> Self {
        Self {
            state: VaultState::Locked { envelope },
            storage_key: storage_key.to_string(),
        }
    }

    /// Load the persisted envelope, if any. A malformed persisted record is
    /// a `Format` error; an absent one is just an unprovisioned vault.
    pub fn load(store: &dyn KvStore) -> Result<Self> {
        let envelope = match store.get(VAULT_STORAGE_KEY)? {
            Some(record) => Some(codec::decode_envelope(&record)?),
            None => None,
        };
        Ok(Self::new(envelope))
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, VaultState::Unlocked { .. })
    }

    pub fn has_envelope(&self) -> bool {
        match &self.state {
            VaultState::Locked { envelope } => envelope.is_some(),
            VaultState::Unlocked { .. } => true,
        }
    }

    /// Document count without requiring an unlock: the envelope carries the
    /// count as a plaintext hint.
    pub fn document_count(&self) -> u32 {
        match &self.state {
            VaultState::Unlocked { documents, .. } => documents.len() as u32,
            VaultState::Locked {
                envelope: Some(envelope),
            } => envelope.item_count,
            VaultState::Locked { envelope: None } => 0,
        }
    }

    /// Seal an envelope over the empty collection. Legal once; the envelope
    /// is otherwise only ever replaced, never created twice.
    pub fn provision(&mut self, store: &dyn KvStore, password: &str) -> Result<()> {
        if self.has_envelope() {
            return Err(VaultError::Validation(
                "vault already provisioned".to_string(),
            ));
        }
        let envelope = encrypt_collection(&DocumentCollection::new(), password)?;
        store.put(&self.storage_key, codec::encode_envelope(&envelope)?)?;
        self.state = VaultState::Locked {
            envelope: Some(envelope),
        };
        debug!("vault provisioned");
        Ok(())
    }

    /// Locked → Unlocked. On failure the state stays Locked; the caller
    /// decides whether to resubmit a password, nothing retries here. An
    /// unprovisioned vault reports the same `AuthFailure` as a wrong
    /// password. Unlocking an unlocked vault is a no-op.
    pub fn unlock(&mut self, password: &str) -> Result<()> {
        let envelope = match &self.state {
            VaultState::Unlocked { .. } => return Ok(()),
            VaultState::Locked { envelope: None } => return Err(VaultError::AuthFailure),
            VaultState::Locked {
                envelope: Some(envelope),
            } => envelope.clone(),
        };
        let key = crypto::derive_key(password, &envelope.salt, envelope.iterations);
        let plaintext = crypto::open(&key, &envelope.nonce, &envelope.ciphertext)?;
        let documents = codec::decode_documents(&plaintext)?;
        debug!(count = documents.len(), "vault unlocked");
        self.state = VaultState::Unlocked {
            key,
            salt: envelope.salt,
            iterations: envelope.iterations,
            documents,
            envelope,
        };
        Ok(())
    }

    /// Unconditional and idempotent. Key and plaintext are discarded first;
    /// a pending edit that never resealed is lost.
    pub fn lock(&mut self) {
        let prior = std::mem::replace(&mut self.state, VaultState::Locked { envelope: None });
        self.state = match prior {
            VaultState::Unlocked {
                key,
                documents,
                envelope,
                ..
            } => {
                drop(key);
                drop(documents);
                debug!("vault locked");
                VaultState::Locked {
                    envelope: Some(envelope),
                }
            }
            locked => locked,
        };
    }

    pub fn create(&mut self, store: &dyn KvStore, title: &str, content: &str) -> Result<Uuid> {
        let mut working = self.unlocked_documents()?.clone();
        let id = working.create(title, content)?.id;
        self.reseal(store, working)?;
        Ok(id)
    }

    pub fn update(
        &mut self,
        store: &dyn KvStore,
        id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<()> {
        let mut working = self.unlocked_documents()?.clone();
        working.update(id, title, content)?;
        self.reseal(store, working)
    }

    pub fn delete(&mut self, store: &dyn KvStore, id: Uuid) -> Result<()> {
        let mut working = self.unlocked_documents()?.clone();
        working.delete(id)?;
        self.reseal(store, working)
    }

    pub fn search(&self, term: &str) -> Result<Vec<&Document>> {
        Ok(self.unlocked_documents()?.search(term))
    }

    pub fn list(&self) -> Result<&[Document]> {
        Ok(self.unlocked_documents()?.list())
    }

    pub fn get(&self, id: Uuid) -> Result<Option<&Document>> {
        Ok(self.unlocked_documents()?.get(id))
    }

    /// The serialized envelope bytes, exactly as persisted. Works locked or
    /// unlocked; never touches plaintext.
    pub fn export(&self) -> Result<Vec<u8>> {
        let envelope = match &self.state {
            VaultState::Unlocked { envelope, .. } => envelope,
            VaultState::Locked {
                envelope: Some(envelope),
            } => envelope,
            VaultState::Locked { envelope: None } => {
                return Err(VaultError::Validation("vault not provisioned".to_string()))
            }
        };
        codec::export_bytes(envelope)
    }

    /// Parse an imported byte stream and adopt it. A `Format` error leaves
    /// every piece of state untouched; success forces a lock so the caller
    /// must re-authenticate with the envelope's original password.
    pub fn import(&mut self, store: &dyn KvStore, bytes: &[u8]) -> Result<()> {
        let envelope = codec::import_bytes(bytes)?;
        self.replace_envelope(store, envelope)
    }

    /// Adopt a new envelope without attempting decryption, discarding the
    /// previous one. Always ends Locked.
    pub fn replace_envelope(&mut self, store: &dyn KvStore, envelope: VaultEnvelope) -> Result<()> {
        store.put(&self.storage_key, codec::encode_envelope(&envelope)?)?;
        self.lock();
        self.state = VaultState::Locked {
            envelope: Some(envelope),
        };
        debug!("vault envelope replaced");
        Ok(())
    }

    fn unlocked_documents(&self) -> Result<&DocumentCollection> {
        match &self.state {
            VaultState::Unlocked { documents, .. } => Ok(documents),
            VaultState::Locked { .. } => Err(VaultError::Locked),
        }
    }

    /// Re-encrypt `working` and replace the persisted envelope, then commit
    /// the working copy into the unlocked state. Runs persist-first so a
    /// failure anywhere leaves both the in-memory collection and the
    /// persisted envelope exactly as they were.
    fn reseal(&mut self, store: &dyn KvStore, working: DocumentCollection) -> Result<()> {
        let (key, salt, iterations) = match &self.state {
            VaultState::Unlocked {
                key,
                salt,
                iterations,
                ..
            } => (key, *salt, *iterations),
            VaultState::Locked { .. } => return Err(VaultError::Locked),
        };
        let plaintext = codec::encode_documents(&working)?;
        let nonce = crypto::generate_nonce();
        let ciphertext = crypto::seal(key, &nonce, &plaintext)?;
        let envelope = VaultEnvelope {
            salt,
            nonce,
            iterations,
            ciphertext,
            item_count: working.len() as u32,
        };
        store.put(&self.storage_key, codec::encode_envelope(&envelope)?)?;

        if let VaultState::Unlocked {
            documents,
            envelope: current,
            ..
        } = &mut self.state
        {
            *documents = working;
            *current = envelope;
        }
        debug!(count = self.document_count(), "vault resealed");
        Ok(())
    }
}

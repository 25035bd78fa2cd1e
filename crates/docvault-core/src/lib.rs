//! docvault-core — encrypted document vault engine
//!
//! Two collections of short text documents for a single local user: a
//! plaintext "normal" collection and a password-protected vault whose
//! contents exist in cleartext only in memory, only while unlocked. Every
//! vault mutation re-encrypts the whole collection with a fresh nonce and
//! replaces the persisted envelope. Threat model: data at rest on an
//! untrusted disk, trusted runtime.
//!
//! # Module layout
//! - `crypto`   — PBKDF2-HMAC-SHA256 key derivation + ChaCha20-Poly1305 AEAD
//! - `codec`    — document payload and envelope record serialization
//! - `document` — ordered document collection with create/update/delete/search
//! - `vault`    — lock/unlock state machine and reseal-on-mutation policy
//! - `storage`  — key→record store trait with memory and JSON-file backends
//! - `profile`  — the create-once user profile
//! - `app`      — session coordinator wiring the above together
//! - `error`    — unified error type

pub mod app;
pub mod codec;
pub mod crypto;
pub mod document;
pub mod error;
pub mod profile;
pub mod storage;
pub mod vault;

pub use app::DocVault;
pub use codec::VaultEnvelope;
pub use document::{Document, DocumentCollection};
pub use error::VaultError;
pub use profile::Profile;
pub use storage::{JsonFileStore, KvStore, MemoryStore};
pub use vault::VaultHandle;

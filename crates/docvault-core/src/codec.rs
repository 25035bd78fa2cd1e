//! Serialization of document collections and vault envelopes.
//!
//! The plaintext payload is the JSON array of documents. The persisted
//! envelope is a JSON record with base64 byte fields:
//!
//! ```text
//! { "salt": b64, "iv": b64, "iterations": u32, "ciphertext": b64, "count": u32 }
//! ```
//!
//! Export produces exactly these record bytes, so an exported vault file
//! re-imports unmodified.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::{NONCE_LEN, SALT_LEN};
use crate::document::DocumentCollection;
use crate::error::{Result, VaultError};

/// Persisted form of an encrypted vault. Opaque while locked except for
/// `item_count`, a plaintext hint that must always equal the number of
/// documents inside the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEnvelope {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub iterations: u32,
    pub ciphertext: Vec<u8>,
    pub item_count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct EnvelopeRecord {
    salt: String,
    iv: String,
    iterations: u32,
    ciphertext: String,
    count: u32,
}

pub fn encode_documents(documents: &DocumentCollection) -> Result<Vec<u8>> {
    serde_json::to_vec(documents).map_err(|e| VaultError::Storage(format!("encode documents: {e}")))
}

pub fn decode_documents(bytes: &[u8]) -> Result<DocumentCollection> {
    serde_json::from_slice(bytes).map_err(|e| VaultError::Format(format!("decode documents: {e}")))
}

pub fn encode_envelope(envelope: &VaultEnvelope) -> Result<Value> {
    let record = EnvelopeRecord {
        salt: general_purpose::STANDARD.encode(envelope.salt),
        iv: general_purpose::STANDARD.encode(envelope.nonce),
        iterations: envelope.iterations,
        ciphertext: general_purpose::STANDARD.encode(&envelope.ciphertext),
        count: envelope.item_count,
    };
    serde_json::to_value(record).map_err(|e| VaultError::Storage(format!("encode envelope: {e}")))
}

pub fn decode_envelope(record: &Value) -> Result<VaultEnvelope> {
    let record: EnvelopeRecord = serde_json::from_value(record.clone())
        .map_err(|e| VaultError::Format(format!("envelope record: {e}")))?;
    if record.iterations == 0 {
        return Err(VaultError::Format(
            "iteration count missing or zero".to_string(),
        ));
    }
    let salt = decode_fixed::<SALT_LEN>("salt", &record.salt)?;
    let nonce = decode_fixed::<NONCE_LEN>("iv", &record.iv)?;
    let ciphertext = general_purpose::STANDARD
        .decode(&record.ciphertext)
        .map_err(|e| VaultError::Format(format!("ciphertext: {e}")))?;
    Ok(VaultEnvelope {
        salt,
        nonce,
        iterations: record.iterations,
        ciphertext,
        item_count: record.count,
    })
}

/// Serialize an envelope to the exact bytes persisted and exported.
pub fn export_bytes(envelope: &VaultEnvelope) -> Result<Vec<u8>> {
    serde_json::to_vec(&encode_envelope(envelope)?)
        .map_err(|e| VaultError::Storage(format!("export envelope: {e}")))
}

/// Parse an imported byte stream. Anything that is not a well-formed
/// envelope record is a `Format` error; decryption is not attempted here.
pub fn import_bytes(bytes: &[u8]) -> Result<VaultEnvelope> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| VaultError::Format(format!("not a vault file: {e}")))?;
    decode_envelope(&value)
}

fn decode_fixed<const N: usize>(field: &str, b64: &str) -> Result<[u8; N]> {
    let bytes = general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| VaultError::Format(format!("{field}: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| VaultError::Format(format!("{field} length invalid")))
}

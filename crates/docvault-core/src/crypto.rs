//! Password hardening and authenticated encryption.
//!
//! PBKDF2-HMAC-SHA256 turns a password + per-envelope salt into a 32-byte
//! key; ChaCha20-Poly1305 seals the serialized collection under that key
//! with a 12-byte random nonce. A fresh nonce is drawn for every seal;
//! (key, nonce) reuse must never happen.

use chacha20poly1305::aead::{Aead, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::VaultError;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const DERIVED_KEY_LEN: usize = 32;

/// Default PBKDF2 iteration count. Stored in every envelope so the cost can
/// be raised later without invalidating envelopes sealed at the old cost.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Derive a symmetric key from a password. Deterministic; any
/// password/salt/iteration combination is structurally valid, and a wrong
/// password only shows up as an authentication failure at `open`.
pub fn derive_key(
    password: &str,
    salt: &[u8],
    iterations: u32,
) -> Zeroizing<[u8; DERIVED_KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut *key);
    key
}

/// Encrypt `plaintext`, producing ciphertext with the Poly1305 tag appended.
pub fn seal(
    key: &[u8; DERIVED_KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, VaultError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| VaultError::Crypto(format!("seal: {e}")))
}

/// Decrypt and verify. Fails closed: tag mismatch, truncation, and any other
/// malformed input all collapse into the one generic `AuthFailure`.
pub fn open(
    key: &[u8; DERIVED_KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| VaultError::AuthFailure)?;
    Ok(Zeroizing::new(plaintext))
}

pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

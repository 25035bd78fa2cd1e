//! The single local user profile.
//!
//! Created once at setup and immutable afterwards except for the display
//! name. `vault_enabled` is decided at creation and permanently forbids
//! envelope creation when false.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::storage::KvStore;

pub const PROFILE_STORAGE_KEY: &str = "docvault_profile";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub display_name: String,
    pub serial_id: String,
    pub vault_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// A blank display name falls back to "User".
    pub fn new(display_name: &str, vault_enabled: bool) -> Self {
        let name = display_name.trim();
        Self {
            display_name: if name.is_empty() { "User" } else { name }.to_string(),
            serial_id: generate_serial_id(),
            vault_enabled,
            created_at: Utc::now(),
        }
    }

    pub fn load(store: &dyn KvStore) -> Result<Option<Self>> {
        match store.get(PROFILE_STORAGE_KEY)? {
            Some(record) => {
                let profile = serde_json::from_value(record)
                    .map_err(|e| VaultError::Format(format!("profile record: {e}")))?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    pub fn save(&self, store: &dyn KvStore) -> Result<()> {
        let record = serde_json::to_value(self)
            .map_err(|e| VaultError::Storage(format!("profile record: {e}")))?;
        store.put(PROFILE_STORAGE_KEY, record)
    }
}

/// Serial format `DOC-NNNN-XXXX`: four random digits, four uppercase hex
/// characters.
pub fn generate_serial_id() -> String {
    let mut rng = rand::thread_rng();
    let digits: u32 = rng.gen_range(1000..10_000);
    let suffix: [u8; 2] = rng.gen();
    format!("DOC-{digits}-{}", hex::encode_upper(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn blank_name_defaults_to_user() {
        let profile = Profile::new("   ", true);
        assert_eq!(profile.display_name, "User");
        assert!(profile.vault_enabled);
    }

    #[test]
    fn serial_id_has_expected_shape() {
        let serial = generate_serial_id();
        let parts: Vec<&str> = serial.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "DOC");
        assert_eq!(parts[1].len(), 4);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn save_load_roundtrip() {
        let store = MemoryStore::new();
        let profile = Profile::new("Ada", false);
        profile.save(&store).unwrap();
        let loaded = Profile::load(&store).unwrap().unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn load_absent_is_none() {
        let store = MemoryStore::new();
        assert!(Profile::load(&store).unwrap().is_none());
    }
}

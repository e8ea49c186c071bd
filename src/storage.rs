use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::account::keys::NULL_ADDRESS;
use crate::account::types::AccountRecord;
use crate::error::AccountsError;

/// Namespaced key holding the whole account blob.
pub const LOCAL_STORAGE_KEY: &str = "_keyring::localAccounts";

/// The blob stored under [`LOCAL_STORAGE_KEY`]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RawState {
    #[serde(default = "null_address")]
    pub last: String,
    #[serde(default)]
    pub store: Vec<AccountRecord>,
}

fn null_address() -> String {
    NULL_ADDRESS.to_string()
}

impl Default for RawState {
    fn default() -> Self {
        Self {
            last: null_address(),
            store: Vec::new(),
        }
    }
}

/// Synchronous string key-value medium
pub trait KeyValueMedium: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, AccountsError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), AccountsError>;
}

/// Anything the registry can load its blob from and save it to
pub trait DurableStore: Send + Sync {
    fn load(&self) -> Result<RawState, AccountsError>;
    fn save(&self, state: &RawState) -> Result<(), AccountsError>;
}

/// Reads and writes the JSON blob under one key of a medium. No caching.
pub struct LocalStore<M> {
    medium: M,
    key: String,
}

impl<M: KeyValueMedium> LocalStore<M> {
    pub fn new(medium: M) -> Self {
        Self::with_key(medium, LOCAL_STORAGE_KEY)
    }

    pub fn with_key(medium: M, key: &str) -> Self {
        Self {
            medium,
            key: key.to_string(),
        }
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<M: KeyValueMedium> DurableStore for LocalStore<M> {
    fn load(&self) -> Result<RawState, AccountsError> {
        match self.medium.get_item(&self.key)? {
            Some(json) => serde_json::from_str(&json).map_err(|e| AccountsError::CorruptState(e.to_string())),
            None => Ok(RawState::default()),
        }
    }

    fn save(&self, state: &RawState) -> Result<(), AccountsError> {
        let json = serde_json::to_string(state).map_err(|e| AccountsError::CorruptState(e.to_string()))?;
        self.medium.set_item(&self.key, &json)
    }
}

/// In-process medium. Counts writes and can be switched off to simulate a
/// missing or full store.
#[derive(Default)]
pub struct MemoryMedium {
    items: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set_item` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AccountsError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AccountsError::StorageUnavailable("memory medium switched off".to_string()));
        }
        Ok(())
    }
}

impl KeyValueMedium for MemoryMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, AccountsError> {
        self.check_available()?;
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AccountsError> {
        self.check_available()?;
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// On-disk medium backed by a sled tree
pub struct SledMedium {
    db: sled::Db,
}

impl SledMedium {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AccountsError> {
        let db = sled::open(path).map_err(|e| AccountsError::StorageUnavailable(e.to_string()))?;
        Ok(Self { db })
    }
}

impl KeyValueMedium for SledMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, AccountsError> {
        match self.db.get(key.as_bytes()) {
            Ok(Some(data)) => String::from_utf8(data.to_vec())
                .map(Some)
                .map_err(|e| AccountsError::CorruptState(e.to_string())),
            Ok(None) => Ok(None),
            Err(e) => Err(AccountsError::StorageUnavailable(e.to_string())),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AccountsError> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| AccountsError::StorageUnavailable(e.to_string()))?;
        self.db
            .flush()
            .map_err(|e| AccountsError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }
}

//! Password-protected secp256k1 account

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::auth::{open_key, seal_key};
use super::keys::{address_from_private_key, is_address};
use super::types::{AccountRecord, KdfSettings, KeyCrypto};
use crate::error::AccountsError;
use crate::persist::PersistCallback;

/// Shared handle to one account. Clones refer to the same account, and
/// changes made through any of them request a registry write.
#[derive(Clone)]
pub struct Account {
    inner: Arc<AccountInner>,
}

struct AccountInner {
    address: String,
    uuid: Uuid,
    created_at: i64,
    profile: Mutex<Profile>,
    persist: PersistCallback,
}

struct Profile {
    name: String,
    meta: HashMap<String, String>,
    crypto: KeyCrypto,
}

impl Account {
    /// Rebuild an account from its stored record. The address is kept exactly
    /// as stored.
    pub fn from_record(persist: PersistCallback, record: AccountRecord) -> Result<Self, AccountsError> {
        if !is_address(&record.address) {
            return Err(AccountsError::CorruptState(format!(
                "malformed account address '{}'",
                record.address
            )));
        }

        Ok(Self::assemble(
            persist,
            record.address,
            record.uuid,
            record.created_at,
            Profile {
                name: record.name,
                meta: record.meta,
                crypto: record.crypto,
            },
        ))
    }

    /// Import a raw private key, sealing it under `password`.
    pub fn from_private_key(
        persist: PersistCallback,
        private_key: &[u8],
        password: &str,
        kdf: KdfSettings,
    ) -> Result<Self, AccountsError> {
        if password.is_empty() {
            return Err(AccountsError::InvalidSecret("password must not be empty".to_string()));
        }

        let address = address_from_private_key(private_key)?;
        let crypto = seal_key(private_key, password, kdf)?;

        Ok(Self::assemble(
            persist,
            address,
            Uuid::new_v4(),
            chrono::Utc::now().timestamp_millis(),
            Profile {
                name: String::new(),
                meta: HashMap::new(),
                crypto,
            },
        ))
    }

    fn assemble(persist: PersistCallback, address: String, uuid: Uuid, created_at: i64, profile: Profile) -> Self {
        Self {
            inner: Arc::new(AccountInner {
                address,
                uuid,
                created_at,
                profile: Mutex::new(profile),
                persist,
            }),
        }
    }

    fn profile(&self) -> MutexGuard<'_, Profile> {
        self.inner.profile.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request_persist(&self) {
        (self.inner.persist)();
    }

    pub fn address(&self) -> &str {
        &self.inner.address
    }

    pub fn uuid(&self) -> Uuid {
        self.inner.uuid
    }

    /// Unix timestamp in milliseconds
    pub fn created_at(&self) -> i64 {
        self.inner.created_at
    }

    pub fn name(&self) -> String {
        self.profile().name.clone()
    }

    pub fn set_name(&self, name: &str) {
        self.profile().name = name.to_string();
        self.request_persist();
    }

    pub fn meta(&self) -> HashMap<String, String> {
        self.profile().meta.clone()
    }

    pub fn set_meta(&self, key: &str, value: &str) {
        self.profile().meta.insert(key.to_string(), value.to_string());
        self.request_persist();
    }

    pub fn is_valid_password(&self, password: &str) -> bool {
        self.decrypt_private_key(password).is_ok()
    }

    pub fn decrypt_private_key(&self, password: &str) -> Result<Vec<u8>, AccountsError> {
        let crypto = self.profile().crypto.clone();
        open_key(&crypto, password)
    }

    /// Re-seal the key under a new password, keeping the round count.
    pub fn change_password(&self, current: &str, new_password: &str) -> Result<(), AccountsError> {
        if new_password.is_empty() {
            return Err(AccountsError::InvalidSecret("password must not be empty".to_string()));
        }

        let crypto = self.profile().crypto.clone();
        let private_key = open_key(&crypto, current)?;
        let settings = KdfSettings {
            iterations: crypto.kdfparams.c,
        };
        let resealed = seal_key(&private_key, new_password, settings)?;

        self.profile().crypto = resealed;
        self.request_persist();
        Ok(())
    }

    pub fn to_record(&self) -> AccountRecord {
        let profile = self.profile();
        AccountRecord {
            address: self.inner.address.clone(),
            uuid: self.inner.uuid,
            name: profile.name.clone(),
            meta: profile.meta.clone(),
            created_at: self.inner.created_at,
            crypto: profile.crypto.clone(),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.inner.address)
            .field("uuid", &self.inner.uuid)
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::noop;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FAST: KdfSettings = KdfSettings { iterations: 16 };
    const KEY: [u8; 32] = [0xaa; 32];

    fn counting() -> (PersistCallback, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let callback: PersistCallback = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (callback, calls)
    }

    #[test]
    fn test_import_private_key() {
        let account = Account::from_private_key(noop(), &KEY, "pw", FAST).unwrap();

        assert_eq!(account.address(), address_from_private_key(&KEY).unwrap());
        assert!(account.is_valid_password("pw"));
        assert!(!account.is_valid_password("wrong"));
        assert_eq!(account.decrypt_private_key("pw").unwrap(), KEY.to_vec());
        assert_eq!(account.name(), "");
    }

    #[test]
    fn test_rejects_empty_password() {
        assert!(matches!(
            Account::from_private_key(noop(), &KEY, "", FAST),
            Err(AccountsError::InvalidSecret(_))
        ));
    }

    #[test]
    fn test_record_round_trip() {
        let account = Account::from_private_key(noop(), &KEY, "pw", FAST).unwrap();
        account.set_name("savings");
        account.set_meta("tags", "cold");

        let record = account.to_record();
        let json = serde_json::to_string(&record).unwrap();
        let restored = Account::from_record(noop(), serde_json::from_str(&json).unwrap()).unwrap();

        assert_eq!(restored.address(), account.address());
        assert_eq!(restored.uuid(), account.uuid());
        assert_eq!(restored.name(), "savings");
        assert_eq!(restored.meta().get("tags").map(String::as_str), Some("cold"));
        assert!(restored.is_valid_password("pw"));
    }

    #[test]
    fn test_from_record_rejects_bad_address() {
        let mut record = Account::from_private_key(noop(), &KEY, "pw", FAST).unwrap().to_record();
        record.address = "not-an-address".to_string();

        assert!(matches!(
            Account::from_record(noop(), record),
            Err(AccountsError::CorruptState(_))
        ));
    }

    #[test]
    fn test_changes_request_persist() {
        let (callback, calls) = counting();
        let account = Account::from_private_key(callback, &KEY, "pw", FAST).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        account.set_name("main");
        account.clone().set_meta("k", "v");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert_eq!(account.change_password("wrong", "next"), Err(AccountsError::InvalidPassword));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        account.change_password("pw", "next").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(account.is_valid_password("next"));
        assert!(!account.is_valid_password("pw"));
    }
}

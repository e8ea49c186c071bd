//! Account registry with debounced write-through to durable storage

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use super::keys::{decode_secret_hex, normalize_address, NULL_ADDRESS};
use super::keystore::Account;
use super::types::KdfSettings;
use crate::config::AccountsConfig;
use crate::error::AccountsError;
use crate::persist::{Debouncer, PersistCallback, PersistEvent, DEFAULT_DEBOUNCE};
use crate::storage::{DurableStore, RawState};

const EVENT_CAPACITY: usize = 16;

/// Tunables for an [`AccountStore`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreOptions {
    pub debounce: Duration,
    pub kdf: KdfSettings,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            kdf: KdfSettings::default(),
        }
    }
}

impl From<&AccountsConfig> for StoreOptions {
    fn from(config: &AccountsConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.persist.debounce_ms),
            kdf: KdfSettings {
                iterations: config.crypto.kdf_iterations,
            },
        }
    }
}

/// The ordered set of local accounts plus the last used address.
///
/// Mutations apply to memory immediately and schedule one coalesced write of
/// the whole registry through the [`DurableStore`].
pub struct AccountStore {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<StoreState>,
    storage: Arc<dyn DurableStore>,
    debounce: Debouncer,
    events: broadcast::Sender<PersistEvent>,
    kdf: KdfSettings,
    this: Weak<Shared>,
}

struct StoreState {
    last: String,
    accounts: Vec<Account>,
}

impl AccountStore {
    /// Load the registry from durable storage.
    pub fn open(storage: Arc<dyn DurableStore>, options: StoreOptions) -> Result<Self, AccountsError> {
        let seed = storage.load()?;
        Self::with_state(storage, seed, options)
    }

    /// Build the registry from injected state without reading storage.
    pub fn with_state(storage: Arc<dyn DurableStore>, seed: RawState, options: StoreOptions) -> Result<Self, AccountsError> {
        let debounce = Debouncer::new(options.debounce)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let RawState { last, store } = seed;

        let mut failure = None;
        let shared = Arc::new_cyclic(|this: &Weak<Shared>| {
            let persist = persist_callback(this.clone());
            let mut accounts = Vec::with_capacity(store.len());
            for record in store {
                match Account::from_record(persist.clone(), record) {
                    Ok(account) => accounts.push(account),
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }

            Shared {
                state: Mutex::new(StoreState { last, accounts }),
                storage,
                debounce,
                events,
                kdf: options.kdf,
                this: this.clone(),
            }
        });

        if let Some(e) = failure {
            return Err(e);
        }

        info!("Accounts: loaded {} local account(s)", shared.state().accounts.len());
        Ok(Self { shared })
    }

    /// Import a `0x`-prefixed hex private key and make it the last used account.
    pub fn create(&self, secret: &str, password: &str) -> Result<String, AccountsError> {
        let private_key = decode_secret_hex(secret)?;
        let account = Account::from_private_key(self.shared.persist_callback(), &private_key, password, self.shared.kdf)?;
        let address = account.address().to_string();

        {
            let mut state = self.shared.state();
            state.accounts.push(account);
            state.last = address.clone();
        }

        info!("Accounts: created {}", address);
        self.shared.request_persist();
        Ok(address)
    }

    pub fn last_used(&self) -> String {
        self.shared.state().last.clone()
    }

    /// Look up an account. The queried address becomes the last used one even
    /// when no account matches.
    pub fn get(&self, address: &str) -> Result<Account, AccountsError> {
        let address = normalize_address(address);
        let mut state = self.shared.state();
        state.last = address.clone();

        state
            .accounts
            .iter()
            .find(|account| account.address() == address)
            .cloned()
            .ok_or(AccountsError::AccountNotFound(address))
    }

    pub fn remove(&self, address: &str) -> bool {
        let address = normalize_address(address);

        {
            let mut state = self.shared.state();
            let Some(index) = state.accounts.iter().position(|account| account.address() == address) else {
                return false;
            };

            if state.last == address {
                state.last = NULL_ADDRESS.to_string();
            }
            state.accounts.remove(index);
        }

        info!("Accounts: removed {}", address);
        self.shared.request_persist();
        true
    }

    /// Apply `mapper` to every account in registry order.
    pub fn map_to_vec<R, F>(&self, mapper: F) -> Vec<R>
    where
        F: FnMut(&Account) -> R,
    {
        self.snapshot().iter().map(mapper).collect()
    }

    /// Apply `mapper` to every account, keyed by address. A later duplicate
    /// address overwrites an earlier one.
    pub fn map_to_table<R, F>(&self, mut mapper: F) -> HashMap<String, R>
    where
        F: FnMut(&Account) -> R,
    {
        let accounts = self.snapshot();
        let mut table = HashMap::with_capacity(accounts.len());
        for account in &accounts {
            table.insert(account.address().to_string(), mapper(account));
        }
        table
    }

    pub fn addresses(&self) -> Vec<String> {
        self.map_to_vec(|account| account.address().to_string())
    }

    /// Account handles in registry order. Mappers run on this copy so they
    /// may call back into the registry.
    fn snapshot(&self) -> Vec<Account> {
        self.shared.state().accounts.clone()
    }

    pub fn len(&self) -> usize {
        self.shared.state().accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_serializable(&self) -> RawState {
        self.shared.to_serializable()
    }

    /// Schedule a debounced write, replacing any write still waiting.
    pub fn request_persist(&self) {
        self.shared.request_persist();
    }

    pub fn has_pending_persist(&self) -> bool {
        self.shared.debounce.is_pending()
    }

    /// Drop any waiting write and save the current state right away.
    pub fn flush(&self) -> Result<(), AccountsError> {
        self.shared.debounce.cancel();
        self.shared.persist_now()
    }

    /// Outcomes of debounced writes, including failures.
    pub fn subscribe(&self) -> broadcast::Receiver<PersistEvent> {
        self.shared.events.subscribe()
    }
}

fn persist_callback(this: Weak<Shared>) -> PersistCallback {
    Arc::new(move || {
        if let Some(shared) = this.upgrade() {
            shared.request_persist();
        }
    })
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist_callback(&self) -> PersistCallback {
        persist_callback(self.this.clone())
    }

    fn to_serializable(&self) -> RawState {
        let state = self.state();
        RawState {
            last: state.last.clone(),
            store: state.accounts.iter().map(Account::to_record).collect(),
        }
    }

    fn request_persist(&self) {
        // The pending task holds the registry alive so a write requested just
        // before the handle is dropped still lands.
        let Some(shared) = self.this.upgrade() else {
            return;
        };

        self.debounce.schedule(move || {
            if let Err(e) = shared.persist_now() {
                error!("Accounts: failed to persist local accounts: {}", e);
            }
        });
    }

    fn persist_now(&self) -> Result<(), AccountsError> {
        let snapshot = self.to_serializable();
        let count = snapshot.store.len();

        match self.storage.save(&snapshot) {
            Ok(()) => {
                debug!("Accounts: persisted {} account(s)", count);
                let _ = self.events.send(PersistEvent::Saved { accounts: count });
                Ok(())
            }
            Err(e) => {
                let _ = self.events.send(PersistEvent::Failed(e.to_string()));
                Err(e)
            }
        }
    }
}

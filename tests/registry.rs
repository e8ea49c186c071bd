use std::sync::Arc;
use std::time::Duration;

use local_accounts::account::keys::address_from_private_key;
use local_accounts::account::KdfSettings;
use local_accounts::{
    AccountStore, AccountsError, DurableStore, LocalStore, MemoryMedium, PersistEvent, SledMedium, StoreOptions,
    NULL_ADDRESS,
};

const SECRET: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn options() -> StoreOptions {
    StoreOptions {
        debounce: Duration::from_millis(100),
        kdf: KdfSettings { iterations: 16 },
    }
}

#[tokio::test(start_paused = true)]
async fn create_get_remove_scenario() {
    let storage = Arc::new(LocalStore::new(MemoryMedium::new()));
    let store = AccountStore::open(storage.clone(), options()).unwrap();

    let address = store.create(SECRET, "pw").unwrap();
    assert_eq!(address, address_from_private_key(&[0xaa; 32]).unwrap());
    assert_eq!(store.last_used(), address);

    let upper = format!("0x{}", address[2..].to_uppercase());
    let account = store.get(&upper).unwrap();
    assert_eq!(account.address(), address);

    assert!(store.remove(&address));
    assert_eq!(store.last_used(), NULL_ADDRESS);
    assert!(!store.remove(&address));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(storage.medium().writes(), 1);
    assert!(storage.load().unwrap().store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn reload_from_durable_copy() {
    let storage = Arc::new(LocalStore::new(MemoryMedium::new()));
    let store = AccountStore::open(storage.clone(), options()).unwrap();
    let mut events = store.subscribe();

    let address = store.create(SECRET, "pw").unwrap();
    store.get(&address).unwrap().set_name("cold storage");
    assert_eq!(events.recv().await.unwrap(), PersistEvent::Saved { accounts: 1 });

    let reloaded = AccountStore::open(storage, options()).unwrap();
    assert_eq!(reloaded.addresses(), vec![address.clone()]);
    assert_eq!(reloaded.last_used(), address);

    let account = reloaded.get(&address).unwrap();
    assert_eq!(account.name(), "cold storage");
    assert_eq!(account.decrypt_private_key("pw").unwrap(), vec![0xaa; 32]);
    assert_eq!(account.decrypt_private_key("nope"), Err(AccountsError::InvalidPassword));
}

#[tokio::test(start_paused = true)]
async fn sled_backed_registry() {
    let dir = tempfile::tempdir().unwrap();
    let medium = SledMedium::open(dir.path().join("accounts")).unwrap();
    let storage = Arc::new(LocalStore::new(medium));
    let store = AccountStore::open(storage.clone(), options()).unwrap();

    let address = store.create(SECRET, "pw").unwrap();
    store.flush().unwrap();

    let saved = storage.load().unwrap();
    assert_eq!(saved.last, address);
    assert_eq!(saved.store.len(), 1);
}

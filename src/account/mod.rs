//! Local accounts
//!
//! - Password-sealed secp256k1 keys with `0x` addresses
//! - An ordered registry that remembers the last used address
//! - Debounced write-through of the registry to durable storage

pub mod auth;
pub mod keys;
pub mod keystore;
pub mod store;
pub mod types;

pub use keys::NULL_ADDRESS;
pub use keystore::Account;
pub use store::{AccountStore, StoreOptions};
pub use types::{AccountRecord, KdfSettings};

pub mod account;
pub mod cli;
pub mod config;
pub mod error;
pub mod persist;
pub mod storage;

pub use account::{Account, AccountStore, StoreOptions, NULL_ADDRESS};
pub use error::AccountsError;
pub use persist::PersistEvent;
pub use storage::{DurableStore, LocalStore, MemoryMedium, RawState, SledMedium};

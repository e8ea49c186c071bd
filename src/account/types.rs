//! Serialized account records

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub const CIPHER_NAME: &str = "aes-256-gcm";
pub const KDF_NAME: &str = "pbkdf2";
pub const PRF_NAME: &str = "hmac-sha256";

/// Default PBKDF2 round count for new accounts.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// One account as written into the durable blob
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccountRecord {
    pub address: String,
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub meta: HashMap<String, String>,
    #[serde(default)]
    pub created_at: i64,
    pub crypto: KeyCrypto,
}

/// Encrypted private key plus the parameters needed to unlock it
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KeyCrypto {
    pub cipher: String,
    /// Hex of `nonce || ciphertext`
    pub ciphertext: String,
    pub kdf: String,
    pub kdfparams: KdfParams,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KdfParams {
    /// PBKDF2 iteration count
    pub c: u32,
    pub dklen: usize,
    pub prf: String,
    /// Hex salt
    pub salt: String,
}

/// Settings for encrypting freshly imported keys
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdfSettings {
    pub iterations: u32,
}

impl Default for KdfSettings {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

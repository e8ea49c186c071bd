//! Address helpers for secp256k1 accounts

use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

use crate::error::AccountsError;

/// The all-zero address, used when no account has been used yet.
pub const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Length of a raw secp256k1 private key.
pub const PRIVATE_KEY_LEN: usize = 32;

/// The lower-case `0x` prefix shared by secrets and addresses.
fn strip_hex_prefix(value: &str) -> Option<&str> {
    value.strip_prefix("0x")
}

/// Decode a `0x`-prefixed hex private key into raw bytes.
pub fn decode_secret_hex(secret: &str) -> Result<Vec<u8>, AccountsError> {
    let payload = strip_hex_prefix(secret)
        .ok_or_else(|| AccountsError::InvalidSecret("missing 0x prefix".to_string()))?;

    hex::decode(payload).map_err(|e| AccountsError::InvalidSecret(e.to_string()))
}

/// Derive the lower-case `0x` address for a private key.
///
/// The address is the last 20 bytes of the Keccak-256 hash of the
/// uncompressed public key, without its `0x04` tag byte.
pub fn address_from_private_key(private_key: &[u8]) -> Result<String, AccountsError> {
    if private_key.len() != PRIVATE_KEY_LEN {
        return Err(AccountsError::InvalidSecret(format!(
            "expected {} key bytes, got {}",
            PRIVATE_KEY_LEN,
            private_key.len()
        )));
    }

    let signing_key = k256::ecdsa::SigningKey::from_slice(private_key)
        .map_err(|_| AccountsError::InvalidSecret("key is not a valid secp256k1 scalar".to_string()))?;
    let public_key = k256::PublicKey::from(signing_key.verifying_key());
    let encoded = public_key.to_encoded_point(false);

    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);
    Ok(format!("0x{}", hex::encode(&hash[12..])))
}

/// Lower-case an address for lookups.
pub fn normalize_address(address: &str) -> String {
    address.to_ascii_lowercase()
}

/// Check the `0x` + 40 hex digit shape. Digits may be in any letter case.
pub fn is_address(address: &str) -> bool {
    match strip_hex_prefix(address) {
        Some(digits) => digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

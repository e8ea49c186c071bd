//! Password protection for private keys

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;

use super::types::{KdfParams, KdfSettings, KeyCrypto, CIPHER_NAME, KDF_NAME, PRF_NAME};
use crate::error::AccountsError;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const SALT_LEN: usize = 32;

/// Derive an encryption key from a password and salt
pub fn derive_encryption_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN]; // 256-bit key
    pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, iterations, &mut key);
    key
}

/// Encrypt data using AES-256-GCM, returning `nonce || ciphertext`
pub fn encrypt_data(data: &[u8], password: &str, salt: &[u8], iterations: u32) -> Result<Vec<u8>, AccountsError> {
    let key = derive_encryption_key(password, salt, iterations);
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| AccountsError::Crypto(e.to_string()))?;

    let nonce_bytes: [u8; NONCE_LEN] = rand::random();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, data)
        .map_err(|_| AccountsError::Crypto("encryption failed".to_string()))?;

    let mut result = nonce_bytes.to_vec();
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Decrypt data produced by [`encrypt_data`]. A wrong password fails the GCM tag check.
pub fn decrypt_data(encrypted: &[u8], password: &str, salt: &[u8], iterations: u32) -> Result<Vec<u8>, AccountsError> {
    if encrypted.len() < NONCE_LEN {
        return Err(AccountsError::CorruptState("ciphertext shorter than nonce".to_string()));
    }

    let key = derive_encryption_key(password, salt, iterations);
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| AccountsError::Crypto(e.to_string()))?;

    let (nonce, ciphertext) = encrypted.split_at(NONCE_LEN);

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| AccountsError::InvalidPassword)
}

/// Seal a private key under a password with a fresh salt
pub fn seal_key(private_key: &[u8], password: &str, settings: KdfSettings) -> Result<KeyCrypto, AccountsError> {
    let salt: [u8; SALT_LEN] = rand::random();
    let sealed = encrypt_data(private_key, password, &salt, settings.iterations)?;

    Ok(KeyCrypto {
        cipher: CIPHER_NAME.to_string(),
        ciphertext: hex::encode(sealed),
        kdf: KDF_NAME.to_string(),
        kdfparams: KdfParams {
            c: settings.iterations,
            dklen: KEY_LEN,
            prf: PRF_NAME.to_string(),
            salt: hex::encode(salt),
        },
    })
}

/// Recover the private key sealed by [`seal_key`]
pub fn open_key(crypto: &KeyCrypto, password: &str) -> Result<Vec<u8>, AccountsError> {
    if crypto.cipher != CIPHER_NAME || crypto.kdf != KDF_NAME || crypto.kdfparams.prf != PRF_NAME {
        return Err(AccountsError::CorruptState(format!(
            "unsupported key encryption {}/{}/{}",
            crypto.cipher, crypto.kdf, crypto.kdfparams.prf
        )));
    }

    let salt = hex::decode(&crypto.kdfparams.salt)
        .map_err(|e| AccountsError::CorruptState(format!("salt: {}", e)))?;
    let sealed = hex::decode(&crypto.ciphertext)
        .map_err(|e| AccountsError::CorruptState(format!("ciphertext: {}", e)))?;

    decrypt_data(&sealed, password, &salt, crypto.kdfparams.c)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: KdfSettings = KdfSettings { iterations: 16 };

    #[test]
    fn test_encryption() {
        let data = b"sensitive data";
        let password = "encryption_password";
        let salt = b"random_salt_1234";

        let encrypted = encrypt_data(data, password, salt, 16).unwrap();
        let decrypted = decrypt_data(&encrypted, password, salt, 16).unwrap();

        assert_eq!(data, decrypted.as_slice());
        assert_eq!(
            decrypt_data(&encrypted, "wrong", salt, 16),
            Err(AccountsError::InvalidPassword)
        );
    }

    #[test]
    fn test_seal_and_open_key() {
        let key = [0x11u8; 32];
        let crypto = seal_key(&key, "pw", FAST).unwrap();

        assert_eq!(crypto.kdfparams.c, 16);
        assert_eq!(crypto.kdfparams.dklen, 32);
        assert_eq!(open_key(&crypto, "pw").unwrap(), key.to_vec());
        assert_eq!(open_key(&crypto, "nope"), Err(AccountsError::InvalidPassword));
    }

    #[test]
    fn test_open_rejects_unknown_cipher() {
        let mut crypto = seal_key(&[0x22u8; 32], "pw", FAST).unwrap();
        crypto.cipher = "aes-128-ctr".to_string();
        assert!(matches!(open_key(&crypto, "pw"), Err(AccountsError::CorruptState(_))));
    }
}

use crate::error::{LotoError, Result};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ChaCha20Poly1305 for authenticated encryption
use chacha20poly1305::{
    aead::{rand_core::RngCore, Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Key, Nonce,
};

const SALT_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const PBKDF2_ROUNDS: u32 = 100_000;
const METHOD: &str = "ChaCha20Poly1305";

/// Passphrase-encrypted payload as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedBlob {
    pub version: u32,
    pub encryption_method: String,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

/// Encrypt data with a passphrase using ChaCha20Poly1305
pub fn encrypt_data(data: &[u8], passphrase: &str) -> Result<EncryptedBlob> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let key = derive_key(passphrase, &salt);
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let cipher = ChaCha20Poly1305::new(&key);

    let ciphertext = cipher
        .encrypt(&nonce, data)
        .map_err(|e| LotoError::crypto(format!("Encryption failed: {}", e)))?;

    Ok(EncryptedBlob {
        version: 1,
        encryption_method: METHOD.to_string(),
        salt: general_purpose::STANDARD.encode(salt),
        nonce: general_purpose::STANDARD.encode(nonce),
        checksum: calculate_checksum(&ciphertext),
        ciphertext: general_purpose::STANDARD.encode(&ciphertext),
        created_at: Utc::now(),
    })
}

/// Decrypt a blob produced by [`encrypt_data`]
pub fn decrypt_data(blob: &EncryptedBlob, passphrase: &str) -> Result<Vec<u8>> {
    if blob.encryption_method != METHOD {
        return Err(LotoError::crypto(format!(
            "Unsupported encryption method: {}",
            blob.encryption_method
        )));
    }

    let salt = decode_field("salt", &blob.salt)?;
    let nonce = decode_field("nonce", &blob.nonce)?;
    let ciphertext = decode_field("ciphertext", &blob.ciphertext)?;

    if nonce.len() != NONCE_SIZE {
        return Err(LotoError::crypto("Invalid nonce length"));
    }
    if calculate_checksum(&ciphertext) != blob.checksum {
        return Err(LotoError::crypto("Checksum verification failed"));
    }

    let key = derive_key(passphrase, &salt);
    let cipher = ChaCha20Poly1305::new(&key);

    cipher
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
        .map_err(|e| LotoError::crypto(format!("Decryption failed: {}", e)))
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(value)
        .map_err(|e| LotoError::crypto(format!("Invalid {} encoding: {}", name, e)))
}

/// Derive encryption key from passphrase using PBKDF2
fn derive_key(passphrase: &str, salt: &[u8]) -> Key {
    use pbkdf2::pbkdf2_hmac;

    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    *Key::from_slice(&key)
}

fn calculate_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

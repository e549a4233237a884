//! Sealed-blob encryption for the secret store.
//!
//! One file holds the whole bucket map: `base64(salt || nonce || ciphertext)`
//! where the ciphertext carries the AES-GCM tag. Salt and nonce are drawn
//! fresh on every write; the 256-bit key is derived from the master key with
//! PBKDF2-HMAC-SHA256.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use super::SecretsError;

pub(crate) const SALT_LEN: usize = 16;
pub(crate) const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const PBKDF2_ITERATIONS: u32 = 600_000;

fn derive_key(master_key: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(master_key.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

/// Encrypt a plaintext under the master key into one base64 blob.
pub(crate) fn seal(master_key: &str, plaintext: &[u8]) -> Result<String, SecretsError> {
    let salt: [u8; SALT_LEN] = rand::random();
    let nonce_bytes: [u8; NONCE_LEN] = rand::random();

    let key = derive_key(master_key, &salt);
    let cipher =
        Aes256Gcm::new_from_slice(&key).map_err(|e| SecretsError::Encrypt(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| SecretsError::Encrypt(e.to_string()))?;

    let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(blob))
}

/// Decrypt a sealed blob. Any failure (bad base64, truncated blob, failed
/// auth tag) is reported as a string so the caller can log and degrade.
pub(crate) fn open(master_key: &str, encoded: &str) -> Result<Vec<u8>, String> {
    let blob = STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("invalid base64: {e}"))?;
    if blob.len() < SALT_LEN + NONCE_LEN {
        return Err("sealed blob is truncated".to_string());
    }

    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(master_key, salt);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| e.to_string())?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| "decryption failed, wrong master key or tampered data".to_string())
}

//! Passphrase-encrypted-at-rest key provisioning, grounded on
//! `key_mgr.py`'s `gen_key`/`get_key`.
//!
//! This is independent of [`dsdrive_crypto::ChunkCodec`]'s per-chunk
//! passphrase: it lets the store's random 32-byte key be generated once,
//! persisted encrypted under an operator passphrase, and rotated without
//! touching any chunk.

use std::path::Path;

use dsdrive_crypto::ChunkCodec;
use rand::RngCore;

use crate::error::{ConfigError, Result};

/// The plaintext marker encrypted alongside the key, checked on load to
/// confirm the passphrase is correct before trusting the decrypted key.
const VALIDATOR_PLAINTEXT: &[u8] = b"successful";

/// A random 32-byte key, encrypted at rest under an operator passphrase.
pub struct KeyFile;

impl KeyFile {
    /// Generates a fresh random 32-byte key and encrypts both it and the
    /// validator marker under `passphrase`. Returns
    /// `(encrypted_key, encrypted_validator)`; callers persist these to
    /// their own chosen paths.
    pub fn generate(passphrase: impl AsRef<[u8]>) -> ([u8; 32], Vec<u8>, Vec<u8>) {
        let mut key = [0u8; 32];
        rand::rng().fill_bytes(&mut key);

        let codec = ChunkCodec::new(passphrase);
        let encrypted_key = codec.encrypt(&key);
        let encrypted_validator = codec.encrypt(VALIDATOR_PLAINTEXT);
        (key, encrypted_key, encrypted_validator)
    }

    /// Generates a key as [`KeyFile::generate`] and writes the encrypted
    /// key and validator to `key_path` and `validator_path`.
    pub fn generate_to_files(
        passphrase: impl AsRef<[u8]>,
        key_path: impl AsRef<Path>,
        validator_path: impl AsRef<Path>,
    ) -> Result<[u8; 32]> {
        let (key, encrypted_key, encrypted_validator) = Self::generate(passphrase);
        write(key_path, &encrypted_key)?;
        write(validator_path, &encrypted_validator)?;
        Ok(key)
    }

    /// Loads and decrypts the key at `key_path`, validating the
    /// passphrase against the validator at `validator_path`.
    pub fn load(
        passphrase: impl AsRef<[u8]>,
        key_path: impl AsRef<Path>,
        validator_path: impl AsRef<Path>,
    ) -> Result<[u8; 32]> {
        let encrypted_key = read(key_path)?;
        let encrypted_validator = read(validator_path)?;
        Self::load_bytes(passphrase, &encrypted_key, &encrypted_validator)
    }

    /// As [`KeyFile::load`], but with the encrypted key and validator
    /// already in memory rather than read from disk.
    pub fn load_bytes(
        passphrase: impl AsRef<[u8]>,
        encrypted_key: &[u8],
        encrypted_validator: &[u8],
    ) -> Result<[u8; 32]> {
        let codec = ChunkCodec::new(passphrase);
        if codec.decrypt(encrypted_validator)? != VALIDATOR_PLAINTEXT {
            return Err(ConfigError::InvalidValidator);
        }
        let decrypted = codec.decrypt(encrypted_key)?;
        <[u8; 32]>::try_from(decrypted.as_slice())
            .map_err(|_| ConfigError::WrongKeyLength(decrypted.len()))
    }
}

fn write(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, bytes).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_then_load_round_trips_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key.bin");
        let validator_path = dir.path().join("validator.bin");

        let key = KeyFile::generate_to_files("hunter2", &key_path, &validator_path).unwrap();
        let loaded = KeyFile::load("hunter2", &key_path, &validator_path).unwrap();
        assert_eq!(key, loaded);
    }

    #[test]
    fn wrong_passphrase_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key.bin");
        let validator_path = dir.path().join("validator.bin");

        KeyFile::generate_to_files("hunter2", &key_path, &validator_path).unwrap();
        let err = KeyFile::load("wrong-passphrase", &key_path, &validator_path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValidator | ConfigError::Crypto(_)
        ));
    }
}

//! Symmetric chunk codec: SHA-256 key derivation, AES-256-CBC, PKCS#7 padding.
//!
//! The on-the-wire envelope is `base64(iv || ciphertext)`, matching the format
//! the remote attachment store expects. There is no authentication tag; a
//! corrupted envelope surfaces as [`CryptoError::InvalidPadding`] or a cipher
//! error rather than a forged-ciphertext detection.

use aes::Aes256;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::error::CryptoError;
use crate::Result;

const BLOCK_SIZE: usize = 16;

type Encryptor = cbc::Encryptor<Aes256>;
type Decryptor = cbc::Decryptor<Aes256>;

/// Derives a 32-byte AES-256 key from an arbitrary-length passphrase.
fn derive_key(passphrase: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(passphrase);
    digest.into()
}

/// A chunk codec bound to a single passphrase-derived key.
///
/// Cheap to clone; the derived key is the only state it carries.
#[derive(Clone)]
pub struct ChunkCodec {
    key: [u8; 32],
}

impl ChunkCodec {
    /// Creates a codec, deriving its key from `passphrase` via SHA-256.
    pub fn new(passphrase: impl AsRef<[u8]>) -> Self {
        Self {
            key: derive_key(passphrase.as_ref()),
        }
    }

    /// Encrypts `plain`, returning `base64(iv || ciphertext)`.
    ///
    /// A fresh random IV is generated for every call, so encrypting the same
    /// plaintext twice yields different output.
    pub fn encrypt(&self, plain: &[u8]) -> Vec<u8> {
        let mut iv = [0u8; BLOCK_SIZE];
        rand::rng().fill_bytes(&mut iv);

        let cipher = Encryptor::new(&self.key.into(), &iv.into());
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plain);

        let mut envelope = Vec::with_capacity(BLOCK_SIZE + ciphertext.len());
        envelope.extend_from_slice(&iv);
        envelope.extend_from_slice(&ciphertext);

        trace!(plain_len = plain.len(), cipher_len = ciphertext.len(), "encrypted chunk");
        BASE64.encode(envelope).into_bytes()
    }

    /// Decrypts a `base64(iv || ciphertext)` envelope back to plaintext.
    pub fn decrypt(&self, envelope: &[u8]) -> Result<Vec<u8>> {
        let raw = BASE64
            .decode(envelope)
            .map_err(CryptoError::InvalidBase64)?;

        if raw.len() < BLOCK_SIZE {
            return Err(CryptoError::CiphertextTooShort {
                expected: BLOCK_SIZE,
                actual: raw.len(),
            });
        }
        let (iv, ciphertext) = raw.split_at(BLOCK_SIZE);
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::CiphertextTooShort {
                expected: BLOCK_SIZE,
                actual: ciphertext.len(),
            });
        }

        let cipher = Decryptor::new(&self.key.into(), iv.into());
        let plain = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::InvalidPadding)?;
        trace!(cipher_len = ciphertext.len(), plain_len = plain.len(), "decrypted chunk");
        Ok(plain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_arbitrary_length() {
        let codec = ChunkCodec::new("despacito");
        for len in [0usize, 1, 15, 16, 17, 1000, 24 * 1024 * 1024] {
            if len > 1 << 20 && len != 24 * 1024 * 1024 {
                continue;
            }
            let plain = vec![0xABu8; len];
            let cipher = codec.encrypt(&plain);
            let decrypted = codec.decrypt(&cipher).unwrap();
            assert_eq!(decrypted, plain, "length {len}");
        }
    }

    #[test]
    fn distinct_ivs_yield_distinct_ciphertexts() {
        let codec = ChunkCodec::new("key");
        let a = codec.encrypt(b"hello world");
        let b = codec.encrypt(b"hello world");
        assert_ne!(a, b);
    }

    #[test]
    fn short_ciphertext_is_rejected() {
        let codec = ChunkCodec::new("key");
        let short = BASE64.encode(b"short");
        assert!(matches!(
            codec.decrypt(short.as_bytes()),
            Err(CryptoError::CiphertextTooShort { .. })
        ));
    }

    #[test]
    fn wrong_key_fails_to_unpad() {
        let a = ChunkCodec::new("key-a");
        let b = ChunkCodec::new("key-b");
        let cipher = a.encrypt(b"some plaintext data of moderate length");
        assert!(b.decrypt(&cipher).is_err());
    }

    #[test]
    fn different_passphrases_derive_different_keys() {
        let a = ChunkCodec::new("alpha");
        let b = ChunkCodec::new("beta");
        assert_ne!(a.key, b.key);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;
        use proptest::test_runner::TestCaseError;

        proptest! {
            #[test]
            fn encrypt_then_decrypt_round_trips(plain in prop::collection::vec(any::<u8>(), 0..4096)) {
                let codec = ChunkCodec::new("proptest passphrase");
                let cipher = codec.encrypt(&plain);
                let decrypted = codec.decrypt(&cipher).map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(decrypted, plain);
            }
        }
    }
}

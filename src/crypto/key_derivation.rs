//! Symmetric key material bound to an algorithm.
//!
//! Keys come from one of three places:
//! - raw bytes handed over by a keystore loader
//! - a base64 string from configuration
//! - a passphrase stretched with Argon2id
//!
//! In every case the length is checked against the cipher spec before the
//! key can be used.

use std::fmt;

use argon2::{Algorithm as Argon2Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use super::cipher_spec::CipherSpec;
use crate::error::ConfigurationError;

/// Salt length (bytes) for passphrase derivation.
pub const SALT_LEN: usize = 16;

/// Argon2id parameters, balanced between security and performance:
/// 64 MiB memory, 3 iterations, 4 lanes.
const ARGON2_MEMORY_KIB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 4;

/// Key bytes bound to the algorithm named by a cipher spec.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    algorithm: &'static str,
    bytes: Vec<u8>,
}

impl SecretKey {
    /// Bind raw key bytes to the algorithm of `spec`, checking the length.
    pub fn new(spec: &CipherSpec, bytes: impl Into<Vec<u8>>) -> Result<Self, ConfigurationError> {
        let bytes = bytes.into();
        if !spec.key_lengths().contains(&bytes.len()) {
            return Err(ConfigurationError::InvalidKeyLength {
                algorithm: spec.as_str().to_string(),
                expected: spec.key_lengths_label(),
                actual: bytes.len(),
            });
        }
        Ok(Self {
            algorithm: spec.algorithm().name(),
            bytes,
        })
    }

    /// Decode a standard base64 key string.
    pub fn from_base64(spec: &CipherSpec, encoded: &str) -> Result<Self, ConfigurationError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|source| ConfigurationError::InvalidBase64 {
                field: "key",
                source,
            })?;
        Self::new(spec, bytes)
    }

    /// Derive a key from a passphrase using Argon2id.
    ///
    /// The output length is the largest key size `spec` accepts, so AES
    /// specs get a 256-bit key.
    pub fn derive(
        spec: &CipherSpec,
        passphrase: &str,
        salt: &[u8],
    ) -> Result<Self, ConfigurationError> {
        let key_len = spec.key_lengths().iter().copied().max().unwrap_or(32);
        let params = Params::new(
            ARGON2_MEMORY_KIB,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(key_len),
        )
        .map_err(|e| ConfigurationError::KeyDerivation(format!("invalid Argon2 parameters: {e}")))?;

        let argon2 = Argon2::new(Argon2Algorithm::Argon2id, Version::V0x13, params);

        let mut key = vec![0u8; key_len];
        argon2
            .hash_password_into(passphrase.as_bytes(), salt, &mut key)
            .map_err(|e| ConfigurationError::KeyDerivation(e.to_string()))?;

        Self::new(spec, key)
    }

    /// Algorithm name this key is bound to.
    pub fn algorithm(&self) -> &'static str {
        self.algorithm
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Short identifier safe to log: first 8 bytes of SHA-256 over the key.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        digest[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("algorithm", &self.algorithm)
            .field("bits", &(self.bytes.len() * 8))
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Generate a random salt for passphrase derivation.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

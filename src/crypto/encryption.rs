//! Cipher engines.
//!
//! Two variants share the same `encrypt` / `decrypt` surface:
//!
//! - **AEAD** (AES-GCM, ChaCha20-Poly1305): a fresh 96-bit nonce per call,
//!   output is `nonce (12 bytes) || ciphertext || tag (16 bytes)`. Any change
//!   to the output makes decryption fail.
//! - **Block** (AES-CBC with PKCS#7 padding): either a fixed IV reused for
//!   every call (legacy, deterministic) or a fresh IV per call prepended to
//!   the ciphertext. No integrity protection beyond padding checks.
//!
//! Engines are immutable after construction and safe to share between threads.

use std::sync::Arc;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Aes256Gcm,
};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use chacha20poly1305::ChaCha20Poly1305;

use super::cipher_spec::{CipherSpec, Mode, AES_BLOCK_LEN};
use super::key_derivation::SecretKey;
use super::nonce::NonceSource;
use crate::error::{CipherError, ConfigurationError};

/// Nonce length (bytes) for every supported AEAD - 96 bits.
pub const NONCE_LEN: usize = 12;

/// Authentication tag length (bytes) - 128 bits.
pub const TAG_LEN: usize = 16;

/// How the CBC engine obtains its IV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IvPolicy {
    /// Same IV for every message. Deterministic output; kept for
    /// compatibility with existing keys only.
    Fixed(Vec<u8>),
    /// Fresh IV per message, prepended to the ciphertext.
    Random,
}

/// An encryption backend configured with key, mode and IV/nonce policy.
#[derive(Debug, Clone)]
pub enum CipherEngine {
    Block(BlockCipherEngine),
    Aead(AeadEngine),
}

impl CipherEngine {
    /// Build the engine described by `spec`.
    ///
    /// `iv` is only meaningful for CBC; AEAD specs reject a fixed IV.
    pub fn new(
        spec: &CipherSpec,
        key: &SecretKey,
        iv: IvPolicy,
        nonces: Arc<dyn NonceSource>,
    ) -> Result<Self, ConfigurationError> {
        if spec.is_aead() {
            if let IvPolicy::Fixed(_) = iv {
                return Err(ConfigurationError::FixedIvNotAllowed(spec.to_string()));
            }
            return Ok(Self::Aead(AeadEngine::new(spec, key, nonces)?));
        }

        if let IvPolicy::Fixed(ref bytes) = iv {
            if bytes.len() != AES_BLOCK_LEN {
                return Err(ConfigurationError::InvalidIvLength {
                    expected: AES_BLOCK_LEN,
                    actual: bytes.len(),
                });
            }
        }
        Ok(Self::Block(BlockCipherEngine {
            key: key.as_bytes().to_vec(),
            iv,
            nonces,
        }))
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        match self {
            CipherEngine::Block(engine) => engine.encrypt(plaintext),
            CipherEngine::Aead(engine) => engine.encrypt(plaintext),
        }
    }

    pub fn decrypt(&self, encrypted: &[u8]) -> Result<Vec<u8>, CipherError> {
        match self {
            CipherEngine::Block(engine) => engine.decrypt(encrypted),
            CipherEngine::Aead(engine) => engine.decrypt(encrypted),
        }
    }

    /// Whether output is authenticated (tampering is detected on decrypt).
    pub fn is_authenticated(&self) -> bool {
        matches!(self, CipherEngine::Aead(_))
    }
}

/// AES-CBC with PKCS#7 padding.
#[derive(Clone)]
pub struct BlockCipherEngine {
    key: Vec<u8>,
    iv: IvPolicy,
    nonces: Arc<dyn NonceSource>,
}

impl BlockCipherEngine {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        match &self.iv {
            IvPolicy::Fixed(iv) => cbc_encrypt(&self.key, iv, plaintext),
            IvPolicy::Random => {
                let mut iv = [0u8; AES_BLOCK_LEN];
                self.nonces.fill(&mut iv);

                let ciphertext = cbc_encrypt(&self.key, &iv, plaintext)?;

                // Combine: iv || ciphertext
                let mut result = Vec::with_capacity(AES_BLOCK_LEN + ciphertext.len());
                result.extend_from_slice(&iv);
                result.extend_from_slice(&ciphertext);
                Ok(result)
            }
        }
    }

    fn decrypt(&self, encrypted: &[u8]) -> Result<Vec<u8>, CipherError> {
        match &self.iv {
            IvPolicy::Fixed(iv) => cbc_decrypt(&self.key, iv, encrypted),
            IvPolicy::Random => {
                if encrypted.len() < 2 * AES_BLOCK_LEN {
                    return Err(CipherError::Truncated {
                        minimum: 2 * AES_BLOCK_LEN,
                        actual: encrypted.len(),
                    });
                }
                let (iv, ciphertext) = encrypted.split_at(AES_BLOCK_LEN);
                cbc_decrypt(&self.key, iv, ciphertext)
            }
        }
    }
}

impl std::fmt::Debug for BlockCipherEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let iv = match self.iv {
            IvPolicy::Fixed(_) => "fixed",
            IvPolicy::Random => "random",
        };
        f.debug_struct("BlockCipherEngine")
            .field("algorithm", &format!("AES-{}-CBC", self.key.len() * 8))
            .field("iv", &iv)
            .finish_non_exhaustive()
    }
}

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

fn cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    match key.len() {
        16 => encrypt_padded::<Aes128CbcEnc>(key, iv, plaintext),
        24 => encrypt_padded::<Aes192CbcEnc>(key, iv, plaintext),
        32 => encrypt_padded::<Aes256CbcEnc>(key, iv, plaintext),
        _ => Err(CipherError::InvalidLength),
    }
}

fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_LEN != 0 {
        return Err(CipherError::BlockAlignment(ciphertext.len()));
    }
    match key.len() {
        16 => decrypt_padded::<Aes128CbcDec>(key, iv, ciphertext),
        24 => decrypt_padded::<Aes192CbcDec>(key, iv, ciphertext),
        32 => decrypt_padded::<Aes256CbcDec>(key, iv, ciphertext),
        _ => Err(CipherError::InvalidLength),
    }
}

fn encrypt_padded<E>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError>
where
    E: KeyIvInit + BlockEncryptMut,
{
    let encryptor = E::new_from_slices(key, iv).map_err(|_| CipherError::InvalidLength)?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn decrypt_padded<D>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>
where
    D: KeyIvInit + BlockDecryptMut,
{
    let decryptor = D::new_from_slices(key, iv).map_err(|_| CipherError::InvalidLength)?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::BadPadding)
}

/// AEAD cipher with a nonce per message.
#[derive(Clone)]
pub struct AeadEngine {
    cipher: AeadCipher,
    nonces: Arc<dyn NonceSource>,
}

#[derive(Clone)]
enum AeadCipher {
    Aes128Gcm(Aes128Gcm),
    Aes256Gcm(Aes256Gcm),
    ChaCha20Poly1305(ChaCha20Poly1305),
}

impl AeadEngine {
    fn new(
        spec: &CipherSpec,
        key: &SecretKey,
        nonces: Arc<dyn NonceSource>,
    ) -> Result<Self, ConfigurationError> {
        let invalid_key = || ConfigurationError::InvalidKeyLength {
            algorithm: spec.to_string(),
            expected: spec.key_lengths_label(),
            actual: key.len(),
        };
        let bytes = key.as_bytes();
        let cipher = match (spec.mode(), bytes.len()) {
            (Mode::Gcm, 16) => {
                AeadCipher::Aes128Gcm(Aes128Gcm::new_from_slice(bytes).map_err(|_| invalid_key())?)
            }
            (Mode::Gcm, 32) => {
                AeadCipher::Aes256Gcm(Aes256Gcm::new_from_slice(bytes).map_err(|_| invalid_key())?)
            }
            (Mode::Poly1305, 32) => AeadCipher::ChaCha20Poly1305(
                ChaCha20Poly1305::new_from_slice(bytes).map_err(|_| invalid_key())?,
            ),
            _ => return Err(invalid_key()),
        };
        Ok(Self { cipher, nonces })
    }

    /// Encrypt with a fresh nonce.
    /// Returns: nonce (12 bytes) || ciphertext (plaintext + 16 bytes tag)
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut nonce = [0u8; NONCE_LEN];
        self.nonces.fill(&mut nonce);

        let ciphertext = match &self.cipher {
            AeadCipher::Aes128Gcm(c) => c.encrypt(aes_gcm::Nonce::from_slice(&nonce), plaintext),
            AeadCipher::Aes256Gcm(c) => c.encrypt(aes_gcm::Nonce::from_slice(&nonce), plaintext),
            AeadCipher::ChaCha20Poly1305(c) => {
                c.encrypt(chacha20poly1305::Nonce::from_slice(&nonce), plaintext)
            }
        }
        .map_err(|_| CipherError::Encrypt)?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Input format: nonce (12 bytes) || ciphertext (includes 16 bytes tag)
    fn decrypt(&self, encrypted: &[u8]) -> Result<Vec<u8>, CipherError> {
        if encrypted.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Truncated {
                minimum: NONCE_LEN + TAG_LEN,
                actual: encrypted.len(),
            });
        }

        let (nonce, ciphertext) = encrypted.split_at(NONCE_LEN);
        match &self.cipher {
            AeadCipher::Aes128Gcm(c) => c.decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext),
            AeadCipher::Aes256Gcm(c) => c.decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext),
            AeadCipher::ChaCha20Poly1305(c) => {
                c.decrypt(chacha20poly1305::Nonce::from_slice(nonce), ciphertext)
            }
        }
        .map_err(|_| CipherError::Authentication)
    }
}

impl std::fmt::Debug for AeadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let algorithm = match self.cipher {
            AeadCipher::Aes128Gcm(_) => "AES-128-GCM",
            AeadCipher::Aes256Gcm(_) => "AES-256-GCM",
            AeadCipher::ChaCha20Poly1305(_) => "ChaCha20-Poly1305",
        };
        f.debug_struct("AeadEngine")
            .field("algorithm", &algorithm)
            .finish_non_exhaustive()
    }
}

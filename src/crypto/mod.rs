//! Crypto module - Symmetric encryption of encoded state.
//!
//! This module contains:
//! - Cipher spec parsing (`ALGORITHM/MODE[/PADDING]`)
//! - Algorithm-bound key material (raw, base64, Argon2id passphrase)
//! - Nonce generation
//! - Block (AES-CBC) and AEAD (AES-GCM, ChaCha20-Poly1305) cipher engines

pub mod cipher_spec;
pub mod encryption;
pub mod key_derivation;
pub mod nonce;

pub use cipher_spec::{Algorithm, CipherSpec, Mode, DEFAULT_CIPHER_SPEC};
pub use encryption::{CipherEngine, IvPolicy, NONCE_LEN, TAG_LEN};
pub use key_derivation::{generate_salt, SecretKey, SALT_LEN};
pub use nonce::{NonceSource, OsRandomNonce};

//! Error types.
//!
//! Every public operation reports failure through one of four kinds:
//! - `ConfigurationError` when a transcoder cannot be built (fatal, fail closed)
//! - `EncodingError` when a value cannot be turned into bytes
//! - `DecodingError` when bytes (or a key string) cannot be turned back into a value
//! - `TokenFormatError` when an external key string is malformed
//!
//! The lower-level `CipherError` and `SerializationError` are always carried
//! as the source of one of the above.

use thiserror::Error;

/// Errors raised while building a transcoder from its configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Cipher spec is not of the form ALGORITHM/MODE[/PADDING].
    #[error("malformed cipher spec '{0}': expected ALGORITHM/MODE[/PADDING]")]
    MalformedCipherSpec(String),

    #[error("unsupported cipher algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("unsupported mode '{mode}' for algorithm '{algorithm}'")]
    UnsupportedMode { algorithm: String, mode: String },

    #[error("unsupported padding '{padding}' for mode '{mode}'")]
    UnsupportedPadding { mode: String, padding: String },

    #[error("invalid key length for {algorithm}: got {actual} bytes, expected {expected}")]
    InvalidKeyLength {
        algorithm: String,
        expected: &'static str,
        actual: usize,
    },

    #[error("invalid IV length: got {actual} bytes, expected {expected}")]
    InvalidIvLength { expected: usize, actual: usize },

    /// AEAD modes draw a fresh nonce for every message.
    #[error("cipher spec '{0}' does not accept a fixed IV")]
    FixedIvNotAllowed(String),

    #[error("no key material configured")]
    MissingKey,

    #[error("invalid base64 in '{field}'")]
    InvalidBase64 {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Low-level cipher failures.
#[derive(Debug, Error)]
pub enum CipherError {
    /// AEAD encryption failed (e.g. plaintext too long for the mode).
    #[error("encryption failed")]
    Encrypt,

    /// Authentication tag mismatch: wrong key or tampered ciphertext.
    #[error("decryption failed: authentication tag mismatch")]
    Authentication,

    /// CBC unpadding failed: wrong key, wrong IV or tampered ciphertext.
    #[error("decryption failed: bad padding")]
    BadPadding,

    #[error("ciphertext too short: {actual} bytes, need at least {minimum}")]
    Truncated { minimum: usize, actual: usize },

    #[error("ciphertext length {0} is not a multiple of the block size")]
    BlockAlignment(usize),

    #[error("invalid key or IV length")]
    InvalidLength,
}

/// Serializer failures for any supported format.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CBOR: {0}")]
    Cbor(String),
}

/// Failure while producing bytes from a value.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("serialization error")]
    Serialization(#[source] SerializationError),

    #[error("compression error")]
    Compression(#[source] std::io::Error),

    #[error("encryption error")]
    Encryption(#[source] CipherError),
}

/// Failure while reconstructing a value from bytes.
#[derive(Debug, Error)]
pub enum DecodingError {
    #[error("decryption error")]
    Decryption(#[source] CipherError),

    #[error("decompression error")]
    Decompression(#[source] std::io::Error),

    #[error("deserialization error")]
    Deserialization(#[source] SerializationError),

    #[error("malformed client state key")]
    MalformedKey(#[from] TokenFormatError),
}

/// Malformed external key string.
#[derive(Debug, Error)]
pub enum TokenFormatError {
    #[error("expected 2 '_'-separated tokens but found {0}; key format is <uuid>_<base64-encoded-state>")]
    TokenCount(usize),

    #[error("invalid key id; key format is <uuid>_<base64-encoded-state>")]
    InvalidId(#[source] Option<uuid::Error>),

    #[error("invalid base64 payload; key format is <uuid>_<base64-encoded-state>")]
    InvalidPayload(#[source] base64::DecodeError),
}

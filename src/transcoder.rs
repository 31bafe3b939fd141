//! Transcoder - turns a value into an encrypted, self-contained byte string
//! and back.
//!
//! Workflow: value -> serialize -> gzip (optional) -> encrypt
//!
//! Decoding is the exact inverse. A transcoder only exists once its
//! configuration has been validated, so every `encode` / `decode` call runs
//! against a finalized key and cipher.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, trace};

use crate::compression;
use crate::crypto::{CipherEngine, CipherSpec, IvPolicy, NonceSource, OsRandomNonce, SecretKey};
use crate::error::{ConfigurationError, DecodingError, EncodingError};
use crate::serialization::SerializationFormat;

/// Transformation of a value into bytes and vice versa.
///
/// `None` is encoded as an empty byte string and an empty byte string
/// decodes to `None`; no cipher work is done in either direction.
pub trait Transcoder: Send + Sync {
    /// Encode a value into bytes.
    fn encode<T: Serialize + ?Sized>(&self, value: Option<&T>) -> Result<Vec<u8>, EncodingError>;

    /// Decode bytes produced by [`Transcoder::encode`] under the same
    /// configuration.
    fn decode<T: DeserializeOwned>(&self, encoded: &[u8]) -> Result<Option<T>, DecodingError>;
}

/// Transcoder that serializes, optionally compresses, then encrypts.
#[derive(Debug, Clone)]
pub struct EncryptedTranscoder {
    spec: CipherSpec,
    engine: CipherEngine,
    compression: bool,
    serialization: SerializationFormat,
}

impl EncryptedTranscoder {
    pub fn builder() -> EncryptedTranscoderBuilder {
        EncryptedTranscoderBuilder::default()
    }

    pub fn cipher_spec(&self) -> &CipherSpec {
        &self.spec
    }

    pub fn compression(&self) -> bool {
        self.compression
    }

    pub fn serialization(&self) -> SerializationFormat {
        self.serialization
    }

    /// Whether tampered output is detected on decode (AEAD specs).
    pub fn is_authenticated(&self) -> bool {
        self.engine.is_authenticated()
    }
}

impl Transcoder for EncryptedTranscoder {
    fn encode<T: Serialize + ?Sized>(&self, value: Option<&T>) -> Result<Vec<u8>, EncodingError> {
        let Some(value) = value else {
            return Ok(Vec::new());
        };

        let serialized = self
            .serialization
            .serialize(value)
            .map_err(EncodingError::Serialization)?;
        let plaintext = if self.compression {
            compression::compress(&serialized).map_err(EncodingError::Compression)?
        } else {
            serialized
        };
        let encrypted = self
            .engine
            .encrypt(&plaintext)
            .map_err(EncodingError::Encryption)?;

        trace!(
            plaintext = plaintext.len(),
            encrypted = encrypted.len(),
            "encoded state"
        );
        Ok(encrypted)
    }

    fn decode<T: DeserializeOwned>(&self, encoded: &[u8]) -> Result<Option<T>, DecodingError> {
        if encoded.is_empty() {
            return Ok(None);
        }

        let result = self.decode_bytes(encoded);
        if let Err(ref e) = result {
            debug!(error = %e, encoded = encoded.len(), "rejected encoded state");
        }
        result.map(Some)
    }
}

impl EncryptedTranscoder {
    fn decode_bytes<T: DeserializeOwned>(&self, encoded: &[u8]) -> Result<T, DecodingError> {
        let decrypted = self
            .engine
            .decrypt(encoded)
            .map_err(DecodingError::Decryption)?;
        let serialized = if self.compression {
            compression::decompress(&decrypted).map_err(DecodingError::Decompression)?
        } else {
            decrypted
        };
        trace!(serialized = serialized.len(), "decrypted state");

        self.serialization
            .deserialize(&serialized)
            .map_err(DecodingError::Deserialization)
    }
}

/// Source of key material for the builder.
#[derive(Clone)]
enum KeyInput {
    Raw(Vec<u8>),
    Base64(String),
    Passphrase { passphrase: String, salt: Vec<u8> },
}

/// Builder for [`EncryptedTranscoder`].
///
/// Defaults: `AES/GCM/NoPadding`, random nonce from the OS, compression on,
/// JSON serialization. A key is always required.
#[derive(Clone)]
pub struct EncryptedTranscoderBuilder {
    cipher_spec: Option<String>,
    key: Option<KeyInput>,
    iv: Option<Vec<u8>>,
    compression: bool,
    serialization: SerializationFormat,
    nonces: Arc<dyn NonceSource>,
}

impl Default for EncryptedTranscoderBuilder {
    fn default() -> Self {
        Self {
            cipher_spec: None,
            key: None,
            iv: None,
            compression: true,
            serialization: SerializationFormat::default(),
            nonces: Arc::new(OsRandomNonce),
        }
    }
}

impl EncryptedTranscoderBuilder {
    /// Cipher spec of the form `ALGORITHM/MODE[/PADDING]`.
    pub fn cipher_spec(mut self, spec: impl Into<String>) -> Self {
        self.cipher_spec = Some(spec.into());
        self
    }

    /// Raw key bytes, bound to the spec's algorithm at build time.
    pub fn key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(KeyInput::Raw(key.into()));
        self
    }

    /// Key as a standard base64 string.
    pub fn key_base64(mut self, key: impl Into<String>) -> Self {
        self.key = Some(KeyInput::Base64(key.into()));
        self
    }

    /// Derive the key from a passphrase with Argon2id.
    pub fn passphrase(mut self, passphrase: impl Into<String>, salt: impl Into<Vec<u8>>) -> Self {
        self.key = Some(KeyInput::Passphrase {
            passphrase: passphrase.into(),
            salt: salt.into(),
        });
        self
    }

    /// Fixed IV reused for every message (CBC only).
    ///
    /// Identical inputs produce identical output under a fixed IV. Only use
    /// this to read and write state created by an existing deployment.
    pub fn fixed_iv(mut self, iv: impl Into<Vec<u8>>) -> Self {
        self.iv = Some(iv.into());
        self
    }

    pub fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    pub fn serialization(mut self, format: SerializationFormat) -> Self {
        self.serialization = format;
        self
    }

    /// Replace the nonce / IV source. Must never repeat under one key.
    pub fn nonce_source(mut self, nonces: Arc<dyn NonceSource>) -> Self {
        self.nonces = nonces;
        self
    }

    /// Validate the configuration, derive the key and build the transcoder.
    pub fn build(self) -> Result<EncryptedTranscoder, ConfigurationError> {
        let spec = match self.cipher_spec {
            Some(ref s) => s.parse::<CipherSpec>()?,
            None => CipherSpec::default(),
        };

        let key = match self.key.ok_or(ConfigurationError::MissingKey)? {
            KeyInput::Raw(bytes) => SecretKey::new(&spec, bytes)?,
            KeyInput::Base64(encoded) => SecretKey::from_base64(&spec, &encoded)?,
            KeyInput::Passphrase { passphrase, salt } => {
                SecretKey::derive(&spec, &passphrase, &salt)?
            }
        };

        let iv = match self.iv {
            Some(iv) => IvPolicy::Fixed(iv),
            None => IvPolicy::Random,
        };
        let fixed_iv = matches!(iv, IvPolicy::Fixed(_));
        let engine = CipherEngine::new(&spec, &key, iv, self.nonces)?;

        debug!(
            cipher_spec = %spec,
            key_bits = key.len() * 8,
            key_fingerprint = %key.fingerprint(),
            fixed_iv,
            compression = self.compression,
            serialization = ?self.serialization,
            "transcoder configured"
        );
        if fixed_iv {
            debug!(cipher_spec = %spec, "fixed IV in use: identical states encrypt identically");
        }

        Ok(EncryptedTranscoder {
            spec,
            engine,
            compression: self.compression,
            serialization: self.serialization,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    const IV128: &str = "Tt6uHLdUp2VlRu8zunYQUA==";
    const KEY128: &str = "77LSKX7cjabjvDgjXyGWwA==";
    const KEY256: &str = "4Io3Tji/578bgca6b140XQkA1A3ZKOQSjPYVOdDdY0Y=";

    fn cbc_fixed_iv(compression: bool) -> EncryptedTranscoder {
        EncryptedTranscoder::builder()
            .cipher_spec("AES/CBC/PKCS7")
            .key_base64(KEY128)
            .fixed_iv(STANDARD.decode(IV128).expect("valid IV"))
            .compression(compression)
            .build()
            .expect("valid configuration")
    }

    fn gcm() -> EncryptedTranscoder {
        EncryptedTranscoder::builder()
            .key_base64(KEY256)
            .build()
            .expect("valid configuration")
    }

    #[test]
    fn test_cbc_fixed_iv_roundtrip_and_determinism() -> anyhow::Result<()> {
        let transcoder = cbc_fixed_iv(true);
        let text = "Able was I ere I saw elba.";

        let encoded1 = transcoder.encode(Some(text))?;
        let encoded2 = transcoder.encode(Some(text))?;
        assert_eq!(encoded1, encoded2);

        let decoded: Option<String> = transcoder.decode(&encoded1)?;
        assert_eq!(decoded.as_deref(), Some(text));
        Ok(())
    }

    #[test]
    fn test_aead_output_differs_per_call() -> anyhow::Result<()> {
        let transcoder = gcm();
        let encoded1 = transcoder.encode(Some("Able was I ere I saw elba."))?;
        let encoded2 = transcoder.encode(Some("Able was I ere I saw elba."))?;
        assert_ne!(encoded1, encoded2);

        let decoded1: Option<String> = transcoder.decode(&encoded1)?;
        let decoded2: Option<String> = transcoder.decode(&encoded2)?;
        assert_eq!(decoded1, decoded2);
        Ok(())
    }

    #[test]
    fn test_none_short_circuit() -> anyhow::Result<()> {
        for transcoder in [cbc_fixed_iv(true), cbc_fixed_iv(false), gcm()] {
            assert!(transcoder.encode::<String>(None)?.is_empty());
            assert_eq!(transcoder.decode::<String>(&[])?, None);
        }
        Ok(())
    }

    #[test]
    fn test_defaults() {
        let transcoder = gcm();
        assert_eq!(transcoder.cipher_spec().as_str(), "AES/GCM/NoPadding");
        assert!(transcoder.compression());
        assert!(transcoder.is_authenticated());
        assert_eq!(transcoder.serialization(), SerializationFormat::Json);
    }

    #[test]
    fn test_missing_key_fails_closed() {
        let result = EncryptedTranscoder::builder()
            .cipher_spec("AES/CBC/PKCS7")
            .build();
        assert!(matches!(result, Err(ConfigurationError::MissingKey)));
    }

    #[test]
    fn test_unsupported_spec_fails_closed() {
        let result = EncryptedTranscoder::builder()
            .cipher_spec("Blowfish/OFB/PKCS5Padding")
            .key_base64(KEY128)
            .build();
        assert!(matches!(
            result,
            Err(ConfigurationError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_compression_mismatch_fails() -> anyhow::Result<()> {
        let compressed = cbc_fixed_iv(true);
        let plain = cbc_fixed_iv(false);
        let text = "compression must match on both sides";

        let encoded = compressed.encode(Some(text))?;
        assert!(matches!(
            plain.decode::<String>(&encoded),
            Err(DecodingError::Deserialization(_))
        ));

        let encoded = plain.encode(Some(text))?;
        assert!(matches!(
            compressed.decode::<String>(&encoded),
            Err(DecodingError::Decompression(_))
        ));
        Ok(())
    }

    #[test]
    fn test_wrong_type_fails_deserialization() -> anyhow::Result<()> {
        let transcoder = gcm();
        let encoded = transcoder.encode(Some("not a number"))?;
        assert!(matches!(
            transcoder.decode::<u64>(&encoded),
            Err(DecodingError::Deserialization(_))
        ));
        Ok(())
    }

    #[test]
    fn test_serialization_failure_is_encoding_error() {
        use std::collections::HashMap;

        // JSON object keys must be strings
        let mut map = HashMap::new();
        map.insert((1u8, 2u8), "tuple keys");
        let result = gcm().encode(Some(&map));
        assert!(matches!(result, Err(EncodingError::Serialization(_))));
    }
}

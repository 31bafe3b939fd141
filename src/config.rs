//! Config module - Transcoder configuration.
//!
//! Configuration is plain data (serde, usually TOML) supplied by the
//! caller. This crate never reads files or environment variables itself;
//! the host application loads the text and hands it over.
//!
//! ```toml
//! cipher_spec = "AES/CBC/PKCS7"
//! key = "77LSKX7cjabjvDgjXyGWwA=="
//! iv = "Tt6uHLdUp2VlRu8zunYQUA=="
//! compression = true
//! serialization = "json"
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::crypto::DEFAULT_CIPHER_SPEC;
use crate::error::ConfigurationError;
use crate::serialization::SerializationFormat;
use crate::transcoder::{EncryptedTranscoder, EncryptedTranscoderBuilder};

/// Settings for an [`EncryptedTranscoder`].
#[derive(Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// ALGORITHM/MODE[/PADDING] (default: AES/GCM/NoPadding)
    #[serde(default = "default_cipher_spec")]
    pub cipher_spec: String,

    /// Base64 key bytes. Takes precedence over `passphrase`.
    #[serde(default)]
    pub key: Option<String>,

    /// Passphrase for Argon2id key derivation (requires `salt`)
    #[serde(default)]
    pub passphrase: Option<String>,

    /// Base64 salt for `passphrase`
    #[serde(default)]
    pub salt: Option<String>,

    /// Base64 fixed IV (CBC only). Absent means a random IV per message.
    #[serde(default)]
    pub iv: Option<String>,

    /// Gzip before encrypting
    #[serde(default = "default_compression")]
    pub compression: bool,

    /// Plaintext format (json, cbor)
    #[serde(default)]
    pub serialization: SerializationFormat,
}

fn default_cipher_spec() -> String {
    DEFAULT_CIPHER_SPEC.to_string()
}

fn default_compression() -> bool {
    true
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            cipher_spec: default_cipher_spec(),
            key: None,
            passphrase: None,
            salt: None,
            iv: None,
            compression: default_compression(),
            serialization: SerializationFormat::default(),
        }
    }
}

impl std::fmt::Debug for TranscoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscoderConfig")
            .field("cipher_spec", &self.cipher_spec)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .field("salt", &self.salt)
            .field("iv", &self.iv)
            .field("compression", &self.compression)
            .field("serialization", &self.serialization)
            .finish()
    }
}

impl TranscoderConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationError> {
        Ok(toml::from_str(content)?)
    }

    /// Turn the configuration into a builder, decoding base64 fields.
    pub fn to_builder(&self) -> Result<EncryptedTranscoderBuilder, ConfigurationError> {
        let mut builder = EncryptedTranscoder::builder()
            .cipher_spec(self.cipher_spec.clone())
            .compression(self.compression)
            .serialization(self.serialization);

        builder = match (&self.key, &self.passphrase) {
            (Some(key), _) => builder.key_base64(key.clone()),
            (None, Some(passphrase)) => {
                let salt = self.salt.as_deref().ok_or_else(|| {
                    ConfigurationError::KeyDerivation("passphrase requires a salt".to_string())
                })?;
                builder.passphrase(passphrase.clone(), decode_base64("salt", salt)?)
            }
            (None, None) => return Err(ConfigurationError::MissingKey),
        };

        if let Some(iv) = &self.iv {
            builder = builder.fixed_iv(decode_base64("iv", iv)?);
        }
        Ok(builder)
    }

    /// Validate and build the transcoder.
    pub fn build(&self) -> Result<EncryptedTranscoder, ConfigurationError> {
        self.to_builder()?.build()
    }
}

fn decode_base64(field: &'static str, value: &str) -> Result<Vec<u8>, ConfigurationError> {
    STANDARD
        .decode(value.trim())
        .map_err(|source| ConfigurationError::InvalidBase64 { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcoder::Transcoder;

    #[test]
    fn test_defaults_from_minimal_toml() -> anyhow::Result<()> {
        let config = TranscoderConfig::from_toml_str(
            r#"key = "4Io3Tji/578bgca6b140XQkA1A3ZKOQSjPYVOdDdY0Y=""#,
        )?;
        assert_eq!(config.cipher_spec, DEFAULT_CIPHER_SPEC);
        assert!(config.compression);
        assert_eq!(config.serialization, SerializationFormat::Json);
        assert!(config.iv.is_none());

        let transcoder = config.build()?;
        assert!(transcoder.is_authenticated());
        Ok(())
    }

    #[test]
    fn test_full_cbc_config() -> anyhow::Result<()> {
        let config = TranscoderConfig::from_toml_str(
            r#"
            cipher_spec = "AES/CBC/PKCS5Padding"
            key = "77LSKX7cjabjvDgjXyGWwA=="
            iv = "Tt6uHLdUp2VlRu8zunYQUA=="
            compression = false
            serialization = "cbor"
            "#,
        )?;
        let transcoder = config.build()?;
        assert!(!transcoder.compression());
        assert_eq!(transcoder.serialization(), SerializationFormat::Cbor);

        let encoded = transcoder.encode(Some(&vec![1u32, 2, 3]))?;
        assert_eq!(encoded, transcoder.encode(Some(&vec![1u32, 2, 3]))?);
        assert_eq!(transcoder.decode::<Vec<u32>>(&encoded)?, Some(vec![1, 2, 3]));
        Ok(())
    }

    #[test]
    fn test_passphrase_config() -> anyhow::Result<()> {
        let config = TranscoderConfig {
            passphrase: Some("correct horse battery staple".to_string()),
            salt: Some("AAAAAAAAAAAAAAAAAAAAAA==".to_string()),
            ..TranscoderConfig::default()
        };
        let a = config.build()?;
        let b = config.build()?;
        let encoded = a.encode(Some("shared secret"))?;
        assert_eq!(b.decode::<String>(&encoded)?.as_deref(), Some("shared secret"));
        Ok(())
    }

    #[test]
    fn test_missing_key_material() {
        assert!(matches!(
            TranscoderConfig::default().build(),
            Err(ConfigurationError::MissingKey)
        ));

        let config = TranscoderConfig {
            passphrase: Some("no salt".to_string()),
            ..TranscoderConfig::default()
        };
        assert!(matches!(
            config.build(),
            Err(ConfigurationError::KeyDerivation(_))
        ));
    }

    #[test]
    fn test_bad_base64_iv() {
        let config = TranscoderConfig {
            cipher_spec: "AES/CBC/PKCS7".to_string(),
            key: Some("77LSKX7cjabjvDgjXyGWwA==".to_string()),
            iv: Some("%%%".to_string()),
            ..TranscoderConfig::default()
        };
        assert!(matches!(
            config.build(),
            Err(ConfigurationError::InvalidBase64 { field: "iv", .. })
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            TranscoderConfig::from_toml_str("compression = \"yes\""),
            Err(ConfigurationError::Toml(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = TranscoderConfig {
            key: Some("77LSKX7cjabjvDgjXyGWwA==".to_string()),
            ..TranscoderConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("77LSKX7c"));
        assert!(debug.contains("<redacted>"));
    }
}

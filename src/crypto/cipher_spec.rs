//! Cipher specification parsing.
//!
//! A cipher spec has the form `ALGORITHM/MODE[/PADDING]`, e.g.
//! `AES/CBC/PKCS7`, `AES/GCM/NoPadding` or `ChaCha20/Poly1305`.
//! Parsing validates the combination up front so that an unsupported spec
//! fails at construction time, never on the first encode.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Default cipher spec: AES in GCM mode with a random nonce per message.
pub const DEFAULT_CIPHER_SPEC: &str = "AES/GCM/NoPadding";

/// AES block size and CBC IV length (bytes).
pub const AES_BLOCK_LEN: usize = 16;

/// Supported symmetric algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Aes,
    ChaCha20,
}

impl Algorithm {
    /// Name the key is bound to.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Aes => "AES",
            Algorithm::ChaCha20 => "ChaCha20",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Supported cipher modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Block cipher chaining with PKCS#7 padding.
    Cbc,
    /// AES-GCM (AEAD).
    Gcm,
    /// ChaCha20-Poly1305 (AEAD).
    Poly1305,
}

impl Mode {
    /// Whether the mode authenticates ciphertext and owns nonce generation.
    pub fn is_aead(self) -> bool {
        matches!(self, Mode::Gcm | Mode::Poly1305)
    }
}

/// A validated `ALGORITHM/MODE[/PADDING]` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherSpec {
    algorithm: Algorithm,
    mode: Mode,
    spec: String,
}

impl CipherSpec {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_aead(&self) -> bool {
        self.mode.is_aead()
    }

    /// The spec string as originally configured.
    pub fn as_str(&self) -> &str {
        &self.spec
    }

    /// Acceptable key lengths in bytes.
    pub fn key_lengths(&self) -> &'static [usize] {
        match (self.algorithm, self.mode) {
            (Algorithm::Aes, Mode::Cbc) => &[16, 24, 32],
            (Algorithm::Aes, _) => &[16, 32],
            (Algorithm::ChaCha20, _) => &[32],
        }
    }

    /// Human readable form of `key_lengths` for error messages.
    pub(crate) fn key_lengths_label(&self) -> &'static str {
        match (self.algorithm, self.mode) {
            (Algorithm::Aes, Mode::Cbc) => "16, 24 or 32 bytes",
            (Algorithm::Aes, _) => "16 or 32 bytes",
            (Algorithm::ChaCha20, _) => "32 bytes",
        }
    }
}

impl Default for CipherSpec {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Aes,
            mode: Mode::Gcm,
            spec: DEFAULT_CIPHER_SPEC.to_string(),
        }
    }
}

impl fmt::Display for CipherSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

impl FromStr for CipherSpec {
    type Err = ConfigurationError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = spec.trim().split('/').map(str::trim).collect();
        if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
            return Err(ConfigurationError::MalformedCipherSpec(spec.to_string()));
        }

        let algorithm = match parts[0].to_ascii_uppercase().as_str() {
            "AES" => Algorithm::Aes,
            "CHACHA20" => Algorithm::ChaCha20,
            _ => return Err(ConfigurationError::UnsupportedAlgorithm(parts[0].to_string())),
        };

        let mode = match (algorithm, parts[1].to_ascii_uppercase().as_str()) {
            (Algorithm::Aes, "CBC") => Mode::Cbc,
            (Algorithm::Aes, "GCM") => Mode::Gcm,
            (Algorithm::ChaCha20, "POLY1305") => Mode::Poly1305,
            _ => {
                return Err(ConfigurationError::UnsupportedMode {
                    algorithm: parts[0].to_string(),
                    mode: parts[1].to_string(),
                })
            }
        };

        let padding_ok = match (mode, parts.get(2).map(|p| p.to_ascii_uppercase())) {
            // CBC needs PKCS#7; PKCS5Padding is the same scheme under its legacy name
            (Mode::Cbc, Some(p)) => matches!(p.as_str(), "PKCS5PADDING" | "PKCS7PADDING" | "PKCS7"),
            (Mode::Cbc, None) => true,
            (_, Some(p)) => p == "NOPADDING",
            (_, None) => true,
        };
        if !padding_ok {
            return Err(ConfigurationError::UnsupportedPadding {
                mode: parts[1].to_string(),
                padding: parts.get(2).copied().unwrap_or_default().to_string(),
            });
        }

        Ok(Self {
            algorithm,
            mode,
            spec: spec.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cbc_variants() -> anyhow::Result<()> {
        for spec in ["AES/CBC/PKCS7", "AES/CBC/PKCS5Padding", "aes/cbc/pkcs7padding", "AES/CBC"] {
            let parsed: CipherSpec = spec.parse()?;
            assert_eq!(parsed.algorithm(), Algorithm::Aes);
            assert_eq!(parsed.mode(), Mode::Cbc);
            assert!(!parsed.is_aead());
        }
        Ok(())
    }

    #[test]
    fn test_parse_aead_variants() -> anyhow::Result<()> {
        let gcm: CipherSpec = "AES/GCM/NoPadding".parse()?;
        assert_eq!(gcm.mode(), Mode::Gcm);
        assert!(gcm.is_aead());

        let chacha: CipherSpec = "ChaCha20/Poly1305".parse()?;
        assert_eq!(chacha.algorithm(), Algorithm::ChaCha20);
        assert_eq!(chacha.key_lengths(), &[32]);
        Ok(())
    }

    #[test]
    fn test_default_is_gcm() {
        let spec = CipherSpec::default();
        assert_eq!(spec.as_str(), DEFAULT_CIPHER_SPEC);
        assert!(spec.is_aead());
    }

    #[test]
    fn test_malformed_spec() {
        for spec in ["AES", "", "AES//PKCS7", "AES/CBC/PKCS7/extra"] {
            assert!(matches!(
                spec.parse::<CipherSpec>(),
                Err(ConfigurationError::MalformedCipherSpec(_))
            ));
        }
    }

    #[test]
    fn test_unsupported_combinations() {
        assert!(matches!(
            "Blowfish/OFB/PKCS5Padding".parse::<CipherSpec>(),
            Err(ConfigurationError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            "AES/ECB/PKCS7".parse::<CipherSpec>(),
            Err(ConfigurationError::UnsupportedMode { .. })
        ));
        assert!(matches!(
            "AES/CBC/NoPadding".parse::<CipherSpec>(),
            Err(ConfigurationError::UnsupportedPadding { .. })
        ));
        assert!(matches!(
            "AES/GCM/PKCS7".parse::<CipherSpec>(),
            Err(ConfigurationError::UnsupportedPadding { .. })
        ));
    }
}

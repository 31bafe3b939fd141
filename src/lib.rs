//! Opaque State Library
//!
//! Keeps server-side state on the client. A value is serialized, optionally
//! gzip-compressed and encrypted into an opaque byte string, which is then
//! wrapped in a key of the form `<uuid>_<base64>` that the client sends back
//! on the next request. Nothing is stored on the server.
//!
//! Pipeline: Serialize (JSON/CBOR) -> Compress (gzip) -> Encrypt (AES-GCM, ChaCha20-Poly1305, AES-CBC) -> Key
//!
//! ```no_run
//! use opaque_state::{ClientStateRepository, EncryptedTranscoder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transcoder = EncryptedTranscoder::builder()
//!     .key_base64("4Io3Tji/578bgca6b140XQkA1A3ZKOQSjPYVOdDdY0Y=")
//!     .build()?;
//! let repo = ClientStateRepository::new(transcoder);
//!
//! let key = repo.key_for(&vec!["step-1", "step-2"])?.to_string();
//! let state: Option<Vec<String>> = repo.restore_str(&key)?;
//! assert_eq!(state.map(|s| s.len()), Some(2));
//! # Ok(())
//! # }
//! ```

pub mod compression;
pub mod config;
pub mod crypto;
pub mod error;
pub mod key;
pub mod repository;
pub mod serialization;
pub mod transcoder;

// Re-export main types
pub use config::TranscoderConfig;
pub use crypto::{CipherSpec, IvPolicy, NonceSource, OsRandomNonce, SecretKey};
pub use error::{
    CipherError, ConfigurationError, DecodingError, EncodingError, SerializationError,
    TokenFormatError,
};
pub use key::{ClientStateKey, KEY_FORMAT};
pub use repository::ClientStateRepository;
pub use serialization::SerializationFormat;
pub use transcoder::{EncryptedTranscoder, EncryptedTranscoderBuilder, Transcoder};

//! Nonce / IV generation.
//!
//! A nonce must be unique for every message encrypted under the same key.
//! Repeating one under AES-GCM or ChaCha20-Poly1305 breaks confidentiality,
//! so the default source draws from the OS CSPRNG on every call.

use rand::{rngs::OsRng, RngCore};

/// Source of per-message nonces (AEAD) and IVs (random-IV CBC).
///
/// Implementations are shared across threads and must never hand out the
/// same value twice for the lifetime of a key.
pub trait NonceSource: Send + Sync {
    /// Fill `nonce` with fresh bytes.
    fn fill(&self, nonce: &mut [u8]);
}

/// Nonces from the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandomNonce;

impl NonceSource for OsRandomNonce {
    fn fill(&self, nonce: &mut [u8]) {
        OsRng.fill_bytes(nonce);
    }
}

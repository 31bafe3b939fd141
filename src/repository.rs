//! Client state repository.
//!
//! Stores state nowhere: the key handed to the client *is* the state.
//! `key_for` encodes a state into a fresh key; `restore` turns a key the
//! client sent back into the state. Since there is no backing store there is
//! nothing to lock, update or remove.

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DecodingError, EncodingError, TokenFormatError};
use crate::key::ClientStateKey;
use crate::transcoder::{EncryptedTranscoder, Transcoder};

/// Repository that keeps state on the client inside opaque keys.
#[derive(Debug, Clone)]
pub struct ClientStateRepository<X = EncryptedTranscoder> {
    transcoder: X,
}

impl<X: Transcoder> ClientStateRepository<X> {
    pub fn new(transcoder: X) -> Self {
        Self { transcoder }
    }

    pub fn transcoder(&self) -> &X {
        &self.transcoder
    }

    /// Encode `state` into a key with a newly generated id.
    pub fn key_for<T: Serialize + ?Sized>(&self, state: &T) -> Result<ClientStateKey, EncodingError> {
        self.rekey(Uuid::new_v4(), state)
    }

    /// Encode `state` into a key that keeps an existing id.
    pub fn rekey<T: Serialize + ?Sized>(
        &self,
        id: Uuid,
        state: &T,
    ) -> Result<ClientStateKey, EncodingError> {
        let data = self.transcoder.encode(Some(state))?;
        debug!(%id, payload = data.len(), "issued client state key");
        Ok(ClientStateKey::with_id(id, data))
    }

    /// Parse a key string received from a client.
    pub fn parse_key(&self, key: &str) -> Result<ClientStateKey, TokenFormatError> {
        ClientStateKey::parse(key)
    }

    /// Restore the state carried by `key`. An empty payload yields `None`.
    pub fn restore<T: DeserializeOwned>(&self, key: &ClientStateKey) -> Result<Option<T>, DecodingError> {
        self.transcoder.decode(key.data())
    }

    /// Parse a key string and restore its state in one step.
    pub fn restore_str<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DecodingError> {
        let key = self.parse_key(key).map_err(|e| {
            debug!(error = %e, "rejected malformed client state key");
            DecodingError::MalformedKey(e)
        })?;
        self.restore(&key)
    }
}

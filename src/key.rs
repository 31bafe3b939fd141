//! Client state key - the opaque token handed to clients.
//!
//! A key has the form `<uuid>_<base64>`: a globally unique identifier
//! followed by the standard base64 (with padding) of the encrypted state.
//! Neither a canonical UUID nor the standard base64 alphabet contains `_`,
//! so splitting on `_` is always unambiguous.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::TokenFormatError;

/// Human readable key format, used in error messages.
pub const KEY_FORMAT: &str = "<uuid>_<base64-encoded-state>";

/// Length of a canonical hyphenated UUID string.
const UUID_STR_LEN: usize = 36;

/// Opaque key carrying the whole encrypted state.
///
/// Immutable once constructed. Two keys are equal when both the id and
/// every payload byte are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientStateKey {
    id: Uuid,
    data: Vec<u8>,
}

impl ClientStateKey {
    /// Wrap a payload with a freshly generated id.
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_id(Uuid::new_v4(), data)
    }

    /// Wrap a payload with an existing id.
    pub fn with_id(id: Uuid, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Encrypted state bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_parts(self) -> (Uuid, Vec<u8>) {
        (self.id, self.data)
    }

    /// Parse the external string form.
    pub fn parse(key: &str) -> Result<Self, TokenFormatError> {
        let tokens: Vec<&str> = key.split('_').collect();
        if tokens.len() != 2 {
            return Err(TokenFormatError::TokenCount(tokens.len()));
        }

        // Uuid::parse_str also accepts simple, braced and URN forms
        if tokens[0].len() != UUID_STR_LEN {
            return Err(TokenFormatError::InvalidId(None));
        }
        let id = Uuid::parse_str(tokens[0]).map_err(|e| TokenFormatError::InvalidId(Some(e)))?;

        let data = STANDARD
            .decode(tokens[1])
            .map_err(TokenFormatError::InvalidPayload)?;

        Ok(Self { id, data })
    }
}

impl fmt::Display for ClientStateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.id.hyphenated(), STANDARD.encode(&self.data))
    }
}

impl FromStr for ClientStateKey {
    type Err = TokenFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Keys persist as their string form.
impl Serialize for ClientStateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClientStateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

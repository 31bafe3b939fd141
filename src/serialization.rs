//! Serialization strategies.
//!
//! Any value implementing serde's `Serialize` / `DeserializeOwned` can be
//! encoded. JSON is the default; CBOR is more compact for binary-heavy state.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::SerializationError;

/// Wire format used for the plaintext before compression and encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SerializationFormat {
    #[default]
    Json,
    Cbor,
}

impl SerializationFormat {
    pub fn serialize<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>, SerializationError> {
        match self {
            SerializationFormat::Json => Ok(serde_json::to_vec(value)?),
            SerializationFormat::Cbor => {
                let mut buf = Vec::new();
                ciborium::into_writer(value, &mut buf)
                    .map_err(|e| SerializationError::Cbor(e.to_string()))?;
                Ok(buf)
            }
        }
    }

    pub fn deserialize<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T, SerializationError> {
        match self {
            SerializationFormat::Json => Ok(serde_json::from_slice(bytes)?),
            SerializationFormat::Cbor => {
                ciborium::from_reader(bytes).map_err(|e| SerializationError::Cbor(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Conversation {
        flow_id: String,
        step: u32,
        scope: BTreeMap<String, String>,
    }

    fn sample() -> Conversation {
        let mut scope = BTreeMap::new();
        scope.insert("vegan".to_string(), "0".to_string());
        Conversation {
            flow_id: "dinner".to_string(),
            step: 2,
            scope,
        }
    }

    #[test]
    fn test_json_and_cbor_roundtrip() -> anyhow::Result<()> {
        for format in [SerializationFormat::Json, SerializationFormat::Cbor] {
            let bytes = format.serialize(&sample())?;
            let restored: Conversation = format.deserialize(&bytes)?;
            assert_eq!(restored, sample());
        }
        Ok(())
    }

    #[test]
    fn test_formats_are_not_interchangeable() -> anyhow::Result<()> {
        let cbor = SerializationFormat::Cbor.serialize(&sample())?;
        assert!(SerializationFormat::Json
            .deserialize::<Conversation>(&cbor)
            .is_err());
        Ok(())
    }

    #[test]
    fn test_truncated_input_fails() -> anyhow::Result<()> {
        let json = SerializationFormat::Json.serialize(&sample())?;
        let result = SerializationFormat::Json.deserialize::<Conversation>(&json[..json.len() - 3]);
        assert!(matches!(result, Err(SerializationError::Json(_))));
        Ok(())
    }

    #[test]
    fn test_format_names() -> anyhow::Result<()> {
        let format: SerializationFormat = serde_json::from_str("\"cbor\"")?;
        assert_eq!(format, SerializationFormat::Cbor);
        assert_eq!(SerializationFormat::default(), SerializationFormat::Json);
        Ok(())
    }
}

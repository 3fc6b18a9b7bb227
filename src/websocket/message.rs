use serde::{Deserialize, Deserializer, Serialize};

use crate::error::WebSocketError;

/// One signaling frame, `{"type": ..., "data": ...}` on the wire.
///
/// The server never looks inside either field. Unknown fields are ignored
/// and a missing or `null` field decodes as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RelayMessage {
    pub fn new(kind: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: data.into(),
        }
    }

    pub fn decode(frame: &[u8]) -> Result<Self, WebSocketError> {
        serde_json::from_slice(frame).map_err(|e| WebSocketError::InvalidFormat(e.to_string()))
    }

    pub fn encode(&self) -> Result<String, WebSocketError> {
        serde_json::to_string(self).map_err(|e| WebSocketError::InvalidFormat(e.to_string()))
    }
}

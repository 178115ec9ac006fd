//! Registry keys and relayed frames

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::error::RegistryError;

/// Producer-supplied session identifier
///
/// Opaque to the relay. Cheap to clone; the same id is attached to every
/// frame a producer sends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(Arc<str>);

impl ClientId {
    /// Create a client id, rejecting the empty string
    pub fn new(id: impl AsRef<str>) -> Result<Self, RegistryError> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(RegistryError::EmptyClientId);
        }
        Ok(Self(Arc::from(id)))
    }

    /// Fresh random id (UUID v4), as capture agents pick for themselves
    pub fn random() -> Self {
        Self(Arc::from(uuid::Uuid::new_v4().to_string()))
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClientId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ClientId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ClientId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// Capture source a producer connection carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// Screen capture
    Screen,
    /// Webcam capture
    Webcam,
}

impl StreamKind {
    /// All kinds, in presence order
    pub const ALL: [StreamKind; 2] = [StreamKind::Screen, StreamKind::Webcam];

    /// Wire name used in paths and viewer messages
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Screen => "screen",
            StreamKind::Webcam => "webcam",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "screen" => Ok(StreamKind::Screen),
            "webcam" => Ok(StreamKind::Webcam),
            other => Err(RegistryError::UnknownStreamKind(other.to_string())),
        }
    }
}

/// A decoded frame on its way to viewers
///
/// Cheap to clone: the payload is reference counted, not copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Producer that sent the frame
    pub client_id: ClientId,
    /// Capture source
    pub kind: StreamKind,
    /// Image bytes (JPEG in practice, opaque to the relay)
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame
    pub fn new(client_id: ClientId, kind: StreamKind, payload: Bytes) -> Self {
        Self {
            client_id,
            kind,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_rejects_empty() {
        assert_eq!(ClientId::new(""), Err(RegistryError::EmptyClientId));
        assert_eq!(ClientId::new("abc").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_random_client_ids_differ() {
        let a = ClientId::random();
        let b = ClientId::random();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_stream_kind_parse() {
        assert_eq!("screen".parse::<StreamKind>(), Ok(StreamKind::Screen));
        assert_eq!("webcam".parse::<StreamKind>(), Ok(StreamKind::Webcam));
        assert_eq!(
            "audio".parse::<StreamKind>(),
            Err(RegistryError::UnknownStreamKind("audio".into()))
        );
        // Kinds are case sensitive on the wire
        assert!("Screen".parse::<StreamKind>().is_err());
    }

    #[test]
    fn test_stream_kind_serde_names() {
        assert_eq!(serde_json::to_string(&StreamKind::Webcam).unwrap(), "\"webcam\"");
        assert_eq!(StreamKind::Screen.to_string(), "screen");
    }

    #[test]
    fn test_client_id_serde() {
        let id = ClientId::new("c-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c-1\"");
        assert!(serde_json::from_str::<ClientId>("\"\"").is_err());
    }
}

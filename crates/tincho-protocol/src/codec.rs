//! Wire format for requests, replies and updates.
//!
//! The server is generic over [`Codec`]; the browser client only speaks
//! [`JsonCodec`].
//!
//! Inbound actions are the one exception: they go through
//! [`Action::decode`](crate::Action::decode), which reads the discriminant
//! before choosing a payload shape so an unknown `type` is reported as
//! such instead of as a generic parse failure.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task of the server.
pub trait Codec: Send + Sync + 'static {
    /// # Errors
    /// `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Browsers speak JSON natively, so this is what the web client expects.
///
/// ## Example
///
/// ```rust
/// use tincho_protocol::{Codec, JsonCodec, TurnUpdate, Update};
///
/// let codec = JsonCodec;
/// let update = Update::Turn(TurnUpdate { player: "ana".into() });
///
/// let bytes = codec.encode(&update).unwrap();
/// assert_eq!(bytes, br#"{"type":"turn","data":{"player":"ana"}}"#);
///
/// let decoded: Update = codec.decode(&bytes).unwrap();
/// assert_eq!(update, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

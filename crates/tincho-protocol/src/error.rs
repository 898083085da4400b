/// A frame could not be turned into a request or action, or a message
/// could not be turned into a frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Malformed JSON, or a payload missing fields its `type` needs.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope's `type` is not one this side understands.
    #[error("unknown message type {0:?}")]
    UnknownType(String),

    /// The peer broke the handshake, e.g. hung up or stalled before
    /// sending its request.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

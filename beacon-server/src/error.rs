use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Sanitize produced an id that is still taken.
    #[error("streamer id '{id}' is already registered")]
    IdCollision { id: String },

    #[error("no streamer registered as '{id}'")]
    UnknownStreamer { id: String },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("undecodable signalling frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("binary frame is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("transport already closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("signalling server is no longer running")]
    Stopped,
}

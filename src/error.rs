// Monitor error kinds

use crate::decoder::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// `GET /baseurl` failed or returned an empty body.
    #[error("endpoint resolution failed: {0}")]
    StartupResolution(String),

    #[error("invalid origin {origin:?}: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    /// Opening or reading the stats socket failed.
    #[error("stream connection failed: {0}")]
    Connection(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("table container element #{0} not found")]
    MissingContainerElement(String),
}

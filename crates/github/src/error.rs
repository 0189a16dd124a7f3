use std::error::Error as StdError;

use crate::events::EventKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required delivery header is absent or not valid UTF-8.
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    /// The signature header is absent or does not match the body.
    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("invalid webhook payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The registered handler rejected the event.
    #[error("{kind} handler failed: {source}")]
    Handler {
        kind: EventKind,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    /// Whether the failure lies with the request rather than with handling it.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Handler { .. })
    }
}

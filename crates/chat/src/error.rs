/// Crate-wide result type for chat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed chat errors shared by every `ChatClient` implementation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A team, channel or post does not exist (or is not visible).
    #[error("{resource} not found: {name}")]
    NotFound {
        resource: &'static str,
        name: String,
    },

    /// Operation is currently unavailable (not configured/ready).
    #[error("chat operation unavailable: {message}")]
    Unavailable { message: String },

    /// The server answered with a non-success status.
    #[error("chat API request failed ({status}): {body}")]
    Status { status: u16, body: String },

    /// Transport-level HTTP failure.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn not_found(resource: &'static str, name: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource,
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

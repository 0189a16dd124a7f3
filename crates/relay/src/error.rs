/// Crate-wide result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configured team or channel does not exist.
    #[error("{resource} not found: {name}")]
    NotFound {
        resource: &'static str,
        name: String,
    },

    /// The relay cannot act yet (no bot identity).
    #[error("relay unavailable: {message}")]
    Unavailable { message: String },

    /// A chat API call failed; `context` names the operation and its target.
    #[error("{context}: {source}")]
    Chat {
        context: String,
        #[source]
        source: hookfeed_chat::Error,
    },

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
    pub fn chat(context: impl Into<String>, source: hookfeed_chat::Error) -> Self {
        Self::Chat {
            context: context.into(),
            source,
        }
    }

    /// Map a lookup failure: a missing entity becomes [`Error::NotFound`],
    /// anything else is wrapped with `context`.
    #[must_use]
    pub fn lookup(
        resource: &'static str,
        name: &str,
        context: impl Into<String>,
        source: hookfeed_chat::Error,
    ) -> Self {
        if source.is_not_found() {
            Self::not_found(resource, name)
        } else {
            Self::chat(context, source)
        }
    }
}

//! GitHub webhook intake for hookfeed.
//!
//! Verifies `X-Hub-Signature-256`, classifies the delivery by
//! `X-GitHub-Event` and payload `action`, and hands supported events to the
//! handler registered for their kind.

pub mod error;
pub mod events;
pub mod router;
pub mod signature;

pub use {
    error::{Error, Result},
    events::{EventKind, GithubEvent},
    router::{Dispatch, EventHandler, EventRouter},
};

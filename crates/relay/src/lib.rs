//! Reconciles GitHub activity into chat feeds.
//!
//! Each delivery is turned into at most one create, or a pin/unpin pass over
//! the posts the bot made earlier for the same issue or pull request. Posts
//! are found by a tracking term (`#owner.repo.number`) embedded in their
//! text, so no local state is kept.

pub mod destination;
pub mod error;
pub mod feeds;
pub mod fuzzy;
pub mod identity;
pub mod listeners;
pub mod locator;
pub mod reconciler;
pub mod relay;
pub mod self_check;
pub mod term_lock;

#[cfg(test)]
mod testing;

pub use {
    error::{Error, Result},
    feeds::{FeedKind, FeedSettings, FeedTarget, RelaySettings},
    reconciler::{Outcome, Reconciler, SkipReason, tracking_term},
    relay::Relay,
    self_check::{MissingChannel, SelfCheckReport},
};

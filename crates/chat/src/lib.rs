//! Chat platform access for hookfeed.
//!
//! The relay core only talks to the [`ChatClient`] trait; [`MattermostClient`]
//! is the production implementation over the Mattermost REST API.

pub mod client;
pub mod error;
pub mod mattermost;
pub mod paging;
pub mod types;

pub use {
    client::ChatClient,
    error::{Error, Result},
    mattermost::MattermostClient,
    paging::{PAGE_SIZE, paginate},
    types::{Channel, NewPost, Post, Team, TeamMember, User},
};

use async_trait::async_trait;

use crate::{
    Result,
    types::{Channel, NewPost, Post, Team, TeamMember, User},
};

/// Team, channel and post operations the relay needs from a chat server.
///
/// Lookups by name return [`crate::Error::NotFound`] when the entity is
/// absent so callers can tell a missing destination from a transport failure.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// The account the client is authenticated as.
    async fn get_me(&self) -> Result<User>;

    async fn get_team_by_name(&self, name: &str) -> Result<Team>;

    /// One page of the teams visible to the account, zero-based.
    async fn list_teams(&self, page: u32, per_page: u32) -> Result<Vec<Team>>;

    /// One page of team members, zero-based.
    async fn list_team_members(
        &self,
        team_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<TeamMember>>;

    async fn add_team_member(&self, team_id: &str, user_id: &str) -> Result<TeamMember>;

    async fn get_channel_by_name(
        &self,
        team_id: &str,
        name: &str,
        include_deleted: bool,
    ) -> Result<Channel>;

    /// One page of public channels, zero-based.
    async fn list_public_channels(
        &self,
        team_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Channel>>;

    /// Full-text search across every channel of a team.
    async fn search_posts(&self, team_id: &str, terms: &str) -> Result<Vec<Post>>;

    async fn create_post(&self, post: NewPost) -> Result<Post>;

    async fn update_post(&self, post: &Post) -> Result<Post>;
}

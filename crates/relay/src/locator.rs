use std::sync::Arc;

use {
    hookfeed_chat::{ChatClient, Post},
    tracing::debug,
};

use crate::{
    Error, Result,
    destination::{Destination, DestinationResolver},
    feeds::FeedTarget,
};

/// Posts found for a tracking term, with the destination they were looked up in.
#[derive(Debug, Clone)]
pub struct Located {
    pub destination: Destination,
    pub posts: Vec<Post>,
}

/// Finds the bot's earlier announcements for a tracking term.
#[derive(Clone)]
pub struct PostLocator {
    chat: Arc<dyn ChatClient>,
    resolver: DestinationResolver,
}

impl PostLocator {
    pub fn new(chat: Arc<dyn ChatClient>, resolver: DestinationResolver) -> Self {
        Self { chat, resolver }
    }

    /// Search the target team for `term`, keeping only the bot's posts in the
    /// target channel.
    pub async fn locate(
        &self,
        bot_user_id: &str,
        term: &str,
        target: &FeedTarget,
    ) -> Result<Located> {
        let destination = self.resolver.resolve(bot_user_id, target).await?;
        let found = self
            .chat
            .search_posts(&destination.team.id, term)
            .await
            .map_err(|e| Error::chat(format!("failed to search posts for {term}"), e))?;

        let total = found.len();
        let posts = tracked_posts(found, &destination.channel.id, bot_user_id);
        debug!(term, total, kept = posts.len(), "searched for tracked posts");

        Ok(Located { destination, posts })
    }

    pub async fn find_posts(
        &self,
        bot_user_id: &str,
        term: &str,
        target: &FeedTarget,
    ) -> Result<Vec<Post>> {
        Ok(self.locate(bot_user_id, term, target).await?.posts)
    }
}

/// Keep posts in `channel_id` authored by `bot_user_id`, preserving order.
pub fn tracked_posts(posts: Vec<Post>, channel_id: &str, bot_user_id: &str) -> Vec<Post> {
    posts
        .into_iter()
        .filter(|p| p.channel_id == channel_id && p.user_id == bot_user_id)
        .collect()
}

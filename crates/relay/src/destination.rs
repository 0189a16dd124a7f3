//! Turns configured team and channel names into live chat entities.

use std::sync::Arc;

use {
    futures::TryStreamExt,
    hookfeed_chat::{Channel, ChatClient, PAGE_SIZE, Team, paginate},
    tracing::{debug, info, warn},
};

use crate::{Error, Result, feeds::FeedTarget};

/// A resolved feed destination.
#[derive(Debug, Clone)]
pub struct Destination {
    pub team: Team,
    pub channel: Channel,
}

#[derive(Clone)]
pub struct DestinationResolver {
    chat: Arc<dyn ChatClient>,
}

impl DestinationResolver {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    /// Look a team up by name without touching its membership.
    pub async fn find_team(&self, team_name: &str) -> Result<Team> {
        self.chat
            .get_team_by_name(team_name)
            .await
            .map_err(|e| {
                Error::lookup(
                    "team",
                    team_name,
                    format!("failed to get team by name {team_name}"),
                    e,
                )
            })
    }

    /// Look a team up and make sure the bot belongs to it.
    ///
    /// A failed join is logged and the team is still returned; the post that
    /// follows surfaces the real permission problem.
    pub async fn ensure_team(&self, bot_user_id: &str, team_name: &str) -> Result<Team> {
        let team = self.find_team(team_name).await?;

        if self.is_member(&team, bot_user_id).await? {
            return Ok(team);
        }

        match self.chat.add_team_member(&team.id, bot_user_id).await {
            Ok(_) => info!(team = %team.name, "bot joined team"),
            Err(e) => warn!(team = %team.name, error = %e, "failed to add bot to team"),
        }
        Ok(team)
    }

    pub async fn find_channel(&self, team: &Team, channel_name: &str) -> Result<Channel> {
        self.chat
            .get_channel_by_name(&team.id, channel_name, false)
            .await
            .map_err(|e| {
                Error::lookup(
                    "channel",
                    channel_name,
                    format!(
                        "failed to get channel by name {channel_name} in team {}",
                        team.name
                    ),
                    e,
                )
            })
    }

    /// Resolve both halves of `target`, joining the team if needed.
    pub async fn resolve(&self, bot_user_id: &str, target: &FeedTarget) -> Result<Destination> {
        let team = self.ensure_team(bot_user_id, &target.team).await?;
        let channel = self.find_channel(&team, &target.channel).await?;
        Ok(Destination { team, channel })
    }

    /// Scan the member list page by page, stopping at the first match.
    async fn is_member(&self, team: &Team, user_id: &str) -> Result<bool> {
        let members = paginate(PAGE_SIZE, |page| {
            self.chat.list_team_members(&team.id, page, PAGE_SIZE)
        });
        let mut members = std::pin::pin!(members);

        while let Some(member) = members
            .try_next()
            .await
            .map_err(|e| Error::chat(format!("failed to list members of team {}", team.name), e))?
        {
            if member.user_id == user_id {
                debug!(team = %team.name, "bot is already a team member");
                return Ok(true);
            }
        }
        Ok(false)
    }
}

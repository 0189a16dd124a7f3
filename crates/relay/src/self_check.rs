//! Startup audit of the configured destinations.
//!
//! Never mutates chat state and never fails: every problem is logged and
//! reflected in the returned [`SelfCheckReport`].

use std::sync::Arc;

use {
    futures::TryStreamExt,
    hookfeed_chat::{ChatClient, PAGE_SIZE, Team, paginate},
    tracing::{info, warn},
};

use crate::{
    destination::DestinationResolver,
    feeds::{FeedKind, FeedSettings},
    fuzzy,
};

/// A configured channel that does not exist in the team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingChannel {
    pub feed: FeedKind,
    pub name: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfCheckReport {
    /// No team is configured.
    Skipped,
    /// The team does not resolve; `available` lists the team names visible
    /// to the bot (empty when they could not be listed).
    TeamNotFound {
        team_name: String,
        available: Vec<String>,
    },
    /// The channel listing could not be fetched.
    Incomplete { team_name: String, reason: String },
    Completed {
        team_name: String,
        missing: Vec<MissingChannel>,
    },
}

impl SelfCheckReport {
    /// True when every configured destination exists (or nothing is configured).
    pub fn passed(&self) -> bool {
        match self {
            Self::Skipped => true,
            Self::Completed { missing, .. } => missing.is_empty(),
            Self::TeamNotFound { .. } | Self::Incomplete { .. } => false,
        }
    }
}

pub struct SelfCheck {
    chat: Arc<dyn ChatClient>,
    resolver: DestinationResolver,
}

impl SelfCheck {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        let resolver = DestinationResolver::new(Arc::clone(&chat));
        Self { chat, resolver }
    }

    pub async fn run(&self, feeds: &FeedSettings) -> SelfCheckReport {
        let team_name = feeds.team_name.as_str();
        if team_name.is_empty() {
            info!("team name is not set, skipping self check");
            return SelfCheckReport::Skipped;
        }

        let team = match self.resolver.find_team(team_name).await {
            Ok(team) => team,
            Err(e) => {
                warn!(team = team_name, error = %e, "unable to find configured team");
                let available = self.log_available_teams().await;
                return SelfCheckReport::TeamNotFound {
                    team_name: team_name.to_string(),
                    available,
                };
            },
        };

        let catalog = match self.channel_catalog(&team).await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(team = team_name, error = %e, "unable to list channels");
                return SelfCheckReport::Incomplete {
                    team_name: team_name.to_string(),
                    reason: e.to_string(),
                };
            },
        };

        let missing: Vec<(FeedKind, &str)> = FeedKind::ALL
            .into_iter()
            .map(|feed| (feed, feeds.channel(feed)))
            .filter(|(_, name)| !name.is_empty() && !catalog.iter().any(|c| c == *name))
            .collect();

        if missing.is_empty() {
            info!(team = team_name, "self check passed");
            return SelfCheckReport::Completed {
                team_name: team_name.to_string(),
                missing: Vec::new(),
            };
        }

        warn!(team = team_name, "one or more configured channels were not found");
        match serde_json::to_string(&catalog) {
            Ok(json) => info!(channels = %json, "existing channels"),
            Err(e) => warn!(error = %e, "unable to encode channel names"),
        }

        let missing = missing
            .into_iter()
            .map(|(feed, name)| {
                let suggestions = fuzzy::suggest_names(name, &catalog);
                match serde_json::to_string(&suggestions) {
                    Ok(json) => warn!(
                        feed = %feed,
                        channel = name,
                        suggestions = %json,
                        "configured channel not found, did you mean one of these?"
                    ),
                    Err(e) => warn!(
                        feed = %feed,
                        channel = name,
                        error = %e,
                        "configured channel not found, unable to recommend channel names"
                    ),
                }
                MissingChannel {
                    feed,
                    name: name.to_string(),
                    suggestions,
                }
            })
            .collect();

        SelfCheckReport::Completed {
            team_name: team_name.to_string(),
            missing,
        }
    }

    async fn log_available_teams(&self) -> Vec<String> {
        let teams = paginate(PAGE_SIZE, |page| self.chat.list_teams(page, PAGE_SIZE));
        let names: Vec<String> = match teams.map_ok(|t| t.name).try_collect().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "unable to list teams");
                return Vec::new();
            },
        };
        match serde_json::to_string(&names) {
            Ok(json) => info!(teams = %json, "available teams"),
            Err(e) => warn!(error = %e, "unable to encode team names"),
        }
        names
    }

    /// Names of every public channel in `team`, in listing order.
    async fn channel_catalog(&self, team: &Team) -> hookfeed_chat::Result<Vec<String>> {
        let channels = paginate(PAGE_SIZE, |page| {
            self.chat.list_public_channels(&team.id, page, PAGE_SIZE)
        });
        let mut channels = std::pin::pin!(channels);

        let mut names = Vec::new();
        while let Some(channel) = channels.try_next().await? {
            if channel.name.is_empty() {
                warn!(
                    channel_id = %channel.id,
                    display_name = %channel.display_name,
                    "channel has an empty name"
                );
                continue;
            }
            names.push(channel.name);
        }
        Ok(names)
    }
}

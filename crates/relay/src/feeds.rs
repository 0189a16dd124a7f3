use {
    hookfeed_config::{FeedsConfig, HookfeedConfig},
    hookfeed_github::EventKind,
    secrecy::Secret,
};

/// The three kinds of announcement hookfeed posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Issues,
    PullRequests,
    Releases,
}

impl FeedKind {
    pub const ALL: [Self; 3] = [Self::Issues, Self::PullRequests, Self::Releases];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issues => "issue",
            Self::PullRequests => "pull request",
            Self::Releases => "release",
        }
    }

    /// Event kinds relayed into this feed.
    pub fn event_kinds(self) -> &'static [EventKind] {
        match self {
            Self::Issues => &[EventKind::IssueOpened],
            Self::PullRequests => &[
                EventKind::PullRequestOpened,
                EventKind::PullRequestReadyForReview,
                EventKind::PullRequestClosed,
            ],
            Self::Releases => &[EventKind::ReleaseReleased, EventKind::ReleasePrereleased],
        }
    }
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Team and channel names of one active feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedTarget {
    pub team: String,
    pub channel: String,
}

/// Destination names with surrounding whitespace removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSettings {
    pub team_name: String,
    pub issue_channel: String,
    pub pull_request_channel: String,
    pub release_channel: String,
}

impl FeedSettings {
    pub fn new(
        team_name: &str,
        issue_channel: &str,
        pull_request_channel: &str,
        release_channel: &str,
    ) -> Self {
        Self {
            team_name: team_name.trim().to_string(),
            issue_channel: issue_channel.trim().to_string(),
            pull_request_channel: pull_request_channel.trim().to_string(),
            release_channel: release_channel.trim().to_string(),
        }
    }

    pub fn from_config(config: &FeedsConfig) -> Self {
        Self::new(
            &config.team_name,
            &config.issue_feed_channel_name,
            &config.pull_request_channel_name,
            &config.release_channel_name,
        )
    }

    pub fn channel(&self, kind: FeedKind) -> &str {
        match kind {
            FeedKind::Issues => &self.issue_channel,
            FeedKind::PullRequests => &self.pull_request_channel,
            FeedKind::Releases => &self.release_channel,
        }
    }

    /// The feed's destination, or `None` when the team or the feed's
    /// channel is unset (the feed is disabled).
    pub fn target(&self, kind: FeedKind) -> Option<FeedTarget> {
        let channel = self.channel(kind);
        if self.team_name.is_empty() || channel.is_empty() {
            return None;
        }
        Some(FeedTarget {
            team: self.team_name.clone(),
            channel: channel.to_string(),
        })
    }
}

/// Immutable settings snapshot the relay runs with.
#[derive(Debug, Clone, Default)]
pub struct RelaySettings {
    pub feeds: FeedSettings,
    pub webhook_secret: Option<Secret<String>>,
}

impl RelaySettings {
    pub fn from_config(config: &HookfeedConfig) -> Self {
        Self {
            feeds: FeedSettings::from_config(&config.feeds),
            webhook_secret: config.github.webhook_secret.clone(),
        }
    }
}

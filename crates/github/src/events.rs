//! Webhook payloads for the deliveries hookfeed relays.
//!
//! Only the fields the relay reads are modelled; GitHub sends many more.

use serde::Deserialize;

use crate::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Account,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    /// `"reopened"`, `"completed"`, `"not_planned"` or absent.
    #[serde(default)]
    pub state_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub name: Option<String>,
    pub tag_name: String,
    pub html_url: String,
}

impl Release {
    /// Release title, falling back to the tag when the release is unnamed.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.tag_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub issue: Issue,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseEvent {
    pub action: String,
    pub release: Release,
    pub repository: Repository,
}

/// The (event, action) pairs hookfeed reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    IssueOpened,
    PullRequestOpened,
    PullRequestReadyForReview,
    PullRequestClosed,
    ReleaseReleased,
    ReleasePrereleased,
}

impl EventKind {
    pub const ALL: [Self; 6] = [
        Self::IssueOpened,
        Self::PullRequestOpened,
        Self::PullRequestReadyForReview,
        Self::PullRequestClosed,
        Self::ReleaseReleased,
        Self::ReleasePrereleased,
    ];

    /// Map an `X-GitHub-Event` name and payload `action` to a kind.
    pub fn from_delivery(event_name: &str, action: &str) -> Option<Self> {
        match (event_name, action) {
            ("issues", "opened") => Some(Self::IssueOpened),
            ("pull_request", "opened") => Some(Self::PullRequestOpened),
            ("pull_request", "ready_for_review") => Some(Self::PullRequestReadyForReview),
            ("pull_request", "closed") => Some(Self::PullRequestClosed),
            ("release", "released") => Some(Self::ReleaseReleased),
            ("release", "prereleased") => Some(Self::ReleasePrereleased),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::IssueOpened => "issues.opened",
            Self::PullRequestOpened => "pull_request.opened",
            Self::PullRequestReadyForReview => "pull_request.ready_for_review",
            Self::PullRequestClosed => "pull_request.closed",
            Self::ReleaseReleased => "release.released",
            Self::ReleasePrereleased => "release.prereleased",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed delivery of one of the supported kinds.
#[derive(Debug, Clone)]
pub enum GithubEvent {
    IssueOpened(IssuesEvent),
    PullRequestOpened(PullRequestEvent),
    PullRequestReadyForReview(PullRequestEvent),
    PullRequestClosed(PullRequestEvent),
    ReleaseReleased(ReleaseEvent),
    ReleasePrereleased(ReleaseEvent),
}

#[derive(Deserialize)]
struct ActionOnly {
    #[serde(default)]
    action: String,
}

impl GithubEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::IssueOpened(_) => EventKind::IssueOpened,
            Self::PullRequestOpened(_) => EventKind::PullRequestOpened,
            Self::PullRequestReadyForReview(_) => EventKind::PullRequestReadyForReview,
            Self::PullRequestClosed(_) => EventKind::PullRequestClosed,
            Self::ReleaseReleased(_) => EventKind::ReleaseReleased,
            Self::ReleasePrereleased(_) => EventKind::ReleasePrereleased,
        }
    }

    /// Parse a delivery body.
    ///
    /// Returns `Ok(None)` for events and actions hookfeed does not handle
    /// (including `ping`), without decoding the rest of the payload.
    pub fn parse(event_name: &str, body: &[u8]) -> Result<Option<Self>> {
        let ActionOnly { action } = serde_json::from_slice(body)?;
        let Some(kind) = EventKind::from_delivery(event_name, &action) else {
            return Ok(None);
        };
        let event = match kind {
            EventKind::IssueOpened => Self::IssueOpened(serde_json::from_slice(body)?),
            EventKind::PullRequestOpened => Self::PullRequestOpened(serde_json::from_slice(body)?),
            EventKind::PullRequestReadyForReview => {
                Self::PullRequestReadyForReview(serde_json::from_slice(body)?)
            },
            EventKind::PullRequestClosed => Self::PullRequestClosed(serde_json::from_slice(body)?),
            EventKind::ReleaseReleased => Self::ReleaseReleased(serde_json::from_slice(body)?),
            EventKind::ReleasePrereleased => {
                Self::ReleasePrereleased(serde_json::from_slice(body)?)
            },
        };
        Ok(Some(event))
    }
}

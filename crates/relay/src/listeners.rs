use std::sync::Arc;

use {
    async_trait::async_trait,
    hookfeed_github::{EventHandler, EventRouter, GithubEvent},
    tracing::{debug, info},
};

use crate::{
    feeds::{FeedKind, FeedTarget, RelaySettings},
    reconciler::Reconciler,
};

/// Routes the events of one feed into the reconciler.
///
/// Holds the target it was registered with, so a handler that is already
/// running is unaffected by a settings swap.
pub struct FeedListener {
    target: FeedTarget,
    reconciler: Arc<Reconciler>,
}

impl FeedListener {
    pub fn new(target: FeedTarget, reconciler: Arc<Reconciler>) -> Self {
        Self { target, reconciler }
    }
}

#[async_trait]
impl EventHandler for FeedListener {
    async fn handle(&self, event: GithubEvent) -> anyhow::Result<()> {
        let target = &self.target;
        let reconciler = &self.reconciler;
        let outcome = match &event {
            GithubEvent::IssueOpened(e) => reconciler.issue_opened(target, e).await?,
            GithubEvent::PullRequestOpened(e) => reconciler.pull_request_opened(target, e).await?,
            GithubEvent::PullRequestReadyForReview(e) => {
                reconciler.pull_request_ready(target, e).await?
            },
            GithubEvent::PullRequestClosed(e) => reconciler.pull_request_closed(target, e).await?,
            GithubEvent::ReleaseReleased(e) => reconciler.release_published(target, e).await?,
            GithubEvent::ReleasePrereleased(e) => {
                reconciler.release_prereleased(target, e).await?
            },
        };
        debug!(kind = %event.kind(), channel = %target.channel, ?outcome, "event reconciled");
        Ok(())
    }
}

/// Build a router with one listener per active feed.
///
/// A feed missing its team or channel name gets no handler, so its events
/// are dropped without any chat API call.
pub fn build_router(settings: &RelaySettings, reconciler: &Arc<Reconciler>) -> EventRouter {
    let mut router = EventRouter::new(settings.webhook_secret.clone());
    for feed in FeedKind::ALL {
        let Some(target) = settings.feeds.target(feed) else {
            info!(feed = %feed, "team name or {feed} channel name is not set, skipping listener setup");
            continue;
        };
        let listener: Arc<dyn EventHandler> =
            Arc::new(FeedListener::new(target, Arc::clone(reconciler)));
        for kind in feed.event_kinds() {
            router.on(*kind, Arc::clone(&listener));
        }
    }
    router
}

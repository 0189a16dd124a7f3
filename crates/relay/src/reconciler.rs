//! Decides, per GitHub event, what the chat feed should look like and makes
//! it so.

use std::sync::Arc;

use {
    hookfeed_chat::{ChatClient, NewPost, Post},
    hookfeed_github::events::{IssuesEvent, PullRequestEvent, Release, ReleaseEvent, Repository},
    tracing::{debug, info},
};

use crate::{
    Error, Result,
    destination::DestinationResolver,
    feeds::FeedTarget,
    identity::BotIdentity,
    locator::{Located, PostLocator},
    term_lock::TermLocks,
};

/// Why an event produced no chat change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ReopenedIssue,
    DraftPullRequest,
}

/// What a reconciliation did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Created(Post),
    /// Existing posts were found; this many were re-pinned.
    Pinned(usize),
    Unpinned(usize),
    Skipped(SkipReason),
}

/// Stable key for an issue or pull request: `#<owner>.<repo>.<number>`.
pub fn tracking_term(repository: &Repository, number: u64) -> String {
    format!("#{}.{}.{}", repository.owner.login, repository.name, number)
}

pub struct Reconciler {
    chat: Arc<dyn ChatClient>,
    resolver: DestinationResolver,
    locator: PostLocator,
    identity: Arc<BotIdentity>,
    locks: TermLocks,
}

impl Reconciler {
    pub fn new(chat: Arc<dyn ChatClient>, identity: Arc<BotIdentity>) -> Self {
        let resolver = DestinationResolver::new(Arc::clone(&chat));
        let locator = PostLocator::new(Arc::clone(&chat), resolver.clone());
        Self {
            chat,
            resolver,
            locator,
            identity,
            locks: TermLocks::new(),
        }
    }

    pub fn identity(&self) -> &Arc<BotIdentity> {
        &self.identity
    }

    /// Announce a new issue, unless it was reopened.
    pub async fn issue_opened(
        &self,
        target: &FeedTarget,
        event: &IssuesEvent,
    ) -> Result<Outcome> {
        let issue = &event.issue;
        if issue.state_reason.as_deref() == Some("reopened") {
            debug!(number = issue.number, "skipping reopened issue");
            return Ok(Outcome::Skipped(SkipReason::ReopenedIssue));
        }

        let message = format!("{}\n\n{}", issue.title, issue.html_url);
        self.send_message(message, target, false).await
    }

    /// Announce a pull request once and keep its announcement pinned.
    /// Drafts are skipped.
    pub async fn pull_request_opened(
        &self,
        target: &FeedTarget,
        event: &PullRequestEvent,
    ) -> Result<Outcome> {
        if event.pull_request.draft {
            debug!(number = event.pull_request.number, "skipping draft pull request");
            return Ok(Outcome::Skipped(SkipReason::DraftPullRequest));
        }
        self.announce_pull_request(target, event).await
    }

    pub async fn pull_request_ready(
        &self,
        target: &FeedTarget,
        event: &PullRequestEvent,
    ) -> Result<Outcome> {
        self.announce_pull_request(target, event).await
    }

    /// Unpin every announcement of a closed (merged or abandoned) pull request.
    pub async fn pull_request_closed(
        &self,
        target: &FeedTarget,
        event: &PullRequestEvent,
    ) -> Result<Outcome> {
        let bot = self.identity.require()?;
        let term = tracking_term(&event.repository, event.pull_request.number);
        let _guard = self.locks.lock(&term).await;

        let Located { posts, .. } = self.locator.locate(&bot, &term, target).await?;
        let changed = self.set_pinned(posts, false, target).await?;
        info!(%term, unpinned = changed, "pull request closed");
        Ok(Outcome::Unpinned(changed))
    }

    pub async fn release_published(
        &self,
        target: &FeedTarget,
        event: &ReleaseEvent,
    ) -> Result<Outcome> {
        self.send_message(release_message(&event.release), target, false)
            .await
    }

    pub async fn release_prereleased(
        &self,
        target: &FeedTarget,
        event: &ReleaseEvent,
    ) -> Result<Outcome> {
        let message = format!("Pre-release: {}", release_message(&event.release));
        self.send_message(message, target, false).await
    }

    async fn announce_pull_request(
        &self,
        target: &FeedTarget,
        event: &PullRequestEvent,
    ) -> Result<Outcome> {
        let bot = self.identity.require()?;
        let pr = &event.pull_request;
        let term = tracking_term(&event.repository, pr.number);
        let _guard = self.locks.lock(&term).await;

        let Located { destination, posts } =
            self.locator.locate(&bot, &term, target).await?;
        if !posts.is_empty() {
            let changed = self.set_pinned(posts, true, target).await?;
            debug!(%term, repinned = changed, "pull request already announced");
            return Ok(Outcome::Pinned(changed));
        }

        let post = self
            .chat
            .create_post(NewPost {
                channel_id: destination.channel.id,
                user_id: bot.to_string(),
                message: format!("{term} {}\n\n{}", pr.title, pr.html_url),
                is_pinned: true,
            })
            .await
            .map_err(|e| channel_error("failed to create post", target, e))?;
        info!(%term, post_id = %post.id, channel = %target.channel, "pull request announced");
        Ok(Outcome::Created(post))
    }

    /// Create a post in the target channel as the bot.
    async fn send_message(
        &self,
        message: String,
        target: &FeedTarget,
        pinned: bool,
    ) -> Result<Outcome> {
        let bot = self.identity.require()?;
        let destination = self.resolver.resolve(&bot, target).await?;

        let post = self
            .chat
            .create_post(NewPost {
                channel_id: destination.channel.id,
                user_id: bot.to_string(),
                message,
                is_pinned: pinned,
            })
            .await
            .map_err(|e| channel_error("failed to create post", target, e))?;
        info!(post_id = %post.id, channel = %target.channel, "message posted");
        Ok(Outcome::Created(post))
    }

    /// Bring every post to `pinned`, updating only those that differ.
    /// Stops at the first failed update.
    async fn set_pinned(
        &self,
        posts: Vec<Post>,
        pinned: bool,
        target: &FeedTarget,
    ) -> Result<usize> {
        let mut changed = 0;
        for mut post in posts.into_iter().filter(|p| p.is_pinned != pinned) {
            post.is_pinned = pinned;
            self.chat
                .update_post(&post)
                .await
                .map_err(|e| channel_error("failed to update post", target, e))?;
            changed += 1;
        }
        Ok(changed)
    }
}

fn channel_error(action: &str, target: &FeedTarget, source: hookfeed_chat::Error) -> Error {
    Error::chat(format!("{action} in channel {}", target.channel), source)
}

fn release_message(release: &Release) -> String {
    format!(
        "{} - {}\n\n{}",
        release.display_name(),
        release.tag_name,
        release.html_url
    )
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {hookfeed_github::events::GithubEvent, rstest::rstest};

    use super::*;
    use crate::testing::FakeChat;

    fn target(channel: &str) -> FeedTarget {
        FeedTarget {
            team: "eng".into(),
            channel: channel.into(),
        }
    }

    fn pr_event(action: &str, draft: bool) -> PullRequestEvent {
        serde_json::from_value(serde_json::json!({
            "action": action,
            "pull_request": {
                "number": 42,
                "title": "Add widget",
                "html_url": "https://github.com/acme/widgets/pull/42",
                "draft": draft,
            },
            "repository": { "name": "widgets", "owner": { "login": "acme" } },
        }))
        .unwrap()
    }

    fn issue_event(state_reason: Option<&str>) -> IssuesEvent {
        serde_json::from_value(serde_json::json!({
            "action": "opened",
            "issue": {
                "number": 7,
                "title": "Widget is broken",
                "html_url": "https://github.com/acme/widgets/issues/7",
                "state_reason": state_reason,
            },
            "repository": { "name": "widgets", "owner": { "login": "acme" } },
        }))
        .unwrap()
    }

    fn release_event(name: Option<&str>, prerelease: bool) -> ReleaseEvent {
        serde_json::from_value(serde_json::json!({
            "action": if prerelease { "prereleased" } else { "released" },
            "release": {
                "name": name,
                "tag_name": "v1.2.0",
                "html_url": "https://github.com/acme/widgets/releases/tag/v1.2.0",
                "prerelease": prerelease,
            },
            "repository": { "name": "widgets", "owner": { "login": "acme" } },
        }))
        .unwrap()
    }

    fn setup() -> (Arc<FakeChat>, Reconciler) {
        let chat = Arc::new(
            FakeChat::new()
                .with_team("t1", "eng")
                .with_channel("c-issues", "t1", "issues")
                .with_channel("c-prs", "t1", "pr-feed")
                .with_channel("c-releases", "t1", "releases")
                .with_channel("c-random", "t1", "random"),
        );
        chat.add_member("t1", "bot");
        let identity = Arc::new(BotIdentity::new());
        identity.set("bot");
        let reconciler = Reconciler::new(Arc::clone(&chat) as Arc<dyn ChatClient>, identity);
        (chat, reconciler)
    }

    #[test]
    fn term_uses_owner_login() {
        let event = pr_event("opened", false);
        assert_eq!(
            tracking_term(&event.repository, event.pull_request.number),
            "#acme.widgets.42"
        );
    }

    #[test]
    fn term_is_identical_across_event_types() {
        let opened = pr_event("opened", false);
        let closed = pr_event("closed", false);
        assert_eq!(
            tracking_term(&opened.repository, 42),
            tracking_term(&closed.repository, 42)
        );
    }

    #[tokio::test]
    async fn pull_request_lifecycle() {
        let (chat, reconciler) = setup();
        let feed = target("pr-feed");

        let created = reconciler
            .pull_request_opened(&feed, &pr_event("opened", false))
            .await
            .unwrap();
        let Outcome::Created(post) = created else {
            panic!("expected a new post, got {created:?}");
        };
        assert_eq!(
            post.message,
            "#acme.widgets.42 Add widget\n\nhttps://github.com/acme/widgets/pull/42"
        );
        assert_eq!(post.channel_id, "c-prs");
        assert!(post.is_pinned);

        let ready = reconciler
            .pull_request_ready(&feed, &pr_event("ready_for_review", false))
            .await
            .unwrap();
        assert_eq!(ready, Outcome::Pinned(0));
        assert_eq!(chat.posts().len(), 1);
        assert_eq!(chat.calls_of("update_post"), 0);

        let closed = reconciler
            .pull_request_closed(&feed, &pr_event("closed", false))
            .await
            .unwrap();
        assert_eq!(closed, Outcome::Unpinned(1));
        assert!(!chat.posts()[0].is_pinned);
        assert_eq!(chat.posts()[0].message, post.message);
    }

    #[tokio::test]
    async fn repeated_opened_events_create_one_post() {
        let (chat, reconciler) = setup();
        let feed = target("pr-feed");

        for _ in 0..3 {
            reconciler
                .pull_request_opened(&feed, &pr_event("opened", false))
                .await
                .unwrap();
        }

        assert_eq!(chat.calls_of("create_post"), 1);
        assert_eq!(chat.posts().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_opened_events_create_one_post() {
        let (chat, reconciler) = setup();
        let reconciler = Arc::new(reconciler);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let reconciler = Arc::clone(&reconciler);
                tokio::spawn(async move {
                    reconciler
                        .pull_request_opened(&target("pr-feed"), &pr_event("opened", false))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(chat.posts().len(), 1);
    }

    #[tokio::test]
    async fn reopened_pull_request_is_repinned() {
        let (chat, reconciler) = setup();
        let feed = target("pr-feed");
        let post = chat.seed_post(
            "c-prs",
            "bot",
            "#acme.widgets.42 Add widget\n\nhttps://github.com/acme/widgets/pull/42",
            false,
        );

        let outcome = reconciler
            .pull_request_ready(&feed, &pr_event("ready_for_review", false))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Pinned(1));
        assert_eq!(chat.calls_of("create_post"), 0);
        let stored = chat.posts().into_iter().find(|p| p.id == post.id).unwrap();
        assert!(stored.is_pinned);
        assert_eq!(stored.message, post.message);
    }

    #[tokio::test]
    async fn every_matching_post_is_pinned() {
        let (chat, reconciler) = setup();
        chat.seed_post("c-prs", "bot", "#acme.widgets.42 first", false);
        chat.seed_post("c-prs", "bot", "#acme.widgets.42 second", true);
        chat.seed_post("c-prs", "bot", "#acme.widgets.42 third", false);

        let outcome = reconciler
            .pull_request_opened(&target("pr-feed"), &pr_event("opened", false))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Pinned(2));
        assert!(chat.posts().iter().all(|p| p.is_pinned));
    }

    #[tokio::test]
    async fn draft_is_skipped_without_api_calls() {
        let (chat, reconciler) = setup();

        let outcome = reconciler
            .pull_request_opened(&target("pr-feed"), &pr_event("opened", true))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Skipped(SkipReason::DraftPullRequest));
        assert!(chat.calls().is_empty());
    }

    #[tokio::test]
    async fn ready_for_review_ignores_draft_flag() {
        let (chat, reconciler) = setup();

        let outcome = reconciler
            .pull_request_ready(&target("pr-feed"), &pr_event("ready_for_review", true))
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Created(_)));
        assert_eq!(chat.posts().len(), 1);
    }

    #[tokio::test]
    async fn foreign_posts_are_never_touched() {
        let (chat, reconciler) = setup();
        let feed = target("pr-feed");
        chat.seed_post("c-prs", "alice", "#acme.widgets.42 by a human", true);
        chat.seed_post("c-random", "bot", "#acme.widgets.42 elsewhere", true);

        let closed = reconciler
            .pull_request_closed(&feed, &pr_event("closed", true))
            .await
            .unwrap();

        assert_eq!(closed, Outcome::Unpinned(0));
        assert!(chat.posts().iter().all(|p| p.is_pinned));
        assert_eq!(chat.calls_of("update_post"), 0);

        let opened = reconciler
            .pull_request_opened(&feed, &pr_event("opened", false))
            .await
            .unwrap();
        assert!(matches!(opened, Outcome::Created(_)));
    }

    #[tokio::test]
    async fn closing_unpins_every_pinned_post() {
        let (chat, reconciler) = setup();
        chat.seed_post("c-prs", "bot", "#acme.widgets.42 a", true);
        chat.seed_post("c-prs", "bot", "#acme.widgets.42 b", true);
        chat.seed_post("c-prs", "bot", "#acme.widgets.42 c", false);

        let outcome = reconciler
            .pull_request_closed(&target("pr-feed"), &pr_event("closed", false))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Unpinned(2));
        assert!(chat.posts().iter().all(|p| !p.is_pinned));
        assert_eq!(chat.calls_of("create_post"), 0);
    }

    #[tokio::test]
    async fn closing_unknown_pull_request_is_noop() {
        let (chat, reconciler) = setup();

        let outcome = reconciler
            .pull_request_closed(&target("pr-feed"), &pr_event("closed", false))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Unpinned(0));
        assert!(chat.posts().is_empty());
    }

    #[tokio::test]
    async fn failed_update_aborts_event() {
        let (chat, reconciler) = setup();
        chat.seed_post("c-prs", "bot", "#acme.widgets.42 a", true);
        chat.fail("update_post");

        let err = reconciler
            .pull_request_closed(&target("pr-feed"), &pr_event("closed", false))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("failed to update post in channel pr-feed"));
    }

    #[tokio::test]
    async fn repin_failure_aborts_without_create() {
        let (chat, reconciler) = setup();
        chat.seed_post("c-prs", "bot", "#acme.widgets.42 a", false);
        chat.fail("update_post");

        let result = reconciler
            .pull_request_opened(&target("pr-feed"), &pr_event("opened", false))
            .await;

        assert!(result.is_err());
        assert_eq!(chat.calls_of("create_post"), 0);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("completed"))]
    #[tokio::test]
    async fn issue_is_announced_unpinned(#[case] state_reason: Option<&str>) {
        let (chat, reconciler) = setup();

        let outcome = reconciler
            .issue_opened(&target("issues"), &issue_event(state_reason))
            .await
            .unwrap();

        let Outcome::Created(post) = outcome else {
            panic!("expected a new post");
        };
        assert_eq!(
            post.message,
            "Widget is broken\n\nhttps://github.com/acme/widgets/issues/7"
        );
        assert_eq!(post.channel_id, "c-issues");
        assert!(!post.is_pinned);
        assert_eq!(chat.calls_of("search_posts"), 0);
    }

    #[tokio::test]
    async fn reopened_issue_is_skipped() {
        let (chat, reconciler) = setup();

        let outcome = reconciler
            .issue_opened(&target("issues"), &issue_event(Some("reopened")))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Skipped(SkipReason::ReopenedIssue));
        assert!(chat.calls().is_empty());
    }

    #[tokio::test]
    async fn issues_are_not_deduplicated() {
        let (chat, reconciler) = setup();
        for _ in 0..2 {
            reconciler
                .issue_opened(&target("issues"), &issue_event(None))
                .await
                .unwrap();
        }
        assert_eq!(chat.posts().len(), 2);
    }

    #[rstest]
    #[case(Some("Widgets 1.2"), false, "Widgets 1.2 - v1.2.0")]
    #[case(Some("Widgets 1.2 RC"), true, "Pre-release: Widgets 1.2 RC - v1.2.0")]
    #[case(None, false, "v1.2.0 - v1.2.0")]
    #[tokio::test]
    async fn release_messages(
        #[case] name: Option<&str>,
        #[case] prerelease: bool,
        #[case] headline: &str,
    ) {
        let (chat, reconciler) = setup();
        let event = release_event(name, prerelease);
        let feed = target("releases");

        let outcome = if prerelease {
            reconciler.release_prereleased(&feed, &event).await
        } else {
            reconciler.release_published(&feed, &event).await
        }
        .unwrap();

        let Outcome::Created(post) = outcome else {
            panic!("expected a new post");
        };
        assert_eq!(
            post.message,
            format!("{headline}\n\nhttps://github.com/acme/widgets/releases/tag/v1.2.0")
        );
        assert_eq!(post.channel_id, "c-releases");
        assert!(!post.is_pinned);
        assert_eq!(chat.posts().len(), 1);
    }

    #[tokio::test]
    async fn missing_identity_is_unavailable() {
        let (chat, reconciler) = setup();
        reconciler.identity().clear();

        let err = reconciler
            .issue_opened(&target("issues"), &issue_event(None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));

        let err = reconciler
            .pull_request_opened(&target("pr-feed"), &pr_event("opened", false))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));
        assert!(chat.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_channel_aborts_event() {
        let (chat, reconciler) = setup();

        let err = reconciler
            .issue_opened(&target("nowhere"), &issue_event(None))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound { resource: "channel", .. }));
        assert_eq!(chat.calls_of("create_post"), 0);
    }

    #[tokio::test]
    async fn bot_joins_team_before_posting() {
        let (chat, reconciler) = setup();
        reconciler.identity().set("new-bot");

        reconciler
            .issue_opened(&target("issues"), &issue_event(None))
            .await
            .unwrap();

        assert!(chat.is_member("t1", "new-bot"));
        assert_eq!(chat.posts()[0].user_id, "new-bot");
    }

    #[test]
    fn parsed_events_feed_the_reconciler() {
        let body = serde_json::to_vec(&serde_json::json!({
            "action": "opened",
            "pull_request": {
                "number": 42,
                "title": "Add widget",
                "html_url": "https://github.com/acme/widgets/pull/42",
            },
            "repository": { "name": "widgets", "owner": { "login": "acme" } },
        }))
        .unwrap();
        let Some(GithubEvent::PullRequestOpened(event)) =
            GithubEvent::parse("pull_request", &body).unwrap()
        else {
            panic!("expected pull_request opened");
        };
        assert_eq!(
            tracking_term(&event.repository, event.pull_request.number),
            "#acme.widgets.42"
        );
    }
}

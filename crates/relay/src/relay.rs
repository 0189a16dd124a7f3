use std::sync::Arc;

use {
    arc_swap::ArcSwap,
    hookfeed_chat::ChatClient,
    hookfeed_github::{Dispatch, EventRouter},
    http::HeaderMap,
    tracing::info,
};

use crate::{
    Error, Result,
    feeds::RelaySettings,
    identity::BotIdentity,
    listeners::build_router,
    reconciler::Reconciler,
    self_check::{SelfCheck, SelfCheckReport},
};

/// Host-facing entry point: owns the current settings snapshot and the
/// router built from it.
pub struct Relay {
    chat: Arc<dyn ChatClient>,
    reconciler: Arc<Reconciler>,
    self_check: SelfCheck,
    settings: ArcSwap<RelaySettings>,
    router: ArcSwap<EventRouter>,
}

impl Relay {
    pub fn new(chat: Arc<dyn ChatClient>, settings: RelaySettings) -> Self {
        let identity = Arc::new(BotIdentity::new());
        let reconciler = Arc::new(Reconciler::new(Arc::clone(&chat), identity));
        let router = build_router(&settings, &reconciler);
        Self {
            self_check: SelfCheck::new(Arc::clone(&chat)),
            chat,
            reconciler,
            settings: ArcSwap::from_pointee(settings),
            router: ArcSwap::from_pointee(router),
        }
    }

    pub fn identity(&self) -> &Arc<BotIdentity> {
        self.reconciler.identity()
    }

    /// Resolve the bot account from the chat token, then audit the configured
    /// destinations.
    pub async fn activate(&self) -> Result<SelfCheckReport> {
        let me = self
            .chat
            .get_me()
            .await
            .map_err(|e| Error::chat("failed to resolve bot account", e))?;
        info!(user_id = %me.id, username = %me.username, "relay activated");
        self.identity().set(me.id);
        Ok(self.self_check().await)
    }

    pub async fn self_check(&self) -> SelfCheckReport {
        let settings = self.settings.load_full();
        self.self_check.run(&settings.feeds).await
    }

    pub fn settings(&self) -> Arc<RelaySettings> {
        self.settings.load_full()
    }

    /// Swap in new settings. Deliveries already being handled finish with
    /// the router they started on.
    pub fn update_settings(&self, settings: RelaySettings) {
        let router = build_router(&settings, &self.reconciler);
        info!(feeds = router.kinds().len(), "relay settings updated");
        self.settings.store(Arc::new(settings));
        self.router.store(Arc::new(router));
    }

    /// Apply reloaded settings, then audit the destinations they name.
    pub async fn reload(&self, settings: RelaySettings) -> SelfCheckReport {
        self.update_settings(settings);
        self.self_check().await
    }

    pub async fn handle_request(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> hookfeed_github::Result<Dispatch> {
        let router = self.router.load_full();
        router.handle_request(headers, body).await
    }
}

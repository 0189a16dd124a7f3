use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::{Error, Result};

/// The chat account hookfeed posts as.
///
/// Unset until the host activates the relay; every posting path checks it
/// first so nothing is written on behalf of an unknown account.
#[derive(Default)]
pub struct BotIdentity {
    user_id: ArcSwapOption<String>,
}

impl BotIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, user_id: impl Into<String>) {
        self.user_id.store(Some(Arc::new(user_id.into())));
    }

    pub fn clear(&self) {
        self.user_id.store(None);
    }

    pub fn get(&self) -> Option<Arc<String>> {
        self.user_id.load_full()
    }

    /// The bot user id, or [`Error::Unavailable`] before activation.
    pub fn require(&self) -> Result<Arc<String>> {
        self.get()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::unavailable("bot user id is not set"))
    }
}

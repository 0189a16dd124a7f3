use std::{collections::HashMap, sync::Arc};

use {
    async_trait::async_trait,
    http::HeaderMap,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, instrument, warn},
};

use crate::{
    Error, Result,
    events::{EventKind, GithubEvent},
    signature,
};

const EVENT_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";

/// Reacts to one kind of GitHub event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: GithubEvent) -> anyhow::Result<()>;
}

/// What happened to a delivery that was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A registered handler processed the event.
    Handled(EventKind),
    /// The event is supported but no handler is registered for it.
    Unhandled(EventKind),
    /// The event or action is not one hookfeed relays.
    Ignored,
}

/// Maps each event kind to at most one handler.
///
/// Kinds without a handler are accepted and dropped, so a disabled feed costs
/// nothing beyond parsing the action.
pub struct EventRouter {
    secret: Option<Secret<String>>,
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
}

impl EventRouter {
    /// An empty secret disables signature checks, as does `None`.
    pub fn new(secret: Option<Secret<String>>) -> Self {
        let secret = secret.filter(|s| !s.expose_secret().is_empty());
        Self {
            secret,
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `kind`, replacing any previous one.
    pub fn on(&mut self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(kind, handler);
    }

    /// Registered kinds in declaration order.
    pub fn kinds(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|k| self.handlers.contains_key(k))
            .collect()
    }

    pub async fn dispatch(&self, event: GithubEvent) -> Result<Dispatch> {
        let kind = event.kind();
        let Some(handler) = self.handlers.get(&kind) else {
            debug!(%kind, "no handler registered");
            return Ok(Dispatch::Unhandled(kind));
        };
        handler
            .handle(event)
            .await
            .map_err(|e| Error::Handler {
                kind,
                source: e.into(),
            })?;
        Ok(Dispatch::Handled(kind))
    }

    /// Verify, parse and dispatch one raw webhook delivery.
    #[instrument(
        name = "github.webhook",
        skip_all,
        fields(
            event = tracing::field::Empty,
            delivery = tracing::field::Empty,
        )
    )]
    pub async fn handle_request(&self, headers: &HeaderMap, body: &[u8]) -> Result<Dispatch> {
        if let Some(secret) = &self.secret {
            let sig = headers
                .get(signature::SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok());
            match sig {
                Some(sig) if signature::verify(secret.expose_secret(), body, sig) => {},
                Some(_) => {
                    warn!("invalid GitHub webhook signature");
                    return Err(Error::InvalidSignature);
                },
                None => {
                    warn!("missing X-Hub-Signature-256 header");
                    return Err(Error::InvalidSignature);
                },
            }
        }

        let event_name = headers
            .get(EVENT_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(Error::MissingHeader("X-GitHub-Event"))?;
        let delivery = headers
            .get(DELIVERY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");

        let span = tracing::Span::current();
        span.record("event", event_name);
        span.record("delivery", delivery);

        match GithubEvent::parse(event_name, body)? {
            Some(event) => self.dispatch(event).await,
            None => {
                debug!("ignoring unsupported GitHub event");
                Ok(Dispatch::Ignored)
            },
        }
    }
}

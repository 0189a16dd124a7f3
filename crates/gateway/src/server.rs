use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode, Uri},
        response::IntoResponse,
        routing::{get, post},
    },
    hookfeed_github::{Dispatch, Error as WebhookError},
    hookfeed_relay::{FeedKind, Relay},
    tower_http::trace::TraceLayer,
    tracing::{debug, info, warn},
};

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the HTTP router (shared between production startup and tests).
pub fn build_app(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/github", post(github_webhook_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { relay })
}

/// Serve the webhook endpoint until Ctrl-C.
pub async fn serve(bind: &str, port: u16, relay: Arc<Relay>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "webhook server listening");

    axum::serve(listener, build_app(relay))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// HTTP status for a webhook delivery result.
pub fn status_for(result: &Result<Dispatch, WebhookError>) -> StatusCode {
    match result {
        Ok(_) => StatusCode::OK,
        Err(WebhookError::InvalidSignature) => StatusCode::UNAUTHORIZED,
        Err(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let settings = state.relay.settings();
    let feeds: Vec<&str> = FeedKind::ALL
        .into_iter()
        .filter(|kind| settings.feeds.target(*kind).is_some())
        .map(FeedKind::as_str)
        .collect();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "bot_ready": state.relay.identity().get().is_some(),
        "feeds": feeds,
    }))
}

async fn github_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let result = state.relay.handle_request(&headers, &body).await;
    let status = status_for(&result);
    match &result {
        Ok(Dispatch::Handled(kind)) => info!(%kind, "webhook handled"),
        Ok(dispatch) => debug!(?dispatch, "webhook accepted"),
        Err(e) if status.is_client_error() => warn!(error = %e, %status, "webhook rejected"),
        Err(e) => warn!(error = %e, "webhook handler failed"),
    }
    status
}

async fn fallback_handler(uri: Uri) -> StatusCode {
    debug!(path = %uri.path(), "no route");
    StatusCode::NOT_FOUND
}

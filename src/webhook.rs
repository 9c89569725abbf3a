use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode, routing::post};
use tracing::{debug, info, warn};

use crate::platform::telegram::Update;
use crate::router::Router;

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

pub struct WebhookState {
    router: Router,
    /// Expected value of the secret token header, when one was registered
    secret_token: Option<String>,
}

impl WebhookState {
    pub fn new(router: Router, secret_token: Option<String>) -> Self {
        Self {
            router,
            secret_token,
        }
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        match &self.secret_token {
            None => true,
            Some(expected) => headers
                .get(SECRET_HEADER)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == expected),
        }
    }
}

pub fn app(state: Arc<WebhookState>, path: &str) -> axum::Router {
    axum::Router::new()
        .route(path, post(handle_update))
        .with_state(state)
}

/// One invocation: parse a single update, route it, always acknowledge with an empty 200.
async fn handle_update(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if !state.authorized(&headers) {
        warn!("Ignoring update with missing or wrong secret token");
        return StatusCode::OK;
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Ignoring malformed update: {}", e);
            return StatusCode::OK;
        }
    };

    let update_id = update.update_id;
    let Some(incoming) = update.into_incoming() else {
        debug!("Nothing to handle in update {}", update_id);
        return StatusCode::OK;
    };

    // Detached so a dropped connection cannot cancel replies already under way
    let task = tokio::spawn(async move { state.router.dispatch(&incoming).await });
    if let Err(e) = task.await {
        warn!("Dispatch of update {} panicked: {}", update_id, e);
    }

    StatusCode::OK
}

/// Serve the webhook until Ctrl-C
pub async fn serve(state: Arc<WebhookState>, listen_addr: &str, path: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {listen_addr}"))?;

    info!("Listening for updates on {}{}", listen_addr, path);

    axum::serve(listener, app(state, path))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}

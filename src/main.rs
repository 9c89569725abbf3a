mod config;
mod format;
mod platform;
mod router;
mod services;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::payloads::SetWebhookSetters;
use teloxide::requests::Requester;
use teloxide::Bot;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::telegram::TelegramSink;
use crate::router::Router;
use crate::services::Services;
use crate::webhook::WebhookState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,infobot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Secrets may come from a .env file next to the binary
    dotenvy::dotenv().ok();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if config.telegram.bot_token.is_empty() {
        warn!("No bot token configured (BOT_TOKEN); replies will fail");
    }
    if config.weather.api_key.is_empty() {
        warn!("No weather API key configured (OPENWEATHERMAP_API_KEY); weather lookups will fail");
    }

    info!("Configuration loaded successfully");
    info!("  Listen address: {}", config.server.listen_addr);
    info!("  Webhook path: {}", config.server.webhook_path);
    info!("  HTTP timeout: {}s", config.http.timeout_secs);
    info!("  News feeds: {}", config.news.feeds.len());
    info!("  Currencies: {:?}", config.currency.codes);

    let mut bot = Bot::new(&config.telegram.bot_token);
    if let Some(api_url) = &config.telegram.api_url {
        let url = reqwest::Url::parse(api_url)
            .with_context(|| format!("Invalid Telegram API URL: {}", api_url))?;
        bot = bot.set_api_url(url);
    }

    if let Some(public_url) = &config.server.public_url {
        register_webhook(&bot, public_url, &config).await?;
    }

    let bot_username = match &config.telegram.bot_username {
        Some(username) => Some(username.clone()),
        None => match bot.get_me().await {
            Ok(me) => me.user.username.clone(),
            Err(e) => {
                warn!("Could not look up bot username, answering commands for any bot: {}", e);
                None
            }
        },
    };
    info!("  Bot username: {:?}", bot_username);

    let services = Services::from_config(&config)?;
    let sink = Arc::new(TelegramSink::new(bot));
    let router = Router::new(services, config.news.feeds.clone(), sink)
        .with_bot_username(bot_username);
    let state = Arc::new(WebhookState::new(router, config.server.secret_token.clone()));

    info!("Bot is starting...");
    webhook::serve(state, &config.server.listen_addr, &config.server.webhook_path).await?;

    Ok(())
}

/// Point Telegram at `<public_url><webhook_path>`
async fn register_webhook(bot: &Bot, public_url: &str, config: &Config) -> Result<()> {
    let endpoint = format!(
        "{}{}",
        public_url.trim_end_matches('/'),
        config.server.webhook_path
    );
    let url = reqwest::Url::parse(&endpoint)
        .with_context(|| format!("Invalid webhook URL: {}", endpoint))?;

    let mut request = bot.set_webhook(url);
    if let Some(secret) = &config.server.secret_token {
        request = request.secret_token(secret.clone());
    }
    request
        .await
        .context("Failed to register webhook with Telegram")?;

    info!("Webhook registered at {}", endpoint);
    Ok(())
}

pub mod currency;
pub mod news;
pub mod weather;

use std::future::Future;

use anyhow::{Context, Result};
use tracing::error;

use crate::config::Config;

pub use currency::CurrencyClient;
pub use news::NewsClient;
pub use weather::WeatherClient;

/// The three upstream adapters, sharing one HTTP client
#[derive(Clone)]
pub struct Services {
    pub weather: WeatherClient,
    pub news: NewsClient,
    pub currency: CurrencyClient,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            weather: WeatherClient::new(client.clone(), config.weather.clone()),
            news: NewsClient::new(client.clone()),
            currency: CurrencyClient::new(client, config.currency.clone()),
        })
    }
}

/// Pass 2xx responses through; anything else becomes an error carrying the status and body.
pub(crate) async fn check_status(
    response: reqwest::Response,
    upstream: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        anyhow::bail!("{} error ({}): {}", upstream, status, error_body);
    }
    Ok(response)
}

/// GET `url` and return the body, treating non-2xx statuses as errors.
pub(crate) async fn get_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?;

    let body = check_status(response, url)
        .await?
        .bytes()
        .await
        .with_context(|| format!("Failed to read body from {}", url))?;
    Ok(body.to_vec())
}

/// Await `fetch`; on success render with `format`, on failure log against
/// `source` and render `apology` instead. Never returns an error.
pub async fn fetch_or_apologize<T, Fut, F, A>(
    source: &str,
    fetch: Fut,
    format: F,
    apology: A,
) -> String
where
    Fut: Future<Output = Result<T>>,
    F: FnOnce(T) -> String,
    A: FnOnce() -> String,
{
    match fetch.await {
        Ok(value) => format(value),
        Err(e) => {
            error!(source, "Upstream fetch failed: {:#}", e);
            apology()
        }
    }
}

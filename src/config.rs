use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Bot API base URL override (self-hosted Bot API server)
    #[serde(default)]
    pub api_url: Option<String>,
    /// Bot's own username; looked up with `getMe` at startup when unset
    #[serde(default)]
    pub bot_username: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
    /// Externally reachable base URL; when set, the webhook is registered at startup
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub secret_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_weather_url")]
    pub url: String,
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default = "default_lang")]
    pub lang: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewsConfig {
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CurrencyConfig {
    #[serde(default = "default_currency_url")]
    pub url: String,
    #[serde(default = "default_currency_codes")]
    pub codes: Vec<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_lang() -> String {
    "ru".to_string()
}

fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig {
            name: "Habr".to_string(),
            url: "https://habr.com/ru/rss/feed/f7b94092c7e5bf8d5f164c07c6c581df?fl=ru&rating=25&types%5B%5D=article&types%5B%5D=news".to_string(),
        },
        FeedConfig {
            name: "PPC World".to_string(),
            url: "https://ppc.world/feed/".to_string(),
        },
        FeedConfig {
            name: "AdIndex".to_string(),
            url: "https://adindex.ru/news/news.rss".to_string(),
        },
    ]
}

fn default_currency_url() -> String {
    "https://www.cbr.ru/scripts/XML_daily.asp".to_string()
}

fn default_currency_codes() -> Vec<String> {
    ["USD", "EUR", "CNY", "TRY"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            webhook_path: default_webhook_path(),
            public_url: None,
            secret_token: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            url: default_weather_url(),
            units: default_units(),
            lang: default_lang(),
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
        }
    }
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            url: default_currency_url(),
            codes: default_currency_codes(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load from an optional TOML file, then apply secrets from the process environment.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)?
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// `BOT_TOKEN` and `OPENWEATHERMAP_API_KEY` take precedence over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("BOT_TOKEN").filter(|v| !v.is_empty()) {
            self.telegram.bot_token = token;
        }
        if let Some(key) = lookup("OPENWEATHERMAP_API_KEY").filter(|v| !v.is_empty()) {
            self.weather.api_key = key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.server.webhook_path, "/webhook");
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.weather.units, "metric");
        assert_eq!(config.weather.lang, "ru");
        assert_eq!(config.news.feeds.len(), 3);
        assert_eq!(config.news.feeds[1].name, "PPC World");
        assert_eq!(config.currency.codes, vec!["USD", "EUR", "CNY", "TRY"]);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = Config::parse(
            r#"
[weather]
api_key = "owm-key"

[http]
timeout_secs = 3

[[news.feeds]]
name = "Example"
url = "https://example.com/rss"
"#,
        )
        .unwrap();
        assert_eq!(config.weather.api_key, "owm-key");
        assert_eq!(
            config.weather.url,
            "https://api.openweathermap.org/data/2.5/weather"
        );
        assert_eq!(config.http.timeout(), Duration::from_secs(3));
        assert_eq!(
            config.news.feeds,
            vec![FeedConfig {
                name: "Example".to_string(),
                url: "https://example.com/rss".to_string(),
            }]
        );
    }

    #[test]
    fn test_env_overrides_file_secrets() {
        let mut config = Config::parse(
            r#"
[telegram]
bot_token = "from-file"

[weather]
api_key = "file-key"
"#,
        )
        .unwrap();
        config.apply_env(|key| match key {
            "BOT_TOKEN" => Some("from-env".to_string()),
            "OPENWEATHERMAP_API_KEY" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.telegram.bot_token, "from-env");
        assert_eq!(config.weather.api_key, "file-key");
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let config = Config::load(Path::new("/nonexistent/infobot-config.toml")).unwrap();
        assert_eq!(config.currency.url, "https://www.cbr.ru/scripts/XML_daily.asp");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::parse("[server\nlisten_addr = 1").is_err());
    }
}

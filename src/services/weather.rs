use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::check_status;
use crate::config::WeatherConfig;

/// Cities offered on the weather keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum City {
    SaintPetersburg,
    Krasnodar,
}

impl City {
    pub const ALL: [City; 2] = [City::SaintPetersburg, City::Krasnodar];

    /// Button label, also the name sent to the provider
    pub fn name(self) -> &'static str {
        match self {
            City::SaintPetersburg => "Санкт-Петербург",
            City::Krasnodar => "Краснодар",
        }
    }

    pub fn callback_id(self) -> &'static str {
        match self {
            City::SaintPetersburg => "weather_spb",
            City::Krasnodar => "weather_krasnodar",
        }
    }
}

/// Current conditions as reported by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub temperature: f64,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    name: String,
    main: MainSection,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainSection {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    config: WeatherConfig,
}

impl WeatherClient {
    pub fn new(client: reqwest::Client, config: WeatherConfig) -> Self {
        Self { client, config }
    }

    pub async fn current(&self, city: &str) -> Result<WeatherReport> {
        debug!("Requesting weather for {}", city);

        let response = self
            .client
            .get(&self.config.url)
            .query(&[
                ("q", city),
                ("appid", self.config.api_key.as_str()),
                ("units", self.config.units.as_str()),
                ("lang", self.config.lang.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request to weather provider")?;

        let body: WeatherResponse = check_status(response, "Weather provider")
            .await?
            .json()
            .await
            .context("Failed to parse weather provider response")?;

        let description = body
            .weather
            .into_iter()
            .next()
            .map(|c| c.description)
            .context("Weather provider returned no conditions")?;

        Ok(WeatherReport {
            city: body.name,
            temperature: body.main.temp,
            description,
        })
    }
}

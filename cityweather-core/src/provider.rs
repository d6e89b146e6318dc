use crate::{
    Config, FetchError, LocationQuery, WeatherReading,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, warn};

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    /// Environment variable that overrides the configured API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OPENWEATHER_API_KEY",
            ProviderId::WeatherApi => "WEATHERAPI_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "https://api.openweathermap.org/data/2.5",
            ProviderId::WeatherApi => "https://api.weatherapi.com/v1",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

/// A weather service that can look up current conditions for a free-text location.
///
/// Each call performs exactly one HTTP request. Nothing is retried.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn fetch_weather(&self, location: &LocationQuery)
    -> Result<WeatherReading, FetchError>;
}

/// Send `request` and decode a successful JSON body.
///
/// Any non-2xx status becomes [`FetchError::NotFound`].
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: ProviderId,
    request: RequestBuilder,
) -> Result<T, FetchError> {
    let res = request.send().await?;

    let status = res.status();
    if !status.is_success() {
        warn!(%provider, %status, "provider rejected weather request");
        return Err(FetchError::NotFound);
    }

    let body = res.text().await?;
    debug!(%provider, bytes = body.len(), "received weather response");

    Ok(serde_json::from_str(&body)?)
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    build_provider(id, config, config.credential(id))
}

/// Like [`provider_from_config`], resolving environment variables through `lookup`.
pub fn provider_from_config_with(
    id: ProviderId,
    config: &Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    build_provider(id, config, config.credential_with(id, lookup))
}

fn build_provider(
    id: ProviderId,
    config: &Config,
    api_key: Option<String>,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = api_key.ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: set {} or run `cityweather configure {id}` and enter your API key.",
            id.env_var()
        )
    })?;
    let base_url = config.base_url(id);

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => {
            Box::new(OpenWeatherProvider::with_base_url(api_key, base_url))
        }
        ProviderId::WeatherApi => Box::new(WeatherApiProvider::with_base_url(api_key, base_url)),
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

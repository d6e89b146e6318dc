use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::FetchError,
    model::{LocationQuery, WeatherReading},
    provider::{ProviderId, fetch_json},
};

use super::WeatherProvider;

/// Client for WeatherAPI.com's `current.json` endpoint.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    #[instrument(skip_all, fields(provider = "weatherapi", location = %location))]
    async fn fetch_current(&self, location: &LocationQuery) -> Result<WeatherReading, FetchError> {
        let url = format!("{}/current.json", self.base_url);
        debug!(%url, "requesting current conditions");

        let request = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("q", location.as_str())]);

        let parsed: WaResponse = fetch_json(ProviderId::WeatherApi, request).await?;
        Ok(parsed.into_reading())
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    localtime: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    #[serde(default)]
    text: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    wind_kph: f64,
    cloud: Option<u8>,
    /// 1 during daylight, 0 at night.
    #[serde(default = "daytime")]
    is_day: u8,
    condition: WaCondition,
}

fn daytime() -> u8 {
    1
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

impl WaResponse {
    fn into_reading(self) -> WeatherReading {
        let WaResponse { location, current } = self;

        WeatherReading {
            location_name: location.name,
            country: location.country,
            local_time: location.localtime,
            temperature_c: current.temp_c,
            feels_like_c: current.feelslike_c,
            humidity_pct: current.humidity,
            wind_kph: current.wind_kph,
            clouds_pct: current.cloud,
            condition_text: current.condition.text,
            is_day: current.is_day != 0,
            icon_url: current.condition.icon.map(absolute_icon_url),
        }
    }
}

/// The API hands out protocol-relative icon links ("//cdn.weatherapi.com/...").
fn absolute_icon_url(icon: String) -> String {
    if icon.starts_with("//") {
        format!("https:{icon}")
    } else {
        icon
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    async fn fetch_weather(
        &self,
        location: &LocationQuery,
    ) -> Result<WeatherReading, FetchError> {
        self.fetch_current(location).await
    }
}

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::FetchError,
    model::{LocationQuery, WeatherReading},
    provider::{ProviderId, fetch_json},
};

use super::WeatherProvider;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Client for OpenWeatherMap's current weather endpoint, always in metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    #[instrument(skip_all, fields(provider = "openweather", location = %location))]
    async fn fetch_current(&self, location: &LocationQuery) -> Result<WeatherReading, FetchError> {
        let url = format!("{}/weather", self.base_url);
        debug!(%url, "requesting current conditions");

        let request = self.http.get(url).query(&[
            ("q", location.as_str()),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
        ]);

        let parsed: OwCurrentResponse = fetch_json(ProviderId::OpenWeather, request).await?;
        Ok(parsed.into_reading())
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    /// Metres per second with `units=metric`.
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    /// Observation time, unix seconds.
    dt: Option<i64>,
    /// Shift from UTC in seconds.
    #[serde(default)]
    timezone: i64,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    clouds: Option<OwClouds>,
}

impl OwCurrentResponse {
    fn into_reading(self) -> WeatherReading {
        let local_time = self
            .dt
            .and_then(|dt| dt.checked_add(self.timezone))
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();

        let is_day = self.is_day();
        let first = self.weather.into_iter().next();

        let icon_url = first
            .as_ref()
            .and_then(|w| w.icon.as_deref())
            .map(|icon| format!("{ICON_BASE_URL}/{icon}@2x.png"));

        let condition_text = first
            .map(|w| if w.description.is_empty() { w.main } else { w.description })
            .unwrap_or_default();

        WeatherReading {
            location_name: self.name,
            country: self.sys.country.unwrap_or_default(),
            local_time,
            temperature_c: self.main.temp,
            feels_like_c: self.main.feels_like,
            humidity_pct: self.main.humidity,
            wind_kph: self.wind.speed * 3.6,
            clouds_pct: self.clouds.map(|c| c.all),
            condition_text,
            is_day,
            icon_url,
        }
    }

    /// Icon codes end in 'd' or 'n'; fall back to sunrise/sunset when there is no icon.
    fn is_day(&self) -> bool {
        let suffix = self
            .weather
            .first()
            .and_then(|w| w.icon.as_deref())
            .and_then(|icon| icon.chars().last());

        match suffix {
            Some('d') => true,
            Some('n') => false,
            _ => match (self.dt, self.sys.sunrise, self.sys.sunset) {
                (Some(dt), Some(rise), Some(set)) => rise <= dt && dt < set,
                _ => true,
            },
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn fetch_weather(
        &self,
        location: &LocationQuery,
    ) -> Result<WeatherReading, FetchError> {
        self.fetch_current(location).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> OwCurrentResponse {
        serde_json::from_str(json).expect("sample parses")
    }

    #[test]
    fn maps_current_response() {
        let reading = parse(
            r#"{
                "name": "Berlin",
                "dt": 1705320000,
                "timezone": 3600,
                "sys": { "country": "DE", "sunrise": 1705302000, "sunset": 1705332000 },
                "main": { "temp": 5.5, "feels_like": 2.0, "humidity": 75 },
                "weather": [{ "main": "Clouds", "description": "overcast clouds", "icon": "04d" }],
                "wind": { "speed": 5.0 },
                "clouds": { "all": 90 }
            }"#,
        )
        .into_reading();

        assert_eq!(reading.location_name, "Berlin");
        assert_eq!(reading.country, "DE");
        assert_eq!(reading.local_time, "2024-01-15 13:00");
        assert_eq!(reading.condition_text, "overcast clouds");
        assert!((reading.wind_kph - 18.0).abs() < 1e-9);
        assert_eq!(reading.clouds_pct, Some(90));
        assert!(reading.is_day);
        assert_eq!(
            reading.icon_url.as_deref(),
            Some("https://openweathermap.org/img/wn/04d@2x.png")
        );
    }

    #[test]
    fn night_icon_means_night() {
        let reading = parse(
            r#"{
                "dt": 0,
                "main": { "temp": 1.0, "feels_like": 0.0, "humidity": 40 },
                "weather": [{ "main": "Clear", "description": "", "icon": "01n" }],
                "wind": { "speed": 0.0 }
            }"#,
        )
        .into_reading();

        assert!(!reading.is_day);
        assert_eq!(reading.condition_text, "Clear");
        assert_eq!(reading.clouds_pct, None);
    }

    #[test]
    fn day_flag_falls_back_to_sun_times() {
        let resp = parse(
            r#"{
                "dt": 500,
                "sys": { "sunrise": 100, "sunset": 400 },
                "main": { "temp": 1.0, "feels_like": 0.0, "humidity": 40 },
                "wind": { "speed": 0.0 }
            }"#,
        );

        assert!(!resp.is_day());
    }

    #[test]
    fn out_of_range_timestamp_leaves_local_time_empty() {
        let reading = parse(
            r#"{
                "name": "Overflow",
                "dt": 9223372036854775807,
                "timezone": 3600,
                "main": { "temp": 1.0, "feels_like": 0.0, "humidity": 40 },
                "wind": { "speed": 0.0 }
            }"#,
        )
        .into_reading();

        assert_eq!(reading.location_name, "Overflow");
        assert!(reading.local_time.is_empty());
    }

    #[test]
    fn missing_timestamp_keeps_the_reading() {
        let reading = parse(
            r#"{
                "name": "Lima",
                "sys": { "country": "PE", "sunrise": 100, "sunset": 400 },
                "main": { "temp": 18.0, "feels_like": 17.5, "humidity": 82 },
                "wind": { "speed": 1.0 }
            }"#,
        )
        .into_reading();

        assert_eq!(reading.country, "PE");
        assert!(reading.local_time.is_empty());
        assert!(reading.is_day);
    }
}

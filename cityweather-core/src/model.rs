use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Location must not be empty")]
pub struct InvalidLocation;

/// Free-text location as typed by the user.
///
/// Only blank input is rejected; the text is otherwise sent to the provider verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery(String);

impl LocationQuery {
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidLocation> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(InvalidLocation);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current conditions normalized across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub location_name: String,
    pub country: String,
    /// Provider-local wall clock time, e.g. "2024-01-15 12:00".
    pub local_time: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub clouds_pct: Option<u8>,
    pub condition_text: String,
    pub is_day: bool,
    pub icon_url: Option<String>,
}

impl WeatherReading {
    /// "Name, Country", or just the name when the provider sent no country.
    pub fn display_location(&self) -> String {
        if self.country.is_empty() {
            self.location_name.clone()
        } else {
            format!("{}, {}", self.location_name, self.country)
        }
    }
}

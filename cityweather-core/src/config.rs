use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fs, path::PathBuf};

use crate::{classify::Theme, provider::ProviderId, session::RacePolicy};

/// Configuration for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Overrides the provider's public endpoint, e.g. for a proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather" or "weatherapi".
    pub default_provider: Option<String>,

    #[serde(default)]
    pub theme: Theme,

    #[serde(default)]
    pub race_policy: RacePolicy,

    /// Example TOML:
    /// [providers.weatherapi]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    ///
    /// Falls back to WeatherAPI.com when nothing is configured.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            Some(s) => ProviderId::try_from(s)
                .context("Invalid `default_provider` in config file"),
            None => Ok(ProviderId::WeatherApi),
        }
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key and make it the default if none is set yet.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        let base_url = self.providers.remove(provider_id.as_str()).and_then(|p| p.base_url);
        self.providers
            .insert(provider_id.as_str().to_string(), ProviderConfig { api_key, base_url });

        if self.default_provider.is_none() {
            self.set_default_provider(provider_id);
        }
    }

    /// API key stored in the config file, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.trim().is_empty())
    }

    /// Resolve the credential for a provider: environment first, then the config file.
    pub fn credential(&self, provider_id: ProviderId) -> Option<String> {
        self.credential_with(provider_id, |name| env::var(name).ok())
    }

    pub fn credential_with(
        &self,
        provider_id: ProviderId,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        lookup(provider_id.env_var())
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.provider_api_key(provider_id).map(str::to_owned))
    }

    pub fn base_url(&self, provider_id: ProviderId) -> String {
        self.providers
            .get(provider_id.as_str())
            .and_then(|cfg| cfg.base_url.clone())
            .unwrap_or_else(|| provider_id.default_base_url().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_provider_falls_back_to_weatherapi() {
        let cfg = Config::default();
        let id = cfg.default_provider_id().expect("fallback provider");

        assert_eq!(id, ProviderId::WeatherApi);
    }

    #[test]
    fn unknown_default_provider_is_an_error() {
        let cfg = Config {
            default_provider: Some("metoffice".into()),
            ..Config::default()
        };
        let err = cfg.default_provider_id().unwrap_err();

        assert!(format!("{err:#}").contains("Unknown provider 'metoffice'"));
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenWeather);

        let key = cfg.provider_api_key(ProviderId::OpenWeather);
        assert_eq!(key, Some("OPEN_KEY"));
    }

    #[test]
    fn upsert_does_not_override_existing_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "WEATHER_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenWeather);

        cfg.set_default_provider(ProviderId::WeatherApi);
        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::WeatherApi);
    }

    #[test]
    fn upsert_keeps_base_url_override() {
        let mut cfg = Config::from_toml(
            r#"
            [providers.weatherapi]
            api_key = "OLD"
            base_url = "http://localhost:8080/v1"
            "#,
        )
        .expect("valid toml");

        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "NEW".into());

        assert_eq!(cfg.provider_api_key(ProviderId::WeatherApi), Some("NEW"));
        assert_eq!(cfg.base_url(ProviderId::WeatherApi), "http://localhost:8080/v1");
    }

    #[test]
    fn environment_credential_wins_over_file() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "FILE_KEY".into());

        let key = cfg.credential_with(ProviderId::WeatherApi, |name| {
            (name == "WEATHERAPI_API_KEY").then(|| "ENV_KEY".to_string())
        });
        assert_eq!(key.as_deref(), Some("ENV_KEY"));
    }

    #[test]
    fn blank_credentials_count_as_missing() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "  ".into());

        let key = cfg.credential_with(ProviderId::OpenWeather, |_| Some(String::new()));
        assert_eq!(key, None);
        assert_eq!(cfg.credential_with(ProviderId::WeatherApi, no_env), None);
    }

    #[test]
    fn parses_theme_and_race_policy() {
        let cfg = Config::from_toml(
            r#"
            default_provider = "openweather"
            theme = "dark"
            race_policy = "latest-submission-wins"
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.theme, Theme::Dark);
        assert_eq!(cfg.race_policy, RacePolicy::LatestSubmissionWins);
        assert_eq!(cfg.base_url(ProviderId::OpenWeather), ProviderId::OpenWeather.default_base_url());
    }

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = Config::from_toml("").expect("empty toml is valid");

        assert_eq!(cfg.theme, Theme::Light);
        assert_eq!(cfg.race_policy, RacePolicy::LastSettledWins);
        assert!(cfg.providers.is_empty());
    }
}

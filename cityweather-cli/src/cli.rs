use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use cityweather_core::{
    Config, Dispatcher, LocationQuery, ProviderId, Theme, provider_from_config,
};
use inquire::{Confirm, Password, PasswordDisplayMode, Text};
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current weather for a city")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an API key for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Show current weather for a location.
    Show {
        /// City or location name, sent to the provider as typed.
        location: String,

        #[command(flatten)]
        opts: QueryOpts,
    },

    /// Look up locations one after another until an empty line is entered.
    Interactive {
        #[command(flatten)]
        opts: QueryOpts,
    },
}

#[derive(Debug, Args)]
pub struct QueryOpts {
    /// Provider to query instead of the configured default.
    #[arg(long)]
    provider: Option<String>,

    /// Render with the dark theme.
    #[arg(long)]
    dark: bool,
}

impl QueryOpts {
    fn provider_id(&self, config: &Config) -> anyhow::Result<ProviderId> {
        match &self.provider {
            Some(name) => ProviderId::try_from(name.as_str()),
            None => config.default_provider_id(),
        }
    }

    fn theme(&self, config: &Config) -> Theme {
        if self.dark { Theme::Dark } else { config.theme }
    }

    /// Fails before any request is made when no credential is available.
    fn dispatcher(&self, config: &Config) -> anyhow::Result<Dispatcher> {
        let id = self.provider_id(config)?;
        let provider = provider_from_config(id, config)?;
        debug!(provider = %id, policy = ?config.race_policy, "provider ready");

        Ok(Dispatcher::new(Arc::from(provider), config.race_policy))
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show { location, opts } => {
                let config = Config::load()?;
                let location = LocationQuery::new(location)?;
                let mut dispatcher = opts.dispatcher(&config)?;

                dispatcher.submit(location);
                let state = dispatcher.drain().await;
                println!("{}", render::fetch_state(state, opts.theme(&config)));
                Ok(())
            }
            Command::Interactive { opts } => interactive(&opts).await,
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key.trim().to_string());

    if config.default_provider_id()? != id {
        let make_default = Confirm::new(&format!("Make {id} the default provider?"))
            .with_default(false)
            .prompt()
            .context("Failed to read answer")?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn interactive(opts: &QueryOpts) -> anyhow::Result<()> {
    let config = Config::load()?;
    let theme = opts.theme(&config);
    let mut dispatcher = opts.dispatcher(&config)?;

    println!("{}", render::welcome());

    loop {
        let input = Text::new("City:")
            .with_placeholder("Enter city name")
            .prompt_skippable()
            .context("Failed to read city")?;

        let Some(input) = input.filter(|s| !s.trim().is_empty()) else {
            break;
        };
        let location = LocationQuery::new(input)?;

        dispatcher.submit(location);
        println!("{}", render::fetch_state(dispatcher.state(), theme));

        let state = dispatcher.drain().await;
        println!("{}\n", render::fetch_state(state, theme));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_parses_provider_and_theme() {
        let cli = Cli::try_parse_from([
            "cityweather",
            "show",
            "New York",
            "--provider",
            "openweather",
            "--dark",
        ])
        .expect("valid arguments");

        let Command::Show { location, opts } = cli.command else {
            panic!("expected show command");
        };
        assert_eq!(location, "New York");
        assert_eq!(
            opts.provider_id(&Config::default()).expect("known provider"),
            ProviderId::OpenWeather
        );
        assert_eq!(opts.theme(&Config::default()), Theme::Dark);
    }

    #[test]
    fn theme_defaults_to_config() {
        let cli = Cli::try_parse_from(["cityweather", "interactive"]).expect("valid arguments");
        let Command::Interactive { opts } = cli.command else {
            panic!("expected interactive command");
        };
        let config = Config { theme: Theme::Dark, ..Config::default() };

        assert_eq!(opts.theme(&config), Theme::Dark);
        assert_eq!(opts.provider_id(&config).expect("fallback"), ProviderId::WeatherApi);
    }

    #[test]
    fn unknown_provider_is_rejected_before_any_request() {
        let cli = Cli::try_parse_from(["cityweather", "show", "Paris", "--provider", "nope"])
            .expect("valid arguments");
        let Command::Show { opts, .. } = cli.command else {
            panic!("expected show command");
        };

        let err = opts.dispatcher(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("Unknown provider 'nope'"));
    }
}

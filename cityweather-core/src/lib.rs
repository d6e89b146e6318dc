//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Clients for the supported weather providers
//! - The normalized reading and the fetch state that wraps it
//! - Classification of condition text into presentation buckets
//!
//! It is used by `cityweather-cli`, but can also be reused by other front ends.

pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod session;

pub use classify::{Backdrop, PresentationBucket, Theme, classify};
pub use config::{Config, ProviderConfig};
pub use error::FetchError;
pub use model::{InvalidLocation, LocationQuery, WeatherReading};
pub use provider::{
    ProviderId, WeatherProvider, default_provider_from_config, provider_from_config,
    provider_from_config_with,
};
pub use session::{Dispatcher, FetchState, RacePolicy, Settled, Ticket, WeatherSession};

//! Fetch state for a single query surface, plus the async dispatch that feeds it.
//!
//! Submissions are never cancelled. When two requests overlap, the configured
//! [`RacePolicy`] decides whether a slow, older response may overwrite a newer one.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{FetchError, LocationQuery, WeatherProvider, WeatherReading};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Success(WeatherReading),
    Failure(String),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn reading(&self) -> Option<&WeatherReading> {
        match self {
            FetchState::Success(reading) => Some(reading),
            _ => None,
        }
    }
}

/// Identifies one submission. Later submissions carry larger generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RacePolicy {
    /// Every response overwrites the state, so whichever settles last wins.
    #[default]
    LastSettledWins,
    /// Responses to anything but the newest submission are dropped.
    LatestSubmissionWins,
}

/// Owns the one `FetchState` slot.
#[derive(Debug, Default)]
pub struct WeatherSession {
    state: FetchState,
    policy: RacePolicy,
    latest: u64,
}

impl WeatherSession {
    pub fn new(policy: RacePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Enter `Loading` for a new submission, whatever the current state.
    pub fn submit(&mut self) -> Ticket {
        self.latest += 1;
        self.state = FetchState::Loading;
        Ticket(self.latest)
    }

    /// Apply the outcome of `ticket`'s request. Returns false if the policy discarded it.
    pub fn settle(&mut self, ticket: Ticket, result: Result<WeatherReading, FetchError>) -> bool {
        if self.policy == RacePolicy::LatestSubmissionWins && ticket.0 < self.latest {
            debug!(
                generation = ticket.0,
                latest = self.latest,
                "discarding stale weather response"
            );
            return false;
        }

        self.state = match result {
            Ok(reading) => FetchState::Success(reading),
            Err(err) => FetchState::Failure(err.to_string()),
        };
        true
    }
}

#[derive(Debug)]
struct Completion {
    ticket: Ticket,
    result: Result<WeatherReading, FetchError>,
}

/// What [`Dispatcher::next_settled`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    pub ticket: Ticket,
    pub applied: bool,
}

/// Runs provider calls in the background and funnels their results into a
/// [`WeatherSession`], one completion at a time in arrival order.
#[derive(Debug)]
pub struct Dispatcher {
    provider: Arc<dyn WeatherProvider>,
    session: WeatherSession,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn WeatherProvider>, policy: RacePolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            provider,
            session: WeatherSession::new(policy),
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn state(&self) -> &FetchState {
        self.session.state()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Start a lookup without waiting for it. Must be called inside a tokio runtime.
    pub fn submit(&mut self, location: LocationQuery) -> Ticket {
        let ticket = self.session.submit();
        info!(generation = ticket.0, provider = %self.provider.id(), %location, "submitting weather query");

        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let fetch = tokio::spawn(async move { provider.fetch_weather(&location).await });

            // A panicking lookup still settles its submission.
            let result = fetch.await.unwrap_or_else(|err| {
                warn!(generation = ticket.0, error = %err, "weather lookup task failed");
                Err(FetchError::Transport(format!("Weather lookup failed: {err}")))
            });

            // The receiver lives as long as the dispatcher; nothing to do if it is gone.
            let _ = tx.send(Completion { ticket, result });
        });

        self.in_flight += 1;
        ticket
    }

    /// Wait for the next request to finish and apply it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_settled(&mut self) -> Option<Settled> {
        if self.in_flight == 0 {
            return None;
        }

        let Completion { ticket, result } = self.rx.recv().await?;
        self.in_flight -= 1;

        let applied = self.session.settle(ticket, result);
        Some(Settled { ticket, applied })
    }

    /// Wait until every outstanding request has settled.
    pub async fn drain(&mut self) -> &FetchState {
        while self.next_settled().await.is_some() {}
        self.session.state()
    }
}

use crate::client::batch::BatchClient;
use crate::client::games::GameClient;
use crate::client::ledger::LedgerClient;
use crate::client::predictions::PredictionClient;
use crate::http::Probe;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Error,
}

/// One row of the connection panel.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub name: &'static str,
    pub url: String,
    pub state: ConnectionState,
    pub response_time_ms: u64,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl ConnectionStatus {
    pub fn from_probe(name: &'static str, probe: Probe, checked_at: DateTime<Utc>) -> Self {
        let state = if probe.error.is_none() {
            ConnectionState::Connected
        } else {
            ConnectionState::Error
        };
        Self {
            name,
            url: probe.url,
            state,
            response_time_ms: u64::try_from(probe.elapsed.as_millis()).unwrap_or(u64::MAX),
            error: probe.error,
            checked_at,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

pub struct Services<'a> {
    pub games: &'a GameClient,
    pub predictions: &'a PredictionClient,
    pub ledger: &'a LedgerClient,
    pub batch: &'a BatchClient,
}

/// Probes every backend concurrently.
pub async fn check_all(services: Services<'_>) -> Vec<ConnectionStatus> {
    let checked_at = Utc::now();
    let (games, predictions, ledger, batch) = tokio::join!(
        services.games.health(),
        services.predictions.health(),
        services.ledger.health(),
        services.batch.health(),
    );

    let out = vec![
        ConnectionStatus::from_probe("Game API", games, checked_at),
        ConnectionStatus::from_probe("Prediction API", predictions, checked_at),
        ConnectionStatus::from_probe("Bet Ledger API", ledger, checked_at),
        ConnectionStatus::from_probe("Batch API", batch, checked_at),
    ];
    let down = out.iter().filter(|s| !s.is_connected()).count();
    if down > 0 {
        tracing::warn!(down, "some backend services are unreachable");
    }
    out
}

use crate::client::PredictionSource;
use crate::config::Settings;
use crate::domain::prediction::{find_for_game, ModelPrediction, PredictionList};
use crate::domain::GameId;
use crate::http::{JsonService, Probe, Service};
use serde_json::Value;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Client for the model prediction service.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    svc: JsonService,
}

impl PredictionClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(&settings.prediction_api_url, settings.http_timeout_ceiling)
    }

    pub fn new(base_url: &str, ceiling: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            svc: JsonService::new(Service::Predictions, base_url, ceiling)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.svc.base_url()
    }

    /// Direct lookup first; if that endpoint is missing or failing, scan the full list.
    pub async fn prediction_for_game(&self, game_id: &GameId) -> Option<ModelPrediction> {
        let path = format!("/api/predictions/{game_id}");
        match self.svc.get(&path, &[], TIMEOUT).await {
            Ok(raw) => match direct_prediction(raw) {
                Some(p) => return Some(p),
                None => {
                    tracing::debug!(%game_id, "direct prediction endpoint returned nothing usable");
                }
            },
            Err(err) => {
                tracing::warn!(%game_id, error = %err, "direct prediction lookup failed; scanning list");
            }
        }

        let all = self.predictions().await;
        find_for_game(&all, game_id).cloned()
    }

    pub async fn health(&self) -> Probe {
        self.svc.probe("/health", HEALTH_TIMEOUT).await
    }
}

fn direct_prediction(raw: Value) -> Option<ModelPrediction> {
    let item = match raw {
        Value::Array(items) => items.into_iter().next()?,
        Value::Null => return None,
        other => other,
    };
    serde_json::from_value::<ModelPrediction>(item)
        .ok()
        .filter(|p| p.id().is_some())
}

#[async_trait::async_trait]
impl PredictionSource for PredictionClient {
    async fn predictions(&self) -> Vec<ModelPrediction> {
        match self
            .svc
            .get_as::<PredictionList>("/api/predictions", &[], TIMEOUT)
            .await
        {
            Ok(list) => list.predictions,
            Err(err) => {
                tracing::warn!(error = %err, "prediction service unavailable; showing no predictions");
                Vec::new()
            }
        }
    }
}

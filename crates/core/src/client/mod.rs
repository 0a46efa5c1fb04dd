pub mod batch;
pub mod games;
pub mod ledger;
pub mod predictions;

use crate::domain::daily::RunStatus;
use crate::domain::game::Game;
use crate::domain::prediction::ModelPrediction;

#[async_trait::async_trait]
pub trait GameSource: Send + Sync {
    /// Every game on the board. Never fails; an unreachable service yields an empty list.
    async fn all_games(&self) -> Vec<Game>;
}

#[async_trait::async_trait]
pub trait PredictionSource: Send + Sync {
    /// Every model prediction. Never fails; an unreachable service yields an empty list.
    async fn predictions(&self) -> Vec<ModelPrediction>;
}

#[async_trait::async_trait]
pub trait RunControl: Send + Sync {
    async fn run_status(&self) -> anyhow::Result<RunStatus>;
}

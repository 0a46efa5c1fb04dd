use crate::client::{GameSource, PredictionSource};
use crate::domain::game::Game;
use crate::domain::prediction::{find_for_game, ModelPrediction};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Predictions still in flight when the games are handed back.
pub struct PendingPredictions(JoinHandle<Vec<ModelPrediction>>);

impl PendingPredictions {
    /// Waits for the prediction load. A panicked task yields no predictions.
    pub async fn wait(self) -> Vec<ModelPrediction> {
        match self.0.await {
            Ok(predictions) => predictions,
            Err(err) => {
                tracing::warn!(error = %err, "prediction load task failed");
                Vec::new()
            }
        }
    }
}

pub struct HomeLoad {
    pub games: Vec<Game>,
    pub predictions: PendingPredictions,
}

/// Starts the game and prediction loads together and returns once the games are in.
pub async fn load_home(
    games: Arc<dyn GameSource>,
    predictions: Arc<dyn PredictionSource>,
) -> HomeLoad {
    let pending = tokio::spawn(async move { predictions.predictions().await });
    let games = games.all_games().await;
    tracing::debug!(games = games.len(), "home games loaded; predictions pending");
    HomeLoad {
        games,
        predictions: PendingPredictions(pending),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameWithPrediction {
    #[serde(flatten)]
    pub game: Game,
    pub prediction: Option<ModelPrediction>,
}

/// Pairs each game with its model prediction, keeping the game order.
pub fn attach_predictions(games: Vec<Game>, predictions: &[ModelPrediction]) -> Vec<GameWithPrediction> {
    games
        .into_iter()
        .map(|game| {
            let prediction = find_for_game(predictions, &game.game_id).cloned();
            GameWithPrediction { game, prediction }
        })
        .collect()
}

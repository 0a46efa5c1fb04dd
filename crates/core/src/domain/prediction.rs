use crate::domain::GameId;
use serde::{Deserialize, Serialize};

/// Model output for one game as served by the prediction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPrediction {
    #[serde(default)]
    pub game_id: Option<GameId>,
    #[serde(default, rename = "gameId", skip_serializing_if = "Option::is_none")]
    pub game_id_alt: Option<GameId>,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub prediction: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shap_values: Option<serde_json::Value>,
}

impl ModelPrediction {
    pub fn id(&self) -> Option<&GameId> {
        self.game_id.as_ref().or(self.game_id_alt.as_ref())
    }

    pub fn is_for(&self, game_id: &GameId) -> bool {
        self.game_id.as_ref() == Some(game_id) || self.game_id_alt.as_ref() == Some(game_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionList {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub predictions: Vec<ModelPrediction>,
    #[serde(default)]
    pub total: Option<u64>,
}

pub fn find_for_game<'a>(
    predictions: &'a [ModelPrediction],
    game_id: &GameId,
) -> Option<&'a ModelPrediction> {
    predictions.iter().find(|p| p.is_for(game_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_either_id_field() {
        let list: PredictionList = serde_json::from_value(json!({
            "predictions": [
                {"game_id": "100", "prediction": {"home_win": 0.61}},
                {"gameId": 200, "prediction": {"home_win": 0.42}, "shap_values": {"pace": 0.1}},
            ],
            "total": 2
        }))
        .unwrap();

        let second = find_for_game(&list.predictions, &GameId::from("200")).unwrap();
        assert_eq!(second.prediction["home_win"], json!(0.42));
        assert_eq!(second.id(), Some(&GameId::from("200")));
        assert!(find_for_game(&list.predictions, &GameId::from("300")).is_none());
    }
}

use crate::domain::GameId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub game_id: GameId,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub home_team: TeamLine,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub away_team: TeamLine,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub game_status_text: String,
    #[serde(default)]
    pub game_clock: Option<String>,
    #[serde(default)]
    pub formatted_clock: Option<String>,
    #[serde(default)]
    pub period: Option<u32>,
    #[serde(default)]
    pub possession_team_id: Option<i64>,
    #[serde(default)]
    pub has_possession: Option<Possession>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamLine {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub team_id: i64,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub team_name: String,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub score: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Possession {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub home: bool,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub away: bool,
}

impl Game {
    /// Clock shown on cards: the service's formatted clock when present.
    pub fn display_clock(&self) -> Option<&str> {
        self.formatted_clock
            .as_deref()
            .or(self.game_clock.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away_team.team_name, self.home_team.team_name)
    }
}

/// The game service answers either with a bare array or with `{games: [...]}` /
/// `{all_games: [...]}` depending on the endpoint version. Entries that do not decode are
/// skipped so one bad row does not blank the board.
pub fn games_from_json(value: serde_json::Value) -> anyhow::Result<Vec<Game>> {
    let list = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut obj) => match obj.remove("games") {
            Some(v) if !v.is_null() => v,
            _ => obj
                .remove("all_games")
                .filter(|v| !v.is_null())
                .unwrap_or_else(|| serde_json::Value::Array(Vec::new())),
        },
        _ => serde_json::Value::Array(Vec::new()),
    };
    let serde_json::Value::Array(items) = list else {
        anyhow::bail!("game list is not an array");
    };

    let mut games = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Game>(item) {
            Ok(game) => games.push(game),
            Err(err) => tracing::warn!(index, error = %err, "skipping undecodable game"),
        }
    }
    Ok(games)
}

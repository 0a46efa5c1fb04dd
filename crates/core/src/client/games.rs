use crate::client::GameSource;
use crate::config::Settings;
use crate::domain::game::{games_from_json, Game};
use crate::domain::GameId;
use crate::http::{JsonService, Probe, Service};
use serde_json::Value;
use std::time::Duration;

const LIST_TIMEOUT: Duration = Duration::from_secs(10);
const GAME_TIMEOUT: Duration = Duration::from_secs(8);
const DETAIL_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Client for the live game feed (scores, clocks, rosters, play-by-play).
#[derive(Debug, Clone)]
pub struct GameClient {
    svc: JsonService,
}

impl GameClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(&settings.game_api_url, settings.http_timeout_ceiling)
    }

    pub fn new(base_url: &str, ceiling: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            svc: JsonService::new(Service::Games, base_url, ceiling)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.svc.base_url()
    }

    async fn list(&self, path: &str) -> Vec<Game> {
        let res = match self.svc.get(path, &[], LIST_TIMEOUT).await {
            Ok(raw) => games_from_json(raw),
            Err(err) => Err(err),
        };
        match res {
            Ok(games) => {
                tracing::debug!(path, count = games.len(), "games loaded");
                games
            }
            Err(err) => {
                tracing::error!(path, error = %err, "game service unavailable; showing no games");
                Vec::new()
            }
        }
    }

    pub async fn live_games(&self) -> Vec<Game> {
        self.list("/games/live").await
    }

    pub async fn pregame_games(&self) -> Vec<Game> {
        self.list("/games/pregame").await
    }

    pub async fn game(&self, game_id: &GameId) -> Option<Game> {
        let path = format!("/games/{game_id}");
        match self.svc.get_as::<Game>(&path, &[], GAME_TIMEOUT).await {
            Ok(game) => Some(game),
            Err(err) => {
                tracing::error!(%game_id, error = %err, "failed to load game");
                None
            }
        }
    }

    async fn detail(&self, game_id: &GameId, section: &str) -> Option<Value> {
        let path = format!("/games/{game_id}/{section}");
        match self.svc.get(&path, &[], DETAIL_TIMEOUT).await {
            Ok(v) if !v.is_null() => Some(v),
            Ok(_) => None,
            Err(err) => {
                tracing::error!(%game_id, section, error = %err, "failed to load game detail");
                None
            }
        }
    }

    pub async fn rosters(&self, game_id: &GameId) -> Option<Value> {
        self.detail(game_id, "rosters").await
    }

    pub async fn records(&self, game_id: &GameId) -> Option<Value> {
        self.detail(game_id, "records").await
    }

    pub async fn play_by_play(&self, game_id: &GameId) -> Option<Value> {
        self.detail(game_id, "playbyplay").await
    }

    pub async fn health(&self) -> Probe {
        self.svc.probe("/health", HEALTH_TIMEOUT).await
    }
}

#[async_trait::async_trait]
impl GameSource for GameClient {
    async fn all_games(&self) -> Vec<Game> {
        self.list("/games").await
    }
}

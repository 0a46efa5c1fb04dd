use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courtside_core::client::batch::BatchClient;
use courtside_core::client::games::GameClient;
use courtside_core::client::ledger::LedgerClient;
use courtside_core::client::predictions::PredictionClient;
use courtside_core::daily::DailyArchive;
use courtside_core::dashboard::{attach_predictions, load_home, GameWithPrediction};
use courtside_core::domain::game::Game;
use courtside_core::domain::ledger::{
    BetCalculation, BetFilter, BetReceipt, BetRecord, BetRequest, Portfolio, PortfolioSummary,
    DEFAULT_RISK_PERCENT,
};
use courtside_core::domain::prediction::ModelPrediction;
use courtside_core::domain::snapshot::PredictionCard;
use courtside_core::domain::GameId;
use courtside_core::format;
use courtside_core::health::{self, ConnectionStatus};
use courtside_core::http::ServiceError;
use courtside_core::time::slate::resolve_slate_date;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = courtside_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let state = AppState {
        games: Arc::new(GameClient::from_settings(&settings)?),
        predictions: Arc::new(PredictionClient::from_settings(&settings)?),
        ledger: Arc::new(LedgerClient::from_settings(&settings)?),
        archive: Arc::new(DailyArchive::new(BatchClient::from_settings(&settings)?)),
    };
    tracing::info!(
        games = %settings.game_api_url,
        predictions = %settings.prediction_api_url,
        ledger = %settings.ledger_api_url,
        batch = %settings.batch_api_url,
        "backend services configured"
    );

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(get_status))
        .route("/games", get(get_games))
        .route("/games/:game_id", get(get_game))
        .route("/predictions/:date", get(get_predictions))
        .route("/portfolio", get(get_portfolio))
        .route("/bets", post(post_bet))
        .route("/bets/calculate", post(post_calculate))
        .route("/bets/:bet_id", get(get_bet))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    games: Arc<GameClient>,
    predictions: Arc<PredictionClient>,
    ledger: Arc<LedgerClient>,
    archive: Arc<DailyArchive>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// Maps a backend failure onto a response. The service's own message is passed through;
/// 4xx answers keep their status, everything else becomes a gateway error.
fn upstream_error(err: anyhow::Error) -> ApiError {
    match err.downcast_ref::<ServiceError>() {
        Some(svc) if svc.is_timeout() => api_error(StatusCode::GATEWAY_TIMEOUT, svc.detail.clone()),
        Some(svc) => match svc.status {
            Some(status) if status.is_client_error() => api_error(status, svc.detail.clone()),
            _ => {
                tracing::error!(error = %format!("{err:#}"), "backend call failed");
                api_error(StatusCode::BAD_GATEWAY, svc.detail.clone())
            }
        },
        None => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "request failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
        }
    }
}

async fn get_status(State(state): State<AppState>) -> Json<Vec<ConnectionStatus>> {
    let batch = state.archive.batch();
    Json(
        health::check_all(health::Services {
            games: &state.games,
            predictions: &state.predictions,
            ledger: &state.ledger,
            batch,
        })
        .await,
    )
}

#[derive(Debug, Serialize)]
struct HomeView {
    count: usize,
    games: Vec<GameWithPrediction>,
}

async fn get_games(State(state): State<AppState>) -> Json<HomeView> {
    let load = load_home(state.games.clone(), state.predictions.clone()).await;
    let predictions = load.predictions.wait().await;
    let games = attach_predictions(load.games, &predictions);
    Json(HomeView {
        count: games.len(),
        games,
    })
}

#[derive(Debug, Serialize)]
struct GameView {
    game: Game,
    prediction: Option<ModelPrediction>,
    rosters: Option<Value>,
    records: Option<Value>,
    play_by_play: Option<Value>,
}

async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameView>, ApiError> {
    let game_id = GameId::new(game_id);
    let (game, prediction, rosters, records, play_by_play) = tokio::join!(
        state.games.game(&game_id),
        state.predictions.prediction_for_game(&game_id),
        state.games.rosters(&game_id),
        state.games.records(&game_id),
        state.games.play_by_play(&game_id),
    );
    let game = game.ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("game {game_id} not found")))?;

    Ok(Json(GameView {
        game,
        prediction,
        rosters,
        records,
        play_by_play,
    }))
}

#[derive(Debug, Serialize)]
struct PredictionsView {
    date: String,
    count: usize,
    predictions: Vec<PredictionCard>,
}

async fn get_predictions(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<PredictionsView>, ApiError> {
    let date = resolve_slate_date(Some(&date), chrono::Utc::now())
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let predictions = state
        .archive
        .latest_predictions(date)
        .await
        .map_err(upstream_error)?;

    Ok(Json(PredictionsView {
        date: date.to_string(),
        count: predictions.len(),
        predictions,
    }))
}

#[derive(Debug, Deserialize)]
struct PortfolioQuery {
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct PortfolioView {
    summary: PortfolioSummary,
    bets: Vec<BetRecord>,
    error: bool,
}

async fn get_portfolio(
    State(state): State<AppState>,
    Query(query): Query<PortfolioQuery>,
) -> Result<Json<PortfolioView>, ApiError> {
    let filter: BetFilter = match query.status.as_deref() {
        Some(s) => s
            .parse()
            .map_err(|e: anyhow::Error| api_error(StatusCode::BAD_REQUEST, e.to_string()))?,
        None => BetFilter::All,
    };

    state.ledger.resolve_all().await;
    let portfolio = state.ledger.portfolio().await;
    let bets = filter
        .apply(&portfolio.bet_history)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(PortfolioView {
        summary: PortfolioSummary::from_portfolio(&portfolio),
        bets,
        error: portfolio.error,
    }))
}

async fn get_bet(
    State(state): State<AppState>,
    Path(bet_id): Path<String>,
) -> Result<Json<BetRecord>, ApiError> {
    let portfolio: Portfolio = state.ledger.portfolio().await;
    portfolio
        .find_bet(&bet_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("bet {bet_id} not found")))
}

#[derive(Debug, Deserialize)]
struct CalculateBody {
    american_odds: f64,
    #[serde(default)]
    risk_percent: Option<f64>,
    #[serde(default)]
    bet_amount: Option<f64>,
    #[serde(default)]
    balance: Option<f64>,
}

async fn post_calculate(
    State(state): State<AppState>,
    Json(body): Json<CalculateBody>,
) -> Result<Json<BetCalculation>, ApiError> {
    if body.american_odds == 0.0 {
        return Err(api_error(StatusCode::BAD_REQUEST, "american_odds must be non-zero"));
    }

    let calc = match body.bet_amount {
        Some(amount) => {
            let balance = match body.balance {
                Some(b) => b,
                None => state.ledger.balance().await.balance,
            };
            state
                .ledger
                .calculate_bet_from_amount(body.american_odds, amount, balance)
                .await
        }
        None => {
            let risk = body.risk_percent.unwrap_or(DEFAULT_RISK_PERCENT);
            state
                .ledger
                .calculate_bet(body.american_odds, risk, body.balance)
                .await
        }
    };

    calc.map(Json).map_err(upstream_error)
}

#[derive(Debug, Deserialize)]
struct PlaceBetBody {
    game_id: String,
    /// Team and spread as typed on the bet slip, e.g. `"Lakers -4.5"`.
    selection: String,
    american_odds: f64,
    #[serde(default)]
    risk_percent: Option<f64>,
}

#[derive(Debug, Serialize)]
struct PlacedBet {
    receipt: BetReceipt,
    new_balance: Option<String>,
}

async fn post_bet(
    State(state): State<AppState>,
    Json(body): Json<PlaceBetBody>,
) -> Result<Json<PlacedBet>, ApiError> {
    let game_id = GameId::new(body.game_id);
    let game = state
        .games
        .game(&game_id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("game {game_id} not found")))?;

    let (team, spread) = format::parse_team_selection(&body.selection);
    let request = BetRequest::spread_bet(
        &game,
        &team,
        spread,
        body.american_odds,
        body.risk_percent.unwrap_or(DEFAULT_RISK_PERCENT),
    )
    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let receipt = state
        .ledger
        .place_bet(&request)
        .await
        .map_err(upstream_error)?;

    Ok(Json(PlacedBet {
        new_balance: receipt.balance.map(format::money),
        receipt,
    }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &courtside_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_core::http::Service;

    fn ledger_error(stage: &'static str, status: Option<StatusCode>, detail: &str) -> anyhow::Error {
        ServiceError {
            service: Service::Ledger,
            stage,
            detail: detail.to_string(),
            status,
            raw_body: None,
        }
        .into()
    }

    #[test]
    fn client_errors_keep_status_and_message() {
        let (status, Json(body)) = upstream_error(ledger_error(
            "http",
            Some(StatusCode::BAD_REQUEST),
            "Insufficient balance",
        ));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Insufficient balance");
    }

    #[test]
    fn timeouts_become_gateway_timeout() {
        let (status, Json(body)) =
            upstream_error(ledger_error("timeout", None, "ledger timed out after 10s"));
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body.error, "ledger timed out after 10s");
    }

    #[test]
    fn server_and_connection_errors_become_bad_gateway() {
        let (status, _) = upstream_error(ledger_error(
            "http",
            Some(StatusCode::INTERNAL_SERVER_ERROR),
            "HTTP 500",
        ));
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, Json(body)) =
            upstream_error(ledger_error("request", None, "connection refused"));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error, "connection refused");
    }

    #[test]
    fn context_wrapped_service_errors_still_map() {
        let err = ledger_error("http", Some(StatusCode::CONFLICT), "bet already placed")
            .context("placing bet");
        let (status, Json(body)) = upstream_error(err);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "bet already placed");
    }

    #[test]
    fn other_errors_are_internal() {
        let (status, Json(body)) = upstream_error(anyhow::anyhow!("boom"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "boom");
    }
}

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use courtside_core::client::batch::BatchClient;
use courtside_core::client::games::GameClient;
use courtside_core::client::ledger::LedgerClient;
use courtside_core::client::predictions::PredictionClient;
use courtside_core::client::{GameSource, PredictionSource, RunControl};
use courtside_core::daily::DailyArchive;
use courtside_core::domain::daily::DailyKind;
use courtside_core::domain::ledger::{BetStatus, DEFAULT_BALANCE, DEFAULT_RISK_PERCENT};
use courtside_core::domain::GameId;
use courtside_core::http::ServiceError;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const CEILING: Duration = Duration::from_secs(35);

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Nothing listens on port 1, so every call fails at the connection stage.
const DEAD_URL: &str = "http://127.0.0.1:1";

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

#[tokio::test]
async fn read_endpoints_fall_back_when_services_are_down() {
    let ledger = LedgerClient::new(DEAD_URL, CEILING).unwrap();
    let balance = ledger.balance().await;
    assert!(balance.error);
    assert_eq!(balance.balance, DEFAULT_BALANCE);
    assert_eq!(balance.formatted.as_deref(), Some("$150.00"));
    assert_eq!(balance.risk_percent, Some(DEFAULT_RISK_PERCENT));

    let slate = ledger.slate_games("today").await;
    assert!(slate.error);
    assert_eq!(slate.date, "today");
    assert_eq!(slate.count, 0);

    let bets = ledger.bets(None).await;
    assert!(bets.error);
    assert!(bets.bets.is_empty());

    let portfolio = ledger.portfolio().await;
    assert!(portfolio.error);
    assert_eq!(portfolio.balance, DEFAULT_BALANCE);
    assert_eq!(portfolio.risk_percent, DEFAULT_RISK_PERCENT);
    let stats = portfolio.statistics.unwrap();
    assert_eq!(stats.total_bets, Some(0));
    assert_eq!(stats.total_profit, Some(0.0));

    ledger.resolve_all().await;

    let games = GameClient::new(DEAD_URL, CEILING).unwrap();
    assert!(games.all_games().await.is_empty());
    assert!(games.live_games().await.is_empty());
    assert!(games.game(&GameId::from("1")).await.is_none());

    let predictions = PredictionClient::new(DEAD_URL, CEILING).unwrap();
    assert!(predictions.predictions().await.is_empty());

    let batch = BatchClient::new(DEAD_URL, CEILING).unwrap();
    assert!(batch.run_logs().await.is_empty());
    let err = batch.run_status().await.unwrap_err();
    assert_eq!(err.downcast_ref::<ServiceError>().unwrap().stage, "request");
}

#[tokio::test]
async fn calculation_and_placement_surface_the_service_message() {
    let app = Router::new()
        .route(
            "/api/calculate-bet",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Insufficient balance"})),
                )
            }),
        )
        .route(
            "/api/bets",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
    let ledger = LedgerClient::new(&serve(app).await, CEILING).unwrap();

    let err = ledger.calculate_bet(-110.0, 7.33, None).await.unwrap_err();
    let svc = err.downcast_ref::<ServiceError>().unwrap();
    assert_eq!(svc.detail, "Insufficient balance");
    assert_eq!(svc.status, Some(StatusCode::BAD_REQUEST));
    assert!(format!("{err:#}").contains("Insufficient balance"));

    let game = serde_json::from_value(json!({
        "gameId": "0022400123",
        "homeTeam": {"teamId": 1610612747, "teamName": "Lakers"},
        "awayTeam": {"teamId": 1610612738, "teamName": "Celtics"}
    }))
    .unwrap();
    let bet = courtside_core::domain::ledger::BetRequest::spread_bet(
        &game,
        "Lakers",
        Some(-4.5),
        -110.0,
        7.33,
    )
    .unwrap();
    let err = ledger.place_bet(&bet).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ServiceError>().unwrap().detail,
        "HTTP 500"
    );
}

#[tokio::test]
async fn only_the_error_field_is_surfaced() {
    let app = Router::new().route(
        "/api/calculate-bet",
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"detail": [{"loc": ["body", "american_odds"], "msg": "field required"}]})),
            )
        }),
    );
    let ledger = LedgerClient::new(&serve(app).await, CEILING).unwrap();

    let err = ledger.calculate_bet(-110.0, 7.33, None).await.unwrap_err();
    let svc = err.downcast_ref::<ServiceError>().unwrap();
    assert_eq!(svc.detail, "HTTP 422");
    assert_eq!(svc.status, Some(StatusCode::UNPROCESSABLE_ENTITY));
    assert!(svc.raw_body.as_ref().unwrap().get("detail").is_some());
}

#[tokio::test]
async fn calculation_decodes_success_body() {
    let app = Router::new().route(
        "/api/calculate-bet",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["american_odds"], json!(150.0));
            assert!(body.get("balance").is_none());
            Json(json!({
                "bet_amount": 10.99,
                "payout": 27.48,
                "profit": 16.49,
                "decimal_odds": 2.5,
                "risk_percent": 7.33
            }))
        }),
    );
    let ledger = LedgerClient::new(&serve(app).await, CEILING).unwrap();

    let calc = ledger.calculate_bet(150.0, 7.33, None).await.unwrap();
    assert_eq!(calc.bet_amount, Some(10.99));
    assert_eq!(calc.decimal_odds, Some(2.5));
    assert_eq!(calc.roi, None);
}

#[tokio::test]
async fn portfolio_gaps_are_filled() {
    let app = Router::new().route(
        "/api/portfolio",
        get(|| async {
            Json(json!({
                "balance": 0,
                "bet_history": [
                    {"id": 1, "status": "won", "profit": 9.09},
                    {"id": 2, "result": "loss", "profit": -10.0}
                ]
            }))
        }),
    );
    let ledger = LedgerClient::new(&serve(app).await, CEILING).unwrap();

    let portfolio = ledger.portfolio().await;
    assert!(!portfolio.error);
    assert_eq!(portfolio.balance, DEFAULT_BALANCE);
    assert_eq!(portfolio.risk_percent, DEFAULT_RISK_PERCENT);
    assert_eq!(portfolio.statistics.as_ref().unwrap().total_bets, Some(2));
    assert_eq!(portfolio.find_bet("2").unwrap().status(), BetStatus::Lost);
}

#[tokio::test]
async fn null_portfolio_fields_are_normalized_not_treated_as_outage() {
    let app = Router::new().route(
        "/api/portfolio",
        get(|| async {
            Json(json!({
                "balance": null,
                "risk_percent": 5.0,
                "bet_history": [{"id": 1, "status": "won", "profit": 9.0}],
                "statistics": {"total_bets": 1, "wins": 1, "pnl": {"day": {"total_profit": null}}}
            }))
        }),
    );
    let ledger = LedgerClient::new(&serve(app).await, CEILING).unwrap();

    let portfolio = ledger.portfolio().await;
    assert!(!portfolio.error);
    assert_eq!(portfolio.balance, DEFAULT_BALANCE);
    assert_eq!(portfolio.risk_percent, 5.0);
    assert_eq!(portfolio.bet_history.len(), 1);
    assert_eq!(portfolio.statistics.as_ref().unwrap().wins, Some(1));
    assert_eq!(portfolio.pnl().day.total_profit, 0.0);
}

#[tokio::test]
async fn null_history_and_string_ids_decode() {
    let app = Router::new()
        .route(
            "/api/portfolio",
            get(|| async { Json(json!({"balance": 180.0, "bet_history": null})) }),
        )
        .route(
            "/api/bets",
            get(|| async {
                Json(json!({"bets": [{"id": "b-42", "result": "push"}], "count": null}))
            }),
        );
    let ledger = LedgerClient::new(&serve(app).await, CEILING).unwrap();

    let portfolio = ledger.portfolio().await;
    assert!(!portfolio.error);
    assert_eq!(portfolio.balance, 180.0);
    assert!(portfolio.bet_history.is_empty());
    assert_eq!(portfolio.statistics.as_ref().unwrap().total_bets, Some(0));

    let list = ledger.bets(None).await;
    assert!(!list.error);
    assert_eq!(list.bets[0].id.as_deref(), Some("b-42"));
    assert_eq!(list.bets[0].status(), BetStatus::Push);
}

#[tokio::test]
async fn bet_filter_is_sent_as_query() {
    let app = Router::new().route(
        "/api/bets",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            let status = q.get("status").cloned().unwrap_or_default();
            Json(json!({"bets": [{"id": 7, "status": status}], "count": 1}))
        }),
    );
    let ledger = LedgerClient::new(&serve(app).await, CEILING).unwrap();

    let list = ledger.bets(Some(BetStatus::Won)).await;
    assert!(!list.error);
    assert_eq!(list.bets[0].status(), BetStatus::Won);
}

#[tokio::test]
async fn slow_service_is_cut_off_by_the_client_ceiling() {
    let app = Router::new().route(
        "/api/balance",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Json(json!({"balance": 999.0}))
        }),
    );
    let ledger = LedgerClient::new(&serve(app).await, Duration::from_secs(1)).unwrap();

    let balance = ledger.balance().await;
    assert!(balance.error);
    assert_eq!(balance.balance, DEFAULT_BALANCE);
}

#[tokio::test]
async fn prediction_lookup_falls_back_to_full_list() {
    let app = Router::new()
        .route(
            "/api/predictions/:game_id",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route(
            "/api/predictions",
            get(|| async {
                Json(json!({
                    "predictions": [
                        {"game_id": "1", "prediction": 0.4},
                        {"gameId": 77, "prediction": 0.7}
                    ],
                    "total": 2
                }))
            }),
        );
    let client = PredictionClient::new(&serve(app).await, CEILING).unwrap();

    let found = client
        .prediction_for_game(&GameId::from("77"))
        .await
        .unwrap();
    assert_eq!(found.prediction, json!(0.7));
    assert!(client.prediction_for_game(&GameId::from("5")).await.is_none());
}

#[tokio::test]
async fn games_accept_wrapped_lists() {
    let app = Router::new()
        .route(
            "/games",
            get(|| async {
                Json(json!({"all_games": [
                    {"gameId": 22400001, "homeTeam": {"teamName": "Knicks"}, "awayTeam": {"teamName": "Heat"}}
                ]}))
            }),
        )
        .route("/games/live", get(|| async { Json(json!([])) }));
    let client = GameClient::new(&serve(app).await, CEILING).unwrap();

    let games = client.all_games().await;
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].game_id, GameId::from("22400001"));
    assert_eq!(games[0].matchup(), "Heat @ Knicks");
    assert!(client.live_games().await.is_empty());
}

#[tokio::test]
async fn one_bad_game_does_not_blank_the_board() {
    let app = Router::new().route(
        "/games/pregame",
        get(|| async {
            Json(json!({"games": [
                {"gameId": "0022400201", "homeTeam": {"teamName": "Suns", "score": null}, "awayTeam": {"teamName": "Jazz", "teamId": null}},
                {"gameId": null, "homeTeam": {"teamName": "Kings"}},
                {"gameId": "0022400203", "homeTeam": {"teamName": "Nets"}, "awayTeam": {"teamName": "Bulls"}}
            ]}))
        }),
    );
    let client = GameClient::new(&serve(app).await, CEILING).unwrap();

    let games = client.pregame_games().await;
    assert_eq!(games.len(), 2);
    assert_eq!(games[0].home_team.score, 0);
    assert_eq!(games[1].matchup(), "Bulls @ Nets");
}

#[tokio::test]
async fn missing_date_is_an_empty_listing_but_other_errors_propagate() {
    let app = Router::new()
        .route(
            "/api/daily/:kind/:date",
            get(|Path((kind, _date)): Path<(String, String)>| async move {
                if kind == "DailyOdds" {
                    (StatusCode::NOT_FOUND, Json(json!({"detail": "no files"}))).into_response()
                } else {
                    (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response()
                }
            }),
        )
        .route(
            "/api/predictions/:date",
            get(|| async { StatusCode::NOT_FOUND }),
        );
    let batch = BatchClient::new(&serve(app).await, CEILING).unwrap();

    let listing = batch.daily_listing(DailyKind::Odds, date()).await.unwrap();
    assert_eq!(listing.date, "2025-01-01");
    assert!(listing.files.is_empty());

    let listing = batch.predictions_for_date(date()).await.unwrap();
    assert_eq!(listing.count, 0);

    let err = batch
        .daily_listing(DailyKind::Results, date())
        .await
        .unwrap_err();
    let svc = err.downcast_ref::<ServiceError>().unwrap();
    assert_eq!(svc.status, Some(StatusCode::SERVICE_UNAVAILABLE));
}

#[tokio::test]
async fn trigger_errors_propagate_and_status_decodes() {
    let app = Router::new()
        .route(
            "/api/run",
            post(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(json!({"error": "Job already running"})),
                )
            }),
        )
        .route(
            "/api/run/status",
            get(|| async { Json(json!({"running": true, "timestamp": "2025-01-01T09:00:00"})) }),
        )
        .route(
            "/api/run/logs",
            get(|| async { Json(json!({"logs": ["start", "sim 1/10"]})) }),
        );
    let batch = BatchClient::new(&serve(app).await, CEILING).unwrap();

    let err = batch.trigger_run().await.unwrap_err();
    assert!(format!("{err:#}").contains("Job already running"));

    let status = batch.run_status().await.unwrap();
    assert!(status.running);
    assert_eq!(batch.run_logs().await, vec!["start", "sim 1/10"]);
}

#[derive(Clone, Default)]
struct Hits {
    listing: Arc<AtomicUsize>,
    file: Arc<AtomicUsize>,
}

fn archive_app(hits: Hits) -> Router {
    Router::new()
        .route(
            "/api/daily/DailyMCS/:date",
            get(|State(hits): State<Hits>| async move {
                hits.listing.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "date": "2025-01-01",
                    "count": 4,
                    "files": [
                        {"name": "mcs_100_20250101_080000.json", "data": {
                            "game_id": 100, "home_team": "Lakers", "away_team": "Celtics",
                            "win_probabilities": {"home_team": 0.55, "away_team": 0.45}
                        }},
                        {"name": "mcs_200_20250101_080000.json", "data": {"game_id": "200"}},
                        {"name": "mcs_100_20250101_093000.json", "data": null},
                        {"name": "orphan_20250101_100000.json", "data": {"home_team": "X"}}
                    ]
                }))
            }),
        )
        .route(
            "/api/daily/DailyMCS/:date/:name",
            get(
                |State(hits): State<Hits>, Path((_date, name)): Path<(String, String)>| async move {
                    hits.file.fetch_add(1, Ordering::SeqCst);
                    Json(json!({
                        "name": name,
                        "data": {
                            "game_id": "100",
                            "home_team": "Lakers",
                            "away_team": "Celtics",
                            "generated_at": "2025-01-01T09:30:00",
                            "spread_odds_comparison": {
                                "home_team_spread": {"spread": -2.5, "mcs_probability": 0.52},
                                "away_team_spread": {"spread": 2.5}
                            }
                        }
                    }))
                },
            ),
        )
        .with_state(hits)
}

#[tokio::test]
async fn archive_serves_repeat_reads_from_cache() {
    let hits = Hits::default();
    let batch = BatchClient::new(&serve(archive_app(hits.clone())).await, CEILING).unwrap();
    let archive = DailyArchive::new(batch);

    archive.listing(DailyKind::Simulations, date()).await.unwrap();
    assert_eq!(archive.cached_files().await, 3);

    let inline = archive
        .file(DailyKind::Simulations, date(), "mcs_200_20250101_080000.json")
        .await
        .unwrap();
    assert_eq!(inline.data["game_id"], json!("200"));
    assert_eq!(hits.file.load(Ordering::SeqCst), 0);

    let name = "mcs_100_20250101_093000.json";
    archive.file(DailyKind::Simulations, date(), name).await.unwrap();
    archive.file(DailyKind::Simulations, date(), name).await.unwrap();
    assert_eq!(hits.file.load(Ordering::SeqCst), 1);
    assert_eq!(archive.cached_files().await, 4);
}

#[tokio::test]
async fn latest_predictions_keeps_newest_snapshot_per_game() {
    let hits = Hits::default();
    let batch = BatchClient::new(&serve(archive_app(hits.clone())).await, CEILING).unwrap();
    let archive = DailyArchive::new(batch);

    let cards = archive.latest_predictions(date()).await.unwrap();

    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].game_id, Some(GameId::from("100")));
    assert_eq!(cards[0].file_label, "mcs_100_20250101_093000");
    assert_eq!(cards[0].spread_display.as_deref(), Some("(2.5-2.5)"));
    assert_eq!(cards[0].game_date, "2025-01-01");
    assert_eq!(cards[1].game_id, Some(GameId::from("200")));
    assert_eq!(cards[1].home_team, "Unknown");
    assert_eq!(hits.listing.load(Ordering::SeqCst), 1);
}

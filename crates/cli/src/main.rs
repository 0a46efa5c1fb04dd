use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courtside_core::client::batch::BatchClient;
use courtside_core::client::games::GameClient;
use courtside_core::client::ledger::LedgerClient;
use courtside_core::client::predictions::PredictionClient;
use courtside_core::client::RunControl;
use courtside_core::config::Settings;
use courtside_core::daily::DailyArchive;
use courtside_core::dashboard::{attach_predictions, load_home};
use courtside_core::domain::daily::DailyKind;
use courtside_core::domain::ledger::{
    BetFilter, BetRequest, PortfolioSummary, DEFAULT_RISK_PERCENT,
};
use courtside_core::domain::GameId;
use courtside_core::format;
use courtside_core::health;
use courtside_core::poll::{self, PollOptions, PollOutcome};
use courtside_core::time::slate::resolve_slate_date;

mod render;

#[derive(Debug, Parser)]
#[command(name = "courtside", about = "NBA betting dashboard in the terminal")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Games on the board with model predictions.
    Games {
        #[arg(long, conflicts_with = "pregame")]
        live: bool,
        #[arg(long)]
        pregame: bool,
    },
    /// One game with its prediction, rosters and records.
    Game { game_id: String },
    /// Latest simulation snapshot per game for a date (YYYY-MM-DD or today).
    Predictions { date: Option<String> },
    /// Raw daily archive: list a folder, or print one file.
    Daily {
        /// mcs | odds | results
        kind: DailyKind,
        date: Option<String>,
        #[arg(long)]
        file: Option<String>,
    },
    /// Current bankroll.
    Balance,
    /// Size a bet without placing it.
    Calc {
        #[arg(long, allow_hyphen_values = true)]
        odds: f64,
        #[arg(long, conflicts_with = "amount")]
        risk: Option<f64>,
        #[arg(long)]
        amount: Option<f64>,
    },
    /// Place a point-spread bet, e.g. `bet 0022400123 "Lakers -4.5" --odds -110`.
    Bet {
        game_id: String,
        selection: String,
        #[arg(long, allow_hyphen_values = true)]
        odds: f64,
        #[arg(long)]
        risk: Option<f64>,
    },
    /// Bet history.
    Bets {
        /// all | pending | won | lost | push
        #[arg(long, default_value = "all")]
        status: BetFilter,
    },
    /// Balance, PNL, Sharpe ratio and record.
    Portfolio,
    /// Trigger the simulation batch, wait for it, then show the fresh predictions.
    Run {
        /// Seconds between status checks (2-5). Falls back to RUN_POLL_INTERVAL_SECS.
        #[arg(long)]
        interval: Option<u64>,
        #[arg(long)]
        max_polls: Option<u32>,
    },
    /// Backend connectivity and batch run state.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let res = run(&settings, args.command).await;
    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
    }
    res
}

async fn run(settings: &Settings, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Games { live, pregame } => {
            let games = Arc::new(GameClient::from_settings(settings)?);
            let predictions = Arc::new(PredictionClient::from_settings(settings)?);
            let list = if live {
                games.live_games().await
            } else if pregame {
                games.pregame_games().await
            } else {
                let load = load_home(games.clone(), predictions.clone()).await;
                println!("{} games", load.games.len());
                let preds = load.predictions.wait().await;
                for row in attach_predictions(load.games, &preds) {
                    println!("{}", render::game_line(&row.game, row.prediction.as_ref()));
                }
                return Ok(());
            };
            println!("{} games", list.len());
            for game in &list {
                println!("{}", render::game_line(game, None));
            }
        }
        Command::Game { game_id } => {
            let games = GameClient::from_settings(settings)?;
            let predictions = PredictionClient::from_settings(settings)?;
            let game_id = GameId::new(game_id);
            let (game, prediction, records) = tokio::join!(
                games.game(&game_id),
                predictions.prediction_for_game(&game_id),
                games.records(&game_id),
            );
            let game = game.with_context(|| format!("game {game_id} not found"))?;
            println!("{}", game.matchup());
            println!("{}", render::game_line(&game, prediction.as_ref()));
            if let Some(p) = prediction.and_then(|p| p.shap_values) {
                println!("shap: {p}");
            }
            if let Some(r) = records {
                println!("records: {r}");
            }
        }
        Command::Predictions { date } => {
            let date = resolve_slate_date(date.as_deref(), chrono::Utc::now())?;
            let archive = DailyArchive::new(BatchClient::from_settings(settings)?);
            print_predictions(&archive, date).await?;
        }
        Command::Daily { kind, date, file } => {
            let date = resolve_slate_date(date.as_deref(), chrono::Utc::now())?;
            let archive = DailyArchive::new(BatchClient::from_settings(settings)?);
            match file {
                Some(name) => {
                    let file = archive.file(kind, date, &name).await?;
                    println!("{}", serde_json::to_string_pretty(&file.data)?);
                }
                None => {
                    let listing = archive.listing(kind, date).await?;
                    println!("{kind} {} ({} files)", listing.date, listing.files.len());
                    for f in &listing.files {
                        println!("  {}", format::file_label(&f.name));
                    }
                }
            }
        }
        Command::Balance => {
            let balance = LedgerClient::from_settings(settings)?.balance().await;
            let shown = balance
                .formatted
                .clone()
                .unwrap_or_else(|| format::money(balance.balance));
            let risk = balance.risk_percent.unwrap_or(DEFAULT_RISK_PERCENT);
            println!("balance {shown}  risk {}", format::percent(risk));
            if balance.error {
                println!("(ledger unreachable; showing default bankroll)");
            }
        }
        Command::Calc { odds, risk, amount } => {
            anyhow::ensure!(odds != 0.0, "odds must be non-zero");
            let ledger = LedgerClient::from_settings(settings)?;
            let calc = match amount {
                Some(amount) => {
                    let balance = ledger.balance().await.balance;
                    ledger.calculate_bet_from_amount(odds, amount, balance).await?
                }
                None => {
                    ledger
                        .calculate_bet(odds, risk.unwrap_or(DEFAULT_RISK_PERCENT), None)
                        .await?
                }
            };
            println!("{} {}", format::american_odds(odds), render::calculation(&calc));
        }
        Command::Bet {
            game_id,
            selection,
            odds,
            risk,
        } => {
            let games = GameClient::from_settings(settings)?;
            let ledger = LedgerClient::from_settings(settings)?;
            let game_id = GameId::new(game_id);
            let game = games
                .game(&game_id)
                .await
                .with_context(|| format!("game {game_id} not found"))?;

            let (team, spread) = format::parse_team_selection(&selection);
            let request = BetRequest::spread_bet(
                &game,
                &team,
                spread,
                odds,
                risk.unwrap_or(DEFAULT_RISK_PERCENT),
            )?;
            let receipt = ledger.place_bet(&request).await?;
            println!(
                "placed {} {} on {}",
                team,
                format::american_odds(odds),
                game.matchup()
            );
            if let Some(balance) = receipt.balance {
                println!("new balance {}", format::money(balance));
            }
        }
        Command::Bets { status } => {
            let ledger = LedgerClient::from_settings(settings)?;
            let requested = match status {
                BetFilter::All => None,
                BetFilter::Only(s) => Some(s),
            };
            let list = ledger.bets(requested).await;
            if list.error {
                println!("(ledger unreachable)");
            }
            let shown = status.apply(&list.bets);
            println!("{} bets", shown.len());
            for bet in shown {
                println!("{}", render::bet_line(bet));
            }
        }
        Command::Portfolio => {
            let ledger = LedgerClient::from_settings(settings)?;
            ledger.resolve_all().await;
            let portfolio = ledger.portfolio().await;
            if portfolio.error {
                println!("(ledger unreachable; showing defaults)");
            }
            println!("{}", render::summary(&PortfolioSummary::from_portfolio(&portfolio)));
            for bet in &portfolio.bet_history {
                println!("{}", render::bet_line(bet));
            }
        }
        Command::Run {
            interval,
            max_polls,
        } => {
            let interval = match interval {
                Some(secs) => secs,
                None => poll_interval_from_env()?,
            };
            let opts = PollOptions {
                max_polls,
                ..PollOptions::with_interval_secs(interval)
            };

            let archive = DailyArchive::new(BatchClient::from_settings(settings)?);
            let trigger = archive.batch().trigger_run().await?;
            println!(
                "{}",
                trigger.message.as_deref().unwrap_or("simulation run started")
            );

            tracing::info!(
                interval_secs = opts.interval.as_secs(),
                max_polls = ?opts.max_polls,
                "waiting for simulation run"
            );
            let cancel = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            match poll::wait_for_run(archive.batch(), opts, cancel).await {
                PollOutcome::Finished { polls } => {
                    println!("run finished after {polls} checks");
                    let date = resolve_slate_date(None, chrono::Utc::now())?;
                    print_predictions(&archive, date).await?;
                }
                PollOutcome::Cancelled { .. } => println!("stopped waiting; the run continues"),
                PollOutcome::GaveUp { polls } => {
                    println!("run still in progress after {polls} checks");
                    for line in archive.batch().run_logs().await.iter().rev().take(10).rev() {
                        println!("  {line}");
                    }
                }
            }
        }
        Command::Status => {
            let games = GameClient::from_settings(settings)?;
            let predictions = PredictionClient::from_settings(settings)?;
            let ledger = LedgerClient::from_settings(settings)?;
            let batch = BatchClient::from_settings(settings)?;
            let statuses = health::check_all(health::Services {
                games: &games,
                predictions: &predictions,
                ledger: &ledger,
                batch: &batch,
            })
            .await;
            for s in &statuses {
                println!("{}", render::connection(s));
            }
            match batch.run_status().await {
                Ok(s) if s.running => println!("batch run in progress"),
                Ok(_) => println!("batch idle"),
                Err(err) => println!("batch run status unavailable: {err}"),
            }
        }
    }
    Ok(())
}

async fn print_predictions(archive: &DailyArchive, date: chrono::NaiveDate) -> anyhow::Result<()> {
    let cards = archive.latest_predictions(date).await?;
    println!("{date}: {} games", cards.len());
    for card in &cards {
        println!("{}", render::prediction_card(card));
    }
    Ok(())
}

fn poll_interval_from_env() -> anyhow::Result<u64> {
    match std::env::var("RUN_POLL_INTERVAL_SECS") {
        Ok(s) => s
            .trim()
            .parse::<u64>()
            .with_context(|| format!("RUN_POLL_INTERVAL_SECS is not a number: {s}")),
        Err(_) => Ok(poll::DEFAULT_POLL_INTERVAL.as_secs()),
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

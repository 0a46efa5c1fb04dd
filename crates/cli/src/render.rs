//! Plain-text views for the terminal.

use courtside_core::domain::game::Game;
use courtside_core::domain::ledger::{BetCalculation, BetRecord, PnlWindow, PortfolioSummary};
use courtside_core::domain::prediction::ModelPrediction;
use courtside_core::domain::snapshot::PredictionCard;
use courtside_core::format;
use courtside_core::health::ConnectionStatus;
use std::fmt::Write;

pub fn game_line(game: &Game, prediction: Option<&ModelPrediction>) -> String {
    let mut out = format!(
        "{:<12} {:>3} {:<22} @ {:<22} {:>3}  {}",
        game.game_id,
        game.away_team.score,
        game.away_team.team_name,
        game.home_team.team_name,
        game.home_team.score,
        game.game_status_text,
    );
    if let Some(clock) = game.display_clock() {
        let _ = write!(out, " {clock}");
    }
    if let Some(p) = prediction {
        let _ = write!(out, "  model: {}", compact(&p.prediction));
    }
    out
}

fn compact(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(format::probability)
            .unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

pub fn prediction_card(card: &PredictionCard) -> String {
    let mut out = format!(
        "{} @ {}  [{}]",
        card.away_team,
        card.home_team,
        card.game_id.as_ref().map(|g| g.as_str()).unwrap_or("-"),
    );
    let _ = write!(
        out,
        "\n  win: {} {} / {} {}",
        card.away_team,
        format::probability(card.win_probabilities.away),
        card.home_team,
        format::probability(card.win_probabilities.home),
    );
    if let Some(spread) = &card.spread_display {
        let _ = write!(out, "\n  spread: {spread}");
        for (side, line) in [("home", card.home_spread), ("away", card.away_spread)] {
            if let Some(p) = line.and_then(|l| l.mcs_probability) {
                let _ = write!(out, " {side} cover {}", format::probability(p));
            }
        }
    }
    let _ = write!(
        out,
        "\n  {} · generated {}",
        card.file_label,
        card.generated_at.as_deref().unwrap_or("unknown"),
    );
    out
}

pub fn calculation(calc: &BetCalculation) -> String {
    let money = |v: Option<f64>| v.map(format::money).unwrap_or_else(|| "-".to_string());
    let mut out = format!(
        "stake {}  payout {}  profit {}",
        money(calc.bet_amount),
        money(calc.payout),
        money(calc.profit),
    );
    if let Some(roi) = calc.roi {
        let _ = write!(out, "  roi {}", format::percent(roi));
    }
    if let Some(p) = calc.win_probability_percent {
        let _ = write!(out, "  win prob {}", format::percent(p));
    }
    if let Some(d) = calc.decimal_odds {
        let _ = write!(out, "  decimal {d:.2}");
    }
    out
}

pub fn bet_line(bet: &BetRecord) -> String {
    let money = |v: Option<f64>| v.map(format::money).unwrap_or_else(|| "-".to_string());
    format!(
        "#{:<5} {:<8} {:<28} {:>6} {:>6}  stake {:>9}  profit {:>9}  {}",
        bet.id.as_deref().unwrap_or_default(),
        bet.status().label(),
        format!(
            "{} ({} @ {})",
            bet.team_selected.as_deref().unwrap_or("?"),
            bet.away_team.as_deref().unwrap_or("?"),
            bet.home_team.as_deref().unwrap_or("?"),
        ),
        bet.spread.map(|s| format!("{s:+}")).unwrap_or_default(),
        bet.american_odds.map(format::american_odds).unwrap_or_default(),
        money(bet.bet_amount),
        money(bet.profit),
        bet.timestamp.as_deref().unwrap_or(""),
    )
}

pub fn summary(s: &PortfolioSummary) -> String {
    let window = |label: &str, w: &PnlWindow| {
        format!(
            "  {label:<9} {:>10}  {} bets · {} risk",
            format::money(w.total_profit),
            w.bets,
            format::money(w.total_risk),
        )
    };
    [
        format!(
            "balance {}  risk {}  bets {}  win rate {}",
            format::money(s.balance),
            format::percent(s.risk_percent),
            s.total_bets,
            format::probability(s.win_rate),
        ),
        format!(
            "won {}  lost {}  pending {}  total profit {}",
            s.wins,
            s.losses,
            s.pending,
            format::money(s.total_profit),
        ),
        "PNL".to_string(),
        window("today", &s.pnl.day),
        window("this week", &s.pnl.week),
        window("overall", &s.pnl.overall),
        format!(
            "sharpe  day {:.2}  week {:.2}  overall {:.2}",
            s.sharpe_ratio.day, s.sharpe_ratio.week, s.sharpe_ratio.overall,
        ),
    ]
    .join("\n")
}

pub fn connection(status: &ConnectionStatus) -> String {
    let state = if status.is_connected() { "connected" } else { "error" };
    let mut out = format!(
        "{:<15} {:<10} {:>5}ms  {}",
        status.name, state, status.response_time_ms, status.url
    );
    if let Some(err) = &status.error {
        let _ = write!(out, "  ({err})");
    }
    out
}

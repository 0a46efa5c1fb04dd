use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bankroll reported when the ledger cannot be reached.
pub const DEFAULT_BALANCE: f64 = 150.0;
/// Fraction of bankroll the staking calculator risks per bet, in percent.
pub const DEFAULT_RISK_PERCENT: f64 = 7.33;
pub const SPREAD_BET_TYPE: &str = "Point Spread";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub balance: f64,
    #[serde(default)]
    pub formatted: Option<String>,
    #[serde(default)]
    pub risk_percent: Option<f64>,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub error: bool,
}

impl Balance {
    pub fn fallback() -> Self {
        Self {
            balance: DEFAULT_BALANCE,
            formatted: Some(crate::format::money(DEFAULT_BALANCE)),
            risk_percent: Some(DEFAULT_RISK_PERCENT),
            error: true,
        }
    }
}

/// Games the ledger knows about for a date (`today` or `YYYY-MM-DD`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlateGames {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub count: u64,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub games: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub error: bool,
}

impl SlateGames {
    pub fn fallback(date: &str) -> Self {
        Self {
            date: date.to_string(),
            count: 0,
            games: Vec::new(),
            error: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRequest {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub team_selected: String,
    pub bet_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<f64>,
    pub american_odds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bet_amount: Option<f64>,
}

impl BetRequest {
    /// A point-spread bet on one side of `game`.
    pub fn spread_bet(
        game: &crate::domain::game::Game,
        team_selected: &str,
        spread: Option<f64>,
        american_odds: f64,
        risk_percent: f64,
    ) -> anyhow::Result<Self> {
        let team_selected = team_selected.trim();
        anyhow::ensure!(!team_selected.is_empty(), "team_selected must be non-empty");
        anyhow::ensure!(
            team_selected == game.home_team.team_name || team_selected == game.away_team.team_name,
            "team_selected {team_selected:?} does not play in {}",
            game.matchup()
        );
        anyhow::ensure!(american_odds != 0.0, "american odds must be non-zero");

        Ok(Self {
            game_id: game.game_id.to_string(),
            home_team: game.home_team.team_name.clone(),
            away_team: game.away_team.team_name.clone(),
            home_team_id: game.home_team.team_id.to_string(),
            away_team_id: game.away_team.team_id.to_string(),
            team_selected: team_selected.to_string(),
            bet_type: SPREAD_BET_TYPE.to_string(),
            spread,
            american_odds,
            risk_percent: Some(risk_percent),
            bet_amount: None,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetCalculation {
    #[serde(default)]
    pub bet_amount: Option<f64>,
    #[serde(default)]
    pub payout: Option<f64>,
    #[serde(default)]
    pub profit: Option<f64>,
    #[serde(default)]
    pub roi: Option<f64>,
    #[serde(default)]
    pub win_probability_percent: Option<f64>,
    #[serde(default)]
    pub decimal_odds: Option<f64>,
    #[serde(default)]
    pub risk_percent: Option<f64>,
}

/// Response to a placed bet. Only the updated balance is interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetReceipt {
    #[serde(default)]
    pub balance: Option<f64>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetRecord {
    #[serde(default, deserialize_with = "crate::domain::lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub team_selected: Option<String>,
    #[serde(default)]
    pub bet_type: Option<String>,
    #[serde(default)]
    pub spread: Option<f64>,
    #[serde(default)]
    pub american_odds: Option<f64>,
    #[serde(default)]
    pub decimal_odds: Option<f64>,
    #[serde(default)]
    pub bet_amount: Option<f64>,
    #[serde(default)]
    pub payout: Option<f64>,
    #[serde(default)]
    pub profit: Option<f64>,
    #[serde(default)]
    pub roi: Option<f64>,
    #[serde(default)]
    pub risk_percent: Option<f64>,
    #[serde(default)]
    pub win_probability: Option<f64>,
    #[serde(default)]
    pub balance_before: Option<f64>,
    #[serde(default)]
    pub balance_after: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub game_date: Option<String>,
}

impl BetRecord {
    pub fn status(&self) -> BetStatus {
        let raw = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.result.as_deref())
            .unwrap_or("");
        BetStatus::normalize(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Push,
}

impl BetStatus {
    /// The ledger has written both `won`/`lost` and `win`/`loss` over time.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "won" | "win" => Self::Won,
            "lost" | "loss" => Self::Lost,
            "push" => Self::Push,
            _ => Self::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Push => "push",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Won => "Won",
            Self::Lost => "Lost",
            Self::Push => "Push",
        }
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BetFilter {
    #[default]
    All,
    Only(BetStatus),
}

impl BetFilter {
    pub fn matches(self, bet: &BetRecord) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => bet.status() == status,
        }
    }

    pub fn apply(self, bets: &[BetRecord]) -> Vec<&BetRecord> {
        bets.iter().filter(|b| self.matches(b)).collect()
    }
}

impl FromStr for BetFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Only(BetStatus::Pending)),
            "won" => Ok(Self::Only(BetStatus::Won)),
            "lost" => Ok(Self::Only(BetStatus::Lost)),
            "push" => Ok(Self::Only(BetStatus::Push)),
            other => anyhow::bail!("unknown bet filter {other:?} (all|pending|won|lost|push)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetList {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub bets: Vec<BetRecord>,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub count: u64,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub error: bool,
}

impl BetList {
    pub fn fallback() -> Self {
        Self {
            bets: Vec::new(),
            count: 0,
            error: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PnlWindow {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub total_profit: f64,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub bets: u64,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub total_risk: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PnlByPeriod {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub day: PnlWindow,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub week: PnlWindow,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub overall: PnlWindow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SharpeByPeriod {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub day: f64,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub week: f64,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub overall: f64,
}

/// Aggregates computed by the ledger. Any field may be absent on older deployments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub balance: Option<f64>,
    #[serde(default)]
    pub total_bets: Option<u64>,
    #[serde(default)]
    pub wins: Option<u64>,
    #[serde(default)]
    pub losses: Option<u64>,
    #[serde(default)]
    pub pending: Option<u64>,
    #[serde(default)]
    pub total_profit: Option<f64>,
    #[serde(default)]
    pub win_rate: Option<f64>,
    #[serde(default)]
    pub pnl: Option<PnlByPeriod>,
    #[serde(default)]
    pub sharpe_ratio: Option<SharpeByPeriod>,
}

impl Statistics {
    fn zeroed(balance: f64, total_bets: u64) -> Self {
        Self {
            balance: Some(balance),
            total_bets: Some(total_bets),
            wins: Some(0),
            losses: Some(0),
            pending: Some(0),
            total_profit: Some(0.0),
            win_rate: Some(0.0),
            pnl: Some(PnlByPeriod::default()),
            sharpe_ratio: Some(SharpeByPeriod::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub balance: f64,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub risk_percent: f64,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub bet_history: Vec<BetRecord>,
    #[serde(default)]
    pub statistics: Option<Statistics>,
    #[serde(default, deserialize_with = "crate::domain::null_as_default")]
    pub error: bool,
}

impl Portfolio {
    pub fn fallback() -> Self {
        Self {
            balance: DEFAULT_BALANCE,
            risk_percent: DEFAULT_RISK_PERCENT,
            bet_history: Vec::new(),
            statistics: Some(Statistics::zeroed(DEFAULT_BALANCE, 0)),
            error: true,
        }
    }

    /// Fills the gaps older ledger versions leave in the payload.
    pub fn normalize(mut self) -> Self {
        if self.balance == 0.0 {
            self.balance = DEFAULT_BALANCE;
        }
        if self.risk_percent == 0.0 {
            self.risk_percent = DEFAULT_RISK_PERCENT;
        }
        if self.statistics.is_none() {
            self.statistics = Some(Statistics::zeroed(
                self.balance,
                self.bet_history.len() as u64,
            ));
        }
        self
    }

    pub fn pnl(&self) -> PnlByPeriod {
        self.statistics
            .as_ref()
            .and_then(|s| s.pnl)
            .unwrap_or_default()
    }

    pub fn sharpe_ratio(&self) -> SharpeByPeriod {
        self.statistics
            .as_ref()
            .and_then(|s| s.sharpe_ratio)
            .unwrap_or_default()
    }

    pub fn find_bet(&self, id: &str) -> Option<&BetRecord> {
        let id = id.trim();
        self.bet_history.iter().find(|b| b.id.as_deref() == Some(id))
    }
}

/// Headline numbers for the portfolio view. Ledger statistics win; gaps are derived from
/// the bet history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub balance: f64,
    pub risk_percent: f64,
    pub total_bets: u64,
    pub wins: u64,
    pub losses: u64,
    pub pending: u64,
    pub total_profit: f64,
    pub win_rate: f64,
    pub pnl: PnlByPeriod,
    pub sharpe_ratio: SharpeByPeriod,
}

impl PortfolioSummary {
    pub fn from_portfolio(portfolio: &Portfolio) -> Self {
        let stats = portfolio.statistics.clone().unwrap_or_default();
        let history = &portfolio.bet_history;
        let count = |status: BetStatus| history.iter().filter(|b| b.status() == status).count() as u64;

        let win_rate = stats.win_rate.unwrap_or_else(|| {
            let resolved = history
                .iter()
                .filter(|b| b.status() != BetStatus::Pending)
                .count();
            if resolved == 0 {
                0.0
            } else {
                count(BetStatus::Won) as f64 / resolved as f64
            }
        });

        Self {
            balance: portfolio.balance,
            risk_percent: portfolio.risk_percent,
            total_bets: stats.total_bets.unwrap_or(history.len() as u64),
            wins: stats.wins.unwrap_or_else(|| count(BetStatus::Won)),
            losses: stats.losses.unwrap_or_else(|| count(BetStatus::Lost)),
            pending: stats.pending.unwrap_or_else(|| count(BetStatus::Pending)),
            total_profit: stats
                .total_profit
                .unwrap_or_else(|| history.iter().filter_map(|b| b.profit).sum()),
            win_rate,
            pnl: portfolio.pnl(),
            sharpe_ratio: portfolio.sharpe_ratio(),
        }
    }
}

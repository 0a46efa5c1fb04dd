use crate::config::Settings;
use crate::domain::ledger::{
    Balance, BetCalculation, BetList, BetReceipt, BetRequest, BetStatus, Portfolio, SlateGames,
};
use crate::http::{JsonService, Probe, Service};
use anyhow::Context;
use serde::Serialize;
use std::time::Duration;

const BALANCE_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);
const PORTFOLIO_TIMEOUT: Duration = Duration::from_secs(15);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Client for the bet ledger: bankroll, staking calculator, bet history and portfolio stats.
///
/// Reads degrade to fallback values; calculations and bet placement return errors.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    svc: JsonService,
}

#[derive(Debug, Serialize)]
struct CalculateBetBody {
    american_odds: f64,
    risk_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance: Option<f64>,
}

#[derive(Debug, Serialize)]
struct CalculateFromAmountBody {
    american_odds: f64,
    bet_amount: f64,
    balance: f64,
}

impl LedgerClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(&settings.ledger_api_url, settings.http_timeout_ceiling)
    }

    pub fn new(base_url: &str, ceiling: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            svc: JsonService::new(Service::Ledger, base_url, ceiling)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.svc.base_url()
    }

    pub async fn balance(&self) -> Balance {
        match self
            .svc
            .get_as::<Balance>("/api/balance", &[], BALANCE_TIMEOUT)
            .await
        {
            Ok(b) => b,
            Err(err) => {
                tracing::error!(error = %err, "failed to load balance; using default bankroll");
                Balance::fallback()
            }
        }
    }

    /// Games on the ledger's slate. `date` is `today` or `YYYY-MM-DD`.
    pub async fn slate_games(&self, date: &str) -> SlateGames {
        let path = format!("/api/games/{date}");
        match self.svc.get_as::<SlateGames>(&path, &[], READ_TIMEOUT).await {
            Ok(g) => g,
            Err(err) => {
                tracing::error!(date, error = %err, "failed to load slate games");
                SlateGames::fallback(date)
            }
        }
    }

    pub async fn calculate_bet(
        &self,
        american_odds: f64,
        risk_percent: f64,
        balance: Option<f64>,
    ) -> anyhow::Result<BetCalculation> {
        let body = CalculateBetBody {
            american_odds,
            risk_percent,
            balance,
        };
        let raw = self
            .svc
            .post("/api/calculate-bet", Some(&body), WRITE_TIMEOUT)
            .await
            .context("bet calculation failed")?;
        self.svc.decode("/api/calculate-bet", raw)
    }

    pub async fn calculate_bet_from_amount(
        &self,
        american_odds: f64,
        bet_amount: f64,
        balance: f64,
    ) -> anyhow::Result<BetCalculation> {
        let body = CalculateFromAmountBody {
            american_odds,
            bet_amount,
            balance,
        };
        let raw = self
            .svc
            .post("/api/calculate-bet-from-amount", Some(&body), WRITE_TIMEOUT)
            .await
            .context("bet calculation failed")?;
        self.svc.decode("/api/calculate-bet-from-amount", raw)
    }

    pub async fn place_bet(&self, bet: &BetRequest) -> anyhow::Result<BetReceipt> {
        let raw = self
            .svc
            .post("/api/bets", Some(bet), WRITE_TIMEOUT)
            .await
            .with_context(|| format!("placing bet on game {} failed", bet.game_id))?;
        let receipt: BetReceipt = self.svc.decode("/api/bets", raw)?;
        tracing::info!(
            game_id = %bet.game_id,
            team = %bet.team_selected,
            american_odds = bet.american_odds,
            balance = ?receipt.balance,
            "bet placed"
        );
        Ok(receipt)
    }

    pub async fn bets(&self, status: Option<BetStatus>) -> BetList {
        let query: Vec<(&str, &str)> = status.map(|s| ("status", s.as_str())).into_iter().collect();
        match self
            .svc
            .get_as::<BetList>("/api/bets", &query, READ_TIMEOUT)
            .await
        {
            Ok(list) => {
                tracing::debug!(count = list.bets.len(), "bets loaded");
                list
            }
            Err(err) => {
                tracing::error!(error = %err, base_url = %self.svc.base_url(), "failed to load bets");
                BetList::fallback()
            }
        }
    }

    pub async fn portfolio(&self) -> Portfolio {
        match self
            .svc
            .get_as::<Portfolio>("/api/portfolio", &[], PORTFOLIO_TIMEOUT)
            .await
        {
            Ok(p) => {
                let p = p.normalize();
                tracing::debug!(
                    balance = p.balance,
                    bets = p.bet_history.len(),
                    "portfolio loaded"
                );
                p
            }
            Err(err) => {
                tracing::error!(error = %err, base_url = %self.svc.base_url(), "failed to load portfolio; using fallback");
                Portfolio::fallback()
            }
        }
    }

    /// Asks the ledger to settle pending bets. Best effort; failures are only logged.
    pub async fn resolve_all(&self) {
        match self
            .svc
            .post::<()>("/api/bets/resolve-all", None, PORTFOLIO_TIMEOUT)
            .await
        {
            Ok(_) => tracing::debug!("pending bets resolution requested"),
            Err(err) => tracing::warn!(error = %err, "could not resolve pending bets"),
        }
    }

    pub async fn health(&self) -> Probe {
        self.svc.probe("/health", HEALTH_TIMEOUT).await
    }
}

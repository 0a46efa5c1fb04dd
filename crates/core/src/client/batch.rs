use crate::client::RunControl;
use crate::config::Settings;
use crate::domain::daily::{DailyFile, DailyKind, DailyListing, RunLogs, RunStatus, RunTrigger};
use crate::http::{JsonService, Probe, Service, ServiceError};
use anyhow::Context;
use chrono::NaiveDate;
use std::time::Duration;

const TRIGGER_TIMEOUT: Duration = Duration::from_secs(35);
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);
const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(20);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Client for the simulation batch service: run control and the daily output archive.
#[derive(Debug, Clone)]
pub struct BatchClient {
    svc: JsonService,
}

impl BatchClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(&settings.batch_api_url, settings.http_timeout_ceiling)
    }

    pub fn new(base_url: &str, ceiling: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            svc: JsonService::new(Service::Batch, base_url, ceiling)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.svc.base_url()
    }

    /// Starts the simulation job for today's slate.
    pub async fn trigger_run(&self) -> anyhow::Result<RunTrigger> {
        let raw = self
            .svc
            .post::<()>("/api/run", None, TRIGGER_TIMEOUT)
            .await
            .context("failed to start simulation run")?;
        let trigger: RunTrigger = self.svc.decode("/api/run", raw)?;
        tracing::info!(message = ?trigger.message, "simulation run triggered");
        Ok(trigger)
    }

    pub async fn run_logs(&self) -> Vec<String> {
        match self
            .svc
            .get_as::<RunLogs>("/api/run/logs", &[], STATUS_TIMEOUT)
            .await
        {
            Ok(l) => l.logs,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load run logs");
                Vec::new()
            }
        }
    }

    /// Simulation outputs for a date. A date with nothing published is empty, not an error.
    pub async fn predictions_for_date(&self, date: NaiveDate) -> anyhow::Result<DailyListing> {
        let path = format!("/api/predictions/{date}");
        self.listing_at(&path, date).await
    }

    pub async fn daily_listing(
        &self,
        kind: DailyKind,
        date: NaiveDate,
    ) -> anyhow::Result<DailyListing> {
        let path = format!("/api/daily/{}/{date}", kind.as_path());
        self.listing_at(&path, date).await
    }

    async fn listing_at(&self, path: &str, date: NaiveDate) -> anyhow::Result<DailyListing> {
        match self.svc.get_as::<DailyListing>(path, &[], ARCHIVE_TIMEOUT).await {
            Ok(mut listing) => {
                if listing.date.is_empty() {
                    listing.date = date.to_string();
                }
                Ok(listing)
            }
            Err(err) if ServiceError::not_found(&err) => {
                tracing::debug!(path, "nothing published for date");
                Ok(DailyListing::empty(&date.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    pub async fn daily_file(
        &self,
        kind: DailyKind,
        date: NaiveDate,
        name: &str,
    ) -> anyhow::Result<DailyFile> {
        let path = format!("/api/daily/{}/{date}/{name}", kind.as_path());
        let mut file: DailyFile = self
            .svc
            .get_as(&path, &[], ARCHIVE_TIMEOUT)
            .await
            .with_context(|| format!("failed to load {kind} file {name}"))?;
        if file.name.is_empty() {
            file.name = name.to_string();
        }
        Ok(file)
    }

    pub async fn health(&self) -> Probe {
        self.svc.probe("/api/health", HEALTH_TIMEOUT).await
    }
}

#[async_trait::async_trait]
impl RunControl for BatchClient {
    async fn run_status(&self) -> anyhow::Result<RunStatus> {
        self.svc
            .get_as::<RunStatus>("/api/run/status", &[], STATUS_TIMEOUT)
            .await
    }
}

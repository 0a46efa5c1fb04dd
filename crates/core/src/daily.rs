use crate::client::batch::BatchClient;
use crate::domain::daily::{DailyFile, DailyKind, DailyListing};
use crate::domain::snapshot::{PredictionCard, PredictionSnapshot};
use crate::reconcile::latest_per_game;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Access to the batch service's per-date archive, with a filename-keyed payload cache.
///
/// The cache is append-only: once a filename has a payload, later copies are ignored.
pub struct DailyArchive {
    batch: BatchClient,
    cache: Mutex<HashMap<String, Value>>,
}

impl DailyArchive {
    pub fn new(batch: BatchClient) -> Self {
        Self {
            batch,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn batch(&self) -> &BatchClient {
        &self.batch
    }

    pub async fn cached_files(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn listing(&self, kind: DailyKind, date: NaiveDate) -> anyhow::Result<DailyListing> {
        let listing = self.batch.daily_listing(kind, date).await?;

        let mut cache = self.cache.lock().await;
        let before = cache.len();
        for file in listing.files.iter().filter(|f| f.has_payload()) {
            cache
                .entry(file.name.clone())
                .or_insert_with(|| file.data.clone());
        }
        tracing::debug!(
            %kind,
            %date,
            files = listing.files.len(),
            newly_cached = cache.len() - before,
            "daily listing loaded"
        );
        Ok(listing)
    }

    pub async fn file(&self, kind: DailyKind, date: NaiveDate, name: &str) -> anyhow::Result<DailyFile> {
        if let Some(data) = self.cache.lock().await.get(name).cloned() {
            tracing::debug!(%kind, name, "daily file served from cache");
            return Ok(DailyFile {
                name: name.to_string(),
                data,
            });
        }

        let file = self.batch.daily_file(kind, date, name).await?;
        if file.has_payload() {
            self.cache
                .lock()
                .await
                .entry(file.name.clone())
                .or_insert_with(|| file.data.clone());
        }
        Ok(file)
    }

    /// The current simulation snapshot per game for `date`, as display cards.
    ///
    /// Listed files without an inline payload are fetched one by one; a file that cannot be
    /// fetched is left out rather than failing the whole date.
    pub async fn latest_predictions(&self, date: NaiveDate) -> anyhow::Result<Vec<PredictionCard>> {
        let listing = self.listing(DailyKind::Simulations, date).await?;

        let mut snapshots = Vec::with_capacity(listing.files.len());
        for file in listing.files {
            let file = if file.has_payload() {
                file
            } else {
                match self.file(DailyKind::Simulations, date, &file.name).await {
                    Ok(f) => f,
                    Err(err) => {
                        tracing::warn!(%date, name = %file.name, error = %err, "failed to load simulation file; skipping");
                        continue;
                    }
                }
            };
            snapshots.push(PredictionSnapshot::from(file));
        }

        let total = snapshots.len();
        let reconciled = latest_per_game(snapshots);
        tracing::info!(
            %date,
            files = total,
            games = reconciled.snapshots.len(),
            replaced = reconciled.replaced,
            skipped_without_game_id = reconciled.skipped_without_game_id,
            "simulation snapshots reconciled"
        );

        let requested = date.to_string();
        Ok(reconciled
            .snapshots
            .iter()
            .map(|s| PredictionCard::from_snapshot(s, &requested))
            .collect())
    }
}

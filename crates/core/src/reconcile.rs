use crate::domain::snapshot::PredictionSnapshot;
use std::collections::HashMap;

/// Result of collapsing a date's snapshot files to one per game.
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    /// Current snapshot per game, in order of each game's first appearance.
    pub snapshots: Vec<PredictionSnapshot>,
    pub skipped_without_game_id: usize,
    pub replaced: usize,
}

/// Keeps the most recently generated snapshot per game id.
///
/// Ordering signals, strongest first: `generated_at` when both sides have it, the filename
/// timestamp token when both sides have it, then presence of `generated_at`. With no signal
/// the first snapshot seen is kept. Snapshots without a game id are dropped.
pub fn latest_per_game<I>(snapshots: I) -> Reconciled
where
    I: IntoIterator<Item = PredictionSnapshot>,
{
    let mut out = Reconciled::default();
    let mut slot_by_game = HashMap::new();

    for snapshot in snapshots {
        let Some(game_id) = snapshot.game_id.clone() else {
            out.skipped_without_game_id += 1;
            tracing::debug!(file = %snapshot.file_name, "snapshot has no game_id; skipping");
            continue;
        };

        match slot_by_game.get(&game_id) {
            None => {
                slot_by_game.insert(game_id, out.snapshots.len());
                out.snapshots.push(snapshot);
            }
            Some(&slot) => {
                let current = &out.snapshots[slot];
                if supersedes(&snapshot, current) {
                    tracing::debug!(
                        %game_id,
                        from = %current.file_name,
                        to = %snapshot.file_name,
                        "newer snapshot replaces current"
                    );
                    out.snapshots[slot] = snapshot;
                    out.replaced += 1;
                }
            }
        }
    }

    out
}

/// Whether `candidate` should replace `current` for the same game.
pub fn supersedes(candidate: &PredictionSnapshot, current: &PredictionSnapshot) -> bool {
    if let (Some(new), Some(old)) = (candidate.generated_at, current.generated_at) {
        return new > old;
    }
    if let (Some(new), Some(old)) = (candidate.file_stamp(), current.file_stamp()) {
        return new > old;
    }
    candidate.generated_at.is_some() && current.generated_at.is_none()
}

use crate::client::RunControl;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval: Duration,
    /// Stop after this many status checks. `None` polls until the run finishes or is cancelled.
    pub max_polls: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
        }
    }
}

impl PollOptions {
    pub fn with_interval_secs(secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(secs).clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL),
            max_polls: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Finished { polls: u32 },
    Cancelled { polls: u32 },
    GaveUp { polls: u32 },
}

/// Polls the batch run status at a fixed interval until it reports `running: false`.
///
/// The first check happens one interval after the call. A failed check is logged and the loop
/// keeps going. `cancel` resolving ends the wait at once.
pub async fn wait_for_run<C, F>(ctl: &C, opts: PollOptions, cancel: F) -> PollOutcome
where
    C: RunControl + ?Sized,
    F: Future<Output = ()>,
{
    let period = opts.interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    tokio::pin!(cancel);

    let mut polls = 0u32;
    loop {
        if opts.max_polls.is_some_and(|max| polls >= max) {
            tracing::warn!(polls, "run still in progress; giving up");
            return PollOutcome::GaveUp { polls };
        }

        tokio::select! {
            _ = &mut cancel => {
                tracing::info!(polls, "run polling cancelled");
                return PollOutcome::Cancelled { polls };
            }
            _ = ticker.tick() => {}
        }

        polls += 1;
        match ctl.run_status().await {
            Ok(status) if !status.running => {
                tracing::info!(polls, timestamp = ?status.timestamp, "simulation run finished");
                return PollOutcome::Finished { polls };
            }
            Ok(_) => tracing::debug!(polls, "simulation run still in progress"),
            Err(err) => tracing::warn!(polls, error = %err, "run status check failed; will retry"),
        }
    }
}

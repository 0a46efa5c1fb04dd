pub mod client;
pub mod daily;
pub mod dashboard;
pub mod domain;
pub mod format;
pub mod health;
pub mod http;
pub mod poll;
pub mod reconcile;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_GAME_API_URL: &str = "http://localhost:8000";
    const DEFAULT_PREDICTION_API_URL: &str = "http://localhost:5000";
    const DEFAULT_LEDGER_API_URL: &str = "http://localhost:8002";
    const DEFAULT_BATCH_API_URL: &str = "http://localhost:8001";
    const DEFAULT_TIMEOUT_CEILING_SECS: u64 = 35;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub game_api_url: String,
        pub prediction_api_url: String,
        pub ledger_api_url: String,
        pub batch_api_url: String,
        pub http_timeout_ceiling: Duration,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let ceiling_secs = match std::env::var("HTTP_TIMEOUT_CEILING_SECS") {
                Ok(s) => s
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("HTTP_TIMEOUT_CEILING_SECS is not a number: {s}"))?,
                Err(_) => DEFAULT_TIMEOUT_CEILING_SECS,
            };
            anyhow::ensure!(ceiling_secs >= 1, "HTTP_TIMEOUT_CEILING_SECS must be >= 1");

            Ok(Self {
                game_api_url: url_from_env("GAME_API_URL", DEFAULT_GAME_API_URL),
                prediction_api_url: url_from_env("PREDICTION_API_URL", DEFAULT_PREDICTION_API_URL),
                ledger_api_url: url_from_env("LEDGER_API_URL", DEFAULT_LEDGER_API_URL),
                batch_api_url: url_from_env("BATCH_API_URL", DEFAULT_BATCH_API_URL),
                http_timeout_ceiling: Duration::from_secs(ceiling_secs),
                sentry_dsn: std::env::var("SENTRY_DSN")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
            })
        }

        /// Settings pointing every service at one base URL. Handy for tests and local stacks.
        pub fn single_host(base_url: &str) -> Self {
            let base_url = ensure_scheme(base_url);
            Self {
                game_api_url: base_url.clone(),
                prediction_api_url: base_url.clone(),
                ledger_api_url: base_url.clone(),
                batch_api_url: base_url,
                http_timeout_ceiling: Duration::from_secs(DEFAULT_TIMEOUT_CEILING_SECS),
                sentry_dsn: None,
            }
        }
    }

    fn url_from_env(key: &str, default: &str) -> String {
        let raw = std::env::var(key)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default.to_string());
        ensure_scheme(&raw)
    }

    /// Deployment URLs are often configured without a scheme; assume TLS in that case.
    pub fn ensure_scheme(url: &str) -> String {
        let url = url.trim();
        if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!("https://{url}")
    }

}

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Games,
    Predictions,
    Ledger,
    Batch,
}

impl Service {
    pub fn name(self) -> &'static str {
        match self {
            Self::Games => "games",
            Self::Predictions => "predictions",
            Self::Ledger => "ledger",
            Self::Batch => "batch",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct ServiceError {
    pub service: Service,
    pub stage: &'static str,
    pub detail: String,
    pub status: Option<StatusCode>,
    pub raw_body: Option<Value>,
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        self.status == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_timeout(&self) -> bool {
        self.stage == "timeout"
    }

    /// True when `err` carries a 404 from one of the services.
    pub fn not_found(err: &anyhow::Error) -> bool {
        err.downcast_ref::<ServiceError>()
            .is_some_and(ServiceError::is_not_found)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} service error (stage={}): {}",
            self.service, self.stage, self.detail
        )
    }
}

impl std::error::Error for ServiceError {}

/// Thin JSON-over-HTTP wrapper around one backend service.
#[derive(Debug, Clone)]
pub struct JsonService {
    http: reqwest::Client,
    service: Service,
    base_url: String,
}

impl JsonService {
    pub fn new(service: Service, base_url: &str, ceiling: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(ceiling)
            .build()
            .with_context(|| format!("failed to build {service} http client"))?;

        Ok(Self {
            http,
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> anyhow::Result<Value> {
        let req = self.http.get(self.url(path)).headers(Self::headers()).query(query);
        self.send(req, "GET", path, timeout).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        timeout: Duration,
    ) -> anyhow::Result<Value> {
        let mut req = self.http.post(self.url(path)).headers(Self::headers());
        if let Some(body) = body {
            req = req.json(body);
        }
        self.send(req, "POST", path, timeout).await
    }

    /// GET `path` and decode into `T`.
    pub async fn get_as<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> anyhow::Result<T> {
        let raw = self.get(path, query, timeout).await?;
        self.decode(path, raw)
    }

    pub fn decode<T: serde::de::DeserializeOwned>(&self, path: &str, raw: Value) -> anyhow::Result<T> {
        serde_json::from_value::<T>(raw.clone()).map_err(|e| {
            ServiceError {
                service: self.service,
                stage: "decode",
                detail: format!("{path}: {e}"),
                status: None,
                raw_body: Some(raw),
            }
            .into()
        })
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        method: &'static str,
        path: &str,
        timeout: Duration,
    ) -> anyhow::Result<Value> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::debug!(service = %self.service, %request_id, method, path, "request");

        let outcome = tokio::time::timeout(timeout, async {
            let res = req.send().await.map_err(|e| self.error("request", e.to_string(), None, None))?;
            let status = res.status();
            let text = res
                .text()
                .await
                .map_err(|e| self.error("request", format!("failed to read body: {e}"), Some(status), None))?;
            Ok::<_, ServiceError>((status, text))
        })
        .await;

        let elapsed_ms = started.elapsed().as_millis();
        let (status, text) = match outcome {
            Ok(Ok(pair)) => pair,
            Ok(Err(err)) => {
                tracing::warn!(service = %self.service, %request_id, method, path, elapsed_ms, error = %err, "request failed");
                return Err(err.into());
            }
            Err(_) => {
                let err = self.error("timeout", format!("{method} {path} exceeded {timeout:?}"), None, None);
                tracing::warn!(service = %self.service, %request_id, method, path, elapsed_ms, error = %err, "request timed out");
                return Err(err.into());
            }
        };

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(v) => v,
                Err(_) if !status.is_success() => Value::String(text),
                Err(e) => {
                    return Err(self
                        .error("decode", format!("{path}: response is not JSON: {e}"), Some(status), Some(Value::String(text)))
                        .into())
                }
            }
        };

        if !status.is_success() {
            let detail = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            tracing::warn!(service = %self.service, %request_id, method, path, %status, elapsed_ms, "non-success status");
            return Err(self.error("http", detail, Some(status), Some(body)).into());
        }

        tracing::debug!(service = %self.service, %request_id, %status, elapsed_ms, "response");
        Ok(body)
    }

    fn error(
        &self,
        stage: &'static str,
        detail: String,
        status: Option<StatusCode>,
        raw_body: Option<Value>,
    ) -> ServiceError {
        ServiceError {
            service: self.service,
            stage,
            detail,
            status,
            raw_body,
        }
    }

    /// Hits a health endpoint. Never fails; the outcome is in the returned probe.
    pub async fn probe(&self, path: &str, timeout: Duration) -> Probe {
        let started = Instant::now();
        let outcome = tokio::time::timeout(
            timeout,
            self.http.get(self.url(path)).headers(Self::headers()).send(),
        )
        .await;
        let elapsed = started.elapsed();

        let error = match outcome {
            Ok(Ok(res)) if res.status().is_success() => None,
            Ok(Ok(res)) => Some(format!("HTTP {}", res.status().as_u16())),
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!("timed out after {timeout:?}")),
        };

        Probe {
            url: self.base_url.clone(),
            elapsed,
            error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Probe {
    pub url: String,
    pub elapsed: Duration,
    pub error: Option<String>,
}

use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, warn};

use common::metrics;
use configs::OcrConfig;

use crate::circuit_breaker::CircuitBreaker;
use crate::retry::{retry_with_policy, RetryPolicy};
use crate::UpstreamError;

/// One file attached to a multipart request.
#[derive(Clone, Debug)]
pub struct Upload {
    pub field: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ClientOptions {
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub breaker: CircuitBreaker,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::new(2, Duration::from_millis(100), Duration::from_secs(1), true),
            breaker: CircuitBreaker::new(5, Duration::from_secs(30), 1, true),
        }
    }
}

impl ClientOptions {
    pub fn from_ocr(cfg: &OcrConfig) -> Self {
        Self {
            api_key: cfg.api_key.clone(),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            retry: RetryPolicy::from_config(&cfg.retry),
            breaker: CircuitBreaker::from_config(&cfg.circuit_breaker),
        }
    }
}

/// JSON-over-HTTP client for one external service, guarded by a circuit breaker
/// and retried with backoff.
#[derive(Clone)]
pub struct UpstreamClient {
    name: &'static str,
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
}

impl UpstreamClient {
    pub fn new(name: &'static str, base_url: impl Into<String>, opts: ClientOptions) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .connect_timeout(opts.connect_timeout)
            .timeout(opts.timeout)
            .build()
            .map_err(|e| UpstreamError::Config(e.to_string()))?;
        Ok(Self {
            name,
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: opts.api_key,
            retry: opts.retry,
            breaker: opts.breaker,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// POST `{base_url}{path}` with a single-file multipart body and decode the JSON reply.
    pub async fn post_multipart(&self, path: &str, query: &[(&str, &str)], upload: Upload) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        self.call(|| {
            let form = Form::new().part(upload.field.clone(), file_part(&upload));
            self.authorize(self.http.post(&url).query(query)).multipart(form)
        })
        .await
    }

    /// GET an absolute URL and decode the JSON reply.
    pub async fn get_json(&self, url: &str) -> Result<Value, UpstreamError> {
        self.call(|| self.authorize(self.http.get(url))).await
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn call<B>(&self, build: B) -> Result<Value, UpstreamError>
    where
        B: Fn() -> reqwest::RequestBuilder,
    {
        let build = &build;
        retry_with_policy(&self.retry, move || async move {
            if !self.breaker.can_execute().await {
                metrics::CIRCUIT_OPEN_TOTAL.inc();
                return Err(UpstreamError::CircuitOpen(self.name));
            }
            metrics::UPSTREAM_CALLS_TOTAL.inc();
            let started = Instant::now();
            let result = self.send_once(build()).await;
            metrics::UPSTREAM_DURATION.observe(started.elapsed().as_secs_f64());
            match &result {
                Ok(_) => self.breaker.record_success().await,
                // 4xx is the caller's fault, not an unhealthy upstream
                Err(e) if e.counts_against_upstream() => {
                    metrics::UPSTREAM_ERRORS_TOTAL.inc();
                    self.breaker.record_failure().await;
                }
                Err(_) => self.breaker.record_success().await,
            }
            result
        })
        .await
    }

    async fn send_once(&self, req: reqwest::RequestBuilder) -> Result<Value, UpstreamError> {
        let resp = req.send().await.map_err(|e| {
            warn!(upstream = self.name, event = "upstream_transport_error", error = %e);
            UpstreamError::Transport(e.to_string())
        })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!(upstream = self.name, event = "upstream_status", status = status.as_u16());
            return Err(UpstreamError::Status { status: status.as_u16(), body: truncate(body, 512) });
        }
        resp.json::<Value>().await.map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

fn file_part(upload: &Upload) -> Part {
    let part = || Part::bytes(upload.bytes.clone()).file_name(upload.filename.clone());
    match upload.content_type.as_deref() {
        // unknown mime strings fall back to an untyped part
        Some(ct) => part().mime_str(ct).unwrap_or_else(|_| part()),
        None => part(),
    }
}

fn truncate(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    s
}

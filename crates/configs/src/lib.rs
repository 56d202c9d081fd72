use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub barcode: BarcodeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            worker_threads: Some(4),
            frontend_dir: default_frontend_dir(),
        }
    }
}

fn default_frontend_dir() -> String { "frontend".into() }

/// External OCR service the receipt/item scan routes forward images to.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            base_url: default_ocr_url(),
            api_key: None,
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_request_timeout(),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

fn default_ocr_url() -> String { "http://127.0.0.1:8000".into() }
fn default_connect_timeout() -> u64 { 5 }
fn default_request_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub enabled: bool,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { enabled: true, max_attempts: 3, backoff_base_ms: 100, backoff_max_ms: 2000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    pub enabled: bool,
    pub failure_threshold: u64,
    pub recovery_timeout_secs: u64,
    pub half_open_max_calls: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { enabled: true, failure_threshold: 5, recovery_timeout_secs: 30, half_open_max_calls: 2 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BarcodeConfig {
    /// e.g. `https://world.openfoodfacts.org/api/v0/product/{code}.json`; unset keeps lookups local.
    #[serde(default)]
    pub remote_lookup_url: Option<String>,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for BarcodeConfig {
    fn default() -> Self {
        Self {
            remote_lookup_url: None,
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_ttl() -> u64 { 3600 }
fn default_cache_capacity() -> u64 { 10_000 }

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_true")]
    pub demo_data: bool,
}

impl Default for SeedConfig {
    fn default() -> Self { Self { demo_data: true } }
}

fn default_true() -> bool { true }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), apply env overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.apply_env_overrides();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Defaults plus env overrides, used when no config file is present.
    pub fn from_env() -> Result<Self> {
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Ok(url) = std::env::var("OCR_SERVICE_URL") {
            self.ocr.base_url = url;
        }
        if let Ok(key) = std::env::var("OCR_API_KEY") {
            self.ocr.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("BARCODE_LOOKUP_URL") {
            self.barcode.remote_lookup_url = Some(url);
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.ocr.validate()?;
        self.barcode.normalize_and_validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        if self.frontend_dir.trim().is_empty() {
            self.frontend_dir = default_frontend_dir();
        }
        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl OcrConfig {
    fn validate(&self) -> Result<()> {
        if !is_http_url(&self.base_url) {
            return Err(anyhow!("ocr.base_url must start with http:// or https://"));
        }
        if self.connect_timeout_secs == 0 || self.timeout_secs == 0 {
            return Err(anyhow!("ocr timeouts must be positive seconds"));
        }
        if self.retry.max_attempts == 0 {
            return Err(anyhow!("ocr.retry.max_attempts must be >= 1"));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(anyhow!("ocr.circuit_breaker.failure_threshold must be >= 1"));
        }
        Ok(())
    }
}

impl BarcodeConfig {
    fn normalize_and_validate(&mut self) -> Result<()> {
        if let Some(url) = &self.remote_lookup_url {
            if url.trim().is_empty() {
                self.remote_lookup_url = None;
            } else if !is_http_url(url) {
                return Err(anyhow!("barcode.remote_lookup_url must start with http:// or https://"));
            } else if !url.contains("{code}") {
                return Err(anyhow!("barcode.remote_lookup_url must contain a {{code}} placeholder"));
            }
        }
        if self.cache_capacity == 0 {
            self.cache_capacity = default_cache_capacity();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let mut cfg = parse("").unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.ocr.base_url, "http://127.0.0.1:8000");
        assert!(cfg.barcode.remote_lookup_url.is_none());
        assert!(cfg.seed.demo_data);
    }

    #[test]
    fn sections_are_read() {
        let mut cfg = parse(
            r#"
            [server]
            host = ""
            port = 8088
            worker_threads = 0

            [ocr]
            base_url = "https://ocr.internal"
            timeout_secs = 10

            [ocr.retry]
            enabled = false
            max_attempts = 1
            backoff_base_ms = 10
            backoff_max_ms = 10

            [barcode]
            remote_lookup_url = "https://world.openfoodfacts.org/api/v0/product/{code}.json"

            [logging]
            json = true
            "#,
        )
        .unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8088);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.ocr.timeout_secs, 10);
        assert!(!cfg.ocr.retry.enabled);
        assert!(cfg.logging.json);
        assert!(cfg.barcode.remote_lookup_url.is_some());
    }

    #[test]
    fn rejects_bad_urls() {
        let mut cfg = parse("[ocr]\nbase_url = \"ftp://nope\"\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = parse("[barcode]\nremote_lookup_url = \"https://example.com/lookup\"\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn blank_lookup_url_is_disabled() {
        let mut cfg = parse("[barcode]\nremote_lookup_url = \"  \"\n").unwrap();
        cfg.normalize_and_validate().unwrap();
        assert!(cfg.barcode.remote_lookup_url.is_none());
    }
}

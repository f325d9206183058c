//! Runtime configuration for the client core and the mock backend.
//! Resolution order: CLI flag, then environment variable, then default.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

pub fn parse_port_env(name: &str) -> Option<u16> {
    match env::var(name) {
        Ok(val) => val.parse::<u16>().ok(),
        Err(_) => None,
    }
}

pub fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    flag_value(args, flag).and_then(|v| v.parse::<u16>().ok())
}

pub fn parse_bool_env(name: &str) -> Option<bool> {
    match env::var(name) {
        Ok(v) => {
            let s = v.to_lowercase();
            match s.as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            }
        }
        Err(_) => None,
    }
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Value following `flag`, if any.
pub fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Settings for the dashboard client (request layer + local storage).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// One fixed timeout per call; expiry is a generic network failure.
    pub timeout: Duration,
    /// File backing the durable local key/value store.
    pub storage_path: PathBuf,
    /// Where locally rendered PDFs are written.
    pub report_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            storage_path: PathBuf::from(".schoolhub").join("local_storage.json"),
            report_dir: PathBuf::from(".schoolhub").join("reports"),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = env::var("SCHOOLHUB_API_URL") {
            if !url.trim().is_empty() { cfg.api_base_url = url.trim().trim_end_matches('/').to_string(); }
        }
        if let Some(secs) = env::var("SCHOOLHUB_HTTP_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok()) {
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Ok(p) = env::var("SCHOOLHUB_STORAGE") {
            if !p.trim().is_empty() { cfg.storage_path = PathBuf::from(p); }
        }
        if let Ok(p) = env::var("SCHOOLHUB_REPORT_DIR") {
            if !p.trim().is_empty() { cfg.report_dir = PathBuf::from(p); }
        }
        cfg
    }

    /// Environment first, then `--api-url` / `--storage` / `--report-dir` / `--timeout` flags on top.
    pub fn from_env_and_args(args: &[String]) -> Self {
        let mut cfg = Self::from_env();
        if let Some(url) = flag_value(args, "--api-url") { cfg.api_base_url = url.trim_end_matches('/').to_string(); }
        if let Some(p) = flag_value(args, "--storage") { cfg.storage_path = PathBuf::from(p); }
        if let Some(p) = flag_value(args, "--report-dir") { cfg.report_dir = PathBuf::from(p); }
        if let Some(secs) = flag_value(args, "--timeout").and_then(|s| s.parse::<u64>().ok()) {
            cfg.timeout = Duration::from_secs(secs);
        }
        cfg
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Settings for the mock backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Multiplier on every handler delay; 0 disables latency.
    pub latency_scale: f64,
    pub token_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_HTTP_PORT, latency_scale: 1.0, token_ttl_secs: DEFAULT_TOKEN_TTL_SECS }
    }
}

impl ServerConfig {
    pub fn from_env_and_args(args: &[String]) -> Self {
        let mut cfg = Self::default();
        let env_port = parse_port_env("SCHOOLHUB_HTTP_PORT");
        let env_latency = env::var("SCHOOLHUB_MOCK_LATENCY").ok().and_then(|s| parse_f64(&s));
        let env_no_latency = parse_bool_env("SCHOOLHUB_NO_LATENCY");
        let env_ttl = env::var("SCHOOLHUB_TOKEN_TTL_SECS").ok().and_then(|s| s.parse::<u64>().ok());

        // CLI arguments override environment
        let arg_port = parse_port_arg(args, "--http-port");
        let arg_latency = flag_value(args, "--latency").and_then(|s| parse_f64(&s));
        let arg_ttl = flag_value(args, "--token-ttl").and_then(|s| s.parse::<u64>().ok());

        cfg.port = arg_port.or(env_port).unwrap_or(DEFAULT_HTTP_PORT);
        cfg.latency_scale = arg_latency.or(env_latency).unwrap_or(1.0);
        if has_flag(args, "--no-latency") || env_no_latency == Some(true) {
            cfg.latency_scale = 0.0;
        }
        cfg.token_ttl_secs = arg_ttl.or(env_ttl).unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        cfg
    }

    /// Zero latency; what tests run with.
    pub fn instant() -> Self {
        Self { latency_scale: 0.0, ..Self::default() }
    }
}

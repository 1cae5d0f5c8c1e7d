//! Ingestion gateway configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration of the ingestion gateway.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port (`CLIENT_PORT`, default 8080).
    pub port: u16,
    /// Persistence root (`CLIENT_STORAGE_DIR`, default `./data/client`).
    pub storage_dir: PathBuf,
    /// Identity authority base URL (`IAM_BASE_URL`).
    pub iam_base_url: String,
    /// Clinical emitter base URL (`CLINICAL_BASE_URL`).
    pub clinical_base_url: String,
    /// Sliding-window capacity (`RATE_LIMIT_MAX`, default 60).
    pub rate_limit_max: usize,
    /// Sliding-window length in seconds (`RATE_LIMIT_WINDOW`, default 60).
    pub rate_limit_window_secs: u64,
    /// Forwarding timeout (`FORWARD_TIMEOUT_SECS`, default 10).
    pub forward_timeout: Duration,
    /// Log filter fallback (`RUST_LOG` wins).
    pub log_filter: String,
}

impl Config {
    /// Load from the environment.
    pub fn from_env() -> Result<Self, String> {
        let port = read_number("CLIENT_PORT", 8080u16)?;
        let storage_dir = env::var("CLIENT_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/client"));
        let iam_base_url =
            env::var("IAM_BASE_URL").unwrap_or_else(|_| "http://localhost:8081".to_string());
        let clinical_base_url =
            env::var("CLINICAL_BASE_URL").unwrap_or_else(|_| "http://localhost:8082".to_string());
        let rate_limit_max = read_number("RATE_LIMIT_MAX", 60usize)?;
        if rate_limit_max == 0 {
            return Err("RATE_LIMIT_MAX must be at least 1".to_string());
        }
        let rate_limit_window_secs = read_number("RATE_LIMIT_WINDOW", 60u64)?;
        if rate_limit_window_secs == 0 {
            return Err("RATE_LIMIT_WINDOW must be at least 1 second".to_string());
        }
        let forward_timeout = Duration::from_secs(read_number("FORWARD_TIMEOUT_SECS", 10u64)?);
        let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            port,
            storage_dir,
            iam_base_url,
            clinical_base_url,
            rate_limit_max,
            rate_limit_window_secs,
            forward_timeout,
            log_filter,
        })
    }

    /// JWKS endpoint of the identity authority.
    pub fn jwks_url(&self) -> String {
        format!("{}/jwks", self.iam_base_url.trim_end_matches('/'))
    }

    /// OIDC discovery URL advertised to the mobile client.
    pub fn iam_discovery_url(&self) -> String {
        format!(
            "{}/.well-known/openid-configuration",
            self.iam_base_url.trim_end_matches('/')
        )
    }
}

fn read_number<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| format!("{name} must be a number, got '{value}'")),
        Err(_) => Ok(default),
    }
}

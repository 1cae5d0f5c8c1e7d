//! Identity authority configuration from environment variables.
//!
//! Fail-fast: missing or malformed values abort startup with a clear
//! message.

use std::env;
use std::path::PathBuf;

/// Runtime configuration of the identity authority.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port (`IAM_PORT`, default 8081).
    pub port: u16,
    /// Persistence root (`IAM_STORAGE_DIR`, default `./data/iam`).
    pub storage_dir: PathBuf,
    /// Public base URL for the discovery document (`IAM_BASE_URL`,
    /// default derived from the port).
    pub base_url: String,
    /// Registered client identifier (`IAM_CLIENT_ID`, default
    /// `mobile-app`).
    pub client_id: String,
    /// Redirect-URI allowlist (`IAM_REDIRECT_URIS`, comma-separated,
    /// default `app://callback`).
    pub redirect_uris: Vec<String>,
    /// Log filter fallback (`RUST_LOG` wins).
    pub log_filter: String,
}

impl Config {
    /// Load from the environment.
    pub fn from_env() -> Result<Self, String> {
        let port = read_port("IAM_PORT", 8081)?;
        let storage_dir = env::var("IAM_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/iam"));
        let base_url =
            env::var("IAM_BASE_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));
        let client_id = env::var("IAM_CLIENT_ID").unwrap_or_else(|_| "mobile-app".to_string());
        let redirect_uris: Vec<String> = env::var("IAM_REDIRECT_URIS")
            .unwrap_or_else(|_| "app://callback".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if redirect_uris.is_empty() {
            return Err("IAM_REDIRECT_URIS must name at least one redirect URI".to_string());
        }
        let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            port,
            storage_dir,
            base_url,
            client_id,
            redirect_uris,
            log_filter,
        })
    }
}

fn read_port(name: &str, default: u16) -> Result<u16, String> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| format!("{name} must be a port number, got '{value}'")),
        Err(_) => Ok(default),
    }
}

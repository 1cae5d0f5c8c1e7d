//! Clinical emitter configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Runtime configuration of the clinical emitter.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port (`CLINICAL_PORT`, default 8082).
    pub port: u16,
    /// Persistence root (`CLINICAL_STORAGE_DIR`, default
    /// `./data/clinical`).
    pub storage_dir: PathBuf,
    /// Exchange directory for GDT files (`GDT_OUTPUT_PATH`, default
    /// `<storage>/gdt`).
    pub gdt_output_path: PathBuf,
    /// Sender identifier, GDT field 9106 (`GDT_SENDER_ID`).
    pub gdt_sender_id: String,
    /// Receiver identifier, GDT field 9103 (`GDT_RECEIVER_ID`).
    pub gdt_receiver_id: String,
    /// Log filter fallback (`RUST_LOG` wins).
    pub log_filter: String,
}

impl Config {
    /// Load from the environment.
    pub fn from_env() -> Result<Self, String> {
        let port = match env::var("CLINICAL_PORT") {
            Ok(value) => value
                .parse()
                .map_err(|_| format!("CLINICAL_PORT must be a port number, got '{value}'"))?,
            Err(_) => 8082,
        };
        let storage_dir = env::var("CLINICAL_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/clinical"));
        let gdt_output_path = env::var("GDT_OUTPUT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| storage_dir.join("gdt"));
        let gdt_sender_id = env::var("GDT_SENDER_ID").unwrap_or_else(|_| "VITALINK".to_string());
        let gdt_receiver_id = env::var("GDT_RECEIVER_ID").unwrap_or_else(|_| "PRAXIS".to_string());
        let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            port,
            storage_dir,
            gdt_output_path,
            gdt_sender_id,
            gdt_receiver_id,
            log_filter,
        })
    }
}

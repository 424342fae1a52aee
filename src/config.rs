use std::time::Duration;

use anyhow::{Context, Result};

use crate::constants::{
    DEFAULT_CATALOG_URL, DEFAULT_DATASET_MARKER, DEFAULT_LISTEN_ADDR,
    DEFAULT_REQUEST_TIMEOUT_SECONDS,
};

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: String,
    pub catalog_url: String,
    pub dataset_marker: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = env_string("RISK_LISTEN_ADDR", DEFAULT_LISTEN_ADDR);
        let catalog_url = env_string("RISK_CATALOG_URL", DEFAULT_CATALOG_URL);
        let dataset_marker = env_string("RISK_DATASET_MARKER", DEFAULT_DATASET_MARKER);
        let request_timeout = Duration::from_secs(env_u64(
            "RISK_REQUEST_TIMEOUT_SECONDS",
            DEFAULT_REQUEST_TIMEOUT_SECONDS,
        )?);

        Ok(Self {
            listen_addr,
            catalog_url,
            dataset_marker,
            request_timeout,
        })
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Failed to parse {}={} as u64", name, value)),
        Err(_) => Ok(default),
    }
}

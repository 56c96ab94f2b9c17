//! Process configuration, read once at startup.

use std::net::SocketAddr;

use anyhow::{Context, Result};

use crate::db::DbConfig;

/// Settings for one `marquee-api` process.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,
    /// Dev mode applies migrations on boot.
    pub dev_mode: bool,
    pub database: DbConfig,
}

impl Config {
    /// Reads the `MARQUEE_*` variables, with defaults suited to local work.
    pub fn from_env() -> Result<Self> {
        let raw_addr = std::env::var("MARQUEE_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let listen_addr = raw_addr
            .parse()
            .with_context(|| format!("invalid MARQUEE_LISTEN_ADDR '{raw_addr}'"))?;

        Ok(Self {
            listen_addr,
            log_level: std::env::var("MARQUEE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            dev_mode: std::env::var("MARQUEE_DEV")
                .is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
            database: DbConfig::from_env(),
        })
    }
}

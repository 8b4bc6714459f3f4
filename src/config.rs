// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::id::IdMatch;

pub const ENV_CONFIG_PATH: &str = "CATALOG_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/catalog.toml";
pub const DEFAULT_BASE_URL: &str = "https://fakestoreapi.com";

const ENV_BASE_URL: &str = "CATALOG_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "CATALOG_TIMEOUT_SECS";
const ENV_ID_MATCH: &str = "CATALOG_ID_MATCH";
const ENV_BIND: &str = "CATALOG_BIND";
const ENV_METRICS: &str = "CATALOG_METRICS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Root of the remote catalog API (no trailing `/products`).
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub id_match: IdMatch,
    pub bind_addr: String,
    /// Expose `/metrics` (Prometheus).
    pub metrics: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 10,
            connect_timeout_secs: 4,
            id_match: IdMatch::Lenient,
            bind_addr: "127.0.0.1:8080".to_string(),
            metrics: false,
        }
    }
}

/// Load config from an explicit TOML file; missing keys take defaults.
pub fn load_config_from(path: &Path) -> Result<CatalogConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading catalog config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Resolve config:
/// 1) $CATALOG_CONFIG_PATH (must exist)
/// 2) config/catalog.toml
/// 3) built-in defaults
///
/// then apply `CATALOG_*` env overrides.
pub fn load_config_default() -> Result<CatalogConfig> {
    let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        load_config_from(&pb)?
    } else {
        let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
        if fallback.exists() {
            load_config_from(&fallback)?
        } else {
            CatalogConfig::default()
        }
    };
    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

fn apply_env_overrides(cfg: &mut CatalogConfig) -> Result<()> {
    if let Some(v) = env_nonempty(ENV_BASE_URL) {
        cfg.base_url = v;
    }
    if let Some(v) = env_nonempty(ENV_TIMEOUT_SECS) {
        cfg.request_timeout_secs = v
            .parse::<u64>()
            .with_context(|| format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds"))?;
    }
    if let Some(v) = env_nonempty(ENV_ID_MATCH) {
        cfg.id_match = v.parse::<IdMatch>().map_err(|e| anyhow!(e))?;
    }
    if let Some(v) = env_nonempty(ENV_BIND) {
        cfg.bind_addr = v;
    }
    if let Some(v) = env_nonempty(ENV_METRICS) {
        cfg.metrics = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
    }
    Ok(())
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

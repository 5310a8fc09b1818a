use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Where the sheet export lives and how to fetch it
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default = "default_url")]
    pub url: String,

    /// Query key carrying the cache-busting timestamp.
    #[serde(default = "default_cache_param")]
    pub cache_param: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Periodic refresh configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

const SHEET_ID: &str = "1O8h9DwB21IL4jOQaDQrqO4-4eAmvdStelSNC4Y-ZShs";

fn default_url() -> String {
    format!("https://docs.google.com/spreadsheets/d/{SHEET_ID}/gviz/tq?tqx=out:csv")
}
fn default_cache_param() -> String {
    "t".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_base_ms() -> u64 {
    250
}
fn default_user_agent() -> String {
    "hotel-dash/0.1 (read-only hotel group dashboard)".to_string()
}
fn default_interval_secs() -> u64 {
    60
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            cache_param: default_cache_param(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("HOTELDASH").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|e| {
            tracing::warn!("Invalid configuration ({}), using defaults", e);
            AppConfig::default()
        });
        Ok(app_cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_csv_export() {
        let cfg = AppConfig::default();
        assert!(cfg.source.url.contains("tqx=out:csv"));
        assert_eq!(cfg.source.cache_param, "t");
        assert_eq!(cfg.refresh.interval_secs, 60);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[source]\nurl = \"http://localhost/sheet.csv\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.source.url, "http://localhost/sheet.csv");
        assert_eq!(cfg.source.max_retries, 2);
        assert_eq!(cfg.refresh.interval_secs, 60);
    }
}

//! Environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::schema::QueryTiming;
use crate::{CatalogError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogConfig {
    pub log_filter: String,
    pub log_json: bool,
    pub query_timing: bool,
    pub slow_query_ms: u64,
    pub seed_file: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { log_filter: "info".into(), log_json: false, query_timing: true, slow_query_ms: 100, seed_file: None }
    }
}

impl CatalogConfig {
    /// Reads `CATALOG_*` variables, loading `.env` first when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            log_filter: get("CATALOG_LOG").or_else(|| get("RUST_LOG")).unwrap_or(defaults.log_filter),
            log_json: get("CATALOG_LOG_JSON").map(|v| parse_bool("CATALOG_LOG_JSON", &v)).transpose()?.unwrap_or(defaults.log_json),
            query_timing: get("CATALOG_QUERY_TIMING")
                .map(|v| parse_bool("CATALOG_QUERY_TIMING", &v))
                .transpose()?
                .unwrap_or(defaults.query_timing),
            slow_query_ms: get("CATALOG_SLOW_QUERY_MS")
                .map(|v| v.trim().parse::<u64>().map_err(|e| CatalogError::Config(format!("CATALOG_SLOW_QUERY_MS: {e}"))))
                .transpose()?
                .unwrap_or(defaults.slow_query_ms),
            seed_file: get("CATALOG_SEED_FILE").filter(|v| !v.trim().is_empty()).map(PathBuf::from),
        })
    }

    pub fn query_timing(&self) -> QueryTiming {
        QueryTiming { enabled: self.query_timing, slow_threshold: Duration::from_millis(self.slow_query_ms) }
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CatalogError::Config(format!("{key}: expected a boolean, got `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CatalogConfig::default());
        assert_eq!(config.query_timing(), QueryTiming::default());
    }

    #[test]
    fn test_overrides() {
        let config = CatalogConfig::from_lookup(lookup(&[
            ("RUST_LOG", "warn"),
            ("CATALOG_LOG", "product_catalog=debug"),
            ("CATALOG_LOG_JSON", "yes"),
            ("CATALOG_QUERY_TIMING", "off"),
            ("CATALOG_SLOW_QUERY_MS", " 250 "),
            ("CATALOG_SEED_FILE", "seed/products.json"),
        ]))
        .unwrap();
        assert_eq!(config.log_filter, "product_catalog=debug");
        assert!(config.log_json);
        assert!(!config.query_timing().enabled);
        assert_eq!(config.query_timing().slow_threshold, Duration::from_millis(250));
        assert_eq!(config.seed_file, Some(PathBuf::from("seed/products.json")));
    }

    #[test]
    fn test_rust_log_fallback() {
        let config = CatalogConfig::from_lookup(lookup(&[("RUST_LOG", "debug")])).unwrap();
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_invalid_values() {
        let err = CatalogConfig::from_lookup(lookup(&[("CATALOG_LOG_JSON", "maybe")])).unwrap_err();
        assert!(matches!(err, CatalogError::Config(ref msg) if msg.contains("CATALOG_LOG_JSON")));
        assert!(CatalogConfig::from_lookup(lookup(&[("CATALOG_SLOW_QUERY_MS", "-1")])).is_err());
        assert!(!err.is_validation());
    }
}

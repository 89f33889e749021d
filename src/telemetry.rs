//! Tracing/logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::CatalogConfig;

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(config: &CatalogConfig) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json().with_target(false)).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    if installed.is_err() {
        tracing::debug!("global subscriber already installed; keeping it");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_keeps_first_subscriber() {
        let config = CatalogConfig { log_json: true, ..CatalogConfig::default() };
        init(&config);
        init(&CatalogConfig::default());
        tracing::info!("still logging");
    }
}

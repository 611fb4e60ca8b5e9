//! # Configuration Module
//!
//! Application configuration loaded from YAML. Every field has a default, so
//! an empty document (or no file at all) yields a working configuration.
//!
//! ## YAML Format
//!
//! ```yaml
//! routes:
//!   - path: /dashboard
//!     label: Home
//!   - path: /dashboard/records
//!     label: Records
//! notifications:
//!   short_ms: 3000
//!   error_ms: 2000
//! recent_entries_limit: 5
//! default_currency: CAD
//! log_level: info
//! service:
//!   endpoint: https://example.invalid
//! ```

use anyhow::{Context, Result};
use log::{debug, LevelFilter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::state::navigation::PageRoutes;
use shared::DEFAULT_CURRENCY;

/// Errors produced while reading or checking the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("at least one route must be configured")]
    NoRoutes,
    #[error("route '{0}' is configured more than once")]
    DuplicateRoute(String),
    #[error("route '{0}' must start with '/'")]
    InvalidRoute(String),
    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),
}

/// One top-level dashboard destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub path: String,
    pub label: String,
}

impl RouteConfig {
    fn new(path: &str, label: &str) -> Self {
        Self {
            path: path.to_string(),
            label: label.to_string(),
        }
    }
}

/// Auto-clear durations for flashed messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationDurations {
    /// Success and info messages
    pub short_ms: u64,
    /// Error messages raised by editors
    pub error_ms: u64,
}

impl NotificationDurations {
    pub fn short(&self) -> Duration {
        Duration::from_millis(self.short_ms)
    }

    pub fn error(&self) -> Duration {
        Duration::from_millis(self.error_ms)
    }
}

impl Default for NotificationDurations {
    fn default() -> Self {
        Self {
            short_ms: 3000,
            error_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Ordered dashboard destinations; the position is the page index
    pub routes: Vec<RouteConfig>,
    pub notifications: NotificationDurations,
    pub recent_entries_limit: usize,
    pub default_currency: String,
    pub log_level: String,
    /// Opaque connection parameters for the data service collaborator
    pub service: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            routes: vec![
                RouteConfig::new("/dashboard", "Home"),
                RouteConfig::new("/dashboard/account", "Account"),
                RouteConfig::new("/dashboard/records", "Records"),
                RouteConfig::new("/dashboard/analytics", "Analytics"),
            ],
            notifications: NotificationDurations::default(),
            recent_entries_limit: 5,
            default_currency: DEFAULT_CURRENCY.to_string(),
            log_level: "info".to_string(),
            service: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = if yaml.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, falling back to defaults when it does not exist
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(AppConfig::default());
        }

        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_yaml_str(&yaml)
            .with_context(|| format!("Failed to load config file {:?}", path))?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.routes.is_empty() {
            return Err(ConfigError::NoRoutes);
        }

        let mut seen = HashSet::new();
        for route in &self.routes {
            if !route.path.starts_with('/') {
                return Err(ConfigError::InvalidRoute(route.path.clone()));
            }
            if !seen.insert(route.path.as_str()) {
                return Err(ConfigError::DuplicateRoute(route.path.clone()));
            }
        }

        self.log_level_filter()?;
        Ok(())
    }

    /// The static path to page index lookup table
    pub fn page_routes(&self) -> PageRoutes {
        PageRoutes::new(self.routes.iter().map(|route| route.path.clone()).collect())
    }

    pub fn log_level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.routes.len(), 4);
        assert_eq!(config.notifications.short(), Duration::from_millis(3000));
        assert_eq!(config.log_level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(AppConfig::from_yaml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = AppConfig::from_yaml_str(
            "recent_entries_limit: 10\nservice:\n  endpoint: https://example.invalid\n",
        )
        .unwrap();
        assert_eq!(config.recent_entries_limit, 10);
        assert_eq!(config.routes, AppConfig::default().routes);
        assert_eq!(config.service["endpoint"], "https://example.invalid");
    }

    #[test]
    fn test_route_order_defines_page_index() {
        let config = AppConfig::from_yaml_str(
            "routes:\n  - { path: /a, label: A }\n  - { path: /b, label: B }\n",
        )
        .unwrap();
        let routes = config.page_routes();
        assert_eq!(routes.index_of("/b"), Some(1));
        assert_eq!(routes.path_of(0), Some("/a"));
    }

    #[test]
    fn test_invalid_routes_rejected() {
        assert!(matches!(
            AppConfig::from_yaml_str("routes: []"),
            Err(ConfigError::NoRoutes)
        ));
        assert!(matches!(
            AppConfig::from_yaml_str("routes:\n  - { path: /a, label: A }\n  - { path: /a, label: B }\n"),
            Err(ConfigError::DuplicateRoute(path)) if path == "/a"
        ));
        assert!(matches!(
            AppConfig::from_yaml_str("routes:\n  - { path: a, label: A }\n"),
            Err(ConfigError::InvalidRoute(_))
        ));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        assert!(matches!(
            AppConfig::from_yaml_str("log_level: loud"),
            Err(ConfigError::InvalidLogLevel(level)) if level == "loud"
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::from_yaml_file("/nonexistent/finance-tracker.yaml").unwrap();
        assert_eq!(config, AppConfig::default());
    }
}

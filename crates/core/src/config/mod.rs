//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SITESCOUT_*)
//! 2. Legacy deployment variables (GOOGLE_PAGESPEED_API_KEY, CACHE_EXPIRY_DAYS, PORT)
//! 3. TOML config file (if SITESCOUT_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Legacy variable names and the fields they feed.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("GOOGLE_PAGESPEED_API_KEY", "pagespeed_api_key"),
    ("CACHE_EXPIRY_DAYS", "cache_ttl_days"),
    ("PORT", "port"),
];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SITESCOUT_*)
/// 2. Legacy variables (GOOGLE_PAGESPEED_API_KEY, CACHE_EXPIRY_DAYS, PORT)
/// 3. TOML config file (if SITESCOUT_CONFIG_FILE set)
/// 4. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// PageSpeed Insights API key.
    ///
    /// Set via SITESCOUT_PAGESPEED_API_KEY or GOOGLE_PAGESPEED_API_KEY.
    /// When absent, performance and mobile scores fall back to neutral defaults.
    #[serde(default)]
    pub pagespeed_api_key: Option<String>,

    /// PageSpeed endpoint.
    #[serde(default = "default_pagespeed_url")]
    pub pagespeed_url: String,

    /// PageSpeed request timeout in milliseconds.
    #[serde(default = "default_pagespeed_timeout_ms")]
    pub pagespeed_timeout_ms: u64,

    /// Direct page fetch timeout in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Timeout for each contact-extraction fetch in milliseconds.
    #[serde(default = "default_contact_timeout_ms")]
    pub contact_timeout_ms: u64,

    /// User-Agent string for page fetches.
    ///
    /// Set via SITESCOUT_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum page body size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Path to SQLite cache database.
    ///
    /// Set via SITESCOUT_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Days an audit stays fresh in the cache.
    ///
    /// Set via SITESCOUT_CACHE_TTL_DAYS or CACHE_EXPIRY_DAYS.
    #[serde(default = "default_cache_ttl_days")]
    pub cache_ttl_days: i64,

    /// Pause after each live audit in a stream, in milliseconds.
    #[serde(default = "default_audit_delay_ms")]
    pub audit_delay_ms: u64,

    /// Whether live audits also scrape contact details.
    #[serde(default)]
    pub contact_extraction: bool,

    /// Interface the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server listens on.
    ///
    /// Set via SITESCOUT_PORT or PORT.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_pagespeed_url() -> String {
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed".into()
}

fn default_pagespeed_timeout_ms() -> u64 {
    60_000
}

fn default_fetch_timeout_ms() -> u64 {
    15_000
}

fn default_contact_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; SiteScout/1.0; +https://sitescout.dev)".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./sitescout-cache.sqlite")
}

fn default_cache_ttl_days() -> i64 {
    7
}

fn default_audit_delay_ms() -> u64 {
    1_200
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3001
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pagespeed_api_key: None,
            pagespeed_url: default_pagespeed_url(),
            pagespeed_timeout_ms: default_pagespeed_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            contact_timeout_ms: default_contact_timeout_ms(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            db_path: default_db_path(),
            cache_ttl_days: default_cache_ttl_days(),
            audit_delay_ms: default_audit_delay_ms(),
            contact_extraction: false,
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn pagespeed_timeout(&self) -> Duration {
        Duration::from_millis(self.pagespeed_timeout_ms)
    }

    pub fn contact_timeout(&self) -> Duration {
        Duration::from_millis(self.contact_timeout_ms)
    }

    pub fn audit_delay(&self) -> Duration {
        Duration::from_millis(self.audit_delay_ms)
    }

    /// Cache TTL as a chrono duration for timestamp arithmetic.
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.cache_ttl_days)
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment()
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The layered provider stack, without extraction or validation.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SITESCOUT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        for &(legacy, field) in LEGACY_ENV {
            figment = figment.merge(Env::raw().only(&[legacy]).map(move |_| field.into()));
        }

        figment.merge(
            Env::prefixed("SITESCOUT_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Fetch the PageSpeed key for callers that cannot work without it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_pagespeed_api_key(&self) -> Result<&str, ConfigError> {
        self.pagespeed_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "pagespeed_api_key".into(),
                hint: "Set SITESCOUT_PAGESPEED_API_KEY or GOOGLE_PAGESPEED_API_KEY".into(),
            })
    }
}

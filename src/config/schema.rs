//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::content::HomeSettings;
use crate::resolver::rules::{default_specs, RuleSpec};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HeadlessConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Site identity and reading settings.
    pub site: SiteConfig,

    /// Rewrite rule table.
    pub rewrite: RewriteConfig,

    /// Content seed location.
    pub content: ContentConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl HeadlessConfig {
    /// Configured rules, or the default table when none are listed.
    pub fn rule_specs(&self) -> Vec<RuleSpec> {
        if self.rewrite.rules.is_empty() {
            default_specs(&self.site.permalink_structure, &self.site.taxonomies)
        } else {
            self.rewrite.rules.clone()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// What the home page shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowOnFront {
    #[default]
    Posts,
    Page,
}

/// Site identity and reading settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Canonical root URL of the front-end site.
    pub base_url: String,

    /// Post permalink structure (`/%postname%/`, `/%year%/%monthnum%/%postname%/`, ...).
    pub permalink_structure: String,

    /// Latest posts or a static page on the front page.
    pub show_on_front: ShowOnFront,

    /// Page id shown on the front page when `show_on_front = "page"`.
    pub page_on_front: Option<u64>,

    /// Default page size for listings.
    pub posts_per_page: u32,

    /// Custom taxonomies that get archive rules in the default table.
    pub taxonomies: Vec<String>,
}

impl SiteConfig {
    pub fn home_settings(&self) -> HomeSettings {
        match (self.show_on_front, self.page_on_front) {
            (ShowOnFront::Page, Some(id)) => HomeSettings::StaticPage(id),
            _ => HomeSettings::LatestPosts,
        }
    }

    /// Id of the static front page, if one is in use.
    pub fn front_page_id(&self) -> Option<u64> {
        match self.home_settings() {
            HomeSettings::StaticPage(id) => Some(id),
            HomeSettings::LatestPosts => None,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            permalink_structure: "/%postname%/".to_string(),
            show_on_front: ShowOnFront::Posts,
            page_on_front: None,
            posts_per_page: 10,
            taxonomies: Vec::new(),
        }
    }
}

/// Rewrite rule table. Empty means "use the defaults".
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    pub rules: Vec<RuleSpec>,
}

/// Content seed configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Path to the JSON seed file.
    pub seed_path: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            seed_path: "data/content.json".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

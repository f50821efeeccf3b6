//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every rewrite rule and report all failures
//! - Validate value ranges (page size, addresses)
//! - Check referential settings (static front page needs a page id)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HeadlessConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{HeadlessConfig, ShowOnFront};
use crate::content::store::MAX_PER_PAGE;
use crate::resolver::rules::{check_permalink_structure, PermalinkError, RuleError, RuleTable};
use crate::resolver::SiteBase;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("site.base_url '{0}' is not an absolute http(s) URL")]
    BaseUrl(String),

    #[error("{0}")]
    Rule(#[from] RuleError),

    #[error("site.permalink_structure: {0}")]
    Permalink(#[from] PermalinkError),

    #[error("site.posts_per_page must be between 1 and {max}, got {value}")]
    PostsPerPage { value: u32, max: u32 },

    #[error("site.show_on_front is 'page' but site.page_on_front is not set")]
    MissingFrontPage,

    #[error("site.taxonomies entry '{0}' must be a non-empty slug")]
    Taxonomy(String),

    #[error("{field} '{value}' is not a socket address")]
    Address { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &HeadlessConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if SiteBase::parse(&config.site.base_url).is_err() {
        errors.push(ValidationError::BaseUrl(config.site.base_url.clone()));
    }

    if let Err(e) = check_permalink_structure(&config.site.permalink_structure) {
        errors.push(e.into());
    }

    if let Err(rule_errors) = RuleTable::compile(&config.rule_specs()) {
        errors.extend(rule_errors.into_iter().map(ValidationError::from));
    }

    let per_page = config.site.posts_per_page;
    if per_page == 0 || per_page > MAX_PER_PAGE {
        errors.push(ValidationError::PostsPerPage {
            value: per_page,
            max: MAX_PER_PAGE,
        });
    }

    if config.site.show_on_front == ShowOnFront::Page && config.site.page_on_front.is_none() {
        errors.push(ValidationError::MissingFrontPage);
    }

    for taxonomy in &config.site.taxonomies {
        let valid = !taxonomy.is_empty()
            && taxonomy
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !valid {
            errors.push(ValidationError::Taxonomy(taxonomy.clone()));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled && config.observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::HeadlessConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::resolver::{Resolver, RuleTable, SiteBase};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<HeadlessConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: HeadlessConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Compile the resolver (site base + rule table) a config describes.
pub fn build_resolver(config: &HeadlessConfig) -> Result<Resolver, ConfigError> {
    let site = SiteBase::parse(&config.site.base_url)
        .map_err(|_| ConfigError::Validation(vec![ValidationError::BaseUrl(config.site.base_url.clone())]))?;
    let rules = RuleTable::compile(&config.rule_specs())
        .map_err(|errors| ConfigError::Validation(errors.into_iter().map(ValidationError::from).collect()))?;
    Ok(Resolver::new(site, rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[site]\nbase_url = \"https://example.com/blog\"\ntaxonomies = [\"genre\"]").unwrap();

        let config = load_config(file.path()).unwrap();
        let resolver = build_resolver(&config).unwrap();
        assert_eq!(resolver.site().base_path(), "/blog");
        let d = resolver.resolve("/blog/genre/jazz/").unwrap();
        assert_eq!(d.text("term"), Some("jazz"));
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(load_config(Path::new("/definitely/missing.toml")), Err(ConfigError::Io(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[site\nbase_url = 1").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[site]\nposts_per_page = 0").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("posts_per_page"));
    }
}

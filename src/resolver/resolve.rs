//! URL → query descriptor resolution.

use crate::resolver::descriptor::QueryDescriptor;
use crate::resolver::normalize::{ResolveError, SiteBase};
use crate::resolver::rules::RuleTable;

/// Resolve `url` against a site base and an ordered rule table.
///
/// Pure: no I/O and no shared state. Cross-site or malformed input comes
/// back as [`ResolveError::InvalidUrl`].
pub fn resolve(url: &str, site_base_url: &str, rules: &RuleTable) -> Result<QueryDescriptor, ResolveError> {
    let site = SiteBase::parse(site_base_url)?;
    resolve_path(&site.normalize(url)?, rules)
}

fn resolve_path(path: &str, rules: &RuleTable) -> Result<QueryDescriptor, ResolveError> {
    if path.is_empty() {
        return Ok(QueryDescriptor::front_page());
    }
    match rules.lookup(path) {
        Some((index, descriptor)) => {
            tracing::trace!(path = %path, rule = index, kind = %descriptor.kind, "Rewrite rule matched");
            Ok(descriptor)
        }
        None => Ok(QueryDescriptor::not_found()),
    }
}

/// A site base and rule table bundled for repeated resolution.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Resolver {
    site: SiteBase,
    rules: RuleTable,
}

impl Resolver {
    pub fn new(site: SiteBase, rules: RuleTable) -> Self {
        Self { site, rules }
    }

    pub fn site(&self) -> &SiteBase {
        &self.site
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn resolve(&self, url: &str) -> Result<QueryDescriptor, ResolveError> {
        resolve_path(&self.site.normalize(url)?, &self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::descriptor::QueryKind;
    use crate::resolver::rules::RuleSpec;

    #[test]
    fn test_first_match_wins() {
        let rules = RuleTable::compile(&[
            RuleSpec::new("/([^/]+)/?", QueryKind::Author, "author=$matches[1]"),
            RuleSpec::new("/([^/]+)/?", QueryKind::Single, "slug=$matches[1]"),
        ])
        .unwrap();
        let d = resolve("/jane", "https://example.com", &rules).unwrap();
        assert_eq!(d.kind, QueryKind::Author);
        assert_eq!(d.text("author"), Some("jane"));
        assert!(d.param("slug").is_none());
    }

    #[test]
    fn test_empty_table_yields_not_found_except_front_page() {
        let rules = RuleTable::compile(&[]).unwrap();
        assert_eq!(resolve("/x", "https://example.com", &rules).unwrap().kind, QueryKind::NotFound);
        assert_eq!(resolve("/", "https://example.com", &rules).unwrap().kind, QueryKind::FrontPage);
    }

    #[test]
    fn test_invalid_base_is_reported() {
        let rules = RuleTable::compile(&[]).unwrap();
        assert!(matches!(resolve("/", "nope", &rules), Err(ResolveError::InvalidBase(_))));
    }

    #[test]
    fn test_resolver_matches_free_function() {
        let rules = RuleTable::defaults("/%postname%/", &[]);
        let resolver = Resolver::new(SiteBase::parse("https://example.com/blog").unwrap(), rules.clone());
        for url in ["/blog/hello-world/", "https://example.com/blog/tag/rust", "2021/09"] {
            assert_eq!(
                resolver.resolve(url).unwrap(),
                resolve(url, "https://example.com/blog", &rules).unwrap()
            );
        }
    }
}

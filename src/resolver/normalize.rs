//! URL normalization against the site base.
//!
//! Turns arbitrary client input into the routing path the rewrite rules
//! match on: site-relative, no duplicate slashes, no trailing slash, no
//! query string or fragment. The front page normalizes to the empty path.

use thiserror::Error;
use url::Url;

/// Errors produced while resolving a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Malformed input, or input pointing at another site.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The configured site base is not an absolute http(s) URL.
    #[error("invalid site base url: {0}")]
    InvalidBase(String),
}

/// A parsed site base URL (scheme, host, port and base path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteBase {
    url: Url,
    /// Base path without trailing slash; empty for a site at the host root.
    base_path: String,
}

impl SiteBase {
    pub fn parse(base: &str) -> Result<Self, ResolveError> {
        let mut url = Url::parse(base.trim()).map_err(|_| ResolveError::InvalidBase(base.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ResolveError::InvalidBase(base.to_string()));
        }
        let base_path = collapse_slashes(url.path()).trim_end_matches('/').to_string();
        url.set_path(&format!("{}/", base_path));
        url.set_query(None);
        url.set_fragment(None);
        Ok(Self { url, base_path })
    }

    /// The base URL with a trailing slash, e.g. `https://example.com/blog/`.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Absolute URL for a site-relative routing path.
    pub fn absolute(&self, path: &str) -> String {
        let origin = self.url.origin().ascii_serialization();
        format!("{}{}{}", origin, self.base_path, path)
    }

    /// Normalize `input` into a routing path.
    ///
    /// Returns `""` for the front page and `/segment/...` otherwise.
    pub fn normalize(&self, input: &str) -> Result<String, ResolveError> {
        let input = input.trim();
        let parsed = match Url::parse(input) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .url
                .join(input)
                .map_err(|_| ResolveError::InvalidUrl(input.to_string()))?,
            Err(_) => return Err(ResolveError::InvalidUrl(input.to_string())),
        };

        if parsed.cannot_be_a_base()
            || parsed.scheme() != self.url.scheme()
            || parsed.host_str() != self.url.host_str()
            || parsed.port_or_known_default() != self.url.port_or_known_default()
        {
            return Err(ResolveError::InvalidUrl(input.to_string()));
        }

        let path = collapse_slashes(parsed.path());
        let rest = if self.base_path.is_empty() {
            path.as_str()
        } else if path == self.base_path {
            ""
        } else {
            path.strip_prefix(&self.base_path)
                .filter(|rest| rest.starts_with('/'))
                .ok_or_else(|| ResolveError::InvalidUrl(input.to_string()))?
        };

        Ok(rest.strip_suffix('/').unwrap_or(rest).to_string())
    }
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteBase {
        SiteBase::parse("https://example.com").unwrap()
    }

    #[test]
    fn test_front_page_forms() {
        let site = site();
        for input in ["", "/", "https://example.com", "https://example.com/", "/?page=2", "/#top"] {
            assert_eq!(site.normalize(input).unwrap(), "", "input {:?}", input);
        }
    }

    #[test]
    fn test_strips_query_fragment_and_trailing_slash() {
        let site = site();
        assert_eq!(site.normalize("/hello-world/?utm=x#top").unwrap(), "/hello-world");
        assert_eq!(site.normalize("hello-world").unwrap(), "/hello-world");
        assert_eq!(site.normalize("/a//b///c/").unwrap(), "/a/b/c");
        assert_eq!(site.normalize("/a/../b/").unwrap(), "/b");
    }

    #[test]
    fn test_rejects_other_sites() {
        let site = site();
        assert!(matches!(site.normalize("https://evil.com/x"), Err(ResolveError::InvalidUrl(_))));
        assert!(matches!(site.normalize("//evil.com/x"), Err(ResolveError::InvalidUrl(_))));
        assert!(matches!(site.normalize("http://example.com/x"), Err(ResolveError::InvalidUrl(_))));
        assert!(matches!(site.normalize("https://example.com:8443/x"), Err(ResolveError::InvalidUrl(_))));
        assert!(matches!(site.normalize("mailto:jane@example.com"), Err(ResolveError::InvalidUrl(_))));
    }

    #[test]
    fn test_host_is_case_insensitive() {
        assert_eq!(site().normalize("https://EXAMPLE.com/x/").unwrap(), "/x");
    }

    #[test]
    fn test_base_path_is_stripped() {
        let site = SiteBase::parse("https://example.com/blog/").unwrap();
        assert_eq!(site.base_path(), "/blog");
        assert_eq!(site.normalize("https://example.com/blog").unwrap(), "");
        assert_eq!(site.normalize("https://example.com/blog/hello/").unwrap(), "/hello");
        assert_eq!(site.normalize("hello").unwrap(), "/hello");
        assert_eq!(site.normalize("/blog/hello").unwrap(), "/hello");
        assert!(site.normalize("/shop/hello").is_err());
        assert!(site.normalize("/blogroll").is_err());
        assert_eq!(site.absolute("/hello/"), "https://example.com/blog/hello/");
    }

    #[test]
    fn test_invalid_base() {
        assert!(SiteBase::parse("not a url").is_err());
        assert!(SiteBase::parse("ftp://example.com").is_err());
    }
}

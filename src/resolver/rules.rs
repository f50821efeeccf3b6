//! Rewrite rules: compiled (pattern, query template) pairs.
//!
//! # Template syntax
//! ```text
//! category_name=$matches[1]
//! taxonomy=genre&term=$matches[1]
//! ```
//! Each `key=value` pair either references a capture group
//! (`$matches[N]`, 1-based) or is a literal.
//!
//! # Design Decisions
//! - Patterns are always wrapped as `^(?:...)$`, so a rule matches the
//!   whole routing path or not at all
//! - Templates are parsed once at compile time; capture indices are
//!   checked against the pattern's group count
//! - Rules carry their descriptor kind explicitly

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::descriptor::{ParamValue, QueryDescriptor, QueryKind};

/// Uncompiled rule as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleSpec {
    /// Regular expression over the routing path.
    pub pattern: String,

    /// Descriptor kind produced on match (`single`, `archive:tag`, ...).
    pub kind: String,

    /// Query template, e.g. `tag=$matches[1]`.
    #[serde(default)]
    pub query: String,
}

impl RuleSpec {
    pub fn new(pattern: impl Into<String>, kind: QueryKind, query: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            kind: kind.as_str().to_string(),
            query: query.into(),
        }
    }
}

/// Errors raised while compiling a rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("rule '{pattern}': invalid pattern: {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("rule '{pattern}': {source}")]
    Kind {
        pattern: String,
        source: crate::resolver::descriptor::UnknownKind,
    },

    #[error("rule '{pattern}': kind 'not_found' cannot be produced by a rule")]
    NotFoundKind { pattern: String },

    #[error("rule '{pattern}': malformed template segment '{segment}'")]
    Template { pattern: String, segment: String },

    #[error("rule '{pattern}': template references $matches[{index}] but pattern has {groups} group(s)")]
    CaptureOutOfRange {
        pattern: String,
        index: usize,
        groups: usize,
    },
}

/// Right-hand side of a template pair.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateValue {
    Capture(usize),
    Literal(String),
}

/// A compiled rewrite rule.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    spec: RuleSpec,
    regex: Regex,
    kind: QueryKind,
    template: Vec<(String, TemplateValue)>,
}

impl RewriteRule {
    pub fn compile(spec: RuleSpec) -> Result<Self, RuleError> {
        let regex = Regex::new(&format!("^(?:{})$", spec.pattern)).map_err(|e| RuleError::Pattern {
            pattern: spec.pattern.clone(),
            reason: e.to_string(),
        })?;
        let kind: QueryKind = spec.kind.parse().map_err(|source| RuleError::Kind {
            pattern: spec.pattern.clone(),
            source,
        })?;
        if kind == QueryKind::NotFound {
            return Err(RuleError::NotFoundKind {
                pattern: spec.pattern.clone(),
            });
        }

        let groups = regex.captures_len() - 1;
        let template = parse_template(&spec.pattern, &spec.query, groups)?;

        Ok(Self {
            spec,
            regex,
            kind,
            template,
        })
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn spec(&self) -> &RuleSpec {
        &self.spec
    }

    /// Match the full routing path; on success build the descriptor.
    pub fn apply(&self, path: &str) -> Option<QueryDescriptor> {
        let caps = self.regex.captures(path)?;
        let mut descriptor = QueryDescriptor::bare(self.kind);
        for (key, value) in &self.template {
            let raw = match value {
                TemplateValue::Capture(i) => caps.get(*i).map(|m| m.as_str()).unwrap_or_default(),
                TemplateValue::Literal(s) => s.as_str(),
            };
            descriptor.params.insert(key.clone(), ParamValue::typed(key, raw));
        }
        Some(descriptor)
    }
}

fn parse_template(
    pattern: &str,
    query: &str,
    groups: usize,
) -> Result<Vec<(String, TemplateValue)>, RuleError> {
    let malformed = |segment: &str| RuleError::Template {
        pattern: pattern.to_string(),
        segment: segment.to_string(),
    };

    let mut pairs = Vec::new();
    for segment in query.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once('=').ok_or_else(|| malformed(segment))?;
        if key.is_empty() || !key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(malformed(segment));
        }

        let value = if let Some(index) = value.strip_prefix("$matches[").and_then(|v| v.strip_suffix(']')) {
            let index: usize = index.parse().map_err(|_| malformed(segment))?;
            if index == 0 || index > groups {
                return Err(RuleError::CaptureOutOfRange {
                    pattern: pattern.to_string(),
                    index,
                    groups,
                });
            }
            TemplateValue::Capture(index)
        } else if value.contains('$') {
            return Err(malformed(segment));
        } else {
            TemplateValue::Literal(value.to_string())
        };
        pairs.push((key.to_string(), value));
    }
    Ok(pairs)
}

/// Ordered, compiled rule table. First match wins.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<RewriteRule>,
}

impl RuleTable {
    /// Compile all specs, collecting every error rather than the first.
    pub fn compile(specs: &[RuleSpec]) -> Result<Self, Vec<RuleError>> {
        let mut rules = Vec::with_capacity(specs.len());
        let mut errors = Vec::new();
        for spec in specs {
            match RewriteRule::compile(spec.clone()) {
                Ok(rule) => rules.push(rule),
                Err(e) => errors.push(e),
            }
        }
        if errors.is_empty() {
            Ok(Self { rules })
        } else {
            Err(errors)
        }
    }

    /// The built-in table for a permalink structure.
    pub fn defaults(permalink_structure: &str, taxonomies: &[String]) -> Self {
        let rules = default_specs(permalink_structure, taxonomies)
            .into_iter()
            .filter_map(|spec| match RewriteRule::compile(spec) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping default rewrite rule");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Walk rules in order; the first full-path match determines the result.
    pub fn lookup(&self, path: &str) -> Option<(usize, QueryDescriptor)> {
        self.rules
            .iter()
            .enumerate()
            .find_map(|(i, rule)| rule.apply(path).map(|d| (i, d)))
    }

    pub fn specs(&self) -> Vec<RuleSpec> {
        self.rules.iter().map(|r| r.spec.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter()
    }
}

/// A permalink structure tag and what it becomes in a rewrite rule.
struct PermalinkTag {
    name: &'static str,
    capture: &'static str,
    param: &'static str,
}

const PERMALINK_TAGS: [PermalinkTag; 10] = [
    PermalinkTag { name: "%year%", capture: "([0-9]{4})", param: "year" },
    PermalinkTag { name: "%monthnum%", capture: "([0-9]{1,2})", param: "month" },
    PermalinkTag { name: "%day%", capture: "([0-9]{1,2})", param: "day" },
    PermalinkTag { name: "%hour%", capture: "([0-9]{1,2})", param: "hour" },
    PermalinkTag { name: "%minute%", capture: "([0-9]{1,2})", param: "minute" },
    PermalinkTag { name: "%second%", capture: "([0-9]{1,2})", param: "second" },
    PermalinkTag { name: "%post_id%", capture: "([0-9]+)", param: "p" },
    PermalinkTag { name: "%postname%", capture: "([^/]+)", param: "slug" },
    PermalinkTag { name: "%author%", capture: "([^/]+)", param: "author" },
    PermalinkTag { name: "%category%", capture: "(.+?)", param: "category_name" },
];

/// Errors in `site.permalink_structure`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermalinkError {
    #[error("permalink structure is empty; plain ?p= links cannot be resolved from a path")]
    Empty,

    #[error("permalink structure '{structure}': unknown tag '{tag}'")]
    UnknownTag { structure: String, tag: String },

    #[error("permalink structure '{0}' needs %postname% or %post_id%")]
    NotUnique(String),
}

enum Piece<'a> {
    Literal(&'a str),
    Tag(&'static PermalinkTag),
}

/// Split a structure such as `/%year%/%postname%/` into literals and tags.
fn parse_structure(structure: &str) -> Result<Vec<Piece<'_>>, PermalinkError> {
    let trimmed = structure.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(PermalinkError::Empty);
    }
    let unknown = |tag: &str| PermalinkError::UnknownTag {
        structure: structure.to_string(),
        tag: tag.to_string(),
    };

    let mut pieces = Vec::new();
    let mut rest = trimmed;
    while let Some(start) = rest.find('%') {
        if start > 0 {
            pieces.push(Piece::Literal(&rest[..start]));
        }
        let after = &rest[start + 1..];
        let end = after.find('%').ok_or_else(|| unknown(&rest[start..]))?;
        let name = &rest[start..start + end + 2];
        let tag = PERMALINK_TAGS.iter().find(|t| t.name == name).ok_or_else(|| unknown(name))?;
        pieces.push(Piece::Tag(tag));
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest));
    }

    let unique = pieces
        .iter()
        .any(|p| matches!(p, Piece::Tag(t) if t.param == "slug" || t.param == "p"));
    if !unique {
        return Err(PermalinkError::NotUnique(structure.to_string()));
    }
    Ok(pieces)
}

/// Check that posts under `structure` can be resolved from their links.
pub fn check_permalink_structure(structure: &str) -> Result<(), PermalinkError> {
    parse_structure(structure).map(|_| ())
}

/// Single-post rule for a permalink structure.
///
/// `None` for `/%postname%/`, which the top-level slug rule already covers.
/// The whole path is also captured as `pagename` so a page at that path
/// wins over a post.
pub fn permalink_spec(structure: &str) -> Result<Option<RuleSpec>, PermalinkError> {
    let pieces = parse_structure(structure)?;
    if let [Piece::Tag(tag)] = pieces.as_slice() {
        if tag.param == "slug" {
            return Ok(None);
        }
    }

    let mut pattern = String::new();
    let mut query = vec!["pagename=$matches[1]".to_string()];
    let mut group = 1;
    for piece in &pieces {
        match piece {
            Piece::Literal(text) => pattern.push_str(&regex::escape(text)),
            Piece::Tag(tag) => {
                group += 1;
                pattern.push_str(tag.capture);
                query.push(format!("{}=$matches[{}]", tag.param, group));
            }
        }
    }
    Ok(Some(RuleSpec::new(
        format!("/({})/?", pattern),
        QueryKind::Single,
        query.join("&"),
    )))
}

/// Date archives move under `/date` when `%post_id%` is among the first
/// three tags, so numeric post links and date archives cannot collide.
fn date_front(structure: &str) -> &'static str {
    let Ok(pieces) = parse_structure(structure) else {
        return "";
    };
    let post_id_leads = pieces
        .iter()
        .filter_map(|p| match p {
            Piece::Tag(tag) => Some(tag.param),
            Piece::Literal(_) => None,
        })
        .take(3)
        .any(|param| param == "p");
    if post_id_leads {
        "/date"
    } else {
        ""
    }
}

/// Default rule specs for a permalink structure, most specific first.
///
/// A custom taxonomy name is only used when it is a plain slug. An invalid
/// structure gets no post rule; validation reports it.
pub fn default_specs(permalink_structure: &str, taxonomies: &[String]) -> Vec<RuleSpec> {
    let date = date_front(permalink_structure);
    let post = match permalink_spec(permalink_structure) {
        Ok(post) => post,
        Err(e) => {
            tracing::warn!(error = %e, "No post permalink rule");
            None
        }
    };
    // A one-segment post link would otherwise be taken by the slug rule.
    let single_segment = !permalink_structure.trim().trim_matches('/').contains('/');
    let (first, late) = if single_segment { (post, None) } else { (None, post) };

    let mut specs: Vec<RuleSpec> = first.into_iter().collect();
    specs.extend([
        // Slugs need a non-digit so a bare year falls through to the date rules.
        RuleSpec::new(r"/([^/]*[^/0-9][^/]*)/?", QueryKind::Single, "slug=$matches[1]"),
        RuleSpec::new(r"/archives/([0-9]+)/?", QueryKind::Single, "p=$matches[1]"),
        RuleSpec::new(
            format!(r"{}/([0-9]{{4}})/([0-9]{{1,2}})/([0-9]{{1,2}})/?", date),
            QueryKind::Date,
            "year=$matches[1]&month=$matches[2]&day=$matches[3]",
        ),
        RuleSpec::new(
            format!(r"{}/([0-9]{{4}})/([0-9]{{1,2}})/?", date),
            QueryKind::Date,
            "year=$matches[1]&month=$matches[2]",
        ),
        RuleSpec::new(format!(r"{}/([0-9]{{4}})/?", date), QueryKind::Date, "year=$matches[1]"),
        RuleSpec::new(r"/author/([^/]+)/?", QueryKind::Author, "author=$matches[1]"),
        RuleSpec::new(r"/category/(.+?)/?", QueryKind::Category, "category_name=$matches[1]"),
        RuleSpec::new(r"/tag/([^/]+)/?", QueryKind::Tag, "tag=$matches[1]"),
    ]);

    for taxonomy in taxonomies {
        if taxonomy.is_empty() || !taxonomy.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
            continue;
        }
        specs.push(RuleSpec::new(
            format!("/{}/([^/]+)/?", regex::escape(taxonomy)),
            QueryKind::Taxonomy,
            format!("taxonomy={}&term=$matches[1]", taxonomy),
        ));
    }

    specs.push(RuleSpec::new(r"/search/(.+?)/?", QueryKind::Search, "s=$matches[1]"));
    specs.extend(late);
    specs.push(RuleSpec::new(
        r"/((?:[^/]+/)+[^/]+)/?",
        QueryKind::Single,
        "pagename=$matches[1]",
    ));
    specs
}

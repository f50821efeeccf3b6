//! Query descriptor: the structured output of URL resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameter keys whose captured values are typed as integers.
pub const NUMERIC_PARAMS: &[&str] = &["year", "month", "day", "hour", "minute", "second", "p", "page_id"];

/// What kind of content a URL refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QueryKind {
    #[serde(rename = "front_page")]
    FrontPage,
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "archive:author")]
    Author,
    #[serde(rename = "archive:category")]
    Category,
    #[serde(rename = "archive:tag")]
    Tag,
    #[serde(rename = "archive:taxonomy")]
    Taxonomy,
    #[serde(rename = "archive:date")]
    Date,
    #[serde(rename = "search")]
    Search,
    #[serde(rename = "not_found")]
    NotFound,
}

impl QueryKind {
    pub const ALL: [QueryKind; 9] = [
        QueryKind::FrontPage,
        QueryKind::Single,
        QueryKind::Author,
        QueryKind::Category,
        QueryKind::Tag,
        QueryKind::Taxonomy,
        QueryKind::Date,
        QueryKind::Search,
        QueryKind::NotFound,
    ];

    /// Wire name of the kind (`archive:category`, `single`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::FrontPage => "front_page",
            QueryKind::Single => "single",
            QueryKind::Author => "archive:author",
            QueryKind::Category => "archive:category",
            QueryKind::Tag => "archive:tag",
            QueryKind::Taxonomy => "archive:taxonomy",
            QueryKind::Date => "archive:date",
            QueryKind::Search => "search",
            QueryKind::NotFound => "not_found",
        }
    }

    /// True for listing queries (author, term and date archives, search).
    pub fn is_archive(&self) -> bool {
        matches!(
            self,
            QueryKind::Author
                | QueryKind::Category
                | QueryKind::Tag
                | QueryKind::Taxonomy
                | QueryKind::Date
                | QueryKind::Search
        )
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown query kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for QueryKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A single descriptor parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

impl ParamValue {
    /// Type a raw value for `key`: numeric keys become integers when the
    /// text is all digits, everything else stays text.
    pub fn typed(key: &str, raw: &str) -> Self {
        if NUMERIC_PARAMS.contains(&key) && !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = raw.parse::<i64>() {
                return ParamValue::Int(n);
            }
        }
        ParamValue::Text(raw.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            ParamValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(n) => Some(*n),
            ParamValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

/// Resolver output: a kind tag plus ordered parameters.
///
/// Params live in a `BTreeMap` so two descriptors with the same content
/// serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub kind: QueryKind,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl QueryDescriptor {
    /// Descriptor with no parameters.
    pub fn bare(kind: QueryKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    pub fn front_page() -> Self {
        Self::bare(QueryKind::FrontPage)
    }

    pub fn not_found() -> Self {
        Self::bare(QueryKind::NotFound)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// String parameter; integers are not coerced.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(ParamValue::as_str)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.params.get(key).and_then(ParamValue::as_int)
    }
}

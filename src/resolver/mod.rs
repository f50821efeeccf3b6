//! URL resolution subsystem.
//!
//! # Data Flow
//! ```text
//! raw URL (absolute or site-relative)
//!     → normalize.rs (check site, strip base path / query / trailing slash)
//!     → rules.rs (ordered rewrite rules, first full-path match)
//!     → descriptor.rs (kind + typed params)
//!     → Return: QueryDescriptor or ResolveError::InvalidUrl
//!
//! Rule Compilation (at startup / reload):
//!     RuleSpec[] (config) or default_specs()
//!     → compile regexes, parse templates
//!     → Freeze as immutable RuleTable
//! ```
//!
//! # Design Decisions
//! - Resolution is a pure function of (url, site base, rules)
//! - Deterministic: same input always yields the same descriptor
//! - Descriptors never carry query-language text, only typed params
//! - An empty path is the front page and never reaches the rule table

pub mod descriptor;
pub mod normalize;
pub mod resolve;
pub mod rules;

pub use descriptor::{ParamValue, QueryDescriptor, QueryKind};
pub use normalize::{ResolveError, SiteBase};
pub use resolve::{resolve, Resolver};
pub use rules::{PermalinkError, RewriteRule, RuleError, RuleSpec, RuleTable};

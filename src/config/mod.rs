//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, rule compilation)
//!     → HeadlessConfig (validated, immutable)
//!     → build_resolver() → Resolver shared via Arc
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<Resolver> in the server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Only the resolver is hot-reloaded; the content seed is read at startup

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{build_resolver, load_config, ConfigError};
pub use schema::{HeadlessConfig, ListenerConfig, LogFormat, ObservabilityConfig, ShowOnFront, SiteConfig};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;

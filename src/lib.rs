//! Headless REST API: front-end URL resolution and content endpoints.

pub mod config;
pub mod content;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resolver;

pub use config::HeadlessConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resolver::{resolve, QueryDescriptor, QueryKind, Resolver};

//! Content subsystem.
//!
//! # Data Flow
//! ```text
//! QueryDescriptor + Pagination
//!     → store.rs (ContentStore trait)
//!     → memory.rs (seeded in-memory implementation)
//!     → QueryResult (items, totals)
//!     → shaper.rs (fixed public response shape)
//! ```
//!
//! # Design Decisions
//! - The store is read-only after load and shared via Arc
//! - Lookups with no result are values (`None`, empty), not errors
//! - Shaping is separate from querying; neither inherits from the other

pub mod memory;
pub mod model;
pub mod shaper;
pub mod store;

pub use memory::{HomeSettings, MemoryStore};
pub use model::{Author, ContentItem, Menu, MenuItem, Seed, Term};
pub use shaper::{PostResponse, Shaper};
pub use store::{ContentStore, Pagination, QueryResult, StoreError};

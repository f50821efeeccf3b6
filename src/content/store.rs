//! Content store interface.
//!
//! # Responsibilities
//! - Execute a query descriptor against stored content
//! - Map a single-item descriptor to a post id, and ids to posts
//! - Look up navigation menus by id, name or slug
//! - Produce home page content
//!
//! # Design Decisions
//! - Pagination is an explicit argument, never derived from the URL
//! - "Nothing found" is an empty result or `None`, never an error
//! - `StoreError` is reserved for the store itself failing

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::model::{Author, ContentItem, MenuItem, Term};
use crate::resolver::QueryDescriptor;

/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 100;

/// Errors raised by a content store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the backing data failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing data is not valid.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The store cannot serve requests right now.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Which page of a listing to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub items: Vec<ContentItem>,
    /// Matches across all pages.
    pub total: usize,
    pub total_pages: usize,
}

impl QueryResult {
    /// Slice `all` down to the requested page.
    pub fn paginate(all: Vec<ContentItem>, page: &Pagination) -> Self {
        let total = all.len();
        let per_page = page.per_page.max(1) as usize;
        let total_pages = total.div_ceil(per_page);
        let items = all.into_iter().skip(page.offset()).take(per_page).collect();
        Self {
            items,
            total,
            total_pages,
        }
    }

    pub fn single(item: ContentItem) -> Self {
        Self {
            items: vec![item],
            total: 1,
            total_pages: 1,
        }
    }

    pub fn has_results(&self) -> bool {
        !self.items.is_empty()
    }
}

/// Read access to site content.
pub trait ContentStore: Send + Sync {
    /// Run a descriptor. `not_found` descriptors return an empty result.
    fn query(&self, descriptor: &QueryDescriptor, page: &Pagination) -> Result<QueryResult, StoreError>;

    /// Id of the single item a descriptor points at, if any.
    ///
    /// A `front_page` descriptor points at the static home page, if one is set.
    fn post_id_for(&self, descriptor: &QueryDescriptor) -> Result<Option<u64>, StoreError>;

    fn post_by_id(&self, id: u64) -> Result<Option<ContentItem>, StoreError>;

    fn post_type_by_id(&self, id: u64) -> Result<Option<String>, StoreError> {
        Ok(self.post_by_id(id)?.map(|item| item.post_type))
    }

    fn author_by_id(&self, id: u64) -> Result<Option<Author>, StoreError>;

    fn term_by_id(&self, id: u64) -> Result<Option<Term>, StoreError>;

    /// Items of the menu whose id, name or slug equals `identifier`.
    fn menu_items(&self, identifier: &str) -> Result<Option<Vec<MenuItem>>, StoreError>;

    /// Static front page or the latest posts, per site settings.
    fn home_page(&self, page: &Pagination) -> Result<QueryResult, StoreError>;

    /// Id of the static home page; `None` when the home page lists posts.
    fn front_page_id(&self) -> Option<u64>;
}

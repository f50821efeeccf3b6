//! Stored content types.
//!
//! These mirror what the seed file holds, not the public response shape;
//! see `shaper.rs` for the latter.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Taxonomy holding post categories.
pub const CATEGORY: &str = "category";
/// Taxonomy holding post tags.
pub const POST_TAG: &str = "post_tag";

/// A single post, page or custom-type item.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContentItem {
    pub id: u64,

    #[serde(rename = "type", default = "default_post_type")]
    pub post_type: String,

    #[serde(default = "default_status")]
    pub status: String,

    pub slug: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub content: String,

    /// Hand-written excerpt; empty means "generate from content".
    #[serde(default)]
    pub excerpt: String,

    #[serde(default)]
    pub author: u64,

    pub date: NaiveDateTime,

    #[serde(default)]
    pub date_gmt: Option<NaiveDateTime>,

    #[serde(default)]
    pub modified: Option<NaiveDateTime>,

    #[serde(default)]
    pub modified_gmt: Option<NaiveDateTime>,

    #[serde(default)]
    pub parent: u64,

    #[serde(default)]
    pub featured_media: u64,

    #[serde(default)]
    pub sticky: bool,

    #[serde(default)]
    pub template: String,

    #[serde(default = "default_format")]
    pub format: String,

    /// Non-empty means the item is password protected.
    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub menu_order: i64,

    /// Term ids keyed by taxonomy name (`category`, `post_tag`, ...).
    #[serde(default)]
    pub terms: BTreeMap<String, Vec<u64>>,
}

fn default_post_type() -> String {
    "post".to_string()
}

fn default_status() -> String {
    "publish".to_string()
}

fn default_format() -> String {
    "standard".to_string()
}

impl ContentItem {
    pub fn is_published(&self) -> bool {
        self.status == "publish"
    }

    pub fn is_page(&self) -> bool {
        self.post_type == "page"
    }

    pub fn is_post(&self) -> bool {
        self.post_type == "post"
    }

    pub fn is_protected(&self) -> bool {
        !self.password.is_empty()
    }

    pub fn date_gmt(&self) -> NaiveDateTime {
        self.date_gmt.unwrap_or(self.date)
    }

    pub fn modified(&self) -> NaiveDateTime {
        self.modified.unwrap_or(self.date)
    }

    pub fn modified_gmt(&self) -> NaiveDateTime {
        self.modified_gmt.unwrap_or_else(|| self.modified())
    }

    pub fn terms_in(&self, taxonomy: &str) -> &[u64] {
        self.terms.get(taxonomy).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A content author.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Author {
    pub id: u64,
    /// URL-safe name used in author archive URLs.
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

/// A taxonomy term (category, tag or custom).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Term {
    pub id: u64,
    pub taxonomy: String,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: u64,
}

/// A navigation menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MenuItem {
    pub id: u64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub menu_order: u32,
    /// Id of the parent menu item, 0 for top level.
    #[serde(default)]
    pub parent: u64,
    /// Linked object type (`page`, `post`, `category`, `custom`).
    #[serde(default = "default_menu_object")]
    pub object: String,
    #[serde(default)]
    pub object_id: u64,
    /// `post_type`, `taxonomy` or `custom`.
    #[serde(rename = "type", default = "default_menu_type")]
    pub item_type: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attr_title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub xfn: String,
}

fn default_menu_object() -> String {
    "custom".to_string()
}

fn default_menu_type() -> String {
    "custom".to_string()
}

/// A named navigation menu.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Menu {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

/// Everything the in-memory store is seeded with.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Seed {
    pub posts: Vec<ContentItem>,
    pub authors: Vec<Author>,
    pub terms: Vec<Term>,
    pub menus: Vec<Menu>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_defaults() {
        let item: ContentItem = serde_json::from_value(serde_json::json!({
            "id": 1,
            "slug": "hello-world",
            "date": "2021-09-01T10:00:00"
        }))
        .unwrap();
        assert!(item.is_post());
        assert!(item.is_published());
        assert_eq!(item.format, "standard");
        assert_eq!(item.modified_gmt(), item.date);
        assert!(item.terms_in(CATEGORY).is_empty());
    }
}

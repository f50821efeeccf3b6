//! Response shaping: stored item → public JSON shape.
//!
//! # Responsibilities
//! - Project a `ContentItem` onto the fixed response field set
//! - Build permalinks from the configured structure
//! - Hide content of password-protected items
//! - Generate excerpts when none were written
//!
//! # Design Decisions
//! - The item is always passed in explicitly; nothing reads a
//!   "current post" from shared state
//! - Term ids are keyed by the taxonomy's REST name
//!   (`categories`, `tags`, custom names as-is)

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::content::model::{ContentItem, CATEGORY, POST_TAG};
use crate::content::store::{ContentStore, StoreError};
use crate::resolver::SiteBase;

/// Words kept in a generated excerpt.
pub const EXCERPT_WORDS: usize = 55;
/// Appended to a generated excerpt that was cut short.
pub const EXCERPT_MORE: &str = " [&hellip;]";

/// Guards against parent cycles in page or term hierarchies.
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub rendered: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedProtected {
    pub rendered: String,
    pub protected: bool,
}

/// Public shape of a content item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostResponse {
    pub id: u64,
    pub date: NaiveDateTime,
    pub date_gmt: NaiveDateTime,
    pub modified: NaiveDateTime,
    pub modified_gmt: NaiveDateTime,
    pub slug: String,
    pub status: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub link: String,
    pub title: Rendered,
    pub content: RenderedProtected,
    pub excerpt: RenderedProtected,
    pub author: u64,
    pub featured_media: u64,
    pub parent: u64,
    pub sticky: bool,
    pub template: String,
    pub format: String,
    #[serde(flatten)]
    pub terms: BTreeMap<String, Vec<u64>>,
}

/// REST name for a taxonomy.
pub fn rest_base(taxonomy: &str) -> &str {
    match taxonomy {
        CATEGORY => "categories",
        POST_TAG => "tags",
        other => other,
    }
}

/// Builds [`PostResponse`] values for one site.
#[derive(Debug, Clone)]
pub struct Shaper {
    site: SiteBase,
    permalink_structure: String,
}

impl Shaper {
    pub fn new(site: SiteBase, permalink_structure: impl Into<String>) -> Self {
        Self {
            site,
            permalink_structure: permalink_structure.into(),
        }
    }

    pub fn shape(&self, item: &ContentItem, store: &dyn ContentStore) -> Result<PostResponse, StoreError> {
        let protected = item.is_protected();
        let (content, excerpt) = if protected {
            (String::new(), String::new())
        } else {
            (item.content.clone(), render_excerpt(item))
        };

        let mut terms: BTreeMap<String, Vec<u64>> = item
            .terms
            .iter()
            .map(|(taxonomy, ids)| (rest_base(taxonomy).to_string(), ids.clone()))
            .collect();
        if item.is_post() {
            terms.entry("categories".to_string()).or_default();
            terms.entry("tags".to_string()).or_default();
        }

        Ok(PostResponse {
            id: item.id,
            date: item.date,
            date_gmt: item.date_gmt(),
            modified: item.modified(),
            modified_gmt: item.modified_gmt(),
            slug: item.slug.clone(),
            status: item.status.clone(),
            post_type: item.post_type.clone(),
            link: self.permalink(item, store)?,
            title: Rendered {
                rendered: item.title.clone(),
            },
            content: RenderedProtected {
                rendered: content,
                protected,
            },
            excerpt: RenderedProtected {
                rendered: excerpt,
                protected,
            },
            author: item.author,
            featured_media: item.featured_media,
            parent: item.parent,
            sticky: item.sticky,
            template: item.template.clone(),
            format: item.format.clone(),
            terms,
        })
    }

    /// Absolute front-end URL of an item.
    ///
    /// The store's static home page links to the site root.
    pub fn permalink(&self, item: &ContentItem, store: &dyn ContentStore) -> Result<String, StoreError> {
        if Some(item.id) == store.front_page_id() {
            return Ok(self.site.absolute("/"));
        }
        let path = if item.is_page() {
            format!("/{}/", self.page_path(item, store)?)
        } else if item.is_post() {
            if self.permalink_structure.trim().is_empty() {
                return Ok(self.site.absolute(&format!("/?p={}", item.id)));
            }
            self.post_path(item, store)?
        } else {
            format!("/{}/{}/", item.post_type, item.slug)
        };
        Ok(self.site.absolute(&path))
    }

    fn page_path(&self, page: &ContentItem, store: &dyn ContentStore) -> Result<String, StoreError> {
        let mut segments = vec![page.slug.clone()];
        let mut parent = page.parent;
        while parent != 0 && segments.len() < MAX_DEPTH {
            match store.post_by_id(parent)? {
                Some(ancestor) => {
                    segments.push(ancestor.slug);
                    parent = ancestor.parent;
                }
                None => break,
            }
        }
        segments.reverse();
        Ok(segments.join("/"))
    }

    fn post_path(&self, item: &ContentItem, store: &dyn ContentStore) -> Result<String, StoreError> {
        let d = item.date;
        let mut path = self
            .permalink_structure
            .replace("%year%", &format!("{:04}", d.year()))
            .replace("%monthnum%", &format!("{:02}", d.month()))
            .replace("%day%", &format!("{:02}", d.day()))
            .replace("%hour%", &format!("{:02}", d.hour()))
            .replace("%minute%", &format!("{:02}", d.minute()))
            .replace("%second%", &format!("{:02}", d.second()))
            .replace("%post_id%", &item.id.to_string())
            .replace("%postname%", &item.slug);

        if path.contains("%author%") {
            let author = store.author_by_id(item.author)?.map(|a| a.slug).unwrap_or_default();
            path = path.replace("%author%", &author);
        }
        if path.contains("%category%") {
            let category = self.category_path(item, store)?;
            path = path.replace("%category%", &category);
        }
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Ok(path)
    }

    /// Slug path of the item's lowest-id category, `uncategorized` if none.
    fn category_path(&self, item: &ContentItem, store: &dyn ContentStore) -> Result<String, StoreError> {
        let Some(first) = item.terms_in(CATEGORY).iter().min().copied() else {
            return Ok("uncategorized".to_string());
        };
        let mut segments = Vec::new();
        let mut next = first;
        while next != 0 && segments.len() < MAX_DEPTH {
            match store.term_by_id(next)? {
                Some(term) => {
                    segments.push(term.slug);
                    next = term.parent;
                }
                None => break,
            }
        }
        if segments.is_empty() {
            return Ok("uncategorized".to_string());
        }
        segments.reverse();
        Ok(segments.join("/"))
    }
}

fn render_excerpt(item: &ContentItem) -> String {
    let text = if item.excerpt.trim().is_empty() {
        generate_excerpt(&item.content)
    } else {
        item.excerpt.trim().to_string()
    };
    if text.is_empty() {
        String::new()
    } else {
        format!("<p>{}</p>\n", text)
    }
}

/// First [`EXCERPT_WORDS`] words of the tag-stripped content.
pub fn generate_excerpt(content: &str) -> String {
    let text = strip_tags(content);
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > EXCERPT_WORDS {
        format!("{}{}", words[..EXCERPT_WORDS].join(" "), EXCERPT_MORE)
    } else {
        words.join(" ")
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                // Block boundaries must not glue words together.
                out.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

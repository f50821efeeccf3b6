//! In-memory content store seeded from a JSON file.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use chrono::{Datelike, Timelike};
use percent_encoding::percent_decode_str;

use crate::content::model::{Author, ContentItem, Menu, MenuItem, Seed, Term, CATEGORY, POST_TAG};
use crate::content::store::{ContentStore, Pagination, QueryResult, StoreError};
use crate::resolver::{QueryDescriptor, QueryKind};

/// Descriptor params a post permalink can carry besides its slug or id.
const PERMALINK_FILTERS: [&str; 8] = ["year", "month", "day", "hour", "minute", "second", "author", "category_name"];

/// What the home page shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HomeSettings {
    /// Latest posts, sticky posts first.
    #[default]
    LatestPosts,
    /// A static page by id.
    StaticPage(u64),
}

/// Read-only store over a [`Seed`].
///
/// Items are kept newest first, so listings need no per-query sort.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    posts: Vec<ContentItem>,
    by_id: HashMap<u64, usize>,
    authors: Vec<Author>,
    terms: Vec<Term>,
    menus: Vec<Menu>,
    home: HomeSettings,
}

impl MemoryStore {
    pub fn new(seed: Seed, home: HomeSettings) -> Self {
        let Seed {
            mut posts,
            authors,
            terms,
            menus,
        } = seed;
        posts.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        let by_id = posts.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        Self {
            posts,
            by_id,
            authors,
            terms,
            menus,
            home,
        }
    }

    /// Load a JSON seed file.
    pub fn load(path: &Path, home: HomeSettings) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        let seed: Seed = serde_json::from_str(&content)?;
        tracing::info!(
            path = ?path,
            posts = seed.posts.len(),
            terms = seed.terms.len(),
            menus = seed.menus.len(),
            "Content seed loaded"
        );
        Ok(Self::new(seed, home))
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    fn published(&self) -> impl Iterator<Item = &ContentItem> {
        self.posts.iter().filter(|p| p.is_published())
    }

    fn published_by_id(&self, id: u64) -> Option<&ContentItem> {
        self.by_id
            .get(&id)
            .map(|&i| &self.posts[i])
            .filter(|p| p.is_published())
    }

    /// Listings (archives, date, search) exclude pages except for search.
    fn listing<F>(&self, include_pages: bool, pred: F) -> Vec<ContentItem>
    where
        F: Fn(&ContentItem) -> bool,
    {
        self.published()
            .filter(|p| p.is_post() || (include_pages && p.is_page()))
            .filter(|&p| pred(p))
            .cloned()
            .collect()
    }

    fn find_single(&self, d: &QueryDescriptor) -> Option<&ContentItem> {
        // A page at the full path wins over the post the other params describe.
        if let Some(page) = d.text("pagename").and_then(|path| self.page_by_path(path)) {
            return Some(page);
        }
        if let Some(id) = d.int("p").or_else(|| d.int("page_id")) {
            return u64::try_from(id)
                .ok()
                .and_then(|id| self.published_by_id(id))
                .filter(|p| self.matches_permalink(p, d));
        }
        let slug = d.text("slug")?;
        if PERMALINK_FILTERS.iter().any(|key| d.param(key).is_some()) {
            return self
                .published()
                .find(|p| !p.is_page() && slug_eq(&p.slug, slug) && self.matches_permalink(p, d));
        }
        self.published()
            .find(|p| p.is_page() && p.parent == 0 && slug_eq(&p.slug, slug))
            .or_else(|| self.published().find(|p| p.is_post() && slug_eq(&p.slug, slug)))
            .or_else(|| self.published().find(|p| !p.is_page() && slug_eq(&p.slug, slug)))
    }

    /// Check the date, author and category parts of a post permalink.
    fn matches_permalink(&self, item: &ContentItem, d: &QueryDescriptor) -> bool {
        let date = item.date;
        let date_parts = [
            ("year", i64::from(date.year())),
            ("month", i64::from(date.month())),
            ("day", i64::from(date.day())),
            ("hour", i64::from(date.hour())),
            ("minute", i64::from(date.minute())),
            ("second", i64::from(date.second())),
        ];
        if !date_parts
            .iter()
            .all(|(key, actual)| d.int(key).map_or(true, |wanted| wanted == *actual))
        {
            return false;
        }

        if let Some(slug) = d.text("author") {
            let by_author = self
                .authors
                .iter()
                .any(|a| a.id == item.author && slug_eq(&a.slug, slug));
            if !by_author {
                return false;
            }
        }

        match last_segment(d.text("category_name")) {
            Some(slug) => self.term(CATEGORY, slug).is_some_and(|term| {
                let ids = self.term_tree(term);
                item.terms_in(CATEGORY).iter().any(|id| ids.contains(id))
            }),
            None => true,
        }
    }

    /// Find a page by its slash-separated ancestor path.
    fn page_by_path(&self, path: &str) -> Option<&ContentItem> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (last, ancestors) = segments.split_last()?;

        self.published()
            .filter(|p| p.is_page() && slug_eq(&p.slug, last))
            .find(|page| {
                let mut parent = page.parent;
                for expected in ancestors.iter().rev() {
                    match self.by_id.get(&parent).map(|&i| &self.posts[i]) {
                        Some(ancestor) if ancestor.is_page() && slug_eq(&ancestor.slug, expected) => {
                            parent = ancestor.parent;
                        }
                        _ => return false,
                    }
                }
                parent == 0
            })
    }

    fn term(&self, taxonomy: &str, slug: &str) -> Option<&Term> {
        self.terms
            .iter()
            .find(|t| t.taxonomy == taxonomy && slug_eq(&t.slug, slug))
    }

    /// A term id plus all of its descendants.
    fn term_tree(&self, root: &Term) -> HashSet<u64> {
        let mut ids = HashSet::from([root.id]);
        let mut frontier = vec![root.id];
        while let Some(parent) = frontier.pop() {
            for t in self.terms.iter().filter(|t| t.taxonomy == root.taxonomy && t.parent == parent) {
                if ids.insert(t.id) {
                    frontier.push(t.id);
                }
            }
        }
        ids
    }

    fn term_archive(&self, taxonomy: &str, slug: Option<&str>) -> Vec<ContentItem> {
        let Some(term) = slug.and_then(|s| self.term(taxonomy, s)) else {
            return Vec::new();
        };
        let ids = self.term_tree(term);
        self.listing(false, |p| p.terms_in(taxonomy).iter().any(|id| ids.contains(id)))
    }

    fn latest_posts(&self) -> Vec<ContentItem> {
        let mut posts = self.listing(false, |_| true);
        // Stable sort keeps date order within each group.
        posts.sort_by_key(|p| !p.sticky);
        posts
    }

    fn run(&self, d: &QueryDescriptor, page: &Pagination) -> QueryResult {
        let all = match d.kind {
            QueryKind::FrontPage => return self.home(page),
            QueryKind::NotFound => Vec::new(),
            QueryKind::Single => {
                return self
                    .find_single(d)
                    .cloned()
                    .map(QueryResult::single)
                    .unwrap_or_default();
            }
            QueryKind::Author => {
                let Some(author) = d
                    .text("author")
                    .and_then(|slug| self.authors.iter().find(|a| slug_eq(&a.slug, slug)))
                else {
                    return QueryResult::default();
                };
                self.listing(false, |p| p.author == author.id)
            }
            QueryKind::Category => {
                self.term_archive(CATEGORY, last_segment(d.text("category_name")))
            }
            QueryKind::Tag => self.term_archive(POST_TAG, d.text("tag")),
            QueryKind::Taxonomy => match d.text("taxonomy") {
                Some(taxonomy) => self.term_archive(taxonomy, d.text("term")),
                None => Vec::new(),
            },
            QueryKind::Date => {
                let Some(year) = d.int("year") else {
                    return QueryResult::default();
                };
                let month = d.int("month");
                let day = d.int("day");
                self.listing(false, |p| {
                    i64::from(p.date.year()) == year
                        && month.map_or(true, |m| i64::from(p.date.month()) == m)
                        && day.map_or(true, |dd| i64::from(p.date.day()) == dd)
                })
            }
            QueryKind::Search => {
                let needle = d.text("s").map(search_terms).unwrap_or_default();
                if needle.is_empty() {
                    return QueryResult::default();
                }
                self.listing(true, |p| {
                    p.title.to_lowercase().contains(&needle) || p.content.to_lowercase().contains(&needle)
                })
            }
        };
        QueryResult::paginate(all, page)
    }

    fn front_page(&self) -> Option<u64> {
        match self.home {
            HomeSettings::StaticPage(id) => Some(id),
            HomeSettings::LatestPosts => None,
        }
    }

    fn home(&self, page: &Pagination) -> QueryResult {
        match self.home {
            HomeSettings::StaticPage(id) => self
                .published_by_id(id)
                .cloned()
                .map(QueryResult::single)
                .unwrap_or_default(),
            HomeSettings::LatestPosts => QueryResult::paginate(self.latest_posts(), page),
        }
    }
}

impl ContentStore for MemoryStore {
    fn query(&self, descriptor: &QueryDescriptor, page: &Pagination) -> Result<QueryResult, StoreError> {
        Ok(self.run(descriptor, page))
    }

    fn post_id_for(&self, descriptor: &QueryDescriptor) -> Result<Option<u64>, StoreError> {
        let id = match descriptor.kind {
            QueryKind::Single => self.find_single(descriptor).map(|p| p.id),
            QueryKind::FrontPage => self
                .front_page()
                .and_then(|id| self.published_by_id(id))
                .map(|p| p.id),
            _ => None,
        };
        Ok(id)
    }

    fn front_page_id(&self) -> Option<u64> {
        self.front_page()
    }

    fn post_by_id(&self, id: u64) -> Result<Option<ContentItem>, StoreError> {
        Ok(self.published_by_id(id).cloned())
    }

    fn author_by_id(&self, id: u64) -> Result<Option<Author>, StoreError> {
        Ok(self.authors.iter().find(|a| a.id == id).cloned())
    }

    fn term_by_id(&self, id: u64) -> Result<Option<Term>, StoreError> {
        Ok(self.terms.iter().find(|t| t.id == id).cloned())
    }

    fn menu_items(&self, identifier: &str) -> Result<Option<Vec<MenuItem>>, StoreError> {
        let numeric = identifier.parse::<u64>().ok();
        let menu = self.menus.iter().find(|m| {
            Some(m.id) == numeric || m.slug.eq_ignore_ascii_case(identifier) || m.name == identifier
        });
        Ok(menu.map(|m| {
            let mut items = m.items.clone();
            items.sort_by_key(|i| i.menu_order);
            items
        }))
    }

    fn home_page(&self, page: &Pagination) -> Result<QueryResult, StoreError> {
        Ok(self.home(page))
    }
}

/// Slugs are stored percent-encoded; hex case may differ.
fn slug_eq(stored: &str, requested: &str) -> bool {
    stored.eq_ignore_ascii_case(requested)
}

/// Last non-empty segment of a slash-separated term path.
fn last_segment(path: Option<&str>) -> Option<&str> {
    path.and_then(|p| p.rsplit('/').find(|s| !s.is_empty()))
}

/// Lowercased search needle from a raw `s` capture.
///
/// `+` means a space; malformed escapes stay as written and control
/// characters are dropped.
fn search_terms(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let decoded = percent_decode_str(&spaced).decode_utf8_lossy();
    decoded
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_lowercase()
}

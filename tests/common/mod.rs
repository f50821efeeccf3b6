//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use headless_rest::config::HeadlessConfig;
use headless_rest::content::{MemoryStore, Seed};
use headless_rest::http::HttpServer;
use headless_rest::lifecycle::Shutdown;

/// A server running on an ephemeral port.
pub struct TestServer {
    pub base: String,
    pub config_updates: mpsc::UnboundedSender<HeadlessConfig>,
    pub shutdown: Shutdown,
}

impl TestServer {
    /// Absolute URL of an API route, e.g. `url("/home_page")`.
    pub fn url(&self, route: &str) -> String {
        format!("{}/headless/v1{}", self.base, route)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger("test finished");
    }
}

/// Small site: two published posts, one draft, a page tree and a menu.
pub fn seed() -> Seed {
    serde_json::from_value(json!({
        "authors": [{"id": 1, "slug": "jane", "name": "Jane Doe"}],
        "terms": [
            {"id": 10, "taxonomy": "category", "slug": "news", "name": "News"},
            {"id": 20, "taxonomy": "post_tag", "slug": "rust", "name": "Rust"}
        ],
        "posts": [
            {"id": 1, "slug": "hello-world", "title": "Hello World", "content": "<p>First post</p>",
             "author": 1, "date": "2021-09-01T10:00:00", "terms": {"category": [10], "post_tag": [20]}},
            {"id": 2, "slug": "second-post", "title": "Second", "content": "<p>Second post</p>",
             "author": 1, "date": "2021-10-05T10:00:00", "terms": {"category": [10]}},
            {"id": 3, "slug": "unpublished", "status": "draft", "date": "2021-11-01T10:00:00"},
            {"id": 100, "type": "page", "slug": "about", "title": "About", "date": "2021-08-01T10:00:00"},
            {"id": 101, "type": "page", "slug": "team", "title": "Team", "parent": 100,
             "date": "2021-08-02T10:00:00"}
        ],
        "menus": [{
            "id": 5, "name": "Main Menu", "slug": "main-menu",
            "items": [
                {"id": 51, "title": "News", "url": "https://example.com/category/news/", "menu_order": 2},
                {"id": 50, "title": "About", "url": "https://example.com/about/", "menu_order": 1,
                 "object": "page", "object_id": 100, "type": "post_type"}
            ]
        }]
    }))
    .unwrap()
}

pub fn config() -> HeadlessConfig {
    let mut config = HeadlessConfig::default();
    config.site.base_url = "https://example.com".to_string();
    config.timeouts.request_secs = 5;
    config
}

/// Spawn a server over [`seed`] with `config`.
pub async fn start_server(config: HeadlessConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let store = MemoryStore::new(seed(), config.site.home_settings());
    let server = HttpServer::new(config, Arc::new(store)).unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx, shutdown_rx).await;
    });

    TestServer {
        base: format!("http://{}", addr),
        config_updates: tx,
        shutdown,
    }
}

//! Integration tests for the `/headless/v1` endpoints.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::Value;

use headless_rest::http::ErrorBody;
use headless_rest::resolver::{QueryKind, RuleSpec};

mod common;

async fn get(url: &str) -> (StatusCode, reqwest::header::HeaderMap, Value) {
    let res = reqwest::get(url).await.unwrap();
    let status = StatusCode::from_u16(res.status().as_u16()).unwrap();
    let headers = res.headers().clone();
    let body = res.json().await.unwrap();
    (status, headers, body)
}

fn error(body: Value) -> ErrorBody {
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn test_post_by_url() {
    let server = common::start_server(common::config()).await;

    let (status, headers, body) = get(&server.url("/post-by-url/hello-world/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["slug"], "hello-world");
    assert_eq!(body["type"], "post");
    assert_eq!(body["title"]["rendered"], "Hello World");
    assert_eq!(body["link"], "https://example.com/hello-world/");
    assert_eq!(body["categories"], serde_json::json!([10]));
    assert_eq!(body["tags"], serde_json::json!([20]));
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_post_by_url_nested_page() {
    let server = common::start_server(common::config()).await;

    let (status, _, body) = get(&server.url("/post-by-url/about/team")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 101);
    assert_eq!(body["link"], "https://example.com/about/team/");
}

#[tokio::test]
async fn test_post_by_url_not_found() {
    let server = common::start_server(common::config()).await;

    for route in [
        "/post-by-url/no-such-post",
        "/post-by-url/unpublished",
        "/post-by-url/category/news",
        "/post-by-url/https://evil.com/hello-world",
    ] {
        let (status, _, body) = get(&server.url(route)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "route {}", route);
        let err = error(body);
        assert_eq!(err.code, "no_post");
        assert_eq!(err.message, "Invalid url to post");
        assert_eq!(err.status, 404);
    }
}

#[tokio::test]
async fn test_type_by_url() {
    let server = common::start_server(common::config()).await;

    let (status, _, body) = get(&server.url("/type-by-url/about")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "page");

    let (status, _, body) = get(&server.url("/type-by-url/archives/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "post");

    let (status, _, body) = get(&server.url("/type-by-url/nothing-here")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error(body).code, "no_post");
}

#[tokio::test]
async fn test_url_to_query_category_listing() {
    let server = common::start_server(common::config()).await;

    let (status, headers, body) = get(&server.url("/url_to_query/category/news/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], QueryKind::Category.as_str());
    let ids: Vec<u64> = body["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(headers["x-wp-total"], "2");
    assert_eq!(headers["x-wp-totalpages"], "1");
}

#[tokio::test]
async fn test_url_to_query_pagination() {
    let server = common::start_server(common::config()).await;

    let (status, headers, body) = get(&server.url("/url_to_query/category/news?page=2&per_page=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["id"], 1);
    assert_eq!(headers["x-wp-total"], "2");
    assert_eq!(headers["x-wp-totalpages"], "2");

    let (status, _, body) = get(&server.url("/url_to_query/category/news?page=3&per_page=1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error(body).code, "no_post");
}

#[tokio::test]
async fn test_url_to_query_invalid_params() {
    let server = common::start_server(common::config()).await;

    for query in ["page=0", "per_page=0", "per_page=101", "page=abc"] {
        let url = format!("{}?{}", server.url("/url_to_query/category/news"), query);
        let (status, _, body) = get(&url).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {}", query);
        let err = error(body);
        assert_eq!(err.code, "rest_invalid_param");
        assert_eq!(err.status, 400);
    }
}

#[tokio::test]
async fn test_url_to_query_single_and_not_found() {
    let server = common::start_server(common::config()).await;

    let (status, headers, body) = get(&server.url("/url_to_query/hello-world")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "single");
    assert_eq!(body["posts"][0]["id"], 1);
    assert_eq!(headers["x-wp-total"], "1");

    let (status, _, body) = get(&server.url("/url_to_query/tag/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error(body).code, "no_post");
}

#[tokio::test]
async fn test_home_page_latest_posts() {
    let server = common::start_server(common::config()).await;

    let (status, headers, body) = get(&server.url("/home_page")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "home");
    assert_eq!(body["posts"].as_array().unwrap().len(), 2);
    assert_eq!(headers["x-wp-total"], "2");
}

#[tokio::test]
async fn test_home_page_static_page() {
    let mut config = common::config();
    config.site.show_on_front = headless_rest::config::ShowOnFront::Page;
    config.site.page_on_front = Some(100);
    let server = common::start_server(config).await;

    let (status, _, body) = get(&server.url("/home_page")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"][0]["id"], 100);
    assert_eq!(body["posts"][0]["link"], "https://example.com/");
}

#[tokio::test]
async fn test_menu_lookup() {
    let server = common::start_server(common::config()).await;

    for id in ["5", "main-menu", "Main%20Menu"] {
        let (status, _, body) = get(&server.url(&format!("/menu/{}", id))).await;
        assert_eq!(status, StatusCode::OK, "menu {}", id);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"], 50);
        assert_eq!(items[0]["type"], "post_type");
    }

    let (status, _, body) = get(&server.url("/menu/footer")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let err = error(body);
    assert_eq!(err.code, "no_menu");
    assert_eq!(err.message, "Menu with that id|name|slug doesn't exist");
}

#[tokio::test]
async fn test_unknown_route() {
    let server = common::start_server(common::config()).await;

    let (status, _, body) = get(&server.url("/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let err = error(body);
    assert_eq!(err.code, "rest_no_route");
    assert_eq!(err.status, 404);
}

#[tokio::test]
async fn test_config_reload_swaps_rules() {
    let server = common::start_server(common::config()).await;

    let (status, _, _) = get(&server.url("/post-by-url/p/hello-world")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut config = common::config();
    config.rewrite.rules = vec![RuleSpec::new("/p/([^/]+)/?", QueryKind::Single, "slug=$matches[1]")];
    server.config_updates.send(config).unwrap();

    let mut reloaded = false;
    for _ in 0..50 {
        let (status, _, body) = get(&server.url("/post-by-url/p/hello-world")).await;
        if status == StatusCode::OK {
            assert_eq!(body["id"], 1);
            reloaded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(reloaded, "new rule table never took effect");

    // An invalid config is rejected and the reloaded table stays.
    let mut broken = common::config();
    broken.rewrite.rules = vec![RuleSpec::new("/(unclosed", QueryKind::Single, "slug=$matches[1]")];
    server.config_updates.send(broken).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (status, _, _) = get(&server.url("/post-by-url/p/hello-world")).await;
    assert_eq!(status, StatusCode::OK);
}

/// Path part of a link the server produced, ready to send back.
fn site_path(link: &Value) -> String {
    let link = link.as_str().unwrap();
    link.strip_prefix("https://example.com").unwrap().to_string()
}

#[tokio::test]
async fn test_links_resolve_back_for_each_permalink_structure() {
    for structure in [
        "/%postname%/",
        "/%year%/%monthnum%/%day%/%postname%/",
        "/%year%/%monthnum%/%postname%/",
        "/%post_id%/",
        "/archives/%post_id%",
        "/%category%/%postname%/",
        "/%author%/%postname%/",
        "/%postname%.html",
    ] {
        let mut config = common::config();
        config.site.permalink_structure = structure.to_string();
        let server = common::start_server(config).await;

        for id in [1, 2, 100, 101] {
            let (status, _, body) = get(&server.url(&format!("/post-by-url/archives/{}", id))).await;
            assert_eq!(status, StatusCode::OK, "{} id {}", structure, id);

            let path = site_path(&body["link"]);
            let (status, _, body) = get(&server.url(&format!("/post-by-url{}", path))).await;
            assert_eq!(status, StatusCode::OK, "{} link {}", structure, path);
            assert_eq!(body["id"], id, "{} link {}", structure, path);

            let (status, _, body) = get(&server.url(&format!("/type-by-url{}", path))).await;
            assert_eq!(status, StatusCode::OK, "{} link {}", structure, path);
            assert_eq!(body, if id < 100 { "post" } else { "page" });
        }
    }
}

#[tokio::test]
async fn test_dated_link_with_wrong_date_is_not_found() {
    let mut config = common::config();
    config.site.permalink_structure = "/%year%/%monthnum%/%day%/%postname%/".to_string();
    let server = common::start_server(config).await;

    let (status, _, body) = get(&server.url("/post-by-url/2021/09/02/hello-world/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error(body).code, "no_post");
}

#[tokio::test]
async fn test_static_front_page_link_resolves_back() {
    let mut config = common::config();
    config.site.show_on_front = headless_rest::config::ShowOnFront::Page;
    config.site.page_on_front = Some(100);
    let server = common::start_server(config).await;

    let (_, _, home) = get(&server.url("/home_page")).await;
    assert_eq!(home["posts"][0]["link"], "https://example.com/");

    let (status, _, body) = get(&server.url("/post-by-url/https://example.com/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 100);

    let (status, _, body) = get(&server.url("/type-by-url/https://example.com/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "page");
}

#[tokio::test]
async fn test_latest_posts_front_page_is_not_a_post() {
    let server = common::start_server(common::config()).await;

    let (status, _, body) = get(&server.url("/post-by-url/https://example.com/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error(body).code, "no_post");
}

#[tokio::test]
async fn test_reload_keeps_home_page_and_links_in_agreement() {
    let server = common::start_server(common::config()).await;

    // Asks for a static home page; the store keeps listing posts until restart.
    let mut config = common::config();
    config.site.show_on_front = headless_rest::config::ShowOnFront::Page;
    config.site.page_on_front = Some(100);
    config.site.permalink_structure = "/%post_id%/".to_string();
    server.config_updates.send(config).unwrap();

    let mut reloaded = false;
    for _ in 0..50 {
        let (_, _, body) = get(&server.url("/post-by-url/archives/1")).await;
        if body["link"] == "https://example.com/1/" {
            reloaded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(reloaded, "new permalink structure never took effect");

    let (_, _, home) = get(&server.url("/home_page")).await;
    assert_eq!(home["posts"].as_array().unwrap().len(), 2);

    let (_, _, about) = get(&server.url("/post-by-url/about")).await;
    assert_eq!(about["link"], "https://example.com/about/");
}

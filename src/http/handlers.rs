//! `/headless/v1` endpoint handlers.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::content::store::MAX_PER_PAGE;
use crate::content::{ContentStore, MenuItem, Pagination, PostResponse, QueryResult};
use crate::http::error::ApiError;
use crate::http::request::request_id;
use crate::http::server::{AppState, SiteContext};
use crate::observability::metrics;
use crate::resolver::{QueryDescriptor, ResolveError};

/// Total matches across all pages.
pub const X_WP_TOTAL: &str = "x-wp-total";
/// Number of pages at the requested page size.
pub const X_WP_TOTAL_PAGES: &str = "x-wp-totalpages";

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageParams {
    fn pagination(
        query: Result<Query<PageParams>, QueryRejection>,
        default_per_page: u32,
    ) -> Result<Pagination, ApiError> {
        let Query(params) = query.map_err(|e| ApiError::InvalidParam(e.body_text()))?;
        let page = params.page.unwrap_or(1);
        let per_page = params.per_page.unwrap_or(default_per_page);
        if page == 0 {
            return Err(ApiError::InvalidParam("page must be at least 1".into()));
        }
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(ApiError::InvalidParam(format!(
                "per_page must be between 1 and {}",
                MAX_PER_PAGE
            )));
        }
        Ok(Pagination::new(page, per_page))
    }
}

/// Body of listing endpoints.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub posts: Vec<PostResponse>,
}

/// Resolve `url`, treating malformed or cross-site input as "no post".
fn resolve(site: &SiteContext, url: &str, headers: &HeaderMap) -> Result<QueryDescriptor, ApiError> {
    match site.resolver.resolve(url) {
        Ok(descriptor) => {
            metrics::record_resolution(descriptor.kind.as_str());
            tracing::debug!(
                request_id = %request_id(headers),
                url = %url,
                kind = %descriptor.kind,
                "URL resolved"
            );
            Ok(descriptor)
        }
        Err(ResolveError::InvalidUrl(_)) => {
            tracing::debug!(request_id = %request_id(headers), url = %url, "Rejected url");
            Err(ApiError::NoPost)
        }
        Err(e @ ResolveError::InvalidBase(_)) => Err(ApiError::Resolver(e)),
    }
}

/// The id of the single post a URL points at.
fn post_id_for_url(state: &AppState, url: &str, headers: &HeaderMap) -> Result<u64, ApiError> {
    let site = state.site.load_full();
    let descriptor = resolve(&site, url, headers)?;
    state.store.post_id_for(&descriptor)?.ok_or(ApiError::NoPost)
}

fn shape_all(site: &SiteContext, store: &dyn ContentStore, result: &QueryResult) -> Result<Vec<PostResponse>, ApiError> {
    result
        .items
        .iter()
        .map(|item| site.shaper.shape(item, store).map_err(ApiError::from))
        .collect()
}

fn listing_response(kind: &str, posts: Vec<PostResponse>, result: &QueryResult) -> Response {
    let mut response = Json(QueryResponse {
        kind: kind.to_string(),
        posts,
    })
    .into_response();
    let headers = response.headers_mut();
    headers.insert(HeaderName::from_static(X_WP_TOTAL), HeaderValue::from(result.total));
    headers.insert(HeaderName::from_static(X_WP_TOTAL_PAGES), HeaderValue::from(result.total_pages));
    response
}

/// `GET /headless/v1/type-by-url/{url}`
pub async fn type_by_url(
    State(state): State<AppState>,
    Path(url): Path<String>,
    headers: HeaderMap,
) -> Result<Json<String>, ApiError> {
    let id = post_id_for_url(&state, &url, &headers)?;
    let post_type = state.store.post_type_by_id(id)?.ok_or(ApiError::NoPost)?;
    Ok(Json(post_type))
}

/// `GET /headless/v1/post-by-url/{url}`
pub async fn post_by_url(
    State(state): State<AppState>,
    Path(url): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PostResponse>, ApiError> {
    let id = post_id_for_url(&state, &url, &headers)?;
    let item = state.store.post_by_id(id)?.ok_or(ApiError::NoPost)?;
    let site = state.site.load_full();
    Ok(Json(site.shaper.shape(&item, state.store.as_ref())?))
}

/// `GET /headless/v1/url_to_query/{url}?page=&per_page=`
pub async fn url_to_query(
    State(state): State<AppState>,
    Path(url): Path<String>,
    headers: HeaderMap,
    query: Result<Query<PageParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let site = state.site.load_full();
    let page = PageParams::pagination(query, site.posts_per_page)?;
    let descriptor = resolve(&site, &url, &headers)?;

    let result = state.store.query(&descriptor, &page)?;
    if !result.has_results() {
        return Err(ApiError::NoPost);
    }
    let posts = shape_all(&site, state.store.as_ref(), &result)?;
    Ok(listing_response(descriptor.kind.as_str(), posts, &result))
}

/// `GET /headless/v1/home_page?page=&per_page=`
pub async fn home_page(
    State(state): State<AppState>,
    query: Result<Query<PageParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let site = state.site.load_full();
    let page = PageParams::pagination(query, site.posts_per_page)?;

    let result = state.store.home_page(&page)?;
    if !result.has_results() {
        return Err(ApiError::NoPost);
    }
    let posts = shape_all(&site, state.store.as_ref(), &result)?;
    Ok(listing_response("home", posts, &result))
}

/// `GET /headless/v1/menu/{id}` where id is a menu id, name or slug.
pub async fn menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
    match state.store.menu_items(&id)? {
        Some(items) if !items.is_empty() => Ok(Json(items)),
        _ => Err(ApiError::NoMenu),
    }
}

/// Fallback for unknown routes.
pub async fn no_route() -> ApiError {
    ApiError::NoRoute
}

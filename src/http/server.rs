//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the `/headless/v1` handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics, headers)
//! - Bind server to listener
//! - Apply config reloads by swapping the site context
//! - Stop gracefully on the shutdown signal

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{build_resolver, ConfigError, HeadlessConfig};
use crate::content::{ContentStore, Shaper};
use crate::http::handlers;
use crate::http::request::{request_id, MakeRequestUuid};
use crate::observability::metrics;
use crate::resolver::Resolver;

/// Everything derived from the site configuration.
///
/// Replaced as a whole on reload; a request keeps the context it started with.
#[derive(Debug)]
pub struct SiteContext {
    pub resolver: Resolver,
    pub shaper: Shaper,
    pub posts_per_page: u32,
}

impl SiteContext {
    pub fn from_config(config: &HeadlessConfig) -> Result<Self, ConfigError> {
        let resolver = build_resolver(config)?;
        let shaper = Shaper::new(resolver.site().clone(), config.site.permalink_structure.clone());
        Ok(Self {
            resolver,
            shaper,
            posts_per_page: config.site.posts_per_page,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub site: Arc<ArcSwap<SiteContext>>,
    pub store: Arc<dyn ContentStore>,
}

/// HTTP server for the headless API.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: HeadlessConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and store.
    pub fn new(config: HeadlessConfig, store: Arc<dyn ContentStore>) -> Result<Self, ConfigError> {
        let site = SiteContext::from_config(&config)?;
        tracing::info!(
            base_url = %config.site.base_url,
            rules = site.resolver.rules().len(),
            "Site context built"
        );

        let state = AppState {
            site: Arc::new(ArcSwap::from_pointee(site)),
            store,
        };
        let router = Self::build_router(&config, state.clone());
        Ok(Self { router, state, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &HeadlessConfig, state: AppState) -> Router {
        Router::new()
            .route("/headless/v1/type-by-url/{*url}", get(handlers::type_by_url))
            .route("/headless/v1/post-by-url/{*url}", get(handlers::post_by_url))
            .route("/headless/v1/url_to_query/{*url}", get(handlers::url_to_query))
            .route("/headless/v1/home_page", get(handlers::home_page))
            .route("/headless/v1/menu/{id}", get(handlers::menu))
            .fallback(handlers::no_route)
            // Wraps the fallback too, so unmatched requests are counted.
            .layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id(request.headers()),
                        )
                    }))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(SetResponseHeaderLayer::if_not_present(
                        header::X_CONTENT_TYPE_OPTIONS,
                        HeaderValue::from_static("nosniff"),
                    )),
            )
    }

    /// The router, for serving or driving directly in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared state (site context and store).
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &HeadlessConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configs received on `config_updates` replace the site context.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<HeadlessConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::spawn(apply_config_updates(
            self.state.clone(),
            config_updates,
            shutdown.resubscribe(),
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Swap in a new site context for every valid config received.
///
/// Home page settings belong to the store and only change on restart.
async fn apply_config_updates(
    state: AppState,
    mut updates: mpsc::UnboundedReceiver<HeadlessConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            update = updates.recv() => {
                let Some(config) = update else { break };
                if config.site.front_page_id() != state.store.front_page_id() {
                    tracing::warn!(
                        page_on_front = ?config.site.front_page_id(),
                        "Home page settings changed; restart to apply them"
                    );
                }
                match SiteContext::from_config(&config) {
                    Ok(context) => {
                        tracing::info!(
                            base_url = %config.site.base_url,
                            rules = context.resolver.rules().len(),
                            "Site configuration reloaded"
                        );
                        state.site.store(Arc::new(context));
                        metrics::record_config_reload();
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected config update, keeping current configuration");
                    }
                }
            }
        }
    }
}

/// Record request count and latency per matched route.
async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&route, response.status().as_u16(), start);
    response
}

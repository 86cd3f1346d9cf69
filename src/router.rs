//! HTTP server and routing
//!
//! The same resource router is mounted twice:
//!
//! ```text
//! /WickrIO/V1/Apps/<api key>/...   legacy, key embedded in the path
//! /WickrIO/V2/Apps/...             current, key in the x-api-key header
//! ```
//!
//! Anything that matches neither (including a known path with an unknown
//! method) answers 404. A trailing slash is ignored, and every response
//! carries the usual browser hardening headers.

use axum::{
    Router, ServiceExt,
    body::Body,
    extract::{DefaultBodyLimit, OriginalUri},
    http::{HeaderName, HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::normalize_path::NormalizePath;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::attachments::AttachmentStore;
use crate::auth::authenticate;
use crate::backend::{BackendResult, MessagingBackend, with_timeout};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::handlers::{callbacks, directory, files, group_convo, messages, rooms, statistics};

/// Path prefix of the legacy namespace; the API key follows it
pub const V1_PREFIX: &str = "/WickrIO/V1/Apps";

/// Path prefix of the current namespace
pub const V2_PREFIX: &str = "/WickrIO/V2/Apps";

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub backend: Arc<dyn MessagingBackend>,
    pub attachments: AttachmentStore,
}

impl AppState {
    pub fn new(mut config: ApiConfig, backend: Arc<dyn MessagingBackend>) -> Self {
        let attachments = AttachmentStore::new(config.attachments_dir.clone());
        config.attachments_dir = attachments.dir().to_path_buf();
        Self {
            config: Arc::new(config),
            backend,
            attachments,
        }
    }

    /// Run a backend call under the configured timeout
    pub async fn call<F>(&self, command: &'static str, call: F) -> BackendResult
    where
        F: Future<Output = BackendResult>,
    {
        with_timeout(command, self.config.backend_timeout(), call).await
    }
}

/// Resource routes shared by both namespaces
fn resource_routes() -> Router<AppState> {
    Router::new()
        .route("/Messages", post(messages::send).get(messages::receive))
        .route(
            "/Messages/{vgroupid}/{message_id}",
            delete(messages::remove),
        )
        .route("/File", post(files::upload_and_send))
        .route(
            "/Statistics",
            get(statistics::get_statistics).delete(statistics::clear_statistics),
        )
        .route("/Rooms", post(rooms::create).get(rooms::list))
        .route(
            "/Rooms/{vgroupid}",
            get(rooms::get_one).post(rooms::modify).delete(rooms::remove),
        )
        .route(
            "/GroupConvo",
            post(group_convo::create).get(group_convo::list),
        )
        .route(
            "/GroupConvo/{vgroupid}",
            get(group_convo::get_one).delete(group_convo::remove),
        )
        .route(
            "/MsgRecvCallback",
            post(callbacks::set_callback)
                .get(callbacks::get_callback)
                .delete(callbacks::delete_callback),
        )
        .route("/Directory", get(directory::get_directory))
        .method_not_allowed_fallback(not_found)
}

/// Headers set on every response unless a handler already chose a value
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;form-action 'self';\
         frame-ancestors 'self';img-src 'self' data:;object-src 'none';script-src 'self';\
         script-src-attr 'none';style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Full application service: the router behind trailing-slash normalisation
pub type App = NormalizePath<Router>;

/// Build the router with both namespaces, auth and hardening headers
pub fn build_router(state: AppState) -> Router {
    let v1_prefix = format!("{}/{}", V1_PREFIX, state.config.api_key);
    let resources = resource_routes();

    let router = Router::new()
        .nest(&v1_prefix, resources.clone())
        .nest(V2_PREFIX, resources)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    SECURITY_HEADERS
        .iter()
        .fold(router, |router, &(name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            ))
        })
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Build the served application. `/Messages/` routes like `/Messages`.
pub fn build_app(state: AppState) -> App {
    // Must wrap the router: layers added with `Router::layer` run after routing
    NormalizePath::trim_trailing_slash(build_router(state))
}

/// Catch-all for unmatched paths and methods
async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    let url = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    ApiError::NotFound(url)
}

/// Middleware to log all incoming HTTP requests
async fn log_request(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("🌐 HTTP {} {}", method, path);

    let response = next.run(req).await;

    info!("📤 {} {} -> {}", method, path, response.status());

    response
}

/// Run the HTTP server until `shutdown` resolves
pub async fn run_server<F>(addr: SocketAddr, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Listening on {}", addr);
    axum::serve(listener, ServiceExt::<Request<Body>>::into_make_service(app))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

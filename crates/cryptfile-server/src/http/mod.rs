//! HTTP layer: routes, shared state and middleware

mod crypt;
mod error;
mod pages;
mod rate_limit;

use axum::{
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use cryptfile_core::{Limits, PasswordFileCipher};

pub use error::AppError;
pub use pages::CLIENT_ROUTES;
pub use rate_limit::RateLimiter;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub cipher: Arc<PasswordFileCipher>,
    pub limiter: Arc<RateLimiter>,
    pub limits: Limits,
    /// Directory holding the built client bundle
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(cipher: Arc<PasswordFileCipher>, limits: Limits, static_dir: PathBuf) -> Self {
        Self {
            cipher,
            limiter: Arc::new(RateLimiter::new(&limits)),
            limits,
            static_dir,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let not_found = {
        let page = state.static_dir.join("404.html");
        move || async move { pages::not_found(&page).await }
    };
    let assets = ServeDir::new(&state.static_dir).fallback(not_found.into_service());

    let crypt = Router::new()
        .route(
            "/crypt",
            post(crypt::crypt).layer(DefaultBodyLimit::max(crypt::body_limit(&state.limits))),
        )
        .route_layer(from_fn_with_state(state.clone(), rate_limit::enforce));

    let mut app = Router::new().route("/health", get(pages::health));
    for path in CLIENT_ROUTES {
        app = app.route(path, get(pages::index));
    }

    app.merge(crypt)
        .fallback_service(assets)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Diagnostics endpoints over the bootstrap read API.
//!
//! # Routes
//! - `GET /health`: health report, no auth (load balancer probes)
//! - `GET /admin/status`, `/admin/components`, `/admin/log`, `/admin/errors`:
//!   Bearer-authenticated

pub mod auth;
pub mod handlers;
pub mod server;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::bootstrap::Bootstrap;
use self::auth::admin_auth_middleware;
use self::handlers::*;

pub use server::serve;

/// State shared by the diagnostics handlers.
#[derive(Clone)]
pub struct AdminState {
    pub bootstrap: Arc<Bootstrap>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(bootstrap: Arc<Bootstrap>, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            bootstrap,
            api_key: api_key.into(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    let protected = Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/components", get(get_components))
        .route("/admin/log", get(get_log))
        .route("/admin/errors", get(get_errors))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .route("/health", get(get_health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub mod users;

use std::{any::Any, path::PathBuf};

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, Level};

use common::types::Health;
use configs::AppConfig;

use crate::errors::ApiError;
pub use users::ServerState;

/// Router knobs taken from the application config.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub frontend_dir: PathBuf,
    pub expose_debug_routes: bool,
}

impl RouterConfig {
    pub fn from_app(cfg: &AppConfig) -> Self {
        Self {
            frontend_dir: cfg.frontend.dir.clone(),
            expose_debug_routes: cfg.server.expose_debug_routes,
        }
    }
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Unknown `/api/*` paths and unsupported methods answer JSON, never HTML.
async fn api_not_found() -> ApiError {
    ApiError::NotFound
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!(%detail, "handler panicked");
    ApiError::Internal(detail).into_response()
}

/// Build the full application router: JSON API under `/api`, static bundle everywhere else.
pub fn build_router(state: ServerState, cors: CorsLayer, cfg: &RouterConfig) -> Router {
    let mut api = Router::new()
        .route("/health", get(health).fallback(api_not_found))
        .route("/register", post(users::register).fallback(api_not_found))
        .route("/login", post(users::login).fallback(api_not_found))
        .route("/user", get(users::current_user).fallback(api_not_found));
    if cfg.expose_debug_routes {
        api = api.route("/_debug/users", get(users::debug_users).fallback(api_not_found));
    }
    let api = api
        .fallback(api_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .fallback_service(ServeDir::new(&cfg.frontend_dir))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

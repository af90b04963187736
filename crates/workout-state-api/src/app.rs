use std::time::Duration;

use axum::Router;
use axum::http::{Method, header};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::CorsOrigin;
use crate::routes;
use crate::state::AppState;

/// Preflight responses may be cached by browsers for 10 minutes.
const CORS_MAX_AGE: Duration = Duration::from_secs(600);

/// HTTP-level settings applied around the routes.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub cors_origin: CorsOrigin,
    pub request_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            cors_origin: CorsOrigin::Any,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Build the application router with its middleware stack.
pub fn build_router(state: AppState, options: &HttpOptions) -> Router {
    Router::new()
        .route("/", get(routes::index_handler))
        .route("/workout-state/{workout_code}", get(routes::get_state_handler))
        .route(
            "/workout-state/{workout_code}/",
            post(routes::missing_api_key_handler),
        )
        .route(
            "/workout-state/{workout_code}/{api_key}",
            post(routes::set_state_handler),
        )
        .layer(cors_layer(&options.cors_origin))
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &CorsOrigin) -> CorsLayer {
    // A literal `*` cannot be combined with credentials.
    let allow_origin = match origin {
        CorsOrigin::Any => AllowOrigin::mirror_request(),
        CorsOrigin::Exact(value) => AllowOrigin::exact(value.clone()),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
}

pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod routes;
pub mod state;

pub use app::{HttpOptions, build_router};
pub use config::Config;
pub use errors::ApiError;
pub use state::AppState;

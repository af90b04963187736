use std::sync::Arc;

use workout_state_core::WorkoutStore;

/// Shared application state passed to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Store handle created once at startup and shared by every request.
    pub store: Arc<dyn WorkoutStore>,
}

impl AppState {
    pub fn new(store: impl WorkoutStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

pub mod db;
pub mod error;
pub mod memory;
pub mod model;
pub mod validate;

pub use db::{DynamoStore, WorkoutStore};
pub use error::CoreError;
pub use memory::InMemoryStore;
pub use model::{ApiKeyRecord, STATE_TTL_SECS, WorkoutCode, WorkoutState, WorkoutStateRecord};
pub use validate::{StateValidationError, is_timezone_aware_iso8601, parse_workout_state};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::db::WorkoutStore;
use crate::error::CoreError;
use crate::model::{ApiKeyRecord, WorkoutCode, WorkoutStateRecord};

#[derive(Default)]
struct Tables {
    states: HashMap<String, WorkoutStateRecord>,
    api_keys: HashMap<String, ApiKeyRecord>,
}

/// Process-local [`WorkoutStore`] with the same key layout and expiry
/// semantics as the DynamoDB table. Clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision an API key for `code`, replacing any previous one.
    pub fn insert_api_key(
        &self,
        code: &WorkoutCode,
        api_key: impl Into<String>,
    ) -> Result<(), CoreError> {
        let record = ApiKeyRecord::new(code, api_key);
        self.lock()?.api_keys.insert(record.key.clone(), record);
        Ok(())
    }

    /// The raw state record for `code`, ignoring expiry.
    pub fn state_record(&self, code: &WorkoutCode) -> Option<WorkoutStateRecord> {
        self.lock()
            .ok()
            .and_then(|tables| tables.states.get(&code.state_key()).cloned())
    }

    /// The raw API key record for `code`.
    pub fn api_key_record(&self, code: &WorkoutCode) -> Option<ApiKeyRecord> {
        self.lock()
            .ok()
            .and_then(|tables| tables.api_keys.get(&code.api_key_key()).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, CoreError> {
        self.tables
            .lock()
            .map_err(|_| CoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl WorkoutStore for InMemoryStore {
    async fn get_state(
        &self,
        code: &WorkoutCode,
        now: i64,
    ) -> Result<Option<WorkoutStateRecord>, CoreError> {
        let tables = self.lock()?;
        Ok(tables
            .states
            .get(&code.state_key())
            .filter(|record| !record.is_expired(now))
            .cloned())
    }

    async fn put_state(&self, record: &WorkoutStateRecord) -> Result<(), CoreError> {
        self.lock()?.states.insert(record.key.clone(), record.clone());
        Ok(())
    }

    async fn delete_state(&self, code: &WorkoutCode) -> Result<(), CoreError> {
        self.lock()?.states.remove(&code.state_key());
        Ok(())
    }

    async fn get_api_key(&self, code: &WorkoutCode) -> Result<Option<ApiKeyRecord>, CoreError> {
        Ok(self.lock()?.api_keys.get(&code.api_key_key()).cloned())
    }
}

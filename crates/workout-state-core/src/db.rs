use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{ApiKeyRecord, WorkoutCode, WorkoutStateRecord};

/// Partition key attribute of the cache table.
const KEY_ATTRIBUTE: &str = "key";

/// The persistence contract the API depends on: get/put/delete by exact key.
///
/// API key records are read-only through this trait.
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// Fetch the state for `code`. Records past their TTL at `now` are
    /// reported as absent.
    async fn get_state(
        &self,
        code: &WorkoutCode,
        now: i64,
    ) -> Result<Option<WorkoutStateRecord>, CoreError>;

    /// Create or overwrite the state record.
    async fn put_state(&self, record: &WorkoutStateRecord) -> Result<(), CoreError>;

    /// Remove the state for `code`. Removing an absent record succeeds.
    async fn delete_state(&self, code: &WorkoutCode) -> Result<(), CoreError>;

    /// Fetch the API key guarding writes to `code`.
    async fn get_api_key(&self, code: &WorkoutCode) -> Result<Option<ApiKeyRecord>, CoreError>;
}

/// DynamoDB-backed store over a single table keyed by the string attribute
/// `key`, with TTL enabled on the `ttl` attribute.
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
    table_name: String,
}

impl DynamoStore {
    /// Create a new `DynamoStore` by loading AWS configuration from the
    /// environment and constructing a DynamoDB client.
    pub async fn new(table_name: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::from_client(Client::new(&config), table_name)
    }

    pub fn from_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// The DynamoDB table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Store an API key record. Only the provisioning tool calls this.
    pub async fn put_api_key(&self, record: &ApiKeyRecord) -> Result<(), CoreError> {
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(record)?;
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;
        Ok(())
    }

    async fn get_item<T>(&self, key: String) -> Result<Option<T>, CoreError>
    where
        T: serde::de::DeserializeOwned,
    {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, AttributeValue::S(key))
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;

        match output.item {
            Some(item) => Ok(Some(serde_dynamo::from_item(item)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl WorkoutStore for DynamoStore {
    async fn get_state(
        &self,
        code: &WorkoutCode,
        now: i64,
    ) -> Result<Option<WorkoutStateRecord>, CoreError> {
        let record: Option<WorkoutStateRecord> = self.get_item(code.state_key()).await?;

        // The TTL sweep runs lazily, so expired items can still be returned.
        match record {
            Some(r) if r.is_expired(now) => {
                debug!(workout_code = %code, ttl = r.ttl, "ignoring expired workout state");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn put_state(&self, record: &WorkoutStateRecord) -> Result<(), CoreError> {
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(record)?;
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;
        Ok(())
    }

    async fn delete_state(&self, code: &WorkoutCode) -> Result<(), CoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, AttributeValue::S(code.state_key()))
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;
        Ok(())
    }

    async fn get_api_key(&self, code: &WorkoutCode) -> Result<Option<ApiKeyRecord>, CoreError> {
        self.get_item(code.api_key_key()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorkoutState;

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    #[test]
    fn state_item_layout() {
        let code = WorkoutCode::new("abc");
        let state = WorkoutState {
            start_date_time: "2025-01-01T00:00:00+00:00".into(),
        };
        let record = WorkoutStateRecord::new(&code, state, 1_700_000_000);

        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(&record).unwrap();

        let expected = HashMap::from([
            ("key".to_string(), s("workout-state:abc")),
            (
                "state".to_string(),
                AttributeValue::M(HashMap::from([(
                    "startDateTime".to_string(),
                    s("2025-01-01T00:00:00+00:00"),
                )])),
            ),
            ("ttl".to_string(), AttributeValue::N("1701209600".to_string())),
        ]);
        assert_eq!(item, expected);
        assert_eq!(item[KEY_ATTRIBUTE], s(&code.state_key()));
    }

    #[test]
    fn state_item_reads_back() {
        let item = HashMap::from([
            ("key".to_string(), s("workout-state:abc")),
            (
                "state".to_string(),
                AttributeValue::M(HashMap::from([(
                    "startDateTime".to_string(),
                    s("2025-01-01T00:00:00Z"),
                )])),
            ),
            ("ttl".to_string(), AttributeValue::N("1701209600".to_string())),
        ]);

        let record: WorkoutStateRecord = serde_dynamo::from_item(item).unwrap();

        assert_eq!(record.state.start_date_time, "2025-01-01T00:00:00Z");
        assert_eq!(record.ttl, 1_701_209_600);
    }

    #[test]
    fn api_key_item_round_trip() {
        let code = WorkoutCode::new("abc");
        let mut record = ApiKeyRecord::new(&code, "s3cret");
        record.description = Some("gym tv".into());
        record.created_at = Some(1_700_000_000);

        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(&record).unwrap();
        assert_eq!(item["key"], s("api-key:abc"));
        assert_eq!(item["api_key"], s("s3cret"));
        assert_eq!(item["created_at"], AttributeValue::N("1700000000".to_string()));

        let back: ApiKeyRecord = serde_dynamo::from_item(item).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn api_key_item_without_metadata_omits_it() {
        let record = ApiKeyRecord::new(&WorkoutCode::new("abc"), "s3cret");

        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(&record).unwrap();

        assert_eq!(item.len(), 2);
    }

    #[test]
    fn api_key_item_without_key_attribute_reads_as_empty() {
        let item = HashMap::from([("key".to_string(), s("api-key:abc"))]);

        let record: ApiKeyRecord = serde_dynamo::from_item(item).unwrap();

        assert_eq!(record.api_key, "");
        assert_eq!(record.created_at, None);
    }
}

use log::{error, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::collection_repository::CollectionRepository;
use crate::domain::search::{GraphQLResponse, SearchRequest};
use crate::error::SeedError;

/// Runs similarity searches and turns the raw envelope into typed rows.
pub struct QueryRunner {
    repository: Arc<dyn CollectionRepository>,
}

impl QueryRunner {
    pub fn new(repository: Arc<dyn CollectionRepository>) -> Self {
        Self { repository }
    }

    /// Searches `request.class_name` for rows near `request.concepts`, optionally moved
    /// toward secondary concepts and restricted by a `where` filter.
    ///
    /// Rows come back in the service's ranking order (ascending distance).
    pub async fn search_by_concept<T: DeserializeOwned>(&self, request: &SearchRequest) -> Result<Vec<T>, SeedError> {
        request.validate()?;
        info!(
            "Searching '{}' for {:?} (move_to: {:?}, filter: {:?})",
            request.class_name, request.concepts, request.move_to, request.filter
        );

        let envelope = self.repository.get(request).await?;
        let rows = extract_rows(envelope, &request.class_name)?;
        let count = rows.len();
        let typed: Vec<T> = serde_json::from_value(Value::Array(rows)).map_err(|e| {
            error!("Failed to decode {} rows of '{}': {}", count, request.class_name, e);
            SeedError::Decode(e)
        })?;

        info!("Search returned {} rows.", typed.len());
        Ok(typed)
    }
}

/// Pulls `data.Get.<class_name>` out of the envelope. Query errors win over any data.
pub fn extract_rows(envelope: GraphQLResponse, class_name: &str) -> Result<Vec<Value>, SeedError> {
    if !envelope.errors.is_empty() {
        for e in &envelope.errors {
            error!("Query error: {}", e.message);
        }
        return Err(SeedError::Query(envelope.errors));
    }

    let mut data = envelope
        .data
        .ok_or_else(|| SeedError::MissingPayload("response has no data".to_string()))?;
    let rows = data
        .get_mut("Get")
        .and_then(|get| get.get_mut(class_name))
        .map(Value::take)
        .ok_or_else(|| SeedError::MissingPayload(format!("no Get.{} in response data", class_name)))?;

    match rows {
        Value::Array(rows) => Ok(rows),
        other => Err(SeedError::MissingPayload(format!(
            "Get.{} is not a list (found {})",
            class_name,
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

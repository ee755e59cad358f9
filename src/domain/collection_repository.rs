use async_trait::async_trait;

use crate::domain::collection::{BatchSummary, CollectionDescriptor, ConsistencyLevel, Record};
use crate::domain::search::{GraphQLResponse, SearchRequest};
use crate::error::SeedError;

/// Remote operations on a vector collection service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionRepository: Send + Sync {
    /// Deletes a collection. A missing collection surfaces as an error for which
    /// `SeedError::is_not_found` is true.
    async fn delete_collection(&self, class_name: &str) -> Result<(), SeedError>;

    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<(), SeedError>;

    /// Inserts records in one batch and reports per-object failures.
    async fn batch_insert(
        &self,
        records: &[Record],
        consistency: ConsistencyLevel,
    ) -> Result<BatchSummary, SeedError>;

    /// Runs a `Get` query and returns the raw envelope without interpreting it.
    async fn get(&self, request: &SearchRequest) -> Result<GraphQLResponse, SeedError>;
}

use log::{error, info, warn};
use std::sync::Arc;

use crate::domain::collection::{BatchSummary, CollectionDescriptor, ConsistencyLevel, Record, ResetOutcome};
use crate::domain::collection_repository::CollectionRepository;
use crate::error::SeedError;

/// Outcome of each seeding step; a failed step keeps its error.
#[derive(Debug)]
pub struct SeedReport {
    pub reset: Result<ResetOutcome, SeedError>,
    pub created: Result<(), SeedError>,
    pub loaded: Result<BatchSummary, SeedError>,
}

impl SeedReport {
    pub fn inserted(&self) -> usize {
        match &self.loaded {
            Ok(summary) => summary.succeeded,
            _ => 0,
        }
    }
}

/// Resets a collection and bulk-loads records into it.
pub struct SchemaSeeder {
    repository: Arc<dyn CollectionRepository>,
}

impl SchemaSeeder {
    pub fn new(repository: Arc<dyn CollectionRepository>) -> Self {
        Self { repository }
    }

    /// Deletes the collection; an absent collection counts as success.
    pub async fn reset_collection(&self, class_name: &str) -> Result<ResetOutcome, SeedError> {
        match self.repository.delete_collection(class_name).await {
            Ok(()) => {
                info!("Deleted collection '{}'.", class_name);
                Ok(ResetOutcome::Deleted)
            }
            Err(e) if e.is_not_found() => {
                info!("Collection '{}' did not exist, nothing to delete.", class_name);
                Ok(ResetOutcome::Absent)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<(), SeedError> {
        descriptor.validate()?;
        info!(
            "Creating collection '{}' (vectorizer {}, {} properties)...",
            descriptor.class_name,
            descriptor.vectorizer,
            descriptor.properties.len()
        );
        self.repository.create_collection(descriptor).await?;
        info!("Created collection '{}'.", descriptor.class_name);
        Ok(())
    }

    /// Submits all records as one batch. Per-object failures are logged and returned
    /// in the summary; only a failure of the whole call is an `Err`.
    pub async fn load_records(
        &self,
        records: &[Record],
        consistency: ConsistencyLevel,
    ) -> Result<BatchSummary, SeedError> {
        if records.is_empty() {
            info!("No records provided for batch insert.");
            return Ok(BatchSummary::default());
        }

        info!("Inserting {} records with consistency level {}...", records.len(), consistency);
        let summary = self.repository.batch_insert(records, consistency).await?;

        for failure in &summary.failures {
            error!(
                "Record #{} (id {}) was rejected: {}",
                failure.index,
                failure.id.as_deref().unwrap_or("-"),
                failure.messages.join("; ")
            );
        }
        if summary.is_complete() {
            info!("Inserted {} records.", summary.succeeded);
        } else {
            warn!(
                "Batch insert partially failed: {}/{} records accepted.",
                summary.succeeded, summary.submitted
            );
        }
        Ok(summary)
    }

    /// Reset, create, load. A rejected create does not stop the load, but a descriptor
    /// that fails local validation means no create was issued, so nothing is inserted.
    pub async fn seed(
        &self,
        descriptor: &CollectionDescriptor,
        records: &[Record],
        consistency: ConsistencyLevel,
    ) -> SeedReport {
        let reset = self.reset_collection(&descriptor.class_name).await;
        if let Err(e) = &reset {
            warn!("Failed to reset collection '{}': {}", descriptor.class_name, e);
        }

        let created = self.create_collection(descriptor).await;
        if let Err(e) = &created {
            error!("Failed to create collection '{}': {}", descriptor.class_name, e);
        }

        let loaded = match &created {
            Err(SeedError::InvalidDescriptor(_)) => Err(SeedError::InvalidDescriptor(format!(
                "create for '{}' was not issued, skipping {} records",
                descriptor.class_name,
                records.len()
            ))),
            _ => self.load_records(records, consistency).await,
        };
        if let Err(e) = &loaded {
            error!("Batch insert into '{}' failed: {}", descriptor.class_name, e);
        }

        SeedReport { reset, created, loaded }
    }
}

//! Connect → Seed → Query, with non-fatal failures logged where they happen.

use log::{error, info, warn};
use std::fmt;
use std::sync::Arc;

use crate::application::query_runner::QueryRunner;
use crate::application::schema_seeder::{SchemaSeeder, SeedReport};
use crate::config::AppConfig;
use crate::domain::collection_repository::CollectionRepository;
use crate::domain::search::Book;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Reset,
    Create,
    Load,
    Query,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Reset => "reset",
            Step::Create => "create",
            Step::Load => "load",
            Step::Query => "query",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepFailure {
    pub step: Step,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{} step failed ({}): {}", self.step, level, self.message)
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub seed: SeedReport,
    pub results: Vec<Book>,
    pub failures: Vec<StepFailure>,
}

impl RunReport {
    /// 0 unless `strict` is set and an error-severity step failed.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if strict && self.failures.iter().any(|f| f.severity == Severity::Error) {
            1
        } else {
            0
        }
    }
}

pub async fn run_workflow(config: &AppConfig, repository: Arc<dyn CollectionRepository>) -> RunReport {
    let class_name = &config.collection.class_name;
    let descriptor = config.collection.to_descriptor();
    let records = config.seed.to_records(class_name);

    let seeder = SchemaSeeder::new(repository.clone());
    let seed = seeder.seed(&descriptor, &records, config.seed.consistency_level).await;

    let mut failures = Vec::new();
    if let Err(e) = &seed.reset {
        failures.push(StepFailure { step: Step::Reset, severity: Severity::Warning, message: e.to_string() });
    }
    if let Err(e) = &seed.created {
        failures.push(StepFailure { step: Step::Create, severity: Severity::Error, message: e.to_string() });
    }
    match &seed.loaded {
        Ok(summary) if !summary.is_complete() => failures.push(StepFailure {
            step: Step::Load,
            severity: Severity::Error,
            message: format!(
                "{} of {} records rejected",
                summary.submitted - summary.succeeded,
                summary.submitted
            ),
        }),
        Ok(_) => {}
        Err(e) => {
            failures.push(StepFailure { step: Step::Load, severity: Severity::Error, message: e.to_string() })
        }
    }

    let request = config.query.to_request(class_name);
    let runner = QueryRunner::new(repository);
    let results = match runner.search_by_concept::<Book>(&request).await {
        Ok(books) => books,
        Err(e) => {
            error!("Search on '{}' aborted: {}", class_name, e);
            failures.push(StepFailure { step: Step::Query, severity: Severity::Error, message: e.to_string() });
            Vec::new()
        }
    };

    if failures.is_empty() {
        info!("Workflow finished: {} inserted, {} results.", seed.inserted(), results.len());
    } else {
        for failure in &failures {
            warn!("Step '{}' finished with {:?}: {}", failure.step, failure.severity, failure.message);
        }
    }

    RunReport { seed, results, failures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collection::BatchSummary;
    use crate::domain::collection_repository::MockCollectionRepository;
    use crate::domain::search::{GraphQLError, GraphQLResponse};
    use crate::error::SeedError;
    use serde_json::json;

    fn accepting_repo() -> MockCollectionRepository {
        let mut repo = MockCollectionRepository::new();
        repo.expect_delete_collection()
            .returning(|_| Err(SeedError::Remote { status: 404, message: String::new() }));
        repo.expect_create_collection().returning(|_| Ok(()));
        repo.expect_batch_insert().returning(|records, _| {
            Ok(BatchSummary { submitted: records.len(), succeeded: records.len(), failures: vec![] })
        });
        repo
    }

    #[tokio::test]
    async fn test_clean_run_uses_default_configuration() {
        let mut repo = accepting_repo();
        repo.expect_get()
            .withf(|request| {
                request.class_name == "Book"
                    && request.concepts == vec!["Hello".to_string()]
                    && request.filter.is_some()
            })
            .returning(|_| {
                Ok(GraphQLResponse {
                    data: Some(json!({ "Get": { "Book": [
                        { "title": "Hello World Blue", "_additional": { "id": "1", "distance": 0.1 } },
                        { "title": "Hello World Red", "_additional": { "id": "2", "distance": 0.2 } }
                    ] } })),
                    errors: vec![],
                })
            });

        let report = run_workflow(&AppConfig::default(), Arc::new(repo)).await;
        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert_eq!(report.seed.inserted(), 3);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.exit_code(true), 0);
    }

    #[tokio::test]
    async fn test_query_errors_are_reported_but_not_fatal() {
        let mut repo = accepting_repo();
        repo.expect_get().returning(|_| {
            Ok(GraphQLResponse {
                data: None,
                errors: vec![GraphQLError { message: "unknown field".to_string(), ..Default::default() }],
            })
        });

        let report = run_workflow(&AppConfig::default(), Arc::new(repo)).await;
        assert!(report.results.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].step, Step::Query);
        assert_eq!(report.exit_code(false), 0);
        assert_eq!(report.exit_code(true), 1);
    }

    #[tokio::test]
    async fn test_reset_failure_is_only_a_warning() {
        let mut repo = MockCollectionRepository::new();
        repo.expect_delete_collection()
            .returning(|_| Err(SeedError::Remote { status: 503, message: "unavailable".to_string() }));
        repo.expect_create_collection().returning(|_| Ok(()));
        repo.expect_batch_insert().returning(|records, _| {
            Ok(BatchSummary { submitted: records.len(), succeeded: records.len(), failures: vec![] })
        });
        repo.expect_get().returning(|_| {
            Ok(GraphQLResponse { data: Some(json!({ "Get": { "Book": [] } })), errors: vec![] })
        });

        let report = run_workflow(&AppConfig::default(), Arc::new(repo)).await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].severity, Severity::Warning);
        assert_eq!(report.exit_code(true), 0);
    }

    #[test]
    fn test_step_failure_summary_line() {
        let failure = StepFailure {
            step: Step::Load,
            severity: Severity::Error,
            message: "1 of 3 records rejected".to_string(),
        };
        assert_eq!(failure.to_string(), "load step failed (error): 1 of 3 records rejected");
    }
}

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod workflow;

/// Re-export necessary items for main.rs and tests
pub use application::query_runner::QueryRunner;
pub use application::schema_seeder::{SchemaSeeder, SeedReport};
pub use config::{load_config, AppConfig};
pub use domain::collection_repository::CollectionRepository;
pub use error::SeedError;
pub use infrastructure::weaviate::WeaviateClient;
pub use workflow::{run_workflow, RunReport};

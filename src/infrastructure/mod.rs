pub mod graphql;
pub mod weaviate;

// Re-export key types for easier access from the application layer
pub use weaviate::{Scheme, WeaviateClient};

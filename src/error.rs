//! Error type shared by the client, seeder and query runner.

use thiserror::Error;

use crate::domain::search::GraphQLError;

/// Failures surfaced while talking to the vector collection service.
#[derive(Error, Debug)]
pub enum SeedError {
    /// The client handle could not be constructed (bad host/scheme, TLS setup).
    #[error("Failed to build connection to {target}: {reason}")]
    Connection { target: String, reason: String },

    /// Transport-level failure (connect refused, timeout, unreadable body).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Service rejected request ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The call was aborted through its cancellation token.
    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid collection descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Invalid search request: {0}")]
    InvalidQuery(String),

    /// The GraphQL envelope carried query-level errors; data was not decoded.
    #[error("Query returned {} error(s): {}", .0.len(), join_messages(.0))]
    Query(Vec<GraphQLError>),

    /// The envelope had no errors but the expected data path was absent.
    #[error("Missing or invalid result payload: {0}")]
    MissingPayload(String),

    /// The payload could not be converted into the typed record shape.
    #[error("Failed to decode result rows: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SeedError {
    /// True for responses that mean "the collection does not exist".
    /// Only client errors qualify; a 5xx is a failure whatever its message says.
    pub fn is_not_found(&self) -> bool {
        match self {
            SeedError::Remote { status: 404, .. } => true,
            SeedError::Remote { status: 400..=499, message } => {
                let lower = message.to_lowercase();
                lower.contains("not found") || lower.contains("could not find")
            }
            _ => false,
        }
    }
}

fn join_messages(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

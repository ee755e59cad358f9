use async_trait::async_trait;

use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::graphql::render_get_query;
use crate::config::ConnectionConfig;
use crate::domain::collection::{BatchFailure, BatchSummary, CollectionDescriptor, ConsistencyLevel, Record};
use crate::domain::collection_repository::CollectionRepository;
use crate::domain::search::{GraphQLResponse, SearchRequest};
use crate::error::SeedError;

mod wire {
    use serde::{Deserialize, Serialize};
    use serde_json::Value;

    use crate::domain::collection::Record;

    #[derive(Serialize)]
    pub struct BatchRequest<'a> {
        pub objects: &'a [Record],
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct BatchObjectResponse {
        #[serde(default)]
        pub id: Option<String>,
        #[serde(default)]
        pub result: Option<BatchObjectResult>,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct BatchObjectResult {
        #[serde(default)]
        pub errors: Option<ErrorList>,
    }

    /// Weaviate's `{"error": [{"message": ...}]}` body, used by REST errors too.
    #[derive(Deserialize, Debug, Default)]
    pub struct ErrorList {
        #[serde(default)]
        pub error: Vec<ErrorMessage>,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct ErrorMessage {
        #[serde(default)]
        pub message: String,
    }

    #[derive(Serialize)]
    pub struct GraphQLRequest {
        pub query: String,
    }

    pub fn messages(body: &Value) -> Option<String> {
        let list: ErrorList = serde_json::from_value(body.clone()).ok()?;
        if list.error.is_empty() {
            return None;
        }
        Some(list.error.into_iter().map(|e| e.message).collect::<Vec<_>>().join("; "))
    }
}

/// Transport scheme of the service endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Handle to a Weaviate-compatible service, cheap to clone and safe to reuse.
#[derive(Clone, Debug)]
pub struct WeaviateClient {
    http: Client,
    base_url: Url,
    cancel: CancellationToken,
}

impl WeaviateClient {
    /// Builds the handle. No request is sent until the first operation.
    pub fn connect(config: &ConnectionConfig) -> Result<Self, SeedError> {
        let target = format!("{}://{}", config.scheme.as_str(), config.host);
        if config.host.trim().is_empty() {
            return Err(SeedError::Connection { target, reason: "host cannot be empty".to_string() });
        }
        let base_url = Url::parse(&format!("{}/", target.trim_end_matches('/')))
            .map_err(|e| SeedError::Connection { target: target.clone(), reason: e.to_string() })?;
        if base_url.host_str().is_none() {
            return Err(SeedError::Connection { target, reason: "missing host".to_string() });
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| SeedError::Connection { target: target.clone(), reason: e.to_string() })?;

        log::info!("Client configured for {}", base_url);
        Ok(Self { http, base_url, cancel: CancellationToken::new() })
    }

    /// Ties every call made through this handle to `token`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, SeedError> {
        self.base_url.join(path).map_err(|e| SeedError::Connection {
            target: self.base_url.to_string(),
            reason: format!("invalid endpoint '{}': {}", path, e),
        })
    }

    /// Races `call` against the cancellation token.
    async fn guarded<T, F>(&self, call: F) -> Result<T, SeedError>
    where
        F: Future<Output = Result<T, SeedError>>,
    {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(SeedError::Cancelled),
            result = call => result,
        }
    }

    /// Maps a non-success response to `SeedError::Remote`, reading the body for detail.
    async fn check(response: Response) -> Result<Response, SeedError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|body| wire::messages(&body))
            .unwrap_or(text);
        Err(SeedError::Remote { status: status.as_u16(), message })
    }
}

#[async_trait]
impl CollectionRepository for WeaviateClient {
    async fn delete_collection(&self, class_name: &str) -> Result<(), SeedError> {
        let url = self.endpoint(&format!("v1/schema/{}", class_name))?;
        log::debug!("DELETE {}", url);
        self.guarded(async {
            let response = self.http.delete(url).send().await?;
            Self::check(response).await?;
            Ok(())
        })
        .await
    }

    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<(), SeedError> {
        let url = self.endpoint("v1/schema")?;
        log::debug!("POST {} class={}", url, descriptor.class_name);
        self.guarded(async {
            let response = self.http.post(url).json(descriptor).send().await?;
            Self::check(response).await?;
            Ok(())
        })
        .await
    }

    async fn batch_insert(
        &self,
        records: &[Record],
        consistency: ConsistencyLevel,
    ) -> Result<BatchSummary, SeedError> {
        let url = self.endpoint("v1/batch/objects")?;
        log::debug!("POST {} ({} objects, consistency {})", url, records.len(), consistency);
        let items: Vec<wire::BatchObjectResponse> = self
            .guarded(async {
                let response = self
                    .http
                    .post(url)
                    .query(&[("consistency_level", consistency.as_str())])
                    .json(&wire::BatchRequest { objects: records })
                    .send()
                    .await?;
                let response = Self::check(response).await?;
                Ok(response.json().await?)
            })
            .await?;

        let mut summary = BatchSummary { submitted: records.len(), ..Default::default() };
        for (index, item) in items.into_iter().enumerate() {
            let messages: Vec<String> = item
                .result
                .and_then(|r| r.errors)
                .map(|list| list.error.into_iter().map(|e| e.message).collect())
                .unwrap_or_default();
            if messages.is_empty() {
                summary.succeeded += 1;
            } else {
                summary.failures.push(BatchFailure { index, id: item.id, messages });
            }
        }
        Ok(summary)
    }

    async fn get(&self, request: &SearchRequest) -> Result<GraphQLResponse, SeedError> {
        let url = self.endpoint("v1/graphql")?;
        let query = render_get_query(request);
        log::debug!("POST {} query={}", url, query);
        self.guarded(async {
            let response = self.http.post(url).json(&wire::GraphQLRequest { query }).send().await?;
            // GraphQL errors arrive with 200; other statuses are transport-level rejections.
            if response.status() == StatusCode::OK {
                return Ok(response.json::<GraphQLResponse>().await?);
            }
            Self::check(response).await?;
            Ok(GraphQLResponse::default())
        })
        .await
    }
}

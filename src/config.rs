use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::PathBuf;

use crate::domain::collection::{CollectionDescriptor, ConsistencyLevel, PropertyDefinition, Record};
use crate::domain::search::{Field, MoveParameters, SearchRequest, WhereFilter};
pub use crate::infrastructure::weaviate::Scheme;

pub const CONFIG_PATH_ENV: &str = "VECSEED_CONFIG_PATH";
const CONFIG_FILENAME: &str = "vecseed.toml";
const ENV_PREFIX: &str = "VECSEED_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    /// `host[:port]`, without scheme.
    pub host: String,
    pub scheme: Scheme,
    /// Per-call deadline; unset means no client-side timeout.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { host: "localhost:8080".to_string(), scheme: Scheme::Http, request_timeout_secs: None }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CollectionConfig {
    pub class_name: String,
    pub description: String,
    pub vectorizer: String,
    /// Options for the vectorizer module, sent as `moduleConfig.<vectorizer>`.
    pub vectorizer_options: Map<String, Value>,
    pub properties: Vec<PropertyDefinition>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            class_name: "Book".to_string(),
            description: "all books I have".to_string(),
            vectorizer: "text2vec-transformers".to_string(),
            vectorizer_options: Map::new(),
            properties: vec![PropertyDefinition::text("title"), PropertyDefinition::text("type")],
        }
    }
}

impl CollectionConfig {
    pub fn to_descriptor(&self) -> CollectionDescriptor {
        let mut module_config = Map::new();
        module_config.insert(self.vectorizer.clone(), Value::Object(self.vectorizer_options.clone()));
        CollectionDescriptor {
            class_name: self.class_name.clone(),
            description: self.description.clone(),
            vectorizer: self.vectorizer.clone(),
            module_config,
            properties: self.properties.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SeedConfig {
    pub consistency_level: ConsistencyLevel,
    /// Property maps; each becomes one record of the configured class.
    pub records: Vec<Map<String, Value>>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        let book = |title: &str, kind: &str| {
            json!({ "title": title, "type": kind }).as_object().cloned().unwrap_or_default()
        };
        Self {
            consistency_level: ConsistencyLevel::All,
            records: vec![
                book("Hello World Blue", "program"),
                book("Hello World Red", "program"),
                book("Hello World Yellow", "science"),
            ],
        }
    }
}

impl SeedConfig {
    pub fn to_records(&self, class_name: &str) -> Vec<Record> {
        self.records.iter().map(|props| Record::new(class_name, props.clone())).collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    pub concepts: Vec<String>,
    pub move_to: Option<MoveParameters>,
    pub filter: Option<WhereFilter>,
    /// Plain properties to project.
    pub properties: Vec<String>,
    /// Fields requested under `_additional`.
    pub additional: Vec<String>,
    pub limit: Option<u32>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            concepts: vec!["Hello".to_string()],
            move_to: Some(MoveParameters { concepts: vec!["Yellow".to_string()], force: 0.5 }),
            filter: Some(WhereFilter::equal_text("type", "program")),
            properties: vec!["title".to_string()],
            additional: vec!["id".to_string(), "distance".to_string()],
            limit: None,
        }
    }
}

impl QueryConfig {
    pub fn to_request(&self, class_name: &str) -> SearchRequest {
        let mut fields: Vec<Field> = self.properties.iter().map(|p| Field::new(p)).collect();
        if !self.additional.is_empty() {
            let nested: Vec<&str> = self.additional.iter().map(String::as_str).collect();
            fields.push(Field::nested("_additional", &nested));
        }
        SearchRequest {
            class_name: class_name.to_string(),
            concepts: self.concepts.clone(),
            move_to: self.move_to.clone(),
            filter: self.filter.clone(),
            fields,
            limit: self.limit,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
    pub collection: CollectionConfig,
    pub seed: SeedConfig,
    pub query: QueryConfig,
    /// Exit non-zero when a non-fatal step failed.
    pub strict_exit: bool,
}

/// Resolves the TOML file: explicit env path, then working dir, then the platform config dir.
fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(env_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(&env_path);
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found at {}: {}", CONFIG_PATH_ENV, env_path));
        }
        log::info!("{} is set: {}", CONFIG_PATH_ENV, env_path);
        return Ok(path);
    }
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Ok(local);
    }
    let user = ProjectDirs::from("xyz", "ecdysis", "vecseed").map(|dirs| dirs.config_dir().join(CONFIG_FILENAME));
    match user {
        Some(path) if path.exists() => Ok(path),
        _ => {
            log::info!("No config file found, using defaults and {}* environment variables", ENV_PREFIX);
            Ok(local)
        }
    }
}

pub fn load_config() -> Result<AppConfig> {
    let config_path = resolve_config_path()?;

    let figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(&config_path))
        .merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["config_path"]));

    let config: AppConfig = figment.extract().context("Failed to extract AppConfig")?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<()> {
    if config.connection.host.trim().is_empty() {
        return Err(anyhow::anyhow!("connection.host cannot be empty"));
    }
    if config.collection.class_name.trim().is_empty() {
        return Err(anyhow::anyhow!("collection.class_name cannot be empty"));
    }
    if config.query.concepts.is_empty() {
        return Err(anyhow::anyhow!("query.concepts must contain at least one phrase"));
    }
    if let Some(move_to) = &config.query.move_to {
        if !(0.0..=1.0).contains(&move_to.force) {
            return Err(anyhow::anyhow!("query.move_to.force must be within [0, 1], got {}", move_to.force));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::{FilterOperator, FilterValue};
    use figment::Jail;

    #[test]
    fn test_load_config_default() {
        Jail::expect_with(|_jail| {
            let config = load_config().expect("Failed to load default config");
            assert_eq!(config, AppConfig::default());
            assert_eq!(config.connection.host, "localhost:8080");
            assert_eq!(config.connection.scheme, Scheme::Http);
            assert_eq!(config.collection.class_name, "Book");
            assert_eq!(config.seed.records.len(), 3);
            assert_eq!(config.seed.consistency_level, ConsistencyLevel::All);
            assert!(!config.strict_exit);
            Ok(())
        });
    }

    #[test]
    fn test_load_config_toml_only() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "vecseed.toml",
                r#"
strict_exit = true

[connection]
host = "weaviate.internal:443"
scheme = "https"
request_timeout_secs = 10

[collection]
class_name = "Article"
vectorizer = "text2vec-openai"
vectorizer_options = { model = "ada" }
properties = [{ name = "headline", data_type = ["text"] }]

[seed]
consistency_level = "QUORUM"
records = [{ headline = "Rust 2024" }]

[query]
concepts = ["systems"]
filter = { path = ["headline"], operator = "Like", value = "Rust*" }
properties = ["headline"]
additional = ["id"]
limit = 5
                "#,
            )?;
            let config = load_config().expect("Failed to load TOML config");
            assert!(config.strict_exit);
            assert_eq!(config.connection.scheme, Scheme::Https);
            assert_eq!(config.connection.request_timeout_secs, Some(10));
            assert_eq!(config.collection.class_name, "Article");
            assert_eq!(config.collection.properties, vec![PropertyDefinition::text("headline")]);
            assert_eq!(config.seed.consistency_level, ConsistencyLevel::Quorum);
            assert_eq!(config.seed.records.len(), 1);

            let filter = config.query.filter.clone().unwrap();
            assert_eq!(filter.operator, FilterOperator::Like);
            assert_eq!(filter.value, FilterValue::Text("Rust*".to_string()));
            // move_to keeps its default since TOML did not override it
            assert!(config.query.move_to.is_some());

            let descriptor = config.collection.to_descriptor();
            assert_eq!(descriptor.module_config["text2vec-openai"]["model"], "ada");
            Ok(())
        });
    }

    #[test]
    fn test_load_config_env_only() {
        Jail::expect_with(|jail| {
            jail.set_env("VECSEED_CONNECTION__HOST", "db:9090");
            jail.set_env("VECSEED_COLLECTION__CLASS_NAME", "Paper");
            jail.set_env("VECSEED_STRICT_EXIT", "true");

            let config = load_config().expect("Failed to load env config");
            assert_eq!(config.connection.host, "db:9090");
            assert_eq!(config.collection.class_name, "Paper");
            assert!(config.strict_exit);
            assert_eq!(config.collection.vectorizer, "text2vec-transformers");
            Ok(())
        });
    }

    #[test]
    fn test_single_nested_override_keeps_sibling_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("VECSEED_QUERY__MOVE_TO__FORCE", "0.7");
            jail.create_file(
                "vecseed.toml",
                r#"
[query.filter]
path = ["pages"]
operator = "GreaterThan"
value = 42
                "#,
            )?;

            let config = load_config().expect("Failed to load partially overridden config");
            let move_to = config.query.move_to.clone().unwrap();
            assert_eq!(move_to.concepts, vec!["Yellow".to_string()]);
            assert!((move_to.force - 0.7).abs() < f32::EPSILON);

            let filter = config.query.filter.clone().unwrap();
            assert_eq!(filter.path, vec!["pages".to_string()]);
            assert_eq!(filter.operator, FilterOperator::GreaterThan);
            assert_eq!(filter.value, FilterValue::Int(42));
            assert_eq!(config.query.concepts, vec!["Hello".to_string()]);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_config_path_is_an_error() {
        Jail::expect_with(|jail| {
            jail.set_env(CONFIG_PATH_ENV, "does/not/exist.toml");
            let err = load_config().unwrap_err();
            assert!(err.to_string().contains("Config file not found"));
            Ok(())
        });
    }

    #[test]
    fn test_validation_rejects_force_out_of_range() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[query]
concepts = ["Hello"]
move_to = { concepts = ["Yellow"], force = 2.0 }
                "#,
            )?;
            jail.set_env(CONFIG_PATH_ENV, "custom.toml");
            let err = load_config().unwrap_err();
            assert!(err.to_string().contains("force"));
            Ok(())
        });
    }

    #[test]
    fn test_query_config_builds_request() {
        let request = QueryConfig::default().to_request("Book");
        assert_eq!(request.class_name, "Book");
        assert_eq!(
            request.fields,
            vec![Field::new("title"), Field::nested("_additional", &["id", "distance"])]
        );
        assert!(request.validate().is_ok());
    }
}

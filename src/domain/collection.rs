use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::error::SeedError;

/// A single property of a collection schema, e.g. `title: ["text"]`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "dataType", alias = "data_type")]
    pub data_type: Vec<String>,
}

impl PropertyDefinition {
    pub fn text(name: &str) -> Self {
        Self { name: name.to_string(), data_type: vec!["text".to_string()] }
    }
}

/// Everything needed to create a collection (a Weaviate "class").
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CollectionDescriptor {
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub description: String,
    pub vectorizer: String,
    /// Module options keyed by module name, passed through untouched.
    #[serde(rename = "moduleConfig", default, skip_serializing_if = "Map::is_empty")]
    pub module_config: Map<String, Value>,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

impl CollectionDescriptor {
    /// Checks the descriptor before it is sent to the service.
    pub fn validate(&self) -> Result<(), SeedError> {
        if !is_class_name(&self.class_name) {
            return Err(SeedError::InvalidDescriptor(format!(
                "class name '{}' must start with an uppercase letter and contain only letters, digits or '_'",
                self.class_name
            )));
        }
        if self.vectorizer.trim().is_empty() {
            return Err(SeedError::InvalidDescriptor("vectorizer module cannot be empty".to_string()));
        }
        let mut seen = HashSet::new();
        for property in &self.properties {
            if !is_graphql_name(&property.name) {
                return Err(SeedError::InvalidDescriptor(format!(
                    "invalid property name '{}'",
                    property.name
                )));
            }
            if property.data_type.is_empty() {
                return Err(SeedError::InvalidDescriptor(format!(
                    "property '{}' has no data type",
                    property.name
                )));
            }
            if !seen.insert(property.name.as_str()) {
                return Err(SeedError::InvalidDescriptor(format!(
                    "duplicate property '{}'",
                    property.name
                )));
            }
        }
        Ok(())
    }
}

/// A record to insert. The service assigns its identifier.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    #[serde(rename = "class")]
    pub class_name: String,
    pub properties: Map<String, Value>,
}

impl Record {
    pub fn new(class_name: &str, properties: Map<String, Value>) -> Self {
        Self { class_name: class_name.to_string(), properties }
    }
}

/// Replication acknowledgement required for a write.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConsistencyLevel {
    One,
    Quorum,
    #[default]
    All,
}

impl ConsistencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsistencyLevel::One => "ONE",
            ConsistencyLevel::Quorum => "QUORUM",
            ConsistencyLevel::All => "ALL",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an idempotent collection reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Deleted,
    Absent,
}

/// One object the service refused inside an otherwise accepted batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    /// Position of the record in the submitted slice.
    pub index: usize,
    pub id: Option<String>,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub submitted: usize,
    pub succeeded: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.succeeded == self.submitted
    }
}

/// `^[A-Z][_0-9A-Za-z]*$`
pub fn is_class_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// `^[_A-Za-z][_0-9A-Za-z]*$`
pub fn is_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn book_descriptor() -> CollectionDescriptor {
        CollectionDescriptor {
            class_name: "Book".to_string(),
            description: "all books I have".to_string(),
            vectorizer: "text2vec-transformers".to_string(),
            module_config: json!({ "text2vec-transformers": {} }).as_object().cloned().unwrap(),
            properties: vec![PropertyDefinition::text("title"), PropertyDefinition::text("type")],
        }
    }

    #[test]
    fn test_descriptor_wire_shape() {
        let value = serde_json::to_value(book_descriptor()).unwrap();
        assert_eq!(
            value,
            json!({
                "class": "Book",
                "description": "all books I have",
                "vectorizer": "text2vec-transformers",
                "moduleConfig": { "text2vec-transformers": {} },
                "properties": [
                    { "name": "title", "dataType": ["text"] },
                    { "name": "type", "dataType": ["text"] }
                ]
            })
        );
    }

    #[test]
    fn test_descriptor_validation() {
        assert!(book_descriptor().validate().is_ok());

        let mut lower = book_descriptor();
        lower.class_name = "book".to_string();
        assert_matches!(lower.validate(), Err(SeedError::InvalidDescriptor(_)));

        let mut dup = book_descriptor();
        dup.properties.push(PropertyDefinition::text("title"));
        assert_matches!(dup.validate(), Err(SeedError::InvalidDescriptor(msg)) if msg.contains("duplicate"));

        let mut bad_prop = book_descriptor();
        bad_prop.properties[0].name = "ti tle".to_string();
        assert_matches!(bad_prop.validate(), Err(SeedError::InvalidDescriptor(_)));
    }

    #[test]
    fn test_consistency_level_names() {
        assert_eq!(ConsistencyLevel::default(), ConsistencyLevel::All);
        assert_eq!(serde_json::to_value(ConsistencyLevel::Quorum).unwrap(), json!("QUORUM"));
        let parsed: ConsistencyLevel = serde_json::from_value(json!("ONE")).unwrap();
        assert_eq!(parsed, ConsistencyLevel::One);
        assert_eq!(ConsistencyLevel::All.to_string(), "ALL");
    }

    #[test]
    fn test_name_rules() {
        assert!(is_class_name("Book_2"));
        assert!(!is_class_name("_Book"));
        assert!(!is_class_name(""));
        assert!(is_graphql_name("_additional"));
        assert!(!is_graphql_name("9lives"));
    }
}

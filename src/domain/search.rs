use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::collection::{is_class_name, is_graphql_name};
use crate::error::SeedError;

/// Secondary bias applied to the `nearText` target embedding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveParameters {
    pub concepts: Vec<String>,
    /// 0 = no bias, 1 = maximal.
    pub force: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Like,
    IsNull,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "Equal",
            FilterOperator::NotEqual => "NotEqual",
            FilterOperator::GreaterThan => "GreaterThan",
            FilterOperator::GreaterThanEqual => "GreaterThanEqual",
            FilterOperator::LessThan => "LessThan",
            FilterOperator::LessThanEqual => "LessThanEqual",
            FilterOperator::Like => "Like",
            FilterOperator::IsNull => "IsNull",
        }
    }
}

/// Literal compared against the stored property value. Written as a plain
/// scalar; its type picks the GraphQL slot (`3` is `valueInt`, `3.0` is `valueNumber`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    Boolean(bool),
    Int(i64),
    Number(f64),
    Text(String),
}

/// Structural predicate applied by the service alongside similarity ranking.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WhereFilter {
    pub path: Vec<String>,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl WhereFilter {
    pub fn equal_text(path: &str, value: &str) -> Self {
        Self {
            path: vec![path.to_string()],
            operator: FilterOperator::Equal,
            value: FilterValue::Text(value.to_string()),
        }
    }
}

/// A projected field; nested fields render as `name { a b }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Field {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), fields: Vec::new() }
    }

    pub fn nested(name: &str, fields: &[&str]) -> Self {
        Self { name: name.to_string(), fields: fields.iter().map(|f| Field::new(f)).collect() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub class_name: String,
    pub concepts: Vec<String>,
    pub move_to: Option<MoveParameters>,
    pub filter: Option<WhereFilter>,
    pub fields: Vec<Field>,
    pub limit: Option<u32>,
}

impl SearchRequest {
    /// Rejects requests the service would refuse or that cannot be rendered safely.
    pub fn validate(&self) -> Result<(), SeedError> {
        if !is_class_name(&self.class_name) {
            return Err(SeedError::InvalidQuery(format!("invalid class name '{}'", self.class_name)));
        }
        if self.concepts.is_empty() || self.concepts.iter().all(|c| c.trim().is_empty()) {
            return Err(SeedError::InvalidQuery("at least one concept is required".to_string()));
        }
        if let Some(move_to) = &self.move_to {
            if !move_to.force.is_finite() || !(0.0..=1.0).contains(&move_to.force) {
                return Err(SeedError::InvalidQuery(format!(
                    "move force must be within [0, 1], got {}",
                    move_to.force
                )));
            }
            if move_to.concepts.is_empty() {
                return Err(SeedError::InvalidQuery("moveTo requires at least one concept".to_string()));
            }
        }
        if let Some(filter) = &self.filter {
            if filter.path.is_empty() || !filter.path.iter().all(|p| is_graphql_name(p)) {
                return Err(SeedError::InvalidQuery(format!("invalid filter path {:?}", filter.path)));
            }
            if let FilterValue::Number(n) = &filter.value {
                if !n.is_finite() {
                    return Err(SeedError::InvalidQuery(format!("filter value must be finite, got {}", n)));
                }
            }
        }
        if self.fields.is_empty() {
            return Err(SeedError::InvalidQuery("at least one return field is required".to_string()));
        }
        validate_fields(&self.fields)
    }
}

fn validate_fields(fields: &[Field]) -> Result<(), SeedError> {
    for field in fields {
        if !is_graphql_name(&field.name) {
            return Err(SeedError::InvalidQuery(format!("invalid field name '{}'", field.name)));
        }
        validate_fields(&field.fields)?;
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GraphQLErrorLocation {
    pub line: u32,
    pub column: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default)]
    pub path: Vec<Value>,
    #[serde(default)]
    pub locations: Vec<GraphQLErrorLocation>,
}

/// Raw GraphQL envelope: data and errors may both be present.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GraphQLResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<GraphQLError>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<GraphQLError>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<GraphQLError>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Service-computed metadata attached to every row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Additional {
    pub id: String,
    pub distance: f64,
}

/// Typed row of the default `Book` collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Book {
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(rename = "_additional")]
    pub additional: Additional,
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [id={} distance={:.4}]",
            self.title, self.additional.id, self.additional.distance
        )?;
        if let Some(kind) = &self.kind {
            write!(f, " type={}", kind)?;
        }
        Ok(())
    }
}

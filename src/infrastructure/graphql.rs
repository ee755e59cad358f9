//! Renders `SearchRequest`s into GraphQL `Get` documents.
//!
//! Names (class, path segments, fields) are validated by `SearchRequest::validate`
//! before rendering; string literals are JSON-escaped, which GraphQL accepts.

use crate::domain::search::{Field, FilterOperator, FilterValue, MoveParameters, SearchRequest, WhereFilter};

/// Builds `{ Get { Class(nearText: ..., where: ..., limit: ...) { fields } } }`.
pub fn render_get_query(request: &SearchRequest) -> String {
    let mut args = vec![render_near_text(&request.concepts, request.move_to.as_ref())];
    if let Some(filter) = &request.filter {
        args.push(format!("where: {}", render_where(filter)));
    }
    if let Some(limit) = request.limit {
        args.push(format!("limit: {}", limit));
    }
    format!(
        "{{ Get {{ {}({}) {{ {} }} }} }}",
        request.class_name,
        args.join(", "),
        render_fields(&request.fields)
    )
}

fn render_near_text(concepts: &[String], move_to: Option<&MoveParameters>) -> String {
    let mut near_text = format!("nearText: {{concepts: {}", render_string_list(concepts));
    if let Some(move_to) = move_to {
        near_text.push_str(&format!(
            ", moveTo: {{concepts: {}, force: {}}}",
            render_string_list(&move_to.concepts),
            move_to.force
        ));
    }
    near_text.push('}');
    near_text
}

fn render_where(filter: &WhereFilter) -> String {
    let value = match filter.operator {
        // IsNull takes a boolean regardless of the path's type.
        FilterOperator::IsNull => match &filter.value {
            FilterValue::Boolean(b) => format!("valueBoolean: {}", b),
            _ => "valueBoolean: true".to_string(),
        },
        _ => render_value(&filter.value),
    };
    format!(
        "{{path: {}, operator: {}, {}}}",
        render_string_list(&filter.path),
        filter.operator.as_str(),
        value
    )
}

fn render_value(value: &FilterValue) -> String {
    match value {
        FilterValue::Text(s) => format!("valueText: {}", quote(s)),
        FilterValue::Int(i) => format!("valueInt: {}", i),
        FilterValue::Number(n) => format!("valueNumber: {:?}", n),
        FilterValue::Boolean(b) => format!("valueBoolean: {}", b),
    }
}

fn render_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|field| {
            if field.fields.is_empty() {
                field.name.clone()
            } else {
                format!("{} {{ {} }}", field.name, render_fields(&field.fields))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_string_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quote(s)).collect();
    format!("[{}]", quoted.join(", "))
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

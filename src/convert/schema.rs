//! Restricted JSON-Schema subset to gateway validation schema conversion.
//!
//! Deterministic and shape-preserving: the output validator accepts exactly
//! the shapes the input schema describes. Example payloads are never
//! validated here.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::upstream::types::{GatewaySchema, SchemaKind};

/// Convert a restricted JSON-Schema value into a gateway validation schema.
///
/// Unknown or missing types produce the unconstrained fallback.
pub fn convert_schema(schema: &Value) -> GatewaySchema {
    let obj = match schema.as_object() {
        Some(obj) => obj,
        None => return GatewaySchema::of(SchemaKind::Any),
    };

    let description = obj
        .get("description")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let kind = match obj.get("type").and_then(|v| v.as_str()) {
        Some("string") => SchemaKind::String {
            allowed: enum_values(obj.get("enum")),
        },
        Some("number") => SchemaKind::Number,
        Some("integer") => SchemaKind::Integer,
        Some("boolean") => SchemaKind::Boolean,
        Some("array") => SchemaKind::Array {
            // Default to an unconstrained item type when absent
            items: Box::new(
                obj.get("items")
                    .map(convert_schema)
                    .unwrap_or_else(|| GatewaySchema::of(SchemaKind::Any)),
            ),
        },
        Some("object") => SchemaKind::Object {
            properties: convert_properties(obj.get("properties")),
            required: required_fields(obj.get("required")),
        },
        _ => SchemaKind::Any,
    };

    GatewaySchema { kind, description }
}

fn convert_properties(properties: Option<&Value>) -> BTreeMap<String, GatewaySchema> {
    properties
        .and_then(|v| v.as_object())
        .map(|props| {
            props
                .iter()
                .map(|(name, schema)| (name.clone(), convert_schema(schema)))
                .collect()
        })
        .unwrap_or_default()
}

fn required_fields(required: Option<&Value>) -> Vec<String> {
    required
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn enum_values(values: Option<&Value>) -> Option<Vec<String>> {
    let arr = values?.as_array()?;
    let allowed: Vec<String> = arr
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::to_string)
        .collect();
    if allowed.is_empty() {
        None
    } else {
        Some(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_with_enum() {
        let schema = convert_schema(&json!({
            "type": "string",
            "enum": ["celsius", "fahrenheit"],
            "description": "temperature unit"
        }));
        assert_eq!(schema.description.as_deref(), Some("temperature unit"));
        match schema.kind {
            SchemaKind::String { allowed } => {
                assert_eq!(allowed.unwrap(), vec!["celsius", "fahrenheit"])
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_object_with_optional_property() {
        let schema = convert_schema(&json!({
            "type": "object",
            "properties": {
                "city": { "type": "string" },
                "days": { "type": "integer" }
            },
            "required": ["city"]
        }));
        match schema.kind {
            SchemaKind::Object {
                properties,
                required,
            } => {
                assert_eq!(properties.len(), 2);
                assert_eq!(required, vec!["city"]);
                assert!(matches!(
                    properties["days"].kind,
                    SchemaKind::Integer
                ));
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_array_defaults_to_unconstrained_items() {
        let schema = convert_schema(&json!({ "type": "array" }));
        match schema.kind {
            SchemaKind::Array { items } => assert!(matches!(items.kind, SchemaKind::Any)),
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_nested_object_recursion() {
        let schema = convert_schema(&json!({
            "type": "object",
            "properties": {
                "filters": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "key": { "type": "string" } },
                        "required": ["key"]
                    }
                }
            }
        }));
        match schema.kind {
            SchemaKind::Object { properties, .. } => match &properties["filters"].kind {
                SchemaKind::Array { items } => {
                    assert!(matches!(items.kind, SchemaKind::Object { .. }))
                }
                other => panic!("unexpected kind: {:?}", other),
            },
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_and_missing_types_fall_back() {
        assert!(matches!(
            convert_schema(&json!({ "type": "null" })).kind,
            SchemaKind::Any
        ));
        assert!(matches!(convert_schema(&json!({})).kind, SchemaKind::Any));
        assert!(matches!(convert_schema(&json!(true)).kind, SchemaKind::Any));
    }
}

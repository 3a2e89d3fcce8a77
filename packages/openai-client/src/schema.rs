//! JSON schemas for strict structured outputs, derived with `schemars`.
//!
//! Strict mode rejects schemas that use `$ref`, leave `additionalProperties`
//! open, or mark any property optional. [`StructuredOutput::openai_schema`]
//! rewrites the `schemars` output into that shape.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A type the model can be asked to produce directly.
///
/// Blanket-implemented for every `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Strict-mode schema for `Self`.
    fn openai_schema() -> Value {
        let mut root = serde_json::to_value(schema_for!(Self)).unwrap_or_default();
        let definitions = match &mut root {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("definitions").unwrap_or(Value::Null)
            }
            _ => Value::Null,
        };
        strictify(&mut root, &definitions);
        root
    }

    /// Schema name used in the request.
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

const REF_PREFIX: &str = "#/definitions/";

/// Inline references and close every object schema, depth first.
fn strictify(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(target) = referenced_definition(map, definitions) {
                *value = target;
                strictify(value, definitions);
                return;
            }
            if map.get("type").and_then(Value::as_str) == Some("object") {
                close_object(map);
            }
            for child in map.values_mut() {
                strictify(child, definitions);
            }
        }
        Value::Array(items) => {
            for item in items {
                strictify(item, definitions);
            }
        }
        _ => {}
    }
}

fn referenced_definition(map: &Map<String, Value>, definitions: &Value) -> Option<Value> {
    let name = map.get("$ref")?.as_str()?.strip_prefix(REF_PREFIX)?;
    definitions.get(name).cloned()
}

fn close_object(map: &mut Map<String, Value>) {
    map.insert("additionalProperties".to_string(), Value::Bool(false));
    let required: Vec<Value> = map
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().map(Value::String).collect())
        .unwrap_or_default();
    map.insert("required".to_string(), Value::Array(required));
}

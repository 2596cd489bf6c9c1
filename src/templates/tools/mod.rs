// SPDX-License-Identifier: MIT

//! Tools used by the templates

mod exit_loop;
mod rag_retrieval;
mod weather;

pub use exit_loop::ExitLoopTool;
pub use rag_retrieval::{RagContext, RagRetrievalTool};
pub use weather::{GetWeatherTool, Units, WeatherArgs};

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde_json::Value;

/// JSON schema for a tool's arguments in the subset Gemini accepts
/// (no `$schema`, `$ref`, `definitions`, titles or defaults).
pub(crate) fn tool_schema<T: JsonSchema>() -> Value {
    let settings = SchemaSettings::openapi3().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let schema = settings.into_generator().into_root_schema_for::<T>();
    let mut value = serde_json::to_value(schema.schema).unwrap_or_default();
    clean_schema(&mut value);
    value
}

fn clean_schema(value: &mut Value) {
    match value {
        Value::Object(map) => {
            // Documented or defaulted fields wrap their inlined type in a
            // single-element allOf
            let single = matches!(map.get("allOf"), Some(Value::Array(all)) if all.len() == 1);
            if single {
                if let Some(Value::Array(mut all)) = map.remove("allOf") {
                    if let Some(Value::Object(inner)) = all.pop() {
                        for (k, v) in inner {
                            map.entry(k).or_insert(v);
                        }
                    }
                }
            }
            for key in ["$schema", "$ref", "definitions", "title", "default", "additionalProperties"] {
                map.remove(key);
            }
            map.values_mut().for_each(clean_schema);
        }
        Value::Array(items) => items.iter_mut().for_each(clean_schema),
        _ => {}
    }
}

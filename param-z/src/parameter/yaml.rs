//! YAML parameter file loading.
//!
//! Supports the explicit-typed document format:
//!
//! ```yaml
//! parameters:
//!   - name: robot_name
//!     type: string
//!     value: "rover"
//!   - name: max_velocity
//!     type: double
//!     value: 2.0
//!   - name: waypoints.count
//!     type: integer
//!     value: 5
//!   - name: sensors
//!     type: string_array
//!     value: [lidar, imu]
//! ```
//!
//! Recognized types: `string`, `double`, `integer`, `bool` and their
//! `_array` forms. Entries with an unknown type or a value that does not
//! match the declared type are skipped with a warning; structural problems
//! (missing keys, wrong document shape) fail the whole file.

use std::path::Path;

use serde_yaml::Value;
use tracing::warn;

use super::types::{Parameter, ParameterValue};

/// Load parameters from a YAML file.
pub fn load_from_yaml(path: impl AsRef<Path>) -> Result<Vec<Parameter>, String> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read parameter file {:?}: {}", path, e))?;
    load_from_string(&content)
}

/// Parse a YAML string into parameters.
pub fn load_from_string(yaml: &str) -> Result<Vec<Parameter>, String> {
    let doc: Value =
        serde_yaml::from_str(yaml).map_err(|e| format!("Failed to parse YAML: {}", e))?;

    let entries = doc
        .get("parameters")
        .ok_or_else(|| "YAML root must contain a 'parameters' key".to_string())?
        .as_sequence()
        .ok_or_else(|| "'parameters' must be a sequence".to_string())?;

    let mut params = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| "Parameter entry is missing a string 'name'".to_string())?;
        let type_tag = entry
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("Parameter '{}' is missing a string 'type'", name))?;
        let value_node = entry
            .get("value")
            .ok_or_else(|| format!("Parameter '{}' is missing a 'value'", name))?;

        match parse_typed_value(type_tag, value_node) {
            Some(value) => params.push(Parameter::new(name, value)),
            None => warn!(
                "[YAML] Skipping parameter '{}': cannot read value as '{}'",
                name, type_tag
            ),
        }
    }

    Ok(params)
}

fn parse_typed_value(type_tag: &str, value: &Value) -> Option<ParameterValue> {
    match type_tag {
        "string" => value.as_str().map(|s| ParameterValue::String(s.to_owned())),
        // Integer literals are accepted where a double is declared.
        "double" => value.as_f64().map(ParameterValue::Double),
        "integer" => value.as_i64().map(ParameterValue::Integer),
        "bool" => value.as_bool().map(ParameterValue::Bool),
        "string_array" => collect(value, |v| v.as_str().map(str::to_owned))
            .map(ParameterValue::StringArray),
        "double_array" => collect(value, Value::as_f64).map(ParameterValue::DoubleArray),
        "integer_array" => collect(value, Value::as_i64).map(ParameterValue::IntegerArray),
        "bool_array" => collect(value, Value::as_bool).map(ParameterValue::BoolArray),
        _ => None,
    }
}

fn collect<T>(value: &Value, item: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    value.as_sequence()?.iter().map(item).collect()
}

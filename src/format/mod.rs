//! Record rendering: JSON, YAML and CSV projections.
//!
//! Records are untyped JSON documents. Numeric tokens are kept exact all
//! the way through (`serde_json` arbitrary precision), since identifiers
//! and counts in the graph routinely exceed safe float range.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("record is not a JSON object")]
    NotAnObject,
}

/// Canonical JSON, one record per line.
pub fn to_json(record: &Value) -> Result<String, FormatError> {
    let mut out = serde_json::to_string(record)?;
    out.push('\n');
    Ok(out)
}

/// YAML rendering of the record. Callers are expected to separate
/// consecutive documents with `---` themselves.
pub fn to_yaml(record: &Value) -> Result<String, FormatError> {
    Ok(serde_yaml::to_string(&yaml_value(record))?)
}

/// Project the record onto an ordered list of dot-separated field paths,
/// producing exactly one CSV row. Missing paths render as empty fields.
pub fn to_csv(record: &Value, field_paths: &[String]) -> Result<String, FormatError> {
    if !record.is_object() {
        return Err(FormatError::NotAnObject);
    }

    let mut fields = Vec::with_capacity(field_paths.len());
    for path in field_paths {
        let value = lookup_path(record, path.trim_start_matches('/'));
        fields.push(csv_quote(&stringify(value)));
    }

    let mut row = fields.join(",");
    row.push('\n');
    Ok(row)
}

/// Walk a dot-separated path through nested objects. Absent keys and
/// scalars hit mid-path both count as missing.
fn lookup_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for key in path.split('.') {
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}

fn stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        // Nested structures render as compact JSON inside the field.
        Some(other) => other.to_string(),
    }
}

/// RFC 4180 quoting: fields containing comma, quote or line breaks are
/// double-quoted, with embedded quotes doubled.
fn csv_quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Map a JSON document to a YAML one. Integers that fit i64/u64 become
/// YAML integers, float tokens become floats, and anything wider falls
/// back to the literal token as a string rather than losing precision.
fn yaml_value(value: &Value) -> serde_yaml::Value {
    match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_yaml::Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                serde_yaml::Value::Number(u.into())
            } else {
                let token = n.to_string();
                // An integer token that fits neither i64 nor u64 must not
                // go through f64; keep the exact token instead.
                if token.contains(['.', 'e', 'E']) {
                    match n.as_f64() {
                        Some(f) => serde_yaml::Value::Number(f.into()),
                        None => serde_yaml::Value::String(token),
                    }
                } else {
                    serde_yaml::Value::String(token)
                }
            }
        }
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Array(items) => {
            serde_yaml::Value::Sequence(items.iter().map(yaml_value).collect())
        }
        Value::Object(map) => {
            let mut mapping = serde_yaml::Mapping::with_capacity(map.len());
            for (key, item) in map {
                mapping.insert(serde_yaml::Value::String(key.clone()), yaml_value(item));
            }
            serde_yaml::Value::Mapping(mapping)
        }
    }
}

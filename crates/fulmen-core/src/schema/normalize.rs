//! Canonical schema normalization and semantic comparison.
//!
//! The canonical form sorts object keys lexicographically at every depth,
//! preserves array order and scalar values bit-exactly, and drops comments
//! by virtue of parsing. Equality is evaluated on the canonical bytes.

use serde_json::{Map, Value};

use crate::diagnostics::SchemaError;

/// Options for [`normalize_schema`].
#[derive(Debug, Clone, Default)]
pub struct NormalizeSchemaOptions {
    /// Emit compact JSON instead of pretty two-space form.
    pub compact: bool,
}

/// Result of a canonical comparison.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub equal: bool,
    pub normalized_a: String,
    pub normalized_b: String,
}

/// Rebuild a JSON value with lexicographically sorted object keys at every
/// depth. Arrays keep their order; scalars pass through untouched.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        scalar => scalar.clone(),
    }
}

/// Serialize a canonicalized value. Pretty mode is two-space indented with
/// a trailing newline; compact mode is single-line.
pub fn normalize_schema_value(value: &Value, options: &NormalizeSchemaOptions) -> String {
    let canonical = canonicalize(value);
    if options.compact {
        canonical.to_string()
    } else {
        let mut out = serde_json::to_string_pretty(&canonical)
            .unwrap_or_else(|_| canonical.to_string());
        out.push('\n');
        out
    }
}

/// Parse a schema document (JSON, or YAML as fallback) and normalize it.
pub fn normalize_schema(
    content: &str,
    options: &NormalizeSchemaOptions,
) -> Result<String, SchemaError> {
    let value = parse_schema_text(content)?;
    Ok(normalize_schema_value(&value, options))
}

/// Compare two schema documents after canonical normalization.
pub fn compare_schemas(a: &str, b: &str) -> Result<ComparisonResult, SchemaError> {
    let options = NormalizeSchemaOptions::default();
    let normalized_a = normalize_schema(a, &options)?;
    let normalized_b = normalize_schema(b, &options)?;
    Ok(ComparisonResult {
        equal: normalized_a == normalized_b,
        normalized_a,
        normalized_b,
    })
}

/// Try JSON first; fall back to YAML for `.yaml` schema sources.
pub(crate) fn parse_schema_text(content: &str) -> Result<Value, SchemaError> {
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(json_err) => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|_| SchemaError::Parse {
                    schema_id: "<inline>".to_string(),
                    source: Box::new(json_err),
                })?;
            serde_json::to_value(yaml).map_err(|e| SchemaError::Parse {
                schema_id: "<inline>".to_string(),
                source: Box::new(e),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonicalize_sorts_keys_recursively() {
        let input = json!({"b": 1, "a": {"z": true, "m": null}});
        let canonical = canonicalize(&input);
        let text = canonical.to_string();
        assert_eq!(text, r#"{"a":{"m":null,"z":true},"b":1}"#);
    }

    #[test]
    fn canonicalize_preserves_array_order() {
        let input = json!({"list": [3, 1, 2]});
        assert_eq!(canonicalize(&input).to_string(), r#"{"list":[3,1,2]}"#);
    }

    #[test]
    fn normalize_is_idempotent() {
        let input = r#"{"type":"object","properties":{"b":{"type":"string"},"a":{"type":"number"}}}"#;
        let options = NormalizeSchemaOptions::default();
        let once = normalize_schema(input, &options).unwrap();
        let twice = normalize_schema(&once, &options).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn key_order_differences_normalize_identically() {
        let a = r#"{"type": "object", "title": "T", "properties": {"x": {"type": "string"}}}"#;
        let b = r#"{
            "properties": {"x": {"type": "string"}},
            "title": "T",
            "type": "object"
        }"#;
        let options = NormalizeSchemaOptions::default();
        assert_eq!(
            normalize_schema(a, &options).unwrap(),
            normalize_schema(b, &options).unwrap()
        );
    }

    #[test]
    fn compare_detects_semantic_equality() {
        let a = r#"{"b": 1, "a": 2}"#;
        let b = "{\n  \"a\": 2,\n  \"b\": 1\n}";
        let result = compare_schemas(a, b).unwrap();
        assert!(result.equal);
        assert_eq!(result.normalized_a, result.normalized_b);
    }

    #[test]
    fn compare_detects_difference() {
        let result = compare_schemas(r#"{"a": 1}"#, r#"{"a": 2}"#).unwrap();
        assert!(!result.equal);
    }

    #[test]
    fn yaml_source_with_comments_normalizes() {
        let yaml = "# leading comment\ntype: object # trailing\nproperties:\n  a:\n    type: string\n";
        let json = r#"{"properties": {"a": {"type": "string"}}, "type": "object"}"#;
        let options = NormalizeSchemaOptions::default();
        assert_eq!(
            normalize_schema(yaml, &options).unwrap(),
            normalize_schema(json, &options).unwrap()
        );
    }

    #[test]
    fn compact_mode_single_line() {
        let options = NormalizeSchemaOptions { compact: true };
        let out = normalize_schema(r#"{"b": 1, "a": 2}"#, &options).unwrap();
        assert_eq!(out, r#"{"a":2,"b":1}"#);
        assert!(!out.contains('\n'));
    }

    #[test]
    fn pretty_mode_two_space_trailing_newline() {
        let options = NormalizeSchemaOptions::default();
        let out = normalize_schema(r#"{"a": 1}"#, &options).unwrap();
        assert_eq!(out, "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn scalars_preserved_bit_exact() {
        let options = NormalizeSchemaOptions { compact: true };
        let out = normalize_schema(r#"{"n": 1.5, "s": "caf\u00e9", "t": true, "z": null}"#, &options)
            .unwrap();
        assert_eq!(out, "{\"n\":1.5,\"s\":\"caf\u{00e9}\",\"t\":true,\"z\":null}");
    }

    #[test]
    fn unparseable_input_errors() {
        let options = NormalizeSchemaOptions::default();
        assert!(normalize_schema("{not json or yaml: [", &options).is_err());
    }
}

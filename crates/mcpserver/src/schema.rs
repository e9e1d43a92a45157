use serde_json::Value;

use crate::types::SchemaMeta;

/// Extract validation metadata from a JSON Schema object.
///
/// Only `required`, `properties` and `additionalProperties` are read; other
/// keywords are advertised to clients but not enforced here.
pub fn parse_schema_meta(schema: &Value) -> SchemaMeta {
    let mut meta = SchemaMeta {
        additional_properties: true,
        ..SchemaMeta::default()
    };

    if let Some(arr) = schema.get("required").and_then(|v| v.as_array()) {
        meta.required = string_list(arr);
    }

    if let Some(obj) = schema.get("properties").and_then(|v| v.as_object()) {
        meta.properties = obj.keys().cloned().collect();
    }

    if let Some(false) = schema.get("additionalProperties").and_then(|v| v.as_bool()) {
        meta.additional_properties = false;
    }

    meta
}

fn string_list(arr: &[Value]) -> Vec<String> {
    arr.iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_required() {
        let meta = parse_schema_meta(&json!({
            "type": "object",
            "properties": {"msg": {"type": "string"}},
            "required": ["msg"]
        }));
        assert_eq!(meta.required, vec!["msg"]);
        assert_eq!(meta.properties, vec!["msg"]);
        assert!(meta.additional_properties);
    }

    #[test]
    fn test_parse_ignores_unenforced_keywords() {
        let meta = parse_schema_meta(&json!({
            "type": "object",
            "properties": {"a": {}},
            "oneOf": [{"required": ["a"]}]
        }));
        assert!(meta.required.is_empty());
        assert_eq!(meta.properties, vec!["a"]);
    }

    #[test]
    fn test_parse_additional_properties_false() {
        let meta = parse_schema_meta(&json!({
            "type": "object",
            "properties": {"year": {"type": ["integer", "null"]}},
            "additionalProperties": false
        }));
        assert!(!meta.additional_properties);
        assert!(meta.required.is_empty());
    }

    #[test]
    fn test_parse_non_object_schema() {
        let meta = parse_schema_meta(&Value::Null);
        assert!(meta.required.is_empty());
        assert!(meta.properties.is_empty());
        assert!(meta.additional_properties);
    }
}

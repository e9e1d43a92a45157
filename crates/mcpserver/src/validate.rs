use serde_json::Value;

use crate::types::Tool;

impl Tool {
    /// Validate arguments against the tool's input schema metadata.
    pub fn validate_arguments(&self, args: &Value) -> Result<(), String> {
        let empty = serde_json::Map::new();
        let obj = match args {
            Value::Object(obj) => obj,
            Value::Null => &empty,
            _ => return Err("arguments must be an object".into()),
        };
        let meta = &self.schema_meta;

        for field in &meta.required {
            if !obj.contains_key(field) {
                return Err(format!("missing required field \"{}\"", field));
            }
        }

        if !meta.additional_properties {
            if let Some(unknown) = obj.keys().find(|k| !meta.properties.contains(k)) {
                return Err(format!("unexpected field \"{}\"", unknown));
            }
        }

        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema;

/// JSON-RPC 2.0 error codes.
pub const ERR_CODE_PARSE: i32 = -32700;
pub const ERR_CODE_INVALID_REQ: i32 = -32600;
pub const ERR_CODE_NO_METHOD: i32 = -32601;
pub const ERR_CODE_BAD_PARAMS: i32 = -32602;
pub const ERR_CODE_INTERNAL: i32 = -32603;

/// MCP Protocol version this server implements.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

// ── Request ──

/// Inbound JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

// ── Response ──

/// JSON-RPC 2.0 response returned by [`Server::handle()`](crate::Server::handle).
///
/// A response with no id, result or error is a notification sentinel: the
/// transport sends nothing back (stdio) or answers 202 (HTTP).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    /// Returns true when this is a notification sentinel (no body needed).
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.result.is_none() && self.error.is_none()
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ── MCP domain types ──

/// A tool as advertised through `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    /// Parsed schema metadata for validation (not serialized to clients).
    #[serde(skip)]
    pub schema_meta: SchemaMeta,
}

impl Tool {
    /// Build a tool definition, extracting validation metadata from `input_schema`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        let schema_meta = schema::parse_schema_meta(&input_schema);
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            schema_meta,
        }
    }
}

/// Tool call result returned by handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Text of the first content block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(|c| c.text.as_deref())
    }
}

/// Single content block in a tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Parsed schema metadata used for argument validation.
#[derive(Debug, Clone, Default)]
pub struct SchemaMeta {
    pub required: Vec<String>,
    /// Declared property names; only enforced when `additional_properties` is false.
    pub properties: Vec<String>,
    pub additional_properties: bool,
}

// ── Convenience constructors ──

/// Create a simple text tool result.
pub fn text_result(text: impl Into<String>) -> ToolResult {
    ToolResult {
        content: vec![ContentBlock {
            block_type: "text".into(),
            text: Some(text.into()),
        }],
        is_error: false,
    }
}

/// Create an error tool result.
pub fn error_result(text: impl Into<String>) -> ToolResult {
    ToolResult {
        content: vec![ContentBlock {
            block_type: "text".into(),
            text: Some(text.into()),
        }],
        is_error: true,
    }
}

/// Serialize `payload` as JSON into a single text block.
pub fn json_result<T: Serialize>(payload: &T) -> Result<ToolResult, McpError> {
    Ok(text_result(serde_json::to_string(payload)?))
}

/// Build a JSON-RPC error response.
pub fn new_error_response(
    id: Option<Value>,
    code: i32,
    message: impl Into<String>,
) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".into(),
        id,
        result: None,
        error: Some(RpcError {
            code,
            message: message.into(),
            data: None,
        }),
    }
}

/// Build a JSON-RPC success response.
pub fn new_ok_response(id: Option<Value>, result: Value) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".into(),
        id,
        result: Some(result),
        error: None,
    }
}

/// Build a notification sentinel (empty response, triggers HTTP 202).
pub fn notification_response() -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".into(),
        id: None,
        result: None,
        error: None,
    }
}

/// MCP error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("tool error: {0}")]
    ToolError(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitializeParams {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_sentinel() {
        assert!(notification_response().is_notification());
        assert!(!new_ok_response(Some(json!(1)), json!({})).is_notification());
    }

    #[test]
    fn test_error_result_serializes_is_error() {
        let v = serde_json::to_value(error_result("boom")).unwrap();
        assert_eq!(v["isError"], true);
        assert_eq!(v["content"][0]["type"], "text");
        assert_eq!(v["content"][0]["text"], "boom");
    }

    #[test]
    fn test_ok_result_omits_is_error() {
        let v = serde_json::to_value(text_result("fine")).unwrap();
        assert!(v.get("isError").is_none());
    }

    #[test]
    fn test_json_result_embeds_payload() {
        let result = json_result(&json!([{"a": 1}])).unwrap();
        let parsed: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert_eq!(parsed, json!([{"a": 1}]));
    }

    #[test]
    fn test_tool_serializes_camel_case() {
        let tool = Tool::new("t", "desc", json!({"type": "object", "properties": {}}));
        let v = serde_json::to_value(&tool).unwrap();
        assert!(v.get("inputSchema").is_some());
        assert!(v.get("schema_meta").is_none());
    }
}

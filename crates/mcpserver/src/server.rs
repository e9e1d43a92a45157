use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::transport_http::http_router;
use crate::transport_stdio;
use crate::types::*;

/// Handler trait for MCP tools. Implement this or use closures.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> Result<ToolResult, McpError>;
}

/// Wraps an async closure into a ToolHandler.
pub struct FnToolHandler<F> {
    f: F,
}

impl<F, Fut> FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<ToolResult, McpError>> + Send + 'static,
{
    pub fn new(f: F) -> Arc<dyn ToolHandler> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<ToolResult, McpError>> + Send + 'static,
{
    async fn call(&self, args: Value) -> Result<ToolResult, McpError> {
        (self.f)(args).await
    }
}

/// Anything tools can be registered on.
///
/// [`Server`] is the production implementation; tests substitute a
/// recording double.
pub trait ToolRegistry {
    fn register_tool(&mut self, tool: Tool, handler: Arc<dyn ToolHandler>);
}

/// Transport a [`Server`] is served over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout.
    Stdio,
    /// Streamable HTTP on `POST /mcp`.
    Http { host: String, port: u16 },
}

/// The MCP server. Create with `ServerBuilder`, register tools, then run.
pub struct Server {
    pub(crate) server_name: String,
    pub(crate) server_version: String,
    pub(crate) tools: HashMap<String, (Tool, Arc<dyn ToolHandler>)>,
    pub(crate) tool_list: Vec<Tool>,
}

impl Server {
    /// Create a new server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.server_name
    }

    /// Tools in registration order.
    pub fn tools(&self) -> &[Tool] {
        &self.tool_list
    }

    /// Serve until the transport closes.
    pub async fn run(self, transport: Transport) -> Result<(), McpError> {
        match transport {
            Transport::Stdio => {
                tracing::info!(server = %self.server_name, "serving MCP over stdio");
                let stdin = tokio::io::stdin();
                let stdout = tokio::io::stdout();
                transport_stdio::serve(Arc::new(self), stdin, stdout).await
            }
            Transport::Http { host, port } => {
                let addr = format!("{}:{}", host, port);
                let listener = tokio::net::TcpListener::bind(&addr).await?;
                tracing::info!(server = %self.server_name, addr = %addr, "serving MCP over HTTP");
                axum::serve(listener, http_router(self)).await?;
                Ok(())
            }
        }
    }

    /// Route a JSON-RPC request to the appropriate MCP handler.
    pub async fn handle(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        if req.jsonrpc != "2.0" {
            return new_error_response(req.id, ERR_CODE_INVALID_REQ, "jsonrpc must be '2.0'");
        }

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "ping" => new_ok_response(req.id, json!({})),
            "notifications/initialized" | "notifications/cancelled" => notification_response(),
            "tools/list" => self.handle_tools_list(req),
            "tools/call" => self.handle_tools_call(req).await,
            _ => new_error_response(
                req.id,
                ERR_CODE_NO_METHOD,
                format!("Method not found: {}", req.method),
            ),
        }
    }

    fn handle_initialize(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        if let Some(params) = &req.params {
            if let Ok(p) = serde_json::from_value::<InitializeParams>(params.clone()) {
                let client_name = p.client_info.as_ref().map_or("", |c| c.name.as_str());
                let client_version = p.client_info.as_ref().map_or("", |c| c.version.as_str());
                tracing::info!(
                    client_name,
                    client_version,
                    protocol_version = ?p.protocol_version,
                    "initialize"
                );
            }
        }

        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {"listChanged": false},
            },
            "serverInfo": {
                "name": self.server_name,
                "version": self.server_version,
            },
        });

        new_ok_response(req.id, result)
    }

    fn handle_tools_list(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let result = json!({ "tools": self.tool_list });
        new_ok_response(req.id, result)
    }

    async fn handle_tools_call(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let params: ToolCallParams = match req.params.as_ref() {
            Some(p) => match serde_json::from_value(p.clone()) {
                Ok(p) => p,
                Err(e) => {
                    return new_error_response(
                        req.id,
                        ERR_CODE_BAD_PARAMS,
                        format!("invalid params: {}", e),
                    )
                }
            },
            None => {
                return new_error_response(req.id, ERR_CODE_BAD_PARAMS, "params required");
            }
        };

        let args = if params.arguments.is_null() {
            json!({})
        } else {
            params.arguments
        };

        let (tool, handler) = match self.tools.get(&params.name) {
            Some(entry) => entry,
            None => {
                return new_error_response(
                    req.id,
                    ERR_CODE_NO_METHOD,
                    format!("Unknown tool: {}", params.name),
                )
            }
        };

        if let Err(e) = tool.validate_arguments(&args) {
            return new_error_response(req.id, ERR_CODE_BAD_PARAMS, e);
        }

        tracing::debug!(tool = %params.name, "tools/call");
        let result = match handler.call(args).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(tool = %params.name, error = %e, "tool handler failed");
                error_result(e.to_string())
            }
        };

        match serde_json::to_value(&result) {
            Ok(v) => new_ok_response(req.id, v),
            Err(e) => new_error_response(req.id, ERR_CODE_INTERNAL, e.to_string()),
        }
    }
}

impl ToolRegistry for Server {
    /// Declare `tool` and bind its handler. Re-registering a name replaces
    /// the earlier definition in place.
    fn register_tool(&mut self, tool: Tool, handler: Arc<dyn ToolHandler>) {
        let name = tool.name.clone();
        match self.tool_list.iter_mut().find(|t| t.name == name) {
            Some(existing) => {
                tracing::warn!(tool = %name, "tool registered twice, replacing");
                *existing = tool.clone();
            }
            None => self.tool_list.push(tool.clone()),
        }
        self.tools.insert(name, (tool, handler));
    }
}

/// Builder for constructing an MCP Server.
#[derive(Default)]
pub struct ServerBuilder {
    server_name: Option<String>,
    server_version: Option<String>,
}

impl ServerBuilder {
    /// Set server name and version.
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self.server_version = Some(version.into());
        self
    }

    /// Build the server.
    pub fn build(self) -> Server {
        Server {
            server_name: self.server_name.unwrap_or_else(|| "mcpserver".into()),
            server_version: self.server_version.unwrap_or_else(|| "1.0.0".into()),
            tools: HashMap::new(),
            tool_list: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn call(&self, args: Value) -> Result<ToolResult, McpError> {
            let msg = args.get("msg").and_then(|v| v.as_str()).unwrap_or("no msg");
            Ok(text_result(format!("echo: {}", msg)))
        }
    }

    fn echo_tool() -> Tool {
        Tool::new(
            "echo",
            "echoes",
            json!({
                "type": "object",
                "properties": {"msg": {"type": "string"}},
                "required": ["msg"]
            }),
        )
    }

    fn test_server() -> Server {
        let mut srv = Server::builder()
            .server_info("test-server", "0.1.0")
            .build();
        srv.register_tool(echo_tool(), Arc::new(EchoHandler));
        srv
    }

    fn make_req(method: &str, id: Option<Value>, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id,
            method: method.into(),
            params,
        }
    }

    #[tokio::test]
    async fn test_bad_jsonrpc_version() {
        let srv = test_server();
        let req = JsonRpcRequest {
            jsonrpc: "1.0".into(),
            id: Some(json!(1)),
            method: "ping".into(),
            params: None,
        };
        let resp = srv.handle(req).await;
        assert_eq!(resp.error.unwrap().code, ERR_CODE_INVALID_REQ);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let srv = test_server();
        let resp = srv.handle(make_req("resources/list", Some(json!(1)), None)).await;
        assert_eq!(resp.error.unwrap().code, ERR_CODE_NO_METHOD);
    }

    #[tokio::test]
    async fn test_initialize() {
        let srv = test_server();
        let params = json!({
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": {"name": "test", "version": "0.1"}
        });
        let resp = srv.handle(make_req("initialize", Some(json!(1)), Some(params))).await;
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "test-server");
        assert_eq!(result["serverInfo"]["version"], "0.1.0");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_ping() {
        let srv = test_server();
        let resp = srv.handle(make_req("ping", Some(json!(1)), None)).await;
        assert_eq!(resp.result.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_notifications_return_sentinel() {
        let srv = test_server();
        let resp = srv
            .handle(make_req("notifications/initialized", None, None))
            .await;
        assert!(resp.is_notification());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let srv = test_server();
        let resp = srv.handle(make_req("tools/list", Some(json!(1)), None)).await;
        let result = resp.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "echo");
        assert_eq!(tools[0]["description"], "echoes");
        assert_eq!(tools[0]["inputSchema"]["required"][0], "msg");
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let srv = test_server();
        let params = json!({"name": "echo", "arguments": {"msg": "hello"}});
        let resp = srv.handle(make_req("tools/call", Some(json!(1)), Some(params))).await;
        assert!(resp.error.is_none());
        let result: ToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.first_text(), Some("echo: hello"));
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_tools_call_missing_required() {
        let srv = test_server();
        let params = json!({"name": "echo", "arguments": {}});
        let resp = srv.handle(make_req("tools/call", Some(json!(1)), Some(params))).await;
        assert_eq!(resp.error.unwrap().code, ERR_CODE_BAD_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let srv = test_server();
        let resp = srv.handle(make_req("tools/call", Some(json!(1)), None)).await;
        assert_eq!(resp.error.unwrap().code, ERR_CODE_BAD_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let srv = test_server();
        let params = json!({"name": "nonexistent", "arguments": {}});
        let resp = srv.handle(make_req("tools/call", Some(json!(1)), Some(params))).await;
        assert_eq!(resp.error.unwrap().code, ERR_CODE_NO_METHOD);
    }

    #[tokio::test]
    async fn test_tools_call_handler_error_becomes_error_result() {
        let mut srv = Server::builder().build();
        srv.register_tool(
            Tool::new("fail", "fails", json!({"type": "object", "properties": {}})),
            FnToolHandler::new(|_args: Value| async move {
                Err(McpError::ToolError("broken".into()))
            }),
        );
        let params = json!({"name": "fail"});
        let resp = srv.handle(make_req("tools/call", Some(json!(1)), Some(params))).await;
        let result: ToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(result.is_error);
        assert_eq!(result.first_text(), Some("tool error: broken"));
    }

    #[tokio::test]
    async fn test_register_twice_replaces() {
        let mut srv = test_server();
        srv.register_tool(
            echo_tool(),
            FnToolHandler::new(|_args: Value| async move { Ok(text_result("second")) }),
        );
        assert_eq!(srv.tools().len(), 1);

        let params = json!({"name": "echo", "arguments": {"msg": "x"}});
        let resp = srv.handle(make_req("tools/call", Some(json!(1)), Some(params))).await;
        let result: ToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.first_text(), Some("second"));
    }

    #[test]
    fn test_builder_defaults() {
        let srv = Server::builder().build();
        assert_eq!(srv.name(), "mcpserver");
        assert_eq!(srv.server_version, "1.0.0");
        assert!(srv.tools().is_empty());
    }
}

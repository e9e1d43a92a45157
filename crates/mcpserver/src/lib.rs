//! `mcpserver`: a small MCP (Model Context Protocol) tool server.
//!
//! Implements the tools subset of the MCP 2025-03-26 specification.
//! Build a [`Server`], register tools with [`ToolRegistry::register_tool`],
//! then [`Server::run`] it over stdio or streamable HTTP.
//!
//! ```rust
//! use mcpserver::{FnToolHandler, JsonRpcRequest, Server, Tool, ToolRegistry, text_result};
//! use serde_json::{json, Value};
//!
//! # async fn example() {
//! let mut server = Server::builder()
//!     .server_info("my-server", "0.1.0")
//!     .build();
//!
//! server.register_tool(
//!     Tool::new("echo", "echoes", json!({"type": "object", "properties": {"message": {"type": "string"}}})),
//!     FnToolHandler::new(|args: Value| async move {
//!         let msg = args.get("message").and_then(|v| v.as_str()).unwrap_or("");
//!         Ok(text_result(msg))
//!     }),
//! );
//!
//! let req: JsonRpcRequest = serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).unwrap();
//! let resp = server.handle(req).await;
//! let _json = serde_json::to_string(&resp).unwrap();
//! # }
//! ```

pub mod schema;
pub mod server;
pub mod transport_http;
pub mod transport_stdio;
pub mod types;
mod validate;

pub use server::{FnToolHandler, Server, ServerBuilder, ToolHandler, ToolRegistry, Transport};
pub use transport_http::http_router;
pub use types::{
    error_result, json_result, new_error_response, text_result, ContentBlock, JsonRpcRequest,
    JsonRpcResponse, McpError, RpcError, Tool, ToolResult, PROTOCOL_VERSION,
};

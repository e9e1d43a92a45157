use std::sync::Arc;

use mcpserver::{error_result, json_result, FnToolHandler, McpError, Tool, ToolRegistry, ToolResult};
use serde_json::{json, Value};

use super::Deps;

pub const TOOL_NAME: &str = "get_private_storage";
pub const TOOL_DESCRIPTION: &str = "Private Storage - Completions, Stock and Vacancy in Hong Kong. Data source: Rating and Valuation Department";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    #[error("invalid year: {0} is not an integer")]
    NotInteger(String),
    #[error("invalid year: {0} is out of range")]
    OutOfRange(String),
}

pub fn tool() -> Tool {
    Tool::new(
        TOOL_NAME,
        TOOL_DESCRIPTION,
        json!({
            "type": "object",
            "properties": {
                "year": {
                    "type": ["integer", "string", "null"],
                    "pattern": "^\\s*-?[0-9]+\\s*$",
                    "description": "Filter by specific year"
                }
            },
            "additionalProperties": false
        }),
    )
}

pub fn register(srv: &mut dyn ToolRegistry, deps: Arc<Deps>) {
    srv.register_tool(
        tool(),
        FnToolHandler::new(move |args: Value| {
            let deps = deps.clone();
            async move { handle_get_private_storage(&deps, args).await }
        }),
    );
}

async fn handle_get_private_storage(deps: &Deps, args: Value) -> Result<ToolResult, McpError> {
    let year = match parse_year(args.get("year")) {
        Ok(year) => year,
        Err(e) => {
            tracing::info!("get_private_storage: {}", e);
            return Ok(error_payload(&e.to_string()));
        }
    };

    match deps.private_storage.get_private_storage(year).await {
        Ok(records) => json_result(&records),
        Err(e) => {
            tracing::error!("get_private_storage: {}", e);
            Ok(error_payload(&e.to_string()))
        }
    }
}

/// `{"error": message}` as an error tool result.
fn error_payload(message: &str) -> ToolResult {
    error_result(json!({ "error": message }).to_string())
}

/// Interpret the optional `year` argument.
///
/// Absent or null means no filter. Integers, integral floats and strings
/// holding an integer are accepted; anything else is rejected.
pub fn parse_year(value: Option<&Value>) -> Result<Option<i32>, ArgError> {
    let value = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };

    let whole = match value {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.is_finite() && f.fract() == 0.0 => {
                if f.abs() >= i64::MAX as f64 {
                    return Err(ArgError::OutOfRange(value.to_string()));
                }
                f as i64
            }
            _ => return Err(ArgError::NotInteger(value.to_string())),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ArgError::NotInteger(value.to_string()))?,
        _ => return Err(ArgError::NotInteger(value.to_string())),
    };

    i32::try_from(whole)
        .map(Some)
        .map_err(|_| ArgError::OutOfRange(value.to_string()))
}

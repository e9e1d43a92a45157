//! MCP server exposing Hong Kong private housing storage statistics from
//! the Rating and Valuation Department as the `get_private_storage` tool.

pub mod config;
pub mod fetch;
pub mod private_storage;
pub mod tools;

use std::sync::Arc;

use tools::Deps;

pub const SERVER_NAME: &str = "HK OpenAI housing Server";

/// Create the server and register every tool on it.
pub fn build_server(deps: Arc<Deps>) -> mcpserver::Server {
    let mut srv = mcpserver::Server::builder()
        .server_info(SERVER_NAME, env!("CARGO_PKG_VERSION"))
        .build();

    tools::register_all(&mut srv, deps);
    srv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::private_storage::mock::RecordingStorage;

    #[test]
    fn test_build_server() {
        let deps = Arc::new(Deps {
            private_storage: Arc::new(RecordingStorage::new(Vec::new())),
        });
        let srv = build_server(deps);
        assert_eq!(srv.name(), SERVER_NAME);
        let names: Vec<&str> = srv.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["get_private_storage"]);
    }
}

pub mod private_storage;

use std::sync::Arc;

use mcpserver::ToolRegistry;

use crate::private_storage::PrivateStorageApi;

/// Shared dependencies for all tool handlers.
pub struct Deps {
    pub private_storage: Arc<dyn PrivateStorageApi>,
}

/// Register all tool handlers on the given registry.
pub fn register_all(srv: &mut dyn ToolRegistry, deps: Arc<Deps>) {
    private_storage::register(srv, deps);
}

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::store::ShareStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Share record storage.
    pub store: Arc<dyn ShareStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

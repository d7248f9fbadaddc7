pub mod health;
pub mod share;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /share                  create a share (POST)
/// /share/{id}             fetch a share (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(share::router())
}

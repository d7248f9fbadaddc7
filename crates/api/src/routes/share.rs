//! Route definitions for the share gateway.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::share;
use crate::state::AppState;

/// Share routes, merged into the `/api` tree.
///
/// ```text
/// POST   /share         -> create_share
/// GET    /share/{id}    -> get_share
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/share", post(share::create_share))
        .route("/share/{id}", get(share::get_share))
}

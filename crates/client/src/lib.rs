//! HTTP client for the pinboard share gateway.
//!
//! [`api::ShareClient`] talks to `POST /api/share` and `GET /api/share/{id}`;
//! [`session`] feeds the results into an [`Editor`](pinboard_core::editor::Editor).

pub mod api;
pub mod session;

pub use api::{ShareClient, ShareClientError};

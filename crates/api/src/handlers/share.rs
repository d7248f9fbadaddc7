//! Handlers for creating and fetching shares.
//!
//! Shares are public and unauthenticated: anyone holding the id can read
//! the record until it expires.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use pinboard_core::error::CoreError;
use pinboard_core::pins::Annotation;
use pinboard_core::share::{share_url, ShareCreated, SharePayload, ShareRecord};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Shared images are immutable, so clients may cache them for an hour.
const SHARE_CACHE_CONTROL: &str = "public, max-age=3600";

/// Body of `POST /api/share`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShareRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Image is required"))]
    pub image: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "A share may hold at most 500 annotations"))]
    pub annotations: Vec<Annotation>,
}

/// POST /api/share
///
/// Store an image and its annotations, returning the new share id.
pub async fn create_share(
    State(state): State<AppState>,
    body: Result<Json<CreateShareRequest>, JsonRejection>,
) -> AppResult<Json<ShareCreated>> {
    let Json(input) = body?;
    input.validate()?;

    let payload = SharePayload {
        image: input.image,
        annotations: input.annotations,
    };
    payload.validate()?;

    let id = Uuid::new_v4().to_string();
    let record = ShareRecord::new(id.clone(), payload, Utc::now(), state.config.share_ttl());
    let annotation_count = record.annotations.len();
    let expires_at = record.expires_at;
    state.store.insert(record).await.map_err(insert_error)?;

    tracing::info!(
        share_id = %id,
        annotations = annotation_count,
        %expires_at,
        url = %share_url(&state.config.public_base_url, &id),
        "Share created",
    );

    Ok(Json(ShareCreated { id }))
}

/// A freshly generated id that is already taken is a server fault, not a
/// conflict the caller caused.
fn insert_error(err: CoreError) -> AppError {
    match err {
        CoreError::Conflict(msg) => AppError::InternalError(format!("share id collision: {msg}")),
        other => AppError::Core(other),
    }
}

/// GET /api/share/{id}
///
/// Return the stored image and annotations. Unknown and expired ids are 404.
pub async fn get_share(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .store
        .get(&id, Utc::now())
        .await
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Share",
                id: id.clone(),
            })
        })?;

    tracing::debug!(share_id = %id, annotations = record.annotations.len(), "Share fetched");

    Ok((
        [(header::CACHE_CONTROL, SHARE_CACHE_CONTROL)],
        Json(record.to_payload()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn id_collision_is_an_internal_error() {
        let err = insert_error(CoreError::Conflict("share 'abc' already exists".into()));
        assert_matches!(err, AppError::InternalError(msg) if msg.contains("abc"));
    }

    #[test]
    fn other_store_errors_pass_through() {
        let err = insert_error(CoreError::Validation("bad".into()));
        assert_matches!(err, AppError::Core(CoreError::Validation(_)));
    }
}

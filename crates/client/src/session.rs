//! Glue between [`ShareClient`] and an [`Editor`] session.
//!
//! The editor never performs I/O itself. It hands out a [`ShareRequest`]
//! and later accepts the outcome tagged with the request's ticket, so a
//! response that arrives after a newer request was issued is dropped.

use pinboard_core::coords::Size;
use pinboard_core::editor::{Editor, ShareRequest};
use pinboard_core::error::CoreError;
use pinboard_core::share::ShareCreated;

use crate::api::{ShareClient, ShareClientError};

/// Send a share request and reduce the outcome to what the popup needs.
pub async fn request_link(
    client: &ShareClient,
    request: &ShareRequest,
) -> Result<ShareCreated, String> {
    client.create_share(&request.payload).await.map_err(|e| {
        tracing::warn!(ticket = request.ticket.sequence(), error = %e, "Share request failed");
        e.user_message()
    })
}

/// Run the whole share flow on `editor`: open the popup, create the share
/// and show the link built from `link_base`.
///
/// Returns whether the popup was updated. Fails only when the editor
/// refuses to share (view-only session or no image loaded).
pub async fn share_editor(
    client: &ShareClient,
    editor: &mut Editor,
    link_base: &str,
) -> Result<bool, CoreError> {
    let request = editor.begin_share()?;
    let outcome = request_link(client, &request).await;
    Ok(editor.finish_share(request.ticket, link_base, outcome))
}

/// Fetch a share and open it in a read-only session.
///
/// `image_size` is only consulted when the stored image is a URL or blob
/// rather than a data URI; the host measures such images itself.
pub async fn open_shared(
    client: &ShareClient,
    container: Size,
    id: &str,
    image_size: Option<Size>,
) -> Result<Editor, ShareClientError> {
    let payload = client.fetch_share(id).await?;
    let editor = Editor::view_share_measured(container, payload, image_size)?;
    tracing::info!(share_id = %id, pins = editor.pins().len(), "Opened shared image");
    Ok(editor)
}

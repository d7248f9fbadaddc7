//! Integration tests for the share client against a live gateway.
//!
//! Each test binds the real router to an ephemeral port and talks to it
//! over HTTP.

use std::sync::Arc;

use assert_matches::assert_matches;
use pinboard_api::config::ServerConfig;
use pinboard_api::router::build_app_router;
use pinboard_api::state::AppState;
use pinboard_api::store::InMemoryShareStore;
use pinboard_client::session::{open_shared, request_link, share_editor};
use pinboard_client::{ShareClient, ShareClientError};
use pinboard_core::coords::{Point, Size};
use pinboard_core::editor::{Editor, PointerOutcome, PointerTarget};
use pinboard_core::error::CoreError;
use pinboard_core::gesture::PointerKind;
use pinboard_core::mode::EditMode;
use pinboard_core::pins::PinId;
use pinboard_core::share::{SharePayload, ShareStatus, SHARE_FAILED_MESSAGE};

const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

const LINK_BASE: &str = "https://pins.example.com";

const CONTAINER: Size = Size::new(800.0, 600.0);

/// Serve the gateway on `127.0.0.1:0` and return its base URL.
async fn spawn_gateway() -> String {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        share_ttl_hours: 168,
        share_sweep_interval_secs: 3600,
        max_body_bytes: 1024 * 1024,
        public_base_url: LINK_BASE.to_string(),
    };
    let state = AppState {
        store: Arc::new(InMemoryShareStore::new()),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn editor_with_pin(text: &str) -> (Editor, PinId) {
    let mut editor = Editor::new(CONTAINER).unwrap();
    editor.load_image_uri(PNG_DATA_URI).unwrap();
    editor.set_edit_mode(EditMode::Comment).unwrap();

    // The 1x1 image is drawn at its natural size in the container's corner.
    let at = Point::new(0.5, 0.5);
    editor.pointer_down(PointerKind::Mouse, at, PointerTarget::Canvas);
    let outcome = editor.pointer_up(at);
    let PointerOutcome::PinCreated(id) = outcome else {
        panic!("expected a pin, got {outcome:?}");
    };
    editor.input_text(text).unwrap();
    editor.press_enter().unwrap();
    (editor, id)
}

// ---------------------------------------------------------------------------
// Test: create_share then fetch_share returns the same payload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_fetch_round_trip() {
    let client = ShareClient::new(spawn_gateway().await);
    let payload = SharePayload {
        image: PNG_DATA_URI.to_string(),
        annotations: vec![],
    };

    let created = client.create_share(&payload).await.unwrap();
    let fetched = client.fetch_share(&created.id).await.unwrap();

    assert_eq!(fetched, payload);
}

// ---------------------------------------------------------------------------
// Test: Unknown id maps to NotFound
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_unknown_share_is_not_found() {
    let client = ShareClient::new(spawn_gateway().await);

    let err = client.fetch_share("unknown-id").await.unwrap_err();

    assert_matches!(err, ShareClientError::NotFound(id) if id == "unknown-id");
}

// ---------------------------------------------------------------------------
// Test: Validation failures carry the gateway's message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_share_reports_gateway_message() {
    let client = ShareClient::new(spawn_gateway().await);
    let payload = SharePayload {
        image: String::new(),
        annotations: vec![],
    };

    let err = client.create_share(&payload).await.unwrap_err();

    assert_matches!(err, ShareClientError::Api { status: 400, ref body } if body == "Image is required");
    assert_eq!(err.user_message(), "Image is required");
}

// ---------------------------------------------------------------------------
// Test: Full share flow shows a link that opens a read-only copy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn share_editor_then_open_shared() {
    let client = ShareClient::new(spawn_gateway().await);
    let (mut editor, pin) = editor_with_pin("hello");

    assert!(share_editor(&client, &mut editor, LINK_BASE).await.unwrap());

    let url = editor.share().copyable_link().expect("link must be ready").to_string();
    let prefix = format!("{LINK_BASE}/index.html?id=");
    assert!(url.starts_with(&prefix), "unexpected link {url}");
    let id = &url[prefix.len()..];

    let viewer = open_shared(&client, CONTAINER, id, None).await.unwrap();
    assert!(viewer.is_view_only());
    assert_eq!(viewer.pins().len(), 1);
    let shared = viewer.pins().get(&pin).unwrap();
    assert_eq!(shared.text, "hello");
    assert!(shared.position().is_within_bounds());
}

// ---------------------------------------------------------------------------
// Test: A response for a superseded request is ignored
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stale_share_response_is_ignored() {
    let client = ShareClient::new(spawn_gateway().await);
    let (mut editor, _) = editor_with_pin("first");

    let first = editor.begin_share().unwrap();
    let second = editor.begin_share().unwrap();

    let late = request_link(&client, &first).await;
    assert!(!editor.finish_share(first.ticket, LINK_BASE, late));
    assert_eq!(editor.share().status(), &ShareStatus::Loading);

    let current = request_link(&client, &second).await;
    assert!(editor.finish_share(second.ticket, LINK_BASE, current));
    assert!(editor.share().copyable_link().is_some());
}

// ---------------------------------------------------------------------------
// Test: Network failure shows the generic popup error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_gateway_shows_generic_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ShareClient::new(format!("http://{addr}"));
    let (mut editor, _) = editor_with_pin("offline");

    assert!(share_editor(&client, &mut editor, LINK_BASE).await.unwrap());
    assert_eq!(
        editor.share().status(),
        &ShareStatus::Failed {
            message: SHARE_FAILED_MESSAGE.to_string()
        }
    );

    let err = client.fetch_share("anything").await.unwrap_err();
    assert_matches!(err, ShareClientError::Request(_));
}

// ---------------------------------------------------------------------------
// Test: Opening a share never produces an editable session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_shared_missing_id_leaves_no_session() {
    let client = ShareClient::new(spawn_gateway().await);

    let result = open_shared(&client, CONTAINER, "missing", None).await;

    assert_matches!(result, Err(ShareClientError::NotFound(_)));
}

// ---------------------------------------------------------------------------
// Test: A share holding a URL image opens with a host-measured size
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_shared_url_image_uses_measured_size() {
    let client = ShareClient::new(spawn_gateway().await);
    let payload = SharePayload {
        image: "https://cdn.example.com/photo.jpg".to_string(),
        annotations: vec![],
    };
    let created = client.create_share(&payload).await.unwrap();

    let unmeasured = open_shared(&client, CONTAINER, &created.id, None).await;
    assert_matches!(
        unmeasured,
        Err(ShareClientError::Core(CoreError::ImageDecode(_)))
    );

    let viewer = open_shared(&client, CONTAINER, &created.id, Some(Size::new(640.0, 480.0)))
        .await
        .unwrap();
    assert!(viewer.is_view_only());
    assert_eq!(viewer.image().unwrap().reference, payload.image);
    assert_eq!(viewer.viewport().unwrap().image(), Size::new(640.0, 480.0));
}

//! Share wire types, validation and the client-side share popup flow.
//!
//! The same [`SharePayload`] is the request body of `POST /api/share` and the
//! response body of `GET /api/share/{id}`.

use std::collections::HashSet;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::pins::Annotation;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default lifetime of a share record (7 days).
pub const SHARE_TTL_HOURS_DEFAULT: i64 = 168;

/// Maximum number of annotations accepted in one share.
pub const MAX_ANNOTATIONS_PER_SHARE: usize = 500;

/// Popup text shown while the request is in flight.
pub const SHARE_LOADING_MESSAGE: &str = "Generating link…";

/// Popup text when sharing fails without a more specific reason.
pub const SHARE_FAILED_MESSAGE: &str = "Error generating link. Please try again.";

/// Popup text when there is nothing to share.
pub const SHARE_NO_IMAGE_MESSAGE: &str = "No image data available. Please upload an image first.";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// An image plus its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharePayload {
    /// A `data:` URI or an opaque reference the host can resolve.
    pub image: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl SharePayload {
    /// Build a payload from the current pins. Pins without text are left out.
    pub fn from_pins<'a>(
        image: impl Into<String>,
        pins: impl IntoIterator<Item = &'a Annotation>,
    ) -> Self {
        Self {
            image: image.into(),
            annotations: pins.into_iter().filter(|p| p.has_text()).cloned().collect(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_image_reference(&self.image)?;
        validate_annotations(&self.annotations)
    }
}

/// Response of `POST /api/share`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareCreated {
    pub id: String,
}

/// A stored share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub id: String,
    pub image: String,
    pub annotations: Vec<Annotation>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl ShareRecord {
    pub fn new(id: String, payload: SharePayload, created_at: Timestamp, ttl: Duration) -> Self {
        Self {
            id,
            image: payload.image,
            annotations: payload.annotations,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    pub fn to_payload(&self) -> SharePayload {
        SharePayload {
            image: self.image.clone(),
            annotations: self.annotations.clone(),
        }
    }
}

/// The link a recipient opens to view a share.
pub fn share_url(base: &str, id: &str) -> String {
    format!("{}/index.html?id={id}", base.trim_end_matches('/'))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// The image must be non-empty, and a `data:` URI must carry an `image/*`
/// media type. Other references are accepted as-is.
pub fn validate_image_reference(image: &str) -> Result<(), CoreError> {
    if image.trim().is_empty() {
        return Err(CoreError::Validation("Image is required".to_string()));
    }
    if let Some(rest) = image.strip_prefix("data:") {
        let media_type = rest.split(|c: char| c == ';' || c == ',').next().unwrap_or_default();
        if !media_type.starts_with("image/") {
            return Err(CoreError::Validation(format!(
                "Image data URI must have an image/* media type, got '{media_type}'"
            )));
        }
    }
    Ok(())
}

pub fn validate_annotations(annotations: &[Annotation]) -> Result<(), CoreError> {
    if annotations.len() > MAX_ANNOTATIONS_PER_SHARE {
        return Err(CoreError::Validation(format!(
            "A share may hold at most {MAX_ANNOTATIONS_PER_SHARE} annotations, got {}",
            annotations.len()
        )));
    }
    let mut seen = HashSet::with_capacity(annotations.len());
    for annotation in annotations {
        annotation.validate()?;
        if !seen.insert(annotation.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "duplicate annotation id '{}'",
                annotation.id
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Share popup flow
// ---------------------------------------------------------------------------

/// Identifies one share request. Only the most recent ticket may update the
/// popup; responses carrying an older one are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ShareTicket(u64);

impl ShareTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShareStatus {
    #[default]
    Idle,
    Loading,
    Ready { url: String },
    Failed { message: String },
}

impl ShareStatus {
    /// Text for the popup's link field.
    pub fn display_text(&self) -> &str {
        match self {
            Self::Idle => "",
            Self::Loading => SHARE_LOADING_MESSAGE,
            Self::Ready { url } => url.as_str(),
            Self::Failed { message } => message.as_str(),
        }
    }
}

/// State of the share popup and the request behind it.
#[derive(Debug, Clone, Default)]
pub struct ShareFlow {
    visible: bool,
    status: ShareStatus,
    latest: u64,
}

impl ShareFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the popup in the loading state and issue a ticket for a new
    /// request. Any request still in flight becomes stale.
    pub fn begin(&mut self) -> ShareTicket {
        self.latest += 1;
        self.visible = true;
        self.status = ShareStatus::Loading;
        ShareTicket(self.latest)
    }

    /// Apply a response. `outcome` is the share URL or an error message.
    /// Returns `false` when the ticket is stale and nothing changed.
    pub fn resolve(&mut self, ticket: ShareTicket, outcome: Result<String, String>) -> bool {
        if ticket.0 != self.latest {
            return false;
        }
        self.status = match outcome {
            Ok(url) => ShareStatus::Ready { url },
            Err(message) if message.trim().is_empty() => ShareStatus::Failed {
                message: SHARE_FAILED_MESSAGE.to_string(),
            },
            Err(message) => ShareStatus::Failed { message },
        };
        true
    }

    /// Show the popup with an error without issuing a request.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.latest += 1;
        self.visible = true;
        self.status = ShareStatus::Failed {
            message: message.into(),
        };
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn status(&self) -> &ShareStatus {
        &self.status
    }

    /// The link to put on the clipboard, once one exists.
    pub fn copyable_link(&self) -> Option<&str> {
        match &self.status {
            ShareStatus::Ready { url } => Some(url.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Percent;
    use crate::pins::{PinColor, PinStore};
    use assert_matches::assert_matches;

    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn payload_defaults_missing_annotations() {
        let payload: SharePayload =
            serde_json::from_value(serde_json::json!({ "image": PNG_URI })).unwrap();
        assert!(payload.annotations.is_empty());
        payload.validate().unwrap();
    }

    #[test]
    fn from_pins_skips_blank_comments() {
        let mut store = PinStore::new();
        let kept = store.create(Percent::new(10.0, 10.0), PinColor::default()).id.clone();
        store.set_text(&kept, "keep me").unwrap();
        store.create(Percent::new(20.0, 20.0), PinColor::default());

        let payload = SharePayload::from_pins(PNG_URI, store.iter());
        assert_eq!(payload.annotations.len(), 1);
        assert_eq!(payload.annotations[0].id, kept);
    }

    #[test]
    fn image_reference_rules() {
        assert_matches!(validate_image_reference(""), Err(CoreError::Validation(_)));
        assert_matches!(validate_image_reference("   "), Err(CoreError::Validation(_)));
        assert_matches!(
            validate_image_reference("data:text/plain;base64,aGk="),
            Err(CoreError::Validation(_))
        );
        assert!(validate_image_reference(PNG_URI).is_ok());
        assert!(validate_image_reference("blob:https://example.com/1234").is_ok());
    }

    #[test]
    fn too_many_annotations_rejected() {
        let annotation: Annotation = serde_json::from_value(serde_json::json!({
            "id": "a", "x": 1.0, "y": 1.0, "text": "t", "color": "#112233"
        }))
        .unwrap();
        let annotations = vec![annotation; MAX_ANNOTATIONS_PER_SHARE + 1];
        assert_matches!(validate_annotations(&annotations), Err(CoreError::Validation(_)));
    }

    #[test]
    fn duplicate_annotation_ids_rejected() {
        let annotation: Annotation = serde_json::from_value(serde_json::json!({
            "id": "1", "x": 10.0, "y": 10.0, "text": "t"
        }))
        .unwrap();
        let annotations = vec![annotation.clone(), annotation];
        assert_matches!(validate_annotations(&annotations), Err(CoreError::Validation(_)));
    }

    #[test]
    fn share_url_format() {
        assert_eq!(
            share_url("https://pins.example.com/", "abc"),
            "https://pins.example.com/index.html?id=abc"
        );
        assert_eq!(share_url("http://localhost:3000", "x"), "http://localhost:3000/index.html?id=x");
    }

    #[test]
    fn record_expiry() {
        let now = chrono::Utc::now();
        let record = ShareRecord::new(
            "id".into(),
            SharePayload { image: PNG_URI.into(), annotations: vec![] },
            now,
            Duration::hours(SHARE_TTL_HOURS_DEFAULT),
        );
        assert!(!record.is_expired(now));
        assert!(!record.is_expired(now + Duration::hours(167)));
        assert!(record.is_expired(now + Duration::hours(168)));
    }

    // -- ShareFlow ----------------------------------------------------------

    #[test]
    fn begin_shows_loading() {
        let mut flow = ShareFlow::new();
        flow.begin();
        assert!(flow.is_visible());
        assert_eq!(flow.status(), &ShareStatus::Loading);
        assert_eq!(flow.status().display_text(), SHARE_LOADING_MESSAGE);
        assert_eq!(flow.copyable_link(), None);
    }

    #[test]
    fn stale_responses_are_ignored() {
        let mut flow = ShareFlow::new();
        let first = flow.begin();
        let second = flow.begin();

        assert!(flow.resolve(second, Ok("https://x/index.html?id=2".into())));
        assert!(!flow.resolve(first, Ok("https://x/index.html?id=1".into())));
        assert_eq!(flow.copyable_link(), Some("https://x/index.html?id=2"));
    }

    #[test]
    fn stale_error_does_not_clobber_link() {
        let mut flow = ShareFlow::new();
        let first = flow.begin();
        let second = flow.begin();
        flow.resolve(second, Ok("url".into()));
        assert!(!flow.resolve(first, Err("boom".into())));
        assert_matches!(flow.status(), ShareStatus::Ready { .. });
    }

    #[test]
    fn blank_error_uses_generic_message() {
        let mut flow = ShareFlow::new();
        let ticket = flow.begin();
        flow.resolve(ticket, Err(String::new()));
        assert_eq!(flow.status().display_text(), SHARE_FAILED_MESSAGE);
    }

    #[test]
    fn fail_invalidates_in_flight_request() {
        let mut flow = ShareFlow::new();
        let ticket = flow.begin();
        flow.fail(SHARE_NO_IMAGE_MESSAGE);
        assert!(!flow.resolve(ticket, Ok("url".into())));
        assert_eq!(flow.status().display_text(), SHARE_NO_IMAGE_MESSAGE);
    }

    #[test]
    fn close_hides_popup() {
        let mut flow = ShareFlow::new();
        flow.begin();
        flow.close();
        assert!(!flow.is_visible());
    }
}

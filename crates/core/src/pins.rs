//! Annotation records and the ordered pin store for one image session.
//!
//! Blank comments are never persisted: committing text that is empty after
//! trimming deletes the pin instead of saving it.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coords::Percent;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Color assigned to new pins until the user picks another one.
pub const DEFAULT_PIN_COLOR: &str = "#00c853";

/// Comments longer than this many characters render in the small-text style.
pub const LONG_COMMENT_THRESHOLD: usize = 100;

/// Maximum comment length in characters.
pub const MAX_COMMENT_LENGTH: usize = 5000;

// ---------------------------------------------------------------------------
// Pin identity
// ---------------------------------------------------------------------------

/// Opaque pin identifier.
///
/// Locally created ids are time-ordered UUIDv7 strings; ids that arrive in a
/// loaded share are accepted verbatim as long as they are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PinId(String);

impl PinId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PinId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(CoreError::Validation("pin id must not be empty".to_string()));
        }
        Ok(Self(value))
    }
}

impl From<PinId> for String {
    fn from(id: PinId) -> Self {
        id.0
    }
}

impl FromStr for PinId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Pin color
// ---------------------------------------------------------------------------

/// An opaque RGB color, written as `#rrggbb` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PinColor {
    r: u8,
    g: u8,
    b: u8,
}

impl PinColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` hex string (either case).
    pub fn parse(color: &str) -> Result<Self, CoreError> {
        let hex = color.strip_prefix('#').ok_or_else(|| {
            CoreError::Validation(format!("Invalid color '{color}'. Must start with '#'"))
        })?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::Validation(format!(
                "Invalid color '{color}'. Must be in #RRGGBB hex format"
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| CoreError::Validation(format!("Invalid color '{color}': {e}")))
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for PinColor {
    fn default() -> Self {
        // #00c853
        Self::rgb(0x00, 0xc8, 0x53)
    }
}

impl TryFrom<String> for PinColor {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PinColor> for String {
    fn from(color: PinColor) -> Self {
        color.to_hex()
    }
}

impl FromStr for PinColor {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PinColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

/// A pin with a text comment, anchored at a percentage position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: PinId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub color: PinColor,
}

impl Annotation {
    pub fn position(&self) -> Percent {
        Percent::new(self.x, self.y)
    }

    /// Whether the comment has any non-whitespace content.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn is_long_comment(&self) -> bool {
        is_long_comment(&self.text)
    }

    /// Structural checks applied to annotations received from outside.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(CoreError::Validation(format!(
                "annotation '{}' has a non-finite position",
                self.id
            )));
        }
        let len = self.text.chars().count();
        if len > MAX_COMMENT_LENGTH {
            return Err(CoreError::Validation(format!(
                "annotation '{}' text has {len} characters, maximum is {MAX_COMMENT_LENGTH}",
                self.id
            )));
        }
        Ok(())
    }
}

/// Returns `true` if `text` should use the small-text style.
pub fn is_long_comment(text: &str) -> bool {
    text.chars().count() > LONG_COMMENT_THRESHOLD
}

// ---------------------------------------------------------------------------
// Pin store
// ---------------------------------------------------------------------------

/// What committing a comment did to the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCommit {
    Saved,
    /// The text was blank, so the pin was removed.
    Deleted,
}

/// Ordered collection of annotations for one image.
///
/// Iteration order is creation order. Every id this store has ever held is
/// remembered, so generated ids are never handed out twice.
#[derive(Debug, Clone, Default)]
pub struct PinStore {
    pins: Vec<Annotation>,
    active: Option<PinId>,
    issued: HashSet<PinId>,
}

impl PinStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new pin with empty text and make it the active pin.
    pub fn create(&mut self, at: Percent, color: PinColor) -> &Annotation {
        let mut id = PinId::generate();
        while self.issued.contains(&id) {
            id = PinId::generate();
        }
        self.issued.insert(id.clone());
        self.active = Some(id.clone());
        self.pins.push(Annotation {
            id,
            x: at.x,
            y: at.y,
            text: String::new(),
            color,
        });
        &self.pins[self.pins.len() - 1]
    }

    /// Record live text edits. Blank text is kept until the edit is committed.
    pub fn set_text(&mut self, id: &PinId, text: &str) -> Result<(), CoreError> {
        let pin = self.get_mut(id)?;
        pin.text = text.to_string();
        Ok(())
    }

    /// Commit a comment: blank text deletes the pin, anything else is saved.
    pub fn commit_text(&mut self, id: &PinId, text: &str) -> Result<TextCommit, CoreError> {
        if text.trim().is_empty() {
            if !self.delete(id) {
                return Err(not_found(id));
            }
            return Ok(TextCommit::Deleted);
        }
        self.set_text(id, text)?;
        Ok(TextCommit::Saved)
    }

    /// Move a pin, clamping the position into `[0, 100]`. Returns the stored
    /// position.
    pub fn move_pin(&mut self, id: &PinId, to: Percent) -> Result<Percent, CoreError> {
        let clamped = to.clamped();
        let pin = self.get_mut(id)?;
        pin.x = clamped.x;
        pin.y = clamped.y;
        Ok(clamped)
    }

    /// Remove a pin. Returns `false` when the id was not present.
    pub fn delete(&mut self, id: &PinId) -> bool {
        let before = self.pins.len();
        self.pins.retain(|p| &p.id != id);
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        self.pins.len() != before
    }

    /// Replace the contents with annotations from a loaded share.
    pub fn load(&mut self, annotations: Vec<Annotation>) -> Result<(), CoreError> {
        let mut seen = HashSet::with_capacity(annotations.len());
        for annotation in &annotations {
            annotation.validate()?;
            if !seen.insert(annotation.id.clone()) {
                return Err(CoreError::Conflict(format!(
                    "duplicate annotation id '{}'",
                    annotation.id
                )));
            }
        }
        self.issued.extend(seen);
        self.pins = annotations;
        self.active = None;
        Ok(())
    }

    /// Drop every pin (a new image was uploaded). Issued ids stay retired.
    pub fn clear(&mut self) {
        self.pins.clear();
        self.active = None;
    }

    pub fn get(&self, id: &PinId) -> Option<&Annotation> {
        self.pins.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PinId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.pins.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.pins
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn active(&self) -> Option<&PinId> {
        self.active.as_ref()
    }

    /// Mark a pin active, or deactivate all pins with `None`. Unknown ids
    /// deactivate.
    pub fn set_active(&mut self, id: Option<&PinId>) {
        self.active = id.filter(|id| self.contains(id)).cloned();
    }

    fn get_mut(&mut self, id: &PinId) -> Result<&mut Annotation, CoreError> {
        self.pins
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: &PinId) -> CoreError {
    CoreError::NotFound {
        entity: "Annotation",
        id: id.to_string(),
    }
}

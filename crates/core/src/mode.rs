//! Interaction modes selected from the toolbar.
//!
//! `Move` and `Comment` are editing modes. `Share` is not: selecting it shows
//! the share popup on top of whichever editing mode was active, and closing
//! the popup returns to that mode.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Editing modes
// ---------------------------------------------------------------------------

/// What a pointer press on the canvas does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    /// Drag pins, pan while zoomed, click pins to zoom to them.
    #[default]
    Move,
    /// Click empty canvas to drop a pin and open its comment editor.
    Comment,
}

impl EditMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Comment => "comment",
        }
    }
}

// ---------------------------------------------------------------------------
// Toolbar modes
// ---------------------------------------------------------------------------

/// The three toolbar buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Move,
    Comment,
    Share,
}

/// All valid mode names, in toolbar order.
pub const ALL_MODE_NAMES: &[&str] = &["move", "comment", "share"];

impl Mode {
    /// Parse a mode name.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "move" => Ok(Self::Move),
            "comment" => Ok(Self::Comment),
            "share" => Ok(Self::Share),
            _ => Err(CoreError::Validation(format!(
                "Invalid mode '{s}'. Must be one of: {}",
                ALL_MODE_NAMES.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Comment => "comment",
            Self::Share => "share",
        }
    }

    /// The editing mode this toolbar mode selects, or `None` for `Share`.
    pub fn edit_mode(&self) -> Option<EditMode> {
        match self {
            Self::Move => Some(EditMode::Move),
            Self::Comment => Some(EditMode::Comment),
            Self::Share => None,
        }
    }
}

impl From<EditMode> for Mode {
    fn from(mode: EditMode) -> Self {
        match mode {
            EditMode::Move => Self::Move,
            EditMode::Comment => Self::Comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn default_edit_mode_is_move() {
        assert_eq!(EditMode::default(), EditMode::Move);
    }

    #[test]
    fn mode_names_parse_back() {
        for name in ALL_MODE_NAMES {
            assert_eq!(Mode::from_str_value(name).unwrap().as_str(), *name);
        }
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert_matches!(Mode::from_str_value("draw"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn share_is_not_an_edit_mode() {
        assert_eq!(Mode::Share.edit_mode(), None);
        assert_eq!(Mode::Comment.edit_mode(), Some(EditMode::Comment));
        assert_eq!(Mode::from(EditMode::Move), Mode::Move);
    }
}

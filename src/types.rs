//! Core type definitions for compile-time safety.
//!
//! Identifiers are newtypes so an item id can never be mixed up with a
//! position, and the stringly-typed tags of a service file are parsed into
//! enums at the edge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable service item identifier.
///
/// Slides refer back to their item through this id only; positions change on
/// every structural edit, ids never do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    /// Create a new `ItemId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What a service item projects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemKind {
    /// Song lyrics, one slide per text entry.
    Song,
    /// A still image.
    #[default]
    Image,
    /// A video clip.
    Video,
    /// A multi-page presentation (PDF pages or an html deck).
    Presentation,
    /// Any tag this version does not know; kept verbatim.
    Other(String),
}

impl ItemKind {
    /// The tag written to service files.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Song => "song",
            Self::Image => "image",
            Self::Video => "video",
            Self::Presentation => "presentation",
            Self::Other(tag) => tag,
        }
    }

    /// Whether slides of this kind can be addressed by index inside the item.
    pub const fn has_addressable_slides(&self) -> bool {
        matches!(self, Self::Song | Self::Presentation)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ItemKind {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "song" => Self::Song,
            "image" => Self::Image,
            "video" => Self::Video,
            "presentation" => Self::Presentation,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for ItemKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ItemKind> for String {
    fn from(kind: ItemKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Kind of media behind an item's background reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    /// Still image background.
    #[default]
    Image,
    /// Video background.
    Video,
}

impl BackgroundKind {
    /// Returns the lowercase tag of this background kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// Horizontal text alignment on a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    /// Flush left.
    Left,
    /// Centered.
    #[default]
    Center,
    /// Flush right.
    Right,
}

/// Vertical text alignment on a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    /// Top edge.
    Top,
    /// Centered.
    #[default]
    Center,
    /// Bottom edge.
    Bottom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_parses_known_tags() {
        assert_eq!(ItemKind::from("song"), ItemKind::Song);
        assert_eq!(ItemKind::from("Presentation"), ItemKind::Presentation);
        assert_eq!(ItemKind::from("slideshow"), ItemKind::Other("slideshow".into()));
    }

    #[test]
    fn test_item_kind_serializes_as_tag() {
        let json = serde_json::to_string(&ItemKind::Video).unwrap_or_default();
        assert_eq!(json, "\"video\"");
        let other: ItemKind = serde_json::from_str("\"web\"").unwrap_or_default();
        assert_eq!(other, ItemKind::Other("web".into()));
    }

    #[test]
    fn test_addressable_kinds() {
        assert!(ItemKind::Song.has_addressable_slides());
        assert!(ItemKind::Presentation.has_addressable_slides());
        assert!(!ItemKind::Image.has_addressable_slides());
        assert!(!ItemKind::Video.has_addressable_slides());
    }

    #[test]
    fn test_background_kind_name_matches_tag() {
        for kind in [BackgroundKind::Image, BackgroundKind::Video] {
            let json = serde_json::to_string(&kind).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", kind.name()));
        }
    }

    #[test]
    fn test_item_ids_are_unique() {
        assert_ne!(ItemId::generate(), ItemId::generate());
    }
}

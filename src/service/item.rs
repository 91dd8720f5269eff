//! The service item record.

use std::path::Path;

use crate::constants::style::{DEFAULT_FONT, DEFAULT_FONT_SIZE};
use crate::slides::derive::slide_count;
use crate::types::{BackgroundKind, HorizontalAlignment, ItemId, ItemKind, VerticalAlignment};

/// One entry in the service queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceItem {
    /// Stable identifier slides use to refer back to this item.
    pub id: ItemId,
    /// Display label.
    pub name: String,
    /// What the item projects.
    pub kind: ItemKind,
    /// Background media reference (path or `file://` URL).
    pub background: String,
    /// Whether `background` is an image or a video.
    pub background_kind: BackgroundKind,
    /// Ordered slide texts (lyrics for songs).
    pub text: Vec<String>,
    /// Audio reference; empty when the item has none.
    pub audio: String,
    /// Font family.
    pub font: String,
    /// Font size in points.
    pub font_size: u32,
    /// Horizontal text alignment.
    pub horizontal_alignment: HorizontalAlignment,
    /// Vertical text alignment.
    pub vertical_alignment: VerticalAlignment,
    /// Number of slides this item expands to.
    pub slide_number: usize,
    /// Reveal steps inside an html deck; playback walks them before leaving the slide.
    pub reveal_steps: usize,
    /// Currently being projected.
    pub active: bool,
    /// Marked by the operator for a batch operation.
    pub selected: bool,
    /// Whether playback of this item's slides wraps around.
    pub looping: bool,
    /// Start of the playable part of a video background, in seconds.
    pub video_start_time: f32,
    /// End of the playable part of a video background, in seconds (0 = to the end).
    pub video_end_time: f32,
}

impl Default for ServiceItem {
    fn default() -> Self {
        Self {
            id: ItemId::generate(),
            name: String::new(),
            kind: ItemKind::default(),
            background: String::new(),
            background_kind: BackgroundKind::default(),
            text: Vec::new(),
            audio: String::new(),
            font: DEFAULT_FONT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            horizontal_alignment: HorizontalAlignment::default(),
            vertical_alignment: VerticalAlignment::default(),
            slide_number: 1,
            reveal_steps: 0,
            active: false,
            selected: false,
            looping: false,
            video_start_time: 0.0,
            video_end_time: 0.0,
        }
    }
}

impl ServiceItem {
    /// Create an item of the given kind with default styling.
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        let mut item = Self {
            name: name.into(),
            kind,
            ..Self::default()
        };
        item.normalize();
        item
    }

    /// A song with one slide per lyric block.
    pub fn song(name: impl Into<String>, text: Vec<String>) -> Self {
        let mut item = Self::new(name, ItemKind::Song);
        item.text = text;
        item.normalize();
        item
    }

    /// A single image.
    pub fn image(name: impl Into<String>, background: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Image).with_background(background, BackgroundKind::Image)
    }

    /// A single video clip.
    pub fn video(name: impl Into<String>, background: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Video).with_background(background, BackgroundKind::Video)
    }

    /// A presentation with `pages` slides.
    ///
    /// Html decks collapse to one slide and keep `pages` as reveal steps.
    pub fn presentation(name: impl Into<String>, background: impl Into<String>, pages: usize) -> Self {
        let mut item = Self::new(name, ItemKind::Presentation);
        item.background = background.into();
        item.background_kind = BackgroundKind::Image;
        item.slide_number = pages;
        if item.is_html() {
            item.reveal_steps = pages.max(1);
        }
        item.normalize();
        item
    }

    /// The item a fresh service starts with when nothing was saved before.
    pub fn seed() -> Self {
        Self::new("", ItemKind::Image)
    }

    /// Set the background reference and its kind.
    #[must_use]
    pub fn with_background(mut self, background: impl Into<String>, kind: BackgroundKind) -> Self {
        self.background = background.into();
        self.background_kind = kind;
        self.normalize();
        self
    }

    /// Set the audio reference.
    #[must_use]
    pub fn with_audio(mut self, audio: impl Into<String>) -> Self {
        self.audio = audio.into();
        self
    }

    /// Set font family and size.
    #[must_use]
    pub fn with_font(mut self, font: impl Into<String>, size: u32) -> Self {
        self.font = font.into();
        self.font_size = size;
        self
    }

    /// Set the text alignment.
    #[must_use]
    pub const fn with_alignment(mut self, horizontal: HorizontalAlignment, vertical: VerticalAlignment) -> Self {
        self.horizontal_alignment = horizontal;
        self.vertical_alignment = vertical;
        self
    }

    /// Set the loop flag.
    #[must_use]
    pub const fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Set the video trim points.
    #[must_use]
    pub const fn with_video_range(mut self, start: f32, end: f32) -> Self {
        self.video_start_time = start;
        self.video_end_time = end;
        self
    }

    /// Recompute `slide_number` from kind, text and background.
    ///
    /// Returns `true` when the stored count was stale.
    pub fn normalize(&mut self) -> bool {
        let count = slide_count(self);
        let stale = count != self.slide_number;
        self.slide_number = count;
        stale
    }

    /// Whether the background is a single html deck rather than rendered pages.
    pub fn is_html(&self) -> bool {
        self.kind == ItemKind::Presentation && is_html_path(&self.background)
    }
}

/// Case-insensitive `.html` check on a media reference.
pub fn is_html_path(reference: &str) -> bool {
    Path::new(reference)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_slide_number_follows_text() {
        let song = ServiceItem::song("Amazing Grace", vec!["v1".into(), "v2".into(), "v3".into()]);
        assert_eq!(song.slide_number, 3);
        assert_eq!(song.kind, ItemKind::Song);
    }

    #[test]
    fn test_seed_item() {
        let seed = ServiceItem::seed();
        assert_eq!(seed.kind, ItemKind::Image);
        assert!(seed.text.is_empty());
        assert_eq!(seed.slide_number, 1);
        assert!(!seed.active);
    }

    #[test]
    fn test_normalize_reports_stale_count() {
        let mut item = ServiceItem::song("Song", vec!["a".into()]);
        item.text.push("b".into());
        assert!(item.normalize());
        assert_eq!(item.slide_number, 2);
        assert!(!item.normalize());
    }

    #[test]
    fn test_presentation_pages() {
        let deck = ServiceItem::presentation("Sermon", "/slides/sermon.pdf", 12);
        assert_eq!(deck.slide_number, 12);
        let html = ServiceItem::presentation("Reveal", "/slides/deck.HTML", 12);
        assert!(html.is_html());
        assert_eq!(html.slide_number, 1);
        assert_eq!(html.reveal_steps, 12);
        assert_eq!(deck.reveal_steps, 0);
    }

    #[test]
    fn test_alignment_defaults_to_center() {
        let item = ServiceItem::image("Logo", "/img/logo.png");
        assert_eq!(item.horizontal_alignment, HorizontalAlignment::Center);
        assert_eq!(item.vertical_alignment, VerticalAlignment::Center);
        let item = item.with_alignment(HorizontalAlignment::Left, VerticalAlignment::Bottom);
        assert_eq!(item.horizontal_alignment, HorizontalAlignment::Left);
        assert_eq!(item.vertical_alignment, VerticalAlignment::Bottom);
    }

    #[test]
    fn test_is_html_path() {
        assert!(is_html_path("file:///decks/index.html"));
        assert!(!is_html_path("html"));
        assert!(!is_html_path("/img/photo.png"));
    }
}

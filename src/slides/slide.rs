//! The projectable slide record.

use crate::types::{HorizontalAlignment, ItemId, ItemKind, VerticalAlignment};

/// One atomic projectable unit derived from a service item.
///
/// Slides never own their item; `source_item_id` is resolved through the
/// derivation engine's range table.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    /// Item this slide was derived from.
    pub source_item_id: ItemId,
    /// Position within the owning item's slide range.
    pub index: usize,
    /// Number of slides the owning item expands to.
    pub slide_count: usize,
    /// Kind of the owning item.
    pub kind: ItemKind,
    /// Text shown on the slide.
    pub text: String,
    /// Audio reference; empty when none.
    pub audio: String,
    /// Image background reference; empty when the background is a video.
    pub image_background: String,
    /// Video background reference; empty when the background is an image.
    pub video_background: String,
    /// Font family.
    pub font: String,
    /// Font size in points.
    pub font_size: u32,
    /// Horizontal text alignment.
    pub horizontal_alignment: HorizontalAlignment,
    /// Vertical text alignment.
    pub vertical_alignment: VerticalAlignment,
    /// Whether the owning item loops.
    pub looping: bool,
    /// Whether the background is an html deck stepped from inside.
    pub html: bool,
    /// Reveal steps inside an html deck; 1 for every other slide.
    pub reveal_steps: usize,
    /// Video trim start in seconds.
    pub video_start_time: f32,
    /// Video trim end in seconds.
    pub video_end_time: f32,
}

impl Slide {
    /// Whether this is the last slide of its item.
    pub const fn is_last_of_item(&self) -> bool {
        self.index + 1 >= self.slide_count
    }

    /// Whether this is the first slide of its item.
    pub const fn is_first_of_item(&self) -> bool {
        self.index == 0
    }
}

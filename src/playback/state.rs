//! Cached playback state and the typed diff used to avoid redundant updates.

use crate::slides::slide::Slide;
use crate::types::{HorizontalAlignment, ItemId, ItemKind, VerticalAlignment};

/// One field of the projected slide content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideField {
    /// Kind of the owning item.
    Kind,
    /// Slide text.
    Text,
    /// Audio reference.
    Audio,
    /// Image background.
    ImageBackground,
    /// Video background.
    VideoBackground,
    /// Font family.
    Font,
    /// Font size.
    FontSize,
    /// Horizontal alignment.
    HorizontalAlignment,
    /// Vertical alignment.
    VerticalAlignment,
    /// Loop flag.
    Looping,
    /// Number of slides in the owning item.
    SlideCount,
    /// Video trim start.
    VideoStartTime,
    /// Video trim end.
    VideoEndTime,
}

/// Everything a renderer needs to draw the current slide.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlideContent {
    /// Kind of the owning item; `None` when nothing is bound.
    pub kind: Option<ItemKind>,
    /// Slide text.
    pub text: String,
    /// Audio reference.
    pub audio: String,
    /// Image background reference.
    pub image_background: String,
    /// Video background reference.
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
    /// Number of slides in the owning item.
    pub slide_count: usize,
    /// Video trim start in seconds.
    pub video_start_time: f32,
    /// Video trim end in seconds.
    pub video_end_time: f32,
}

impl From<&Slide> for SlideContent {
    fn from(slide: &Slide) -> Self {
        Self {
            kind: Some(slide.kind.clone()),
            text: slide.text.clone(),
            audio: slide.audio.clone(),
            image_background: slide.image_background.clone(),
            video_background: slide.video_background.clone(),
            font: slide.font.clone(),
            font_size: slide.font_size,
            horizontal_alignment: slide.horizontal_alignment,
            vertical_alignment: slide.vertical_alignment,
            looping: slide.looping,
            slide_count: slide.slide_count,
            video_start_time: slide.video_start_time,
            video_end_time: slide.video_end_time,
        }
    }
}

impl SlideContent {
    /// Whether the cached image background is an html deck.
    pub fn is_html(&self) -> bool {
        crate::service::item::is_html_path(&self.image_background)
    }

    /// Copy over only the fields of `other` that differ, returning which ones changed.
    pub fn diff_apply(&mut self, other: &Self) -> Vec<SlideField> {
        let mut changed = Vec::new();
        sync(&mut self.kind, &other.kind, SlideField::Kind, &mut changed);
        sync(&mut self.text, &other.text, SlideField::Text, &mut changed);
        sync(&mut self.audio, &other.audio, SlideField::Audio, &mut changed);
        sync(&mut self.image_background, &other.image_background, SlideField::ImageBackground, &mut changed);
        sync(&mut self.video_background, &other.video_background, SlideField::VideoBackground, &mut changed);
        sync(&mut self.font, &other.font, SlideField::Font, &mut changed);
        sync(&mut self.font_size, &other.font_size, SlideField::FontSize, &mut changed);
        sync(
            &mut self.horizontal_alignment,
            &other.horizontal_alignment,
            SlideField::HorizontalAlignment,
            &mut changed,
        );
        sync(&mut self.vertical_alignment, &other.vertical_alignment, SlideField::VerticalAlignment, &mut changed);
        sync(&mut self.looping, &other.looping, SlideField::Looping, &mut changed);
        sync(&mut self.slide_count, &other.slide_count, SlideField::SlideCount, &mut changed);
        sync(&mut self.video_start_time, &other.video_start_time, SlideField::VideoStartTime, &mut changed);
        sync(&mut self.video_end_time, &other.video_end_time, SlideField::VideoEndTime, &mut changed);
        changed
    }
}

fn sync<T: PartialEq + Clone>(slot: &mut T, value: &T, field: SlideField, changed: &mut Vec<SlideField>) {
    if slot != value {
        slot.clone_from(value);
        changed.push(field);
    }
}

/// Coarse playback phase derived from the state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// No item bound.
    Idle,
    /// Bound to an item, not playing.
    Ready,
    /// Bound to an item and playing.
    Playing,
}

/// Where projection currently is.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackState {
    /// Item being projected.
    pub current_item: Option<ItemId>,
    /// Position within the current item's slide range.
    pub slide_index: usize,
    /// Number of slides in the current item.
    pub slide_size: usize,
    /// Reveal step inside the bound html deck.
    pub inner_slide_index: usize,
    /// Reveal steps the bound slide has; 1 unless it is an html deck.
    pub inner_slide_size: usize,
    /// Whether media is playing.
    pub is_playing: bool,
    /// Whether playback wraps around inside the current item.
    pub looping: bool,
    /// Cached content of the bound slide.
    pub content: SlideContent,
}

impl PlaybackState {
    /// Current phase of the state machine.
    pub fn phase(&self) -> PlaybackPhase {
        match (&self.current_item, self.is_playing) {
            (None, _) => PlaybackPhase::Idle,
            (Some(_), false) => PlaybackPhase::Ready,
            (Some(_), true) => PlaybackPhase::Playing,
        }
    }

    /// Whether the state is bound to the item with `id`.
    pub fn is_bound_to(&self, id: &ItemId) -> bool {
        self.current_item.as_ref() == Some(id)
    }

    /// Return to the idle state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(text: &str) -> SlideContent {
        SlideContent {
            kind: Some(ItemKind::Song),
            text: text.to_string(),
            font: "Quicksand".into(),
            font_size: 50,
            slide_count: 3,
            ..SlideContent::default()
        }
    }

    #[test]
    fn test_diff_apply_reports_changed_fields_only() {
        let mut current = content("v1");
        let changed = current.diff_apply(&content("v2"));
        assert_eq!(changed, vec![SlideField::Text]);
        assert_eq!(current.text, "v2");
        assert!(current.diff_apply(&content("v2")).is_empty());
    }

    #[test]
    fn test_diff_apply_from_default() {
        let mut current = SlideContent::default();
        let changed = current.diff_apply(&content("v1"));
        assert!(changed.contains(&SlideField::Kind));
        assert!(changed.contains(&SlideField::Font));
        assert!(!changed.contains(&SlideField::Audio));
        assert_eq!(current, content("v1"));
    }

    #[test]
    fn test_phase() {
        let mut state = PlaybackState::default();
        assert_eq!(state.phase(), PlaybackPhase::Idle);
        state.current_item = Some(ItemId::new("a"));
        assert_eq!(state.phase(), PlaybackPhase::Ready);
        state.is_playing = true;
        assert_eq!(state.phase(), PlaybackPhase::Playing);
        state.reset();
        assert_eq!(state.phase(), PlaybackPhase::Idle);
    }
}

//! Playback state machine: which slide is on screen and whether media runs.

use tracing::debug;

use super::state::{PlaybackPhase, PlaybackState, SlideContent, SlideField};
use crate::slides::slide::Slide;

/// Change notifications emitted by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// A different slide (or none) is now bound.
    SlideChanged {
        /// Index inside the owning item, `None` when playback went idle.
        slide_index: Option<usize>,
    },
    /// Only the index inside the current item changed.
    SlideIndexChanged(usize),
    /// An html deck moved forward to the given reveal step.
    RevealNext(usize),
    /// An html deck moved back to the given reveal step.
    RevealPrevious(usize),
    /// Media started or stopped.
    PlayingChanged(bool),
    /// The loop flag changed.
    LoopChanged(bool),
}

/// Owns the playback state and its event outbox.
#[derive(Debug, Default)]
pub struct PlaybackController {
    state: PlaybackState,
    events: Vec<PlaybackEvent>,
}

impl PlaybackController {
    /// Create an idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state snapshot.
    pub const fn current(&self) -> &PlaybackState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> PlaybackPhase {
        self.state.phase()
    }

    /// Drain pending events.
    pub fn take_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.events)
    }

    /// Bind to `slide`, updating only the content fields that differ.
    ///
    /// Returns the fields that changed. Rebinding the slide already on screen
    /// keeps the current reveal step.
    pub fn change_slide(&mut self, slide: &Slide) -> Vec<SlideField> {
        let changed = self.state.content.diff_apply(&SlideContent::from(slide));
        let same_slide = self.state.is_bound_to(&slide.source_item_id) && self.state.slide_index == slide.index;
        let inner = if same_slide {
            self.state.inner_slide_index.min(slide.reveal_steps.saturating_sub(1))
        } else {
            0
        };
        self.bind(slide, inner);
        debug!(
            item = %slide.source_item_id,
            index = slide.index,
            changed = changed.len(),
            "Changed slide"
        );
        self.events.push(PlaybackEvent::SlideChanged {
            slide_index: Some(slide.index),
        });
        changed
    }

    /// Advance to `slide`, which the caller resolved as the next one.
    ///
    /// An html deck with reveal steps left shows its next step instead and
    /// `false` is returned. Otherwise every field is overwritten from `slide`,
    /// whose own index is taken as is.
    pub fn next(&mut self, slide: &Slide) -> bool {
        if self.reveal_next() {
            return false;
        }
        self.overwrite(slide);
        true
    }

    /// Step back to `slide`, which the caller resolved as the previous one.
    ///
    /// Mirrors [`next`](Self::next): an html deck past its first step goes
    /// back one step and `false` is returned.
    pub fn previous(&mut self, slide: &Slide) -> bool {
        if self.reveal_previous() {
            return false;
        }
        self.overwrite(slide);
        true
    }

    /// Show the next reveal step of the bound html deck.
    ///
    /// Returns `false` when nothing is bound, the slide is not an html deck,
    /// or the deck is on its last step.
    pub fn reveal_next(&mut self) -> bool {
        let inner = self.state.inner_slide_index + 1;
        if !self.state.content.is_html() || inner >= self.state.inner_slide_size {
            return false;
        }
        self.state.inner_slide_index = inner;
        debug!(inner, size = self.state.inner_slide_size, "Revealed next step");
        self.events.push(PlaybackEvent::RevealNext(inner));
        true
    }

    /// Show the previous reveal step of the bound html deck.
    pub fn reveal_previous(&mut self) -> bool {
        if !self.state.content.is_html() || self.state.inner_slide_index == 0 {
            return false;
        }
        self.state.inner_slide_index -= 1;
        let inner = self.state.inner_slide_index;
        debug!(inner, "Revealed previous step");
        self.events.push(PlaybackEvent::RevealPrevious(inner));
        true
    }

    /// Jump to `index` inside the bound item.
    ///
    /// Only songs and presentations have addressable slides; anything else,
    /// or an index past the item's end, is rejected. Every accepted jump is
    /// announced, even to the index already shown.
    pub fn change_slide_index(&mut self, index: usize) -> bool {
        let addressable = self
            .state
            .content
            .kind
            .as_ref()
            .is_some_and(crate::types::ItemKind::has_addressable_slides);
        if self.state.current_item.is_none() || !addressable || index >= self.state.slide_size {
            debug!(index, size = self.state.slide_size, "Rejected slide index change");
            return false;
        }
        self.state.slide_index = index;
        self.events.push(PlaybackEvent::SlideIndexChanged(index));
        true
    }

    /// Refresh the cached content from `slide` without rebinding or notifying.
    ///
    /// Used after [`change_slide_index`](Self::change_slide_index) so the
    /// cached text follows the new index.
    pub fn sync_content(&mut self, slide: &Slide) -> Vec<SlideField> {
        self.state.content.diff_apply(&SlideContent::from(slide))
    }

    /// Start media. Returns the resulting playing state.
    pub fn play(&mut self) -> bool {
        if self.state.current_item.is_none() {
            return false;
        }
        self.set_playing(true);
        true
    }

    /// Stop media. Returns the resulting playing state.
    pub fn pause(&mut self) -> bool {
        self.set_playing(false);
        false
    }

    /// Toggle media. Returns the resulting playing state.
    pub fn play_pause(&mut self) -> bool {
        if self.state.is_playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Set the loop flag.
    pub fn set_loop(&mut self, looping: bool) {
        if self.state.looping != looping {
            self.state.looping = looping;
            self.events.push(PlaybackEvent::LoopChanged(looping));
        }
    }

    /// Drop the binding and go idle.
    pub fn clear(&mut self) {
        if self.state.current_item.is_none() {
            return;
        }
        if self.state.is_playing {
            self.events.push(PlaybackEvent::PlayingChanged(false));
        }
        if self.state.looping {
            self.events.push(PlaybackEvent::LoopChanged(false));
        }
        self.state.reset();
        self.events.push(PlaybackEvent::SlideChanged { slide_index: None });
    }

    /// Replace the cached content wholesale, without diffing.
    fn overwrite(&mut self, slide: &Slide) {
        // Unload the outgoing web source before the new background lands.
        self.state.content.image_background.clear();
        self.state.content = SlideContent::from(slide);
        self.bind(slide, 0);
        debug!(item = %slide.source_item_id, index = slide.index, "Overwrote slide");
        self.events.push(PlaybackEvent::SlideChanged {
            slide_index: Some(slide.index),
        });
    }

    fn bind(&mut self, slide: &Slide, inner_slide_index: usize) {
        self.state.current_item = Some(slide.source_item_id.clone());
        self.state.slide_index = slide.index;
        self.state.slide_size = slide.slide_count;
        self.state.inner_slide_index = inner_slide_index;
        self.state.inner_slide_size = slide.reveal_steps;
        self.set_loop(slide.looping);
    }

    fn set_playing(&mut self, playing: bool) {
        if self.state.is_playing != playing {
            self.state.is_playing = playing;
            self.events.push(PlaybackEvent::PlayingChanged(playing));
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::service::ServiceItem;
    use crate::slides::derive::derive_slides;

    fn song_slides() -> Vec<Slide> {
        derive_slides(&ServiceItem::song("Song", vec!["v1".into(), "v2".into(), "v3".into()]))
    }

    #[test]
    fn test_change_slide_binds_and_reports_fields() {
        let slides = song_slides();
        let mut controller = PlaybackController::new();
        let changed = controller.change_slide(&slides[0]);
        assert!(changed.contains(&SlideField::Text));
        assert_eq!(controller.phase(), PlaybackPhase::Ready);
        assert_eq!(controller.current().slide_size, 3);

        let changed = controller.change_slide(&slides[1]);
        assert_eq!(changed, vec![SlideField::Text]);
        assert_eq!(controller.current().slide_index, 1);
        assert_eq!(
            controller.take_events(),
            vec![
                PlaybackEvent::SlideChanged { slide_index: Some(0) },
                PlaybackEvent::SlideChanged { slide_index: Some(1) },
            ]
        );
    }

    #[test]
    fn test_change_slide_index_validation() {
        let slides = song_slides();
        let mut controller = PlaybackController::new();
        assert!(!controller.change_slide_index(0));
        controller.change_slide(&slides[0]);
        assert!(controller.change_slide_index(2));
        assert!(!controller.change_slide_index(3));
        assert_eq!(controller.current().slide_index, 2);

        let image = derive_slides(&ServiceItem::image("Logo", "/img/logo.png"));
        controller.change_slide(&image[0]);
        assert!(!controller.change_slide_index(0));
    }

    #[test]
    fn test_play_requires_binding() {
        let slides = song_slides();
        let mut controller = PlaybackController::new();
        assert!(!controller.play());
        assert!(controller.take_events().is_empty());

        controller.change_slide(&slides[0]);
        assert!(controller.play());
        assert_eq!(controller.phase(), PlaybackPhase::Playing);
        assert!(!controller.play_pause());
        assert!(controller.play_pause());
    }

    #[test]
    fn test_pause_when_stopped_is_silent() {
        let mut controller = PlaybackController::new();
        assert!(!controller.pause());
        assert!(controller.take_events().is_empty());
    }

    #[test]
    fn test_clear_emits_single_slide_change() {
        let slides = song_slides();
        let mut controller = PlaybackController::new();
        controller.change_slide(&slides[0]);
        controller.play();
        controller.take_events();

        controller.clear();
        let events = controller.take_events();
        let slide_changes = events
            .iter()
            .filter(|e| matches!(e, PlaybackEvent::SlideChanged { slide_index: None }))
            .count();
        assert_eq!(slide_changes, 1);
        assert!(events.contains(&PlaybackEvent::PlayingChanged(false)));
        assert_eq!(controller.phase(), PlaybackPhase::Idle);

        controller.clear();
        assert!(controller.take_events().is_empty());
    }

    #[test]
    fn test_looping_follows_slide() {
        let item = ServiceItem::video("Loop", "/v/loop.mp4").with_looping(true);
        let slides = derive_slides(&item);
        let mut controller = PlaybackController::new();
        controller.change_slide(&slides[0]);
        assert!(controller.current().looping);
        assert!(controller.take_events().contains(&PlaybackEvent::LoopChanged(true)));
    }

    #[test]
    fn test_change_slide_index_repeats_are_announced() {
        let slides = song_slides();
        let mut controller = PlaybackController::new();
        controller.change_slide(&slides[0]);
        controller.take_events();

        assert!(controller.change_slide_index(2));
        assert!(controller.change_slide_index(2));
        assert_eq!(
            controller.take_events(),
            vec![PlaybackEvent::SlideIndexChanged(2), PlaybackEvent::SlideIndexChanged(2)]
        );
    }

    #[test]
    fn test_next_and_previous_overwrite_content() {
        let slides = song_slides();
        let mut controller = PlaybackController::new();
        assert!(controller.next(&slides[0]));
        assert!(controller.next(&slides[1]));
        assert!(controller.previous(&slides[0]));
        assert_eq!(controller.current().slide_index, 0);
        assert_eq!(controller.current().content, SlideContent::from(&slides[0]));
        assert_eq!(
            controller.take_events(),
            vec![
                PlaybackEvent::SlideChanged { slide_index: Some(0) },
                PlaybackEvent::SlideChanged { slide_index: Some(1) },
                PlaybackEvent::SlideChanged { slide_index: Some(0) },
            ]
        );
    }

    #[test]
    fn test_next_rewrites_identical_slide() {
        let slides = song_slides();
        let mut controller = PlaybackController::new();
        controller.change_slide(&slides[1]);
        controller.take_events();

        assert!(controller.next(&slides[1]));
        assert_eq!(
            controller.take_events(),
            vec![PlaybackEvent::SlideChanged { slide_index: Some(1) }]
        );
    }

    #[test]
    fn test_html_deck_reveals_before_leaving() {
        let deck = derive_slides(&ServiceItem::presentation("Talk", "/decks/talk.html", 3));
        let after = derive_slides(&ServiceItem::image("Logo", "/img/logo.png"));
        let mut controller = PlaybackController::new();
        controller.change_slide(&deck[0]);
        assert_eq!(controller.current().inner_slide_size, 3);
        controller.take_events();

        assert!(!controller.next(&after[0]));
        assert!(!controller.next(&after[0]));
        assert_eq!(controller.current().inner_slide_index, 2);
        assert!(controller.current().content.is_html());
        assert_eq!(
            controller.take_events(),
            vec![PlaybackEvent::RevealNext(1), PlaybackEvent::RevealNext(2)]
        );

        assert!(!controller.previous(&after[0]));
        assert_eq!(controller.take_events(), vec![PlaybackEvent::RevealPrevious(1)]);

        assert!(!controller.next(&after[0]));
        assert!(controller.next(&after[0]));
        assert_eq!(controller.current().inner_slide_index, 0);
        assert_eq!(controller.current().content.image_background, "/img/logo.png");
        assert!(!controller.reveal_next());
    }

    #[test]
    fn test_html_previous_at_first_step_leaves_deck() {
        let before = derive_slides(&ServiceItem::image("Logo", "/img/logo.png"));
        let deck = derive_slides(&ServiceItem::presentation("Talk", "/decks/talk.html", 4));
        let mut controller = PlaybackController::new();
        controller.change_slide(&deck[0]);

        assert!(controller.previous(&before[0]));
        assert!(controller.current().is_bound_to(&before[0].source_item_id));
        assert!(!controller.reveal_previous());
    }

    #[test]
    fn test_rebinding_same_slide_keeps_reveal_step() {
        let deck = derive_slides(&ServiceItem::presentation("Talk", "/decks/talk.html", 4));
        let mut controller = PlaybackController::new();
        controller.change_slide(&deck[0]);
        assert!(controller.reveal_next());
        controller.change_slide(&deck[0]);
        assert_eq!(controller.current().inner_slide_index, 1);
    }
}

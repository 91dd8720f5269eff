//! Playback: the live binding between the slide list and the screen.

pub mod controller;
pub mod state;

pub use controller::{PlaybackController, PlaybackEvent};
pub use state::{PlaybackPhase, PlaybackState, SlideContent, SlideField};

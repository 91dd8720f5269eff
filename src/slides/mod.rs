//! Slide derivation.
//!
//! Service items expand into a flat sequence of [`Slide`]s. The
//! [`SlideDerivationEngine`] keeps that sequence in step with the store by
//! applying store events one range at a time.

pub mod derive;
pub mod engine;
pub mod slide;

pub use engine::{SlideDerivationEngine, SlideEvent};
pub use slide::Slide;

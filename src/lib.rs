//! `StageFlow` - live presentation driver for worship services.
//!
//! Keeps an ordered service of items, expands it into a flat slide list that
//! stays in step with every edit, drives playback over that list, and saves
//! and restores services as zip archives.

// Re-export public modules for use in integration tests and as a library
pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod lyrics;
pub mod persistence;
pub mod playback;
pub mod service;
pub mod slides;
pub mod types;

pub use app::AppContext;
pub use error::{Error, Result};

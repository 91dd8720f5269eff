//! Application context: the single owner of the live service.
//!
//! Every mutation goes through [`AppContext`], which drains the store's
//! events into the slide engine, reconciles playback, and only then hands
//! the combined events to subscribers. Callers never observe a slide list
//! that disagrees with the item list.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{AppEvent, EventBus, SubscriptionId};
use crate::persistence::{PersistenceGateway, ServiceArchive, Settings};
use crate::playback::{PlaybackController, PlaybackPhase, PlaybackState};
use crate::service::{ServiceItem, ServiceItemStore, StoreEvent};
use crate::slides::{Slide, SlideDerivationEngine};

/// Owns the store, the derived slides, playback and persistence.
#[derive(Debug)]
pub struct AppContext {
    config: Config,
    store: ServiceItemStore,
    engine: SlideDerivationEngine,
    controller: PlaybackController,
    gateway: Box<dyn PersistenceGateway>,
    settings: Settings,
    bus: EventBus,
}

impl AppContext {
    /// Build a context using the zip service format.
    pub fn new(config: Config) -> Self {
        let gateway = Box::new(ServiceArchive::new(config.asset_dir()));
        Self::with_gateway(config, gateway)
    }

    /// Build a context with a custom persistence gateway.
    pub fn with_gateway(config: Config, gateway: Box<dyn PersistenceGateway>) -> Self {
        let settings = Settings::load(config.settings_path());
        debug!(format = gateway.format_name(), settings = %settings.path().display(), "Creating app context");
        Self {
            config,
            store: ServiceItemStore::new(),
            engine: SlideDerivationEngine::new(),
            controller: PlaybackController::new(),
            gateway,
            settings,
            bus: EventBus::new(),
        }
    }

    /// Register an event listener.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&AppEvent) + Send + 'static,
    {
        self.bus.subscribe(listener)
    }

    /// Remove an event listener.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    // ---- Read access ----

    /// The item store.
    pub const fn store(&self) -> &ServiceItemStore {
        &self.store
    }

    /// The derived slide sequence.
    pub const fn slides(&self) -> &SlideDerivationEngine {
        &self.engine
    }

    /// Current playback state.
    pub const fn playback(&self) -> &PlaybackState {
        self.controller.current()
    }

    /// Current playback phase.
    pub fn phase(&self) -> PlaybackPhase {
        self.controller.phase()
    }

    /// Persisted settings.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Active configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Flat position of the slide playback is bound to.
    pub fn global_position(&self) -> Option<usize> {
        let state = self.controller.current();
        let id = state.current_item.as_ref()?;
        self.engine.position_of(id, state.slide_index)
    }

    /// The slide playback is bound to.
    pub fn current_slide(&self) -> Option<&Slide> {
        self.global_position().and_then(|p| self.engine.get(p))
    }

    // ---- Store mutations ----

    /// Append an item, returning its position.
    pub fn add_item(&mut self, item: ServiceItem) -> usize {
        let position = self.store.add_item(item);
        self.flush();
        position
    }

    /// Insert an item before `position`.
    pub fn insert_item(&mut self, position: usize, item: ServiceItem) -> Result<()> {
        self.mutate(|store| store.insert_item(position, item))
    }

    /// Remove the item at `position`.
    pub fn remove_item(&mut self, position: usize) -> Result<ServiceItem> {
        self.mutate(|store| store.remove_item(position))
    }

    /// Remove every selected item.
    pub fn remove_items(&mut self) -> usize {
        let removed = self.store.remove_items();
        self.flush();
        removed
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.store.clear();
        self.flush();
    }

    /// Relocate a run of items so it starts at `destination`.
    pub fn move_rows(&mut self, source: usize, destination: usize, count: usize) -> Result<bool> {
        self.mutate(|store| store.move_rows(source, destination, count))
    }

    /// Move one item up.
    pub fn move_up(&mut self, position: usize) -> Result<bool> {
        self.mutate(|store| store.move_up(position))
    }

    /// Move one item down.
    pub fn move_down(&mut self, position: usize) -> Result<bool> {
        self.mutate(|store| store.move_down(position))
    }

    /// Select exactly one item.
    pub fn select(&mut self, position: usize) -> Result<()> {
        self.mutate(|store| store.select(position))
    }

    /// Select exactly the given items.
    pub fn select_items(&mut self, positions: &[usize]) -> Result<()> {
        self.mutate(|store| store.select_items(positions))
    }

    /// Extend the selection through `final_position`.
    pub fn select_range(&mut self, final_position: usize) -> Result<bool> {
        self.mutate(|store| store.select_range(final_position))
    }

    /// Mark the item at `position` active.
    pub fn activate(&mut self, position: usize) -> Result<()> {
        self.mutate(|store| store.activate(position))
    }

    /// Clear the active flag of the item at `position`.
    pub fn deactivate(&mut self, position: usize) -> Result<bool> {
        self.mutate(|store| store.deactivate(position))
    }

    /// Edit the item at `position` in place.
    pub fn update_item<F>(&mut self, position: usize, edit: F) -> Result<()>
    where
        F: FnOnce(&mut ServiceItem),
    {
        self.mutate(|store| store.update_item(position, edit))
    }

    // ---- Playback ----

    /// Activate the item at `position` and show its first slide.
    ///
    /// Returns `Ok(false)` when the item has no slides (it is still activated).
    pub fn go_to_item(&mut self, position: usize) -> Result<bool> {
        let id = self.store.get_item(position)?.id.clone();
        match self.engine.first_slide_of(&id) {
            Some(first) => {
                self.change_slide(first)?;
                Ok(true)
            }
            None => {
                self.activate(position)?;
                Ok(false)
            }
        }
    }

    /// Bind playback to the slide at flat `position`.
    pub fn change_slide(&mut self, position: usize) -> Result<()> {
        let slide = self.slide_at(position)?;
        self.activate_owner(&slide);
        self.controller.change_slide(&slide);
        self.flush();
        Ok(())
    }

    /// Advance one slide. Idle playback starts at the first slide.
    ///
    /// An html deck shows its remaining reveal steps first. With looping on,
    /// the last slide of an item wraps to its first. Returns `false` at the
    /// end of the service.
    pub fn next_slide(&mut self) -> bool {
        if self.controller.reveal_next() {
            self.flush();
            return true;
        }
        let target = match self.current_slide() {
            None => 0,
            Some(slide) => {
                let position = self.global_position().unwrap_or_default();
                if self.controller.current().looping && slide.is_last_of_item() {
                    position - slide.index
                } else {
                    position + 1
                }
            }
        };
        let Some(slide) = self.engine.get(target).cloned() else {
            return false;
        };
        self.activate_owner(&slide);
        self.controller.next(&slide);
        self.flush();
        true
    }

    /// Step back one slide. Idle playback starts at the first slide.
    ///
    /// An html deck steps back through its reveals first. With looping on,
    /// the first slide of an item wraps to its last. Returns `false` at the
    /// start of the service.
    pub fn previous_slide(&mut self) -> bool {
        if self.controller.reveal_previous() {
            self.flush();
            return true;
        }
        let target = match self.current_slide() {
            None => Some(0),
            Some(slide) => {
                let position = self.global_position().unwrap_or_default();
                if self.controller.current().looping && slide.is_first_of_item() {
                    Some(position + slide.slide_count.saturating_sub(1))
                } else {
                    position.checked_sub(1)
                }
            }
        };
        let Some(slide) = target.and_then(|t| self.engine.get(t)).cloned() else {
            return false;
        };
        self.activate_owner(&slide);
        self.controller.previous(&slide);
        self.flush();
        true
    }

    /// Jump to slide `index` inside the bound item.
    pub fn change_slide_index(&mut self, index: usize) -> bool {
        if !self.controller.change_slide_index(index) {
            return false;
        }
        if let Some(slide) = self.current_slide().cloned() {
            self.controller.sync_content(&slide);
        }
        self.flush();
        true
    }

    /// Start media. Returns the resulting playing state.
    pub fn play(&mut self) -> bool {
        let playing = self.controller.play();
        self.flush();
        playing
    }

    /// Stop media. Returns the resulting playing state.
    pub fn pause(&mut self) -> bool {
        let playing = self.controller.pause();
        self.flush();
        playing
    }

    /// Toggle media. Returns the resulting playing state.
    pub fn play_pause(&mut self) -> bool {
        let playing = self.controller.play_pause();
        self.flush();
        playing
    }

    /// Set the loop flag.
    ///
    /// The flag lives on the bound item, so it is written back to the store
    /// and survives any later rebind. With nothing bound only playback changes.
    pub fn set_loop(&mut self, looping: bool) -> Result<()> {
        let bound = self
            .controller
            .current()
            .current_item
            .as_ref()
            .and_then(|id| self.store.position_of(id));
        match bound {
            Some(position) => self.update_item(position, |item| item.looping = looping),
            None => {
                self.controller.set_loop(looping);
                self.flush();
                Ok(())
            }
        }
    }

    // ---- Persistence ----

    /// Save the service to `path` and remember it as the last save.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.gateway.save(self.store.items(), path)?;
        self.settings.set_last_save_file(path);
        if let Err(e) = self.settings.save() {
            warn!(error = %e, "Could not record last save file");
        }
        self.bus.publish(&AppEvent::Saved(path.to_path_buf()));
        Ok(())
    }

    /// Replace the service with the contents of `path`.
    ///
    /// On any error the current service is left untouched.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let items = self.gateway.load(path)?;
        info!(path = %path.display(), items = items.len(), "Replacing service");
        self.store.replace_all(items);
        self.flush();
        self.bus.publish(&AppEvent::Loaded(path.to_path_buf()));
        Ok(())
    }

    /// Reload the most recently saved service.
    ///
    /// Returns `false` when nothing was saved before or the file can no
    /// longer be loaded.
    pub fn load_last_saved(&mut self) -> bool {
        let Some(path) = self.settings.last_save_file().map(Path::to_path_buf) else {
            debug!("No previous save recorded");
            return false;
        };
        match self.load(&path) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not restore last service");
                false
            }
        }
    }

    /// Restore the last service, or seed an empty one with a default item.
    ///
    /// Returns whether a previous service was restored.
    pub fn bootstrap(&mut self) -> bool {
        if self.load_last_saved() {
            return true;
        }
        if self.store.is_empty() {
            self.add_item(ServiceItem::seed());
        }
        false
    }

    /// Verify the cross-component invariants.
    pub fn check_invariants(&self) -> Result<()> {
        let items = self.store.items();

        let active = items.iter().filter(|i| i.active).count();
        if active > 1 {
            return Err(Error::InvariantViolation(format!("{active} active items")));
        }

        let expected: usize = items.iter().map(|i| i.slide_number).sum();
        if self.engine.len() != expected {
            return Err(Error::InvariantViolation(format!(
                "{} slides for {expected} expected",
                self.engine.len()
            )));
        }

        let counts: Vec<_> = items.iter().map(|i| (i.id.clone(), i.slide_number)).collect();
        if self.engine.item_slide_counts() != counts {
            return Err(Error::InvariantViolation("slide ranges out of step with the service".into()));
        }

        let mut slides = self.engine.slides().iter();
        for item in items {
            for index in 0..item.slide_number {
                let matches = slides
                    .next()
                    .is_some_and(|s| s.source_item_id == item.id && s.index == index);
                if !matches {
                    return Err(Error::InvariantViolation(format!(
                        "slide {index} of {:?} out of order",
                        item.name
                    )));
                }
            }
        }

        if let Some(id) = &self.controller.current().current_item {
            let ids: HashSet<_> = items.iter().map(|i| &i.id).collect();
            if !ids.contains(id) {
                return Err(Error::InvariantViolation(format!("playback bound to missing item {id}")));
            }
        }
        Ok(())
    }

    // ---- Internals ----

    fn mutate<T>(&mut self, op: impl FnOnce(&mut ServiceItemStore) -> Result<T>) -> Result<T> {
        let result = op(&mut self.store);
        self.flush();
        result
    }

    fn slide_at(&self, position: usize) -> Result<Slide> {
        self.engine
            .get(position)
            .cloned()
            .ok_or(Error::IndexOutOfRange { position, len: self.engine.len() })
    }

    /// Make the item owning `slide` the active one.
    fn activate_owner(&mut self, slide: &Slide) {
        let Some(position) = self.store.position_of(&slide.source_item_id) else {
            return;
        };
        if self.store.active_position() != Some(position) {
            if let Err(e) = self.store.activate(position) {
                warn!(position, error = %e, "Could not activate slide owner");
            }
        }
    }

    /// Propagate pending store and playback events, then notify listeners.
    fn flush(&mut self) {
        let mut outgoing = Vec::new();
        for event in self.store.take_events() {
            let slide_events = if event.is_structural() {
                self.engine.apply(&event)
            } else {
                Vec::new()
            };
            self.reconcile_playback(&event);
            outgoing.push(AppEvent::Store(event));
            outgoing.extend(slide_events.into_iter().map(AppEvent::Slides));
            outgoing.extend(self.controller.take_events().into_iter().map(AppEvent::Playback));
        }
        outgoing.extend(self.controller.take_events().into_iter().map(AppEvent::Playback));

        debug_assert!(self.check_invariants().is_ok(), "{:?}", self.check_invariants());

        for event in &outgoing {
            self.bus.publish(event);
        }
    }

    /// Keep playback pointing at something that still exists.
    fn reconcile_playback(&mut self, event: &StoreEvent) {
        let Some(bound) = self.controller.current().current_item.clone() else {
            return;
        };
        match event {
            StoreEvent::Removed { item, .. } if item.id == bound => {
                debug!(id = %bound, "Bound item removed, clearing playback");
                self.controller.clear();
            }
            StoreEvent::Cleared => self.controller.clear(),
            StoreEvent::Updated { item, .. } if item.id == bound => {
                let index = self.controller.current().slide_index;
                let rebound = self
                    .engine
                    .range_of(&bound)
                    .filter(|r| !r.is_empty())
                    .and_then(|r| self.engine.get(r.start + index.min(r.len() - 1)).cloned());
                match rebound {
                    Some(slide) => {
                        self.controller.change_slide(&slide);
                    }
                    None => self.controller.clear(),
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::playback::PlaybackEvent;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> AppContext {
        AppContext::new(Config::with_dirs(dir.path().join("config"), dir.path().join("data")))
    }

    fn song(name: &str, verses: usize) -> ServiceItem {
        ServiceItem::song(name, (1..=verses).map(|v| format!("{name} v{v}")).collect())
    }

    #[test]
    fn test_go_to_item_activates_and_binds() {
        let dir = TempDir::new().unwrap();
        let mut app = context(&dir);
        app.add_item(song("A", 2));
        app.add_item(song("B", 3));

        assert!(app.go_to_item(1).unwrap());
        assert_eq!(app.store().active_position(), Some(1));
        assert_eq!(app.global_position(), Some(2));
        assert_eq!(app.playback().content.text, "B v1");
        assert!(app.go_to_item(5).is_err());
    }

    #[test]
    fn test_next_and_previous_walk_the_service() {
        let dir = TempDir::new().unwrap();
        let mut app = context(&dir);
        app.add_item(song("A", 2));
        app.add_item(ServiceItem::image("Logo", "/img/logo.png"));

        assert!(app.next_slide());
        assert_eq!(app.global_position(), Some(0));
        assert!(app.next_slide());
        assert!(app.next_slide());
        assert_eq!(app.store().active_position(), Some(1));
        assert!(!app.next_slide());
        assert_eq!(app.global_position(), Some(2));

        assert!(app.previous_slide());
        assert_eq!(app.playback().content.text, "A v2");
        assert_eq!(app.store().active_position(), Some(0));
        assert!(app.previous_slide());
        assert!(!app.previous_slide());
    }

    #[test]
    fn test_looping_wraps_inside_item() {
        let dir = TempDir::new().unwrap();
        let mut app = context(&dir);
        app.add_item(song("A", 2).with_looping(true));
        app.add_item(song("B", 1));

        app.go_to_item(0).unwrap();
        assert!(app.next_slide());
        assert!(app.next_slide());
        assert_eq!(app.global_position(), Some(0));
        assert!(app.previous_slide());
        assert_eq!(app.global_position(), Some(1));
    }

    #[test]
    fn test_set_loop_is_kept_on_the_bound_item() {
        let dir = TempDir::new().unwrap();
        let mut app = context(&dir);
        app.add_item(song("A", 2));
        app.add_item(ServiceItem::image("Logo", "/img/logo.png"));
        app.go_to_item(0).unwrap();

        app.set_loop(true).unwrap();
        assert!(app.store().get_item(0).unwrap().looping);
        assert!(app.playback().looping);
        assert!(app.slides().slides()[..2].iter().all(|s| s.looping));

        assert!(app.next_slide());
        assert!(app.next_slide());
        assert_eq!(app.global_position(), Some(0));
        assert!(app.playback().looping);

        app.set_loop(false).unwrap();
        assert!(!app.store().get_item(0).unwrap().looping);
        assert!(app.next_slide());
        assert!(app.next_slide());
        assert_eq!(app.global_position(), Some(2));
    }

    #[test]
    fn test_set_loop_while_idle_only_touches_playback() {
        let dir = TempDir::new().unwrap();
        let mut app = context(&dir);
        app.add_item(song("A", 2));
        app.set_loop(true).unwrap();
        assert!(app.playback().looping);
        assert!(!app.store().get_item(0).unwrap().looping);
    }

    #[test]
    fn test_html_deck_reveals_before_next_item() {
        let dir = TempDir::new().unwrap();
        let mut app = context(&dir);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        app.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        app.add_item(ServiceItem::presentation("Talk", "/decks/talk.html", 3));
        app.add_item(ServiceItem::image("Logo", "/img/logo.png"));
        app.go_to_item(0).unwrap();
        events.lock().unwrap().clear();

        assert!(app.next_slide());
        assert!(app.next_slide());
        assert_eq!(app.global_position(), Some(0));
        assert_eq!(app.playback().inner_slide_index, 2);
        assert!(app.previous_slide());
        assert_eq!(app.playback().inner_slide_index, 1);
        {
            let events = events.lock().unwrap();
            assert!(events.contains(&AppEvent::Playback(PlaybackEvent::RevealNext(2))));
            assert!(events.contains(&AppEvent::Playback(PlaybackEvent::RevealPrevious(1))));
        }

        assert!(app.next_slide());
        assert!(app.next_slide());
        assert_eq!(app.global_position(), Some(1));
        assert_eq!(app.store().active_position(), Some(1));
        assert_eq!(app.playback().inner_slide_index, 0);
        assert!(!app.next_slide());
    }

    #[test]
    fn test_change_slide_index_updates_content() {
        let dir = TempDir::new().unwrap();
        let mut app = context(&dir);
        app.add_item(song("A", 3));
        app.go_to_item(0).unwrap();

        assert!(app.change_slide_index(2));
        assert_eq!(app.playback().content.text, "A v3");
        assert!(!app.change_slide_index(3));
    }

    #[test]
    fn test_update_of_bound_item_rebinds() {
        let dir = TempDir::new().unwrap();
        let mut app = context(&dir);
        app.add_item(song("A", 3));
        app.go_to_item(0).unwrap();
        app.change_slide_index(2);

        app.update_item(0, |item| item.text.truncate(1)).unwrap();
        assert_eq!(app.playback().slide_index, 0);
        assert_eq!(app.playback().slide_size, 1);
        app.check_invariants().unwrap();

        app.update_item(0, |item| item.text.clear()).unwrap();
        assert_eq!(app.phase(), PlaybackPhase::Idle);
    }

    #[test]
    fn test_remove_bound_item_goes_idle() {
        let dir = TempDir::new().unwrap();
        let mut app = context(&dir);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        app.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        app.add_item(song("A", 2));
        app.go_to_item(0).unwrap();
        app.play();
        events.lock().unwrap().clear();

        app.remove_item(0).unwrap();
        assert_eq!(app.phase(), PlaybackPhase::Idle);
        let cleared = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, AppEvent::Playback(PlaybackEvent::SlideChanged { slide_index: None })))
            .count();
        assert_eq!(cleared, 1);
    }

    #[test]
    fn test_bootstrap_seeds_default_item() {
        let dir = TempDir::new().unwrap();
        let mut app = context(&dir);
        assert!(!app.load_last_saved());
        assert!(!app.bootstrap());
        assert_eq!(app.store().len(), 1);
        assert_eq!(app.slides().len(), 1);
    }

    #[test]
    fn test_save_then_bootstrap_restores() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("services").join("sunday.lmn");
        {
            let mut app = context(&dir);
            app.add_item(song("A", 2));
            app.add_item(ServiceItem::video("Clip", "/v/clip.mp4"));
            app.save(&path).unwrap();
        }
        let mut app = context(&dir);
        assert!(app.bootstrap());
        assert_eq!(app.store().len(), 2);
        assert_eq!(app.slides().len(), 3);
        assert_eq!(app.settings().last_save_file(), Some(path.as_path()));
    }

    #[test]
    fn test_failed_load_keeps_service() {
        let dir = TempDir::new().unwrap();
        let mut app = context(&dir);
        app.add_item(song("A", 2));
        let err = app.load(&dir.path().join("missing.lmn")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(app.store().len(), 1);
        assert_eq!(app.slides().len(), 2);
    }
}

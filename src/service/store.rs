//! Ordered, index-addressable store of service items.
//!
//! The store is the source of truth for what is in the service. Every
//! mutation validates its positional arguments first, so a failed call never
//! changes anything, and records [`StoreEvent`]s in an outbox that the owner
//! drains with [`ServiceItemStore::take_events`].

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::service::event::StoreEvent;
use crate::service::item::ServiceItem;
use crate::types::ItemId;

/// The ordered service item collection.
#[derive(Debug, Default)]
pub struct ServiceItemStore {
    items: Vec<ServiceItem>,
    events: Vec<StoreEvent>,
}

impl ServiceItemStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in service order.
    pub fn items(&self) -> &[ServiceItem] {
        &self.items
    }

    /// The item at `position`.
    pub fn get_item(&self, position: usize) -> Result<&ServiceItem> {
        self.items.get(position).ok_or(Error::IndexOutOfRange {
            position,
            len: self.items.len(),
        })
    }

    /// Current position of the item with `id`.
    pub fn position_of(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    /// Position of the active item, if any.
    pub fn active_position(&self) -> Option<usize> {
        self.items.iter().position(|item| item.active)
    }

    /// Positions of all selected items, ascending.
    pub fn selected_positions(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.selected.then_some(i))
            .collect()
    }

    /// Drain the pending change events, oldest first.
    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    /// Append an item and return its position.
    pub fn add_item(&mut self, item: ServiceItem) -> usize {
        let position = self.items.len();
        let item = self.admit(item);
        debug!(position, name = %item.name, kind = %item.kind, "adding service item");
        let activates = item.active;
        self.items.push(item.clone());
        self.events.push(StoreEvent::Added { position, item });
        if activates {
            self.claim_active(position);
        }
        position
    }

    /// Insert an item before `position` (`position == len` appends).
    pub fn insert_item(&mut self, position: usize, item: ServiceItem) -> Result<()> {
        if position > self.items.len() {
            return Err(Error::InvalidPosition { position, len: self.items.len() });
        }
        let item = self.admit(item);
        debug!(position, name = %item.name, kind = %item.kind, "inserting service item");
        let activates = item.active;
        self.items.insert(position, item.clone());
        self.events.push(StoreEvent::Inserted { position, item });
        if activates {
            self.claim_active(position);
        }
        Ok(())
    }

    /// Remove and return the item at `position`.
    pub fn remove_item(&mut self, position: usize) -> Result<ServiceItem> {
        if position >= self.items.len() {
            return Err(Error::IndexOutOfRange { position, len: self.items.len() });
        }
        let item = self.items.remove(position);
        debug!(position, name = %item.name, "removed service item");
        self.events.push(StoreEvent::Removed { position, item: item.clone() });
        Ok(item)
    }

    /// Remove every selected item, returning how many were removed.
    pub fn remove_items(&mut self) -> usize {
        let positions = self.selected_positions();
        debug!(?positions, "removing selected items");
        // Highest first so earlier positions stay valid
        for &position in positions.iter().rev() {
            let item = self.items.remove(position);
            self.events.push(StoreEvent::Removed { position, item });
        }
        positions.len()
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        debug!(count = self.items.len(), "clearing service");
        self.items.clear();
        self.events.push(StoreEvent::Cleared);
    }

    /// Replace the whole service, e.g. after loading a file.
    pub fn replace_all(&mut self, items: Vec<ServiceItem>) {
        self.clear();
        for item in items {
            self.add_item(item);
        }
    }

    /// Relocate `count` items starting at `source` so the run starts at `destination`.
    ///
    /// Returns `Ok(false)` when `source == destination` (nothing to do).
    pub fn move_rows(&mut self, source: usize, destination: usize, count: usize) -> Result<bool> {
        let len = self.items.len();
        let fits = |start: usize| start.checked_add(count).is_some_and(|end| end <= len);
        if count == 0 || !fits(source) || !fits(destination) {
            return Err(Error::InvalidRange { start: source, destination, count, len });
        }
        if source == destination {
            return Ok(false);
        }

        let run: Vec<ServiceItem> = self.items.drain(source..source + count).collect();
        self.items.splice(destination..destination, run);
        debug!(source, destination, count, "moved service items");
        self.events.push(StoreEvent::Moved { source, destination, count });
        Ok(true)
    }

    /// Move one item up; `Ok(false)` when already first.
    pub fn move_up(&mut self, position: usize) -> Result<bool> {
        self.get_item(position)?;
        if position == 0 {
            return Ok(false);
        }
        self.move_rows(position, position - 1, 1)
    }

    /// Move one item down; `Ok(false)` when already last.
    pub fn move_down(&mut self, position: usize) -> Result<bool> {
        self.get_item(position)?;
        if position + 1 == self.items.len() {
            return Ok(false);
        }
        self.move_rows(position, position + 1, 1)
    }

    /// Select exactly one item.
    pub fn select(&mut self, position: usize) -> Result<()> {
        self.select_items(&[position])
    }

    /// Select exactly the given positions, deselecting everything else.
    pub fn select_items(&mut self, positions: &[usize]) -> Result<()> {
        if let Some(&position) = positions.iter().find(|&&p| p >= self.items.len()) {
            return Err(Error::IndexOutOfRange { position, len: self.items.len() });
        }
        let wanted: HashSet<usize> = positions.iter().copied().collect();
        for (i, item) in self.items.iter_mut().enumerate() {
            item.selected = wanted.contains(&i);
        }
        self.events.push(StoreEvent::SelectionChanged);
        Ok(())
    }

    /// Extend the selection from its first selected item through `final_position`.
    ///
    /// With nothing selected this behaves like [`select`](Self::select).
    /// Returns `Ok(false)` when `final_position` is the anchor itself.
    pub fn select_range(&mut self, final_position: usize) -> Result<bool> {
        self.get_item(final_position)?;
        let Some(anchor) = self.items.iter().position(|item| item.selected) else {
            self.select(final_position)?;
            return Ok(true);
        };
        if anchor == final_position {
            return Ok(false);
        }
        let (low, high) = (anchor.min(final_position), anchor.max(final_position));
        for item in &mut self.items[low..=high] {
            item.selected = true;
        }
        self.events.push(StoreEvent::SelectionChanged);
        Ok(true)
    }

    /// Make the item at `position` the only active item.
    pub fn activate(&mut self, position: usize) -> Result<()> {
        self.get_item(position)?;
        debug!(position, "activating service item");
        self.claim_active(position);
        Ok(())
    }

    /// Clear the active flag of the item at `position`.
    ///
    /// Returns `Ok(false)` when the item was not active.
    pub fn deactivate(&mut self, position: usize) -> Result<bool> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(position)
            .ok_or(Error::IndexOutOfRange { position, len })?;
        if !item.active {
            return Ok(false);
        }
        item.active = false;
        self.events.push(StoreEvent::ActiveChanged { position: None });
        Ok(true)
    }

    /// Edit the item at `position` in place.
    ///
    /// The id and the `active`/`selected` flags are owned by the store and are
    /// restored after `edit` runs; `slide_number` is recomputed.
    pub fn update_item<F>(&mut self, position: usize, edit: F) -> Result<()>
    where
        F: FnOnce(&mut ServiceItem),
    {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(position)
            .ok_or(Error::IndexOutOfRange { position, len })?;
        let (id, active, selected) = (item.id.clone(), item.active, item.selected);
        edit(item);
        item.id = id;
        item.active = active;
        item.selected = selected;
        item.normalize();
        let item = item.clone();
        debug!(position, name = %item.name, slides = item.slide_number, "updated service item");
        self.events.push(StoreEvent::Updated { position, item });
        Ok(())
    }

    /// Prepare an incoming item: unique id and a trustworthy slide count.
    fn admit(&self, mut item: ServiceItem) -> ServiceItem {
        if self.position_of(&item.id).is_some() {
            debug!(id = %item.id, "duplicate item id, assigning a fresh one");
            item.id = ItemId::generate();
        }
        if item.normalize() {
            warn!(name = %item.name, slides = item.slide_number, "corrected stale slide count");
        }
        item
    }

    /// Set `active` on `position` only and announce it.
    fn claim_active(&mut self, position: usize) {
        for (i, item) in self.items.iter_mut().enumerate() {
            item.active = i == position;
        }
        self.events.push(StoreEvent::ActiveChanged { position: Some(position) });
    }
}

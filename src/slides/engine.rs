//! Incremental maintenance of the flat slide sequence.
//!
//! The engine mirrors the store order in a range table of `(ItemId, count)`
//! pairs. Each store event touches only the slide range of the affected
//! items; the rest of the sequence is spliced around it.

use std::ops::Range;

use tracing::{debug, warn};

use crate::service::event::StoreEvent;
use crate::service::item::ServiceItem;
use crate::slides::derive::derive_slides;
use crate::slides::slide::Slide;
use crate::types::ItemId;

/// Row-level change in the slide sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideEvent {
    /// `count` slides were inserted starting at `start`.
    Inserted {
        /// First new slide position.
        start: usize,
        /// Number of slides inserted.
        count: usize,
    },
    /// `count` slides were removed starting at `start`.
    Removed {
        /// First removed slide position.
        start: usize,
        /// Number of slides removed.
        count: usize,
    },
    /// A run of slides was relocated.
    Moved {
        /// First slide position of the run before the move.
        source: usize,
        /// First slide position of the run after the move.
        destination: usize,
        /// Length of the run.
        count: usize,
    },
    /// The sequence was emptied.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ItemRange {
    id: ItemId,
    count: usize,
}

/// Keeps the slide sequence a strict flattening of the service items.
#[derive(Debug, Default)]
pub struct SlideDerivationEngine {
    slides: Vec<Slide>,
    ranges: Vec<ItemRange>,
}

impl SlideDerivationEngine {
    /// Create an engine with no slides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the sequence for `items` from scratch.
    pub fn from_items(items: &[ServiceItem]) -> Self {
        let mut engine = Self::new();
        for (position, item) in items.iter().enumerate() {
            engine.splice_item(position, item);
        }
        engine
    }

    /// All slides in projection order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Number of slides.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Check if there are no slides.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// The slide at `position` in the flat sequence.
    pub fn get(&self, position: usize) -> Option<&Slide> {
        self.slides.get(position)
    }

    /// Number of items the engine is tracking.
    pub fn item_count(&self) -> usize {
        self.ranges.len()
    }

    /// Slide positions owned by the item with `id`.
    pub fn range_of(&self, id: &ItemId) -> Option<Range<usize>> {
        let mut start = 0;
        for range in &self.ranges {
            if &range.id == id {
                return Some(start..start + range.count);
            }
            start += range.count;
        }
        None
    }

    /// Position of the first slide of the item with `id`, if it has any.
    pub fn first_slide_of(&self, id: &ItemId) -> Option<usize> {
        self.range_of(id).filter(|r| !r.is_empty()).map(|r| r.start)
    }

    /// Flat position of slide `index` of the item with `id`.
    pub fn position_of(&self, id: &ItemId, index: usize) -> Option<usize> {
        self.range_of(id)
            .filter(|r| index < r.len())
            .map(|r| r.start + index)
    }

    /// Slide counts per item, in store order.
    pub fn item_slide_counts(&self) -> Vec<(ItemId, usize)> {
        self.ranges.iter().map(|r| (r.id.clone(), r.count)).collect()
    }

    /// Apply one store event and report what changed in the slide sequence.
    pub fn apply(&mut self, event: &StoreEvent) -> Vec<SlideEvent> {
        match event {
            StoreEvent::Added { position, item } | StoreEvent::Inserted { position, item } => {
                self.splice_item(*position, item).into_iter().collect()
            }
            StoreEvent::Removed { position, item } => {
                self.remove_item(*position, &item.id).into_iter().collect()
            }
            StoreEvent::Moved { source, destination, count } => {
                self.move_items(*source, *destination, *count).into_iter().collect()
            }
            StoreEvent::Updated { position, item } => self.replace_item(*position, item),
            StoreEvent::Cleared => {
                debug!("clearing all slides");
                self.slides.clear();
                self.ranges.clear();
                vec![SlideEvent::Reset]
            }
            StoreEvent::ActiveChanged { .. } | StoreEvent::SelectionChanged => Vec::new(),
        }
    }

    /// First slide position of the item at store `position`.
    fn offset_of(&self, position: usize) -> usize {
        self.ranges[..position.min(self.ranges.len())]
            .iter()
            .map(|r| r.count)
            .sum()
    }

    /// Resolve the range-table index for an item, trusting the id over the position.
    fn locate(&self, position: usize, id: &ItemId) -> Option<usize> {
        if self.ranges.get(position).is_some_and(|r| &r.id == id) {
            return Some(position);
        }
        let found = self.ranges.iter().position(|r| &r.id == id);
        if found.is_some() {
            warn!(position, ?found, %id, "store position disagreed with slide ranges");
        }
        found
    }

    fn splice_item(&mut self, position: usize, item: &ServiceItem) -> Option<SlideEvent> {
        let position = position.min(self.ranges.len());
        let start = self.offset_of(position);
        let slides = derive_slides(item);
        let count = slides.len();
        debug!(position, start, count, name = %item.name, "deriving slides for item");

        self.ranges.insert(position, ItemRange { id: item.id.clone(), count });
        if start == self.slides.len() {
            self.slides.extend(slides);
        } else {
            self.slides.splice(start..start, slides);
        }
        (count > 0).then_some(SlideEvent::Inserted { start, count })
    }

    fn remove_item(&mut self, position: usize, id: &ItemId) -> Option<SlideEvent> {
        let Some(position) = self.locate(position, id) else {
            warn!(%id, "removed item has no slide range");
            return None;
        };
        let start = self.offset_of(position);
        let range = self.ranges.remove(position);
        self.slides.drain(start..start + range.count);
        debug!(position, start, count = range.count, "removed slides for item");
        (range.count > 0).then_some(SlideEvent::Removed { start, count: range.count })
    }

    fn move_items(&mut self, source: usize, destination: usize, count: usize) -> Option<SlideEvent> {
        if source == destination || source + count > self.ranges.len() || destination + count > self.ranges.len() {
            return None;
        }
        let slide_source = self.offset_of(source);
        let moved_ranges: Vec<ItemRange> = self.ranges.drain(source..source + count).collect();
        let slide_count: usize = moved_ranges.iter().map(|r| r.count).sum();
        let run: Vec<Slide> = self.slides.drain(slide_source..slide_source + slide_count).collect();

        self.ranges.splice(destination..destination, moved_ranges);
        let slide_destination = self.offset_of(destination);
        self.slides.splice(slide_destination..slide_destination, run);
        debug!(slide_source, slide_destination, slide_count, "moved slide run");

        (slide_count > 0 && slide_source != slide_destination).then_some(SlideEvent::Moved {
            source: slide_source,
            destination: slide_destination,
            count: slide_count,
        })
    }

    fn replace_item(&mut self, position: usize, item: &ServiceItem) -> Vec<SlideEvent> {
        let Some(position) = self.locate(position, &item.id) else {
            warn!(id = %item.id, "updated item has no slide range");
            return Vec::new();
        };
        let start = self.offset_of(position);
        let old_count = self.ranges[position].count;
        let slides = derive_slides(item);
        let count = slides.len();
        self.ranges[position].count = count;
        self.slides.splice(start..start + old_count, slides);

        let mut events = Vec::with_capacity(2);
        if old_count > 0 {
            events.push(SlideEvent::Removed { start, count: old_count });
        }
        if count > 0 {
            events.push(SlideEvent::Inserted { start, count });
        }
        events
    }
}

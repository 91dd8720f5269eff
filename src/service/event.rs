//! Row-level change notifications published by the store.

use crate::service::item::ServiceItem;

/// A structural or flag change in the service item store.
///
/// Positions refer to the store as it is *after* the change, except for
/// `Removed` which reports where the item used to be.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// An item was appended.
    Added {
        /// Position of the new item.
        position: usize,
        /// Snapshot of the new item.
        item: ServiceItem,
    },
    /// An item was inserted before an existing one.
    Inserted {
        /// Position of the new item.
        position: usize,
        /// Snapshot of the new item.
        item: ServiceItem,
    },
    /// An item was removed.
    Removed {
        /// Position the item occupied.
        position: usize,
        /// The removed item's content.
        item: ServiceItem,
    },
    /// A contiguous run of items was relocated.
    Moved {
        /// First position of the run before the move.
        source: usize,
        /// First position of the run after the move.
        destination: usize,
        /// Length of the run.
        count: usize,
    },
    /// An item's content was edited in place.
    Updated {
        /// Position of the item.
        position: usize,
        /// Snapshot after the edit.
        item: ServiceItem,
    },
    /// Every item was removed at once.
    Cleared,
    /// The active item changed.
    ActiveChanged {
        /// Position of the newly active item, `None` when nothing is active.
        position: Option<usize>,
    },
    /// The selection changed.
    SelectionChanged,
}

impl StoreEvent {
    /// Whether the event changes the item sequence (and so the slide sequence).
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Added { .. }
                | Self::Inserted { .. }
                | Self::Removed { .. }
                | Self::Moved { .. }
                | Self::Updated { .. }
                | Self::Cleared
        )
    }
}

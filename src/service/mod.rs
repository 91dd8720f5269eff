//! The service: an ordered, operator-curated list of items.

pub mod event;
pub mod item;
pub mod store;

pub use event::StoreEvent;
pub use item::ServiceItem;
pub use store::ServiceItemStore;

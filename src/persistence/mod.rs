//! Saving and loading services.

pub mod archive;
pub mod settings;

use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::service::ServiceItem;

pub use archive::ServiceArchive;
pub use settings::Settings;

/// Serializes a service to disk and back.
///
/// `load` must validate the whole source before returning anything, so a
/// failed load never yields a partial item list.
pub trait PersistenceGateway: Send + fmt::Debug {
    /// Write `items` to `destination`.
    fn save(&self, items: &[ServiceItem], destination: &Path) -> Result<()>;

    /// Read an item list from `source`.
    fn load(&self, source: &Path) -> Result<Vec<ServiceItem>>;

    /// Short name of the on-disk format, for logs.
    fn format_name(&self) -> &'static str;
}

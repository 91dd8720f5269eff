//! Application constants.
//!
//! Centralizes default values and file names.

/// Slide styling defaults.
pub mod style {
    /// Font used when an item does not name one.
    pub const DEFAULT_FONT: &str = "Quicksand";

    /// Font size used when an item does not set one.
    pub const DEFAULT_FONT_SIZE: u32 = 50;
}

/// Service file layout.
pub mod archive {
    /// Entry holding the JSON item list inside a service archive.
    pub const SERVICE_ENTRY: &str = "serviceitems.json";

    /// Directory inside the archive that holds bundled media.
    pub const ASSET_DIR: &str = "assets";

    /// Extension used for saved services.
    pub const EXTENSION: &str = "lmn";

    /// URL scheme prefix stripped from local media references.
    pub const FILE_SCHEME: &str = "file://";
}

/// Configuration file names and environment variables.
pub mod config {
    /// Directory name under the platform config/data dirs.
    pub const APP_DIR: &str = "stageflow";

    /// Settings file name inside the config directory.
    pub const SETTINGS_FILE: &str = "settings.json";

    /// Directory under the data dir where bundled assets are unpacked.
    pub const ASSET_CACHE_DIR: &str = "assets";

    /// Default log filter when neither `STAGEFLOW_LOG` nor `RUST_LOG` is set.
    pub const DEFAULT_LOG_FILTER: &str = "info";
}

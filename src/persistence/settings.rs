//! Remembers which service file was saved last.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{Error, Result};

/// Small JSON settings document kept in the config directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_save_file: Option<PathBuf>,
    #[serde(skip)]
    path: PathBuf,
}

impl Settings {
    /// Read settings from `path`.
    ///
    /// A missing file yields defaults; an unreadable one is logged and
    /// replaced by defaults on the next save.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut settings = match fs_err::read_to_string(&path) {
            Ok(data) => serde_json::from_str::<Self>(&data).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring malformed settings");
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(error = %e, "Could not read settings");
                Self::default()
            }
        };
        settings.path = path;
        settings
    }

    /// Write settings back to their file, replacing it atomically.
    pub fn save(&self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs_err::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Msg(format!("Failed to serialize settings: {e}")))?;
        let mut temp = NamedTempFile::new_in(dir).map_err(|e| Error::io(e, dir.to_path_buf()))?;
        temp.write_all(json.as_bytes())
            .map_err(|e| Error::io(e, temp.path().to_path_buf()))?;
        temp.persist(&self.path)
            .map_err(|e| Error::io(e.error, self.path.clone()))?;
        Ok(())
    }

    /// The service file saved most recently, if any.
    pub fn last_save_file(&self) -> Option<&Path> {
        self.last_save_file.as_deref()
    }

    /// Record `file` as the most recent save.
    pub fn set_last_save_file(&mut self, file: impl Into<PathBuf>) {
        self.last_save_file = Some(file.into());
    }

    /// Where these settings live on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

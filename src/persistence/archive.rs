//! Zip service archives.
//!
//! A service file is a zip holding `serviceitems.json` plus any local media the
//! items reference, stored flat under `assets/`. Loading prefers the original
//! media paths and only falls back to the bundled copies when those are gone.

use std::collections::HashMap;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::PersistenceGateway;
use crate::constants::archive::{ASSET_DIR, FILE_SCHEME, SERVICE_ENTRY};
use crate::constants::style::{DEFAULT_FONT, DEFAULT_FONT_SIZE};
use crate::error::{Error, Result};
use crate::service::ServiceItem;
use crate::types::{BackgroundKind, HorizontalAlignment, ItemId, ItemKind, VerticalAlignment};

/// On-disk shape of one item in `serviceitems.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(rename = "type")]
    kind: ItemKind,
    #[serde(default)]
    audio: String,
    #[serde(default)]
    background: String,
    #[serde(default)]
    background_type: BackgroundKind,
    #[serde(default = "default_font")]
    font: String,
    #[serde(default = "default_font_size")]
    font_size: u32,
    #[serde(default, rename = "horizontalTextAlignment")]
    horizontal_alignment: HorizontalAlignment,
    #[serde(default, rename = "verticalTextAlignment")]
    vertical_alignment: VerticalAlignment,
    #[serde(default)]
    flat_audio: String,
    #[serde(default)]
    flat_background: String,
    #[serde(default, rename = "loop")]
    looping: bool,
    #[serde(default)]
    slide_number: usize,
    #[serde(default, rename = "imageCount")]
    reveal_steps: usize,
    #[serde(default)]
    text: Vec<String>,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    selected: bool,
    #[serde(default)]
    video_start_time: f32,
    #[serde(default)]
    video_end_time: f32,
}

fn default_font() -> String {
    DEFAULT_FONT.to_string()
}

const fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

impl ItemRecord {
    fn from_item(item: &ServiceItem, flat_background: String, flat_audio: String) -> Self {
        Self {
            id: Some(item.id.to_string()),
            name: item.name.clone(),
            kind: item.kind.clone(),
            audio: item.audio.clone(),
            background: item.background.clone(),
            background_type: item.background_kind,
            font: item.font.clone(),
            font_size: item.font_size,
            horizontal_alignment: item.horizontal_alignment,
            vertical_alignment: item.vertical_alignment,
            flat_audio,
            flat_background,
            looping: item.looping,
            slide_number: item.slide_number,
            reveal_steps: item.reveal_steps,
            text: item.text.clone(),
            active: item.active,
            selected: item.selected,
            video_start_time: item.video_start_time,
            video_end_time: item.video_end_time,
        }
    }

    fn into_item(self) -> ServiceItem {
        let mut item = ServiceItem {
            id: self.id.map_or_else(ItemId::generate, ItemId::from),
            name: self.name,
            kind: self.kind,
            background: self.background,
            background_kind: self.background_type,
            text: self.text,
            audio: self.audio,
            font: self.font,
            font_size: self.font_size,
            horizontal_alignment: self.horizontal_alignment,
            vertical_alignment: self.vertical_alignment,
            slide_number: self.slide_number,
            reveal_steps: self.reveal_steps,
            active: self.active,
            selected: self.selected,
            looping: self.looping,
            video_start_time: self.video_start_time,
            video_end_time: self.video_end_time,
        };
        if item.normalize() {
            debug!(name = %item.name, count = item.slide_number, "Corrected stale slide count");
        }
        item
    }
}

/// Strip the `file://` scheme from a media reference.
fn local_path(reference: &str) -> Option<PathBuf> {
    let path = reference.strip_prefix(FILE_SCHEME).unwrap_or(reference);
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// A flat asset name must not escape the extraction directory.
fn is_plain_name(name: &str) -> bool {
    let path = Path::new(name);
    path.file_name().is_some_and(|f| f == path.as_os_str()) && name != ".."
}

/// Media collected for bundling, keyed by flat name.
#[derive(Debug, Default)]
struct Bundle {
    by_name: HashMap<String, PathBuf>,
    order: Vec<String>,
}

impl Bundle {
    /// Register a media reference, returning its flat name (empty when not bundled).
    fn add(&mut self, reference: &str) -> String {
        let Some(path) = local_path(reference).filter(|p| p.is_file()) else {
            return String::new();
        };
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return String::new();
        };

        let mut name = file_name.clone();
        let mut suffix = 1;
        loop {
            match self.by_name.get(&name) {
                Some(existing) if *existing == path => return name,
                Some(_) => {
                    name = format!("{suffix}-{file_name}");
                    suffix += 1;
                }
                None => break,
            }
        }
        self.by_name.insert(name.clone(), path);
        self.order.push(name.clone());
        name
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.order
            .iter()
            .filter_map(|name| self.by_name.get(name).map(|p| (name.as_str(), p.as_path())))
    }
}

/// Zip-based service file format.
#[derive(Debug, Clone)]
pub struct ServiceArchive {
    asset_dir: PathBuf,
}

impl ServiceArchive {
    /// Create a gateway that unpacks bundled media under `asset_dir`.
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
        }
    }

    /// Directory bundled media is unpacked into.
    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    fn write_archive<W: Write + Seek>(writer: W, items: &[ServiceItem]) -> Result<()> {
        let mut bundle = Bundle::default();
        let records: Vec<ItemRecord> = items
            .iter()
            .map(|item| {
                let flat_background = bundle.add(&item.background);
                let flat_audio = bundle.add(&item.audio);
                ItemRecord::from_item(item, flat_background, flat_audio)
            })
            .collect();

        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(writer);

        zip.start_file(SERVICE_ENTRY, options)?;
        serde_json::to_writer_pretty(&mut zip, &records).map_err(|e| Error::Archive(e.to_string()))?;

        for (name, source) in bundle.entries() {
            zip.start_file(format!("{ASSET_DIR}/{name}"), options)?;
            let mut file = fs_err::File::open(source)?;
            std::io::copy(&mut file, &mut zip)?;
            debug!(asset = name, "Bundled media");
        }

        zip.finish()?;
        Ok(())
    }

    fn read_records<R: Read + Seek>(zip: &mut ZipArchive<R>, source: &Path) -> Result<Vec<ItemRecord>> {
        let entry = zip.by_name(SERVICE_ENTRY).map_err(|e| {
            Error::malformed(format!("missing {SERVICE_ENTRY}: {e}"), source.to_path_buf())
        })?;
        let records: Vec<ItemRecord> = serde_json::from_reader(entry)
            .map_err(|e| Error::malformed(e.to_string(), source.to_path_buf()))?;

        let active = records.iter().filter(|r| r.active).count();
        if active > 1 {
            return Err(Error::malformed(
                format!("{active} items are marked active"),
                source.to_path_buf(),
            ));
        }
        for record in &records {
            for flat in [&record.flat_background, &record.flat_audio] {
                if !flat.is_empty() && !is_plain_name(flat) {
                    return Err(Error::malformed(
                        format!("asset name {flat:?} is not a plain file name"),
                        source.to_path_buf(),
                    ));
                }
            }
        }
        Ok(records)
    }

    /// Point `reference` at the bundled copy when the original file is gone.
    fn resolve_media<R: Read + Seek>(
        &self,
        zip: &mut ZipArchive<R>,
        unpack_dir: &Path,
        reference: &mut String,
        flat: &str,
    ) -> Result<()> {
        let Some(original) = local_path(reference) else {
            return Ok(());
        };
        if flat.is_empty() || original.exists() {
            return Ok(());
        }

        let target = unpack_dir.join(flat);
        if !target.exists() {
            let Ok(mut entry) = zip.by_name(&format!("{ASSET_DIR}/{flat}")) else {
                warn!(asset = flat, "Media missing on disk and in archive");
                return Ok(());
            };
            fs_err::create_dir_all(unpack_dir)?;
            let mut out = fs_err::File::create(&target)?;
            std::io::copy(&mut entry, &mut out)?;
            debug!(asset = flat, dir = %self.asset_dir.display(), "Unpacked media");
        }

        let resolved = target.to_string_lossy();
        *reference = if reference.starts_with(FILE_SCHEME) {
            format!("{FILE_SCHEME}{resolved}")
        } else {
            resolved.into_owned()
        };
        Ok(())
    }
}

impl PersistenceGateway for ServiceArchive {
    fn save(&self, items: &[ServiceItem], destination: &Path) -> Result<()> {
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs_err::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| Error::io(e, parent.to_path_buf()))?;
        Self::write_archive(temp.as_file_mut(), items)?;
        temp.persist(destination)
            .map_err(|e| Error::io(e.error, destination.to_path_buf()))?;

        info!(path = %destination.display(), items = items.len(), "Saved service");
        Ok(())
    }

    fn load(&self, source: &Path) -> Result<Vec<ServiceItem>> {
        if !source.is_file() {
            return Err(Error::NotFound(source.to_path_buf()));
        }
        let file = fs_err::File::open(source)?;
        let mut zip = ZipArchive::new(file).map_err(|e| {
            Error::malformed(format!("not a service archive: {e}"), source.to_path_buf())
        })?;

        let records = Self::read_records(&mut zip, source)?;

        let stem = source
            .file_stem()
            .map_or_else(|| "service".to_string(), |s| s.to_string_lossy().into_owned());
        let unpack_dir = self.asset_dir.join(stem);

        let mut items = Vec::with_capacity(records.len());
        for mut record in records {
            let flat_background = std::mem::take(&mut record.flat_background);
            let flat_audio = std::mem::take(&mut record.flat_audio);
            self.resolve_media(&mut zip, &unpack_dir, &mut record.background, &flat_background)?;
            self.resolve_media(&mut zip, &unpack_dir, &mut record.audio, &flat_audio)?;
            items.push(record.into_item());
        }

        info!(path = %source.display(), items = items.len(), "Loaded service");
        Ok(items)
    }

    fn format_name(&self) -> &'static str {
        "zip"
    }
}

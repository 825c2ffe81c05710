//! Preview rows for the selected item: one per mod file, with labels and a
//! thumbnail, built off the UI thread.

use crate::archive::{ArchiveEntry, ArchiveReader, IndexTable};
use crate::error::DecodeError;
use crate::item::GenericItem;
use crate::labels;
use crate::mod_model::{Manifest, ModEntry};
use crate::thumbnail::{self, Thumbnail};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Texture lookups above this count share one prefetched index table.
pub const PREFETCH_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveState {
    Enabled,
    Disabled,
}

impl ActiveState {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            ActiveState::Enabled
        } else {
            ActiveState::Disabled
        }
    }

    pub fn is_enabled(self) -> bool {
        self == ActiveState::Enabled
    }

    pub fn opacity(self) -> f32 {
        match self {
            ActiveState::Enabled => 1.0,
            ActiveState::Disabled => 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRow {
    pub race: String,
    pub map: String,
    pub part: String,
    pub number: String,
    pub active: ActiveState,
    pub toggleable: bool,
    pub thumbnail: Thumbnail,
    pub entry: ModEntry,
}

impl PreviewRow {
    /// Keeps the visual state and the entry's flag in step.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.entry.enabled = enabled;
        self.active = ActiveState::from_enabled(enabled);
    }
}

#[derive(Debug)]
pub enum PreviewEvent {
    Row(PreviewRow),
    Progress { current: usize, total: usize },
    Error(DecodeError),
}

/// Which pack the previewed mods must come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryScope<'a> {
    AnyPack,
    /// `None` is the standalone bucket.
    Pack(Option<&'a str>),
}

pub fn select_entries(manifest: &Manifest, name: &str, scope: EntryScope<'_>) -> Vec<ModEntry> {
    manifest
        .mods_named(name)
        .filter(|m| m.is_visible())
        .filter(|m| match scope {
            EntryScope::AnyPack => true,
            EntryScope::Pack(pack) => m.mod_pack_name() == pack,
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    ColorSet,
    Model,
    Texture,
}

fn source_of(path: &str) -> Source {
    if path.contains("material") {
        Source::ColorSet
    } else if path.contains(".mdl") {
        Source::Model
    } else {
        Source::Texture
    }
}

/// Builds rows for `entries` in order, reporting each through `emit`.
///
/// A failed texture is reported as an error and gets no row; a material whose
/// color set fails is reported and keeps a row without a thumbnail. Either
/// way the entry counts towards progress.
/// Once `cancel` is seen nothing further is emitted.
pub fn build_preview_rows(
    item: &GenericItem,
    entries: &[ModEntry],
    archive: &dyn ArchiveReader,
    cancel: &AtomicBool,
    mut emit: impl FnMut(PreviewEvent),
) {
    let total = entries.len();
    let textures = entries
        .iter()
        .filter(|e| source_of(&e.full_path) == Source::Texture)
        .count();

    let index = if textures > PREFETCH_THRESHOLD {
        match archive.load_index(item.data_file) {
            Ok(index) => {
                debug!("Prefetched index for {} ({} keys)", item.data_file.code(), index.len());
                Some(index)
            }
            Err(source) => {
                warn!("Index prefetch failed, reading entries one by one: {source}");
                emit(PreviewEvent::Error(DecodeError::Index {
                    data_file: item.data_file.code().to_string(),
                    source,
                }));
                None
            }
        }
    } else {
        None
    };

    for (done, entry) in entries.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            debug!("Preview of {} cancelled after {done} entries", item.name);
            return;
        }

        let result = build_row(item, entry, archive, index.as_ref());

        if cancel.load(Ordering::SeqCst) {
            debug!("Preview of {} cancelled after {done} entries", item.name);
            return;
        }

        match result {
            Ok((row, fault)) => {
                if let Some(err) = fault {
                    warn!("{err}");
                    emit(PreviewEvent::Error(err));
                }
                emit(PreviewEvent::Row(row));
            }
            Err(err) => {
                warn!("{err}");
                emit(PreviewEvent::Error(err));
            }
        }
        emit(PreviewEvent::Progress {
            current: done + 1,
            total,
        });
    }
}

fn build_row(
    item: &GenericItem,
    entry: &ModEntry,
    archive: &dyn ArchiveReader,
    index: Option<&IndexTable>,
) -> Result<(PreviewRow, Option<DecodeError>), DecodeError> {
    let path = entry.full_path.as_str();
    let request = ArchiveEntry {
        item,
        path,
        offset: entry.active_offset(),
        tex_type: labels::tex_type(path),
    };

    let mut fault = None;
    let thumbnail = match source_of(path) {
        // A material still gets its row when the color set is unusable.
        Source::ColorSet => color_set_thumbnail(archive, &request).unwrap_or_else(|err| {
            fault = Some(err);
            Thumbnail::None
        }),
        Source::Model => Thumbnail::ModelPlaceholder,
        Source::Texture => {
            let index = index.filter(|i| i.data_file() == item.data_file);
            let data = archive
                .read_texture(&request, index)
                .map_err(|source| DecodeError::Texture {
                    path: path.to_string(),
                    source,
                })?;
            Thumbnail::Image(thumbnail::texture_image(path, data)?)
        }
    };

    let row = PreviewRow {
        race: labels::race(item.primary_category, path),
        map: labels::map(path),
        part: labels::part(path).to_string(),
        number: labels::number(path),
        active: ActiveState::from_enabled(entry.enabled),
        toggleable: entry.is_toggleable(),
        thumbnail,
        entry: entry.clone(),
    };
    Ok((row, fault))
}

fn color_set_thumbnail(archive: &dyn ArchiveReader, request: &ArchiveEntry<'_>) -> Result<Thumbnail, DecodeError> {
    let halves = archive
        .read_color_set(request)
        .map_err(|source| DecodeError::Material {
            path: request.path.to_string(),
            source,
        })?;
    Ok(match thumbnail::color_set_image(request.path, &halves)? {
        Some(img) => Thumbnail::Image(img),
        None => Thumbnail::None,
    })
}

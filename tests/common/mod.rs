#![allow(dead_code)]

use modlist::archive::{ArchiveEntry, ArchiveReader, IndexTable, TextureData};
use modlist::item::DataFile;
use modlist::mod_model::ModData;
use modlist::modding::{ManifestModding, ModdingService};
use modlist::{ArchiveError, ServiceError, FilterMode, Manifest, ModEntry, ModListViewModel, ModPack, SortMode};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const WAIT: Duration = Duration::from_secs(10);

/// Archive double that serves 2x2 textures and a flat color set, counting
/// every call.
#[derive(Default)]
pub struct FakeArchive {
    failing: Vec<String>,
    fail_index: bool,
    cancel_on_read: Option<(usize, Arc<AtomicBool>)>,
    pub texture_reads: AtomicUsize,
    pub indexed_reads: AtomicUsize,
    pub color_set_reads: AtomicUsize,
    pub index_loads: AtomicUsize,
}

impl FakeArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads of `full_path` fail with `NotFound`.
    pub fn failing(mut self, full_path: &str) -> Self {
        self.failing.push(full_path.to_string());
        self
    }

    pub fn failing_index(mut self) -> Self {
        self.fail_index = true;
        self
    }

    /// Raises `flag` while serving the `nth` texture read (1-based).
    pub fn cancel_on_read(mut self, nth: usize, flag: Arc<AtomicBool>) -> Self {
        self.cancel_on_read = Some((nth, flag));
        self
    }

    fn check(&self, entry: &ArchiveEntry<'_>) -> Result<(), ArchiveError> {
        if self.failing.iter().any(|p| p == entry.path) {
            return Err(ArchiveError::NotFound {
                path: entry.path.to_string(),
            });
        }
        Ok(())
    }
}

impl ArchiveReader for FakeArchive {
    fn read_color_set(&self, entry: &ArchiveEntry<'_>) -> Result<Vec<u16>, ArchiveError> {
        self.color_set_reads.fetch_add(1, Ordering::SeqCst);
        self.check(entry)?;
        // 1.0 in every channel.
        Ok(vec![0x3C00; 256])
    }

    fn read_texture(
        &self,
        entry: &ArchiveEntry<'_>,
        index: Option<&IndexTable>,
    ) -> Result<TextureData, ArchiveError> {
        let n = self.texture_reads.fetch_add(1, Ordering::SeqCst) + 1;
        if index.is_some() {
            self.indexed_reads.fetch_add(1, Ordering::SeqCst);
        }
        if let Some((nth, flag)) = &self.cancel_on_read {
            if *nth == n {
                flag.store(true, Ordering::SeqCst);
            }
        }
        self.check(entry)?;
        Ok(TextureData {
            width: 2,
            height: 2,
            rgba: vec![128; 16],
        })
    }

    fn load_index(&self, data_file: DataFile) -> Result<IndexTable, ArchiveError> {
        self.index_loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_index {
            return Err(ArchiveError::Format {
                path: data_file.code().to_string(),
                reason: "index unreadable".to_string(),
            });
        }
        Ok(IndexTable::new(data_file))
    }
}

/// Manifest-backed modding whose next delete of one path fails without
/// touching the file.
pub struct FlakyModding {
    inner: ManifestModding,
    fail_once: Mutex<Option<String>>,
}

impl FlakyModding {
    pub fn new(manifest_path: PathBuf, fail_once: &str) -> Self {
        Self {
            inner: ManifestModding::new(manifest_path),
            fail_once: Mutex::new(Some(fail_once.to_string())),
        }
    }
}

impl ModdingService for FlakyModding {
    fn toggle_mod(&self, full_path: &str, enable: bool) -> Result<(), ServiceError> {
        self.inner.toggle_mod(full_path, enable)
    }

    fn toggle_mod_pack(&self, pack: Option<&str>, enable: bool) -> Result<(), ServiceError> {
        self.inner.toggle_mod_pack(pack, enable)
    }

    fn delete_mod(&self, full_path: &str) -> Result<(), ServiceError> {
        let mut pending = self.fail_once.lock().unwrap();
        if pending.as_deref() == Some(full_path) {
            *pending = None;
            return Err(ServiceError::ModNotFound(full_path.to_string()));
        }
        drop(pending);
        self.inner.delete_mod(full_path)
    }

    fn delete_mod_pack(&self, pack: Option<&str>) -> Result<(), ServiceError> {
        self.inner.delete_mod_pack(pack)
    }
}

pub fn pack(name: &str) -> ModPack {
    ModPack {
        name: name.to_string(),
        author: "Tester".to_string(),
        version: "1.0.0".to_string(),
        ..Default::default()
    }
}

/// A toggleable equipment texture mod for item `name` in `category`.
pub fn gear(name: &str, category: &str, file: &str, pack_name: Option<&str>) -> ModEntry {
    ModEntry {
        source: "test".to_string(),
        name: name.to_string(),
        category: category.to_string(),
        full_path: format!("chara/equipment/e0037/texture/{file}.tex"),
        dat_file: "040000".to_string(),
        enabled: true,
        mod_pack: pack_name.map(pack),
        data: ModData {
            data_type: 4,
            original_offset: 1024,
            mod_offset: 4096,
            mod_size: 256,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn manifest(packs: &[&str], mods: Vec<ModEntry>) -> Manifest {
    Manifest {
        mod_packs: packs.iter().map(|p| pack(p)).collect(),
        mods,
        ..Default::default()
    }
}

pub fn write_manifest(dir: &Path, manifest: &Manifest) -> PathBuf {
    let path = dir.join("XivMods.json");
    manifest.save(&path).unwrap();
    path
}

/// A view model over `manifest` written to a fresh temp dir, already
/// loaded.
pub fn loaded_view(
    manifest: &Manifest,
    archive: Arc<FakeArchive>,
    filter: FilterMode,
) -> (TempDir, PathBuf, ModListViewModel) {
    loaded_view_with(manifest, archive, filter, |path| Arc::new(ManifestModding::new(path)))
}

/// Like [`loaded_view`] with the modding service built from the manifest
/// path.
pub fn loaded_view_with(
    manifest: &Manifest,
    archive: Arc<FakeArchive>,
    filter: FilterMode,
    modding: impl FnOnce(PathBuf) -> Arc<dyn ModdingService>,
) -> (TempDir, PathBuf, ModListViewModel) {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_manifest(tmp.path(), manifest);
    let mut view = ModListViewModel::new(path.clone(), archive, modding(path.clone()), filter, SortMode::Name);
    view.refresh();
    assert!(view.wait_idle(WAIT), "tree build did not finish");
    (tmp, path, view)
}

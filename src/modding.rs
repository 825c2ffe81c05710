//! Toggle and delete operations on installed mods.

use crate::error::ServiceError;
use crate::mod_model::Manifest;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// The framework side of toggling and deleting. `pack == None` addresses the
/// standalone mods.
pub trait ModdingService: Send + Sync {
    fn toggle_mod(&self, full_path: &str, enable: bool) -> Result<(), ServiceError>;
    fn toggle_mod_pack(&self, pack: Option<&str>, enable: bool) -> Result<(), ServiceError>;
    fn delete_mod(&self, full_path: &str) -> Result<(), ServiceError>;
    fn delete_mod_pack(&self, pack: Option<&str>) -> Result<(), ServiceError>;
}

/// Records toggles and deletions in the manifest file. Index patching is
/// left to the framework that owns the data files.
#[derive(Debug)]
pub struct ManifestModding {
    manifest_path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl ManifestModding {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    fn update<T>(
        &self,
        change: impl FnOnce(&mut Manifest) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut manifest = Manifest::load(&self.manifest_path)?;
        let out = change(&mut manifest)?;
        manifest.sync_mod_count();
        manifest.save(&self.manifest_path)?;
        Ok(out)
    }
}

fn pack_label(pack: Option<&str>) -> &str {
    pack.unwrap_or("standalone mods")
}

impl ModdingService for ManifestModding {
    fn toggle_mod(&self, full_path: &str, enable: bool) -> Result<(), ServiceError> {
        self.update(|manifest| {
            let entry = manifest
                .mod_by_path_mut(full_path)
                .ok_or_else(|| ServiceError::ModNotFound(full_path.to_string()))?;
            entry.enabled = enable;
            Ok(())
        })?;
        info!("{} {full_path}", if enable { "Enabled" } else { "Disabled" });
        Ok(())
    }

    fn toggle_mod_pack(&self, pack: Option<&str>, enable: bool) -> Result<(), ServiceError> {
        let changed = self.update(|manifest| {
            let mut changed = 0;
            for entry in manifest.mods.iter_mut().filter(|m| m.mod_pack_name() == pack) {
                entry.enabled = enable;
                changed += 1;
            }
            if changed == 0 && pack.is_some_and(|name| manifest.mod_pack(name).is_none()) {
                return Err(ServiceError::ModPackNotFound(pack_label(pack).to_string()));
            }
            Ok(changed)
        })?;
        info!(
            "{} {changed} mods of {}",
            if enable { "Enabled" } else { "Disabled" },
            pack_label(pack)
        );
        Ok(())
    }

    fn delete_mod(&self, full_path: &str) -> Result<(), ServiceError> {
        self.update(|manifest| {
            let before = manifest.mods.len();
            manifest.mods.retain(|m| m.full_path != full_path);
            if manifest.mods.len() == before {
                return Err(ServiceError::ModNotFound(full_path.to_string()));
            }
            Ok(())
        })?;
        info!("Deleted {full_path}");
        Ok(())
    }

    fn delete_mod_pack(&self, pack: Option<&str>) -> Result<(), ServiceError> {
        let removed = self.update(|manifest| {
            let before = manifest.mods.len();
            manifest.mods.retain(|m| m.mod_pack_name() != pack);
            let removed = before - manifest.mods.len();

            if let Some(name) = pack {
                let declared = manifest.mod_packs.len();
                manifest.mod_packs.retain(|p| p.name != name);
                if removed == 0 && manifest.mod_packs.len() == declared {
                    return Err(ServiceError::ModPackNotFound(name.to_string()));
                }
            }
            Ok(removed)
        })?;
        info!("Deleted {} ({removed} mods)", pack_label(pack));
        Ok(())
    }
}

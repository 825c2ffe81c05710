use crate::error::ManifestError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModPack {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Offsets of a modded file inside its data file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModData {
    #[serde(default)]
    pub data_type: i32,
    #[serde(default)]
    pub original_offset: i64,
    #[serde(default)]
    pub mod_offset: i64,
    #[serde(default)]
    pub mod_size: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModEntry {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub full_path: String,
    #[serde(default)]
    pub dat_file: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub mod_pack: Option<ModPack>,
    #[serde(default)]
    pub data: ModData,
    /// Keys this model does not know, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModEntry {
    pub fn is_visible(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn mod_pack_name(&self) -> Option<&str> {
        self.mod_pack.as_ref().map(|p| p.name.as_str())
    }

    /// Offset the current file contents are read from.
    pub fn active_offset(&self) -> i64 {
        if self.enabled {
            self.data.mod_offset
        } else {
            self.data.original_offset
        }
    }

    /// Toggling swaps offsets; a file added by a mod has nothing to swap back to.
    pub fn is_toggleable(&self) -> bool {
        self.data.mod_offset != self.data.original_offset
    }
}

/// The mod list written by the modding framework.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "ModPacks", default)]
    pub mod_packs: Vec<ModPack>,
    #[serde(rename = "Mods", default)]
    pub mods: Vec<ModEntry>,
    /// Top-level keys such as `version` and `modCount`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const MOD_COUNT: &str = "modCount";

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        // The framework writes a BOM on some systems.
        serde_json::from_str(raw.trim_start_matches('\u{feff}'))
    }

    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let raw = serde_json::to_string_pretty(self).map_err(ManifestError::Serialize)?;
        fs::write(path, raw).map_err(|source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Keeps a stored `modCount` equal to the number of entries. A manifest
    /// without one is left alone.
    pub fn sync_mod_count(&mut self) {
        if let Some(count) = self.extra.get_mut(MOD_COUNT) {
            *count = Value::from(self.mods.len());
        }
    }

    pub fn visible_mods(&self) -> impl Iterator<Item = &ModEntry> {
        self.mods.iter().filter(|m| m.is_visible())
    }

    pub fn mods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ModEntry> {
        self.mods.iter().filter(move |m| m.name == name)
    }

    /// Mods in a pack, or the standalone mods when `pack` is `None`.
    pub fn mods_in_pack<'a>(&'a self, pack: Option<&'a str>) -> impl Iterator<Item = &'a ModEntry> {
        self.visible_mods().filter(move |m| m.mod_pack_name() == pack)
    }

    pub fn mod_pack(&self, name: &str) -> Option<&ModPack> {
        self.mod_packs.iter().find(|p| p.name == name)
    }

    pub fn mod_by_path_mut(&mut self, full_path: &str) -> Option<&mut ModEntry> {
        self.mods.iter_mut().find(|m| m.full_path == full_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "version": "1.0",
        "modCount": 2,
        "ModPacks": [{"name": "Pack", "author": "Someone", "version": "1.0.0", "url": ""}],
        "Mods": [
            {
                "source": "FilesAddedByTexTools",
                "name": "Body",
                "category": "Character",
                "fullPath": "chara/human/c0101/obj/body/b0001/texture/--c0101b0001_d.tex",
                "datFile": "040000",
                "enabled": true,
                "modPack": null,
                "data": {"dataType": 4, "originalOffset": 100, "modOffset": 200, "modSize": 64}
            },
            {
                "name": "",
                "category": "Character",
                "modifiedBy": "tool",
                "fullPath": "chara/human/c0101/obj/body/b0001/model/c0101b0001_top.mdl",
                "datFile": "040000",
                "enabled": false,
                "modPack": {"name": "Pack", "author": "Someone", "version": "1.0.0"}
            }
        ]
    }"#;

    #[test]
    fn parses_framework_layout() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.mod_packs.len(), 1);
        assert_eq!(manifest.mods.len(), 2);

        let body = &manifest.mods[0];
        assert_eq!(body.dat_file, "040000");
        assert_eq!(body.active_offset(), 200);
        assert!(body.is_toggleable());
        assert_eq!(manifest.mods[1].data, ModData::default());
    }

    #[test]
    fn hides_unnamed_mods() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.visible_mods().count(), 1);
        assert_eq!(manifest.mods_in_pack(Some("Pack")).count(), 0);
        assert_eq!(manifest.mods_in_pack(None).count(), 1);
    }

    #[test]
    fn unknown_keys_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("XivMods.json");
        let manifest = Manifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.mods[1].extra["modifiedBy"], "tool");
        manifest.save(&path).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], "1.0");
        assert_eq!(raw["modCount"], 2);
        assert_eq!(raw["ModPacks"][0]["url"], "");
        assert_eq!(raw["Mods"][1]["modifiedBy"], "tool");
        assert_eq!(Manifest::load(&path).unwrap(), manifest);
    }

    #[test]
    fn mod_count_follows_the_entries() {
        let mut manifest = Manifest::parse(SAMPLE).unwrap();
        manifest.mods.pop();
        manifest.sync_mod_count();
        assert_eq!(manifest.extra[MOD_COUNT], 1);

        let mut bare = Manifest::default();
        bare.sync_mod_count();
        assert!(bare.extra.is_empty());
    }

    #[test]
    fn tolerates_byte_order_mark() {
        let raw = format!("\u{feff}{SAMPLE}");
        assert!(Manifest::parse(&raw).is_ok());
    }
}

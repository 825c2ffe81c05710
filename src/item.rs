//! Derives a generic item identity from a mod's in-archive path.
//!
//! Classification is purely substring driven. The rules are checked one after
//! another and every rule that matches overwrites what the previous ones set,
//! so their order is part of the behaviour.

use crate::error::ClassificationError;
use crate::mod_model::ModEntry;
use crate::utils::{parse_id, slice_after, slice_after_last, slice_at};
use std::fmt;

pub const BODY: &str = "Body";
pub const HAIR: &str = "Hair";
pub const FACE: &str = "Face";
pub const TAIL: &str = "Tail";
pub const FACE_PAINT: &str = "Face Paint";
pub const EQUIPMENT_DECALS: &str = "Equipment Decals";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFile {
    Common,
    BgCommon,
    Bg,
    Cut,
    Chara,
    Shader,
    Ui,
    Sound,
    Vfx,
    UiScript,
    Exd,
    GameScript,
    Music,
}

impl DataFile {
    const ALL: [(DataFile, &'static str); 13] = [
        (DataFile::Common, "000000"),
        (DataFile::BgCommon, "010000"),
        (DataFile::Bg, "020000"),
        (DataFile::Cut, "030000"),
        (DataFile::Chara, "040000"),
        (DataFile::Shader, "050000"),
        (DataFile::Ui, "060000"),
        (DataFile::Sound, "070000"),
        (DataFile::Vfx, "080000"),
        (DataFile::UiScript, "090000"),
        (DataFile::Exd, "0a0000"),
        (DataFile::GameScript, "0b0000"),
        (DataFile::Music, "0c0000"),
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|(_, c)| c.eq_ignore_ascii_case(code))
            .map(|(file, _)| *file)
    }

    pub fn code(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(file, _)| *file == self)
            .map(|(_, c)| *c)
            .unwrap_or("000000")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryCategory {
    Gear,
    Character,
    Companions,
    Ui,
    Housing,
}

impl PrimaryCategory {
    pub fn label(self) -> &'static str {
        match self {
            PrimaryCategory::Gear => "Gear",
            PrimaryCategory::Character => "Character",
            PrimaryCategory::Companions => "Companions",
            PrimaryCategory::Ui => "UI",
            PrimaryCategory::Housing => "Housing",
        }
    }
}

impl fmt::Display for PrimaryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub primary_id: u32,
    pub secondary_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericItem {
    pub name: String,
    pub primary_category: Option<PrimaryCategory>,
    pub secondary_category: String,
    pub data_file: DataFile,
    pub model_info: Option<ModelInfo>,
}

/// Builds the generic item a mod entry belongs to.
pub fn classify(entry: &ModEntry) -> Result<GenericItem, ClassificationError> {
    let fault = |reason: String| ClassificationError {
        name: entry.name.clone(),
        path: entry.full_path.clone(),
        reason,
    };

    let data_file = DataFile::from_code(&entry.dat_file)
        .ok_or_else(|| fault(format!("unknown data file \"{}\"", entry.dat_file)))?;

    let mut item = GenericItem {
        name: entry.name.clone(),
        primary_category: None,
        secondary_category: entry.category.clone(),
        data_file,
        model_info: None,
    };

    classify_path(&entry.full_path, &mut item).map_err(fault)?;
    Ok(item)
}

fn id_field(field: Option<&str>, what: &str) -> Result<u32, String> {
    let field = field.ok_or_else(|| format!("path too short for {what}"))?;
    parse_id(field).ok_or_else(|| format!("\"{field}\" is not a valid {what}"))
}

fn primary(id: u32) -> Option<ModelInfo> {
    Some(ModelInfo {
        primary_id: id,
        secondary_id: None,
    })
}

fn classify_path(path: &str, item: &mut GenericItem) -> Result<(), String> {
    if path.contains("chara/equipment") || path.contains("chara/accessory") {
        item.primary_category = Some(PrimaryCategory::Gear);
        item.model_info = primary(id_field(slice_at(path, 17, 4), "equipment id")?);
    }

    if path.contains("chara/weapon") {
        item.primary_category = Some(PrimaryCategory::Gear);
        item.model_info = primary(id_field(slice_at(path, 14, 4), "weapon id")?);
    }

    if path.contains("chara/human") {
        item.primary_category = Some(PrimaryCategory::Character);

        let segment = match item.name.as_str() {
            BODY => Some("/body"),
            HAIR => Some("/hair"),
            FACE => Some("/face"),
            TAIL => Some("/tail"),
            _ => None,
        };
        if let Some(segment) = segment {
            let id = id_field(slice_after(path, segment, 7, 4), "part id")?;
            item.model_info = primary(id);
        }
    }

    if path.contains("chara/common") {
        item.primary_category = Some(PrimaryCategory::Character);

        if item.name == FACE_PAINT {
            let id = id_field(slice_after_last(path, "_", 1, 1), "face paint number")?;
            item.model_info = primary(id);
        } else if item.name == EQUIPMENT_DECALS {
            let mut info = ModelInfo::default();
            if !path.contains("_stigma") {
                info.primary_id = id_field(slice_after_last(path, "_", 1, 3), "decal number")?;
            }
            item.model_info = Some(info);
        }
    }

    if path.contains("chara/monster") {
        item.primary_category = Some(PrimaryCategory::Companions);
        item.model_info = Some(ModelInfo {
            primary_id: id_field(slice_at(path, 15, 4), "monster id")?,
            secondary_id: Some(id_field(slice_after(path, "/body", 7, 4), "body id")?),
        });
    }

    if path.contains("chara/demihuman") {
        item.primary_category = Some(PrimaryCategory::Companions);
        item.model_info = Some(ModelInfo {
            primary_id: id_field(slice_after(path, "t/e", 3, 4), "equipment id")?,
            secondary_id: Some(id_field(slice_at(path, 17, 4), "demihuman id")?),
        });
    }

    if path.contains("ui/") {
        item.primary_category = Some(PrimaryCategory::Ui);

        if path.contains("ui/uld") || path.contains("ui/map") || path.contains("ui/loadingimage") {
            item.model_info = primary(0);
        } else {
            item.model_info = primary(id_field(slice_after_last(path, "/", 1, 6), "icon id")?);
        }
    }

    if path.contains("/hou/") {
        item.primary_category = Some(PrimaryCategory::Housing);
        item.model_info = primary(id_field(slice_after_last(path, "_m", 2, 4), "housing id")?);
    }

    Ok(())
}

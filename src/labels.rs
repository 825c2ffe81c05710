//! Display labels for preview rows, all read off the in-archive path.

use crate::archive::TexType;
use crate::item::PrimaryCategory;
use crate::utils::{slice_after, slice_after_last};

pub const ALL: &str = "All";
pub const MONSTER: &str = "Monster";
pub const NONE: &str = "--";

const RACES: &[(&str, &str)] = &[
    ("0101", "Hyur Midlander Male"),
    ("0104", "Hyur Midlander Male NPC"),
    ("0201", "Hyur Midlander Female"),
    ("0204", "Hyur Midlander Female NPC"),
    ("0301", "Hyur Highlander Male"),
    ("0304", "Hyur Highlander Male NPC"),
    ("0401", "Hyur Highlander Female"),
    ("0404", "Hyur Highlander Female NPC"),
    ("0501", "Elezen Male"),
    ("0504", "Elezen Male NPC"),
    ("0601", "Elezen Female"),
    ("0604", "Elezen Female NPC"),
    ("0701", "Miqo'te Male"),
    ("0704", "Miqo'te Male NPC"),
    ("0801", "Miqo'te Female"),
    ("0804", "Miqo'te Female NPC"),
    ("0901", "Roegadyn Male"),
    ("0904", "Roegadyn Male NPC"),
    ("1001", "Roegadyn Female"),
    ("1004", "Roegadyn Female NPC"),
    ("1101", "Lalafell Male"),
    ("1104", "Lalafell Male NPC"),
    ("1201", "Lalafell Female"),
    ("1204", "Lalafell Female NPC"),
    ("1301", "Au Ra Male"),
    ("1304", "Au Ra Male NPC"),
    ("1401", "Au Ra Female"),
    ("1404", "Au Ra Female NPC"),
    ("1501", "Hrothgar"),
    ("1504", "Hrothgar NPC"),
    ("1801", "Viera"),
    ("1804", "Viera NPC"),
    ("9104", "NPC Male"),
    ("9204", "NPC Female"),
    ("0000", "All Races"),
];

/// Display names for the races offered as the default preview race.
pub fn playable_races() -> impl Iterator<Item = &'static str> {
    RACES
        .iter()
        .filter(|(code, _)| code.ends_with("01") && !code.starts_with('9'))
        .map(|(_, name)| *name)
}

pub fn race_display_name(code: &str) -> String {
    RACES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Unknown ({code})"))
}

fn race_from_code(code: Option<&str>) -> String {
    match code {
        Some(code) => race_display_name(code),
        None => race_display_name("????"),
    }
}

pub fn race(category: Option<PrimaryCategory>, path: &str) -> String {
    match category {
        Some(PrimaryCategory::Gear) => {
            if !path.contains("equipment") {
                return ALL.to_string();
            }
            let code = if path.contains("/v") {
                slice_after_last(path, "_c", 2, 4)
            } else {
                slice_after_last(path, "/c", 2, 4)
            };
            race_from_code(code)
        }
        Some(PrimaryCategory::Character) => {
            if path.contains("chara/common") {
                ALL.to_string()
            } else {
                race_from_code(slice_after(path, "n/c", 3, 4))
            }
        }
        Some(PrimaryCategory::Companions) => MONSTER.to_string(),
        Some(PrimaryCategory::Ui) | Some(PrimaryCategory::Housing) => ALL.to_string(),
        None => NONE.to_string(),
    }
}

/// Kind of map the path holds; `None` when the path is not a texture map.
pub fn tex_type(path: &str) -> Option<TexType> {
    if path.contains("_d.") {
        Some(TexType::Diffuse)
    } else if path.contains("_n.") {
        Some(TexType::Normal)
    } else if path.contains("_s.") {
        Some(TexType::Specular)
    } else if path.contains("_m.") {
        Some(TexType::Multi)
    } else if path.contains("material") {
        Some(TexType::ColorSet)
    } else if path.contains("decal") {
        Some(TexType::Mask)
    } else if path.contains("vfx") {
        Some(TexType::Vfx)
    } else if path.contains("ui/") {
        if path.contains("icon") {
            Some(TexType::Icon)
        } else if path.contains("map") {
            Some(TexType::Map)
        } else {
            None
        }
    } else {
        None
    }
}

pub fn map(path: &str) -> String {
    if let Some(tex) = tex_type(path) {
        return tex.to_string();
    }
    if path.contains("ui/") {
        "UI".to_string()
    } else if path.contains(".mdl") {
        "3D".to_string()
    } else {
        NONE.to_string()
    }
}

pub fn part(path: &str) -> &'static str {
    for letter in ["b", "c", "d"] {
        if path.contains(&format!("_{letter}_")) || path.contains(&format!("_{letter}.")) {
            return letter;
        }
    }
    "a"
}

pub fn number(path: &str) -> String {
    for segment in ["/hair", "/body", "/face", "/tail", "/zear"] {
        if path.contains(segment) {
            return slice_after(path, segment, 8, 3)
                .map(|n| n.trim_start_matches('0').to_string())
                .unwrap_or_else(|| NONE.to_string());
        }
    }

    if path.contains("/decal_face") {
        return slice_after(path, "/decal_face", 19, 2)
            .map(|n| n.trim_end_matches('.').to_string())
            .unwrap_or_else(|| NONE.to_string());
    }

    if path.contains("/decal_equip") && !path.contains("stigma") {
        return slice_after(path, "/decal_equip", 20, 3)
            .map(str::to_string)
            .unwrap_or_else(|| NONE.to_string());
    }

    NONE.to_string()
}

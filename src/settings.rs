use crate::item::{PrimaryCategory, HAIR};
use crate::labels;
use crate::notify::Notifier;
use crate::tree::{FilterMode, SortMode};
use anyhow::{Context, Result};
use bincode::config;
use bincode::{decode_from_slice, encode_to_vec, Decode, Encode};
use directories::{ProjectDirs, UserDirs};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const CONFIG_FILE: &str = "settings.bin";
const MANIFEST_FILE: &str = "XivMods.json";

pub const SKIN_DEFAULT: &str = "#FFFFFFFF";
pub const BROWN_DEFAULT: &str = "#FF603913";
pub const BG_DEFAULT: &str = "#FF777777";

pub const SKIN_TYPES: [&str; 4] = ["Midlander", "Highlander", "Raen", "Xaela"];
pub const IMPORTERS: [&str; 2] = ["OpenCollada", "AutodeskCollada"];

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "modlist", "modlist-rust")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Dds,
    Bmp,
    Png,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Dds, ExportFormat::Bmp, ExportFormat::Png];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Dds => "dds",
            ExportFormat::Bmp => "bmp",
            ExportFormat::Png => "png",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Dds => "DDS",
            ExportFormat::Bmp => "BMP",
            ExportFormat::Png => "PNG",
        }
    }
}

/// Texture formats used when exporting. At least one is always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct ExportFormats {
    pub dds: bool,
    pub bmp: bool,
    pub png: bool,
}

impl Default for ExportFormats {
    fn default() -> Self {
        Self {
            dds: true,
            bmp: false,
            png: false,
        }
    }
}

impl ExportFormats {
    pub fn get(&self, format: ExportFormat) -> bool {
        match format {
            ExportFormat::Dds => self.dds,
            ExportFormat::Bmp => self.bmp,
            ExportFormat::Png => self.png,
        }
    }

    /// Turning the last format off turns DDS back on.
    pub fn set(&mut self, format: ExportFormat, on: bool) {
        match format {
            ExportFormat::Dds => self.dds = on,
            ExportFormat::Bmp => self.bmp = on,
            ExportFormat::Png => self.png = on,
        }
        if !self.dds && !self.bmp && !self.png {
            self.dds = true;
        }
    }

    pub fn enabled(&self) -> impl Iterator<Item = ExportFormat> + '_ {
        ExportFormat::ALL.into_iter().filter(|f| self.get(*f))
    }

    pub fn extensions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.enabled().map(ExportFormat::extension)
    }

    pub fn display(&self) -> String {
        self.enabled()
            .map(ExportFormat::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSlot {
    Skin,
    Hair,
    Iris,
    Etc,
    Background,
}

impl ColorSlot {
    pub const ALL: [ColorSlot; 5] = [
        ColorSlot::Skin,
        ColorSlot::Hair,
        ColorSlot::Iris,
        ColorSlot::Etc,
        ColorSlot::Background,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ColorSlot::Skin => "Skin",
            ColorSlot::Hair => "Hair",
            ColorSlot::Iris => "Iris",
            ColorSlot::Etc => "Etc.",
            ColorSlot::Background => "Background",
        }
    }

    pub fn default_value(self) -> &'static str {
        match self {
            ColorSlot::Skin => SKIN_DEFAULT,
            ColorSlot::Hair | ColorSlot::Iris | ColorSlot::Etc => BROWN_DEFAULT,
            ColorSlot::Background => BG_DEFAULT,
        }
    }
}

/// `#AARRGGBB` to `[r, g, b, a]`.
pub fn parse_color(value: &str) -> Option<[u8; 4]> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 8 {
        return None;
    }
    let argb = u32::from_str_radix(hex, 16).ok()?;
    let [a, r, g, b] = argb.to_be_bytes();
    Some([r, g, b, a])
}

pub fn format_color([r, g, b, a]: [u8; 4]) -> String {
    format!("#{a:02X}{r:02X}{g:02X}{b:02X}")
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Settings {
    pub game_dir: PathBuf,
    pub save_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub mod_pack_dir: PathBuf,
    pub default_author: String,
    pub skin_color: String,
    pub hair_color: String,
    pub iris_color: String,
    pub etc_color: String,
    pub bg_color: String,
    pub skin_type: String,
    pub default_race: String,
    pub importer: String,
    pub export_formats: ExportFormats,
    pub mod_list_sort: String,
    pub mod_list_filter: String,
    pub force_uv1_quadrant: bool,
    pub clone_uv1_to_uv2: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let base = UserDirs::new()
            .and_then(|u| u.document_dir().map(Path::to_path_buf))
            .or_else(|| project_dirs().map(|p| p.data_dir().to_path_buf()))
            .unwrap_or_default()
            .join("ModList");

        Self {
            game_dir: PathBuf::new(),
            save_dir: base.join("Saved"),
            backup_dir: base.join("Index_Backups"),
            mod_pack_dir: base.join("ModPacks"),
            default_author: String::new(),
            skin_color: SKIN_DEFAULT.to_string(),
            hair_color: BROWN_DEFAULT.to_string(),
            iris_color: BROWN_DEFAULT.to_string(),
            etc_color: BROWN_DEFAULT.to_string(),
            bg_color: BG_DEFAULT.to_string(),
            skin_type: SKIN_TYPES[0].to_string(),
            default_race: labels::race_display_name("0101"),
            importer: IMPORTERS[0].to_string(),
            export_formats: ExportFormats::default(),
            mod_list_sort: SortMode::default().as_setting().to_string(),
            mod_list_filter: FilterMode::default().as_setting().to_string(),
            force_uv1_quadrant: false,
            clone_uv1_to_uv2: false,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|p| p.config_dir().join(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let buf = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let (settings, _bytes_read): (Settings, usize) = decode_from_slice(&buf, config::standard())
            .with_context(|| format!("decoding {}", path.display()))?;
        Ok(settings)
    }

    /// Missing or unreadable settings fall back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Using default settings: {e:#}");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = encode_to_vec(self, config::standard())?;
        fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn color(&self, slot: ColorSlot) -> &str {
        match slot {
            ColorSlot::Skin => &self.skin_color,
            ColorSlot::Hair => &self.hair_color,
            ColorSlot::Iris => &self.iris_color,
            ColorSlot::Etc => &self.etc_color,
            ColorSlot::Background => &self.bg_color,
        }
    }

    fn color_mut(&mut self, slot: ColorSlot) -> &mut String {
        match slot {
            ColorSlot::Skin => &mut self.skin_color,
            ColorSlot::Hair => &mut self.hair_color,
            ColorSlot::Iris => &mut self.iris_color,
            ColorSlot::Etc => &mut self.etc_color,
            ColorSlot::Background => &mut self.bg_color,
        }
    }

    /// The manifest sits two levels above the game's data directory.
    pub fn manifest_path(&self) -> Option<PathBuf> {
        let root = self.game_dir.parent()?.parent()?;
        Some(root.join(MANIFEST_FILE))
    }

    pub fn sort_mode(&self) -> SortMode {
        SortMode::from_setting(&self.mod_list_sort)
    }

    pub fn filter_mode(&self) -> FilterMode {
        FilterMode::from_setting(&self.mod_list_filter)
    }
}

/// Moves a directory's contents. Tries a rename first and falls back to copy
/// and delete, which also works across volumes.
pub fn relocate_directory(from: &Path, to: &Path) -> Result<()> {
    if from == to || !from.exists() {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    for entry in WalkDir::new(from) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(from)?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("creating {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("copying {}", entry.path().display()))?;
        }
    }
    fs::remove_dir_all(from).with_context(|| format!("removing {}", from.display()))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsProperty {
    GameDir,
    SaveDir,
    BackupDir,
    ModPackDir,
    DefaultAuthor,
    Color(ColorSlot),
    SkinType,
    DefaultRace,
    Importer,
    ExportFormats,
    ModListSort,
    ModListFilter,
    ImportOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedDir {
    Save,
    Backup,
    ModPack,
}

/// Settings as the customize window edits them. Every setter persists and
/// then notifies subscribers.
#[derive(Debug)]
pub struct SettingsModel {
    settings: Settings,
    path: Option<PathBuf>,
    // Edited freely, committed on close.
    author_draft: String,
    notifier: Notifier<SettingsProperty>,
}

impl SettingsModel {
    pub fn load() -> Self {
        match Settings::default_path() {
            Some(path) => Self::with_path(path),
            None => Self::in_memory(Settings::default()),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        let settings = Settings::load_or_default(&path);
        Self::new(settings, Some(path))
    }

    pub fn in_memory(settings: Settings) -> Self {
        Self::new(settings, None)
    }

    fn new(settings: Settings, path: Option<PathBuf>) -> Self {
        Self {
            author_draft: settings.default_author.clone(),
            settings,
            path,
            notifier: Notifier::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn notifier(&mut self) -> &mut Notifier<SettingsProperty> {
        &mut self.notifier
    }

    fn commit(&mut self, property: SettingsProperty) -> Result<()> {
        if let Some(path) = &self.path {
            self.settings.save_to(path)?;
        }
        self.notifier.notify(&property);
        Ok(())
    }

    pub fn set_game_dir(&mut self, dir: PathBuf) -> Result<()> {
        info!("Game directory set to {}", dir.display());
        self.settings.game_dir = dir;
        self.commit(SettingsProperty::GameDir)
    }

    pub fn dir(&self, which: ManagedDir) -> &Path {
        match which {
            ManagedDir::Save => &self.settings.save_dir,
            ManagedDir::Backup => &self.settings.backup_dir,
            ManagedDir::ModPack => &self.settings.mod_pack_dir,
        }
    }

    /// Points a data directory somewhere else, optionally moving what the old
    /// one held.
    pub fn set_dir(&mut self, which: ManagedDir, dir: PathBuf, move_data: bool) -> Result<()> {
        if move_data {
            relocate_directory(self.dir(which), &dir)?;
        }
        info!("{which:?} directory set to {}", dir.display());
        let (slot, property) = match which {
            ManagedDir::Save => (&mut self.settings.save_dir, SettingsProperty::SaveDir),
            ManagedDir::Backup => (&mut self.settings.backup_dir, SettingsProperty::BackupDir),
            ManagedDir::ModPack => (&mut self.settings.mod_pack_dir, SettingsProperty::ModPackDir),
        };
        *slot = dir;
        self.commit(property)
    }

    pub fn author_draft_mut(&mut self) -> &mut String {
        &mut self.author_draft
    }

    /// Stores the edited default author if it changed.
    pub fn commit_author(&mut self) -> Result<()> {
        if self.author_draft == self.settings.default_author {
            return Ok(());
        }
        self.settings.default_author = self.author_draft.clone();
        self.commit(SettingsProperty::DefaultAuthor)
    }

    pub fn set_color(&mut self, slot: ColorSlot, rgba: [u8; 4]) -> Result<()> {
        *self.settings.color_mut(slot) = format_color(rgba);
        self.commit(SettingsProperty::Color(slot))
    }

    pub fn color(&self, slot: ColorSlot) -> [u8; 4] {
        parse_color(self.settings.color(slot))
            .or_else(|| parse_color(slot.default_value()))
            .unwrap_or([255; 4])
    }

    pub fn reset_colors(&mut self) -> Result<()> {
        for slot in ColorSlot::ALL {
            *self.settings.color_mut(slot) = slot.default_value().to_string();
        }
        if let Some(path) = &self.path {
            self.settings.save_to(path)?;
        }
        for slot in ColorSlot::ALL {
            self.notifier.notify(&SettingsProperty::Color(slot));
        }
        Ok(())
    }

    pub fn skin_types(&self) -> &'static [&'static str] {
        &SKIN_TYPES
    }

    pub fn default_races(&self) -> Vec<&'static str> {
        labels::playable_races().collect()
    }

    pub fn importers(&self) -> &'static [&'static str] {
        &IMPORTERS
    }

    pub fn set_skin_type(&mut self, value: &str) -> Result<()> {
        if self.settings.skin_type == value {
            return Ok(());
        }
        self.settings.skin_type = value.to_string();
        self.commit(SettingsProperty::SkinType)
    }

    pub fn set_default_race(&mut self, value: &str) -> Result<()> {
        if self.settings.default_race == value {
            return Ok(());
        }
        self.settings.default_race = value.to_string();
        self.commit(SettingsProperty::DefaultRace)
    }

    pub fn set_importer(&mut self, value: &str) -> Result<()> {
        if self.settings.importer == value {
            return Ok(());
        }
        self.settings.importer = value.to_string();
        self.commit(SettingsProperty::Importer)
    }

    pub fn set_export_format(&mut self, format: ExportFormat, on: bool) -> Result<()> {
        self.settings.export_formats.set(format, on);
        self.commit(SettingsProperty::ExportFormats)
    }

    pub fn export_display(&self) -> String {
        self.settings.export_formats.display()
    }

    pub fn set_sort(&mut self, sort: SortMode) -> Result<()> {
        self.settings.mod_list_sort = sort.as_setting().to_string();
        self.commit(SettingsProperty::ModListSort)
    }

    pub fn set_filter(&mut self, filter: FilterMode) -> Result<()> {
        self.settings.mod_list_filter = filter.as_setting().to_string();
        self.commit(SettingsProperty::ModListFilter)
    }

    /// Only remembered when importing gear.
    pub fn set_force_uv1_quadrant(&mut self, category: Option<PrimaryCategory>, on: bool) -> Result<()> {
        if category != Some(PrimaryCategory::Gear) {
            return Ok(());
        }
        self.settings.force_uv1_quadrant = on;
        self.commit(SettingsProperty::ImportOptions)
    }

    /// Only remembered when importing hair.
    pub fn set_clone_uv1_to_uv2(&mut self, secondary_category: &str, on: bool) -> Result<()> {
        if secondary_category != HAIR {
            return Ok(());
        }
        self.settings.clone_uv1_to_uv2 = on;
        self.commit(SettingsProperty::ImportOptions)
    }
}

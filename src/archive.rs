//! Read access to game assets.
//!
//! The archive data files themselves are owned by the modding framework, so
//! everything here goes through [`ArchiveReader`]. The shipped reader,
//! [`ExportDirArchive`], serves files the user previously exported into the
//! save directory.

use crate::error::ArchiveError;
use crate::item::{DataFile, GenericItem};
use crate::settings::ExportFormats;
use crate::utils::file_stem;
use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const DDS_MAGIC: u32 = 0x2053_4444;
const DDS_HEADER_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexType {
    Diffuse,
    Normal,
    Specular,
    Multi,
    ColorSet,
    Mask,
    Vfx,
    Icon,
    Map,
}

impl fmt::Display for TexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TexType::Diffuse => "Diffuse",
            TexType::Normal => "Normal",
            TexType::Specular => "Specular",
            TexType::Multi => "Multi",
            TexType::ColorSet => "ColorSet",
            TexType::Mask => "Mask",
            TexType::Vfx => "Vfx",
            TexType::Icon => "Icon",
            TexType::Map => "Map",
        };
        f.write_str(name)
    }
}

/// One file of an item, as the preview builder asks for it.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveEntry<'a> {
    pub item: &'a GenericItem,
    pub path: &'a str,
    /// Offset of the live copy: the mod offset when enabled, else the original.
    pub offset: i64,
    pub tex_type: Option<TexType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Lookup table loaded once for a data file and shared by many reads.
#[derive(Debug, Clone)]
pub struct IndexTable {
    data_file: DataFile,
    locations: HashMap<String, Vec<PathBuf>>,
}

impl IndexTable {
    pub fn new(data_file: DataFile) -> Self {
        Self {
            data_file,
            locations: HashMap::new(),
        }
    }

    pub fn data_file(&self) -> DataFile {
        self.data_file
    }

    pub fn insert(&mut self, key: impl Into<String>, location: PathBuf) {
        self.locations.entry(key.into()).or_default().push(location);
    }

    pub fn locations(&self, key: &str) -> &[PathBuf] {
        self.locations.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

pub trait ArchiveReader: Send + Sync {
    /// Raw half-float color set of a material.
    fn read_color_set(&self, entry: &ArchiveEntry<'_>) -> Result<Vec<u16>, ArchiveError>;

    /// Decoded RGBA pixels of a texture. `index` is only passed when it was
    /// loaded for the entry's data file.
    fn read_texture(
        &self,
        entry: &ArchiveEntry<'_>,
        index: Option<&IndexTable>,
    ) -> Result<TextureData, ArchiveError>;

    fn load_index(&self, data_file: DataFile) -> Result<IndexTable, ArchiveError>;
}

/// Serves textures and color sets from `<save>/<category>/<item>/<stem>.<ext>`.
///
/// Exports are snapshots, so the entry offset is not consulted.
#[derive(Debug, Clone)]
pub struct ExportDirArchive {
    save_dir: PathBuf,
    formats: ExportFormats,
}

impl ExportDirArchive {
    pub fn new(save_dir: impl Into<PathBuf>, formats: ExportFormats) -> Self {
        Self {
            save_dir: save_dir.into(),
            formats,
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    fn item_dir(&self, item: &GenericItem) -> PathBuf {
        self.save_dir.join(&item.secondary_category).join(&item.name)
    }

    fn index_key(item: &GenericItem, stem: &str) -> String {
        format!("{}/{}/{}", item.secondary_category, item.name, stem).to_lowercase()
    }

    fn find_texture(&self, entry: &ArchiveEntry<'_>, index: Option<&IndexTable>) -> Option<PathBuf> {
        let stem = file_stem(entry.path);

        if let Some(index) = index {
            let known = index.locations(&Self::index_key(entry.item, stem));
            return self.formats.extensions().find_map(|ext| {
                known
                    .iter()
                    .find(|p| has_extension(p, ext))
                    .cloned()
            });
        }

        let dir = self.item_dir(entry.item);
        self.formats
            .extensions()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|p| p.is_file())
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

impl ArchiveReader for ExportDirArchive {
    fn read_color_set(&self, entry: &ArchiveEntry<'_>) -> Result<Vec<u16>, ArchiveError> {
        let path = self
            .item_dir(entry.item)
            .join(format!("{}.dds", file_stem(entry.path)));
        if !path.is_file() {
            return Err(ArchiveError::NotFound {
                path: entry.path.to_string(),
            });
        }

        let file = File::open(&path).map_err(|source| ArchiveError::Io {
            path: path.clone(),
            source,
        })?;
        read_dds_halves(BufReader::new(file)).map_err(|reason| ArchiveError::Format {
            path: path.display().to_string(),
            reason,
        })
    }

    fn read_texture(
        &self,
        entry: &ArchiveEntry<'_>,
        index: Option<&IndexTable>,
    ) -> Result<TextureData, ArchiveError> {
        let path = self
            .find_texture(entry, index)
            .ok_or_else(|| ArchiveError::NotFound {
                path: entry.path.to_string(),
            })?;

        let rgba = image::open(&path)
            .map_err(|e| ArchiveError::Format {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
            .to_rgba8();

        Ok(TextureData {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }

    fn load_index(&self, data_file: DataFile) -> Result<IndexTable, ArchiveError> {
        let mut table = IndexTable::new(data_file);

        for entry in WalkDir::new(&self.save_dir).min_depth(3).max_depth(3) {
            let entry = entry.map_err(|e| ArchiveError::Io {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.save_dir.clone()),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.save_dir) else {
                continue;
            };
            let parts: Vec<_> = relative.iter().filter_map(|p| p.to_str()).collect();
            if let [category, item, file] = parts.as_slice() {
                let key = format!("{category}/{item}/{}", file_stem(file)).to_lowercase();
                table.insert(key, entry.path().to_path_buf());
            }
        }

        debug!(
            "Indexed {} exported files under {}",
            table.len(),
            self.save_dir.display()
        );
        Ok(table)
    }
}

/// Little-endian half floats following a DDS header.
fn read_dds_halves(mut r: impl Read) -> Result<Vec<u16>, String> {
    let magic = r.read_u32::<LittleEndian>().map_err(|e| e.to_string())?;
    if magic != DDS_MAGIC {
        return Err(format!("bad magic {magic:#010x}"));
    }

    let mut header = [0u8; DDS_HEADER_LEN - 4];
    r.read_exact(&mut header).map_err(|e| e.to_string())?;

    let mut payload = Vec::new();
    r.read_to_end(&mut payload).map_err(|e| e.to_string())?;

    let mut cursor = payload.as_slice();
    let mut halves = Vec::with_capacity(payload.len() / 2);
    while cursor.len() >= 2 {
        halves.push(cursor.read_u16::<LittleEndian>().map_err(|e| e.to_string())?);
    }
    Ok(halves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use image::{Rgba, RgbaImage};
    use std::fs;

    fn dds_bytes(halves: &[u16]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(DDS_MAGIC).unwrap();
        buf.extend_from_slice(&[0u8; DDS_HEADER_LEN - 4]);
        for h in halves {
            buf.write_u16::<LittleEndian>(*h).unwrap();
        }
        buf
    }

    #[test]
    fn reads_halves_after_header() {
        let halves = read_dds_halves(dds_bytes(&[0x3c00, 0x0000, 0xbc00]).as_slice()).unwrap();
        assert_eq!(halves, vec![0x3c00, 0x0000, 0xbc00]);
    }

    #[test]
    fn rejects_non_dds() {
        let mut bytes = dds_bytes(&[1]);
        bytes[0] = b'X';
        assert!(read_dds_halves(bytes.as_slice()).is_err());
        assert!(read_dds_halves(&[0u8; 3][..]).is_err());
    }

    #[test]
    fn tex_type_names() {
        assert_eq!(TexType::ColorSet.to_string(), "ColorSet");
        assert_eq!(TexType::Vfx.to_string(), "Vfx");
    }

    #[test]
    fn index_table_groups_locations() {
        let mut table = IndexTable::new(DataFile::Chara);
        table.insert("a/b/c", PathBuf::from("a/b/c.png"));
        table.insert("a/b/c", PathBuf::from("a/b/c.dds"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.locations("a/b/c").len(), 2);
        assert!(table.locations("missing").is_empty());
    }

    const TEXTURE: &str = "chara/equipment/e0037/texture/v01_top_d.tex";
    const MATERIAL: &str = "chara/equipment/e0037/material/v0001/mt_top_a.mtrl";

    fn top() -> GenericItem {
        GenericItem {
            name: "Top".to_string(),
            primary_category: None,
            secondary_category: "Body".to_string(),
            data_file: DataFile::Chara,
            model_info: None,
        }
    }

    fn entry<'a>(item: &'a GenericItem, path: &'a str) -> ArchiveEntry<'a> {
        ArchiveEntry {
            item,
            path,
            offset: 0,
            tex_type: None,
        }
    }

    fn export(dir: &Path, relative: &str, width: u32, height: u32) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
    }

    fn formats(dds: bool, bmp: bool, png: bool) -> ExportFormats {
        ExportFormats { dds, bmp, png }
    }

    #[test]
    fn indexed_and_direct_lookups_agree() {
        let dir = tempfile::tempdir().unwrap();
        export(dir.path(), "Body/Top/v01_top_d.png", 3, 2);
        let archive = ExportDirArchive::new(dir.path(), formats(true, false, true));
        let item = top();

        let direct = archive.read_texture(&entry(&item, TEXTURE), None).unwrap();
        let index = archive.load_index(DataFile::Chara).unwrap();
        let indexed = archive.read_texture(&entry(&item, TEXTURE), Some(&index)).unwrap();

        assert_eq!((direct.width, direct.height), (3, 2));
        assert_eq!(&direct.rgba[..4], &[10, 20, 30, 255]);
        assert_eq!(direct, indexed);
    }

    #[test]
    fn earlier_formats_win() {
        let dir = tempfile::tempdir().unwrap();
        export(dir.path(), "Body/Top/v01_top_d.bmp", 2, 2);
        export(dir.path(), "Body/Top/v01_top_d.png", 3, 2);
        let archive = ExportDirArchive::new(dir.path(), formats(false, true, true));
        let item = top();
        let index = archive.load_index(DataFile::Chara).unwrap();

        for index in [None, Some(&index)] {
            let tex = archive.read_texture(&entry(&item, TEXTURE), index).unwrap();
            assert_eq!(tex.width, 2);
        }

        let png_only = ExportDirArchive::new(dir.path(), formats(false, false, true));
        let tex = png_only.read_texture(&entry(&item, TEXTURE), None).unwrap();
        assert_eq!(tex.width, 3);
    }

    #[test]
    fn disabled_formats_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        export(dir.path(), "Body/Top/v01_top_d.png", 3, 2);
        let archive = ExportDirArchive::new(dir.path(), ExportFormats::default());
        let item = top();

        assert!(matches!(
            archive.read_texture(&entry(&item, TEXTURE), None),
            Err(ArchiveError::NotFound { .. })
        ));
    }

    #[test]
    fn index_covers_item_folders_only() {
        let dir = tempfile::tempdir().unwrap();
        export(dir.path(), "Body/Top/V01_Top_D.png", 1, 1);
        export(dir.path(), "Body/stray.png", 1, 1);
        export(dir.path(), "Body/Top/old/v01_top_n.png", 1, 1);
        let archive = ExportDirArchive::new(dir.path(), formats(false, false, true));

        let index = archive.load_index(DataFile::Chara).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.data_file(), DataFile::Chara);
        assert_eq!(index.locations("body/top/v01_top_d").len(), 1);
        assert!(index.locations("body/top/old").is_empty());
    }

    #[test]
    fn color_sets_come_from_exported_dds() {
        let dir = tempfile::tempdir().unwrap();
        let item_dir = dir.path().join("Body").join("Top");
        fs::create_dir_all(&item_dir).unwrap();
        fs::write(item_dir.join("mt_top_a.dds"), dds_bytes(&[0x3c00; 256])).unwrap();
        let archive = ExportDirArchive::new(dir.path(), ExportFormats::default());
        let item = top();

        let halves = archive.read_color_set(&entry(&item, MATERIAL)).unwrap();
        assert_eq!(halves.len(), 256);
        assert!(halves.iter().all(|h| *h == 0x3c00));

        let missing = "chara/equipment/e0037/material/v0001/mt_top_b.mtrl";
        assert!(matches!(
            archive.read_color_set(&entry(&item, missing)),
            Err(ArchiveError::NotFound { path }) if path == missing
        ));
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/assets.rs - Asset providers for the strategy board renderer.
 *  Copyright (C) 2026  Forest Crossman <cyrozap@gmail.com>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

/*!
 * # `assets` Module
 *
 * Two [AssetProvider] implementations:
 *
 * - [DirectoryAssets] reads images and the label font from a directory and
 *   keeps everything it has loaded for the lifetime of the provider.
 * - [MemoryAssets] holds assets the caller has already loaded, for example
 *   from resources embedded in a binary.
 *
 * ## Directory Layout
 *
 * ```text
 * assets.csv          id,name,scale manifest (optional)
 * <id>.png            sprite for object type <id>
 * x<id + 1>.png       background <id>
 * circle_aoe.png      image clipped into circle AoE arcs
 * 17.png              image clipped into fan AoE arcs (optional)
 * Roboto-Medium.ttf   label font
 * ```
 */

use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use ab_glyph::FontArc;
use log::debug;
use tiny_skia::{ColorU8, Pixmap};

use crate::error::{Error, Result};
use crate::geometry::DEFAULT_SPRITE_SCALE;
use crate::parser::object_type;
use crate::render::{AssetProvider, Sprite};

pub const MANIFEST_FILE: &str = "assets.csv";
pub const DEFAULT_FONT_FILE: &str = "Roboto-Medium.ttf";
pub const CIRCLE_AOE_MASK_FILE: &str = "circle_aoe.png";

/// A row of the asset manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub name: String,
    /// Sprite scale per unit of object scale.
    pub scale: f32,
}

/// Parses an `id,name,scale` manifest. An empty scale column selects
/// [DEFAULT_SPRITE_SCALE].
pub fn parse_manifest(content: &[u8]) -> Result<HashMap<u16, ManifestEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let mut manifest = HashMap::new();
    for result in reader.records() {
        let record = result?;
        let Some(id) = record.get(0).filter(|id| !id.is_empty()) else {
            continue;
        };
        let id: u16 = id
            .parse()
            .map_err(|_| Error::asset(format!("manifest: invalid object type {:?}", id)))?;
        let name = record.get(1).unwrap_or_default().to_string();
        let scale = match record.get(2).filter(|scale| !scale.is_empty()) {
            Some(scale) => scale
                .parse()
                .map_err(|_| Error::asset(format!("manifest: invalid scale {:?} for {}", scale, id)))?,
            None => DEFAULT_SPRITE_SCALE,
        };
        manifest.insert(id, ManifestEntry { name, scale });
    }

    Ok(manifest)
}

/// Loads an image file into a premultiplied pixmap.
pub fn load_pixmap(path: &Path) -> Result<Pixmap> {
    if !path.is_file() {
        return Err(Error::asset(format!("missing {}", path.display())));
    }

    let image = image::open(path)?.to_rgba8();
    let mut pixmap = Pixmap::new(image.width(), image.height())
        .ok_or_else(|| Error::asset(format!("empty image {}", path.display())))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }

    debug!(
        "loaded {} ({}x{})",
        path.display(),
        pixmap.width(),
        pixmap.height()
    );
    Ok(pixmap)
}

fn cached<K, V, F>(cache: &Mutex<HashMap<K, V>>, key: K, load: F) -> Result<V>
where
    K: Copy + Eq + Hash,
    V: Clone,
    F: FnOnce() -> Result<V>,
{
    let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(value) = cache.get(&key) {
        return Ok(value.clone());
    }
    let value = load()?;
    cache.insert(key, value.clone());
    Ok(value)
}

/// Reads assets from a directory on first use.
#[derive(Debug)]
pub struct DirectoryAssets {
    root: PathBuf,
    font_file: String,
    manifest: HashMap<u16, ManifestEntry>,
    sprites: Mutex<HashMap<u16, Arc<Sprite>>>,
    backgrounds: Mutex<HashMap<u16, Arc<Pixmap>>>,
    masks: Mutex<HashMap<u16, Option<Arc<Pixmap>>>>,
    font: Mutex<Option<FontArc>>,
}

impl DirectoryAssets {
    /// Opens an asset directory and reads its manifest, if it has one.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(Error::asset(format!("{} is not a directory", root.display())));
        }

        let manifest_path = root.join(MANIFEST_FILE);
        let manifest = if manifest_path.is_file() {
            parse_manifest(&std::fs::read(&manifest_path)?)?
        } else {
            HashMap::new()
        };
        debug!(
            "opened asset directory {} with {} manifest entries",
            root.display(),
            manifest.len()
        );

        Ok(Self {
            root,
            font_file: DEFAULT_FONT_FILE.to_string(),
            manifest,
            sprites: Mutex::default(),
            backgrounds: Mutex::default(),
            masks: Mutex::default(),
            font: Mutex::default(),
        })
    }

    /// Uses a different font file, relative to the asset directory.
    pub fn with_font_file(mut self, font_file: impl Into<String>) -> Self {
        self.font_file = font_file.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_entry(&self, type_id: u16) -> Option<&ManifestEntry> {
        self.manifest.get(&type_id)
    }
}

impl AssetProvider for DirectoryAssets {
    fn sprite(&self, type_id: u16) -> Result<Arc<Sprite>> {
        cached(&self.sprites, type_id, || {
            let entry = self.manifest_entry(type_id);
            let path = self.root.join(format!("{}.png", type_id));
            let image = load_pixmap(&path).map_err(|e| match entry {
                Some(entry) => Error::asset(format!("sprite {:?}: {}", entry.name, e)),
                None => e,
            })?;
            let scale = entry.map_or(DEFAULT_SPRITE_SCALE, |entry| entry.scale);
            Ok(Arc::new(Sprite { image, scale }))
        })
    }

    fn background(&self, id: u16) -> Result<Arc<Pixmap>> {
        cached(&self.backgrounds, id, || {
            let path = self.root.join(format!("x{}.png", u32::from(id) + 1));
            Ok(Arc::new(load_pixmap(&path)?))
        })
    }

    fn arc_mask(&self, type_id: u16) -> Result<Option<Arc<Pixmap>>> {
        cached(&self.masks, type_id, || match type_id {
            object_type::CIRCLE_AOE => {
                let path = self.root.join(CIRCLE_AOE_MASK_FILE);
                Ok(Some(Arc::new(load_pixmap(&path)?)))
            }
            object_type::FAN_AOE => {
                let path = self.root.join(format!("{}.png", type_id));
                if path.is_file() {
                    Ok(Some(Arc::new(load_pixmap(&path)?)))
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        })
    }

    fn font(&self) -> Result<FontArc> {
        let mut font = self.font.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(font) = font.as_ref() {
            return Ok(font.clone());
        }

        let path = self.root.join(&self.font_file);
        if !path.is_file() {
            return Err(Error::asset(format!("missing {}", path.display())));
        }
        let loaded = FontArc::try_from_vec(std::fs::read(&path)?)
            .map_err(|e| Error::asset(format!("{}: {}", path.display(), e)))?;
        debug!("loaded font {}", path.display());

        *font = Some(loaded.clone());
        Ok(loaded)
    }
}

/// Assets that have already been loaded by the caller.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    sprites: HashMap<u16, Arc<Sprite>>,
    backgrounds: HashMap<u16, Arc<Pixmap>>,
    masks: HashMap<u16, Arc<Pixmap>>,
    font: Option<FontArc>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sprite(mut self, type_id: u16, image: Pixmap, scale: f32) -> Self {
        self.sprites.insert(type_id, Arc::new(Sprite { image, scale }));
        self
    }

    pub fn with_background(mut self, id: u16, image: Pixmap) -> Self {
        self.backgrounds.insert(id, Arc::new(image));
        self
    }

    pub fn with_arc_mask(mut self, type_id: u16, image: Pixmap) -> Self {
        self.masks.insert(type_id, Arc::new(image));
        self
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }
}

impl AssetProvider for MemoryAssets {
    fn sprite(&self, type_id: u16) -> Result<Arc<Sprite>> {
        self.sprites
            .get(&type_id)
            .cloned()
            .ok_or_else(|| Error::asset(format!("no sprite for object type {}", type_id)))
    }

    fn background(&self, id: u16) -> Result<Arc<Pixmap>> {
        self.backgrounds
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::asset(format!("no background {}", id)))
    }

    fn arc_mask(&self, type_id: u16) -> Result<Option<Arc<Pixmap>>> {
        Ok(self.masks.get(&type_id).cloned())
    }

    fn font(&self) -> Result<FontArc> {
        self.font
            .clone()
            .ok_or_else(|| Error::asset("no label font"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use image::{Rgba, RgbaImage};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stratboard-{}-{}", std::process::id(), name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_image(dir: &Path, name: &str, size: u32, color: [u8; 4]) {
        RgbaImage::from_pixel(size, size, Rgba(color))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = parse_manifest(b"id,name,scale\n47, tank ,0.01\n48,healer,\n\n").unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest[&47],
            ManifestEntry {
                name: "tank".into(),
                scale: 0.01
            }
        );
        assert_eq!(manifest[&48].scale, DEFAULT_SPRITE_SCALE);
    }

    #[test]
    fn test_parse_manifest_rejects_bad_rows() {
        assert!(matches!(parse_manifest(b"id,name,scale\nx,tank,1\n"), Err(Error::Asset(_))));
        assert!(matches!(parse_manifest(b"id,name,scale\n1,tank,big\n"), Err(Error::Asset(_))));
    }

    #[test]
    fn test_load_pixmap_premultiplies() {
        let dir = scratch_dir("premultiply");
        write_image(&dir, "half.png", 2, [200, 100, 50, 128]);

        let pixmap = load_pixmap(&dir.join("half.png")).unwrap();
        let raw = pixmap.pixel(1, 1).unwrap();
        assert_eq!(raw.alpha(), 128);
        assert!(raw.red().abs_diff(100) <= 1);

        let color = raw.demultiply();
        assert!(color.red().abs_diff(200) <= 2);
        assert!(color.green().abs_diff(100) <= 2);
        assert!(color.blue().abs_diff(50) <= 2);
    }

    #[test]
    fn test_directory_assets() {
        let dir = scratch_dir("directory");
        fs::write(dir.join(MANIFEST_FILE), "id,name,scale\n47,tank,0.01\n").unwrap();
        write_image(&dir, "47.png", 8, [255, 0, 0, 255]);
        write_image(&dir, "49.png", 4, [0, 255, 0, 255]);
        write_image(&dir, "x2.png", 16, [0, 0, 255, 255]);
        write_image(&dir, CIRCLE_AOE_MASK_FILE, 4, [255, 255, 0, 255]);

        let assets = DirectoryAssets::open(&dir).unwrap();

        let tank = assets.sprite(47).unwrap();
        assert_eq!(tank.scale, 0.01);
        assert_eq!(tank.image.width(), 8);
        assert!(Arc::ptr_eq(&tank, &assets.sprite(47).unwrap()));

        assert_eq!(assets.sprite(49).unwrap().scale, DEFAULT_SPRITE_SCALE);
        assert!(matches!(assets.sprite(50), Err(Error::Asset(_))));

        assert_eq!(assets.background(1).unwrap().width(), 16);
        assert!(matches!(assets.background(0), Err(Error::Asset(_))));

        assert!(assets.arc_mask(object_type::CIRCLE_AOE).unwrap().is_some());
        assert!(assets.arc_mask(object_type::FAN_AOE).unwrap().is_none());
        assert!(assets.arc_mask(47).unwrap().is_none());

        assert!(matches!(assets.font(), Err(Error::Asset(_))));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_directory_font() {
        let dir = scratch_dir("font");
        fs::copy(
            concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/DejaVuSans.ttf"),
            dir.join("DejaVuSans.ttf"),
        )
        .unwrap();
        fs::write(dir.join("broken.ttf"), b"not a font").unwrap();

        let assets = DirectoryAssets::open(&dir).unwrap().with_font_file("DejaVuSans.ttf");
        assert!(assets.font().is_ok());

        let assets = DirectoryAssets::open(&dir).unwrap().with_font_file("broken.ttf");
        assert!(matches!(assets.font(), Err(Error::Asset(_))));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_open_rejects_missing_directory() {
        let dir = std::env::temp_dir().join("stratboard-does-not-exist");
        assert!(matches!(DirectoryAssets::open(dir), Err(Error::Asset(_))));
    }

    #[test]
    fn test_memory_assets() {
        let assets = MemoryAssets::new()
            .with_sprite(47, Pixmap::new(2, 2).unwrap(), 0.5)
            .with_arc_mask(object_type::FAN_AOE, Pixmap::new(2, 2).unwrap());

        assert_eq!(assets.sprite(47).unwrap().scale, 0.5);
        assert!(matches!(assets.sprite(48), Err(Error::Asset(_))));
        assert!(matches!(assets.background(0), Err(Error::Asset(_))));
        assert!(assets.arc_mask(object_type::FAN_AOE).unwrap().is_some());
        assert!(assets.arc_mask(object_type::CIRCLE_AOE).unwrap().is_none());
        assert!(matches!(assets.font(), Err(Error::Asset(_))));
    }
}

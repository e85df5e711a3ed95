use std::collections::HashMap;
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::graphics::Graphics;

use super::{Atlas, AtlasReader, Texture};

/// Resolved assets keyed by path.
///
/// Everything placed here is fully uploaded; drawing code only reads.
#[derive(Debug, Default)]
pub struct Assets {
    pub textures: HashMap<String, Texture>,
    pub atlases: HashMap<String, Atlas>,
    pub json: HashMap<String, serde_json::Value>,
}

fn key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self, key: &str) -> Option<&Texture> {
        self.textures.get(key)
    }

    pub fn atlas(&self, key: &str) -> Option<&Atlas> {
        self.atlases.get(key)
    }

    pub fn json(&self, key: &str) -> Option<&serde_json::Value> {
        self.json.get(key)
    }

    /// Decodes a PNG/JPEG file and uploads it. Cached by path.
    pub fn load_texture(&mut self, gfx: &mut Graphics, path: impl AsRef<Path>) -> Result<Texture> {
        let path = path.as_ref();
        let key = key(path);
        if let Some(tex) = self.textures.get(&key) {
            return Ok(*tex);
        }
        let bytes = std::fs::read(path)?;
        let tex = self.load_texture_bytes(gfx, &key, &bytes)?;
        log::debug!("loaded texture `{key}` ({}x{})", tex.image.width, tex.image.height);
        Ok(tex)
    }

    /// Decodes encoded image bytes and uploads them under `key`.
    pub fn load_texture_bytes(&mut self, gfx: &mut Graphics, key: &str, bytes: &[u8]) -> Result<Texture> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (w, h) = rgba.dimensions();
        let tex = gfx.create_texture(w, h, Some(rgba.as_raw()))?;
        self.textures.insert(key.to_owned(), tex);
        Ok(tex)
    }

    pub fn load_json(&mut self, path: impl AsRef<Path>) -> Result<&serde_json::Value> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        Ok(self.json.entry(key(path)).insert_entry(value).into_mut())
    }

    /// Loads the atlas image and parses `data_path` with `reader`. Keyed by `data_path`.
    pub fn load_atlas(
        &mut self,
        gfx: &mut Graphics,
        image_path: impl AsRef<Path>,
        data_path: impl AsRef<Path>,
        reader: AtlasReader,
    ) -> Result<&Atlas> {
        let texture = self.load_texture(gfx, image_path)?;
        let data_path = data_path.as_ref();
        let data = std::fs::read_to_string(data_path)?;
        let atlas = Atlas::from_data(texture, &data, reader)?;
        Ok(self.atlases.entry(key(data_path)).insert_entry(atlas).into_mut())
    }

    /// Looks up `name` in the atlas at `atlas_key`.
    pub fn subtexture(&self, atlas_key: &str, name: &str) -> Result<Texture> {
        self.atlas(atlas_key)
            .and_then(|a| a.get(name))
            .copied()
            .ok_or_else(|| EngineError::Atlas(format!("no subtexture `{name}` in `{atlas_key}`")))
    }
}

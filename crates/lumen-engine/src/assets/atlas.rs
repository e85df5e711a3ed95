use std::collections::HashMap;

use crate::error::Result;

use super::Texture;

/// Parses serialized sprite-sheet data into an atlas' sub-textures.
pub type AtlasReader = fn(&str, &mut Atlas) -> Result<()>;

/// Named animation range over the atlas' frame order (inclusive).
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTag {
    pub name: String,
    pub from: usize,
    pub to: usize,
}

/// One texture plus named regions of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Atlas {
    pub texture: Texture,
    pub subtextures: HashMap<String, Texture>,
    /// Frame names in file order.
    pub frames: Vec<String>,
    /// Frame durations in seconds, where the data carries them.
    pub durations: HashMap<String, f32>,
    pub tags: Vec<FrameTag>,
}

impl Atlas {
    pub fn new(texture: Texture) -> Self {
        Self {
            texture,
            subtextures: HashMap::new(),
            frames: Vec::new(),
            durations: HashMap::new(),
            tags: Vec::new(),
        }
    }

    /// Builds an atlas over `texture` from `data` using `reader`.
    pub fn from_data(texture: Texture, data: &str, reader: AtlasReader) -> Result<Self> {
        let mut atlas = Self::new(texture);
        reader(data, &mut atlas)?;
        log::debug!("atlas loaded with {} subtextures", atlas.subtextures.len());
        Ok(atlas)
    }

    pub fn get(&self, name: &str) -> Option<&Texture> {
        self.subtextures.get(name)
    }

    /// Registers `texture` under `name`, keeping file order.
    pub fn insert(&mut self, name: impl Into<String>, texture: Texture) {
        let name = name.into();
        if self.subtextures.insert(name.clone(), texture).is_none() {
            self.frames.push(name);
        }
    }

    /// Frames of tag `name`, in order.
    pub fn tag_frames(&self, name: &str) -> Option<Vec<&Texture>> {
        let tag = self.tags.iter().find(|t| t.name == name)?;
        self.frames
            .get(tag.from..=tag.to)?
            .iter()
            .map(|f| self.subtextures.get(f))
            .collect()
    }
}

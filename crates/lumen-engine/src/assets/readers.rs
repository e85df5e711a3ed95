//! Built-in atlas readers.

use serde::Deserialize;

use crate::coords::Rect;
use crate::error::{EngineError, Result};

use super::{Atlas, FrameTag, Texture};

#[derive(Debug, Deserialize)]
struct Sheet {
    frames: Frames,
    #[serde(default)]
    meta: Meta,
}

/// Aseprite exports frames either keyed by name or as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Frames {
    Array(Vec<NamedFrame>),
    /// Needs serde_json's `preserve_order`: tag indices follow export order.
    Hash(serde_json::Map<String, serde_json::Value>),
}

#[derive(Debug, Deserialize)]
struct NamedFrame {
    filename: String,
    #[serde(flatten)]
    frame: Frame,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Frame {
    frame: JsonRect,
    #[serde(default)]
    trimmed: bool,
    sprite_source_size: Option<JsonRect>,
    source_size: Option<JsonSize>,
    /// Milliseconds.
    duration: Option<f32>,
}

#[derive(Debug, Copy, Clone, Deserialize)]
struct JsonRect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

#[derive(Debug, Copy, Clone, Deserialize)]
struct JsonSize {
    w: f32,
    h: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    #[serde(default)]
    frame_tags: Vec<JsonTag>,
}

#[derive(Debug, Deserialize)]
struct JsonTag {
    name: String,
    from: usize,
    to: usize,
}

fn add_frame(atlas: &mut Atlas, name: String, f: &Frame) {
    let bounds = Rect::new(
        atlas.texture.bounds.x + f.frame.x,
        atlas.texture.bounds.y + f.frame.y,
        f.frame.w,
        f.frame.h,
    );
    let frame = match (f.trimmed, f.sprite_source_size, f.source_size) {
        (true, Some(src), Some(size)) => Rect::new(-src.x, -src.y, size.w, size.h),
        _ => Rect::new(0.0, 0.0, f.frame.w, f.frame.h),
    };
    if let Some(ms) = f.duration {
        atlas.durations.insert(name.clone(), ms / 1000.0);
    }
    atlas.insert(name, Texture::new(atlas.texture.image, bounds, frame));
}

/// Reads Aseprite/TexturePacker JSON in either the hash or the array layout.
///
/// Trimmed frames get a frame rectangle whose x/y are the negated trim offset
/// and whose size is the untrimmed source size. Frame tags become [`FrameTag`]s.
pub fn aseprite_json(data: &str, atlas: &mut Atlas) -> Result<()> {
    let sheet: Sheet = serde_json::from_str(data)?;
    match sheet.frames {
        Frames::Array(frames) => {
            for NamedFrame { filename, frame } in frames {
                add_frame(atlas, filename, &frame);
            }
        }
        Frames::Hash(frames) => {
            for (name, value) in frames {
                let frame = Frame::deserialize(value)?;
                add_frame(atlas, name, &frame);
            }
        }
    }

    for tag in sheet.meta.frame_tags {
        if tag.from > tag.to || tag.to >= atlas.frames.len() {
            return Err(EngineError::Atlas(format!(
                "tag `{}` spans {}..={} but the sheet has {} frames",
                tag.name,
                tag.from,
                tag.to,
                atlas.frames.len()
            )));
        }
        atlas.tags.push(FrameTag { name: tag.name, from: tag.from, to: tag.to });
    }
    Ok(())
}

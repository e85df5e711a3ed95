use std::collections::HashMap;

use crate::assets::{Atlas, Texture};
use crate::graphics::DrawParams;
use crate::render::DrawCtx;
use crate::scene::{Component, ComponentState, UpdateCtx};

/// Frame sequence with per-frame durations in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub frames: Vec<Texture>,
    pub durations: Vec<f32>,
    pub looping: bool,
}

impl Animation {
    /// Every frame shown for `1 / fps` seconds.
    pub fn new(frames: Vec<Texture>, fps: f32, looping: bool) -> Self {
        let duration = if fps > 0.0 { 1.0 / fps } else { f32::INFINITY };
        let durations = vec![duration; frames.len()];
        Self { frames, durations, looping }
    }

    pub fn with_durations(frames: Vec<Texture>, durations: Vec<f32>, looping: bool) -> Self {
        debug_assert_eq!(frames.len(), durations.len());
        Self { frames, durations, looping }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn duration(&self, frame: usize) -> f32 {
        self.durations.get(frame).copied().unwrap_or(f32::INFINITY)
    }
}

/// Plays named animation tracks.
///
/// Asking for a track that does not exist logs a warning and leaves the
/// current track, frame and timer untouched.
#[derive(Debug, Clone)]
pub struct Sprite {
    animations: HashMap<String, Animation>,
    current: Option<String>,
    frame: usize,
    timer: f32,
    playing: bool,
    /// Playback speed multiplier.
    pub rate: f32,
    pub params: DrawParams,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            animations: HashMap::new(),
            current: None,
            frame: 0,
            timer: 0.0,
            playing: false,
            rate: 1.0,
            params: DrawParams::default(),
        }
    }
}

impl Sprite {
    pub fn new() -> Self {
        Self::default()
    }

    /// One looping track per frame tag, using the atlas' frame durations
    /// (`default_duration` where a frame has none).
    pub fn from_atlas(atlas: &Atlas, default_duration: f32) -> Self {
        let mut sprite = Self::new();
        for tag in &atlas.tags {
            let Some(names) = atlas.frames.get(tag.from..=tag.to) else {
                log::warn!("frame tag `{}` is out of range", tag.name);
                continue;
            };
            let mut frames = Vec::with_capacity(names.len());
            let mut durations = Vec::with_capacity(names.len());
            for name in names {
                let Some(texture) = atlas.get(name) else { continue };
                frames.push(*texture);
                durations.push(atlas.durations.get(name).copied().unwrap_or(default_duration));
            }
            sprite.add(tag.name.clone(), Animation::with_durations(frames, durations, true));
        }
        sprite
    }

    pub fn add(&mut self, name: impl Into<String>, animation: Animation) {
        self.animations.insert(name.into(), animation);
    }

    pub fn with(mut self, name: impl Into<String>, animation: Animation) -> Self {
        self.add(name, animation);
        self
    }

    pub fn has(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    /// Starts `name` from its first frame unless it is already the current
    /// track and `restart` is `false`. Returns `false` for an unknown track.
    pub fn play(&mut self, name: &str, restart: bool) -> bool {
        if !self.animations.contains_key(name) {
            log::warn!("sprite has no animation `{name}`");
            return false;
        }
        if self.current.as_deref() == Some(name) && !restart {
            self.playing = true;
            return true;
        }
        self.current = Some(name.to_owned());
        self.frame = 0;
        self.timer = 0.0;
        self.playing = true;
        true
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    #[inline]
    pub fn frame(&self) -> usize {
        self.frame
    }

    fn animation(&self) -> Option<&Animation> {
        self.animations.get(self.current.as_deref()?)
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.animation()?.frames.get(self.frame)
    }

    /// Advances the current track by `delta` seconds.
    pub fn advance(&mut self, delta: f32) {
        if !self.playing {
            return;
        }
        let Some(animation) = self.current.as_deref().and_then(|n| self.animations.get(n)) else {
            return;
        };
        if animation.is_empty() {
            return;
        }

        self.timer += delta * self.rate;
        while self.timer >= animation.duration(self.frame) {
            self.timer -= animation.duration(self.frame);
            if self.frame + 1 < animation.len() {
                self.frame += 1;
            } else if animation.looping {
                self.frame = 0;
            } else {
                self.timer = 0.0;
                self.playing = false;
                break;
            }
        }
    }
}

impl Component for Sprite {
    fn update(&mut self, _state: &mut ComponentState, ctx: &mut UpdateCtx<'_>) {
        self.advance(ctx.delta());
    }

    fn render(&mut self, _state: &ComponentState, ctx: &mut DrawCtx<'_>) {
        if let Some(texture) = self.texture() {
            ctx.gfx.texture(texture, ctx.position, self.params);
        }
    }
}

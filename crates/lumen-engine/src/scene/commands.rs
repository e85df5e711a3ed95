use std::fmt;

use crate::coords::Vec2;
use crate::error::{EngineError, Result};

use super::{Entity, EntityId, Scene};

type Deferred = Box<dyn FnOnce(&mut Scene) -> Result<()>>;

/// Scene edits queued from inside update hooks.
///
/// The scene applies the queue in order right after the hook that filled it
/// returns. A failing command is logged and does not stop the rest.
///
/// [`Commands::fail`] reports an error that is not a scene edit. The scene
/// finishes the frame, then returns the first reported error from
/// [`Scene::update`].
#[derive(Default)]
pub struct Commands {
    queue: Vec<Deferred>,
    fault: Option<EngineError>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an arbitrary scene edit.
    pub fn push(&mut self, edit: impl FnOnce(&mut Scene) -> Result<()> + 'static) {
        self.queue.push(Box::new(edit));
    }

    pub fn add(&mut self, entity: Entity, position: Option<Vec2>) {
        self.push(move |scene| scene.add(entity, position).map(drop));
    }

    pub fn remove(&mut self, id: EntityId) {
        self.push(move |scene| scene.remove(id));
    }

    pub fn destroy(&mut self, id: EntityId) {
        self.push(move |scene| scene.destroy(id).map(drop));
    }

    pub fn recycle(&mut self, bucket: impl Into<String>, id: EntityId) {
        let bucket = bucket.into();
        self.push(move |scene| scene.recycle(&bucket, id));
    }

    pub fn recreate(&mut self, bucket: impl Into<String>, position: Option<Vec2>) {
        let bucket = bucket.into();
        self.push(move |scene| {
            let Some(id) = scene.recreate(&bucket)? else {
                return Ok(());
            };
            if let Some(p) = position {
                scene.entity_mut(id).ok_or(EngineError::UnknownEntity)?.set_position(p);
            }
            Ok(())
        });
    }

    pub fn set_depth(&mut self, id: EntityId, depth: i32) {
        self.push(move |scene| {
            scene.entity_mut(id).ok_or(EngineError::UnknownEntity)?.set_depth(depth);
            Ok(())
        });
    }

    /// Reports a hook failure. Only the first one per hook is kept.
    pub fn fail(&mut self, err: EngineError) {
        if self.fault.is_none() {
            self.fault = Some(err);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Applies the queue and hands back the reported failure, if any.
    pub(crate) fn apply(self, scene: &mut Scene) -> Option<EngineError> {
        for edit in self.queue {
            if let Err(err) = edit(scene) {
                log::warn!("deferred scene command failed: {err}");
            }
        }
        self.fault
    }
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands")
            .field("queued", &self.queue.len())
            .field("fault", &self.fault)
            .finish()
    }
}

use std::fmt;
use std::marker::PhantomData;

use crate::any::AsAny;
use crate::collision::Collider;
use crate::coords::Vec2;
use crate::error::{EngineError, Result};
use crate::input::Input;
use crate::render::DrawCtx;
use crate::time::GameTime;

use super::{Commands, EntityId, Scene};

/// Index of a component slot within its entity. Stable until the component is removed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ComponentKey(pub(crate) usize);

impl ComponentKey {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Typed key returned when a component is added; resolves back to `&C`.
pub struct ComponentHandle<C> {
    key: ComponentKey,
    _marker: PhantomData<fn() -> C>,
}

impl<C> ComponentHandle<C> {
    pub(crate) fn new(key: ComponentKey) -> Self {
        Self { key, _marker: PhantomData }
    }

    #[inline]
    pub fn key(self) -> ComponentKey {
        self.key
    }
}

impl<C> Clone for ComponentHandle<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ComponentHandle<C> {}

impl<C> PartialEq for ComponentHandle<C> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<C> Eq for ComponentHandle<C> {}

impl<C> fmt::Debug for ComponentHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentHandle<{}>({})", std::any::type_name::<C>(), self.key.0)
    }
}

/// Per-slot data the entity keeps for each component.
///
/// `position` is local to the entity; the component's scene position is
/// `entity.position + position`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ComponentState {
    pub position: Vec2,
    pub active: bool,
    pub visible: bool,
    on_entity: bool,
    in_scene: bool,
}

impl Default for ComponentState {
    fn default() -> Self {
        Self { position: Vec2::zero(), active: true, visible: true, on_entity: false, in_scene: false }
    }
}

impl ComponentState {
    pub fn at(position: Vec2) -> Self {
        Self { position, ..Self::default() }
    }

    #[inline]
    pub fn is_on_entity(&self) -> bool {
        self.on_entity
    }

    #[inline]
    pub fn is_in_scene(&self) -> bool {
        self.in_scene
    }

    pub(crate) fn attach_entity(&mut self) -> Result<()> {
        if self.on_entity {
            return Err(EngineError::AlreadyAttached { what: "an entity" });
        }
        self.on_entity = true;
        Ok(())
    }

    pub(crate) fn attach_scene(&mut self) -> Result<()> {
        if self.in_scene {
            return Err(EngineError::AlreadyAttached { what: "a scene" });
        }
        self.in_scene = true;
        Ok(())
    }

    pub(crate) fn detach_scene(&mut self) {
        self.in_scene = false;
    }

    pub(crate) fn detach_entity(&mut self) {
        self.on_entity = false;
    }
}

/// Per-frame input passed to [`Scene::update`].
#[derive(Debug, Copy, Clone)]
pub struct Tick<'a> {
    pub time: GameTime,
    pub input: &'a Input,
}

/// Context handed to update hooks.
///
/// The scene is read-only here. Structural changes (adding, removing or
/// destroying entities, depth changes) are queued on `commands` and applied
/// as soon as the hook returns.
pub struct UpdateCtx<'a> {
    pub scene: &'a Scene,
    pub entity: EntityId,
    /// Position of the entity being updated. Written back after the hook.
    pub position: &'a mut Vec2,
    pub time: GameTime,
    pub input: &'a Input,
    pub commands: &'a mut Commands,
}

impl UpdateCtx<'_> {
    #[inline]
    pub fn delta(&self) -> f32 {
        self.time.delta
    }
}

/// Behavior attached to an entity.
///
/// Every hook has an empty default. The entity owns the component's
/// [`ComponentState`] and passes it in; a component never holds references to
/// its entity or scene.
pub trait Component: AsAny {
    fn added_to_entity(&mut self) {}

    fn added_to_scene(&mut self, _entity: EntityId) {}

    fn removed_from_scene(&mut self, _entity: EntityId) {}

    fn removed_from_entity(&mut self) {}

    fn update(&mut self, _state: &mut ComponentState, _ctx: &mut UpdateCtx<'_>) {}

    fn late_update(&mut self, _state: &mut ComponentState, _ctx: &mut UpdateCtx<'_>) {}

    fn render(&mut self, _state: &ComponentState, _ctx: &mut DrawCtx<'_>) {}

    /// Colliders returned here are indexed by tag while the entity is in a scene.
    fn collider(&self) -> Option<&Collider> {
        None
    }

    fn collider_mut(&mut self) -> Option<&mut Collider> {
        None
    }
}

/// Component that is nothing but a collider.
impl Component for Collider {
    fn collider(&self) -> Option<&Collider> {
        Some(self)
    }

    fn collider_mut(&mut self) -> Option<&mut Collider> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_rejects_double_entity_attach() {
        let mut state = ComponentState::default();
        state.attach_entity().unwrap();
        assert!(matches!(state.attach_entity(), Err(EngineError::AlreadyAttached { .. })));
        state.detach_entity();
        assert!(state.attach_entity().is_ok());
    }

    #[test]
    fn state_rejects_double_scene_attach() {
        let mut state = ComponentState::default();
        state.attach_scene().unwrap();
        assert!(matches!(state.attach_scene(), Err(EngineError::AlreadyAttached { what: "a scene" })));
        state.detach_scene();
        assert!(!state.is_in_scene());
    }

    #[test]
    fn handles_compare_by_key() {
        let a: ComponentHandle<Collider> = ComponentHandle::new(ComponentKey(2));
        let b = a;
        assert_eq!(a, b);
        assert_eq!(b.key().index(), 2);
    }
}

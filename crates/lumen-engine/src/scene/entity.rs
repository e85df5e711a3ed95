use std::fmt;

use slotmap::new_key_type;

use crate::any::AsAny;
use crate::coords::Vec2;
use crate::error::Result;
use crate::render::DrawCtx;

use super::{Component, ComponentHandle, ComponentKey, ComponentState, UpdateCtx};

new_key_type! {
    /// Generation-stamped handle to an entity owned by a [`Scene`](super::Scene).
    pub struct EntityId;
}

/// Optional entity-level callbacks.
pub trait EntityHooks: AsAny {
    /// First time the entity enters a scene, or the first time after being destroyed.
    fn created(&mut self, _id: EntityId) {}

    fn added(&mut self, _id: EntityId) {}

    fn removed(&mut self, _id: EntityId) {}

    fn destroyed(&mut self, _id: EntityId) {}

    /// Runs before the entity's components update.
    fn update(&mut self, _ctx: &mut UpdateCtx<'_>) {}

    /// Runs before the entity's components render.
    fn render(&mut self, _ctx: &mut DrawCtx<'_>) {}
}

pub(crate) struct Slot {
    pub(crate) state: ComponentState,
    /// `None` only while the component is borrowed out for an update hook.
    pub(crate) component: Option<Box<dyn Component>>,
}

/// A positioned bag of components.
///
/// Entities are built standalone and handed to [`Scene::add`](super::Scene::add).
/// Once in a scene they are reached through `Scene::get` / `Scene::entity_mut`
/// so that group, depth and collider indices stay consistent.
pub struct Entity {
    pub position: Vec2,
    pub active: bool,
    pub visible: bool,
    pub(crate) depth: i32,
    pub(crate) groups: Vec<String>,
    pub(crate) slots: Vec<Option<Slot>>,
    pub(crate) created: bool,
    pub(crate) attached: bool,
    pub(crate) hooks: Option<Box<dyn EntityHooks>>,
}

impl Default for Entity {
    fn default() -> Self {
        Self {
            position: Vec2::zero(),
            active: true,
            visible: true,
            depth: 0,
            groups: Vec::new(),
            slots: Vec::new(),
            created: false,
            attached: false,
            hooks: None,
        }
    }
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(position: Vec2) -> Self {
        Self { position, ..Self::default() }
    }

    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_hooks(mut self, hooks: impl EntityHooks) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    /// Claims membership in `group`; the scene registers it on add.
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        let group = group.into();
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
        self
    }

    /// Builder form of [`Entity::add`] for setup code that does not need the handle.
    pub fn with<C: Component>(mut self, component: C) -> Result<Self> {
        self.add(component)?;
        Ok(self)
    }

    #[inline]
    pub fn depth(&self) -> i32 {
        self.depth
    }

    #[inline]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    #[inline]
    pub fn is_in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// `true` from the first scene add until the entity is destroyed.
    #[inline]
    pub fn is_created(&self) -> bool {
        self.created
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn hooks<H: EntityHooks>(&self) -> Option<&H> {
        self.hooks.as_deref()?.as_any().downcast_ref::<H>()
    }

    /// Adds a component to a standalone entity.
    pub fn add<C: Component>(&mut self, component: C) -> Result<ComponentHandle<C>> {
        self.add_at(component, Vec2::zero())
    }

    /// Adds a component offset by `local` from the entity's position.
    pub fn add_at<C: Component>(&mut self, component: C, local: Vec2) -> Result<ComponentHandle<C>> {
        let key = self.push_slot(Box::new(component), ComponentState::at(local))?;
        Ok(ComponentHandle::new(key))
    }

    pub(crate) fn push_slot(&mut self, mut component: Box<dyn Component>, mut state: ComponentState) -> Result<ComponentKey> {
        state.attach_entity()?;
        component.added_to_entity();
        self.slots.push(Some(Slot { state, component: Some(component) }));
        Ok(ComponentKey(self.slots.len() - 1))
    }

    /// Removes a component from a standalone entity.
    pub fn remove(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        self.take_slot(key)
    }

    pub(crate) fn take_slot(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        let mut slot = self.slots.get_mut(key.0)?.take()?;
        slot.state.detach_entity();
        let mut component = slot.component?;
        component.removed_from_entity();
        Some(component)
    }

    pub fn get<C: Component>(&self, handle: ComponentHandle<C>) -> Option<&C> {
        self.component(handle.key())?.as_any().downcast_ref::<C>()
    }

    pub fn get_mut<C: Component>(&mut self, handle: ComponentHandle<C>) -> Option<&mut C> {
        self.component_mut(handle.key())?.as_any_mut().downcast_mut::<C>()
    }

    /// First component of type `C`.
    pub fn find<C: Component>(&self) -> Option<ComponentHandle<C>> {
        self.components()
            .find(|(_, _, c)| (**c).as_any().is::<C>())
            .map(|(key, _, _)| ComponentHandle::new(key))
    }

    pub fn component(&self, key: ComponentKey) -> Option<&dyn Component> {
        self.slots.get(key.0)?.as_ref()?.component.as_deref()
    }

    pub(crate) fn component_mut(&mut self, key: ComponentKey) -> Option<&mut (dyn Component + 'static)> {
        self.slots.get_mut(key.0)?.as_mut()?.component.as_deref_mut()
    }

    pub fn state(&self, key: ComponentKey) -> Option<&ComponentState> {
        Some(&self.slots.get(key.0)?.as_ref()?.state)
    }

    /// Position, active and visible flags of a component.
    pub fn state_mut(&mut self, key: ComponentKey) -> Option<&mut ComponentState> {
        Some(&mut self.slots.get_mut(key.0)?.as_mut()?.state)
    }

    /// Live components in insertion order.
    pub fn components(&self) -> impl Iterator<Item = (ComponentKey, &ComponentState, &dyn Component)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let slot = slot.as_ref()?;
            Some((ComponentKey(i), &slot.state, slot.component.as_deref()?))
        })
    }

    /// Number of live components.
    pub fn component_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("position", &self.position)
            .field("depth", &self.depth)
            .field("active", &self.active)
            .field("visible", &self.visible)
            .field("groups", &self.groups)
            .field("components", &self.component_count())
            .field("created", &self.created)
            .field("attached", &self.attached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::Collider;

    #[derive(Default)]
    struct Marker(u32);

    impl Component for Marker {}

    #[test]
    fn add_and_resolve_typed_handle() {
        let mut e = Entity::new();
        let h = e.add(Marker(7)).unwrap();
        assert_eq!(e.get(h).map(|m| m.0), Some(7));
        e.get_mut(h).unwrap().0 = 9;
        assert_eq!(e.get(h).map(|m| m.0), Some(9));
        assert!(e.state(h.key()).unwrap().is_on_entity());
    }

    #[test]
    fn handle_of_wrong_type_resolves_to_none() {
        let mut e = Entity::new();
        let h = e.add(Marker(1)).unwrap();
        let wrong: ComponentHandle<Collider> = ComponentHandle::new(h.key());
        assert!(e.get(wrong).is_none());
    }

    #[test]
    fn find_returns_first_of_type() {
        let mut e = Entity::new();
        e.add(Collider::hitbox(0.0, 0.0, 1.0, 1.0)).unwrap();
        let first = e.add(Marker(1)).unwrap();
        e.add(Marker(2)).unwrap();
        assert_eq!(e.find::<Marker>(), Some(first));
        assert!(Entity::new().find::<Marker>().is_none());
    }

    #[test]
    fn removal_keeps_other_keys() {
        let mut e = Entity::new();
        let a = e.add(Marker(1)).unwrap();
        let b = e.add(Marker(2)).unwrap();
        assert!(e.remove(a.key()).is_some());
        assert!(e.remove(a.key()).is_none());
        assert_eq!(e.get(b).map(|m| m.0), Some(2));
        assert_eq!(e.component_count(), 1);
    }

    #[test]
    fn groups_are_deduplicated() {
        let e = Entity::new().in_group("enemies").in_group("enemies").in_group("solid");
        assert_eq!(e.groups(), ["enemies".to_string(), "solid".to_string()]);
        assert!(e.is_in_group("solid"));
    }

    #[test]
    fn add_at_offsets_local_position() {
        let mut e = Entity::at(Vec2::new(5.0, 5.0));
        let h = e.add_at(Marker(0), Vec2::new(2.0, -1.0)).unwrap();
        assert_eq!(e.state(h.key()).unwrap().position, Vec2::new(2.0, -1.0));
    }
}

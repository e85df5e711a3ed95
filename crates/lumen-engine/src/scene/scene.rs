use std::collections::{HashMap, VecDeque};

use slotmap::SlotMap;

use crate::collision::{Collider, OverlapRegistry};
use crate::coords::Vec2;
use crate::error::{EngineError, Result};
use crate::graphics::Graphics;
use crate::paint::Color;
use crate::render::{Camera, DrawCtx, Renderer};

use super::{
    Commands, Component, ComponentHandle, ComponentKey, ComponentState, Entity, EntityId, ObjectList, Tick,
    UpdateCtx,
};

/// A collider tracked by the scene: the owning entity plus the component slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ColliderRef {
    pub entity: EntityId,
    pub component: ComponentKey,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Pass {
    Update,
    LateUpdate,
}

/// Owner of entities, renderers and the indices over them.
///
/// Entities are kept in depth order (descending: higher depth renders first).
/// Depth changes only flag the order as stale; the sort happens at the start
/// of the next [`Scene::render`].
pub struct Scene {
    entities: SlotMap<EntityId, Entity>,
    order: ObjectList<EntityId>,
    groups: HashMap<String, ObjectList<EntityId>>,
    colliders: HashMap<String, Vec<ColliderRef>>,
    cache: HashMap<String, VecDeque<EntityId>>,
    renderers: Vec<Box<dyn Renderer>>,
    overlaps: OverlapRegistry,
    started: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene with the built-in overlap tests registered.
    pub fn new() -> Self {
        Self::with_overlaps(OverlapRegistry::with_builtins())
    }

    pub fn with_overlaps(overlaps: OverlapRegistry) -> Self {
        Self {
            entities: SlotMap::with_key(),
            order: ObjectList::new(),
            groups: HashMap::new(),
            colliders: HashMap::new(),
            cache: HashMap::new(),
            renderers: Vec::new(),
            overlaps,
            started: false,
        }
    }

    pub fn overlaps(&self) -> &OverlapRegistry {
        &self.overlaps
    }

    /// Register custom shape pairs here before colliders of those shapes meet.
    pub fn overlaps_mut(&mut self) -> &mut OverlapRegistry {
        &mut self.overlaps
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    pub fn begin(&mut self) {
        self.started = true;
        log::debug!("scene begin: {} entities", self.order.live_len());
    }

    pub fn ended(&mut self) {
        self.started = false;
        log::debug!("scene ended");
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Destroys every entity, attached or not, and empties the recycle cache.
    pub fn dispose(&mut self) {
        let ids: Vec<EntityId> = self.entities.keys().collect();
        for id in ids {
            if let Err(err) = self.destroy(id) {
                log::warn!("dispose: {err}");
            }
        }
        self.cache.clear();
        self.order.clear();
        self.groups.clear();
        self.colliders.clear();
        log::debug!("scene disposed");
    }

    // ── entities ──────────────────────────────────────────────────────────

    /// Takes ownership of `entity` and attaches it, optionally moving it to `position`.
    pub fn add(&mut self, entity: Entity, position: Option<Vec2>) -> Result<EntityId> {
        if entity.attached {
            return Err(EngineError::EntityAttached);
        }
        let id = self.entities.insert(entity);
        self.attach(id, position)?;
        Ok(id)
    }

    /// Re-attaches a removed entity. `created` does not fire again.
    ///
    /// An entity parked in a recycle bucket leaves the bucket.
    pub fn attach(&mut self, id: EntityId, position: Option<Vec2>) -> Result<()> {
        let entity = self.entities.get(id).ok_or(EngineError::UnknownEntity)?;
        if entity.attached {
            return Err(EngineError::EntityAttached);
        }
        if entity.slots.iter().flatten().any(|slot| slot.state.is_in_scene()) {
            return Err(EngineError::AlreadyAttached { what: "a scene" });
        }
        self.forget_cached(id);

        let entity = self.entities.get_mut(id).ok_or(EngineError::UnknownEntity)?;
        entity.attached = true;
        if let Some(p) = position {
            entity.position = p;
        }
        self.order.push(id);

        if !entity.created {
            entity.created = true;
            if let Some(hooks) = entity.hooks.as_mut() {
                hooks.created(id);
            }
        }

        for group in &entity.groups {
            self.groups.entry(group.clone()).or_default().push(id);
        }

        for (i, slot) in entity.slots.iter_mut().enumerate() {
            let Some(slot) = slot else { continue };
            track(&mut self.colliders, id, ComponentKey(i), slot)?;
        }

        if let Some(hooks) = entity.hooks.as_mut() {
            hooks.added(id);
        }
        log::debug!("entity {id:?} added");
        Ok(())
    }

    /// Detaches an entity without destroying it. It stays owned by the scene.
    pub fn remove(&mut self, id: EntityId) -> Result<()> {
        let entity = self.entities.get_mut(id).ok_or(EngineError::UnknownEntity)?;
        if !entity.attached {
            return Err(EngineError::EntityDetached);
        }

        if let Some(hooks) = entity.hooks.as_mut() {
            hooks.removed(id);
        }

        for (i, slot) in entity.slots.iter_mut().enumerate() {
            let Some(slot) = slot else { continue };
            untrack(&mut self.colliders, id, ComponentKey(i), slot);
        }

        for group in &entity.groups {
            if let Some(list) = self.groups.get_mut(group) {
                list.remove(&id);
            }
        }

        self.order.remove(&id);
        entity.attached = false;
        log::debug!("entity {id:?} removed");
        Ok(())
    }

    /// Removes (if attached), fires `destroyed` and hands the entity back with
    /// its `created` flag cleared. Adding it again runs `created` anew.
    pub fn destroy(&mut self, id: EntityId) -> Result<Entity> {
        let attached = self.entities.get(id).ok_or(EngineError::UnknownEntity)?.attached;
        if attached {
            self.remove(id)?;
        }
        self.forget_cached(id);

        let mut entity = self.entities.remove(id).ok_or(EngineError::UnknownEntity)?;
        if let Some(hooks) = entity.hooks.as_mut() {
            hooks.destroyed(id);
        }
        entity.created = false;
        log::debug!("entity {id:?} destroyed");
        Ok(entity)
    }

    /// Moves a detached entity out of the scene without firing `destroyed`.
    pub fn take(&mut self, id: EntityId) -> Result<Entity> {
        if self.entities.get(id).ok_or(EngineError::UnknownEntity)?.attached {
            return Err(EngineError::EntityAttached);
        }
        self.forget_cached(id);
        self.entities.remove(id).ok_or(EngineError::UnknownEntity)
    }

    /// Removes `id` (if attached) and parks it at the back of `bucket`.
    pub fn recycle(&mut self, bucket: &str, id: EntityId) -> Result<()> {
        if self.entities.get(id).ok_or(EngineError::UnknownEntity)?.attached {
            self.remove(id)?;
        }
        let queue = self.cache.entry(bucket.to_owned()).or_default();
        if !queue.contains(&id) {
            queue.push_back(id);
        }
        Ok(())
    }

    /// Re-attaches the oldest entity parked in `bucket`, if any.
    ///
    /// Entries that are gone or already attached are dropped from the bucket.
    pub fn recreate(&mut self, bucket: &str) -> Result<Option<EntityId>> {
        loop {
            let Some(id) = self.cache.get_mut(bucket).and_then(VecDeque::pop_front) else {
                return Ok(None);
            };
            if self.entities.get(id).is_some_and(|e| !e.attached) {
                self.attach(id, None)?;
                return Ok(Some(id));
            }
            log::debug!("dropping stale entry {id:?} from bucket `{bucket}`");
        }
    }

    /// Number of entities parked in `bucket`.
    pub fn cached(&self, bucket: &str) -> usize {
        self.cache.get(bucket).map_or(0, VecDeque::len)
    }

    fn forget_cached(&mut self, id: EntityId) {
        for queue in self.cache.values_mut() {
            queue.retain(|&cached| cached != id);
        }
    }

    #[inline]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        self.entities.contains_key(id).then_some(EntityMut { scene: self, id })
    }

    pub fn component<C: Component>(&self, id: EntityId, handle: ComponentHandle<C>) -> Option<&C> {
        self.entities.get(id)?.get(handle)
    }

    /// Attached entities in the current list order. Holes are skipped.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.order.iter().copied()
    }

    /// Attached entities in `group`, in depth order as of the last render.
    pub fn group(&self, name: &str) -> impl Iterator<Item = EntityId> + '_ {
        self.groups.get(name).into_iter().flat_map(|list| list.iter().copied())
    }

    /// Number of attached entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.live_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether the entity list will be re-sorted on the next render.
    #[inline]
    pub fn is_unsorted(&self) -> bool {
        self.order.is_unsorted()
    }

    // ── collision ─────────────────────────────────────────────────────────

    /// Colliders currently indexed under `tag`.
    pub fn colliders(&self, tag: &str) -> &[ColliderRef] {
        self.colliders.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// Collider and its scene position, if its entity and component are active.
    pub fn collider(&self, at: ColliderRef) -> Option<(&Collider, Vec2)> {
        let entity = self.entities.get(at.entity)?;
        if !entity.attached || !entity.active {
            return None;
        }
        let slot = entity.slots.get(at.component.0)?.as_ref()?;
        if !slot.state.active {
            return None;
        }
        let collider = slot.component.as_deref()?.collider()?;
        Some((collider, entity.position + slot.state.position))
    }

    /// First collider under `tag` that overlaps `probe` placed at `at`.
    ///
    /// `probe` itself is skipped if it is one of the tracked colliders.
    pub fn collide(&self, probe: &Collider, at: Vec2, tag: &str) -> Result<Option<ColliderRef>> {
        for &other in self.colliders(tag) {
            let Some((collider, position)) = self.collider(other) else { continue };
            if std::ptr::eq(collider, probe) {
                continue;
            }
            if self.overlaps.overlap_colliders(probe, at, collider, position)? {
                return Ok(Some(other));
            }
        }
        Ok(None)
    }

    /// Every collider under `tag` that overlaps `probe` placed at `at`.
    pub fn collide_all(&self, probe: &Collider, at: Vec2, tag: &str) -> Result<Vec<ColliderRef>> {
        let mut hits = Vec::new();
        for &other in self.colliders(tag) {
            let Some((collider, position)) = self.collider(other) else { continue };
            if std::ptr::eq(collider, probe) {
                continue;
            }
            if self.overlaps.overlap_colliders(probe, at, collider, position)? {
                hits.push(other);
            }
        }
        Ok(hits)
    }

    /// Tests a tracked collider as if it were moved by `offset`. Nothing is mutated.
    pub fn probe(&self, collider: ColliderRef, offset: Vec2, tag: &str) -> Result<Option<ColliderRef>> {
        let Some((shape, position)) = self.collider(collider) else {
            return Ok(None);
        };
        self.collide(shape, position + offset, tag)
    }

    /// Outlines every tracked collider.
    pub fn debug_draw_colliders(&self, gfx: &mut Graphics, color: Color) {
        let mut seen: Vec<ColliderRef> = Vec::new();
        for refs in self.colliders.values() {
            for &r in refs {
                if seen.contains(&r) {
                    continue;
                }
                seen.push(r);
                if let Some((collider, position)) = self.collider(r) {
                    collider.shape().debug_draw(gfx, position, color);
                }
            }
        }
    }

    // ── renderers ─────────────────────────────────────────────────────────

    pub fn add_renderer(&mut self, renderer: impl Renderer) {
        self.renderers.push(Box::new(renderer));
    }

    /// First renderer of type `R`.
    pub fn renderer<R: Renderer>(&self) -> Option<&R> {
        self.renderers.iter().find_map(|r| (**r).as_any().downcast_ref::<R>())
    }

    pub fn renderer_mut<R: Renderer>(&mut self) -> Option<&mut R> {
        self.renderers.iter_mut().find_map(|r| (**r).as_any_mut().downcast_mut::<R>())
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Runs entity hooks and component `update`, then `late_update`, then renderer `update`.
    ///
    /// The whole frame always runs. The first error a hook reported through
    /// [`Commands::fail`] is returned at the end.
    pub fn update(&mut self, tick: &Tick<'_>) -> Result<()> {
        self.order.clean();
        let mut fault = None;
        for pass in [Pass::Update, Pass::LateUpdate] {
            let len = self.order.len();
            for i in 0..len {
                let Some(&id) = self.order.get(i) else { continue };
                self.update_entity(id, tick, pass, &mut fault);
            }
        }

        let mut renderers = std::mem::take(&mut self.renderers);
        for renderer in renderers.iter_mut() {
            renderer.update(self);
        }
        renderers.append(&mut self.renderers);
        self.renderers = renderers;

        match fault {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn update_entity(&mut self, id: EntityId, tick: &Tick<'_>, pass: Pass, fault: &mut Option<EngineError>) {
        let mut commands = Commands::new();

        if pass == Pass::Update {
            let Some(entity) = self.entities.get_mut(id) else { return };
            if !entity.attached || !entity.active {
                return;
            }
            if let Some(mut hooks) = entity.hooks.take() {
                let mut position = entity.position;
                hooks.update(&mut UpdateCtx {
                    scene: self,
                    entity: id,
                    position: &mut position,
                    time: tick.time,
                    input: tick.input,
                    commands: &mut commands,
                });
                if let Some(entity) = self.entities.get_mut(id) {
                    entity.position = position;
                    entity.hooks = Some(hooks);
                }
                if let Some(err) = std::mem::take(&mut commands).apply(self) {
                    fault.get_or_insert(err);
                }
            }
        }

        let slots = self.entities.get(id).map_or(0, |e| e.slots.len());
        for i in 0..slots {
            let Some(entity) = self.entities.get_mut(id) else { return };
            if !entity.attached || !entity.active {
                return;
            }
            let mut position = entity.position;
            let Some(Some(slot)) = entity.slots.get_mut(i) else { continue };
            if !slot.state.active {
                continue;
            }
            let Some(mut component) = slot.component.take() else { continue };
            let mut state = slot.state;

            let mut ctx = UpdateCtx {
                scene: self,
                entity: id,
                position: &mut position,
                time: tick.time,
                input: tick.input,
                commands: &mut commands,
            };
            match pass {
                Pass::Update => component.update(&mut state, &mut ctx),
                Pass::LateUpdate => component.late_update(&mut state, &mut ctx),
            }

            if let Some(entity) = self.entities.get_mut(id) {
                entity.position = position;
                if let Some(Some(slot)) = entity.slots.get_mut(i) {
                    slot.state = state;
                    slot.component = Some(component);
                }
            }
            if let Some(err) = std::mem::take(&mut commands).apply(self) {
                fault.get_or_insert(err);
            }
        }
    }

    /// Sorts stale lists, then runs every visible renderer.
    pub fn render(&mut self, gfx: &mut Graphics) -> Result<()> {
        self.sort();

        let mut renderers = std::mem::take(&mut self.renderers);
        let mut result = Ok(());
        for renderer in renderers.iter_mut() {
            if !renderer.visible() {
                continue;
            }
            result = run_renderer(&mut **renderer, self, gfx);
            if result.is_err() {
                break;
            }
        }
        renderers.append(&mut self.renderers);
        self.renderers = renderers;
        result
    }

    fn sort(&mut self) {
        let entities = &self.entities;
        let by_depth = |a: &EntityId, b: &EntityId| depth_of(entities, *b).cmp(&depth_of(entities, *a));
        if self.order.sort_if_unsorted(by_depth) {
            log::trace!("scene re-sorted {} entities", self.order.live_len());
        }
        for list in self.groups.values_mut() {
            list.sort_if_unsorted(by_depth);
        }
    }

    /// Draws one entity: its hooks, then each visible component.
    pub fn render_entity(&mut self, id: EntityId, gfx: &mut Graphics, camera: Option<&Camera>) {
        let Some(entity) = self.entities.get_mut(id) else { return };
        if !entity.attached || !entity.visible {
            return;
        }
        let position = entity.position;
        if let Some(hooks) = entity.hooks.as_mut() {
            hooks.render(&mut DrawCtx { gfx: &mut *gfx, camera, position });
        }
        for slot in entity.slots.iter_mut().flatten() {
            if !slot.state.visible {
                continue;
            }
            let Some(component) = slot.component.as_mut() else { continue };
            let mut ctx = DrawCtx { gfx: &mut *gfx, camera, position: position + slot.state.position };
            component.render(&slot.state, &mut ctx);
        }
    }

    /// Draws every attached entity in list order.
    pub fn render_all(&mut self, gfx: &mut Graphics, camera: Option<&Camera>) {
        for i in 0..self.order.len() {
            let Some(&id) = self.order.get(i) else { continue };
            self.render_entity(id, gfx, camera);
        }
    }

    /// Draws the entities of `group` in list order.
    pub fn render_group(&mut self, group: &str, gfx: &mut Graphics, camera: Option<&Camera>) {
        let len = self.groups.get(group).map_or(0, ObjectList::len);
        for i in 0..len {
            let Some(&id) = self.groups.get(group).and_then(|list| list.get(i)) else { continue };
            self.render_entity(id, gfx, camera);
        }
    }
}

fn run_renderer(renderer: &mut dyn Renderer, scene: &mut Scene, gfx: &mut Graphics) -> Result<()> {
    renderer.pre_render(scene, gfx)?;
    renderer.render(scene, gfx)?;
    renderer.post_render(scene, gfx)
}

fn depth_of(entities: &SlotMap<EntityId, Entity>, id: EntityId) -> i32 {
    entities.get(id).map_or(0, Entity::depth)
}

fn track(
    index: &mut HashMap<String, Vec<ColliderRef>>,
    entity: EntityId,
    key: ComponentKey,
    slot: &mut super::entity::Slot,
) -> Result<()> {
    slot.state.attach_scene()?;
    let Some(component) = slot.component.as_mut() else {
        return Ok(());
    };
    if let Some(collider) = component.collider() {
        let at = ColliderRef { entity, component: key };
        for tag in collider.tags() {
            index.entry(tag.clone()).or_default().push(at);
        }
    }
    component.added_to_scene(entity);
    Ok(())
}

fn untrack(
    index: &mut HashMap<String, Vec<ColliderRef>>,
    entity: EntityId,
    key: ComponentKey,
    slot: &mut super::entity::Slot,
) {
    if let Some(component) = slot.component.as_mut() {
        if let Some(collider) = component.collider() {
            let at = ColliderRef { entity, component: key };
            for tag in collider.tags() {
                unindex(index, tag, at);
            }
        }
        component.removed_from_scene(entity);
    }
    slot.state.detach_scene();
}

fn unindex(index: &mut HashMap<String, Vec<ColliderRef>>, tag: &str, at: ColliderRef) {
    if let Some(bucket) = index.get_mut(tag) {
        bucket.retain(|&r| r != at);
        if bucket.is_empty() {
            index.remove(tag);
        }
    }
}

/// Mutable access to one entity that keeps the scene's indices in sync.
pub struct EntityMut<'a> {
    scene: &'a mut Scene,
    id: EntityId,
}

impl EntityMut<'_> {
    fn entity(&self) -> &Entity {
        &self.scene.entities[self.id]
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.scene.entities[self.id]
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn get(&self) -> &Entity {
        self.entity()
    }

    pub fn position(&self) -> Vec2 {
        self.entity().position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.entity_mut().position = position;
    }

    pub fn translate(&mut self, by: Vec2) {
        self.entity_mut().position += by;
    }

    pub fn set_active(&mut self, active: bool) {
        self.entity_mut().active = active;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.entity_mut().visible = visible;
    }

    /// Changes depth. While attached this only flags the scene list and the
    /// entity's group lists as unsorted.
    pub fn set_depth(&mut self, depth: i32) {
        let id = self.id;
        let scene = &mut *self.scene;
        let entity = &mut scene.entities[id];
        if entity.depth == depth {
            return;
        }
        entity.depth = depth;
        if !entity.attached {
            return;
        }
        scene.order.mark_unsorted();
        for group in &entity.groups {
            if let Some(list) = scene.groups.get_mut(group) {
                list.mark_unsorted();
            }
        }
    }

    /// Joins `group`. Returns `false` if already a member.
    pub fn group(&mut self, group: &str) -> bool {
        let id = self.id;
        let scene = &mut *self.scene;
        let entity = &mut scene.entities[id];
        if entity.is_in_group(group) {
            return false;
        }
        entity.groups.push(group.to_owned());
        if entity.attached {
            scene.groups.entry(group.to_owned()).or_default().push(id);
        }
        true
    }

    /// Leaves `group`. Returns `false` if not a member.
    pub fn ungroup(&mut self, group: &str) -> bool {
        let id = self.id;
        let scene = &mut *self.scene;
        let entity = &mut scene.entities[id];
        let Some(i) = entity.groups.iter().position(|g| g == group) else {
            return false;
        };
        entity.groups.remove(i);
        if entity.attached {
            if let Some(list) = scene.groups.get_mut(group) {
                list.remove(&id);
            }
        }
        true
    }

    pub fn add<C: Component>(&mut self, component: C) -> Result<ComponentHandle<C>> {
        self.add_at(component, Vec2::zero())
    }

    /// Adds a component; if the entity is in the scene it is tracked immediately.
    pub fn add_at<C: Component>(&mut self, component: C, local: Vec2) -> Result<ComponentHandle<C>> {
        let id = self.id;
        let scene = &mut *self.scene;
        let entity = &mut scene.entities[id];
        let key = entity.push_slot(Box::new(component), ComponentState::at(local))?;
        if entity.attached {
            if let Some(Some(slot)) = entity.slots.get_mut(key.0) {
                track(&mut scene.colliders, id, key, slot)?;
            }
        }
        Ok(ComponentHandle::new(key))
    }

    /// Mirror of [`EntityMut::add`]: untracks first if attached.
    pub fn remove(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        let id = self.id;
        let scene = &mut *self.scene;
        let entity = &mut scene.entities[id];
        if entity.attached {
            if let Some(Some(slot)) = entity.slots.get_mut(key.0) {
                untrack(&mut scene.colliders, id, key, slot);
            }
        }
        entity.take_slot(key)
    }

    pub fn component<C: Component>(&self, handle: ComponentHandle<C>) -> Option<&C> {
        self.entity().get(handle)
    }

    pub fn component_mut<C: Component>(&mut self, handle: ComponentHandle<C>) -> Option<&mut C> {
        self.entity_mut().get_mut(handle)
    }

    pub fn state_mut(&mut self, key: ComponentKey) -> Option<&mut ComponentState> {
        self.entity_mut().state_mut(key)
    }

    /// Adds `tag` to the component's collider and indexes it.
    pub fn tag_collider(&mut self, key: ComponentKey, tag: &str) -> bool {
        let id = self.id;
        let scene = &mut *self.scene;
        let entity = &mut scene.entities[id];
        let attached = entity.attached;
        let Some(collider) = entity.component_mut(key).and_then(|c| c.collider_mut()) else {
            return false;
        };
        if !collider.tag(tag) {
            return false;
        }
        if attached {
            scene.colliders.entry(tag.to_owned()).or_default().push(ColliderRef { entity: id, component: key });
        }
        true
    }

    /// Removes `tag` from the component's collider and its index bucket.
    pub fn untag_collider(&mut self, key: ComponentKey, tag: &str) -> bool {
        let id = self.id;
        let scene = &mut *self.scene;
        let entity = &mut scene.entities[id];
        let attached = entity.attached;
        let Some(collider) = entity.component_mut(key).and_then(|c| c.collider_mut()) else {
            return false;
        };
        if !collider.untag(tag) {
            return false;
        }
        if attached {
            unindex(&mut scene.colliders, tag, ColliderRef { entity: id, component: key });
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::gpu::RecordingBackend;
    use crate::graphics::GraphicsConfig;
    use crate::input::Input;
    use crate::scene::EntityHooks;
    use crate::time::GameTime;

    type Log = Rc<RefCell<Vec<String>>>;

    fn log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn count(log: &Log, event: &str) -> usize {
        log.borrow().iter().filter(|e| e.as_str() == event).count()
    }

    struct Recorder(Log);

    impl EntityHooks for Recorder {
        fn created(&mut self, _id: EntityId) {
            self.0.borrow_mut().push("created".into());
        }

        fn added(&mut self, _id: EntityId) {
            self.0.borrow_mut().push("added".into());
        }

        fn removed(&mut self, _id: EntityId) {
            self.0.borrow_mut().push("removed".into());
        }

        fn destroyed(&mut self, _id: EntityId) {
            self.0.borrow_mut().push("destroyed".into());
        }
    }

    struct Tracer(Log);

    impl Component for Tracer {
        fn added_to_scene(&mut self, _entity: EntityId) {
            self.0.borrow_mut().push("scene+".into());
        }

        fn removed_from_scene(&mut self, _entity: EntityId) {
            self.0.borrow_mut().push("scene-".into());
        }

        fn update(&mut self, _state: &mut ComponentState, _ctx: &mut UpdateCtx<'_>) {
            self.0.borrow_mut().push("update".into());
        }

        fn late_update(&mut self, _state: &mut ComponentState, _ctx: &mut UpdateCtx<'_>) {
            self.0.borrow_mut().push("late".into());
        }
    }

    struct Drift;

    impl Component for Drift {
        fn update(&mut self, state: &mut ComponentState, ctx: &mut UpdateCtx<'_>) {
            ctx.position.x += 1.0;
            state.position.y += 2.0;
        }
    }

    struct Killer(Option<EntityId>);

    impl Component for Killer {
        fn update(&mut self, _state: &mut ComponentState, ctx: &mut UpdateCtx<'_>) {
            if let Some(target) = self.0.take() {
                ctx.commands.destroy(target);
            }
        }
    }

    fn recorded(log: &Log) -> Entity {
        Entity::new().with_hooks(Recorder(log.clone()))
    }

    fn graphics() -> Graphics {
        let (backend, _) = RecordingBackend::new();
        Graphics::new(Box::new(backend), GraphicsConfig::default()).unwrap()
    }

    fn step(scene: &mut Scene) {
        let input = Input::default();
        scene.update(&Tick { time: GameTime::from_delta(1.0 / 60.0), input: &input }).unwrap();
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn add_fires_created_then_added() {
        let events = log();
        let mut scene = Scene::new();
        let id = scene.add(recorded(&events), Some(Vec2::new(4.0, 5.0))).unwrap();

        assert_eq!(*events.borrow(), ["created", "added"]);
        let e = scene.get(id).unwrap();
        assert!(e.is_created() && e.is_attached());
        assert_eq!(e.position, Vec2::new(4.0, 5.0));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn removed_entity_reattaches_without_created() {
        let events = log();
        let mut scene = Scene::new();
        let id = scene.add(recorded(&events), None).unwrap();

        scene.remove(id).unwrap();
        assert!(scene.get(id).unwrap().is_created());
        assert_eq!(scene.len(), 0);

        scene.attach(id, None).unwrap();
        assert_eq!(count(&events, "created"), 1);
        assert_eq!(count(&events, "added"), 2);
        assert_eq!(count(&events, "removed"), 1);
    }

    #[test]
    fn destroyed_entity_is_created_again_on_add() {
        let events = log();
        let mut scene = Scene::new();
        let id = scene.add(recorded(&events), None).unwrap();

        let entity = scene.destroy(id).unwrap();
        assert!(!entity.is_created());
        assert!(scene.get(id).is_none());
        assert_eq!(*events.borrow(), ["created", "added", "removed", "destroyed"]);

        scene.add(entity, None).unwrap();
        assert_eq!(count(&events, "created"), 2);
    }

    #[test]
    fn recycle_then_recreate_returns_same_entity() {
        let events = log();
        let mut scene = Scene::new();
        let id = scene.add(recorded(&events), None).unwrap();

        scene.recycle("bullets", id).unwrap();
        assert_eq!(scene.len(), 0);
        assert_eq!(scene.cached("bullets"), 1);

        assert_eq!(scene.recreate("bullets").unwrap(), Some(id));
        assert!(scene.get(id).unwrap().is_attached());
        assert_eq!(count(&events, "created"), 1);
        assert_eq!(count(&events, "added"), 2);
        assert_eq!(scene.cached("bullets"), 0);
    }

    #[test]
    fn recycle_bucket_is_fifo() {
        let mut scene = Scene::new();
        let a = scene.add(Entity::new(), None).unwrap();
        let b = scene.add(Entity::new(), None).unwrap();
        scene.recycle("pool", a).unwrap();
        scene.recycle("pool", b).unwrap();
        assert_eq!(scene.recreate("pool").unwrap(), Some(a));
        assert_eq!(scene.recreate("pool").unwrap(), Some(b));
        assert_eq!(scene.recreate("pool").unwrap(), None);
        assert_eq!(scene.recreate("never-used").unwrap(), None);
    }

    #[test]
    fn attach_takes_entity_out_of_its_bucket() {
        let mut scene = Scene::new();
        let a = scene.add(Entity::new(), None).unwrap();
        let b = scene.add(Entity::new(), None).unwrap();
        scene.recycle("pool", a).unwrap();
        scene.recycle("pool", b).unwrap();

        scene.attach(a, None).unwrap();
        assert_eq!(scene.cached("pool"), 1);
        assert_eq!(scene.recreate("pool").unwrap(), Some(b));
        assert_eq!(scene.cached("pool"), 0);
        assert!(scene.get(a).unwrap().is_attached());
    }

    #[test]
    fn state_errors() {
        let mut scene = Scene::new();
        let id = scene.add(Entity::new(), None).unwrap();
        assert!(matches!(scene.attach(id, None), Err(EngineError::EntityAttached)));
        assert!(matches!(scene.take(id), Err(EngineError::EntityAttached)));

        scene.remove(id).unwrap();
        assert!(matches!(scene.remove(id), Err(EngineError::EntityDetached)));

        let taken = scene.take(id).unwrap();
        assert!(taken.is_created());
        assert!(matches!(scene.destroy(id), Err(EngineError::UnknownEntity)));
    }

    #[test]
    fn dispose_destroys_everything() {
        let events = log();
        let mut scene = Scene::new();
        let a = scene.add(recorded(&events), None).unwrap();
        scene.add(recorded(&events), None).unwrap();
        scene.recycle("pool", a).unwrap();

        scene.dispose();
        assert_eq!(count(&events, "destroyed"), 2);
        assert!(scene.is_empty());
        assert_eq!(scene.cached("pool"), 0);
    }

    // ── components ────────────────────────────────────────────────────────

    #[test]
    fn components_follow_scene_attachment() {
        let events = log();
        let mut entity = Entity::new();
        let tracked = entity.add(Tracer(events.clone())).unwrap();

        let mut scene = Scene::new();
        let id = scene.add(entity, None).unwrap();
        assert!(scene.get(id).unwrap().state(tracked.key()).unwrap().is_in_scene());

        scene.remove(id).unwrap();
        assert_eq!(*events.borrow(), ["scene+", "scene-"]);
        assert!(!scene.get(id).unwrap().state(tracked.key()).unwrap().is_in_scene());
    }

    #[test]
    fn component_added_to_attached_entity_is_tracked() {
        let events = log();
        let mut scene = Scene::new();
        let id = scene.add(Entity::new(), None).unwrap();

        let mut e = scene.entity_mut(id).unwrap();
        let key = e.add(Tracer(events.clone())).unwrap().key();
        assert_eq!(*events.borrow(), ["scene+"]);

        assert!(e.remove(key).is_some());
        assert_eq!(*events.borrow(), ["scene+", "scene-"]);
    }

    #[test]
    fn update_runs_update_then_late_update() {
        let events = log();
        let mut scene = Scene::new();
        scene.add(Entity::new().with(Tracer(events.clone())).unwrap(), None).unwrap();
        let idle = scene.add(Entity::new().with(Tracer(events.clone())).unwrap(), None).unwrap();
        scene.entity_mut(idle).unwrap().set_active(false);
        events.borrow_mut().clear();

        step(&mut scene);
        assert_eq!(*events.borrow(), ["update", "late"]);
    }

    #[test]
    fn update_writes_back_positions() {
        let mut scene = Scene::new();
        let mut entity = Entity::at(Vec2::new(10.0, 0.0));
        let drift = entity.add(Drift).unwrap();
        let id = scene.add(entity, None).unwrap();

        step(&mut scene);
        step(&mut scene);
        let e = scene.get(id).unwrap();
        assert_eq!(e.position, Vec2::new(12.0, 0.0));
        assert_eq!(e.state(drift.key()).unwrap().position, Vec2::new(0.0, 4.0));
    }

    #[test]
    fn destroy_during_update_is_deferred_and_safe() {
        let events = log();
        let mut scene = Scene::new();
        let killer = scene.add(Entity::new(), None).unwrap();
        let victim = scene.add(Entity::new().with(Tracer(events.clone())).unwrap(), None).unwrap();
        let bystander_log = log();
        scene.add(Entity::new().with(Tracer(bystander_log.clone())).unwrap(), None).unwrap();
        scene.entity_mut(killer).unwrap().add(Killer(Some(victim))).unwrap();

        step(&mut scene);
        assert!(scene.get(victim).is_none());
        assert_eq!(count(&events, "update"), 0);
        assert_eq!(count(&bystander_log, "update"), 1);
        assert_eq!(scene.len(), 2);
    }

    // ── ordering ──────────────────────────────────────────────────────────

    fn depths(scene: &Scene) -> Vec<i32> {
        scene.entities().map(|id| scene.get(id).unwrap().depth()).collect()
    }

    #[test]
    fn render_sorts_by_depth_descending() {
        let mut scene = Scene::new();
        for depth in [3, 1, 2] {
            scene.add(Entity::new().with_depth(depth), None).unwrap();
        }
        scene.render(&mut graphics()).unwrap();
        assert_eq!(depths(&scene), [3, 2, 1]);
    }

    #[test]
    fn depth_change_sorts_lazily() {
        let mut gfx = graphics();
        let mut scene = Scene::new();
        let a = scene.add(Entity::new().with_depth(1).in_group("g"), None).unwrap();
        scene.add(Entity::new().with_depth(2).in_group("g"), None).unwrap();
        scene.render(&mut gfx).unwrap();
        assert!(!scene.is_unsorted());

        scene.entity_mut(a).unwrap().set_depth(5);
        assert!(scene.is_unsorted());
        assert_eq!(depths(&scene), [2, 5]);

        scene.render(&mut gfx).unwrap();
        assert_eq!(depths(&scene), [5, 2]);
        assert_eq!(scene.group("g").next(), Some(a));
    }

    #[test]
    fn groups_track_attachment() {
        let mut scene = Scene::new();
        let id = scene.add(Entity::new().in_group("enemies"), None).unwrap();
        assert_eq!(scene.group("enemies").collect::<Vec<_>>(), [id]);

        scene.remove(id).unwrap();
        assert_eq!(scene.group("enemies").count(), 0);
        scene.attach(id, None).unwrap();
        assert_eq!(scene.group("enemies").count(), 1);

        let mut e = scene.entity_mut(id).unwrap();
        assert!(e.group("boss"));
        assert!(!e.group("boss"));
        assert!(e.ungroup("enemies"));
        assert_eq!(scene.group("boss").count(), 1);
        assert_eq!(scene.group("enemies").count(), 0);
    }

    // ── collider index ────────────────────────────────────────────────────

    #[test]
    fn collider_tags_are_indexed_incrementally() {
        let mut scene = Scene::new();
        let mut entity = Entity::new();
        let wall = entity.add(Collider::hitbox(0.0, 0.0, 8.0, 8.0).tagged("solid")).unwrap();
        let id = scene.add(entity, None).unwrap();
        assert_eq!(scene.colliders("solid"), [ColliderRef { entity: id, component: wall.key() }]);

        let mut e = scene.entity_mut(id).unwrap();
        assert!(e.tag_collider(wall.key(), "wall"));
        assert!(e.untag_collider(wall.key(), "solid"));
        assert!(scene.colliders("solid").is_empty());
        assert_eq!(scene.colliders("wall").len(), 1);

        scene.remove(id).unwrap();
        assert!(scene.colliders("wall").is_empty());
    }

    #[test]
    fn collide_finds_first_overlap() {
        let mut scene = Scene::new();
        let wall = scene
            .add(Entity::at(Vec2::new(10.0, 0.0)).with(Collider::hitbox(0.0, 0.0, 8.0, 8.0).tagged("solid")).unwrap(), None)
            .unwrap();

        let probe = Collider::hitbox(0.0, 0.0, 4.0, 4.0);
        assert_eq!(scene.collide(&probe, Vec2::new(0.0, 0.0), "solid").unwrap(), None);
        let hit = scene.collide(&probe, Vec2::new(7.0, 0.0), "solid").unwrap();
        assert_eq!(hit.map(|r| r.entity), Some(wall));
        assert_eq!(scene.collide_all(&probe, Vec2::new(7.0, 0.0), "solid").unwrap().len(), 1);
        assert_eq!(scene.collide(&probe, Vec2::new(7.0, 0.0), "water").unwrap(), None);
    }

    #[test]
    fn probe_never_moves_the_collider() {
        let mut scene = Scene::new();
        scene
            .add(Entity::at(Vec2::new(10.0, 0.0)).with(Collider::hitbox(0.0, 0.0, 8.0, 8.0).tagged("solid")).unwrap(), None)
            .unwrap();
        let mut mover = Entity::at(Vec2::new(0.0, 0.0));
        let body = mover.add_at(Collider::hitbox(0.0, 0.0, 4.0, 4.0), Vec2::new(1.0, 1.0)).unwrap();
        let id = scene.add(mover, None).unwrap();
        let at = ColliderRef { entity: id, component: body.key() };

        for offset in [Vec2::new(6.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(-3.0, 2.0)] {
            let hit = scene.probe(at, offset, "solid").unwrap();
            assert_eq!(hit.is_some(), offset.x > 4.0);
            let e = scene.get(id).unwrap();
            assert_eq!(e.position, Vec2::new(0.0, 0.0));
            assert_eq!(e.state(body.key()).unwrap().position, Vec2::new(1.0, 1.0));
            assert_eq!(scene.collider(at).unwrap().1, Vec2::new(1.0, 1.0));
        }
    }

    #[test]
    fn inactive_colliders_are_ignored() {
        let mut scene = Scene::new();
        let wall = scene.add(Entity::new().with(Collider::hitbox(0.0, 0.0, 8.0, 8.0).tagged("solid")).unwrap(), None).unwrap();
        let probe = Collider::hitbox(0.0, 0.0, 4.0, 4.0);
        scene.entity_mut(wall).unwrap().set_active(false);
        assert_eq!(scene.collide(&probe, Vec2::zero(), "solid").unwrap(), None);
    }
}

//! Entities, components and the scene that owns them.
//!
//! Responsibilities:
//! - entity lifecycle (add / remove / destroy / recycle) with hook callbacks
//! - group and collider-tag indices kept in sync with attachment
//! - depth ordering, sorted lazily at render time
//!
//! Entities are addressed by generation-stamped [`EntityId`]s; components by
//! [`ComponentKey`] within their entity. Nothing holds back-references.

mod commands;
mod component;
mod entity;
mod object_list;
mod scene;

pub use commands::Commands;
pub use component::{Component, ComponentHandle, ComponentKey, ComponentState, Tick, UpdateCtx};
pub use entity::{Entity, EntityHooks, EntityId};
pub use object_list::ObjectList;
pub use scene::{ColliderRef, EntityMut, Scene};

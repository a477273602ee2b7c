//! Component Model
//!
//! Components are polymorphic behaviors attached to exactly one actor.
//! Instead of an inheritance chain, capabilities are explicit: a component
//! opts into drawing by answering [`Component::as_drawable`] and into culling
//! by answering [`Component::as_bounds`].
//!
//! Factories are registered by string type name; `instantiate` on an
//! unregistered name fails with `UnknownType` and the scene continues.

use std::any::Any;

use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

use crate::errors::{Result, TempestError};
use crate::render::command_buffer::CommandBuffer;
use crate::resources::{Aabb, ResourceCatalog, ResourceKey, ResourceState};
use crate::variant::VariantMap;

use super::actor::{Actor, ActorKey, LayerMask};

new_key_type! {
    /// Generational handle to a component slot.
    pub struct ComponentKey;
}

/// Active-camera context handed to component updates. Absent when no camera
/// is current, in which case camera-relative work (e.g. particle distance
/// sorting) is skipped for the frame.
#[derive(Debug, Clone, Copy)]
pub struct CameraContext {
    pub actor: ActorKey,
    /// Camera world position.
    pub position: Vec3,
    /// World-to-camera matrix.
    pub view: Mat4,
}

/// Mutable state reachable from component lifecycle hooks.
///
/// `actors` grants transform access; topology mutation from inside `update`
/// is forbidden by convention (reparent/remove through the scene between
/// frames instead).
pub struct ComponentContext<'a> {
    /// Key of the component being invoked.
    pub this: ComponentKey,
    /// Owning actor of the component being invoked.
    pub actor: ActorKey,
    pub actors: &'a mut SlotMap<ActorKey, Actor>,
    pub catalog: &'a mut ResourceCatalog,
    pub camera: Option<CameraContext>,
    /// Seconds elapsed since the previous frame.
    pub dt: f32,
}

impl ComponentContext<'_> {
    /// The invoked component's owning actor, when still live.
    #[must_use]
    pub fn owner(&self) -> Option<&Actor> {
        self.actors.get(self.actor)
    }

    #[must_use]
    pub fn owner_mut(&mut self) -> Option<&mut Actor> {
        self.actors.get_mut(self.actor)
    }
}

/// Read-only state reachable from draw submission.
pub struct DrawArgs<'a> {
    pub actor: &'a Actor,
    pub catalog: &'a ResourceCatalog,
}

/// Capability: produces draw submissions.
pub trait Drawable {
    /// Submits draws for one camera pass. Must not mutate scene topology;
    /// submissions only.
    fn draw(&self, args: &DrawArgs<'_>, buffer: &mut dyn CommandBuffer, layer: LayerMask);

    /// Whether submissions belong in the sorted back-to-front pass.
    fn translucent(&self, _args: &DrawArgs<'_>) -> bool {
        false
    }
}

/// Capability: provides world-space bounds for frustum culling. Components
/// without bounds are drawn unconditionally.
pub trait BoundsProvider {
    fn world_bounds(&self, args: &DrawArgs<'_>) -> Option<Aabb>;
}

/// Polymorphic behavior attached to one actor.
#[allow(unused_variables)]
pub trait Component: 'static {
    /// Registered type name.
    fn type_name(&self) -> &'static str;

    /// Called once after the component is fully constructed and attached.
    fn compose(&mut self, ctx: &mut ComponentContext<'_>) {}

    /// Called every active frame, in registration order within an actor.
    fn update(&mut self, ctx: &mut ComponentContext<'_>) {}

    /// Called after the owning actor was reparented, so dependent cached
    /// state can resynchronize.
    fn parent_changed(&mut self, ctx: &mut ComponentContext<'_>) {}

    /// Observer entry point for subscribed resource state changes.
    fn resource_updated(
        &mut self,
        resource: ResourceKey,
        state: ResourceState,
        catalog: &ResourceCatalog,
    ) {
    }

    /// Called before destruction: release references and unsubscribe.
    fn teardown(&mut self, catalog: &mut ResourceCatalog) {}

    /// Restores persisted fields from a variant map.
    fn load_user_data(&mut self, data: &VariantMap, ctx: &mut ComponentContext<'_>) {}

    /// Persists fields into a variant map. Resource references are stored as
    /// path strings; an absent reference is the empty string.
    fn save_user_data(&self, catalog: &ResourceCatalog) -> VariantMap {
        VariantMap::new()
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        None
    }

    fn as_bounds(&self) -> Option<&dyn BoundsProvider> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// One slot of the component pool.
pub struct ComponentSlot {
    /// Owning actor.
    pub actor: ActorKey,
    /// Disabled components are skipped by update and draw.
    pub enabled: bool,
    pub component: Box<dyn Component>,
}

/// Factory signature registered per type name.
pub type ComponentFactory = fn() -> Box<dyn Component>;

/// String-keyed component factory registry.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: FxHashMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the engine's built-in component types.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::components::register_builtins(&mut registry);
        registry
    }

    pub fn register(&mut self, type_name: &str, factory: ComponentFactory) {
        self.factories.insert(type_name.to_string(), factory);
    }

    /// Removes a factory (module unload). Existing component instances are
    /// unaffected.
    pub fn unregister(&mut self, type_name: &str) {
        self.factories.remove(type_name);
    }

    #[must_use]
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Constructs a component by registered type name.
    pub fn instantiate(&self, type_name: &str) -> Result<Box<dyn Component>> {
        self.factories
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| TempestError::UnknownType(type_name.to_string()))
    }
}

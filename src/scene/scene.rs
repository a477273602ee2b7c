//! Scene
//!
//! The scene owns two arenas: actors (hierarchy + transforms) and component
//! slots (polymorphic behaviors). Splitting them keeps borrows disjoint:
//! a component update mutates transforms and resources while its own slot is
//! exclusively borrowed, without ever aliasing the actor arena.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::components::Camera;
use crate::errors::{Result, TempestError};
use crate::resources::ResourceCatalog;
use crate::variant::VariantMap;

use super::actor::{Actor, ActorKey, LayerMask};
use super::component::{
    CameraContext, Component, ComponentContext, ComponentKey, ComponentRegistry, ComponentSlot,
};

/// Component-based scene graph.
pub struct Scene {
    pub(crate) actors: SlotMap<ActorKey, Actor>,
    pub(crate) components: SlotMap<ComponentKey, ComponentSlot>,
    pub(crate) root_actors: Vec<ActorKey>,
    /// Camera all render work runs against; `None` disables rendering.
    pub active_camera: Option<ActorKey>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            actors: SlotMap::with_key(),
            components: SlotMap::with_key(),
            root_actors: Vec::new(),
            active_camera: None,
        }
    }

    // ========================================================================
    // Actors
    // ========================================================================

    /// Creates a root actor.
    pub fn spawn(&mut self, name: &str) -> ActorKey {
        let key = self.actors.insert(Actor::new(name));
        self.root_actors.push(key);
        key
    }

    /// Creates an actor parented under `parent`. Falls back to the root set
    /// when the parent is no longer live.
    pub fn spawn_child(&mut self, name: &str, parent: ActorKey) -> ActorKey {
        let key = self.actors.insert(Actor::new(name));
        if let Some(p) = self.actors.get_mut(parent) {
            p.children.push(key);
            self.actors[key].parent = Some(parent);
        } else {
            log::error!("spawn_child: parent actor not found, attaching '{name}' to root");
            self.root_actors.push(key);
        }
        key
    }

    /// Constructs an actor carrying one component of the registered type.
    /// `"Actor"` builds a bare actor; any other unregistered name fails with
    /// `UnknownType` and nothing is created.
    pub fn instantiate(
        &mut self,
        registry: &ComponentRegistry,
        type_name: &str,
        name: &str,
        parent: Option<ActorKey>,
        catalog: &mut ResourceCatalog,
    ) -> Result<ActorKey> {
        let component = if type_name == "Actor" {
            None
        } else {
            Some(registry.instantiate(type_name)?)
        };

        let actor = match parent {
            Some(parent) => self.spawn_child(name, parent),
            None => self.spawn(name),
        };
        if let Some(component) = component {
            self.add_component(actor, component, catalog);
        }
        Ok(actor)
    }

    #[must_use]
    pub fn actor(&self, key: ActorKey) -> Option<&Actor> {
        self.actors.get(key)
    }

    #[must_use]
    pub fn actor_mut(&mut self, key: ActorKey) -> Option<&mut Actor> {
        self.actors.get_mut(key)
    }

    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[ActorKey] {
        &self.root_actors
    }

    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Removes an actor and its whole subtree. Owned components are torn
    /// down (releasing resource references) and destroyed with their actors.
    pub fn remove_actor(&mut self, key: ActorKey, catalog: &mut ResourceCatalog) {
        // Unlink from parent or root set first.
        let parent = self.actors.get(key).and_then(|a| a.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.actors.get_mut(parent) {
                p.children.retain(|&c| c != key);
            }
        } else {
            self.root_actors.retain(|&r| r != key);
        }

        let mut doomed = Vec::new();
        self.collect_subtree(key, &mut doomed);
        for actor_key in doomed {
            if let Some(actor) = self.actors.remove(actor_key) {
                for component_key in actor.components {
                    if let Some(mut slot) = self.components.remove(component_key) {
                        slot.component.teardown(catalog);
                    }
                }
            }
            if self.active_camera == Some(actor_key) {
                self.active_camera = None;
            }
        }
    }

    fn collect_subtree(&self, root: ActorKey, out: &mut Vec<ActorKey>) {
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            if let Some(actor) = self.actors.get(key) {
                out.push(key);
                stack.extend(actor.children.iter().copied());
            }
        }
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Reparents an actor.
    ///
    /// `position` chooses the insertion index among the new siblings
    /// (append when `None`), preserving the order of existing siblings.
    /// `force` bypasses the layer-compatibility check (UI actors normally
    /// only parent under UI actors); it never bypasses the cycle check.
    ///
    /// Fires `parent_changed` on the child's components so dependent cached
    /// state resynchronizes.
    pub fn set_parent(
        &mut self,
        child: ActorKey,
        new_parent: Option<ActorKey>,
        position: Option<usize>,
        force: bool,
        catalog: &mut ResourceCatalog,
    ) -> Result<()> {
        if !self.actors.contains_key(child) {
            return Err(TempestError::StructuralIntegrity(
                "reparent target no longer exists".into(),
            ));
        }

        if let Some(parent) = new_parent {
            if !self.actors.contains_key(parent) {
                return Err(TempestError::StructuralIntegrity(
                    "new parent no longer exists".into(),
                ));
            }
            if self.would_cycle(child, parent) {
                log::warn!("refusing reparent: target is a descendant of the moving actor");
                return Err(TempestError::StructuralIntegrity(
                    "cannot parent an actor to one of its own descendants".into(),
                ));
            }
            if !force {
                let child_ui = self.actors[child].layers.contains(LayerMask::UI);
                let parent_ui = self.actors[parent].layers.contains(LayerMask::UI);
                if child_ui != parent_ui {
                    return Err(TempestError::StructuralIntegrity(
                        "layer-incompatible parent (pass force to override)".into(),
                    ));
                }
            }
        }

        // Detach from the old parent or the root set.
        let old_parent = self.actors[child].parent;
        match old_parent {
            Some(old) => {
                if let Some(p) = self.actors.get_mut(old) {
                    p.children.retain(|&c| c != child);
                }
            }
            None => self.root_actors.retain(|&r| r != child),
        }

        // Attach.
        match new_parent {
            Some(parent) => {
                let siblings = &mut self.actors[parent].children;
                let index = position.unwrap_or(siblings.len()).min(siblings.len());
                siblings.insert(index, child);
            }
            None => {
                let index = position.unwrap_or(self.root_actors.len()).min(self.root_actors.len());
                self.root_actors.insert(index, child);
            }
        }

        let actor = &mut self.actors[child];
        actor.parent = new_parent;
        actor.transform.mark_dirty();

        // Let the child's components resynchronize cached hierarchy state.
        let affected: Vec<ComponentKey> = self.actors[child].components.to_vec();
        for key in affected {
            self.invoke(catalog, key, 0.0, |component, ctx| {
                component.parent_changed(ctx);
            });
        }

        Ok(())
    }

    /// Convenience append-reparent.
    pub fn attach(
        &mut self,
        child: ActorKey,
        parent: ActorKey,
        catalog: &mut ResourceCatalog,
    ) -> Result<()> {
        self.set_parent(child, Some(parent), None, false, catalog)
    }

    fn would_cycle(&self, child: ActorKey, parent: ActorKey) -> bool {
        let mut cursor = Some(parent);
        while let Some(key) = cursor {
            if key == child {
                return true;
            }
            cursor = self.actors.get(key).and_then(|a| a.parent);
        }
        false
    }

    /// Whether `node` sits in the subtree rooted at `ancestor`.
    #[must_use]
    pub fn is_descendant(&self, ancestor: ActorKey, node: ActorKey) -> bool {
        let mut cursor = self.actors.get(node).and_then(|a| a.parent);
        while let Some(key) = cursor {
            if key == ancestor {
                return true;
            }
            cursor = self.actors.get(key).and_then(|a| a.parent);
        }
        false
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Attaches a component and runs its `compose` hook.
    pub fn add_component(
        &mut self,
        actor: ActorKey,
        component: Box<dyn Component>,
        catalog: &mut ResourceCatalog,
    ) -> ComponentKey {
        let key = self.components.insert(ComponentSlot {
            actor,
            enabled: true,
            component,
        });
        if let Some(a) = self.actors.get_mut(actor) {
            a.components.push(key);
        }
        self.invoke(catalog, key, 0.0, |component, ctx| component.compose(ctx));
        key
    }

    /// Attaches a component constructed from the registry by type name.
    pub fn add_component_by_name(
        &mut self,
        actor: ActorKey,
        registry: &ComponentRegistry,
        type_name: &str,
        catalog: &mut ResourceCatalog,
    ) -> Result<ComponentKey> {
        let component = registry.instantiate(type_name)?;
        Ok(self.add_component(actor, component, catalog))
    }

    /// Detaches and destroys a single component.
    pub fn remove_component(&mut self, key: ComponentKey, catalog: &mut ResourceCatalog) {
        if let Some(mut slot) = self.components.remove(key) {
            slot.component.teardown(catalog);
            if let Some(actor) = self.actors.get_mut(slot.actor) {
                actor.components.retain(|c| *c != key);
            }
        }
    }

    #[must_use]
    pub fn component(&self, key: ComponentKey) -> Option<&ComponentSlot> {
        self.components.get(key)
    }

    #[must_use]
    pub fn component_mut(&mut self, key: ComponentKey) -> Option<&mut ComponentSlot> {
        self.components.get_mut(key)
    }

    pub fn set_component_enabled(&mut self, key: ComponentKey, enabled: bool) {
        if let Some(slot) = self.components.get_mut(key) {
            slot.enabled = enabled;
        }
    }

    /// First component of concrete type `T` on an actor.
    #[must_use]
    pub fn find_component<T: Component>(&self, actor: ActorKey) -> Option<&T> {
        let a = self.actors.get(actor)?;
        a.components.iter().find_map(|&key| {
            self.components
                .get(key)
                .and_then(|slot| slot.component.as_any().downcast_ref::<T>())
        })
    }

    /// Mutable variant of [`Scene::find_component`].
    #[must_use]
    pub fn find_component_mut<T: Component>(&mut self, actor: ActorKey) -> Option<&mut T> {
        let keys: Vec<ComponentKey> = self.actors.get(actor)?.components.to_vec();
        for key in keys {
            let found = self
                .components
                .get(key)
                .is_some_and(|slot| slot.component.as_any().is::<T>());
            if found {
                return self
                    .components
                    .get_mut(key)
                    .and_then(|slot| slot.component.as_any_mut().downcast_mut::<T>());
            }
        }
        None
    }

    /// Key of the first component of type `T` on an actor.
    #[must_use]
    pub fn find_component_key<T: Component>(&self, actor: ActorKey) -> Option<ComponentKey> {
        let a = self.actors.get(actor)?;
        a.components.iter().copied().find(|&key| {
            self.components
                .get(key)
                .is_some_and(|slot| slot.component.as_any().is::<T>())
        })
    }

    /// Runs one component hook with a fully built context.
    pub(crate) fn invoke<F>(
        &mut self,
        catalog: &mut ResourceCatalog,
        key: ComponentKey,
        dt: f32,
        f: F,
    ) where
        F: FnOnce(&mut dyn Component, &mut ComponentContext<'_>),
    {
        let camera = self.camera_context();
        let Self {
            actors, components, ..
        } = self;
        if let Some(slot) = components.get_mut(key) {
            let mut ctx = ComponentContext {
                this: key,
                actor: slot.actor,
                actors: &mut *actors,
                catalog: &mut *catalog,
                camera,
                dt,
            };
            f(slot.component.as_mut(), &mut ctx);
        }
    }

    /// Restores one component from persisted user data.
    pub fn load_component_data(
        &mut self,
        key: ComponentKey,
        data: &VariantMap,
        catalog: &mut ResourceCatalog,
    ) {
        self.invoke(catalog, key, 0.0, |component, ctx| {
            component.load_user_data(data, ctx);
        });
    }

    /// Persists one component to user data.
    #[must_use]
    pub fn save_component_data(
        &self,
        key: ComponentKey,
        catalog: &ResourceCatalog,
    ) -> Option<VariantMap> {
        self.components
            .get(key)
            .map(|slot| slot.component.save_user_data(catalog))
    }

    // ========================================================================
    // Per-frame passes
    // ========================================================================

    /// Depth-first traversal of enabled actors; disabled actors hide their
    /// whole subtree.
    #[must_use]
    pub fn traversal_order(&self) -> Vec<ActorKey> {
        let mut order = Vec::with_capacity(self.actors.len());
        let mut stack: Vec<ActorKey> = self.root_actors.iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            let Some(actor) = self.actors.get(key) else {
                continue;
            };
            if !actor.enabled {
                continue;
            }
            order.push(key);
            for &child in actor.children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    /// Recomputes world matrices for the enabled hierarchy. Iterative with an
    /// explicit stack so deep scenes cannot overflow; a node recombines with
    /// its parent only when its own TRS or anything above it changed.
    pub fn update_transforms(&mut self) {
        let mut stack: Vec<(ActorKey, Affine3A, bool)> = self
            .root_actors
            .iter()
            .rev()
            .map(|&k| (k, Affine3A::IDENTITY, false))
            .collect();

        while let Some((key, parent_world, parent_changed)) = stack.pop() {
            let Some(actor) = self.actors.get_mut(key) else {
                continue;
            };
            if !actor.enabled {
                continue;
            }

            let local_changed = actor.transform.update_local_matrix();
            let needs_update = local_changed || parent_changed;
            if needs_update {
                let world = parent_world * *actor.transform.local_matrix();
                actor.transform.set_world_matrix(world);
            }

            let current_world = actor.transform.world_matrix;
            for &child in actor.children.iter().rev() {
                stack.push((child, current_world, needs_update));
            }
        }
    }

    /// Runs every enabled component's `update`, actors in traversal order,
    /// components in registration order within each actor.
    pub fn update_components(&mut self, catalog: &mut ResourceCatalog, dt: f32) {
        let camera = self.camera_context();
        let order = self.component_order();
        let Self {
            actors, components, ..
        } = self;
        for key in order {
            let Some(slot) = components.get_mut(key) else {
                continue;
            };
            if !slot.enabled {
                continue;
            }
            let mut ctx = ComponentContext {
                this: key,
                actor: slot.actor,
                actors: &mut *actors,
                catalog: &mut *catalog,
                camera,
                dt,
            };
            slot.component.update(&mut ctx);
        }
    }

    fn component_order(&self) -> Vec<ComponentKey> {
        let mut order = Vec::new();
        for key in self.traversal_order() {
            if let Some(actor) = self.actors.get(key) {
                order.extend(actor.components.iter().copied());
            }
        }
        order
    }

    /// Delivers pending resource transitions to subscribed live components.
    /// Stale component keys fail the arena lookup and are skipped.
    pub fn flush_resource_events(&mut self, catalog: &mut ResourceCatalog) {
        let events = catalog.take_events();
        for (resource, state) in events {
            let observers: Vec<ComponentKey> = catalog.observers_of(resource).to_vec();
            for key in observers {
                if let Some(slot) = self.components.get_mut(key) {
                    slot.component.resource_updated(resource, state, catalog);
                }
            }
        }
    }

    /// Camera context of the active camera, if one is set, live, and
    /// actually carries a camera component.
    #[must_use]
    pub fn camera_context(&self) -> Option<CameraContext> {
        let actor_key = self.active_camera?;
        let actor = self.actors.get(actor_key)?;
        let camera = self.find_component::<Camera>(actor_key)?;
        let world = actor.transform.world_matrix;
        Some(CameraContext {
            actor: actor_key,
            position: actor.transform.world_position(),
            view: camera.view_matrix(&world),
        })
    }
}

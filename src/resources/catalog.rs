//! Resource Catalog
//!
//! The catalog owns every resource entry, resolves path-string references,
//! tracks reference counts and drives the observer machinery around state
//! transitions.
//!
//! # Observers
//!
//! Observers are component keys, not pointers: a stale key simply fails the
//! arena lookup at dispatch time, so a component that forgot to unsubscribe
//! can never be called through a dangling reference. Components still
//! unsubscribe in their teardown to keep the tables small.
//!
//! Transitions append to an event queue; the scene delivers the queue to
//! live observers at explicit flush points (immediately after engine-level
//! loads, and at the frame barrier for transitions raised from inside
//! component callbacks).
//!
//! # Garbage collection
//!
//! Releasing the last reference moves an entry to `ToBeDeleted`. Collection
//! is two-phase: a first pass flips doomed entries to `Unloading` (so
//! observers hear about it at the next flush), a later pass frees the slot.

use rustc_hash::FxHashMap;
use slotmap::{SecondaryMap, SlotMap};
use smallvec::SmallVec;

use crate::errors::{Result, TempestError};
use crate::scene::ComponentKey;

use super::material::Material;
use super::mesh::Mesh;
use super::particle_effect::ParticleEffect;
use super::pose::Pose;
use super::render_target::RenderTarget;
use super::resource::{ResourceData, ResourceEntry, ResourceKey, ResourceMeta, ResourceState};
use super::texture::Texture;

/// Loader boundary. Modules register loaders; the catalog resolves
/// path-strings through them.
pub trait ResourceLoader {
    /// Whether this loader recognizes the path.
    fn handles(&self, path: &str) -> bool;

    /// Empty payload of the kind this path loads into. The entry exists (in
    /// `Loading` state) before population starts.
    fn placeholder(&self, path: &str) -> ResourceData;

    /// Populates the payload. An error moves the resource to `Suspend`.
    fn load(&mut self, path: &str, data: &mut ResourceData) -> Result<()>;
}

/// Central resource registry.
pub struct ResourceCatalog {
    entries: SlotMap<ResourceKey, ResourceEntry>,
    by_path: FxHashMap<String, ResourceKey>,
    observers: SecondaryMap<ResourceKey, SmallVec<[ComponentKey; 2]>>,
    loaders: Vec<Box<dyn ResourceLoader>>,
    events: Vec<(ResourceKey, ResourceState)>,
    builtin_cube: ResourceKey,
    builtin_plane: ResourceKey,
    default_material: ResourceKey,
}

impl Default for ResourceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCatalog {
    #[must_use]
    pub fn new() -> Self {
        let mut catalog = Self {
            entries: SlotMap::with_key(),
            by_path: FxHashMap::default(),
            observers: SecondaryMap::new(),
            loaders: Vec::new(),
            events: Vec::new(),
            builtin_cube: ResourceKey::default(),
            builtin_plane: ResourceKey::default(),
            default_material: ResourceKey::default(),
        };

        catalog.default_material = catalog.register(
            ".embedded/default.mat",
            ResourceData::Material(Material::new("Default")),
        );

        let mut cube = Mesh::cube();
        cube.set_default_material(0, Some(catalog.default_material));
        catalog.builtin_cube = catalog.register(".embedded/cube", ResourceData::Mesh(cube));

        let mut plane = Mesh::plane();
        plane.set_default_material(0, Some(catalog.default_material));
        catalog.builtin_plane = catalog.register(".embedded/plane", ResourceData::Mesh(plane));

        catalog
    }

    // ========================================================================
    // Insertion & Loading
    // ========================================================================

    /// Inserts a ready resource under a path. Returns the existing entry when
    /// the path is already registered.
    pub fn register(&mut self, path: &str, data: ResourceData) -> ResourceKey {
        if let Some(&key) = self.by_path.get(path) {
            return key;
        }
        let key = self.entries.insert(ResourceEntry {
            meta: ResourceMeta::new(path, ResourceState::Ready),
            data,
        });
        if !path.is_empty() {
            self.by_path.insert(path.to_string(), key);
        }
        key
    }

    /// Inserts an anonymous ready resource (empty reference path).
    pub fn add(&mut self, data: ResourceData) -> ResourceKey {
        self.entries.insert(ResourceEntry {
            meta: ResourceMeta::new("", ResourceState::Ready),
            data,
        })
    }

    pub fn add_texture(&mut self, texture: Texture) -> ResourceKey {
        self.add(ResourceData::Texture(texture))
    }

    pub fn add_render_target(&mut self, target: RenderTarget) -> ResourceKey {
        self.add(ResourceData::RenderTarget(target))
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> ResourceKey {
        self.add(ResourceData::Mesh(mesh))
    }

    pub fn add_material(&mut self, material: Material) -> ResourceKey {
        self.add(ResourceData::Material(material))
    }

    pub fn add_effect(&mut self, effect: ParticleEffect) -> ResourceKey {
        self.add(ResourceData::ParticleEffect(effect))
    }

    pub fn add_pose(&mut self, pose: Pose) -> ResourceKey {
        self.add(ResourceData::Pose(pose))
    }

    /// Registers a loader at the end of the resolution chain.
    pub fn add_loader(&mut self, loader: Box<dyn ResourceLoader>) {
        self.loaders.push(loader);
    }

    /// Resolves a path-string reference. Loads through the first loader that
    /// recognizes the path; repeated loads of the same path share one entry.
    ///
    /// A loader failure is not propagated: the entry stays registered in
    /// `Suspend` state and the failure is surfaced through observers.
    pub fn load(&mut self, path: &str) -> Result<ResourceKey> {
        if let Some(&key) = self.by_path.get(path) {
            return Ok(key);
        }

        let Some(index) = self.loaders.iter().position(|l| l.handles(path)) else {
            return Err(TempestError::ResourceNotFound(path.to_string()));
        };

        let placeholder = self.loaders[index].placeholder(path);
        let key = self.entries.insert(ResourceEntry {
            meta: ResourceMeta::new(path, ResourceState::Loading),
            data: placeholder,
        });
        self.by_path.insert(path.to_string(), key);

        self.populate(key, index, path);
        Ok(key)
    }

    /// Explicit reload request: the only path by which `Ready` goes back to
    /// `Loading`.
    pub fn reload(&mut self, key: ResourceKey) -> Result<()> {
        let path = self
            .entries
            .get(key)
            .map(|e| e.meta.path.clone())
            .ok_or_else(|| TempestError::ResourceNotFound(String::new()))?;
        if path.is_empty() {
            return Err(TempestError::MissingDependency("resource path"));
        }
        let Some(index) = self.loaders.iter().position(|l| l.handles(&path)) else {
            return Err(TempestError::ResourceNotFound(path));
        };
        self.transition(key, ResourceState::Loading);
        self.populate(key, index, &path);
        Ok(())
    }

    fn populate(&mut self, key: ResourceKey, loader: usize, path: &str) {
        let result = {
            let Some(entry) = self.entries.get_mut(key) else {
                return;
            };
            self.loaders[loader].load(path, &mut entry.data)
        };
        match result {
            Ok(()) => self.transition(key, ResourceState::Ready),
            Err(err) => {
                log::error!("resource load failed: {path}: {err}");
                self.transition(key, ResourceState::Suspend);
            }
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Current state, if the handle is live.
    #[must_use]
    pub fn state(&self, key: ResourceKey) -> Option<ResourceState> {
        self.entries.get(key).map(|e| e.meta.state)
    }

    /// Whether the resource may be drawn this frame.
    #[must_use]
    pub fn is_ready(&self, key: ResourceKey) -> bool {
        self.state(key) == Some(ResourceState::Ready)
    }

    /// Path-string reference of a resource; empty for anonymous entries.
    #[must_use]
    pub fn reference(&self, key: ResourceKey) -> &str {
        self.entries.get(key).map_or("", |e| e.meta.path.as_str())
    }

    /// Handle for an already-registered path.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<ResourceKey> {
        self.by_path.get(path).copied()
    }

    pub fn retain(&mut self, key: ResourceKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.meta.refs += 1;
        }
    }

    /// Drops one reference. The last release queues the entry for deletion.
    pub fn release(&mut self, key: ResourceKey) {
        let doomed = match self.entries.get_mut(key) {
            Some(entry) => {
                entry.meta.refs = entry.meta.refs.saturating_sub(1);
                entry.meta.refs == 0
            }
            None => false,
        };
        if doomed {
            self.transition(key, ResourceState::ToBeDeleted);
        }
    }

    /// Two-phase garbage collection (see module docs).
    pub fn collect_garbage(&mut self) {
        let mut free_now = Vec::new();
        let mut doomed = Vec::new();
        for (key, entry) in &self.entries {
            match entry.meta.state {
                ResourceState::Unloading => free_now.push((key, entry.meta.path.clone())),
                ResourceState::ToBeDeleted if entry.meta.refs == 0 => doomed.push(key),
                _ => {}
            }
        }
        for (key, path) in free_now {
            self.entries.remove(key);
            self.observers.remove(key);
            if !path.is_empty() {
                self.by_path.remove(&path);
            }
        }
        for key in doomed {
            self.transition(key, ResourceState::Unloading);
        }
    }

    pub(crate) fn transition(&mut self, key: ResourceKey, state: ResourceState) {
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        if entry.meta.state == state {
            return;
        }
        entry.meta.state = state;
        self.events.push((key, state));
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Subscribes a component to state-change notifications.
    pub fn subscribe(&mut self, key: ResourceKey, observer: ComponentKey) {
        if !self.entries.contains_key(key) {
            return;
        }
        if self.observers.get(key).is_none() {
            self.observers.insert(key, SmallVec::new());
        }
        if let Some(list) = self.observers.get_mut(key) {
            if !list.contains(&observer) {
                list.push(observer);
            }
        }
    }

    /// Removes a subscription; must be paired with `subscribe` before the
    /// observing component is destroyed.
    pub fn unsubscribe(&mut self, key: ResourceKey, observer: ComponentKey) {
        if let Some(list) = self.observers.get_mut(key) {
            list.retain(|o| *o != observer);
        }
    }

    #[must_use]
    pub fn observers_of(&self, key: ResourceKey) -> &[ComponentKey] {
        match self.observers.get(key) {
            Some(list) => list.as_slice(),
            None => &[],
        }
    }

    /// Drains the pending transition events for dispatch.
    pub(crate) fn take_events(&mut self) -> Vec<(ResourceKey, ResourceState)> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    // ========================================================================
    // Typed access
    // ========================================================================

    #[must_use]
    pub fn meta(&self, key: ResourceKey) -> Option<&ResourceMeta> {
        self.entries.get(key).map(|e| &e.meta)
    }

    #[must_use]
    pub fn texture(&self, key: ResourceKey) -> Option<&Texture> {
        match self.entries.get(key)?.data {
            ResourceData::Texture(ref t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn texture_mut(&mut self, key: ResourceKey) -> Option<&mut Texture> {
        match self.entries.get_mut(key)?.data {
            ResourceData::Texture(ref mut t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn render_target(&self, key: ResourceKey) -> Option<&RenderTarget> {
        match self.entries.get(key)?.data {
            ResourceData::RenderTarget(ref t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn render_target_mut(&mut self, key: ResourceKey) -> Option<&mut RenderTarget> {
        match self.entries.get_mut(key)?.data {
            ResourceData::RenderTarget(ref mut t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn mesh(&self, key: ResourceKey) -> Option<&Mesh> {
        match self.entries.get(key)?.data {
            ResourceData::Mesh(ref m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn mesh_mut(&mut self, key: ResourceKey) -> Option<&mut Mesh> {
        match self.entries.get_mut(key)?.data {
            ResourceData::Mesh(ref mut m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn material(&self, key: ResourceKey) -> Option<&Material> {
        match self.entries.get(key)?.data {
            ResourceData::Material(ref m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn material_mut(&mut self, key: ResourceKey) -> Option<&mut Material> {
        match self.entries.get_mut(key)?.data {
            ResourceData::Material(ref mut m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn effect(&self, key: ResourceKey) -> Option<&ParticleEffect> {
        match self.entries.get(key)?.data {
            ResourceData::ParticleEffect(ref e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn effect_mut(&mut self, key: ResourceKey) -> Option<&mut ParticleEffect> {
        match self.entries.get_mut(key)?.data {
            ResourceData::ParticleEffect(ref mut e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn pose(&self, key: ResourceKey) -> Option<&Pose> {
        match self.entries.get(key)?.data {
            ResourceData::Pose(ref p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn pose_mut(&mut self, key: ResourceKey) -> Option<&mut Pose> {
        match self.entries.get_mut(key)?.data {
            ResourceData::Pose(ref mut p) => Some(p),
            _ => None,
        }
    }

    // ========================================================================
    // Built-ins
    // ========================================================================

    /// Fallback cube mesh assigned by `MeshRender` on compose.
    #[inline]
    #[must_use]
    pub fn builtin_cube(&self) -> ResourceKey {
        self.builtin_cube
    }

    /// Full-screen plane used by post-process passes.
    #[inline]
    #[must_use]
    pub fn builtin_plane(&self) -> ResourceKey {
        self.builtin_plane
    }

    /// Plain opaque material.
    #[inline]
    #[must_use]
    pub fn default_material(&self) -> ResourceKey {
        self.default_material
    }
}

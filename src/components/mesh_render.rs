//! MeshRender Component
//!
//! Draws a mesh with one material instance per submesh. Composes with the
//! built-in cube so a freshly added component is visible immediately; a
//! missing or non-ready mesh renders as absent.

use std::any::Any;

use glam::Vec4;

use crate::render::command_buffer::{CommandBuffer, id_to_color};
use crate::resources::{Aabb, MaterialInstance, ResourceCatalog, ResourceKey};
use crate::scene::{BoundsProvider, Component, ComponentContext, DrawArgs, Drawable, LayerMask};
use crate::variant::{self, VariantMap};

/// Mesh-drawing renderable.
#[derive(Debug, Default)]
pub struct MeshRender {
    mesh: Option<ResourceKey>,
    materials: Vec<MaterialInstance>,
}

impl MeshRender {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn mesh(&self) -> Option<ResourceKey> {
        self.mesh
    }

    /// Assigns the mesh to draw. When no materials are assigned yet, the
    /// submesh default materials are instantiated.
    pub fn set_mesh(&mut self, mesh: Option<ResourceKey>, catalog: &mut ResourceCatalog) {
        if let Some(old) = self.mesh.take() {
            catalog.release(old);
        }
        self.mesh = mesh;
        if let Some(key) = mesh {
            catalog.retain(key);
            if self.materials.is_empty() {
                let defaults: Vec<ResourceKey> = catalog
                    .mesh(key)
                    .map(|m| {
                        m.submeshes()
                            .iter()
                            .filter_map(|s| s.default_material)
                            .collect()
                    })
                    .unwrap_or_default();
                self.set_materials(defaults, catalog);
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn materials(&self) -> &[MaterialInstance] {
        &self.materials
    }

    #[must_use]
    pub fn material_mut(&mut self, index: usize) -> Option<&mut MaterialInstance> {
        self.materials.get_mut(index)
    }

    /// Replaces the material list, one entry per submesh.
    pub fn set_materials(&mut self, materials: Vec<ResourceKey>, catalog: &mut ResourceCatalog) {
        for instance in self.materials.drain(..) {
            catalog.release(instance.material());
        }
        for &key in &materials {
            catalog.retain(key);
        }
        self.materials = materials.into_iter().map(MaterialInstance::new).collect();
    }
}

impl Component for MeshRender {
    fn type_name(&self) -> &'static str {
        "MeshRender"
    }

    fn compose(&mut self, ctx: &mut ComponentContext<'_>) {
        // Default cube, so the component is visible before any assignment.
        let cube = ctx.catalog.builtin_cube();
        self.set_mesh(Some(cube), ctx.catalog);
    }

    fn teardown(&mut self, catalog: &mut ResourceCatalog) {
        if let Some(mesh) = self.mesh.take() {
            catalog.release(mesh);
        }
        for instance in self.materials.drain(..) {
            catalog.release(instance.material());
        }
    }

    fn load_user_data(&mut self, data: &VariantMap, ctx: &mut ComponentContext<'_>) {
        if let Some(path) = variant::get_reference(data, "Mesh") {
            match ctx.catalog.load(path) {
                Ok(key) => self.set_mesh(Some(key), ctx.catalog),
                Err(err) => log::warn!("MeshRender: {err}"),
            }
        }
        if let Some(list) = data.get("Materials").and_then(|v| v.as_array()) {
            let mut keys = Vec::new();
            for value in list {
                let Some(path) = value.as_str().filter(|p| !p.is_empty()) else {
                    continue;
                };
                match ctx.catalog.load(path) {
                    Ok(key) => keys.push(key),
                    Err(err) => log::warn!("MeshRender: {err}"),
                }
            }
            if !keys.is_empty() {
                self.set_materials(keys, ctx.catalog);
            }
        }
    }

    fn save_user_data(&self, catalog: &ResourceCatalog) -> VariantMap {
        let mut map = VariantMap::new();
        let mesh_path = self.mesh.map_or("", |key| catalog.reference(key));
        variant::put_reference(&mut map, "Mesh", mesh_path);
        let materials: Vec<serde_json::Value> = self
            .materials
            .iter()
            .map(|m| serde_json::Value::String(catalog.reference(m.material()).to_string()))
            .collect();
        map.insert("Materials".into(), serde_json::Value::Array(materials));
        map
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }

    fn as_bounds(&self) -> Option<&dyn BoundsProvider> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drawable for MeshRender {
    fn draw(&self, args: &DrawArgs<'_>, buffer: &mut dyn CommandBuffer, layer: LayerMask) {
        let Some(mesh_key) = self.mesh else {
            return;
        };
        if self.materials.is_empty() || !layer.intersects(args.actor.layers) {
            return;
        }
        // Non-ready resources render as absent.
        if !args.catalog.is_ready(mesh_key) {
            return;
        }
        let Some(mesh) = args.catalog.mesh(mesh_key) else {
            return;
        };

        if layer.contains(LayerMask::RAYCAST) {
            buffer.set_color(id_to_color(args.actor.id()));
        }
        buffer.set_object_id(args.actor.id());

        let world = args.actor.transform.world_matrix_as_mat4();
        let submeshes = mesh.submeshes().len().min(self.materials.len());
        for (index, instance) in self.materials.iter().take(submeshes).enumerate() {
            if !args.catalog.is_ready(instance.material()) {
                continue;
            }
            buffer.draw_mesh(world, mesh_key, index, layer, instance);
        }

        if layer.contains(LayerMask::RAYCAST) {
            buffer.set_color(Vec4::ONE);
        }
    }

    fn translucent(&self, args: &DrawArgs<'_>) -> bool {
        self.materials.iter().any(|instance| {
            args.catalog
                .material(instance.material())
                .is_some_and(crate::resources::Material::is_translucent)
        })
    }
}

impl BoundsProvider for MeshRender {
    fn world_bounds(&self, args: &DrawArgs<'_>) -> Option<Aabb> {
        let mesh = args.catalog.mesh(self.mesh?)?;
        let local = mesh.bounds();
        if !local.is_valid() {
            return None;
        }
        Some(local.transform(args.actor.transform.world_matrix()))
    }
}

//! Built-in Components
//!
//! Cameras, lights, mesh/particle renderables and the skinning armature.
//! Every type here registers a factory under its string type name so scenes
//! (and modules) can instantiate them dynamically.

pub mod armature;
pub mod camera;
pub mod light;
pub mod mesh_render;
pub mod particle_render;

pub use armature::{Armature, MAX_BONES, pack_bone_matrix, unpack_bone_matrix};
pub use camera::{Camera, Frustum};
pub use light::{Light, LightKind};
pub use mesh_render::MeshRender;
pub use particle_render::ParticleRender;

use crate::scene::{Component, ComponentRegistry};
use glam::Vec3;

/// Registers factories for every built-in component type.
pub fn register_builtins(registry: &mut ComponentRegistry) {
    registry.register("Camera", || Box::new(Camera::default()) as Box<dyn Component>);
    registry.register("MeshRender", || {
        Box::new(MeshRender::new()) as Box<dyn Component>
    });
    registry.register("ParticleRender", || {
        Box::new(ParticleRender::new()) as Box<dyn Component>
    });
    registry.register("Armature", || Box::new(Armature::new()) as Box<dyn Component>);
    registry.register("DirectionalLight", || {
        Box::new(Light::new_directional(Vec3::ONE, 1.0)) as Box<dyn Component>
    });
    registry.register("PointLight", || {
        Box::new(Light::new_point(Vec3::ONE, 1.0, 10.0)) as Box<dyn Component>
    });
    registry.register("SpotLight", || {
        Box::new(Light::new_spot(
            Vec3::ONE,
            1.0,
            10.0,
            0.4,
            0.5,
        )) as Box<dyn Component>
    });
}

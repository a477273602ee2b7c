//! Resource Layer
//!
//! CPU-side asset data plus the lifecycle machinery around it:
//! - Texture / RenderTarget: pixel surfaces and render attachments
//! - Mesh: geometry with a submesh table
//! - Material / MaterialInstance: shared recipes and per-object overrides
//! - ParticleEffect: emitter descriptions and modifier chains
//! - Pose: bind-pose skeletons for skinning
//! - ResourceCatalog: path resolution, states, observers, garbage collection
//!
//! Nothing here talks to a GPU; the backend realizes these descriptions
//! through the command-buffer boundary.

pub mod catalog;
pub mod material;
pub mod mesh;
pub mod particle_effect;
pub mod pose;
pub mod render_target;
pub mod resource;
pub mod texture;

pub use catalog::{ResourceCatalog, ResourceLoader};
pub use material::{BlendMode, Material, MaterialInstance, UniformValue};
pub use mesh::{Aabb, Mesh, SubMesh};
pub use particle_effect::{
    ParticleData, ParticleEffect, ParticleEmitter, ParticleModifier, RangeF, RangeV3, RangeV4,
};
pub use pose::{Bone, Pose};
pub use render_target::RenderTarget;
pub use resource::{ResourceData, ResourceKey, ResourceMeta, ResourceState};
pub use texture::{Compression, Filtering, PixelFormat, Surface, Texture, WrapMode};

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod components;
pub mod config;
pub mod engine;
pub mod errors;
pub mod module;
pub mod render;
pub mod resources;
pub mod scene;
pub mod system;
pub mod variant;

pub use components::{Armature, Camera, Frustum, Light, LightKind, MeshRender, ParticleRender};
pub use config::EngineSettings;
pub use engine::Engine;
pub use errors::{Result, TempestError};
pub use module::{Capabilities, Module};
pub use render::{
    Bloom, CommandBuffer, DrawSubmission, Pipeline, PostProcessSettings, PostProcessor,
    RecordingBuffer, RenderStats,
};
pub use resources::{
    Aabb, BlendMode, Material, MaterialInstance, Mesh, ParticleEffect, ParticleEmitter,
    ParticleModifier, PixelFormat, Pose, RenderTarget, ResourceCatalog, ResourceKey,
    ResourceLoader, ResourceState, Texture,
};
pub use scene::{Actor, ActorKey, Component, ComponentKey, ComponentRegistry, LayerMask, Scene};
pub use system::{BehaviorSystem, RenderSystem, System, ThreadPolicy};

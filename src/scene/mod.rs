//! Scene Graph & Component Model
//!
//! Actors form the hierarchy; components carry behavior. Both live in
//! generational arenas, so every cross-reference in the engine is a handle
//! that fails a lookup instead of dangling.

pub mod actor;
pub mod component;
pub mod scene;
pub mod transform;

pub use actor::{Actor, ActorKey, LayerMask};
pub use component::{
    BoundsProvider, CameraContext, Component, ComponentContext, ComponentFactory, ComponentKey,
    ComponentRegistry, ComponentSlot, DrawArgs, Drawable,
};
pub use scene::Scene;
pub use transform::Transform;

//! Actor
//!
//! The scene-graph node: a named container of components with exactly one
//! embedded [`Transform`]. Hierarchy links are arena handles; the scene keeps
//! parent pointers and child lists mutually consistent.

use std::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;
use slotmap::new_key_type;
use smallvec::SmallVec;

use super::component::ComponentKey;
use super::transform::Transform;

new_key_type! {
    /// Generational handle to an actor.
    pub struct ActorKey;
}

bitflags! {
    /// Render-pass visibility mask. A camera pass draws an actor only when
    /// the pass mask intersects the actor's layers.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LayerMask: u32 {
        const DEFAULT     = 1 << 0;
        const RAYCAST     = 1 << 1;
        const SHADOW_CAST = 1 << 2;
        const TRANSLUCENT = 1 << 3;
        const UI          = 1 << 4;
        const GIZMO       = 1 << 5;
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::DEFAULT | LayerMask::RAYCAST | LayerMask::SHADOW_CAST | LayerMask::TRANSLUCENT
    }
}

static NEXT_ACTOR_ID: AtomicU32 = AtomicU32::new(1);

/// Scene-graph node owning components and one transform.
#[derive(Debug)]
pub struct Actor {
    id: u32,
    pub name: String,
    pub enabled: bool,
    pub layers: LayerMask,
    pub transform: Transform,

    pub(crate) parent: Option<ActorKey>,
    pub(crate) children: Vec<ActorKey>,
    pub(crate) components: SmallVec<[ComponentKey; 4]>,
}

impl Actor {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            enabled: true,
            layers: LayerMask::default(),
            transform: Transform::new(),
            parent: None,
            children: Vec::new(),
            components: SmallVec::new(),
        }
    }

    /// Process-unique 32-bit runtime id, used for picking.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<ActorKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[ActorKey] {
        &self.children
    }

    /// Component handles in registration order.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &[ComponentKey] {
        &self.components
    }
}

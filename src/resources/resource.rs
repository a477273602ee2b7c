//! Resource Lifecycle Core
//!
//! Every catalog entry pairs lifecycle metadata with one tagged payload.
//! State transitions drive the observer machinery in the catalog; renderable
//! components treat anything that is not `Ready` as "skip this submission".

use slotmap::new_key_type;
use uuid::Uuid;

use super::material::Material;
use super::mesh::Mesh;
use super::particle_effect::ParticleEffect;
use super::pose::Pose;
use super::render_target::RenderTarget;
use super::texture::Texture;

new_key_type! {
    /// Generational handle to a catalog entry. Stale handles resolve to
    /// `None` instead of dangling.
    pub struct ResourceKey;
}

/// Lifecycle state of a resource.
///
/// For a single load attempt the progression is monotonic:
/// `Loading -> Ready` or `Loading -> Suspend`. `Ready -> Loading` happens
/// only through an explicit reload request. `ToBeDeleted` and `Unloading`
/// belong to the teardown path driven by reference counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// Backend storage is being released; the slot is about to be freed.
    Unloading,
    /// Created, data not yet usable.
    Loading,
    /// Upload finished; the resource may be drawn.
    Ready,
    /// Load or upload failed; the resource must not be drawn.
    Suspend,
    /// Unreferenced and queued for garbage collection.
    ToBeDeleted,
}

/// Lifecycle metadata shared by every resource kind.
#[derive(Debug, Clone)]
pub struct ResourceMeta {
    pub uuid: Uuid,
    /// Loader path this entry resolves from; empty for anonymous resources.
    pub path: String,
    pub(crate) state: ResourceState,
    /// Number of live retains. The last release queues deletion.
    pub(crate) refs: u32,
}

impl ResourceMeta {
    pub(crate) fn new(path: &str, state: ResourceState) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            path: path.to_string(),
            state,
            refs: 1,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> ResourceState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn ref_count(&self) -> u32 {
        self.refs
    }
}

/// Tagged resource payload.
#[derive(Debug, Clone)]
pub enum ResourceData {
    Texture(Texture),
    RenderTarget(RenderTarget),
    Mesh(Mesh),
    Material(Material),
    ParticleEffect(ParticleEffect),
    Pose(Pose),
}

impl ResourceData {
    /// Stable kind name for diagnostics and kind-mismatch errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceData::Texture(_) => "Texture",
            ResourceData::RenderTarget(_) => "RenderTarget",
            ResourceData::Mesh(_) => "Mesh",
            ResourceData::Material(_) => "Material",
            ResourceData::ParticleEffect(_) => "ParticleEffect",
            ResourceData::Pose(_) => "Pose",
        }
    }
}

/// One catalog slot.
#[derive(Debug)]
pub struct ResourceEntry {
    pub meta: ResourceMeta,
    pub data: ResourceData,
}

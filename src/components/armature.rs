//! Armature Component
//!
//! Maps live scene transforms to bind-pose bones and caches the combined
//! `world * inverse_bind` matrices into a data texture consumed by GPU
//! skinning shaders.
//!
//! Matrices are packed to 48 bytes: the fourth column is dropped and the
//! translation overwrites the fourth row of the remaining three columns.
//! A 512x1 RGBA32Float texture therefore holds up to 170 bones.
//!
//! Bone resolution is lazy: `set_bind_pose` (and reparenting) only mark the
//! mapping dirty; the next update re-matches descendant transforms against
//! bone correlation indices. A bone with no matching transform keeps its
//! previous (identity) cache slot — visibly unskinned, but not an error.

use std::any::Any;

use glam::{Mat4, Vec4};
use slotmap::SlotMap;

use crate::resources::{PixelFormat, ResourceCatalog, ResourceKey, ResourceState, Texture};
use crate::scene::{
    Actor, ActorKey, Component, ComponentContext, ComponentKey,
};
use crate::variant::{self, VariantMap};

/// Bone capacity of the cache texture: 512 * 16 bytes per texel / 48 bytes
/// per packed matrix.
pub const MAX_BONES: usize = 170;

/// Packed matrix stride in floats (48 bytes).
pub const PACKED_FLOATS: usize = 12;

const CACHE_WIDTH: u32 = 512;

/// Packs an affine matrix into 12 floats: columns 0-2 with the translation
/// folded into each column's fourth row.
#[must_use]
pub fn pack_bone_matrix(matrix: &Mat4) -> [f32; PACKED_FLOATS] {
    let cols = matrix.to_cols_array();
    let mut packed = [0.0f32; PACKED_FLOATS];
    packed.copy_from_slice(&cols[..PACKED_FLOATS]);
    packed[3] = cols[12];
    packed[7] = cols[13];
    packed[11] = cols[14];
    packed
}

/// Reconstructs the affine matrix from its packed form. The bottom row is
/// restored to `(0, 0, 0, 1)`, which is exact for affine inputs.
#[must_use]
pub fn unpack_bone_matrix(packed: &[f32; PACKED_FLOATS]) -> Mat4 {
    let mut cols = [0.0f32; 16];
    cols[..PACKED_FLOATS].copy_from_slice(packed);
    cols[3] = 0.0;
    cols[7] = 0.0;
    cols[11] = 0.0;
    cols[12] = packed[3];
    cols[13] = packed[7];
    cols[14] = packed[11];
    cols[15] = 1.0;
    Mat4::from_cols_array(&cols)
}

/// Bone management component: resolves a bind pose against live transforms
/// and maintains the skinning cache texture.
pub struct Armature {
    pose: Option<ResourceKey>,
    cache: Option<ResourceKey>,
    bones: Vec<Option<ActorKey>>,
    inverse_bind: Vec<Mat4>,
    bind_dirty: bool,
    observer: Option<ComponentKey>,
    /// Editor gizmo tint, persisted with the component.
    pub bone_color: Vec4,
}

impl Default for Armature {
    fn default() -> Self {
        Self::new()
    }
}

impl Armature {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pose: None,
            cache: None,
            bones: Vec::new(),
            inverse_bind: Vec::new(),
            bind_dirty: false,
            observer: None,
            bone_color: Vec4::new(0.0, 1.0, 0.0, 0.1),
        }
    }

    #[inline]
    #[must_use]
    pub fn bind_pose(&self) -> Option<ResourceKey> {
        self.pose
    }

    /// The skinning cache texture, allocated on compose.
    #[inline]
    #[must_use]
    pub fn cache_texture(&self) -> Option<ResourceKey> {
        self.cache
    }

    /// Number of resolved bone slots.
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Sets the bind pose and marks the transform mapping dirty; the actual
    /// re-resolve happens lazily on the next update.
    pub fn set_bind_pose(
        &mut self,
        pose: Option<ResourceKey>,
        this: ComponentKey,
        catalog: &mut ResourceCatalog,
    ) {
        if self.pose == pose {
            return;
        }
        if let Some(old) = self.pose.take() {
            catalog.unsubscribe(old, this);
            catalog.release(old);
        }
        self.observer = Some(this);
        self.pose = pose;
        self.bind_dirty = true;
        if let Some(key) = pose {
            catalog.retain(key);
            catalog.subscribe(key, this);
        }
    }

    fn resolve(&mut self, ctx: &mut ComponentContext<'_>) {
        let Some(pose_key) = self.pose else {
            self.bones.clear();
            self.inverse_bind.clear();
            self.bind_dirty = false;
            return;
        };
        // Keep the dirty flag until the pose is actually usable.
        if !ctx.catalog.is_ready(pose_key) {
            return;
        }
        let Some(pose) = ctx.catalog.pose(pose_key) else {
            return;
        };

        let count = pose.bone_count().min(MAX_BONES);
        if pose.bone_count() > MAX_BONES {
            log::warn!(
                "armature: pose has {} bones, cache holds {MAX_BONES}",
                pose.bone_count()
            );
        }

        let mut descendants = Vec::new();
        collect_descendants(ctx.actors, ctx.actor, &mut descendants);

        self.bones = vec![None; count];
        self.inverse_bind = vec![Mat4::IDENTITY; count];
        for slot in 0..count {
            let Some(bone) = pose.bone(slot) else {
                continue;
            };
            for &key in &descendants {
                let Some(actor) = ctx.actors.get(key) else {
                    continue;
                };
                if actor.transform.cloned_from == Some(bone.index) {
                    self.bones[slot] = Some(key);
                    self.inverse_bind[slot] = bone.inverse_bind_matrix();
                    break;
                }
            }
        }
        self.bind_dirty = false;
    }
}

fn collect_descendants(actors: &SlotMap<ActorKey, Actor>, root: ActorKey, out: &mut Vec<ActorKey>) {
    let mut stack: Vec<ActorKey> = actors
        .get(root)
        .map(|a| a.children().to_vec())
        .unwrap_or_default();
    while let Some(key) = stack.pop() {
        if let Some(actor) = actors.get(key) {
            out.push(key);
            stack.extend(actor.children().iter().copied());
        }
    }
}

impl Component for Armature {
    fn type_name(&self) -> &'static str {
        "Armature"
    }

    fn compose(&mut self, ctx: &mut ComponentContext<'_>) {
        let mut texture = Texture::new_2d(CACHE_WIDTH, 1, PixelFormat::Rgba32Float);
        let identity: [f32; PACKED_FLOATS] = pack_bone_matrix(&Mat4::IDENTITY);
        let bytes: &[u8] = bytemuck::cast_slice(identity.as_slice());
        if let Some(mip) = texture.surface_mut(0).and_then(|s| s.get_mut(0)) {
            for slot in 0..MAX_BONES {
                let offset = slot * PACKED_FLOATS * 4;
                mip[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
        }
        texture.set_dirty();
        self.cache = Some(ctx.catalog.add_texture(texture));
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        if self.bind_dirty {
            self.resolve(ctx);
        }
        let Some(cache_key) = self.cache else {
            return;
        };

        let mut packed: Vec<(usize, [f32; PACKED_FLOATS])> = Vec::new();
        for (slot, bone) in self.bones.iter().enumerate() {
            let Some(key) = bone else {
                continue;
            };
            let Some(actor) = ctx.actors.get(*key) else {
                continue;
            };
            let joint = actor.transform.world_matrix_as_mat4() * self.inverse_bind[slot];
            packed.push((slot, pack_bone_matrix(&joint)));
        }
        if packed.is_empty() {
            return;
        }

        if let Some(texture) = ctx.catalog.texture_mut(cache_key) {
            if let Some(mip) = texture.surface_mut(0).and_then(|s| s.get_mut(0)) {
                for (slot, data) in &packed {
                    let offset = slot * PACKED_FLOATS * 4;
                    let bytes: &[u8] = bytemuck::cast_slice(data.as_slice());
                    mip[offset..offset + bytes.len()].copy_from_slice(bytes);
                }
            }
            texture.set_dirty();
        }
    }

    fn parent_changed(&mut self, _ctx: &mut ComponentContext<'_>) {
        // The descendant set changed; re-match bones lazily.
        self.bind_dirty = true;
    }

    fn resource_updated(
        &mut self,
        resource: ResourceKey,
        state: ResourceState,
        _catalog: &ResourceCatalog,
    ) {
        if Some(resource) == self.pose && state == ResourceState::Ready {
            self.bind_dirty = true;
        }
    }

    fn teardown(&mut self, catalog: &mut ResourceCatalog) {
        if let Some(pose) = self.pose.take() {
            if let Some(this) = self.observer.take() {
                catalog.unsubscribe(pose, this);
            }
            catalog.release(pose);
        }
        if let Some(cache) = self.cache.take() {
            catalog.release(cache);
        }
    }

    fn load_user_data(&mut self, data: &VariantMap, ctx: &mut ComponentContext<'_>) {
        if let Some(path) = variant::get_reference(data, "Pose") {
            match ctx.catalog.load(path) {
                Ok(key) => self.set_bind_pose(Some(key), ctx.this, ctx.catalog),
                Err(err) => log::warn!("Armature: {err}"),
            }
        }
        if let Some(color) = variant::get_vec4(data, "BoneColor") {
            self.bone_color = color;
        }
    }

    fn save_user_data(&self, catalog: &ResourceCatalog) -> VariantMap {
        let mut map = VariantMap::new();
        let path = self.pose.map_or("", |key| catalog.reference(key));
        variant::put_reference(&mut map, "Pose", path);
        map.insert("BoneColor".into(), variant::from_vec4(self.bone_color));
        map
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn pack_round_trips_affine_matrices() {
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 2.0, 0.5),
            Quat::from_rotation_y(0.7),
            Vec3::new(3.0, -1.0, 8.0),
        );
        let unpacked = unpack_bone_matrix(&pack_bone_matrix(&matrix));
        let a = matrix.to_cols_array();
        let b = unpacked.to_cols_array();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn cache_capacity_fits_the_texture() {
        // 170 packed matrices must fit a 512x1 RGBA32Float surface.
        assert!(MAX_BONES * PACKED_FLOATS * 4 <= (CACHE_WIDTH as usize) * 16);
    }
}

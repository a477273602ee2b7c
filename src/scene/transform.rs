//! Transform
//!
//! TRS placement with cached local/world matrices and a shadow-state dirty
//! check: the public `position`/`rotation`/`scale` fields are compared
//! against a private snapshot each update, so callers mutate freely without
//! remembering to flag anything.

use glam::{Affine3A, EulerRot, Mat4, Quat, Vec3};

/// Hierarchical placement of an actor.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    /// Bone-correlation index stamped when this transform was instantiated
    /// from a prefab; armatures match it against bind-pose bone indices.
    pub cloned_from: Option<u32>,

    // Cached matrices, world-space maintained by the hierarchy pass.
    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,

    // Shadow state for the dirty check.
    last_position: Vec3,
    last_rotation: Quat,
    last_scale: Vec3,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            cloned_from: None,
            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,
            last_position: Vec3::ZERO,
            last_rotation: Quat::IDENTITY,
            last_scale: Vec3::ONE,
            force_update: true,
        }
    }

    /// Recomputes the local matrix when the TRS changed since the last call.
    /// Returns whether a recompute happened.
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.position != self.last_position
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale
            || self.force_update;

        if changed {
            self.local_matrix = Affine3A::from_scale_rotation_translation(
                self.scale,
                self.rotation,
                self.position,
            );
            self.last_position = self.position;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }

        changed
    }

    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    /// World matrix widened for GPU upload.
    #[inline]
    #[must_use]
    pub fn world_matrix_as_mat4(&self) -> Mat4 {
        Mat4::from(self.world_matrix)
    }

    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        Vec3::from(self.world_matrix.translation)
    }

    /// Written by the hierarchy pass after combining with the parent chain.
    pub(crate) fn set_world_matrix(&mut self, matrix: Affine3A) {
        self.world_matrix = matrix;
    }

    /// Forces a recompute on the next hierarchy pass (used after reparenting).
    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirty_check_skips_unchanged_trs() {
        let mut t = Transform::new();
        assert!(t.update_local_matrix());
        assert!(!t.update_local_matrix());
        t.position.x = 2.0;
        assert!(t.update_local_matrix());
    }

    #[test]
    fn mark_dirty_forces_recompute() {
        let mut t = Transform::new();
        t.update_local_matrix();
        t.mark_dirty();
        assert!(t.update_local_matrix());
    }
}

//! Bind Pose Resource
//!
//! A [`Pose`] is the reference skeleton configuration used for skinning: an
//! ordered list of bones, each carrying its correlation index, parent index
//! and inverse-bind transform as TRS. The armature component matches live
//! scene transforms against these indices and combines each bone's world
//! matrix with its inverse-bind matrix every frame.

use glam::{Mat4, Quat, Vec3};

/// One bone of a bind pose.
#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    /// Correlation index matched against `Transform::cloned_from` of live
    /// scene transforms.
    pub index: u32,
    /// Parent bone index within the pose, `None` for the root.
    pub parent: Option<u32>,
    // Inverse-bind transform, stored as TRS.
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Bone {
    #[must_use]
    pub fn new(name: &str, index: u32, parent: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            index,
            parent,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Inverse-bind matrix assembled from the stored TRS.
    #[must_use]
    pub fn inverse_bind_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Ordered bone list; bone order matches the skinning palette order.
#[derive(Debug, Clone, Default)]
pub struct Pose {
    bones: Vec<Bone>,
}

impl Pose {
    #[must_use]
    pub fn new(bones: Vec<Bone>) -> Self {
        Self { bones }
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn add_bone(&mut self, bone: Bone) {
        self.bones.push(bone);
    }
}

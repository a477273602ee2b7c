//! Mesh Resource
//!
//! Geometry data plus its submesh table. A submesh is an index range drawn
//! with one material; renderable components issue one draw per submesh.

use glam::{Affine3A, Vec2, Vec3};

use super::resource::ResourceKey;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any encapsulated point will collapse onto.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grows the box to contain `point` padded by `radius` on every axis.
    pub fn encapsulate(&mut self, point: Vec3, radius: f32) {
        self.min = self.min.min(point - Vec3::splat(radius));
        self.max = self.max.max(point + Vec3::splat(radius));
    }

    #[must_use]
    pub fn inflate(&self, amount: f32) -> Aabb {
        Aabb {
            min: self.min - Vec3::splat(amount),
            max: self.max + Vec3::splat(amount),
        }
    }

    /// Transforms all eight corners and rebuilds an axis-aligned box.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Aabb {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for corner in corners {
            let p = matrix.transform_point3(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Aabb { min, max }
    }
}

/// One index range of a mesh, drawn with a single material.
#[derive(Debug, Clone)]
pub struct SubMesh {
    pub first_index: u32,
    pub index_count: u32,
    /// Material used when the renderable component assigns none.
    pub default_material: Option<ResourceKey>,
}

/// Geometry resource: shared vertex streams plus a submesh table.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,
    submeshes: Vec<SubMesh>,
    bounds: Aabb,
    dirty: bool,
}

impl Mesh {
    #[must_use]
    pub fn new(name: &str, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let count = indices.len() as u32;
        let mut mesh = Self {
            name: name.to_string(),
            positions,
            normals: Vec::new(),
            uvs: Vec::new(),
            indices,
            submeshes: vec![SubMesh {
                first_index: 0,
                index_count: count,
                default_material: None,
            }],
            bounds: Aabb::empty(),
            dirty: true,
        };
        mesh.recompute_bounds();
        mesh
    }

    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[inline]
    #[must_use]
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn set_normals(&mut self, normals: Vec<Vec3>) {
        self.normals = normals;
        self.dirty = true;
    }

    pub fn set_uvs(&mut self, uvs: Vec<Vec2>) {
        self.uvs = uvs;
        self.dirty = true;
    }

    #[inline]
    #[must_use]
    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    #[must_use]
    pub fn submesh(&self, index: usize) -> Option<&SubMesh> {
        self.submeshes.get(index)
    }

    pub fn set_submeshes(&mut self, submeshes: Vec<SubMesh>) {
        self.submeshes = submeshes;
        self.dirty = true;
    }

    pub fn set_default_material(&mut self, submesh: usize, material: Option<ResourceKey>) {
        if let Some(sub) = self.submeshes.get_mut(submesh) {
            sub.default_material = material;
        }
    }

    /// Triangles in one submesh.
    #[must_use]
    pub fn triangle_count(&self, submesh: usize) -> u32 {
        self.submeshes.get(submesh).map_or(0, |s| s.index_count / 3)
    }

    /// Local-space bounds of all positions.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn recompute_bounds(&mut self) {
        let mut bounds = Aabb::empty();
        for &p in &self.positions {
            bounds.encapsulate(p, 0.0);
        }
        self.bounds = bounds;
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    // ========================================================================
    // Built-in primitives
    // ========================================================================

    /// Unit plane in the XY plane, facing +Z. Used for full-screen passes.
    #[must_use]
    pub fn plane() -> Self {
        let positions = vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ];
        let mut mesh = Self::new("Plane", positions, vec![0, 1, 2, 0, 2, 3]);
        mesh.set_normals(vec![Vec3::Z; 4]);
        mesh.set_uvs(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]);
        mesh
    }

    /// Unit cube centered at the origin.
    #[must_use]
    pub fn cube() -> Self {
        let h = 0.5;
        let positions = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // -Z
            4, 5, 6, 4, 6, 7, // +Z
            0, 4, 7, 0, 7, 3, // -X
            1, 6, 5, 1, 2, 6, // +X
            0, 1, 5, 0, 5, 4, // -Y
            3, 6, 2, 3, 7, 6, // +Y
        ];
        Self::new("Cube", positions, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_positions() {
        let mesh = Mesh::cube();
        assert_eq!(mesh.bounds().min, Vec3::splat(-0.5));
        assert_eq!(mesh.bounds().max, Vec3::splat(0.5));
    }

    #[test]
    fn aabb_transform_stays_axis_aligned() {
        let aabb = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let moved = aabb.transform(&Affine3A::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        assert_eq!(moved.center(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(moved.size(), Vec3::splat(2.0));
    }

    #[test]
    fn default_submesh_spans_all_indices() {
        let mesh = Mesh::plane();
        assert_eq!(mesh.submeshes().len(), 1);
        assert_eq!(mesh.triangle_count(0), 2);
    }
}

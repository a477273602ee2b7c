//! Camera Component & Frustum
//!
//! The camera holds projection parameters only; its placement is the owning
//! actor's transform. Culling uses the eight frustum corners computed from
//! the projection parameters (perspective or orthographic), turned into six
//! inward-facing planes.

use std::any::Any;

use glam::{Affine3A, Mat4, Vec3, Vec4};
use serde_json::json;

use crate::resources::{Aabb, ResourceCatalog};
use crate::scene::{Component, ComponentContext, LayerMask};
use crate::variant::{self, VariantMap};

/// Six-plane view volume built from the camera's eight corners.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frustum {
    /// Inward-facing planes as `(normal, d)` with `n·p + d >= 0` inside.
    planes: [Vec4; 6],
}

impl Frustum {
    /// Builds the volume from eight corners ordered near `[tl, tr, br, bl]`
    /// then far `[tl, tr, br, bl]`.
    #[must_use]
    pub fn from_corners(corners: &[Vec3; 8]) -> Self {
        fn plane(a: Vec3, b: Vec3, c: Vec3) -> Vec4 {
            let normal = (b - a).cross(c - a).normalize_or_zero();
            normal.extend(-normal.dot(a))
        }

        let mut planes = [
            plane(corners[0], corners[1], corners[2]), // near
            plane(corners[4], corners[5], corners[6]), // far
            plane(corners[0], corners[3], corners[7]), // left
            plane(corners[1], corners[2], corners[6]), // right
            plane(corners[0], corners[1], corners[5]), // top
            plane(corners[3], corners[2], corners[6]), // bottom
        ];

        // Orient every plane toward the volume interior.
        let centroid = corners.iter().copied().sum::<Vec3>() / 8.0;
        for plane in &mut planes {
            if plane.dot(centroid.extend(1.0)) < 0.0 {
                *plane = -*plane;
            }
        }

        Self { planes }
    }

    /// Conservative box test: rejects only boxes fully outside one plane.
    #[must_use]
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            // Positive vertex: box corner furthest along the plane normal.
            let p = Vec3::new(
                if plane.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if plane.dot(p.extend(1.0)) < 0.0 {
                return false;
            }
        }
        true
    }

    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        for plane in &self.planes {
            if plane.dot(center.extend(1.0)) < -radius {
                return false;
            }
        }
        true
    }
}

/// Projection component; one per active viewpoint.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Vertical field of view, radians. Ignored for orthographic cameras.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub orthographic: bool,
    /// Vertical extent of the orthographic volume.
    pub ortho_size: f32,
    /// Actor layers this camera's passes render.
    pub layers: LayerMask,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(60.0, 1.0, 0.1, 1000.0)
    }
}

impl Camera {
    #[must_use]
    pub fn new_perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
            orthographic: false,
            ortho_size: 10.0,
            layers: LayerMask::default(),
        }
    }

    #[must_use]
    pub fn new_orthographic(size: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov: 60.0_f32.to_radians(),
            aspect,
            near,
            far,
            orthographic: true,
            ortho_size: size,
            layers: LayerMask::default(),
        }
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        if self.orthographic {
            let h = self.ortho_size * 0.5;
            let w = h * self.aspect;
            Mat4::orthographic_rh(-w, w, -h, h, self.near, self.far)
        } else {
            Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
        }
    }

    /// World-to-camera matrix from the owning actor's world transform.
    #[must_use]
    pub fn view_matrix(&self, world: &Affine3A) -> Mat4 {
        Mat4::from(*world).inverse()
    }

    /// The eight world-space frustum corners, near plane first, each plane
    /// ordered `[top-left, top-right, bottom-right, bottom-left]`.
    #[must_use]
    pub fn frustum_corners(&self, world: &Affine3A) -> [Vec3; 8] {
        let (nh, nw, fh, fw) = if self.orthographic {
            let h = self.ortho_size * 0.5;
            (h, h * self.aspect, h, h * self.aspect)
        } else {
            let tang = (self.fov * 0.5).tan();
            let nh = self.near * tang;
            let fh = self.far * tang;
            (nh, nh * self.aspect, fh, fh * self.aspect)
        };

        let local = [
            Vec3::new(-nw, nh, -self.near),
            Vec3::new(nw, nh, -self.near),
            Vec3::new(nw, -nh, -self.near),
            Vec3::new(-nw, -nh, -self.near),
            Vec3::new(-fw, fh, -self.far),
            Vec3::new(fw, fh, -self.far),
            Vec3::new(fw, -fh, -self.far),
            Vec3::new(-fw, -fh, -self.far),
        ];
        local.map(|p| world.transform_point3(p))
    }

    /// Culling volume in world space.
    #[must_use]
    pub fn frustum(&self, world: &Affine3A) -> Frustum {
        Frustum::from_corners(&self.frustum_corners(world))
    }
}

impl Component for Camera {
    fn type_name(&self) -> &'static str {
        "Camera"
    }

    fn load_user_data(&mut self, data: &VariantMap, _ctx: &mut ComponentContext<'_>) {
        if let Some(fov) = variant::get_f32(data, "Fov") {
            self.fov = fov.to_radians();
        }
        if let Some(near) = variant::get_f32(data, "Near") {
            self.near = near;
        }
        if let Some(far) = variant::get_f32(data, "Far") {
            self.far = far;
        }
        if let Some(ortho) = variant::get_bool(data, "Orthographic") {
            self.orthographic = ortho;
        }
        if let Some(size) = variant::get_f32(data, "OrthoSize") {
            self.ortho_size = size;
        }
    }

    fn save_user_data(&self, _catalog: &ResourceCatalog) -> VariantMap {
        let mut map = VariantMap::new();
        map.insert("Fov".into(), json!(self.fov.to_degrees()));
        map.insert("Near".into(), json!(self.near));
        map.insert("Far".into(), json!(self.far));
        map.insert("Orthographic".into(), json!(self.orthographic));
        map.insert("OrthoSize".into(), json!(self.ortho_size));
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

    #[test]
    fn frustum_contains_points_between_planes() {
        let camera = Camera::new_perspective(90.0, 1.0, 0.5, 100.0);
        let frustum = camera.frustum(&Affine3A::IDENTITY);

        // Straight ahead, inside.
        assert!(frustum.intersects_sphere(Vec3::new(0.0, 0.0, -10.0), 0.1));
        // Behind the camera.
        assert!(!frustum.intersects_sphere(Vec3::new(0.0, 0.0, 10.0), 0.1));
        // Past the far plane.
        assert!(!frustum.intersects_sphere(Vec3::new(0.0, 0.0, -200.0), 0.1));
    }

    #[test]
    fn orthographic_volume_is_a_box() {
        let camera = Camera::new_orthographic(10.0, 1.0, 0.0, 50.0);
        let frustum = camera.frustum(&Affine3A::IDENTITY);

        assert!(frustum.intersects_sphere(Vec3::new(4.0, 4.0, -25.0), 0.1));
        assert!(!frustum.intersects_sphere(Vec3::new(8.0, 0.0, -25.0), 0.1));
    }

    #[test]
    fn aabb_outside_one_plane_is_culled() {
        let camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
        let frustum = camera.frustum(&Affine3A::IDENTITY);

        let visible = Aabb {
            min: Vec3::new(-1.0, -1.0, -11.0),
            max: Vec3::new(1.0, 1.0, -9.0),
        };
        let hidden = Aabb {
            min: Vec3::new(-1.0, -1.0, 9.0),
            max: Vec3::new(1.0, 1.0, 11.0),
        };
        assert!(frustum.intersects_aabb(&visible));
        assert!(!frustum.intersects_aabb(&hidden));
    }
}

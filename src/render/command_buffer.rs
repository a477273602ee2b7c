//! Command Buffer
//!
//! Renderable components submit draws through the [`CommandBuffer`] contract;
//! the backend realizes it against a graphics device. The in-tree
//! [`RecordingBuffer`] realization records submissions and per-frame
//! counters — it is the reference backend the pipeline and the tests run
//! against, and the shape a GPU backend consumes for batched execution.
//!
//! Submissions are ephemeral: built and consumed within one frame, never
//! persisted.

use glam::{Mat4, Vec4};

use crate::resources::{MaterialInstance, ResourceKey};
use crate::scene::LayerMask;

/// Encodes a 32-bit object id into an RGBA color for picking passes.
#[must_use]
pub fn id_to_color(id: u32) -> Vec4 {
    Vec4::new(
        (id & 0xff) as f32 / 255.0,
        ((id >> 8) & 0xff) as f32 / 255.0,
        ((id >> 16) & 0xff) as f32 / 255.0,
        ((id >> 24) & 0xff) as f32 / 255.0,
    )
}

/// Decodes a picking color back into the object id.
#[must_use]
pub fn color_to_id(color: Vec4) -> u32 {
    let r = (color.x * 255.0).round() as u32;
    let g = (color.y * 255.0).round() as u32;
    let b = (color.z * 255.0).round() as u32;
    let a = (color.w * 255.0).round() as u32;
    r | (g << 8) | (b << 16) | (a << 24)
}

/// One recorded draw. Ephemeral per-frame data.
#[derive(Debug, Clone)]
pub struct DrawSubmission {
    pub transform: Mat4,
    pub mesh: ResourceKey,
    pub submesh: usize,
    pub layer: LayerMask,
    pub material: MaterialInstance,
    /// Owning actor id, for picking.
    pub object_id: u32,
    /// Flat color state at submission time (picking id encodes here).
    pub color: Vec4,
    /// Per-instance data for instanced draws; `None` for single draws.
    pub instances: Option<Vec<Mat4>>,
}

impl DrawSubmission {
    /// Instance count (1 for non-instanced submissions).
    #[must_use]
    pub fn instance_count(&self) -> u32 {
        self.instances.as_ref().map_or(1, |i| i.len() as u32)
    }
}

/// Backend draw contract consumed by the pipeline and by renderable
/// components. Realizations hold whatever device state they need; the core
/// only calls through this interface.
pub trait CommandBuffer {
    /// Binds the color/depth attachments subsequent draws render into.
    /// `None` means the default framebuffer.
    fn set_render_target(&mut self, color: Option<ResourceKey>, depth: Option<ResourceKey>);

    /// Submits one submesh draw.
    fn draw_mesh(
        &mut self,
        transform: Mat4,
        mesh: ResourceKey,
        submesh: usize,
        layer: LayerMask,
        material: &MaterialInstance,
    );

    /// Submits an instanced draw. Instance matrices may carry packed
    /// non-matrix payloads (particles do).
    fn draw_mesh_instanced(
        &mut self,
        instances: &[Mat4],
        mesh: ResourceKey,
        submesh: usize,
        layer: LayerMask,
        material: &MaterialInstance,
    );

    /// Sets the object id attached to subsequent submissions (picking).
    fn set_object_id(&mut self, id: u32);

    /// Sets the flat color attached to subsequent submissions.
    fn set_color(&mut self, color: Vec4);

    /// Draw calls issued since the last [`CommandBuffer::reset`].
    fn draw_call_count(&self) -> u32;

    /// Clears recorded per-frame state and counters.
    fn reset(&mut self);
}

/// Reference realization: records submissions instead of touching a device.
#[derive(Debug, Default)]
pub struct RecordingBuffer {
    submissions: Vec<DrawSubmission>,
    color_target: Option<ResourceKey>,
    depth_target: Option<ResourceKey>,
    object_id: u32,
    color: Vec4,
    draw_calls: u32,
}

impl RecordingBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            color: Vec4::ONE,
            ..Self::default()
        }
    }

    /// Submissions recorded since the last reset, in issue order.
    #[inline]
    #[must_use]
    pub fn submissions(&self) -> &[DrawSubmission] {
        &self.submissions
    }

    /// Currently bound color attachment.
    #[inline]
    #[must_use]
    pub fn color_target(&self) -> Option<ResourceKey> {
        self.color_target
    }

    /// Currently bound depth attachment.
    #[inline]
    #[must_use]
    pub fn depth_target(&self) -> Option<ResourceKey> {
        self.depth_target
    }
}

impl CommandBuffer for RecordingBuffer {
    fn set_render_target(&mut self, color: Option<ResourceKey>, depth: Option<ResourceKey>) {
        self.color_target = color;
        self.depth_target = depth;
    }

    fn draw_mesh(
        &mut self,
        transform: Mat4,
        mesh: ResourceKey,
        submesh: usize,
        layer: LayerMask,
        material: &MaterialInstance,
    ) {
        self.submissions.push(DrawSubmission {
            transform,
            mesh,
            submesh,
            layer,
            material: material.clone(),
            object_id: self.object_id,
            color: self.color,
            instances: None,
        });
        self.draw_calls += 1;
    }

    fn draw_mesh_instanced(
        &mut self,
        instances: &[Mat4],
        mesh: ResourceKey,
        submesh: usize,
        layer: LayerMask,
        material: &MaterialInstance,
    ) {
        self.submissions.push(DrawSubmission {
            transform: Mat4::IDENTITY,
            mesh,
            submesh,
            layer,
            material: material.clone(),
            object_id: self.object_id,
            color: self.color,
            instances: Some(instances.to_vec()),
        });
        self.draw_calls += 1;
    }

    fn set_object_id(&mut self, id: u32) {
        self.object_id = id;
    }

    fn set_color(&mut self, color: Vec4) {
        self.color = color;
    }

    fn draw_call_count(&self) -> u32 {
        self.draw_calls
    }

    fn reset(&mut self) {
        self.submissions.clear();
        self.color_target = None;
        self.depth_target = None;
        self.object_id = 0;
        self.color = Vec4::ONE;
        self.draw_calls = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picking_color_round_trip() {
        for id in [0u32, 1, 255, 256, 0x00ff_ffff, 0xdead_beef] {
            assert_eq!(color_to_id(id_to_color(id)), id);
        }
    }

    #[test]
    fn recording_counts_draw_calls() {
        let mut buffer = RecordingBuffer::new();
        let material = MaterialInstance::new(ResourceKey::default());
        buffer.draw_mesh(
            Mat4::IDENTITY,
            ResourceKey::default(),
            0,
            LayerMask::DEFAULT,
            &material,
        );
        buffer.draw_mesh_instanced(
            &[Mat4::IDENTITY; 3],
            ResourceKey::default(),
            0,
            LayerMask::TRANSLUCENT,
            &material,
        );
        assert_eq!(buffer.draw_call_count(), 2);
        assert_eq!(buffer.submissions()[1].instance_count(), 3);

        buffer.reset();
        assert_eq!(buffer.draw_call_count(), 0);
        assert!(buffer.submissions().is_empty());
    }
}

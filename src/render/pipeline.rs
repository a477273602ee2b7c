//! Render Pipeline
//!
//! Per-camera frame orchestration:
//!
//! 1. `analyze_scene` walks enabled actors whose layers intersect the camera
//!    mask, frustum-culls drawables against the camera's eight-corner volume
//!    and records the survivors.
//! 2. `draw` submits opaque survivors in traversal order, then translucent
//!    survivors sorted back-to-front by camera-space depth (stable on ties:
//!    blending correctness needs the order, opaque does not).
//! 3. The post-process chain folds the scene target through each enabled
//!    processor, outputs chaining to inputs.
//! 4. `finish` publishes and resets the per-frame counters.
//!
//! With no current camera the pipeline does no work for the frame.

use glam::{Mat4, Vec4};

use crate::components::Camera;
use crate::resources::{
    MaterialInstance, PixelFormat, RenderTarget, ResourceCatalog, ResourceKey,
};
use crate::scene::{ActorKey, ComponentKey, DrawArgs, LayerMask, Scene};

use super::command_buffer::CommandBuffer;
use super::postprocess::{PostProcessSettings, PostProcessor};

/// Per-frame profiling counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub draw_calls: u32,
    pub triangles: u32,
    /// Drawables that survived layer filtering and culling.
    pub visible_objects: u32,
}

/// One culled drawable awaiting submission.
#[derive(Debug, Clone, Copy)]
struct CulledDraw {
    component: ComponentKey,
    /// Camera-space depth of the bounds center (positive in front).
    depth: f32,
}

/// Pass-through decorator that resolves triangle counts while forwarding
/// submissions to the real backend.
struct CountingBuffer<'a> {
    inner: &'a mut dyn CommandBuffer,
    catalog: &'a ResourceCatalog,
    triangles: u32,
}

impl CommandBuffer for CountingBuffer<'_> {
    fn set_render_target(&mut self, color: Option<ResourceKey>, depth: Option<ResourceKey>) {
        self.inner.set_render_target(color, depth);
    }

    fn draw_mesh(
        &mut self,
        transform: Mat4,
        mesh: ResourceKey,
        submesh: usize,
        layer: LayerMask,
        material: &MaterialInstance,
    ) {
        if let Some(mesh_data) = self.catalog.mesh(mesh) {
            self.triangles += mesh_data.triangle_count(submesh);
        }
        self.inner.draw_mesh(transform, mesh, submesh, layer, material);
    }

    fn draw_mesh_instanced(
        &mut self,
        instances: &[Mat4],
        mesh: ResourceKey,
        submesh: usize,
        layer: LayerMask,
        material: &MaterialInstance,
    ) {
        if let Some(mesh_data) = self.catalog.mesh(mesh) {
            self.triangles += mesh_data.triangle_count(submesh) * instances.len() as u32;
        }
        self.inner
            .draw_mesh_instanced(instances, mesh, submesh, layer, material);
    }

    fn set_object_id(&mut self, id: u32) {
        self.inner.set_object_id(id);
    }

    fn set_color(&mut self, color: Vec4) {
        self.inner.set_color(color);
    }

    fn draw_call_count(&self) -> u32 {
        self.inner.draw_call_count()
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

/// Per-camera frame orchestrator.
pub struct Pipeline {
    width: u32,
    height: u32,
    color_target: ResourceKey,
    depth_target: ResourceKey,
    postprocessors: Vec<Box<dyn PostProcessor>>,
    opaque: Vec<CulledDraw>,
    translucent: Vec<CulledDraw>,
    camera_actor: Option<ActorKey>,
    final_target: ResourceKey,
    stats: RenderStats,
    last_stats: RenderStats,
}

impl Pipeline {
    pub fn new(catalog: &mut ResourceCatalog, width: u32, height: u32) -> Self {
        let mut color = RenderTarget::new(width, height, PixelFormat::Rgba16Float);
        color.depth = true;
        let color_target = catalog.add_render_target(color);
        let depth_target =
            catalog.add_render_target(RenderTarget::new(width, height, PixelFormat::Depth));
        Self {
            width,
            height,
            color_target,
            depth_target,
            postprocessors: Vec::new(),
            opaque: Vec::new(),
            translucent: Vec::new(),
            camera_actor: None,
            final_target: color_target,
            stats: RenderStats::default(),
            last_stats: RenderStats::default(),
        }
    }

    /// Appends a stage to the post-process chain.
    pub fn add_postprocessor(&mut self, processor: Box<dyn PostProcessor>) {
        self.postprocessors.push(processor);
    }

    #[must_use]
    pub fn postprocessor(&self, name: &str) -> Option<&dyn PostProcessor> {
        self.postprocessors
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    pub fn postprocessor_mut(&mut self, name: &str) -> Option<&mut Box<dyn PostProcessor>> {
        self.postprocessors.iter_mut().find(|p| p.name() == name)
    }

    pub fn apply_settings(&mut self, settings: &PostProcessSettings) {
        for processor in &mut self.postprocessors {
            processor.apply_settings(settings);
        }
    }

    /// Base scene color target.
    #[must_use]
    pub fn color_target(&self) -> ResourceKey {
        self.color_target
    }

    /// Output of the last completed frame (post-process applied).
    #[must_use]
    pub fn final_target(&self) -> ResourceKey {
        self.final_target
    }

    /// Counters of the last finished frame.
    #[must_use]
    pub fn stats(&self) -> RenderStats {
        self.last_stats
    }

    pub fn resize(&mut self, width: u32, height: u32, catalog: &mut ResourceCatalog) {
        self.width = width;
        self.height = height;
        if let Some(target) = catalog.render_target_mut(self.color_target) {
            target.resize(width, height);
        }
        if let Some(target) = catalog.render_target_mut(self.depth_target) {
            target.resize(width, height);
        }
        for processor in &mut self.postprocessors {
            processor.resize(width, height, catalog);
        }
    }

    // ========================================================================
    // Frame phases
    // ========================================================================

    /// Collects drawables visible to the camera: enabled, layer-intersecting
    /// and inside the eight-corner frustum. Drawables without bounds are
    /// never culled.
    pub fn analyze_scene(
        &mut self,
        scene: &Scene,
        catalog: &ResourceCatalog,
        camera_actor: ActorKey,
    ) {
        self.opaque.clear();
        self.translucent.clear();
        self.camera_actor = None;

        let Some(camera) = scene.find_component::<Camera>(camera_actor) else {
            return;
        };
        let Some(cam_node) = scene.actor(camera_actor) else {
            return;
        };
        let world = *cam_node.transform.world_matrix();
        let frustum = camera.frustum(&world);
        let view = camera.view_matrix(&world);
        let camera_layers = camera.layers;
        self.camera_actor = Some(camera_actor);

        for actor_key in scene.traversal_order() {
            let Some(actor) = scene.actor(actor_key) else {
                continue;
            };
            if !actor.layers.intersects(camera_layers) {
                continue;
            }
            for &component_key in actor.components() {
                let Some(slot) = scene.component(component_key) else {
                    continue;
                };
                if !slot.enabled {
                    continue;
                }
                let Some(drawable) = slot.component.as_drawable() else {
                    continue;
                };
                let args = DrawArgs { actor, catalog };

                let anchor = match slot.component.as_bounds().and_then(|b| b.world_bounds(&args)) {
                    Some(bounds) => {
                        if !frustum.intersects_aabb(&bounds) {
                            continue;
                        }
                        bounds.center()
                    }
                    None => actor.transform.world_position(),
                };
                let depth = -view.transform_point3(anchor).z;

                let culled = CulledDraw {
                    component: component_key,
                    depth,
                };
                if drawable.translucent(&args) {
                    self.translucent.push(culled);
                } else {
                    self.opaque.push(culled);
                }
            }
        }

        self.stats.visible_objects = (self.opaque.len() + self.translucent.len()) as u32;
    }

    /// Executes the collected submissions and the post-process chain.
    /// Returns the frame's final target.
    pub fn draw(
        &mut self,
        scene: &Scene,
        catalog: &ResourceCatalog,
        buffer: &mut dyn CommandBuffer,
    ) -> ResourceKey {
        if self.camera_actor.is_none() {
            self.final_target = self.color_target;
            return self.final_target;
        }

        let mut counting = CountingBuffer {
            inner: &mut *buffer,
            catalog,
            triangles: 0,
        };

        counting.set_render_target(Some(self.color_target), Some(self.depth_target));

        // Opaque: traversal order (order is a performance detail only).
        for culled in &self.opaque {
            Self::submit(scene, catalog, &mut counting, culled.component, LayerMask::DEFAULT);
        }

        // Translucent: back-to-front, stable between equal depths, because
        // blending correctness depends on the order.
        self.translucent.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        for culled in &self.translucent {
            Self::submit(
                scene,
                catalog,
                &mut counting,
                culled.component,
                LayerMask::TRANSLUCENT,
            );
        }

        self.stats.triangles += counting.triangles;
        self.stats.draw_calls = counting.draw_call_count();

        // Post-process chain: outputs feed inputs; disabled stages return
        // their source untouched.
        let mut source = self.color_target;
        for processor in &mut self.postprocessors {
            source = processor.draw(source, catalog, buffer);
        }
        self.final_target = source;
        source
    }

    fn submit(
        scene: &Scene,
        catalog: &ResourceCatalog,
        buffer: &mut dyn CommandBuffer,
        component: ComponentKey,
        layer: LayerMask,
    ) {
        let Some(slot) = scene.component(component) else {
            return;
        };
        let Some(actor) = scene.actor(slot.actor) else {
            return;
        };
        let Some(drawable) = slot.component.as_drawable() else {
            return;
        };
        let args = DrawArgs { actor, catalog };
        drawable.draw(&args, buffer, layer);
    }

    /// Publishes the frame counters, then resets them and the buffer for the
    /// next frame.
    pub fn finish(&mut self, buffer: &mut dyn CommandBuffer) {
        self.stats.draw_calls = buffer.draw_call_count();
        self.last_stats = self.stats;
        self.stats = RenderStats::default();
        self.opaque.clear();
        self.translucent.clear();
        self.camera_actor = None;
        buffer.reset();
    }

    /// Sort depths of the translucent queue, for inspection in tests.
    #[must_use]
    pub fn translucent_depths(&self) -> Vec<f32> {
        self.translucent.iter().map(|c| c.depth).collect()
    }
}

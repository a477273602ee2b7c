//! Systems & Frame Scheduling
//!
//! A system owns one per-frame concern (behavior updates, rendering). The
//! engine drives registered systems in a fixed order once per tick; nothing
//! preempts a system mid-update, and no per-frame operation suspends.
//! Thread affinity is declarative: the driver honors it, the systems do not
//! enforce it.

use crate::errors::Result;
use crate::render::command_buffer::RecordingBuffer;
use crate::render::pipeline::{Pipeline, RenderStats};
use crate::render::postprocess::{Bloom, PostProcessSettings};
use crate::resources::{ResourceCatalog, ResourceKey};
use crate::scene::Scene;

/// Where a system's update is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPolicy {
    /// Must run on the thread owning the graphics context.
    Main,
    /// May run from any thread the driver chooses.
    Any,
}

/// One per-frame concern driven by the engine.
pub trait System {
    fn name(&self) -> &'static str;

    fn thread_policy(&self) -> ThreadPolicy {
        ThreadPolicy::Main
    }

    /// One-time initialization after registration.
    fn setup(&mut self, _scene: &mut Scene, _catalog: &mut ResourceCatalog) -> Result<()> {
        Ok(())
    }

    /// One frame of work. `dt` is in seconds.
    fn update(&mut self, scene: &mut Scene, catalog: &mut ResourceCatalog, dt: f32);
}

// ============================================================================
// BehaviorSystem
// ============================================================================

/// Runs the transform hierarchy and every component's `update`.
#[derive(Default)]
pub struct BehaviorSystem;

impl BehaviorSystem {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl System for BehaviorSystem {
    fn name(&self) -> &'static str {
        "Behavior"
    }

    fn thread_policy(&self) -> ThreadPolicy {
        ThreadPolicy::Any
    }

    fn update(&mut self, scene: &mut Scene, catalog: &mut ResourceCatalog, dt: f32) {
        scene.update_transforms();
        scene.update_components(catalog, dt);
    }
}

// ============================================================================
// RenderSystem
// ============================================================================

/// Owns the pipeline and the command buffer; renders the active camera's
/// view each frame. A frame without a current camera performs no rendering
/// work (not an error).
pub struct RenderSystem {
    pipeline: Pipeline,
    buffer: RecordingBuffer,
}

impl RenderSystem {
    /// Builds the pipeline with the default post-process chain.
    pub fn new(catalog: &mut ResourceCatalog, width: u32, height: u32) -> Self {
        let mut pipeline = Pipeline::new(catalog, width, height);
        pipeline.add_postprocessor(Box::new(Bloom::new(catalog, width, height)));
        Self {
            pipeline,
            buffer: RecordingBuffer::new(),
        }
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// The reference command buffer (recorded submissions of the frame in
    /// flight; cleared by `finish`).
    #[must_use]
    pub fn buffer(&self) -> &RecordingBuffer {
        &self.buffer
    }

    /// Counters of the last finished frame.
    #[must_use]
    pub fn stats(&self) -> RenderStats {
        self.pipeline.stats()
    }

    /// Final target of the last frame (what presentation samples).
    #[must_use]
    pub fn final_target(&self) -> ResourceKey {
        self.pipeline.final_target()
    }

    pub fn resize(&mut self, width: u32, height: u32, catalog: &mut ResourceCatalog) {
        self.pipeline.resize(width, height, catalog);
    }

    pub fn apply_settings(&mut self, settings: &PostProcessSettings) {
        self.pipeline.apply_settings(settings);
    }

    /// Renders one frame: analyze, draw, post-process, finish. Returns the
    /// presented target, or `None` when no camera is active.
    pub fn render_frame(&mut self, scene: &Scene, catalog: &ResourceCatalog) -> Option<ResourceKey> {
        let camera_actor = scene.active_camera?;
        scene.find_component::<crate::components::Camera>(camera_actor)?;

        self.pipeline.analyze_scene(scene, catalog, camera_actor);
        let target = self.pipeline.draw(scene, catalog, &mut self.buffer);
        self.pipeline.finish(&mut self.buffer);
        Some(target)
    }
}

impl System for RenderSystem {
    fn name(&self) -> &'static str {
        "Render"
    }

    fn thread_policy(&self) -> ThreadPolicy {
        ThreadPolicy::Main
    }

    fn update(&mut self, scene: &mut Scene, catalog: &mut ResourceCatalog, _dt: f32) {
        // Transforms may have moved during behavior updates.
        scene.update_transforms();
        self.render_frame(scene, catalog);
    }
}

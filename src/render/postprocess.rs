//! Post-Process Chain
//!
//! Ordered full-screen passes applied after the base scene render. Each
//! processor either passes its source through unchanged (disabled or missing
//! resources: the *same* target handle comes back, not a copy) or renders
//! into its own result target and returns that as the next stage's source.

use glam::{Mat4, Vec2};

use crate::resources::{
    BlendMode, Material, MaterialInstance, PixelFormat, RenderTarget, ResourceCatalog, ResourceKey,
};
use crate::scene::LayerMask;

use super::command_buffer::CommandBuffer;

/// Settings slice consumed by the built-in processors.
#[derive(Debug, Clone)]
pub struct PostProcessSettings {
    pub bloom_enabled: bool,
    /// Luminance threshold above which pixels bleed into the bloom chain.
    pub bloom_threshold: f32,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self {
            bloom_enabled: false,
            bloom_threshold: 1.0,
        }
    }
}

/// One stage of the post-process chain.
pub trait PostProcessor {
    fn name(&self) -> &'static str;

    fn enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Transforms `source` into this processor's result target, or returns
    /// `source` unchanged when the stage cannot (or should not) run.
    fn draw(
        &mut self,
        source: ResourceKey,
        catalog: &ResourceCatalog,
        buffer: &mut dyn CommandBuffer,
    ) -> ResourceKey;

    /// Tracks the pipeline's target extent.
    fn resize(&mut self, width: u32, height: u32, catalog: &mut ResourceCatalog);

    fn apply_settings(&mut self, _settings: &PostProcessSettings) {}
}

// ============================================================================
// Gaussian blur kernel
// ============================================================================

/// Upper bound on one-sided blur taps.
pub const MAX_BLUR_SAMPLES: usize = 32;

/// One-sided normalized Gaussian weights for a blur of the given pixel
/// radius. Index 0 is the center tap; the remaining taps are mirrored by the
/// shader, so `w[0] + 2 * sum(w[1..])` is 1.
#[must_use]
pub fn gaussian_kernel(radius: f32) -> Vec<f32> {
    let steps = (radius.ceil() as usize).clamp(1, MAX_BLUR_SAMPLES);
    let sigma = (radius / 3.0).max(0.5);

    let mut weights: Vec<f32> = (0..steps)
        .map(|i| (-0.5 * (i as f32 / sigma).powi(2)).exp())
        .collect();

    let sum: f32 = weights[0] + 2.0 * weights[1..].iter().sum::<f32>();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

// ============================================================================
// Bloom
// ============================================================================

const BLOOM_PASSES: usize = 5;

struct BloomPass {
    target: ResourceKey,
    blur_points: Vec<f32>,
    blur_size: Vec2,
}

/// Threshold bloom: bright pixels cascade through progressively downsampled
/// blurred targets that are composited additively over the source.
pub struct Bloom {
    enabled: bool,
    threshold: f32,
    material: MaterialInstance,
    passes: Vec<BloomPass>,
    result: ResourceKey,
    plane: ResourceKey,
}

impl Bloom {
    pub fn new(catalog: &mut ResourceCatalog, width: u32, height: u32) -> Self {
        let mut material = Material::new("Bloom");
        material.blend = BlendMode::Additive;
        material.depth_test = false;
        material.depth_write = false;
        let material_key = catalog.add_material(material);

        let result =
            catalog.add_render_target(RenderTarget::new(width, height, PixelFormat::Rgba16Float));

        let mut bloom = Self {
            enabled: false,
            threshold: 1.0,
            material: MaterialInstance::new(material_key),
            passes: Vec::new(),
            result,
            plane: catalog.builtin_plane(),
        };

        bloom.passes = (0..BLOOM_PASSES)
            .map(|i| {
                let w = (width >> (i + 1)).max(1);
                let h = (height >> (i + 1)).max(1);
                let target = catalog
                    .add_render_target(RenderTarget::new(w, h, PixelFormat::Rgba16Float));
                let radius = (1 << (i + 1)) as f32;
                BloomPass {
                    target,
                    blur_points: gaussian_kernel(radius),
                    blur_size: Vec2::new(1.0 / w as f32, 1.0 / h as f32),
                }
            })
            .collect();

        bloom
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.max(0.0);
    }

    /// Result target handle (for presentation and tests).
    #[must_use]
    pub fn result_target(&self) -> ResourceKey {
        self.result
    }

    /// Blur taps of one downsample pass.
    #[must_use]
    pub fn blur_points(&self, pass: usize) -> &[f32] {
        match self.passes.get(pass) {
            Some(pass) => pass.blur_points.as_slice(),
            None => &[],
        }
    }
}

impl PostProcessor for Bloom {
    fn name(&self) -> &'static str {
        "Bloom"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn draw(
        &mut self,
        source: ResourceKey,
        catalog: &ResourceCatalog,
        buffer: &mut dyn CommandBuffer,
    ) -> ResourceKey {
        if !self.enabled || self.passes.is_empty() {
            return source;
        }
        if !catalog.is_ready(self.result) || !catalog.is_ready(self.plane) {
            return source;
        }

        // Downsample cascade: threshold on the first pass, blur on the rest.
        let mut input = source;
        for (index, pass) in self.passes.iter().enumerate() {
            self.material.set_texture("rgbMap", input);
            self.material
                .set_float("threshold", if index == 0 { self.threshold } else { 0.0 });
            self.material.set_float("blurWidth", pass.blur_size.x);
            self.material.set_float("blurHeight", pass.blur_size.y);
            self.material
                .set_float("blurSteps", pass.blur_points.len() as f32);
            buffer.set_render_target(Some(pass.target), None);
            buffer.draw_mesh(Mat4::IDENTITY, self.plane, 0, LayerMask::UI, &self.material);
            input = pass.target;
        }

        // Additive composite of every cascade level over the source.
        buffer.set_render_target(Some(self.result), None);
        self.material.set_float("threshold", 0.0);
        self.material.set_texture("rgbMap", source);
        buffer.draw_mesh(Mat4::IDENTITY, self.plane, 0, LayerMask::UI, &self.material);
        for pass in &self.passes {
            self.material.set_texture("rgbMap", pass.target);
            buffer.draw_mesh(Mat4::IDENTITY, self.plane, 0, LayerMask::UI, &self.material);
        }

        self.result
    }

    fn resize(&mut self, width: u32, height: u32, catalog: &mut ResourceCatalog) {
        if let Some(target) = catalog.render_target_mut(self.result) {
            target.resize(width, height);
        }
        for (i, pass) in self.passes.iter_mut().enumerate() {
            let w = (width >> (i + 1)).max(1);
            let h = (height >> (i + 1)).max(1);
            if let Some(target) = catalog.render_target_mut(pass.target) {
                target.resize(w, h);
            }
            pass.blur_size = Vec2::new(1.0 / w as f32, 1.0 / h as f32);
        }
    }

    fn apply_settings(&mut self, settings: &PostProcessSettings) {
        self.enabled = settings.bloom_enabled;
        self.set_threshold(settings.bloom_threshold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized() {
        for radius in [1.0, 4.0, 16.0, 100.0] {
            let weights = gaussian_kernel(radius);
            assert!(weights.len() <= MAX_BLUR_SAMPLES);
            let sum = weights[0] + 2.0 * weights[1..].iter().sum::<f32>();
            assert!((sum - 1.0).abs() < 1e-5, "radius {radius}: sum {sum}");
        }
    }

    #[test]
    fn kernel_weights_decrease_from_center() {
        let weights = gaussian_kernel(8.0);
        for pair in weights.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }
}

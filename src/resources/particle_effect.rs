//! Particle Effect Resource
//!
//! An effect is an ordered list of emitters. Each emitter owns its spawn
//! parameters and an ordered modifier chain; the simulation itself lives in
//! the `ParticleRender` component, which instantiates per-emitter runtime
//! state from this shared, immutable description.

use glam::{Vec3, Vec4};
use rand::{Rng, RngExt};

use super::resource::ResourceKey;

/// Uniform scalar range sampled per spawn.
#[derive(Debug, Clone, Copy)]
pub struct RangeF {
    pub min: f32,
    pub max: f32,
}

impl RangeF {
    #[must_use]
    pub fn constant(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        if self.min >= self.max {
            self.min
        } else {
            rng.random_range(self.min..=self.max)
        }
    }
}

/// Uniform component-wise `Vec3` range.
#[derive(Debug, Clone, Copy)]
pub struct RangeV3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl RangeV3 {
    #[must_use]
    pub fn constant(value: Vec3) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Vec3 {
        Vec3::new(
            RangeF::new(self.min.x, self.max.x).sample(rng),
            RangeF::new(self.min.y, self.max.y).sample(rng),
            RangeF::new(self.min.z, self.max.z).sample(rng),
        )
    }
}

/// Uniform component-wise `Vec4` range.
#[derive(Debug, Clone, Copy)]
pub struct RangeV4 {
    pub min: Vec4,
    pub max: Vec4,
}

impl RangeV4 {
    #[must_use]
    pub fn constant(value: Vec4) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Vec4 {
        Vec4::new(
            RangeF::new(self.min.x, self.max.x).sample(rng),
            RangeF::new(self.min.y, self.max.y).sample(rng),
            RangeF::new(self.min.z, self.max.z).sample(rng),
            RangeF::new(self.min.w, self.max.w).sample(rng),
        )
    }
}

/// One particle, recycled in place inside a fixed-capacity pool. Slots with
/// `life <= 0` are dead and eligible for respawn; they are never removed
/// from the pool.
#[derive(Debug, Clone, Copy)]
pub struct ParticleData {
    /// Emitter-space (or world-space, for non-local emitters) position.
    pub position: Vec3,
    pub velocity: Vec3,
    pub angle: Vec3,
    pub size: Vec3,
    pub color: Vec4,
    // Per-spawn sampled integration rates.
    pub growth: Vec3,
    pub color_fade: Vec4,
    pub spin: Vec3,
    pub life: f32,
    pub frame: f32,
    /// Squared camera distance of the last step; `-1` for dead slots.
    pub distance: f32,
    /// Resolved world position of the last step.
    pub world: Vec3,
}

impl Default for ParticleData {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            angle: Vec3::ZERO,
            size: Vec3::ONE,
            color: Vec4::ONE,
            growth: Vec3::ZERO,
            color_fade: Vec4::ZERO,
            spin: Vec3::ZERO,
            life: 0.0,
            frame: 0.0,
            distance: -1.0,
            world: Vec3::ZERO,
        }
    }
}

/// One stage of an emitter's modifier chain. Spawn-class variants sample
/// their range once per spawned particle; integrator variants advance the
/// sampled rates every step.
#[derive(Debug, Clone)]
pub enum ParticleModifier {
    Lifetime(RangeF),
    StartSize(RangeV3),
    StartColor(RangeV4),
    StartAngle(RangeV3),
    StartPosition(RangeV3),
    Velocity(RangeV3),
    ScaleSize(RangeV3),
    ScaleColor(RangeV4),
    ScaleAngle(RangeV3),
}

impl ParticleModifier {
    /// Applies spawn-time sampling to a freshly recycled particle.
    pub fn spawn_particle(&self, rng: &mut impl Rng, data: &mut ParticleData) {
        match self {
            ParticleModifier::Lifetime(range) => data.life = range.sample(rng),
            ParticleModifier::StartSize(range) => data.size = range.sample(rng),
            ParticleModifier::StartColor(range) => data.color = range.sample(rng),
            ParticleModifier::StartAngle(range) => data.angle = range.sample(rng),
            ParticleModifier::StartPosition(range) => data.position = range.sample(rng),
            ParticleModifier::Velocity(range) => data.velocity = range.sample(rng),
            ParticleModifier::ScaleSize(range) => data.growth = range.sample(rng),
            ParticleModifier::ScaleColor(range) => data.color_fade = range.sample(rng),
            ParticleModifier::ScaleAngle(range) => data.spin = range.sample(rng),
        }
    }

    /// Integrates a live particle by `dt`.
    pub fn update_particle(&self, data: &mut ParticleData, dt: f32) {
        match self {
            ParticleModifier::Velocity(_) => data.position += data.velocity * dt,
            ParticleModifier::ScaleSize(_) => data.size += data.growth * dt,
            ParticleModifier::ScaleColor(_) => data.color += data.color_fade * dt,
            ParticleModifier::ScaleAngle(_) => data.angle += data.spin * dt,
            _ => {}
        }
    }
}

/// Shared description of one particle emitter.
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    pub name: String,
    /// Geometry instanced per particle (usually a billboard plane).
    pub mesh: Option<ResourceKey>,
    pub material: Option<ResourceKey>,
    /// Particles spawned per second.
    pub distribution: f32,
    /// Spawns forever when set; otherwise spawning stops once the countdown
    /// budget runs out.
    pub continuous: bool,
    /// Burst budget in seconds for non-continuous emitters.
    pub countdown: f32,
    /// Whether particle positions follow the owning actor.
    pub local: bool,
    modifiers: Vec<ParticleModifier>,
}

impl ParticleEmitter {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mesh: None,
            material: None,
            distribution: 1.0,
            continuous: true,
            countdown: 0.0,
            local: true,
            modifiers: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn modifiers(&self) -> &[ParticleModifier] {
        &self.modifiers
    }

    pub fn push_modifier(&mut self, modifier: ParticleModifier) {
        self.modifiers.push(modifier);
    }
}

/// Particle effect resource: ordered emitters.
#[derive(Debug, Clone, Default)]
pub struct ParticleEffect {
    emitters: Vec<ParticleEmitter>,
}

impl ParticleEffect {
    #[must_use]
    pub fn new(emitters: Vec<ParticleEmitter>) -> Self {
        Self { emitters }
    }

    #[inline]
    #[must_use]
    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    #[must_use]
    pub fn emitter(&self, index: usize) -> Option<&ParticleEmitter> {
        self.emitters.get(index)
    }

    #[inline]
    #[must_use]
    pub fn emitters(&self) -> &[ParticleEmitter] {
        &self.emitters
    }

    pub fn emitters_mut(&mut self) -> &mut [ParticleEmitter] {
        &mut self.emitters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_range_samples_exactly() {
        let mut rng = rand::rng();
        assert_eq!(RangeF::constant(2.5).sample(&mut rng), 2.5);
        assert_eq!(RangeV3::constant(Vec3::X).sample(&mut rng), Vec3::X);
    }

    #[test]
    fn range_normalizes_bounds() {
        let range = RangeF::new(3.0, 1.0);
        assert_eq!(range.min, 1.0);
        assert_eq!(range.max, 3.0);
    }

    #[test]
    fn velocity_modifier_integrates_position() {
        let mut data = ParticleData {
            velocity: Vec3::new(1.0, 0.0, 0.0),
            ..Default::default()
        };
        ParticleModifier::Velocity(RangeV3::constant(Vec3::ZERO)).update_particle(&mut data, 0.5);
        assert_eq!(data.position, Vec3::new(0.5, 0.0, 0.0));
    }
}

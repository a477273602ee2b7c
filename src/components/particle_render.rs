//! ParticleRender Component
//!
//! Simulates and draws a particle effect. Each emitter keeps a fixed pool of
//! particles recycled in place: slots whose life ran out become respawn
//! candidates, never separate allocations. Spawning is metered by a
//! fractional counter accumulating `distribution * dt` and consumed in whole
//! units, which keeps the cadence frame-rate independent.
//!
//! The GPU instance buffer packs per-particle payloads into matrix slots
//! (position, angle, size, camera distance, frame, life, color) and is
//! sorted back-to-front by the cached distance before submission. Dead slots
//! carry distance `-1`, so the sort pushes them past the live range. The
//! buffer grows with the pool and never shrinks within a session.

use std::any::Any;

use glam::{Mat4, Vec4};
use rand::Rng;

use crate::render::command_buffer::{CommandBuffer, id_to_color};
use crate::resources::{
    Aabb, MaterialInstance, ParticleData, ParticleEmitter, ResourceCatalog, ResourceKey,
    ResourceState,
};
use crate::scene::{
    BoundsProvider, Component, ComponentContext, ComponentKey, DrawArgs, Drawable, LayerMask,
};
use crate::variant::{self, VariantMap};

/// Column-array index of the packed camera distance.
const PACKED_DISTANCE: usize = 7;

fn pack_particle(p: &ParticleData) -> Mat4 {
    let mut m = [0.0f32; 16];
    m[0] = p.world.x;
    m[1] = p.world.y;
    m[2] = p.world.z;
    m[3] = p.angle.z;
    m[4] = p.size.x;
    m[5] = p.size.y;
    m[6] = p.size.z;
    m[PACKED_DISTANCE] = p.distance;
    m[10] = p.frame;
    m[11] = p.life;
    m[12] = p.color.x;
    m[13] = p.color.y;
    m[14] = p.color.z;
    m[15] = p.color.w;
    Mat4::from_cols_array(&m)
}

/// Runtime state of one emitter instance.
struct EmitterState {
    particles: Vec<ParticleData>,
    instances: Vec<Mat4>,
    material: Option<MaterialInstance>,
    /// Fractional spawn budget; whole units are consumed per spawn.
    counter: f32,
    /// Remaining burst budget for non-continuous emitters.
    countdown: f32,
    /// Particles visible this frame (live before this step).
    live: u32,
}

impl EmitterState {
    fn new(emitter: &ParticleEmitter) -> Self {
        Self {
            particles: vec![ParticleData::default()],
            instances: vec![Mat4::IDENTITY],
            material: emitter.material.map(MaterialInstance::new),
            counter: 0.0,
            countdown: emitter.countdown,
            live: 0,
        }
    }
}

/// Particle effect renderable.
#[derive(Default)]
pub struct ParticleRender {
    effect: Option<ResourceKey>,
    emitters: Vec<EmitterState>,
    bounds: Aabb,
    /// Own slot key, remembered for unsubscribing on teardown.
    observer: Option<ComponentKey>,
}

impl ParticleRender {
    #[must_use]
    pub fn new() -> Self {
        Self {
            effect: None,
            emitters: Vec::new(),
            bounds: Aabb::empty(),
            observer: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn effect(&self) -> Option<ResourceKey> {
        self.effect
    }

    /// Assigns the effect resource, moving the observer subscription along.
    pub fn set_effect(
        &mut self,
        effect: Option<ResourceKey>,
        this: ComponentKey,
        catalog: &mut ResourceCatalog,
    ) {
        if let Some(old) = self.effect.take() {
            catalog.unsubscribe(old, this);
            catalog.release(old);
        }
        self.observer = Some(this);
        self.effect = effect;
        self.emitters.clear();
        if let Some(key) = effect {
            catalog.retain(key);
            catalog.subscribe(key, this);
            if catalog.is_ready(key) {
                self.rebuild(catalog);
            }
        }
    }

    fn rebuild(&mut self, catalog: &ResourceCatalog) {
        self.emitters.clear();
        let Some(effect) = self.effect.and_then(|key| catalog.effect(key)) else {
            return;
        };
        self.emitters = effect.emitters().iter().map(EmitterState::new).collect();
    }

    /// Visible particle count of one emitter (for the current frame).
    #[must_use]
    pub fn visible_count(&self, emitter: usize) -> u32 {
        self.emitters.get(emitter).map_or(0, |s| s.live)
    }

    /// Particles currently alive in one emitter's pool, including ones
    /// spawned this frame.
    #[must_use]
    pub fn live_particle_count(&self, emitter: usize) -> usize {
        self.emitters.get(emitter).map_or(0, |s| {
            s.particles.iter().filter(|p| p.life > 0.0).count()
        })
    }

    /// Pool capacity of one emitter. Grows as needed, never shrinks.
    #[must_use]
    pub fn pool_size(&self, emitter: usize) -> usize {
        self.emitters.get(emitter).map_or(0, |s| s.particles.len())
    }

    /// Packed instance buffer of one emitter, sorted back-to-front.
    #[must_use]
    pub fn instances(&self, emitter: usize) -> &[Mat4] {
        match self.emitters.get(emitter) {
            Some(state) => state.instances.as_slice(),
            None => &[],
        }
    }

    fn spawn(rng: &mut impl Rng, emitter: &ParticleEmitter, particle: &mut ParticleData) {
        *particle = ParticleData::default();
        for modifier in emitter.modifiers() {
            modifier.spawn_particle(rng, particle);
        }
    }
}

impl Component for ParticleRender {
    fn type_name(&self) -> &'static str {
        "ParticleRender"
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        // Camera-relative sorting needs a current camera; no camera, no work.
        let Some(camera) = ctx.camera else {
            return;
        };
        let Some(effect_key) = self.effect else {
            return;
        };
        if !ctx.catalog.is_ready(effect_key) {
            return;
        }
        let Some(owner) = ctx.actors.get(ctx.actor) else {
            return;
        };
        let world = *owner.transform.world_matrix();
        let dt = ctx.dt;
        let Some(effect) = ctx.catalog.effect(effect_key) else {
            return;
        };
        if self.emitters.len() != effect.emitter_count() {
            self.emitters = effect.emitters().iter().map(EmitterState::new).collect();
        }

        let mut rng = rand::rng();
        self.bounds = Aabb::empty();

        for (index, state) in self.emitters.iter_mut().enumerate() {
            let Some(emitter) = effect.emitter(index) else {
                continue;
            };
            let continuous = emitter.continuous;
            state.live = 0;

            if state.instances.len() < state.particles.len() {
                state.instances.resize(state.particles.len(), Mat4::IDENTITY);
            }

            // Accumulate the spawn budget up front so a frame's own dt is
            // spendable within the frame; the cadence then tracks
            // distribution * time regardless of step size.
            state.counter += emitter.distribution * dt;

            // Pool pass: age, integrate, or recycle in place.
            for i in 0..state.particles.len() {
                let particle = &mut state.particles[i];
                particle.life -= dt;
                if particle.life > 0.0 {
                    for modifier in emitter.modifiers() {
                        modifier.update_particle(particle, dt);
                    }
                    particle.world = if emitter.local {
                        world.transform_point3(particle.position)
                    } else {
                        particle.position
                    };
                    particle.distance = (camera.position - particle.world).length_squared();
                    state.live += 1;
                } else {
                    particle.distance = -1.0;
                    if (continuous || state.countdown > 0.0) && state.counter >= 1.0 {
                        Self::spawn(&mut rng, emitter, particle);
                        particle.world = world.transform_point3(particle.position);
                        state.counter -= 1.0;
                    }
                }
                state.instances[i] = pack_particle(&state.particles[i]);
            }

            // Overflow spawns grow the pool; capacity is kept for reuse.
            while (continuous || state.countdown > 0.0) && state.counter >= 1.0 {
                let mut particle = ParticleData::default();
                Self::spawn(&mut rng, emitter, &mut particle);
                particle.world = world.transform_point3(particle.position);
                state.instances.push(pack_particle(&particle));
                state.particles.push(particle);
                state.counter -= 1.0;
            }

            if !continuous {
                state.countdown -= dt;
            }

            for particle in state.particles.iter().filter(|p| p.life > 0.0) {
                self.bounds
                    .encapsulate(particle.world, particle.size.length_squared());
            }

            // Back-to-front for alpha blending; dead slots (-1) sort last.
            state.instances.sort_by(|a, b| {
                b.to_cols_array()[PACKED_DISTANCE].total_cmp(&a.to_cols_array()[PACKED_DISTANCE])
            });
        }
    }

    fn resource_updated(
        &mut self,
        resource: ResourceKey,
        state: ResourceState,
        catalog: &ResourceCatalog,
    ) {
        if Some(resource) == self.effect && state == ResourceState::Ready {
            self.rebuild(catalog);
        }
    }

    fn teardown(&mut self, catalog: &mut ResourceCatalog) {
        if let Some(effect) = self.effect.take() {
            if let Some(this) = self.observer.take() {
                catalog.unsubscribe(effect, this);
            }
            catalog.release(effect);
        }
        self.emitters.clear();
    }

    fn load_user_data(&mut self, data: &VariantMap, ctx: &mut ComponentContext<'_>) {
        if let Some(path) = variant::get_reference(data, "Effect") {
            match ctx.catalog.load(path) {
                Ok(key) => self.set_effect(Some(key), ctx.this, ctx.catalog),
                Err(err) => log::warn!("ParticleRender: {err}"),
            }
        }
    }

    fn save_user_data(&self, catalog: &ResourceCatalog) -> VariantMap {
        let mut map = VariantMap::new();
        let path = self.effect.map_or("", |key| catalog.reference(key));
        variant::put_reference(&mut map, "Effect", path);
        map
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }

    fn as_bounds(&self) -> Option<&dyn BoundsProvider> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drawable for ParticleRender {
    fn draw(&self, args: &DrawArgs<'_>, buffer: &mut dyn CommandBuffer, layer: LayerMask) {
        if !layer.intersects(args.actor.layers) {
            return;
        }
        let Some(effect) = self.effect.filter(|&key| args.catalog.is_ready(key)) else {
            return;
        };
        let Some(effect) = args.catalog.effect(effect) else {
            return;
        };

        if layer.contains(LayerMask::RAYCAST) {
            buffer.set_color(id_to_color(args.actor.id()));
        }
        buffer.set_object_id(args.actor.id());

        for (index, state) in self.emitters.iter().enumerate() {
            if state.live == 0 {
                continue;
            }
            let Some(material) = &state.material else {
                continue;
            };
            let Some(emitter) = effect.emitter(index) else {
                continue;
            };
            let mesh = emitter.mesh.unwrap_or_else(|| args.catalog.builtin_plane());
            if !args.catalog.is_ready(mesh) {
                continue;
            }
            let count = state.live as usize;
            buffer.draw_mesh_instanced(&state.instances[..count], mesh, 0, layer, material);
        }

        if layer.contains(LayerMask::RAYCAST) {
            buffer.set_color(Vec4::ONE);
        }
    }

    fn translucent(&self, _args: &DrawArgs<'_>) -> bool {
        true
    }
}

impl BoundsProvider for ParticleRender {
    fn world_bounds(&self, _args: &DrawArgs<'_>) -> Option<Aabb> {
        self.bounds.is_valid().then_some(self.bounds)
    }
}

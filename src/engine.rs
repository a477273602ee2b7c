//! Engine
//!
//! The process-wide context: component registry, resource catalog, scene and
//! the system schedule. There are no global singletons; everything threads
//! through this object with explicit init and teardown tied to its lifetime.
//!
//! Frame order is fixed: pending resource events flush, behavior systems run
//! (logic first, module systems after), the render system runs last, and the
//! catalog collects garbage. No system is preempted mid-update.

use std::time::Instant;

use crate::config::EngineSettings;
use crate::errors::Result;
use crate::module::{Capabilities, Module};
use crate::resources::{ResourceCatalog, ResourceKey};
use crate::scene::{ComponentRegistry, Scene};
use crate::system::{RenderSystem, System};

struct InstalledModule {
    name: String,
    components: Vec<String>,
    systems: Vec<&'static str>,
}

/// Top-level engine context.
pub struct Engine {
    pub registry: ComponentRegistry,
    pub catalog: ResourceCatalog,
    pub scene: Scene,
    /// Behavior/extension systems, run in registration order before render.
    systems: Vec<Box<dyn System>>,
    render: RenderSystem,
    installed: Vec<InstalledModule>,
    settings: EngineSettings,
    last_tick: Option<Instant>,
}

impl Engine {
    /// Builds the engine with the built-in component set, the default
    /// behavior system and a render system sized from the settings.
    #[must_use]
    pub fn new(settings: EngineSettings) -> Self {
        let registry = ComponentRegistry::with_builtins();
        let mut catalog = ResourceCatalog::new();
        let mut render = RenderSystem::new(
            &mut catalog,
            settings.render.width,
            settings.render.height,
        );
        render.apply_settings(&settings.postprocess());

        let mut systems: Vec<Box<dyn System>> =
            vec![Box::new(crate::system::BehaviorSystem::new())];
        let mut scene = Scene::new();
        for system in &mut systems {
            if let Err(err) = system.setup(&mut scene, &mut catalog) {
                log::error!("system '{}' setup failed: {err}", system.name());
            }
        }

        log::debug!("engine initialized ({} systems)", systems.len() + 1);

        Self {
            registry,
            catalog,
            scene,
            systems,
            render,
            installed: Vec::new(),
            settings,
            last_tick: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn render_system(&self) -> &RenderSystem {
        &self.render
    }

    pub fn render_system_mut(&mut self) -> &mut RenderSystem {
        &mut self.render
    }

    /// Appends a behavior system to the schedule.
    pub fn add_system(&mut self, mut system: Box<dyn System>) {
        if let Err(err) = system.setup(&mut self.scene, &mut self.catalog) {
            log::error!("system '{}' setup failed: {err}", system.name());
        }
        self.systems.push(system);
    }

    // ========================================================================
    // Modules
    // ========================================================================

    /// Installs a module: registers its component factories, resource
    /// loaders and systems according to its capability mask.
    pub fn install(&mut self, mut module: Box<dyn Module>) {
        let caps = module.capabilities();
        let mut record = InstalledModule {
            name: module.name().to_string(),
            components: Vec::new(),
            systems: Vec::new(),
        };

        if caps.contains(Capabilities::EXTENSION) {
            for (type_name, factory) in module.components() {
                self.registry.register(type_name, factory);
                record.components.push(type_name.to_string());
            }
        }
        if caps.contains(Capabilities::CONVERTER) {
            for loader in module.loaders() {
                self.catalog.add_loader(loader);
            }
        }
        if caps.contains(Capabilities::SYSTEM) {
            for system in module.systems() {
                record.systems.push(system.name());
                self.add_system(system);
            }
        }

        log::info!("module '{}' installed", record.name);
        self.installed.push(record);
    }

    /// Uninstalls a module by name: its factories and systems are removed;
    /// already-instantiated components keep running.
    pub fn uninstall(&mut self, name: &str) {
        let Some(index) = self.installed.iter().position(|m| m.name == name) else {
            log::warn!("uninstall: module '{name}' is not installed");
            return;
        };
        let record = self.installed.remove(index);
        for type_name in &record.components {
            self.registry.unregister(type_name);
        }
        self.systems
            .retain(|system| !record.systems.contains(&system.name()));
        log::info!("module '{}' uninstalled", record.name);
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Resolves a path reference and synchronously delivers the resulting
    /// state transitions to subscribed components.
    pub fn load_resource(&mut self, path: &str) -> Result<ResourceKey> {
        let key = self.catalog.load(path)?;
        self.scene.flush_resource_events(&mut self.catalog);
        Ok(key)
    }

    // ========================================================================
    // Frame driving
    // ========================================================================

    /// Advances one frame with an explicit delta time.
    pub fn update(&mut self, dt: f32) {
        self.scene.flush_resource_events(&mut self.catalog);

        for system in &mut self.systems {
            system.update(&mut self.scene, &mut self.catalog, dt);
        }
        self.render.update(&mut self.scene, &mut self.catalog, dt);

        self.scene.flush_resource_events(&mut self.catalog);
        self.catalog.collect_garbage();
        // Deliver unloading notifications raised by the collector.
        self.scene.flush_resource_events(&mut self.catalog);
    }

    /// Advances one frame using wall-clock delta time. Returns the delta.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self
            .last_tick
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_tick = Some(now);
        self.update(dt);
        dt
    }
}

//! Engine & Module Integration Tests
//!
//! Tests for:
//! - Frame driving: behavior then render, stats published per tick
//! - Module install/uninstall: factories, loaders and systems
//! - Settings: bloom configuration reaching the post-process chain

use std::any::Any;

use tempest::module::{Capabilities, Module};
use tempest::resources::{ResourceData, ResourceLoader, ResourceState};
use tempest::scene::{Component, ComponentFactory};
use tempest::system::{System, ThreadPolicy};
use tempest::{Engine, EngineSettings, Mesh, MeshRender, PostProcessor, Result};

fn engine_with_scene() -> Engine {
    let mut engine = Engine::new(EngineSettings::default());

    let camera = engine
        .scene
        .instantiate(&engine.registry, "Camera", "camera", None, &mut engine.catalog)
        .unwrap();
    engine.scene.active_camera = Some(camera);

    let cube = engine
        .scene
        .instantiate(&engine.registry, "MeshRender", "cube", None, &mut engine.catalog)
        .unwrap();
    engine.scene.actor_mut(cube).unwrap().transform.position = glam::Vec3::new(0.0, 0.0, -5.0);

    engine
}

// ============================================================================
// Frame driving
// ============================================================================

#[test]
fn update_renders_the_active_camera_view() {
    let mut engine = engine_with_scene();
    engine.update(1.0 / 60.0);

    let stats = engine.render_system().stats();
    assert_eq!(stats.visible_objects, 1);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.triangles, 12);
}

#[test]
fn update_without_camera_is_not_an_error() {
    let mut engine = engine_with_scene();
    engine.scene.active_camera = None;
    engine.update(1.0 / 60.0);
    assert_eq!(engine.render_system().stats().draw_calls, 0);
}

#[test]
fn render_system_declares_main_thread_affinity() {
    let engine = engine_with_scene();
    assert_eq!(
        engine.render_system().thread_policy(),
        ThreadPolicy::Main
    );
}

// ============================================================================
// Modules
// ============================================================================

#[derive(Default)]
struct Spin;

impl Component for Spin {
    fn type_name(&self) -> &'static str {
        "Spin"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct NullLoader;

impl ResourceLoader for NullLoader {
    fn handles(&self, path: &str) -> bool {
        path.starts_with("null://")
    }

    fn placeholder(&self, _path: &str) -> ResourceData {
        ResourceData::Mesh(Mesh::new("null", Vec::new(), Vec::new()))
    }

    fn load(&mut self, _path: &str, _data: &mut ResourceData) -> Result<()> {
        Ok(())
    }
}

struct CounterSystem;

impl System for CounterSystem {
    fn name(&self) -> &'static str {
        "Counter"
    }

    fn thread_policy(&self) -> ThreadPolicy {
        ThreadPolicy::Any
    }

    fn update(
        &mut self,
        _scene: &mut tempest::Scene,
        _catalog: &mut tempest::ResourceCatalog,
        _dt: f32,
    ) {
    }
}

struct TestModule;

impl Module for TestModule {
    fn name(&self) -> &'static str {
        "test-module"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::SYSTEM | Capabilities::EXTENSION | Capabilities::CONVERTER
    }

    fn components(&self) -> Vec<(&'static str, ComponentFactory)> {
        vec![("Spin", || Box::new(Spin) as Box<dyn Component>)]
    }

    fn systems(&mut self) -> Vec<Box<dyn System>> {
        vec![Box::new(CounterSystem)]
    }

    fn loaders(&mut self) -> Vec<Box<dyn ResourceLoader>> {
        vec![Box::new(NullLoader)]
    }
}

#[test]
fn install_registers_factories_and_loaders() {
    let mut engine = Engine::new(EngineSettings::default());
    engine.install(Box::new(TestModule));

    assert!(engine.registry.is_registered("Spin"));
    let key = engine.load_resource("null://thing").unwrap();
    assert_eq!(engine.catalog.state(key), Some(ResourceState::Ready));

    let actor = engine
        .scene
        .instantiate(&engine.registry, "Spin", "spinner", None, &mut engine.catalog)
        .unwrap();
    assert!(engine.scene.find_component::<Spin>(actor).is_some());
}

#[test]
fn uninstall_removes_factories_but_keeps_instances() {
    let mut engine = Engine::new(EngineSettings::default());
    engine.install(Box::new(TestModule));
    let actor = engine
        .scene
        .instantiate(&engine.registry, "Spin", "spinner", None, &mut engine.catalog)
        .unwrap();

    engine.uninstall("test-module");

    assert!(!engine.registry.is_registered("Spin"));
    // The already-instantiated component keeps running.
    assert!(engine.scene.find_component::<Spin>(actor).is_some());
    engine.update(1.0 / 60.0);
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn bloom_settings_reach_the_postprocess_chain() {
    let settings = EngineSettings::from_json(
        r#"{"render":{"width":320,"height":200,"bloom":{"enabled":true,"threshold":0.8}}}"#,
    )
    .unwrap();
    let engine = Engine::new(settings);

    let bloom = engine
        .render_system()
        .pipeline()
        .postprocessor("Bloom")
        .unwrap();
    assert!(bloom.enabled());
}

#[test]
fn mesh_render_skips_suspended_resources() {
    struct BrokenLoader;
    impl ResourceLoader for BrokenLoader {
        fn handles(&self, path: &str) -> bool {
            path.starts_with("broken://")
        }
        fn placeholder(&self, _path: &str) -> ResourceData {
            ResourceData::Mesh(Mesh::new("pending", Vec::new(), Vec::new()))
        }
        fn load(&mut self, path: &str, _data: &mut ResourceData) -> Result<()> {
            Err(tempest::TempestError::ResourceLoadFailure {
                path: path.to_string(),
                reason: "missing file".to_string(),
            })
        }
    }

    let mut engine = engine_with_scene();
    engine.catalog.add_loader(Box::new(BrokenLoader));

    // Swap the cube's mesh for one that failed to load: it must render as
    // absent, not as an error.
    let cube = engine
        .scene
        .roots()
        .iter()
        .copied()
        .find(|&a| engine.scene.find_component::<MeshRender>(a).is_some())
        .unwrap();
    let key = engine.scene.find_component_key::<MeshRender>(cube).unwrap();
    let broken = engine.load_resource("broken://rock.mesh").unwrap();
    engine
        .scene
        .component_mut(key)
        .unwrap()
        .component
        .as_any_mut()
        .downcast_mut::<MeshRender>()
        .unwrap()
        .set_mesh(Some(broken), &mut engine.catalog);

    engine.update(1.0 / 60.0);
    assert_eq!(engine.render_system().stats().draw_calls, 0);
}

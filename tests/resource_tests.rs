//! Resource Lifecycle Integration Tests
//!
//! Tests for:
//! - Loader resolution: shared entries per path, Ready/Suspend outcomes
//! - State machine: monotonic transitions, explicit reload
//! - Observers: synchronous delivery, unsubscribe, stale-key safety
//! - Reference counting and two-phase garbage collection
//! - Texture surface invariants against the size formula

use std::any::Any;

use tempest::errors::TempestError;
use tempest::resources::{
    Compression, PixelFormat, ResourceCatalog, ResourceData, ResourceKey, ResourceLoader,
    ResourceState, Texture,
};
use tempest::scene::{Component, Scene};
use tempest::{Mesh, Result};

struct TestLoader;

impl ResourceLoader for TestLoader {
    fn handles(&self, path: &str) -> bool {
        path.starts_with("test://")
    }

    fn placeholder(&self, _path: &str) -> ResourceData {
        ResourceData::Mesh(Mesh::new("pending", Vec::new(), Vec::new()))
    }

    fn load(&mut self, path: &str, data: &mut ResourceData) -> Result<()> {
        if path.contains("broken") {
            return Err(TempestError::ResourceLoadFailure {
                path: path.to_string(),
                reason: "decode error".to_string(),
            });
        }
        *data = ResourceData::Mesh(Mesh::cube());
        Ok(())
    }
}

fn catalog_with_loader() -> ResourceCatalog {
    let mut catalog = ResourceCatalog::new();
    catalog.add_loader(Box::new(TestLoader));
    catalog
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn load_resolves_to_ready() {
    let mut catalog = catalog_with_loader();
    let key = catalog.load("test://rock.mesh").unwrap();
    assert_eq!(catalog.state(key), Some(ResourceState::Ready));
    assert!(catalog.is_ready(key));
    assert_eq!(catalog.reference(key), "test://rock.mesh");
}

#[test]
fn load_same_path_shares_one_entry() {
    let mut catalog = catalog_with_loader();
    let a = catalog.load("test://rock.mesh").unwrap();
    let b = catalog.load("test://rock.mesh").unwrap();
    assert_eq!(a, b);
}

#[test]
fn failed_load_suspends_instead_of_propagating() {
    let mut catalog = catalog_with_loader();
    // The call itself succeeds; the failure lives in the resource state.
    let key = catalog.load("test://broken.mesh").unwrap();
    assert_eq!(catalog.state(key), Some(ResourceState::Suspend));
    assert!(!catalog.is_ready(key));
}

#[test]
fn unresolvable_path_is_an_error() {
    let mut catalog = catalog_with_loader();
    assert!(matches!(
        catalog.load("unknown://x"),
        Err(TempestError::ResourceNotFound(_))
    ));
}

#[test]
fn anonymous_resources_have_empty_reference() {
    let mut catalog = ResourceCatalog::new();
    let key = catalog.add_mesh(Mesh::cube());
    assert_eq!(catalog.reference(key), "");
}

// ============================================================================
// Observers
// ============================================================================

/// Records every notification it receives.
#[derive(Default)]
struct RecordingObserver {
    events: Vec<(ResourceKey, ResourceState)>,
}

impl Component for RecordingObserver {
    fn type_name(&self) -> &'static str {
        "RecordingObserver"
    }

    fn resource_updated(
        &mut self,
        resource: ResourceKey,
        state: ResourceState,
        _catalog: &ResourceCatalog,
    ) {
        self.events.push((resource, state));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn observer_events(scene: &Scene, actor: tempest::ActorKey) -> Vec<(ResourceKey, ResourceState)> {
    scene
        .find_component::<RecordingObserver>(actor)
        .unwrap()
        .events
        .clone()
}

#[test]
fn reload_notifies_subscribed_observers_in_order() {
    let mut scene = Scene::new();
    let mut catalog = catalog_with_loader();

    let actor = scene.spawn("observer");
    let component = scene.add_component(actor, Box::new(RecordingObserver::default()), &mut catalog);

    let key = catalog.load("test://rock.mesh").unwrap();
    // Drain the initial load's transition before subscribing.
    scene.flush_resource_events(&mut catalog);
    catalog.subscribe(key, component);

    catalog.reload(key).unwrap();
    scene.flush_resource_events(&mut catalog);

    let events = observer_events(&scene, actor);
    assert_eq!(
        events,
        vec![(key, ResourceState::Loading), (key, ResourceState::Ready)]
    );
}

#[test]
fn unsubscribed_observer_receives_nothing() {
    let mut scene = Scene::new();
    let mut catalog = catalog_with_loader();

    let actor = scene.spawn("observer");
    let component = scene.add_component(actor, Box::new(RecordingObserver::default()), &mut catalog);

    let key = catalog.load("test://rock.mesh").unwrap();
    catalog.subscribe(key, component);
    catalog.unsubscribe(key, component);

    catalog.reload(key).unwrap();
    scene.flush_resource_events(&mut catalog);

    assert!(observer_events(&scene, actor).is_empty());
}

#[test]
fn stale_observer_keys_are_skipped_safely() {
    let mut scene = Scene::new();
    let mut catalog = catalog_with_loader();

    let actor = scene.spawn("observer");
    let component = scene.add_component(actor, Box::new(RecordingObserver::default()), &mut catalog);

    let key = catalog.load("test://rock.mesh").unwrap();
    catalog.subscribe(key, component);

    // Destroy the observer without unsubscribing: delivery must not panic.
    scene.remove_actor(actor, &mut catalog);
    catalog.reload(key).unwrap();
    scene.flush_resource_events(&mut catalog);
}

// ============================================================================
// State machine
// ============================================================================

#[test]
fn ready_goes_back_to_loading_only_on_explicit_reload() {
    let mut catalog = catalog_with_loader();
    let key = catalog.load("test://rock.mesh").unwrap();
    assert_eq!(catalog.state(key), Some(ResourceState::Ready));

    // A second load of the same path is a cache hit, not a reload.
    let again = catalog.load("test://rock.mesh").unwrap();
    assert_eq!(again, key);
    assert_eq!(catalog.state(key), Some(ResourceState::Ready));

    catalog.reload(key).unwrap();
    assert_eq!(catalog.state(key), Some(ResourceState::Ready));
}

#[test]
fn release_and_collect_free_the_entry() {
    let mut catalog = ResourceCatalog::new();
    let key = catalog.add_texture(Texture::new_2d(4, 4, PixelFormat::Rgba8));
    assert_eq!(catalog.state(key), Some(ResourceState::Ready));

    catalog.release(key);
    assert_eq!(catalog.state(key), Some(ResourceState::ToBeDeleted));

    // Phase one: doomed entries flip to Unloading (observers hear about it).
    catalog.collect_garbage();
    assert_eq!(catalog.state(key), Some(ResourceState::Unloading));

    // Phase two: the slot is freed; the handle goes stale.
    catalog.collect_garbage();
    assert_eq!(catalog.state(key), None);
}

#[test]
fn retain_keeps_the_entry_alive() {
    let mut catalog = ResourceCatalog::new();
    let key = catalog.add_mesh(Mesh::cube());
    catalog.retain(key);
    catalog.release(key);
    assert_eq!(catalog.state(key), Some(ResourceState::Ready));

    catalog.release(key);
    assert_eq!(catalog.state(key), Some(ResourceState::ToBeDeleted));
}

// ============================================================================
// Texture invariants
// ============================================================================

#[test]
fn surface_bytes_always_match_the_size_formula() {
    let mut texture = Texture::new_2d(100, 50, PixelFormat::Rgba8);
    assert_eq!(texture.surface(0).unwrap()[0].len(), texture.size(100, 50));

    texture.resize(37, 21);
    assert_eq!(texture.surface(0).unwrap()[0].len(), texture.size(37, 21));

    texture.set_compression(Compression::Dxt5);
    // 37 -> 10 blocks, 21 -> 6 blocks, 16 bytes per block.
    assert_eq!(texture.size(37, 21), 10 * 6 * 16);
    assert_eq!(texture.surface(0).unwrap()[0].len(), 10 * 6 * 16);
}

#[test]
fn resize_discards_contents_and_flags_reupload() {
    let mut texture = Texture::new_2d(8, 8, PixelFormat::R8);
    texture.surface_mut(0).unwrap()[0].fill(0xff);
    texture.clear_dirty();

    texture.resize(16, 16);
    assert!(texture.is_dirty());
    assert!(texture.surface(0).unwrap()[0].iter().all(|&b| b == 0));
}

#[test]
fn cubemap_resize_touches_all_sides() {
    let mut texture = Texture::new_cube(8, PixelFormat::Rgba8);
    texture.resize(16, 16);
    for side in 0..6 {
        assert_eq!(texture.surface(side).unwrap()[0].len(), texture.size(16, 16));
    }
}

//! Pipeline Integration Tests
//!
//! Tests for:
//! - Frustum culling against the camera volume
//! - Opaque traversal order and stable back-to-front translucent sorting
//! - Post-process chain identity pass-through and chaining
//! - Per-frame counters and the no-camera frame
//! - Picking id round-trip through submission color state

use glam::Vec3;

use tempest::render::{CommandBuffer, RecordingBuffer, color_to_id};
use tempest::resources::{BlendMode, Material, RenderTarget, ResourceCatalog, ResourceKey};
use tempest::scene::{ActorKey, ComponentRegistry, LayerMask, Scene};
use tempest::{Bloom, MeshRender, Pipeline, PostProcessor, RenderSystem};

struct World {
    scene: Scene,
    catalog: ResourceCatalog,
    registry: ComponentRegistry,
}

fn world_with_camera() -> (World, ActorKey) {
    let mut world = World {
        scene: Scene::new(),
        catalog: ResourceCatalog::new(),
        registry: ComponentRegistry::with_builtins(),
    };
    let camera = world
        .scene
        .instantiate(
            &world.registry,
            "Camera",
            "camera",
            None,
            &mut world.catalog,
        )
        .unwrap();
    world.scene.active_camera = Some(camera);
    (world, camera)
}

fn translucent_material(catalog: &mut ResourceCatalog) -> ResourceKey {
    let mut material = Material::new("Glass");
    material.blend = BlendMode::Translucent;
    catalog.add_material(material)
}

/// Spawns a cube at `position`; `material` overrides the opaque default.
fn spawn_cube(world: &mut World, name: &str, position: Vec3, material: Option<ResourceKey>) -> ActorKey {
    let actor = world
        .scene
        .instantiate(
            &world.registry,
            "MeshRender",
            name,
            None,
            &mut world.catalog,
        )
        .unwrap();
    world.scene.actor_mut(actor).unwrap().transform.position = position;
    if let Some(material) = material {
        let key = world.scene.find_component_key::<MeshRender>(actor).unwrap();
        world
            .scene
            .component_mut(key)
            .unwrap()
            .component
            .as_any_mut()
            .downcast_mut::<MeshRender>()
            .unwrap()
            .set_materials(vec![material], &mut world.catalog);
    }
    actor
}

fn render_once(world: &mut World, camera: ActorKey, pipeline: &mut Pipeline, buffer: &mut RecordingBuffer) {
    world.scene.update_transforms();
    pipeline.analyze_scene(&world.scene, &world.catalog, camera);
    pipeline.draw(&world.scene, &world.catalog, buffer);
}

// ============================================================================
// Culling
// ============================================================================

#[test]
fn objects_outside_the_frustum_are_culled() {
    let (mut world, camera) = world_with_camera();
    spawn_cube(&mut world, "visible", Vec3::new(0.0, 0.0, -10.0), None);
    spawn_cube(&mut world, "behind", Vec3::new(0.0, 0.0, 10.0), None);
    spawn_cube(&mut world, "far", Vec3::new(0.0, 0.0, -5000.0), None);

    let mut pipeline = Pipeline::new(&mut world.catalog, 640, 480);
    let mut buffer = RecordingBuffer::new();
    render_once(&mut world, camera, &mut pipeline, &mut buffer);

    assert_eq!(buffer.submissions().len(), 1);
}

#[test]
fn camera_layer_mask_filters_actors() {
    let (mut world, camera) = world_with_camera();
    let gizmo = spawn_cube(&mut world, "gizmo", Vec3::new(0.0, 0.0, -5.0), None);
    world.scene.actor_mut(gizmo).unwrap().layers = LayerMask::GIZMO;

    let mut pipeline = Pipeline::new(&mut world.catalog, 640, 480);
    let mut buffer = RecordingBuffer::new();
    render_once(&mut world, camera, &mut pipeline, &mut buffer);

    // Default camera mask does not include the gizmo layer.
    assert!(buffer.submissions().is_empty());
}

// ============================================================================
// Sorting
// ============================================================================

#[test]
fn translucent_draws_back_to_front_with_stable_ties() {
    let (mut world, camera) = world_with_camera();
    let glass = translucent_material(&mut world.catalog);

    // Camera-space depths 5, 2, 2, 8; the two depth-2 entries must keep
    // their traversal order relative to each other.
    let d5 = spawn_cube(&mut world, "d5", Vec3::new(0.0, 0.0, -5.0), Some(glass));
    let d2a = spawn_cube(&mut world, "d2a", Vec3::new(-0.5, 0.0, -2.0), Some(glass));
    let d2b = spawn_cube(&mut world, "d2b", Vec3::new(0.5, 0.0, -2.0), Some(glass));
    let d8 = spawn_cube(&mut world, "d8", Vec3::new(0.0, 0.0, -8.0), Some(glass));

    let id_of = |scene: &Scene, key: ActorKey| scene.actor(key).unwrap().id();
    let expected = vec![
        id_of(&world.scene, d8),
        id_of(&world.scene, d5),
        id_of(&world.scene, d2a),
        id_of(&world.scene, d2b),
    ];

    let mut pipeline = Pipeline::new(&mut world.catalog, 640, 480);
    let mut buffer = RecordingBuffer::new();
    render_once(&mut world, camera, &mut pipeline, &mut buffer);

    let order: Vec<u32> = buffer
        .submissions()
        .iter()
        .filter(|s| s.layer == LayerMask::TRANSLUCENT)
        .map(|s| s.object_id)
        .collect();
    assert_eq!(order, expected);
}

#[test]
fn opaque_draws_in_traversal_order() {
    let (mut world, camera) = world_with_camera();
    let near = spawn_cube(&mut world, "near", Vec3::new(0.0, 0.0, -2.0), None);
    let far = spawn_cube(&mut world, "far", Vec3::new(0.0, 0.0, -9.0), None);

    let mut pipeline = Pipeline::new(&mut world.catalog, 640, 480);
    let mut buffer = RecordingBuffer::new();
    render_once(&mut world, camera, &mut pipeline, &mut buffer);

    let order: Vec<u32> = buffer.submissions().iter().map(|s| s.object_id).collect();
    assert_eq!(
        order,
        vec![
            world.scene.actor(near).unwrap().id(),
            world.scene.actor(far).unwrap().id()
        ]
    );
}

// ============================================================================
// Post-process chain
// ============================================================================

#[test]
fn disabled_bloom_returns_the_same_target_identity() {
    let mut catalog = ResourceCatalog::new();
    let mut bloom = Bloom::new(&mut catalog, 256, 256);
    let source = catalog.add_render_target(RenderTarget::new(
        256,
        256,
        tempest::PixelFormat::Rgba16Float,
    ));
    let mut buffer = RecordingBuffer::new();

    assert!(!bloom.enabled());
    let out = bloom.draw(source, &catalog, &mut buffer);
    // Same handle, not a copy.
    assert_eq!(out, source);
    assert_eq!(buffer.submissions().len(), 0);
}

#[test]
fn enabled_bloom_chains_into_its_result_target() {
    let mut catalog = ResourceCatalog::new();
    let mut bloom = Bloom::new(&mut catalog, 256, 256);
    let source = catalog.add_render_target(RenderTarget::new(
        256,
        256,
        tempest::PixelFormat::Rgba16Float,
    ));
    let mut buffer = RecordingBuffer::new();

    bloom.set_enabled(true);
    let out = bloom.draw(source, &catalog, &mut buffer);
    assert_ne!(out, source);
    assert_eq!(out, bloom.result_target());
    assert!(buffer.draw_call_count() > 0);
}

#[test]
fn pipeline_final_target_follows_the_chain() {
    let (mut world, camera) = world_with_camera();
    spawn_cube(&mut world, "cube", Vec3::new(0.0, 0.0, -5.0), None);

    let mut pipeline = Pipeline::new(&mut world.catalog, 640, 480);
    let mut bloom = Bloom::new(&mut world.catalog, 640, 480);
    bloom.set_enabled(true);
    let bloom_target = bloom.result_target();
    pipeline.add_postprocessor(Box::new(bloom));

    let mut buffer = RecordingBuffer::new();
    render_once(&mut world, camera, &mut pipeline, &mut buffer);

    assert_eq!(pipeline.final_target(), bloom_target);
}

// ============================================================================
// Counters & no-camera frames
// ============================================================================

#[test]
fn finish_publishes_and_resets_counters() {
    let (mut world, camera) = world_with_camera();
    spawn_cube(&mut world, "cube", Vec3::new(0.0, 0.0, -5.0), None);

    let mut pipeline = Pipeline::new(&mut world.catalog, 640, 480);
    let mut buffer = RecordingBuffer::new();
    render_once(&mut world, camera, &mut pipeline, &mut buffer);
    pipeline.finish(&mut buffer);

    let stats = pipeline.stats();
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.triangles, 12);
    assert_eq!(stats.visible_objects, 1);
    assert!(buffer.submissions().is_empty());
}

#[test]
fn frame_without_camera_renders_nothing() {
    let mut scene = Scene::new();
    let mut catalog = ResourceCatalog::new();
    let registry = ComponentRegistry::with_builtins();
    scene
        .instantiate(&registry, "MeshRender", "cube", None, &mut catalog)
        .unwrap();

    let mut render = RenderSystem::new(&mut catalog, 640, 480);
    // Not an error: the frame simply performs no rendering work.
    assert!(render.render_frame(&scene, &catalog).is_none());
}

// ============================================================================
// Picking
// ============================================================================

#[test]
fn raycast_pass_encodes_object_ids_in_color() {
    let (mut world, camera) = world_with_camera();
    let actor = spawn_cube(&mut world, "pickable", Vec3::new(0.0, 0.0, -5.0), None);
    world.scene.update_transforms();

    let key = world.scene.find_component_key::<MeshRender>(actor).unwrap();
    let slot = world.scene.component(key).unwrap();
    let args = tempest::scene::DrawArgs {
        actor: world.scene.actor(actor).unwrap(),
        catalog: &world.catalog,
    };
    let mut buffer = RecordingBuffer::new();
    slot.component
        .as_drawable()
        .unwrap()
        .draw(&args, &mut buffer, LayerMask::RAYCAST);

    let submission = &buffer.submissions()[0];
    assert_eq!(
        color_to_id(submission.color),
        world.scene.actor(actor).unwrap().id()
    );
    let _ = camera;
}

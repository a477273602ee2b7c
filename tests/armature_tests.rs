//! Armature Skinning Cache Integration Tests
//!
//! Tests for:
//! - Lazy bone resolution by cloned-from correlation index
//! - Packed cache round-trip: texture slot decodes to world * inverse_bind
//! - Unresolved bones keeping their identity slot
//! - Rebind marking the cache dirty through the resource observer

use glam::{Mat4, Quat, Vec3};

use tempest::components::{Armature, pack_bone_matrix, unpack_bone_matrix};
use tempest::resources::{Bone, Pose, ResourceCatalog, ResourceKey};
use tempest::scene::{ActorKey, ComponentKey, ComponentRegistry, Scene};

const PACKED_BYTES: usize = 48;

struct Rig {
    scene: Scene,
    catalog: ResourceCatalog,
    root: ActorKey,
    bones: Vec<ActorKey>,
    component: ComponentKey,
}

/// Builds a rig with `bone_count` bone actors whose transforms are stamped
/// with matching correlation indices.
fn build_rig(bone_count: u32) -> Rig {
    let mut scene = Scene::new();
    let mut catalog = ResourceCatalog::new();
    let registry = ComponentRegistry::with_builtins();

    let root = scene
        .instantiate(&registry, "Armature", "rig", None, &mut catalog)
        .unwrap();
    let component = scene.find_component_key::<Armature>(root).unwrap();

    let mut bones = Vec::new();
    for index in 0..bone_count {
        let bone = scene.spawn_child(&format!("bone{index}"), root);
        let transform = &mut scene.actor_mut(bone).unwrap().transform;
        transform.cloned_from = Some(index);
        transform.position = Vec3::new(index as f32, 1.0, 0.0);
        transform.rotation = Quat::from_rotation_z(0.1 * index as f32);
        bones.push(bone);
    }

    Rig {
        scene,
        catalog,
        root,
        bones,
        component,
    }
}

fn bind_pose(rig: &mut Rig, bones: Vec<Bone>) -> ResourceKey {
    let pose = rig.catalog.add_pose(Pose::new(bones));
    rig.scene
        .component_mut(rig.component)
        .unwrap()
        .component
        .as_any_mut()
        .downcast_mut::<Armature>()
        .unwrap()
        .set_bind_pose(Some(pose), rig.component, &mut rig.catalog);
    pose
}

fn tick(rig: &mut Rig) {
    rig.scene.update_transforms();
    rig.scene.update_components(&mut rig.catalog, 1.0 / 60.0);
}

fn armature_of(rig: &Rig) -> &Armature {
    rig.scene
        .component(rig.component)
        .unwrap()
        .component
        .as_any()
        .downcast_ref::<Armature>()
        .unwrap()
}

fn decode_slot(rig: &Rig, slot: usize) -> Mat4 {
    let cache = armature_of(rig).cache_texture().unwrap();
    let texture = rig.catalog.texture(cache).unwrap();
    let mip = &texture.surface(0).unwrap()[0];
    let bytes = &mip[slot * PACKED_BYTES..(slot + 1) * PACKED_BYTES];

    let mut floats = [0.0f32; 12];
    for (i, value) in floats.iter_mut().enumerate() {
        *value = f32::from_ne_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap());
    }
    unpack_bone_matrix(&floats)
}

fn assert_close(a: Mat4, b: Mat4) {
    let (a, b) = (a.to_cols_array(), b.to_cols_array());
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < 1e-5, "{a:?}\nvs\n{b:?}");
    }
}

// ============================================================================
// Cache round-trip
// ============================================================================

#[test]
fn cache_slots_decode_to_world_times_inverse_bind() {
    let mut rig = build_rig(3);

    let bones: Vec<Bone> = (0..3)
        .map(|index| {
            let mut bone = Bone::new(&format!("bone{index}"), index, index.checked_sub(1));
            bone.position = Vec3::new(-(index as f32), 0.5, 0.0);
            bone.rotation = Quat::from_rotation_y(0.2);
            bone
        })
        .collect();
    bind_pose(&mut rig, bones.clone());
    tick(&mut rig);

    for (slot, bone) in bones.iter().enumerate() {
        let world = rig
            .scene
            .actor(rig.bones[slot])
            .unwrap()
            .transform
            .world_matrix_as_mat4();
        let expected = world * bone.inverse_bind_matrix();
        assert_close(decode_slot(&rig, slot), expected);
    }
}

#[test]
fn cache_follows_bone_movement() {
    let mut rig = build_rig(1);
    bind_pose(&mut rig, vec![Bone::new("bone0", 0, None)]);
    tick(&mut rig);
    let first = decode_slot(&rig, 0);

    rig.scene
        .actor_mut(rig.bones[0])
        .unwrap()
        .transform
        .position = Vec3::new(9.0, 9.0, 9.0);
    tick(&mut rig);
    let second = decode_slot(&rig, 0);

    assert!(first.to_cols_array() != second.to_cols_array());
    let world = rig
        .scene
        .actor(rig.bones[0])
        .unwrap()
        .transform
        .world_matrix_as_mat4();
    assert_close(second, world * Bone::new("bone0", 0, None).inverse_bind_matrix());
}

// ============================================================================
// Resolution edge cases
// ============================================================================

#[test]
fn unresolved_bone_keeps_identity_slot() {
    let mut rig = build_rig(1);
    // Bone index 7 has no matching transform in the rig.
    bind_pose(
        &mut rig,
        vec![Bone::new("bone0", 0, None), Bone::new("ghost", 7, Some(0))],
    );
    tick(&mut rig);

    assert_eq!(armature_of(&rig).bone_count(), 2);
    assert_close(decode_slot(&rig, 1), Mat4::IDENTITY);
}

#[test]
fn pack_compresses_the_fourth_row_into_translation() {
    let matrix = Mat4::from_scale_rotation_translation(
        Vec3::new(2.0, 1.0, 1.0),
        Quat::from_rotation_x(0.3),
        Vec3::new(4.0, 5.0, 6.0),
    );
    let packed = pack_bone_matrix(&matrix);
    // Translation lives in the folded row slots.
    assert_eq!(packed[3], 4.0);
    assert_eq!(packed[7], 5.0);
    assert_eq!(packed[11], 6.0);

    assert_close(unpack_bone_matrix(&packed), matrix);
}

#[test]
fn rebind_is_lazy_until_the_next_update() {
    let mut rig = build_rig(2);
    bind_pose(&mut rig, vec![Bone::new("bone0", 0, None)]);
    tick(&mut rig);
    assert_eq!(armature_of(&rig).bone_count(), 1);

    // A new pose only takes effect after an update pass.
    bind_pose(
        &mut rig,
        vec![Bone::new("bone0", 0, None), Bone::new("bone1", 1, Some(0))],
    );
    assert_eq!(armature_of(&rig).bone_count(), 1);
    tick(&mut rig);
    assert_eq!(armature_of(&rig).bone_count(), 2);

    let _ = rig.root;
}

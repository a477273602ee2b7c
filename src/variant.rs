//! Variant Map Serialization Boundary
//!
//! Components persist themselves through a string-keyed, order-irrelevant
//! key/value map with variant-typed values. The editor and prefab layers sit
//! on the other side of this boundary; the core only guarantees lossless
//! round-trips for its own persisted fields.
//!
//! Resource references travel as path-like strings resolvable through the
//! [`ResourceCatalog`](crate::resources::ResourceCatalog). An absent reference
//! is the empty string, never a missing key left ambiguous against `null`.

use glam::{Vec3, Vec4};
use serde_json::{Map, Value, json};

/// A single variant-typed value.
pub type Variant = Value;

/// String-keyed map of variant values. Key order carries no meaning.
pub type VariantMap = Map<String, Variant>;

/// Reads a string field, if present.
#[must_use]
pub fn get_str<'a>(map: &'a VariantMap, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Reads a resource reference. Missing keys and empty strings both mean
/// "no reference".
#[must_use]
pub fn get_reference<'a>(map: &'a VariantMap, key: &str) -> Option<&'a str> {
    get_str(map, key).filter(|s| !s.is_empty())
}

/// Writes a resource reference. Anonymous resources resolve to an empty
/// path and are stored as such, keeping the field present and unambiguous.
pub fn put_reference(map: &mut VariantMap, key: &str, path: &str) {
    map.insert(key.to_string(), Value::String(path.to_string()));
}

/// Reads a float field, if present.
#[must_use]
pub fn get_f32(map: &VariantMap, key: &str) -> Option<f32> {
    map.get(key).and_then(Value::as_f64).map(|v| v as f32)
}

/// Reads a bool field, if present.
#[must_use]
pub fn get_bool(map: &VariantMap, key: &str) -> Option<bool> {
    map.get(key).and_then(Value::as_bool)
}

/// Reads an unsigned integer field, if present.
#[must_use]
pub fn get_u32(map: &VariantMap, key: &str) -> Option<u32> {
    map.get(key).and_then(Value::as_u64).map(|v| v as u32)
}

/// Encodes a `Vec3` as a 3-element array value.
#[must_use]
pub fn from_vec3(v: Vec3) -> Variant {
    json!([v.x, v.y, v.z])
}

/// Encodes a `Vec4` as a 4-element array value.
#[must_use]
pub fn from_vec4(v: Vec4) -> Variant {
    json!([v.x, v.y, v.z, v.w])
}

/// Reads a 3-element array value as a `Vec3`.
#[must_use]
pub fn get_vec3(map: &VariantMap, key: &str) -> Option<Vec3> {
    let arr = map.get(key)?.as_array()?;
    if arr.len() != 3 {
        return None;
    }
    Some(Vec3::new(
        arr[0].as_f64()? as f32,
        arr[1].as_f64()? as f32,
        arr[2].as_f64()? as f32,
    ))
}

/// Reads a 4-element array value as a `Vec4`.
#[must_use]
pub fn get_vec4(map: &VariantMap, key: &str) -> Option<Vec4> {
    let arr = map.get(key)?.as_array()?;
    if arr.len() != 4 {
        return None;
    }
    Some(Vec4::new(
        arr[0].as_f64()? as f32,
        arr[1].as_f64()? as f32,
        arr[2].as_f64()? as f32,
        arr[3].as_f64()? as f32,
    ))
}

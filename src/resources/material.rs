//! Material Resource & Material Instances
//!
//! A [`Material`] is a shared shading recipe: blend/depth state plus a table
//! of default uniform values. A [`MaterialInstance`] binds per-object
//! overrides to one shared material; instances are cheap values owned by the
//! components that draw with them, while materials live in the catalog and
//! are reference-counted like any other resource.

use glam::{Mat4, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;

use super::resource::ResourceKey;

/// How a material's output blends with the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    /// Alpha blending; draws must be sorted back-to-front.
    Translucent,
    /// Additive blending (particles, glows).
    Additive,
}

/// A single typed uniform value.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    /// Texture or render-target handle.
    Texture(ResourceKey),
}

/// Shared shading recipe.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub blend: BlendMode,
    pub double_sided: bool,
    pub depth_test: bool,
    pub depth_write: bool,
    uniforms: FxHashMap<String, UniformValue>,
}

impl Material {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            blend: BlendMode::Opaque,
            double_sided: false,
            depth_test: true,
            depth_write: true,
            uniforms: FxHashMap::default(),
        }
    }

    /// Whether draws with this material belong in the sorted translucent pass.
    #[must_use]
    pub fn is_translucent(&self) -> bool {
        matches!(self.blend, BlendMode::Translucent | BlendMode::Additive)
    }

    /// Sets a default uniform value.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.insert(name.to_string(), value);
    }

    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    #[must_use]
    pub fn uniforms(&self) -> &FxHashMap<String, UniformValue> {
        &self.uniforms
    }
}

/// Per-object binding of uniform overrides to a shared [`Material`].
#[derive(Debug, Clone)]
pub struct MaterialInstance {
    material: ResourceKey,
    overrides: FxHashMap<String, UniformValue>,
}

impl MaterialInstance {
    #[must_use]
    pub fn new(material: ResourceKey) -> Self {
        Self {
            material,
            overrides: FxHashMap::default(),
        }
    }

    /// Handle of the shared material.
    #[inline]
    #[must_use]
    pub fn material(&self) -> ResourceKey {
        self.material
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.overrides
            .insert(name.to_string(), UniformValue::Float(value));
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.overrides
            .insert(name.to_string(), UniformValue::Vec3(value));
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.overrides
            .insert(name.to_string(), UniformValue::Vec4(value));
    }

    pub fn set_texture(&mut self, name: &str, texture: ResourceKey) {
        self.overrides
            .insert(name.to_string(), UniformValue::Texture(texture));
    }

    /// Override for `name`, if one was set on this instance.
    #[must_use]
    pub fn override_of(&self, name: &str) -> Option<&UniformValue> {
        self.overrides.get(name)
    }

    #[must_use]
    pub fn overrides(&self) -> &FxHashMap<String, UniformValue> {
        &self.overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translucency_follows_blend_mode() {
        let mut material = Material::new("test");
        assert!(!material.is_translucent());
        material.blend = BlendMode::Translucent;
        assert!(material.is_translucent());
        material.blend = BlendMode::Additive;
        assert!(material.is_translucent());
    }

    #[test]
    fn instance_overrides_shadow_material_defaults() {
        let mut instance = MaterialInstance::new(ResourceKey::default());
        assert!(instance.override_of("tint").is_none());
        instance.set_vec4("tint", Vec4::ONE);
        assert_eq!(
            instance.override_of("tint"),
            Some(&UniformValue::Vec4(Vec4::ONE))
        );
    }
}

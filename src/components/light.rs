//! Light Components
//!
//! Lights are data components: direction and position come from the owning
//! actor's transform, the component carries photometric parameters. The
//! variant kinds share one struct with a tagged `LightKind` instead of an
//! inheritance chain.

use std::any::Any;

use glam::Vec3;
use serde_json::json;

use crate::resources::ResourceCatalog;
use crate::scene::{Component, ComponentContext};
use crate::variant::{self, VariantMap};

/// Photometric shape of a light.
#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    Directional,
    Point {
        range: f32,
    },
    Spot {
        range: f32,
        /// Inner cone half-angle, radians.
        inner_cone: f32,
        /// Outer cone half-angle, radians.
        outer_cone: f32,
    },
}

/// Light component.
#[derive(Debug, Clone)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
    pub cast_shadows: bool,
    pub kind: LightKind,
}

impl Light {
    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            cast_shadows: false,
            kind: LightKind::Directional,
        }
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            color,
            intensity,
            cast_shadows: false,
            kind: LightKind::Point { range },
        }
    }

    #[must_use]
    pub fn new_spot(color: Vec3, intensity: f32, range: f32, inner: f32, outer: f32) -> Self {
        Self {
            color,
            intensity,
            cast_shadows: false,
            kind: LightKind::Spot {
                range,
                inner_cone: inner,
                outer_cone: outer,
            },
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new_directional(Vec3::ONE, 1.0)
    }
}

impl Component for Light {
    fn type_name(&self) -> &'static str {
        match self.kind {
            LightKind::Directional => "DirectionalLight",
            LightKind::Point { .. } => "PointLight",
            LightKind::Spot { .. } => "SpotLight",
        }
    }

    fn load_user_data(&mut self, data: &VariantMap, _ctx: &mut ComponentContext<'_>) {
        if let Some(color) = variant::get_vec3(data, "Color") {
            self.color = color;
        }
        if let Some(intensity) = variant::get_f32(data, "Intensity") {
            self.intensity = intensity;
        }
        if let Some(shadows) = variant::get_bool(data, "CastShadows") {
            self.cast_shadows = shadows;
        }
        match &mut self.kind {
            LightKind::Directional => {}
            LightKind::Point { range } => {
                if let Some(r) = variant::get_f32(data, "Range") {
                    *range = r;
                }
            }
            LightKind::Spot {
                range,
                inner_cone,
                outer_cone,
            } => {
                if let Some(r) = variant::get_f32(data, "Range") {
                    *range = r;
                }
                if let Some(inner) = variant::get_f32(data, "InnerCone") {
                    *inner_cone = inner;
                }
                if let Some(outer) = variant::get_f32(data, "OuterCone") {
                    *outer_cone = outer;
                }
            }
        }
    }

    fn save_user_data(&self, _catalog: &ResourceCatalog) -> VariantMap {
        let mut map = VariantMap::new();
        map.insert("Color".into(), variant::from_vec3(self.color));
        map.insert("Intensity".into(), json!(self.intensity));
        map.insert("CastShadows".into(), json!(self.cast_shadows));
        match self.kind {
            LightKind::Directional => {}
            LightKind::Point { range } => {
                map.insert("Range".into(), json!(range));
            }
            LightKind::Spot {
                range,
                inner_cone,
                outer_cone,
            } => {
                map.insert("Range".into(), json!(range));
                map.insert("InnerCone".into(), json!(inner_cone));
                map.insert("OuterCone".into(), json!(outer_cone));
            }
        }
        map
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

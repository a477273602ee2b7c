//! Engine Settings
//!
//! Serializable configuration applied at engine construction (and
//! re-appliable at runtime). JSON is the interchange format, matching the
//! variant-map boundary.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::render::postprocess::PostProcessSettings;

/// Bloom stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    pub enabled: bool,
    pub threshold: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 1.0,
        }
    }
}

/// Render pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Base render target extent.
    pub width: u32,
    pub height: u32,
    pub bloom: BloomConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            bloom: BloomConfig::default(),
        }
    }
}

/// Top-level engine settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub render: RenderConfig,
}

impl EngineSettings {
    /// Parses settings from a JSON document. Unknown fields are ignored,
    /// missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the settings to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The slice of settings the post-process chain consumes.
    #[must_use]
    pub fn postprocess(&self) -> PostProcessSettings {
        PostProcessSettings {
            bloom_enabled: self.render.bloom.enabled,
            bloom_threshold: self.render.bloom.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_round_trip() {
        let settings = EngineSettings::default();
        let json = settings.to_json().unwrap();
        let back = EngineSettings::from_json(&json).unwrap();
        assert_eq!(back.render.width, settings.render.width);
        assert_eq!(back.render.bloom.enabled, settings.render.bloom.enabled);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings = EngineSettings::from_json(r#"{"render":{"width":640}}"#).unwrap();
        assert_eq!(settings.render.width, 640);
        assert_eq!(settings.render.height, 720);
    }
}

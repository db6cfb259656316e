use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;
use crate::traversal::LoopPolicy;

pub mod defaults {
    pub mod terrain {
        pub const HEIGHT_SCALE: f32 = 105.0;
        pub const HORIZONTAL_SCALE: f32 = 1.0;
        pub const SAMPLE_JITTER: f32 = 1.2;
        pub const DISPLACEMENT_FRACTION: f32 = 0.6;
        pub const DECAY_BASE: f32 = 1.5;
        pub const ROUGHNESS: f32 = 1.2;
    }
    pub mod path {
        pub const SCALE: f32 = 1.0;
        pub const OFFSET: f32 = 0.5;
    }
    pub mod marker {
        pub const SPEED: f32 = 40.0;
        pub const OFFSET: f32 = 0.0;
    }
    pub mod figure {
        pub const SPEED: f32 = 5.0;
        pub const OFFSET: f32 = 2.0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Fixed seed for every random draw; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Elevation of a white heightmap pixel.
    pub height_scale: f32,
    /// World distance between neighbouring grid cells.
    pub horizontal_scale: f32,
    pub sample_jitter: f32,
    /// First-pass displacement as a fraction of the seed's elevation range.
    pub displacement_fraction: f32,
    pub decay_base: f32,
    pub roughness: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: None,
            height_scale: defaults::terrain::HEIGHT_SCALE,
            horizontal_scale: defaults::terrain::HORIZONTAL_SCALE,
            sample_jitter: defaults::terrain::SAMPLE_JITTER,
            displacement_fraction: defaults::terrain::DISPLACEMENT_FRACTION,
            decay_base: defaults::terrain::DECAY_BASE,
            roughness: defaults::terrain::ROUGHNESS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Multiplier applied to raw waypoint x and z.
    pub scale: f32,
    /// Height of aligned waypoints above the surface.
    pub offset: f32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            scale: defaults::path::SCALE,
            offset: defaults::path::OFFSET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravellerConfig {
    /// World units per second.
    pub speed: f32,
    /// Height above the surface.
    pub offset: f32,
    pub policy: LoopPolicy,
}

impl TravellerConfig {
    pub fn marker() -> Self {
        Self {
            speed: defaults::marker::SPEED,
            offset: defaults::marker::OFFSET,
            policy: LoopPolicy::ClampAtEnds,
        }
    }

    pub fn figure() -> Self {
        Self {
            speed: defaults::figure::SPEED,
            offset: defaults::figure::OFFSET,
            policy: LoopPolicy::Wrap,
        }
    }
}

/// A traveller section as written in JSON; missing keys keep the preset.
#[derive(Debug, Deserialize)]
struct TravellerSection {
    speed: Option<f32>,
    offset: Option<f32>,
    policy: Option<LoopPolicy>,
}

impl TravellerSection {
    fn over(self, preset: TravellerConfig) -> TravellerConfig {
        TravellerConfig {
            speed: self.speed.unwrap_or(preset.speed),
            offset: self.offset.unwrap_or(preset.offset),
            policy: self.policy.unwrap_or(preset.policy),
        }
    }
}

fn marker_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TravellerConfig, D::Error> {
    TravellerSection::deserialize(deserializer).map(|s| s.over(TravellerConfig::marker()))
}

fn figure_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TravellerConfig, D::Error> {
    TravellerSection::deserialize(deserializer).map(|s| s.over(TravellerConfig::figure()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub terrain: TerrainConfig,
    pub path: PathConfig,
    #[serde(deserialize_with = "marker_section")]
    pub marker: TravellerConfig,
    #[serde(deserialize_with = "figure_section")]
    pub figure: TravellerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainConfig::default(),
            path: PathConfig::default(),
            marker: TravellerConfig::marker(),
            figure: TravellerConfig::figure(),
        }
    }
}

impl SimulationConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.terrain;
        positive("height_scale", t.height_scale)?;
        positive("horizontal_scale", t.horizontal_scale)?;
        non_negative("sample_jitter", t.sample_jitter)?;
        non_negative("displacement_fraction", t.displacement_fraction)?;
        positive("decay_base", t.decay_base)?;
        finite("roughness", t.roughness)?;

        positive("path.scale", self.path.scale)?;
        finite("path.offset", self.path.offset)?;

        positive("marker.speed", self.marker.speed)?;
        finite("marker.offset", self.marker.offset)?;
        positive("figure.speed", self.figure.speed)?;
        finite("figure.offset", self.figure.offset)?;
        Ok(())
    }
}

fn finite(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidSetting { name, value })
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSetting { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSetting { name, value })
    }
}

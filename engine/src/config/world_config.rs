//! Ring World Configuration
//!
//! One JSON document describing the ring, its field, flip tuning, float
//! bands and orbit tuning. Every section is `#[serde(default)]`, so a file
//! only needs the values it changes:
//!
//! ```json
//! {
//!     "ring": { "radius": 250.0, "falloff": "smooth_step" },
//!     "float_zones": [ { "altitude": 80.0, "height": 12.0 } ]
//! }
//! ```
//!
//! Bad values are never fatal. [`RingWorldConfig::sanitized`] clamps them
//! to safe minimums and logs a warning for each.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::gravity::DirectionConfig;
use crate::gravity::direction::MIN_FLIP_DURATION;
use crate::orbit::OrbitConfig;
use crate::physics::field::{GravityField, GravityFieldConfig, MIN_INFLUENCE_DISTANCE};
use crate::physics::ring::{FalloffCurve, MIN_RING_RADIUS, RingGeometry};
use crate::physics::types::checked_direction;
use crate::zones::FloatZoneConfig;

/// Errors that can occur while loading a configuration document.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("config I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON for this schema
    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ring geometry section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// World-space center of the ring
    pub center: Vec3,
    /// Rotation axis (normalized on load)
    pub axis: Vec3,
    /// Surface radius (meters)
    pub radius: f32,
    /// Gravity falloff over normalized distance from the surface
    pub falloff: FalloffCurve,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            axis: Vec3::Y,
            radius: 100.0,
            falloff: FalloffCurve::Linear,
        }
    }
}

/// Complete configuration for a ring world simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingWorldConfig {
    pub ring: RingConfig,
    pub field: GravityFieldConfig,
    pub direction: DirectionConfig,
    pub float_zones: Vec<FloatZoneConfig>,
    pub orbit: OrbitConfig,
}

impl Default for RingWorldConfig {
    fn default() -> Self {
        Self {
            ring: RingConfig::default(),
            field: GravityFieldConfig::default(),
            direction: DirectionConfig::default(),
            float_zones: vec![FloatZoneConfig::default()],
            orbit: OrbitConfig::default(),
        }
    }
}

impl RingWorldConfig {
    /// Parse a JSON document. Values are not sanitized yet.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Copy with every out-of-range value clamped to a safe minimum.
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();

        // Ring
        config.ring.axis = match checked_direction(self.ring.axis) {
            Some(axis) => axis,
            None => {
                warn!(axis = ?self.ring.axis, "degenerate ring axis, using +Y");
                Vec3::Y
            }
        };
        if !config.ring.center.is_finite() {
            warn!(center = ?self.ring.center, "non-finite ring center, using origin");
            config.ring.center = Vec3::ZERO;
        }
        config.ring.radius = at_least("ring.radius", self.ring.radius, MIN_RING_RADIUS);
        let (falloff, repaired) = self.ring.falloff.sanitized();
        if repaired {
            warn!(?falloff, "falloff curve repaired");
        }
        config.ring.falloff = falloff;

        // Field
        config.field.strength = at_least("field.strength", self.field.strength, 0.0);
        config.field.max_influence_distance = at_least(
            "field.max_influence_distance",
            self.field.max_influence_distance,
            MIN_INFLUENCE_DISTANCE,
        );

        // Direction
        let direction = &mut config.direction;
        direction.flip_duration = at_least("direction.flip_duration", direction.flip_duration, MIN_FLIP_DURATION);
        direction.min_flip_angle_deg = within("direction.min_flip_angle_deg", direction.min_flip_angle_deg, 0.0, 180.0);
        direction.max_aim_angle_deg = within(
            "direction.max_aim_angle_deg",
            direction.max_aim_angle_deg,
            direction.min_flip_angle_deg,
            180.0,
        );
        direction.aim_cone_angle_deg = within("direction.aim_cone_angle_deg", direction.aim_cone_angle_deg, 0.0, 180.0);
        direction.aim_sensitivity = at_least("direction.aim_sensitivity", direction.aim_sensitivity, 0.0);

        // Float zones
        for (index, zone) in config.float_zones.iter_mut().enumerate() {
            if !zone.altitude.is_finite() {
                warn!(zone = index, "non-finite float zone altitude, using 0");
                zone.altitude = 0.0;
            }
            zone.height = at_least("float_zone.height", zone.height, 0.0);
            zone.transition_width = at_least("float_zone.transition_width", zone.transition_width, 0.0);
            zone.damping = within("float_zone.damping", zone.damping, 0.0, 1.0);
            zone.oscillation_amplitude = at_least("float_zone.oscillation_amplitude", zone.oscillation_amplitude, 0.0);
            zone.oscillation_frequency = at_least("float_zone.oscillation_frequency", zone.oscillation_frequency, 0.0);
            zone.immersion_delay = at_least("float_zone.immersion_delay", zone.immersion_delay, 0.0);
            if zone.max_tracked == 0 {
                warn!(zone = index, "float zone capacity 0, using 1");
                zone.max_tracked = 1;
            }
        }

        // Orbit
        let orbit = &mut config.orbit;
        orbit.min_altitude = at_least("orbit.min_altitude", orbit.min_altitude, 0.0);
        orbit.max_altitude = at_least("orbit.max_altitude", orbit.max_altitude, orbit.min_altitude);
        orbit.velocity_multiplier = at_least("orbit.velocity_multiplier", orbit.velocity_multiplier, 0.0);
        orbit.velocity_match_threshold = within("orbit.velocity_match_threshold", orbit.velocity_match_threshold, -1.0, 1.0);
        orbit.decay_match_threshold = within(
            "orbit.decay_match_threshold",
            orbit.decay_match_threshold,
            -1.0,
            orbit.velocity_match_threshold,
        );
        orbit.stabilization_strength = at_least("orbit.stabilization_strength", orbit.stabilization_strength, 0.0);
        orbit.velocity_nudge_factor = at_least("orbit.velocity_nudge_factor", orbit.velocity_nudge_factor, 0.0);
        orbit.stability_decay_rate = at_least("orbit.stability_decay_rate", orbit.stability_decay_rate, 0.0);

        config
    }

    pub fn build_geometry(&self) -> RingGeometry {
        RingGeometry::new(
            self.ring.center,
            self.ring.axis,
            self.ring.radius,
            self.ring.falloff.clone(),
        )
    }

    pub fn build_field(&self) -> GravityField {
        GravityField::new(self.build_geometry(), self.field)
    }
}

fn at_least(name: &str, value: f32, min: f32) -> f32 {
    if value.is_finite() && value >= min {
        return value;
    }
    warn!(setting = name, value, min, "config value clamped");
    min
}

fn within(name: &str, value: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() && value >= min && value <= max {
        return value;
    }
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    warn!(setting = name, value, clamped, "config value clamped");
    clamped
}

//! Ring gravity field evaluation
//!
//! Pure functions of [`RingGeometry`] plus [`GravityFieldConfig`]: no state
//! is kept between calls and nothing here can fail.
//!
//! # Direction Model
//!
//! Gravity pulls toward the ring surface along the radial axis. An occupant
//! outside the surface is pulled inward, an occupant inside is pulled
//! outward. On the axis itself the radial direction is undefined and the
//! field falls back to `-axis`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::ring::RingGeometry;

/// Smallest influence distance the field accepts (meters).
pub const MIN_INFLUENCE_DISTANCE: f32 = 0.01;

/// Strength and reach of the ring gravity field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityFieldConfig {
    /// Gravity acceleration at the surface (m/s²)
    pub strength: f32,
    /// Distance from the surface where the field ends (meters)
    pub max_influence_distance: f32,
}

impl Default for GravityFieldConfig {
    fn default() -> Self {
        Self {
            strength: 9.81,
            max_influence_distance: 200.0,
        }
    }
}

/// Evaluates ring gravity for arbitrary world positions.
#[derive(Debug, Clone)]
pub struct GravityField {
    geometry: RingGeometry,
    config: GravityFieldConfig,
}

impl GravityField {
    pub fn new(geometry: RingGeometry, config: GravityFieldConfig) -> Self {
        let config = GravityFieldConfig {
            strength: if config.strength.is_finite() { config.strength.max(0.0) } else { 0.0 },
            max_influence_distance: if config.max_influence_distance.is_finite() {
                config.max_influence_distance.max(MIN_INFLUENCE_DISTANCE)
            } else {
                MIN_INFLUENCE_DISTANCE
            },
        };
        Self { geometry, config }
    }

    pub fn geometry(&self) -> &RingGeometry {
        &self.geometry
    }

    pub fn config(&self) -> &GravityFieldConfig {
        &self.config
    }

    pub fn strength(&self) -> f32 {
        self.config.strength
    }

    /// Signed altitude above the ring surface (positive = outside).
    pub fn distance_from_surface(&self, position: Vec3) -> f32 {
        self.geometry.distance_from_surface(position)
    }

    /// Deterministic direction used when a position sits on the axis.
    pub fn fallback_direction(&self) -> Vec3 {
        -self.geometry.axis()
    }

    /// Unit gravity direction at `position`, pointing toward the surface.
    pub fn direction(&self, position: Vec3) -> Vec3 {
        let Some(radial) = self.geometry.radial_direction(position) else {
            return self.fallback_direction();
        };
        if self.distance_from_surface(position) >= 0.0 {
            -radial
        } else {
            radial
        }
    }

    /// Falloff-scaled strength at `position`, zero beyond the influence distance.
    pub fn magnitude(&self, position: Vec3) -> f32 {
        let distance = self.distance_from_surface(position).abs();
        if distance > self.config.max_influence_distance {
            return 0.0;
        }
        let normalized = (distance / self.config.max_influence_distance).clamp(0.0, 1.0);
        self.config.strength * self.geometry.falloff().evaluate(normalized)
    }

    /// Gravity acceleration vector at `position`.
    pub fn gravity(&self, position: Vec3) -> Vec3 {
        let magnitude = self.magnitude(position);
        if magnitude == 0.0 {
            return Vec3::ZERO;
        }
        self.direction(position) * magnitude
    }

    /// Local "up" at `position` (opposite of the field direction).
    pub fn up(&self, position: Vec3) -> Vec3 {
        -self.direction(position)
    }
}

impl Default for GravityField {
    fn default() -> Self {
        Self::new(RingGeometry::default(), GravityFieldConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::ring::FalloffCurve;

    const EPSILON: f32 = 1.0e-4;

    fn field() -> GravityField {
        GravityField::new(
            RingGeometry::new(Vec3::ZERO, Vec3::Y, 100.0, FalloffCurve::Linear),
            GravityFieldConfig {
                strength: 9.81,
                max_influence_distance: 200.0,
            },
        )
    }

    #[test]
    fn test_outside_ring_pulls_inward() {
        let field = field();
        let position = Vec3::new(150.0, 0.0, 0.0);

        assert!((field.distance_from_surface(position) - 50.0).abs() < EPSILON);
        assert!(field.direction(position).distance(Vec3::NEG_X) < EPSILON);

        let expected = 9.81 * FalloffCurve::Linear.evaluate(0.25);
        assert!((field.gravity(position).length() - expected).abs() < EPSILON);
    }

    #[test]
    fn test_inside_ring_pulls_outward() {
        let field = field();
        let position = Vec3::new(0.0, 3.0, -40.0);
        assert!(field.direction(position).distance(Vec3::NEG_Z) < EPSILON);
        assert!(field.up(position).distance(Vec3::Z) < EPSILON);
    }

    #[test]
    fn test_axis_fallback_is_unit() {
        let field = field();
        let direction = field.direction(Vec3::new(0.0, 12.0, 0.0));
        assert_eq!(direction, Vec3::NEG_Y);
        assert!((direction.length() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_beyond_influence_is_zero() {
        let field = field();
        assert_eq!(field.gravity(Vec3::new(300.5, 0.0, 0.0)), Vec3::ZERO);
        assert_eq!(field.gravity(Vec3::new(0.0, 0.0, 1000.0)), Vec3::ZERO);
    }

    #[test]
    fn test_config_is_clamped() {
        let field = GravityField::new(
            RingGeometry::default(),
            GravityFieldConfig {
                strength: -4.0,
                max_influence_distance: 0.0,
            },
        );
        assert_eq!(field.strength(), 0.0);
        assert_eq!(field.config().max_influence_distance, MIN_INFLUENCE_DISTANCE);
    }
}

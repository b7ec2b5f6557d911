//! Ring habitat geometry
//!
//! Describes the ring the whole world is built around: a center point, a
//! rotation axis, a surface radius and the falloff curve gravity follows
//! as an occupant moves away from the surface.
//!
//! # Coordinate Conventions
//!
//! - Positions are projected onto the plane through `center` orthogonal
//!   to `axis` before any distance is measured.
//! - "Altitude" is the signed distance of that projection from the
//!   surface: positive outside the ring, negative inside.
//!
//! # Example
//!
//! ```ignore
//! use ring_gravity_engine::physics::ring::{FalloffCurve, RingGeometry};
//! use glam::Vec3;
//!
//! let ring = RingGeometry::new(Vec3::ZERO, Vec3::Y, 100.0, FalloffCurve::Linear);
//! assert_eq!(ring.distance_from_surface(Vec3::new(150.0, 0.0, 0.0)), 50.0);
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::types::DEGENERATE_LENGTH_SQ;

/// Smallest radius a ring may have (meters).
pub const MIN_RING_RADIUS: f32 = 0.01;

/// Distance from the axis below which a position counts as "on the axis".
pub const AXIS_EPSILON: f32 = 1.0e-4;

/// Gravity falloff over normalized distance from the surface.
///
/// Every curve maps `t ∈ [0, 1]` (0 = on the surface, 1 = at the edge of
/// the field's influence) into `[0, 1]` and is non-increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FalloffCurve {
    /// Full strength everywhere inside the influence distance.
    Constant,
    /// `1 - t`
    #[default]
    Linear,
    /// `1 - t²`, holds strength near the surface longer than linear.
    Quadratic,
    /// `1 - smoothstep(t)`
    SmoothStep,
    /// Piecewise-linear curve through `(t, value)` points.
    Keyframes(Vec<(f32, f32)>),
}

impl FalloffCurve {
    /// Evaluate the curve, clamping `t` into `[0, 1]`.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 1.0 } else { t.clamp(0.0, 1.0) };
        let value = match self {
            FalloffCurve::Constant => 1.0,
            FalloffCurve::Linear => 1.0 - t,
            FalloffCurve::Quadratic => 1.0 - t * t,
            FalloffCurve::SmoothStep => 1.0 - t * t * (3.0 - 2.0 * t),
            FalloffCurve::Keyframes(points) => sample_keyframes(points, t),
        };
        value.clamp(0.0, 1.0)
    }

    /// Repair a degenerate curve so that it is a valid falloff.
    ///
    /// Keyframes are sorted by `t`, clamped into the unit square and made
    /// non-increasing. An empty keyframe list degrades to `Constant`.
    /// Returns the repaired curve and whether anything changed.
    pub fn sanitized(&self) -> (FalloffCurve, bool) {
        let FalloffCurve::Keyframes(points) = self else {
            return (self.clone(), false);
        };

        let mut repaired: Vec<(f32, f32)> = points
            .iter()
            .filter(|(t, v)| t.is_finite() && v.is_finite())
            .map(|&(t, v)| (t.clamp(0.0, 1.0), v.clamp(0.0, 1.0)))
            .collect();
        if repaired.is_empty() {
            return (FalloffCurve::Constant, true);
        }

        repaired.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut running = f32::INFINITY;
        for point in &mut repaired {
            running = running.min(point.1);
            point.1 = running;
        }

        let changed = repaired != *points;
        (FalloffCurve::Keyframes(repaired), changed)
    }
}

fn sample_keyframes(points: &[(f32, f32)], t: f32) -> f32 {
    let Some(&(first_t, first_v)) = points.first() else {
        return 1.0;
    };
    if t <= first_t {
        return first_v;
    }
    for pair in points.windows(2) {
        let (t0, v0) = pair[0];
        let (t1, v1) = pair[1];
        if t <= t1 {
            let span = t1 - t0;
            if span <= f32::EPSILON {
                return v1;
            }
            return v0 + (v1 - v0) * ((t - t0) / span);
        }
    }
    points.last().map_or(1.0, |p| p.1)
}

/// Immutable description of the ring.
///
/// Constructed once at world setup. Hot reload replaces the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct RingGeometry {
    center: Vec3,
    axis: Vec3,
    radius: f32,
    falloff: FalloffCurve,
}

impl RingGeometry {
    /// Create a ring. The axis is normalized (falling back to +Y when
    /// degenerate) and the radius clamped to [`MIN_RING_RADIUS`].
    pub fn new(center: Vec3, axis: Vec3, radius: f32, falloff: FalloffCurve) -> Self {
        let axis = if axis.is_finite() && axis.length_squared() > DEGENERATE_LENGTH_SQ {
            axis.normalize()
        } else {
            Vec3::Y
        };
        let radius = if radius.is_finite() {
            radius.max(MIN_RING_RADIUS)
        } else {
            MIN_RING_RADIUS
        };
        let (falloff, _) = falloff.sanitized();

        Self {
            center,
            axis,
            radius,
            falloff,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn falloff(&self) -> &FalloffCurve {
        &self.falloff
    }

    /// Offset from the axis to `position`, within the ring plane.
    pub fn planar_offset(&self, position: Vec3) -> Vec3 {
        let relative = position - self.center;
        relative - self.axis * relative.dot(self.axis)
    }

    /// Distance of the planar projection of `position` from the axis.
    pub fn distance_from_axis(&self, position: Vec3) -> f32 {
        self.planar_offset(position).length()
    }

    /// Signed altitude above the ring surface (positive = outside).
    pub fn distance_from_surface(&self, position: Vec3) -> f32 {
        self.distance_from_axis(position) - self.radius
    }

    /// Unit vector pointing away from the axis within the ring plane.
    ///
    /// Returns `None` when the position sits on the axis.
    pub fn radial_direction(&self, position: Vec3) -> Option<Vec3> {
        let offset = self.planar_offset(position);
        let distance = offset.length();
        if distance < AXIS_EPSILON {
            None
        } else {
            Some(offset / distance)
        }
    }

    /// Closest point on the ring surface, in the plane of `position`.
    pub fn closest_surface_point(&self, position: Vec3) -> Vec3 {
        let relative = position - self.center;
        let along_axis = self.axis * relative.dot(self.axis);
        let radial = self.radial_direction(position).unwrap_or_else(|| self.axis.any_orthonormal_vector());
        self.center + along_axis + radial * self.radius
    }

    /// Direction of travel around the axis at `position`.
    ///
    /// This is the tangent of a circular orbit in the ring plane. Zero on
    /// the axis.
    pub fn orbital_tangent(&self, position: Vec3) -> Vec3 {
        self.radial_direction(position)
            .map_or(Vec3::ZERO, |radial| self.axis.cross(radial))
    }
}

impl Default for RingGeometry {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Y, 100.0, FalloffCurve::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1.0e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_distance_ignores_axial_offset() {
        let ring = RingGeometry::default();
        assert!(approx_eq(ring.distance_from_surface(Vec3::new(150.0, 0.0, 0.0)), 50.0));
        assert!(approx_eq(ring.distance_from_surface(Vec3::new(150.0, 40.0, 0.0)), 50.0));
        assert!(approx_eq(ring.distance_from_surface(Vec3::new(0.0, 0.0, 60.0)), -40.0));
    }

    #[test]
    fn test_constructor_clamps_degenerate_input() {
        let ring = RingGeometry::new(Vec3::ZERO, Vec3::ZERO, 0.0, FalloffCurve::Keyframes(vec![]));
        assert_eq!(ring.axis(), Vec3::Y);
        assert_eq!(ring.radius(), MIN_RING_RADIUS);
        assert_eq!(*ring.falloff(), FalloffCurve::Constant);

        let tilted = RingGeometry::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0), -3.0, FalloffCurve::Linear);
        assert!(approx_eq(tilted.axis().length(), 1.0));
        assert_eq!(tilted.radius(), MIN_RING_RADIUS);
    }

    #[test]
    fn test_radial_direction_on_axis_is_none() {
        let ring = RingGeometry::default();
        assert!(ring.radial_direction(Vec3::new(0.0, 25.0, 0.0)).is_none());
        assert_eq!(ring.orbital_tangent(Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn test_closest_surface_point() {
        let ring = RingGeometry::default();
        let point = ring.closest_surface_point(Vec3::new(0.0, 7.0, 250.0));
        assert!(point.distance(Vec3::new(0.0, 7.0, 100.0)) < EPSILON);
    }

    #[test]
    fn test_orbital_tangent_is_perpendicular() {
        let ring = RingGeometry::default();
        let position = Vec3::new(120.0, 0.0, 30.0);
        let tangent = ring.orbital_tangent(position);
        let radial = ring.radial_direction(position).unwrap();
        assert!(approx_eq(tangent.length(), 1.0));
        assert!(tangent.dot(radial).abs() < EPSILON);
        assert!(tangent.dot(ring.axis()).abs() < EPSILON);
    }

    #[test]
    fn test_falloff_curves_hit_endpoints() {
        for curve in [
            FalloffCurve::Linear,
            FalloffCurve::Quadratic,
            FalloffCurve::SmoothStep,
        ] {
            assert!(approx_eq(curve.evaluate(0.0), 1.0), "{curve:?}");
            assert!(approx_eq(curve.evaluate(1.0), 0.0), "{curve:?}");
            assert!(curve.evaluate(0.3) >= curve.evaluate(0.6), "{curve:?}");
        }
        assert!(approx_eq(FalloffCurve::Constant.evaluate(0.9), 1.0));
        assert!(approx_eq(FalloffCurve::Linear.evaluate(0.25), 0.75));
        assert!(approx_eq(FalloffCurve::Linear.evaluate(-2.0), 1.0));
    }

    #[test]
    fn test_keyframes_are_repaired_and_interpolated() {
        let raw = FalloffCurve::Keyframes(vec![(1.0, 0.0), (0.0, 1.0), (0.5, 0.8), (0.75, 0.9)]);
        let (curve, changed) = raw.sanitized();
        assert!(changed);

        let FalloffCurve::Keyframes(points) = &curve else {
            panic!("expected keyframes");
        };
        for pair in points.windows(2) {
            assert!(pair[0].0 <= pair[1].0);
            assert!(pair[0].1 >= pair[1].1);
        }

        assert!(approx_eq(curve.evaluate(0.25), 0.9));
        assert!(approx_eq(curve.evaluate(1.0), 0.0));
    }
}

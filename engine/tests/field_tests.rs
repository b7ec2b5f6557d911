//! Field Tests - Ring Geometry, Falloff and Configuration Documents
//!
//! Tests for the gravity field as the rest of the engine sees it, plus
//! loading and saving the JSON configuration.

use glam::Vec3;
use ring_gravity_engine::config::{ConfigError, RingWorldConfig};
use ring_gravity_engine::physics::{FalloffCurve, GravityField, GravityFieldConfig, RingGeometry};

const EPSILON: f32 = 1.0e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn field_with(falloff: FalloffCurve) -> GravityField {
    GravityField::new(
        RingGeometry::new(Vec3::ZERO, Vec3::Y, 100.0, falloff),
        GravityFieldConfig {
            strength: 9.81,
            max_influence_distance: 200.0,
        },
    )
}

// ============================================================================
// Direction and Magnitude
// ============================================================================

#[test]
fn test_outside_ring_points_inward() {
    let field = field_with(FalloffCurve::Linear);
    let position = Vec3::new(150.0, 0.0, 0.0);

    assert!(approx_eq(field.distance_from_surface(position), 50.0));
    assert_eq!(field.direction(position), Vec3::NEG_X);
    assert!(approx_eq(field.magnitude(position), 9.81 * 0.75));
    assert!(field.gravity(position).distance(Vec3::new(-9.81 * 0.75, 0.0, 0.0)) < EPSILON);
}

#[test]
fn test_inside_ring_points_outward() {
    let field = field_with(FalloffCurve::Linear);
    let position = Vec3::new(0.0, 0.0, -60.0);

    assert!(approx_eq(field.distance_from_surface(position), -40.0));
    assert_eq!(field.direction(position), Vec3::NEG_Z);
    assert!(approx_eq(field.magnitude(position), 9.81 * 0.8));
    assert_eq!(field.up(position), Vec3::Z);
}

#[test]
fn test_axial_offset_does_not_change_altitude() {
    let field = field_with(FalloffCurve::Linear);
    let on_plane = Vec3::new(150.0, 0.0, 0.0);
    let above_plane = Vec3::new(150.0, 30.0, 0.0);

    assert_eq!(field.distance_from_surface(on_plane), field.distance_from_surface(above_plane));
    assert_eq!(field.direction(on_plane), field.direction(above_plane));
}

#[test]
fn test_on_axis_uses_fallback() {
    let field = field_with(FalloffCurve::Linear);
    let direction = field.direction(Vec3::new(0.0, 12.0, 0.0));
    assert_eq!(direction, Vec3::NEG_Y);
    assert!(direction.is_finite());
}

#[test]
fn test_beyond_influence_is_zero() {
    let field = field_with(FalloffCurve::Constant);
    assert_eq!(field.magnitude(Vec3::new(301.0, 0.0, 0.0)), 0.0);
    assert_eq!(field.gravity(Vec3::new(301.0, 0.0, 0.0)), Vec3::ZERO);
    assert!(approx_eq(field.magnitude(Vec3::new(299.0, 0.0, 0.0)), 9.81));
}

#[test]
fn test_falloff_curves_shape_magnitude() {
    // Normalized distance 0.5
    let position = Vec3::new(200.0, 0.0, 0.0);
    let cases = [
        (FalloffCurve::Constant, 1.0),
        (FalloffCurve::Linear, 0.5),
        (FalloffCurve::Quadratic, 0.75),
        (FalloffCurve::SmoothStep, 0.5),
        (FalloffCurve::Keyframes(vec![(0.0, 1.0), (0.25, 0.5), (1.0, 0.0)]), 1.0 / 3.0),
    ];

    for (curve, scale) in cases {
        let field = field_with(curve.clone());
        assert!(
            approx_eq(field.magnitude(position), 9.81 * scale),
            "{curve:?}: expected {} got {}",
            9.81 * scale,
            field.magnitude(position)
        );
    }
}

#[test]
fn test_magnitude_never_increases_with_distance() {
    let field = field_with(FalloffCurve::SmoothStep);
    let mut previous = f32::INFINITY;
    for step in 0..=40 {
        let magnitude = field.magnitude(Vec3::new(100.0 + step as f32 * 5.0, 0.0, 0.0));
        assert!(magnitude <= previous + EPSILON);
        previous = magnitude;
    }
}

#[test]
fn test_tilted_ring() {
    let axis = Vec3::new(1.0, 1.0, 0.0).normalize();
    let field = GravityField::new(
        RingGeometry::new(Vec3::new(10.0, 0.0, 0.0), axis, 50.0, FalloffCurve::Linear),
        GravityFieldConfig::default(),
    );

    let radial = axis.any_orthonormal_vector();
    let position = Vec3::new(10.0, 0.0, 0.0) + radial * 70.0 + axis * 5.0;

    assert!(approx_eq(field.distance_from_surface(position), 20.0));
    assert!(field.direction(position).distance(-radial) < EPSILON);
}

// ============================================================================
// Configuration Documents
// ============================================================================

#[test]
fn test_config_file_round_trip() {
    let mut config = RingWorldConfig::default();
    config.ring.radius = 320.0;
    config.ring.falloff = FalloffCurve::Keyframes(vec![(0.0, 1.0), (1.0, 0.2)]);
    config.field.strength = 12.0;
    config.orbit.max_altitude = 400.0;

    let path = std::env::temp_dir().join(format!("ring_world_config_{}.json", std::process::id()));
    config.save(&path).unwrap();
    let loaded = RingWorldConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, config);
}

#[test]
fn test_empty_document_is_default() {
    let config = RingWorldConfig::from_json_str("{}").unwrap();
    assert_eq!(config, RingWorldConfig::default());
}

#[test]
fn test_unknown_falloff_is_parse_error() {
    let result = RingWorldConfig::from_json_str(r#"{ "ring": { "falloff": "cubic" } }"#);
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_sanitized_config_builds_usable_field() {
    let mut config = RingWorldConfig::default();
    config.ring.radius = -5.0;
    config.ring.axis = Vec3::ZERO;
    config.field.max_influence_distance = 0.0;

    let field = config.sanitized().build_field();
    assert!(field.geometry().radius() > 0.0);
    assert_eq!(field.geometry().axis(), Vec3::Y);

    let direction = field.direction(Vec3::new(3.0, 0.0, 0.0));
    assert!(direction.is_finite());
    assert!(approx_eq(direction.length(), 1.0));
}

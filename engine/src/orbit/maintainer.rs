//! Orbital Maintenance
//!
//! Detects when an occupant is moving fast enough, tangentially enough,
//! inside the orbital altitude band, and from then on holds it there with
//! small corrections instead of letting raw gravity act on it.
//!
//! # Physics Model
//!
//! - Ideal orbital speed: `v = sqrt(g * altitude) * velocity_multiplier`
//!   (a circular-orbit approximation; the field's falloff is ignored)
//! - Ideal direction: tangent of a circle around the ring axis, signed to
//!   match the occupant's current heading
//! - Altitude correction: `a = up * (stored_altitude - altitude) * k`.
//!   The stored altitude is refreshed to the current altitude every tick,
//!   so this only opposes the drift since the previous tick. It damps
//!   sudden altitude changes but does not hold a fixed altitude: an orbiter
//!   that drifts slowly stays in orbit at its new height as long as it
//!   remains inside the band. Hosts that need a pinned altitude must add
//!   their own correction.
//! - Velocity nudge: `v += (v_ideal - v) * k * nudge_factor`, applied
//!   instantly so it cannot overshoot through integration
//!
//! # Stability
//!
//! Starts at 1 on entry. Each tick it drops by `stability_decay_rate * dt`
//! while out of band or badly aligned, otherwise recovers at half that
//! rate. At 0 the orbit decays and the occupant is grounded again.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gravity::{EventQueue, GravityEvent, OccupantGravityState, OccupantId};
use crate::physics::field::GravityField;
use crate::physics::types::checked_direction;

/// Tuning for orbit detection and maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    /// Lowest altitude an orbit can hold (meters)
    pub min_altitude: f32,
    /// Highest altitude an orbit can hold (meters)
    pub max_altitude: f32,
    /// Scales the ideal orbital speed
    pub velocity_multiplier: f32,
    /// Heading alignment required to establish an orbit (cosine)
    pub velocity_match_threshold: f32,
    /// Alignment below which an established orbit loses stability (cosine)
    pub decay_match_threshold: f32,
    /// Gain for the altitude correction and velocity nudge
    pub stabilization_strength: f32,
    /// Fraction of the stabilization gain used for the velocity nudge
    pub velocity_nudge_factor: f32,
    /// Stability lost per second while failing orbital conditions
    pub stability_decay_rate: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            min_altitude: 20.0,
            max_altitude: 150.0,
            velocity_multiplier: 1.0,
            velocity_match_threshold: 0.95,
            decay_match_threshold: 0.8,
            stabilization_strength: 0.5,
            velocity_nudge_factor: 0.1,
            stability_decay_rate: 0.5,
        }
    }
}

/// Orbit state of an occupant, derived from `OccupantGravityState::in_orbit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitPhase {
    Grounded,
    Orbiting,
}

/// Velocity and acceleration the maintainer wants applied this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitUpdate {
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

/// Detects and maintains stable orbits.
#[derive(Debug, Clone, Default)]
pub struct OrbitalMaintainer {
    config: OrbitConfig,
}

impl OrbitalMaintainer {
    pub fn new(config: OrbitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: OrbitConfig) {
        self.config = config;
    }

    pub fn phase(state: &OccupantGravityState) -> OrbitPhase {
        if state.in_orbit {
            OrbitPhase::Orbiting
        } else {
            OrbitPhase::Grounded
        }
    }

    pub fn in_orbital_band(&self, altitude: f32) -> bool {
        altitude >= self.config.min_altitude && altitude <= self.config.max_altitude
    }

    /// Ideal circular-orbit speed at `altitude`.
    pub fn ideal_speed(&self, field: &GravityField, altitude: f32) -> f32 {
        (field.strength() * altitude.max(0.0)).sqrt() * self.config.velocity_multiplier
    }

    /// Unit orbital tangent at `position`, signed to agree with `velocity`.
    /// Zero on the ring axis.
    pub fn ideal_direction(&self, field: &GravityField, position: Vec3, velocity: Vec3) -> Vec3 {
        let tangent = field.geometry().orbital_tangent(position);
        if tangent.dot(velocity) < 0.0 { -tangent } else { tangent }
    }

    /// Ideal orbital velocity at `position`.
    pub fn ideal_velocity(&self, field: &GravityField, position: Vec3, velocity: Vec3) -> Vec3 {
        let altitude = field.distance_from_surface(position);
        self.ideal_direction(field, position, velocity) * self.ideal_speed(field, altitude)
    }

    /// Cosine similarity between the velocity heading and the ideal
    /// orbital direction; 0 when either is degenerate.
    pub fn velocity_match(&self, field: &GravityField, position: Vec3, velocity: Vec3) -> f32 {
        let Some(heading) = checked_direction(velocity) else {
            return 0.0;
        };
        let ideal = self.ideal_direction(field, position, velocity);
        if ideal == Vec3::ZERO {
            return 0.0;
        }
        heading.dot(ideal)
    }

    /// Enter orbit if the occupant satisfies orbital conditions.
    ///
    /// Only evaluated while grounded, so repeated calls in orbit never
    /// raise a second `OrbitEstablished`.
    pub fn try_establish(
        &self,
        occupant: OccupantId,
        field: &GravityField,
        position: Vec3,
        velocity: Vec3,
        state: &mut OccupantGravityState,
        events: &mut EventQueue,
    ) -> bool {
        if state.in_orbit {
            return false;
        }
        let altitude = field.distance_from_surface(position);
        if !self.in_orbital_band(altitude) {
            return false;
        }
        if self.velocity_match(field, position, velocity) < self.config.velocity_match_threshold {
            return false;
        }

        state.in_orbit = true;
        state.orbital_altitude = altitude;
        state.orbital_speed = velocity.length();
        state.orbit_stability = 1.0;
        events.push(GravityEvent::OrbitEstablished { occupant, altitude });
        debug!(occupant = occupant.0, altitude, speed = state.orbital_speed, "orbit established");
        true
    }

    /// Hold an orbiting occupant near its altitude and ideal velocity, and
    /// update its stability score.
    #[allow(clippy::too_many_arguments)]
    pub fn maintain(
        &self,
        occupant: OccupantId,
        dt: f32,
        field: &GravityField,
        position: Vec3,
        velocity: Vec3,
        state: &mut OccupantGravityState,
        events: &mut EventQueue,
    ) -> OrbitUpdate {
        let passthrough = OrbitUpdate {
            velocity,
            acceleration: Vec3::ZERO,
        };
        if !state.in_orbit {
            return passthrough;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let altitude = field.distance_from_surface(position);
        let alignment = self.velocity_match(field, position, velocity);

        let rate = self.config.stability_decay_rate * dt;
        if !self.in_orbital_band(altitude) || alignment < self.config.decay_match_threshold {
            state.orbit_stability -= rate;
        } else {
            state.orbit_stability = (state.orbit_stability + rate * 0.5).min(1.0);
        }

        if state.orbit_stability <= 0.0 {
            state.clear_orbit();
            events.push(GravityEvent::OrbitDecayed { occupant });
            debug!(occupant = occupant.0, altitude, "orbit decayed");
            return passthrough;
        }

        let strength = self.config.stabilization_strength;
        let correction = field.up(position) * ((state.orbital_altitude - altitude) * strength);

        let ideal = self.ideal_velocity(field, position, velocity);
        let nudge = (strength * self.config.velocity_nudge_factor).clamp(0.0, 1.0);
        let adjusted = velocity + (ideal - velocity) * nudge;

        // The target altitude follows drift rather than staying pinned
        state.orbital_altitude = altitude;
        state.orbital_speed = adjusted.length();

        OrbitUpdate {
            velocity: adjusted,
            acceleration: correction,
        }
    }

    /// Per-tick entry point: entry check while grounded, maintenance while
    /// orbiting.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &self,
        occupant: OccupantId,
        dt: f32,
        field: &GravityField,
        position: Vec3,
        velocity: Vec3,
        state: &mut OccupantGravityState,
        events: &mut EventQueue,
    ) -> OrbitUpdate {
        if state.in_orbit {
            return self.maintain(occupant, dt, field, position, velocity, state, events);
        }
        self.try_establish(occupant, field, position, velocity, state, events);
        OrbitUpdate {
            velocity,
            acceleration: Vec3::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::field::GravityFieldConfig;
    use crate::physics::ring::{FalloffCurve, RingGeometry};

    const EPSILON: f32 = 1.0e-4;
    const ID: OccupantId = OccupantId(9);

    fn field() -> GravityField {
        GravityField::new(
            RingGeometry::new(Vec3::ZERO, Vec3::Y, 100.0, FalloffCurve::Linear),
            GravityFieldConfig {
                strength: 10.0,
                max_influence_distance: 300.0,
            },
        )
    }

    /// Occupant 60m above the surface on +X, moving along the orbital tangent.
    fn orbiting_setup() -> (Vec3, Vec3) {
        let position = Vec3::new(160.0, 0.0, 0.0);
        let speed = (10.0_f32 * 60.0).sqrt();
        (position, Vec3::new(0.0, 0.0, -speed))
    }

    #[test]
    fn test_ideal_speed() {
        let maintainer = OrbitalMaintainer::default();
        assert!((maintainer.ideal_speed(&field(), 40.0) - 20.0).abs() < EPSILON);
        assert_eq!(maintainer.ideal_speed(&field(), -5.0), 0.0);
    }

    #[test]
    fn test_establish_requires_band_and_alignment() {
        let maintainer = OrbitalMaintainer::default();
        let field = field();
        let mut events = EventQueue::new();
        let mut state = OccupantGravityState::default();
        let (position, velocity) = orbiting_setup();

        // Moving straight up: not tangential
        assert!(!maintainer.try_establish(ID, &field, position, Vec3::X * 20.0, &mut state, &mut events));
        // Too low
        assert!(!maintainer.try_establish(ID, &field, Vec3::new(105.0, 0.0, 0.0), velocity, &mut state, &mut events));

        assert!(maintainer.try_establish(ID, &field, position, velocity, &mut state, &mut events));
        assert!(state.in_orbit);
        assert_eq!(state.orbit_stability, 1.0);
        assert!((state.orbital_altitude - 60.0).abs() < EPSILON);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_establish_is_idempotent() {
        let maintainer = OrbitalMaintainer::default();
        let field = field();
        let mut events = EventQueue::new();
        let mut state = OccupantGravityState::default();
        let (position, velocity) = orbiting_setup();

        for _ in 0..5 {
            maintainer.try_establish(ID, &field, position, velocity, &mut state, &mut events);
        }
        let established = events
            .events()
            .iter()
            .filter(|e| matches!(e, GravityEvent::OrbitEstablished { .. }))
            .count();
        assert_eq!(established, 1);
    }

    #[test]
    fn test_either_tangent_direction_matches() {
        let maintainer = OrbitalMaintainer::default();
        let field = field();
        let (position, velocity) = orbiting_setup();
        assert!((maintainer.velocity_match(&field, position, velocity) - 1.0).abs() < EPSILON);
        assert!((maintainer.velocity_match(&field, position, -velocity) - 1.0).abs() < EPSILON);
        assert_eq!(maintainer.velocity_match(&field, position, Vec3::ZERO), 0.0);
    }

    #[test]
    fn test_altitude_correction_pulls_back() {
        let maintainer = OrbitalMaintainer::default();
        let field = field();
        let mut events = EventQueue::new();
        let mut state = OccupantGravityState::default();
        let (position, velocity) = orbiting_setup();
        maintainer.try_establish(ID, &field, position, velocity, &mut state, &mut events);

        // Sank 4m below the stored altitude: correction points outward (+X)
        let update = maintainer.maintain(ID, 0.1, &field, Vec3::new(156.0, 0.0, 0.0), velocity, &mut state, &mut events);
        assert!(update.acceleration.x > 0.0);
        assert!((update.acceleration.x - 4.0 * 0.5).abs() < EPSILON);
        assert!((state.orbital_altitude - 56.0).abs() < EPSILON);
    }

    #[test]
    fn test_correction_only_opposes_drift_since_last_tick() {
        let maintainer = OrbitalMaintainer::default();
        let field = field();
        let mut events = EventQueue::new();
        let mut state = OccupantGravityState::default();
        let (position, velocity) = orbiting_setup();
        maintainer.try_establish(ID, &field, position, velocity, &mut state, &mut events);

        let lower = Vec3::new(156.0, 0.0, 0.0);
        maintainer.maintain(ID, 0.1, &field, lower, velocity, &mut state, &mut events);

        // Holding still at the new altitude: nothing pulls back toward 60m
        let update = maintainer.maintain(ID, 0.1, &field, lower, velocity, &mut state, &mut events);
        assert!(update.acceleration.length() < EPSILON);
        assert!((state.orbital_altitude - 56.0).abs() < EPSILON);
        assert!(state.in_orbit);
    }

    #[test]
    fn test_velocity_nudged_toward_ideal() {
        let maintainer = OrbitalMaintainer::default();
        let field = field();
        let mut events = EventQueue::new();
        let mut state = OccupantGravityState::default();
        let (position, velocity) = orbiting_setup();
        maintainer.try_establish(ID, &field, position, velocity, &mut state, &mut events);

        // Too slow and slightly outward
        let actual = Vec3::new(2.0, 0.0, -10.0);
        let ideal = maintainer.ideal_velocity(&field, position, actual);
        let update = maintainer.maintain(ID, 0.1, &field, position, actual, &mut state, &mut events);

        // stabilization_strength 0.5 * velocity_nudge_factor 0.1
        let expected = actual + (ideal - actual) * 0.05;
        assert!(update.velocity.distance(expected) < EPSILON);
        assert!(update.velocity.distance(ideal) < actual.distance(ideal));
        assert!((state.orbital_speed - expected.length()).abs() < EPSILON);
    }

    #[test]
    fn test_stability_decreases_out_of_band_then_decays_once() {
        let maintainer = OrbitalMaintainer::default();
        let field = field();
        let mut events = EventQueue::new();
        let mut state = OccupantGravityState::default();
        let (position, velocity) = orbiting_setup();
        maintainer.try_establish(ID, &field, position, velocity, &mut state, &mut events);
        events.clear();

        let high = Vec3::new(300.0, 0.0, 0.0);
        let mut previous = state.orbit_stability;
        let mut ticks = 0;
        while state.in_orbit {
            maintainer.maintain(ID, 0.1, &field, high, velocity, &mut state, &mut events);
            if state.in_orbit {
                assert!(state.orbit_stability < previous);
                previous = state.orbit_stability;
            }
            ticks += 1;
            assert!(ticks < 1000);
        }

        assert_eq!(state.orbit_stability, 0.0);
        for _ in 0..10 {
            maintainer.maintain(ID, 0.1, &field, high, velocity, &mut state, &mut events);
        }
        assert_eq!(events.drain(), vec![GravityEvent::OrbitDecayed { occupant: ID }]);
    }

    #[test]
    fn test_stability_recovers_in_band() {
        let maintainer = OrbitalMaintainer::default();
        let field = field();
        let mut events = EventQueue::new();
        let mut state = OccupantGravityState::default();
        let (position, velocity) = orbiting_setup();
        maintainer.try_establish(ID, &field, position, velocity, &mut state, &mut events);
        state.orbit_stability = 0.5;

        let mut previous = state.orbit_stability;
        for _ in 0..5 {
            maintainer.maintain(ID, 0.1, &field, position, velocity, &mut state, &mut events);
            assert!(state.orbit_stability > previous);
            previous = state.orbit_stability;
        }
        for _ in 0..200 {
            maintainer.maintain(ID, 0.1, &field, position, velocity, &mut state, &mut events);
        }
        assert_eq!(state.orbit_stability, 1.0);
    }
}

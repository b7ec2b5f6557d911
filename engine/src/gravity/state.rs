//! Per-occupant gravity state
//!
//! The record every component reads and writes for one occupant. It is
//! owned by the simulation and mutated once per tick, in order, by the
//! direction controller, the float zones and the orbital maintainer.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Handle for an occupant registered with the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OccupantId(pub u32);

/// Gravity bookkeeping for one physics-affected occupant.
///
/// Fields are public so a save/load collaborator can read and restore them
/// at persistence boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OccupantGravityState {
    /// "Down" for this occupant (unit length)
    pub effective_direction: Vec3,
    /// Direction committed by a flip, overriding the field direction
    pub custom_direction: Option<Vec3>,
    /// Multiplier on the field magnitude (non-negative)
    pub gravity_scale: f32,
    /// How much gravity is suppressed by float bands, in [0, 1]
    pub float_blend: f32,
    /// Whether any float band has a membership factor above zero here
    pub in_float_band: bool,
    /// Whether orbital maintenance owns this occupant
    pub in_orbit: bool,
    /// Altitude snapshot (meaningful only while in orbit)
    pub orbital_altitude: f32,
    /// Speed snapshot (meaningful only while in orbit)
    pub orbital_speed: f32,
    /// Orbit stability score in [0, 1]
    pub orbit_stability: f32,
}

impl OccupantGravityState {
    /// Fresh state with `down` as the initial effective direction.
    pub fn new(down: Vec3) -> Self {
        Self {
            effective_direction: down.normalize_or(Vec3::NEG_Y),
            ..Self::default()
        }
    }

    /// Opposite of the effective gravity direction.
    pub fn up(&self) -> Vec3 {
        -self.effective_direction
    }

    pub fn set_float_blend(&mut self, blend: f32) {
        self.float_blend = if blend.is_nan() { 0.0 } else { blend.clamp(0.0, 1.0) };
    }

    pub fn set_gravity_scale(&mut self, scale: f32) {
        self.gravity_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    }

    /// Whether the occupant sits fully inside a float band.
    pub fn is_fully_floating(&self) -> bool {
        self.in_float_band && self.float_blend >= 1.0
    }

    /// Leave orbit and clear the orbital snapshot.
    pub fn clear_orbit(&mut self) {
        self.in_orbit = false;
        self.orbital_altitude = 0.0;
        self.orbital_speed = 0.0;
        self.orbit_stability = 0.0;
    }
}

impl Default for OccupantGravityState {
    fn default() -> Self {
        Self {
            effective_direction: Vec3::NEG_Y,
            custom_direction: None,
            gravity_scale: 1.0,
            float_blend: 0.0,
            in_float_band: false,
            in_orbit: false,
            orbital_altitude: 0.0,
            orbital_speed: 0.0,
            orbit_stability: 0.0,
        }
    }
}

static_assertions::assert_impl_all!(OccupantGravityState: Copy, Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_direction() {
        let state = OccupantGravityState::new(Vec3::new(0.0, 0.0, -4.0));
        assert_eq!(state.effective_direction, Vec3::NEG_Z);
        assert_eq!(state.up(), Vec3::Z);
        assert_eq!(OccupantGravityState::new(Vec3::ZERO).effective_direction, Vec3::NEG_Y);
    }

    #[test]
    fn test_setters_clamp() {
        let mut state = OccupantGravityState::default();
        state.set_float_blend(1.7);
        assert_eq!(state.float_blend, 1.0);
        state.set_float_blend(f32::NAN);
        assert_eq!(state.float_blend, 0.0);
        state.set_gravity_scale(-2.0);
        assert_eq!(state.gravity_scale, 0.0);
    }

    #[test]
    fn test_state_serializes_for_save_collaborator() {
        let mut state = OccupantGravityState::new(Vec3::X);
        state.in_orbit = true;
        state.orbital_altitude = 42.0;

        let json = serde_json::to_string(&state).unwrap();
        let restored: OccupantGravityState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }
}

//! Ring Simulation
//!
//! The simulation context: one gravity field, the float zones, the
//! orbital maintainer and every registered occupant's gravity state and
//! direction controller. Created at world init, dropped at teardown; there
//! is no global instance.
//!
//! # Tick Order
//!
//! For every occupant, in ascending id order:
//!
//! 1. Direction controller updates the effective direction (flip/aim)
//! 2. Float zones update the blend factor, damping and bob
//! 3. Orbital maintainer checks entry / applies corrections / decays
//! 4. Base gravity is composed, scaled by `1 - floatBlend`, unless the
//!    occupant is in orbit
//!
//! The occupant list is snapshotted at tick start. Occupants whose body
//! the host cannot provide are skipped for that tick.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut sim = RingSimulation::new(RingWorldConfig::default());
//! let mut bodies = BodySet::new();
//!
//! let id = sim.register_occupant(spawn_position);
//! bodies.insert(id, SimBody::new(spawn_position, Vec3::ZERO));
//!
//! // Each fixed step:
//! sim.tick(dt, &mut bodies);
//! bodies.integrate(dt);
//! for event in sim.drain_events() {
//!     // audio, UI, scoring...
//! }
//! ```

use std::collections::BTreeMap;

use glam::{Quat, Vec2, Vec3};
use tracing::{debug, info, trace};

use crate::config::RingWorldConfig;
use crate::gravity::{
    CommitOutcome, DirectionMode, EventQueue, GravityDirectionController, GravityEvent, OccupantGravityState,
    OccupantId,
};
use crate::orbit::OrbitalMaintainer;
use crate::physics::body::OccupantBodies;
use crate::physics::field::GravityField;
use crate::zones::FloatZone;

/// Accelerations applied to one occupant during the last tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ForceBreakdown {
    /// Base gravity after scale and float attenuation. Exactly zero at full
    /// immersion.
    pub gravity: Vec3,
    /// Float zone bob
    pub float: Vec3,
    /// Orbital altitude correction
    pub orbital: Vec3,
}

impl ForceBreakdown {
    pub fn total(&self) -> Vec3 {
        self.gravity + self.float + self.orbital
    }
}

/// Simulation statistics for debugging
#[derive(Debug, Clone, Default)]
pub struct SimulationStats {
    pub occupants: usize,
    pub floating: usize,
    pub fully_floating: usize,
    pub orbiting: usize,
    pub flipping: usize,
    pub selecting: usize,
    pub ticks: u64,
    pub elapsed: f32,
}

#[derive(Debug, Clone)]
struct Occupant {
    state: OccupantGravityState,
    controller: GravityDirectionController,
    position: Vec3,
    orientation: Quat,
    forces: ForceBreakdown,
}

/// Owns every ring gravity service and the registered occupants.
pub struct RingSimulation {
    config: RingWorldConfig,
    field: GravityField,
    zones: Vec<FloatZone>,
    orbit: OrbitalMaintainer,
    occupants: BTreeMap<OccupantId, Occupant>,
    next_id: u32,
    events: EventQueue,
    ticks: u64,
    elapsed: f32,
}

impl RingSimulation {
    /// Build a simulation from a configuration (sanitized here).
    pub fn new(config: RingWorldConfig) -> Self {
        let config = config.sanitized();
        let field = config.build_field();
        let zones = build_zones(&config);
        let orbit = OrbitalMaintainer::new(config.orbit);

        info!(
            radius = field.geometry().radius(),
            strength = field.strength(),
            float_zones = zones.len(),
            "ring simulation initialized"
        );

        Self {
            config,
            field,
            zones,
            orbit,
            occupants: BTreeMap::new(),
            next_id: 0,
            events: EventQueue::new(),
            ticks: 0,
            elapsed: 0.0,
        }
    }

    pub fn config(&self) -> &RingWorldConfig {
        &self.config
    }

    pub fn field(&self) -> &GravityField {
        &self.field
    }

    pub fn zones(&self) -> &[FloatZone] {
        &self.zones
    }

    pub fn orbit(&self) -> &OrbitalMaintainer {
        &self.orbit
    }

    /// Swap in a new configuration.
    ///
    /// Occupant states and in-progress flips survive; zone memberships are
    /// rebuilt, so occupants inside a band re-enter on the next tick.
    pub fn replace_config(&mut self, config: RingWorldConfig) {
        let config = config.sanitized();
        self.field = config.build_field();
        self.zones = build_zones(&config);
        self.orbit.set_config(config.orbit);
        for occupant in self.occupants.values_mut() {
            occupant.controller.set_config(config.direction);
            occupant.state.in_float_band = false;
        }
        self.config = config;
        info!("ring simulation config replaced");
    }

    // =========================================================================
    // REGISTRY
    // =========================================================================

    /// Register an occupant entering the world at `position`.
    ///
    /// Ids count up and wrap at `u32::MAX`, skipping any id still in use.
    pub fn register_occupant(&mut self, position: Vec3) -> OccupantId {
        let mut id = OccupantId(self.next_id);
        while self.occupants.contains_key(&id) {
            id = OccupantId(id.0.wrapping_add(1));
        }
        self.next_id = id.0.wrapping_add(1);

        let occupant = Occupant {
            state: OccupantGravityState::new(self.field.direction(position)),
            controller: GravityDirectionController::new(id, self.config.direction),
            position,
            orientation: Quat::IDENTITY,
            forces: ForceBreakdown::default(),
        };
        self.occupants.insert(id, occupant);
        debug!(occupant = id.0, ?position, "occupant registered");
        id
    }

    /// Remove an occupant leaving the world. Returns its final state.
    pub fn unregister_occupant(&mut self, id: OccupantId) -> Option<OccupantGravityState> {
        let occupant = self.occupants.remove(&id)?;
        for zone in &mut self.zones {
            zone.forget(id);
        }
        debug!(occupant = id.0, "occupant unregistered");
        Some(occupant.state)
    }

    pub fn contains(&self, id: OccupantId) -> bool {
        self.occupants.contains_key(&id)
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    pub fn occupant_ids(&self) -> impl Iterator<Item = OccupantId> + '_ {
        self.occupants.keys().copied()
    }

    // =========================================================================
    // TICK
    // =========================================================================

    /// Advance every occupant by `dt` seconds.
    ///
    /// Reads kinematics from `bodies` and writes back the adjusted velocity
    /// and the composed acceleration. Returns the number of occupants
    /// processed.
    pub fn tick<B: OccupantBodies>(&mut self, dt: f32, bodies: &mut B) -> usize {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }

        for zone in &mut self.zones {
            zone.advance_clock(dt);
        }

        let ids: Vec<OccupantId> = self.occupants.keys().copied().collect();
        let mut processed = 0;

        for id in ids {
            let Some(kinematics) = bodies.kinematics(id) else {
                trace!(occupant = id.0, "no body for occupant, skipped");
                continue;
            };
            let Some(occupant) = self.occupants.get_mut(&id) else {
                continue;
            };
            let position = kinematics.position;
            occupant.position = position;
            occupant.orientation = kinematics.orientation;

            // 1. Direction
            let field_direction = self.field.direction(position);
            occupant
                .controller
                .tick(dt, field_direction, &mut occupant.state, &mut self.events);

            // 2. Float zones
            let altitude = self.field.distance_from_surface(position);
            let up = occupant.state.up();
            let apply_float_forces = !occupant.state.in_orbit;
            let mut velocity = kinematics.velocity;
            let mut blend: f32 = 0.0;
            let mut float_acceleration = Vec3::ZERO;
            for zone in &mut self.zones {
                let update =
                    zone.update_occupant(id, dt, altitude, up, velocity, apply_float_forces, &mut self.events);
                velocity = update.velocity;
                float_acceleration += update.acceleration;
                blend = blend.max(update.factor);
            }
            occupant.state.set_float_blend(blend);
            occupant.state.in_float_band = blend > 0.0;

            // 3. Orbit
            let orbit = self
                .orbit
                .update(id, dt, &self.field, position, velocity, &mut occupant.state, &mut self.events);
            velocity = orbit.velocity;

            // 4. Gravity composition
            let state = &occupant.state;
            let forces = if state.in_orbit {
                ForceBreakdown {
                    float: float_acceleration,
                    orbital: orbit.acceleration,
                    ..ForceBreakdown::default()
                }
            } else {
                let base = state.effective_direction * (self.field.magnitude(position) * state.gravity_scale);
                ForceBreakdown {
                    gravity: FloatZone::attenuate_gravity(state.float_blend, base),
                    float: float_acceleration,
                    orbital: orbit.acceleration,
                }
            };
            occupant.forces = forces;

            bodies.apply(id, velocity, forces.total());
            processed += 1;
        }

        self.ticks += 1;
        self.elapsed += dt;
        processed
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Pending events, oldest first.
    pub fn events(&self) -> &[GravityEvent] {
        self.events.events()
    }

    /// Take every pending event.
    pub fn drain_events(&mut self) -> Vec<GravityEvent> {
        self.events.drain()
    }

    // =========================================================================
    // GRAVITY DIRECTION CONTROL
    // =========================================================================

    pub fn enter_selection_mode(&mut self, id: OccupantId) -> bool {
        let Some(occupant) = self.occupants.get_mut(&id) else {
            return false;
        };
        occupant.controller.enter_selection_mode(&occupant.state, &mut self.events)
    }

    pub fn exit_selection_mode(&mut self, id: OccupantId) -> bool {
        let Some(occupant) = self.occupants.get_mut(&id) else {
            return false;
        };
        occupant.controller.exit_selection_mode(&mut self.events)
    }

    /// Route a 2D aim delta to an occupant in selection mode.
    pub fn update_aim(&mut self, id: OccupantId, input: Vec2) -> bool {
        let Some(occupant) = self.occupants.get_mut(&id) else {
            return false;
        };
        occupant
            .controller
            .update_aim(input, occupant.orientation, &occupant.state)
    }

    pub fn set_aimed_direction(&mut self, id: OccupantId, direction: Vec3) -> bool {
        let Some(occupant) = self.occupants.get_mut(&id) else {
            return false;
        };
        occupant
            .controller
            .set_aimed_direction(direction, occupant.orientation, &occupant.state)
    }

    pub fn commit_flip(&mut self, id: OccupantId) -> CommitOutcome {
        let Some(occupant) = self.occupants.get_mut(&id) else {
            return CommitOutcome::NotSelecting;
        };
        occupant
            .controller
            .commit_flip(&occupant.state, occupant.orientation, &mut self.events)
    }

    pub fn start_flip(&mut self, id: OccupantId, direction: Vec3) -> bool {
        let Some(occupant) = self.occupants.get_mut(&id) else {
            return false;
        };
        occupant
            .controller
            .start_flip(direction, &occupant.state, occupant.orientation, &mut self.events)
    }

    pub fn flip_to_antipode(&mut self, id: OccupantId) -> bool {
        let Some(occupant) = self.occupants.get_mut(&id) else {
            return false;
        };
        occupant
            .controller
            .flip_to_antipode(&occupant.state, occupant.orientation, &mut self.events)
    }

    /// Flip so that "down" points at `world_position` from the occupant's
    /// last known position.
    pub fn flip_toward(&mut self, id: OccupantId, world_position: Vec3) -> bool {
        let Some(occupant) = self.occupants.get_mut(&id) else {
            return false;
        };
        occupant.controller.flip_toward(
            world_position,
            occupant.position,
            &occupant.state,
            occupant.orientation,
            &mut self.events,
        )
    }

    /// Flip back to the field direction and stop overriding it.
    pub fn reset_gravity_direction(&mut self, id: OccupantId) -> bool {
        let Some(occupant) = self.occupants.get_mut(&id) else {
            return false;
        };
        let field_direction = self.field.direction(occupant.position);
        occupant.controller.reset_to_field(
            field_direction,
            &occupant.state,
            occupant.orientation,
            &mut self.events,
        )
    }

    pub fn is_valid_direction(&self, id: OccupantId, direction: Vec3) -> bool {
        self.occupants
            .get(&id)
            .is_some_and(|o| o.controller.is_valid_direction(direction, &o.state))
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Current "down" for an occupant.
    pub fn effective_direction(&self, id: OccupantId) -> Option<Vec3> {
        self.occupants.get(&id).map(|o| o.state.effective_direction)
    }

    /// Rotation taking +Y onto the occupant's local up, for camera alignment.
    pub fn up_rotation(&self, id: OccupantId) -> Option<Quat> {
        self.occupants
            .get(&id)
            .map(|o| Quat::from_rotation_arc(Vec3::Y, o.state.up().normalize_or(Vec3::Y)))
    }

    pub fn direction_mode(&self, id: OccupantId) -> Option<DirectionMode> {
        self.occupants.get(&id).map(|o| o.controller.mode())
    }

    pub fn aimed_direction(&self, id: OccupantId) -> Option<Vec3> {
        self.occupants.get(&id).and_then(|o| o.controller.aimed_direction())
    }

    pub fn flip_progress(&self, id: OccupantId) -> Option<f32> {
        self.occupants
            .get(&id)
            .and_then(|o| o.controller.flip().map(|flip| flip.progress()))
    }

    pub fn state(&self, id: OccupantId) -> Option<&OccupantGravityState> {
        self.occupants.get(&id).map(|o| &o.state)
    }

    /// Mutable state for save/load collaborators.
    pub fn state_mut(&mut self, id: OccupantId) -> Option<&mut OccupantGravityState> {
        self.occupants.get_mut(&id).map(|o| &mut o.state)
    }

    /// Accelerations applied during the last tick.
    pub fn forces(&self, id: OccupantId) -> Option<ForceBreakdown> {
        self.occupants.get(&id).map(|o| o.forces)
    }

    /// Strongest float-band membership factor at an arbitrary position.
    pub fn membership_factor(&self, position: Vec3) -> f32 {
        let altitude = self.field.distance_from_surface(position);
        self.zones
            .iter()
            .map(|zone| zone.membership_factor(altitude))
            .fold(0.0, f32::max)
    }

    pub fn is_in_float_band(&self, position: Vec3) -> bool {
        self.membership_factor(position) > 0.0
    }

    /// Get simulation statistics
    pub fn stats(&self) -> SimulationStats {
        let mut stats = SimulationStats {
            occupants: self.occupants.len(),
            ticks: self.ticks,
            elapsed: self.elapsed,
            ..SimulationStats::default()
        };
        for occupant in self.occupants.values() {
            stats.floating += usize::from(occupant.state.in_float_band);
            stats.fully_floating += usize::from(occupant.state.is_fully_floating());
            stats.orbiting += usize::from(occupant.state.in_orbit);
            match occupant.controller.mode() {
                DirectionMode::Flipping => stats.flipping += 1,
                DirectionMode::Selecting => stats.selecting += 1,
                DirectionMode::Stable => {}
            }
        }
        stats
    }
}

impl Default for RingSimulation {
    fn default() -> Self {
        Self::new(RingWorldConfig::default())
    }
}

fn build_zones(config: &RingWorldConfig) -> Vec<FloatZone> {
    config
        .float_zones
        .iter()
        .enumerate()
        .map(|(index, zone)| FloatZone::new(index, *zone))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::{BodySet, SimBody};

    #[test]
    fn test_register_and_unregister() {
        let mut sim = RingSimulation::default();
        let a = sim.register_occupant(Vec3::new(110.0, 0.0, 0.0));
        let b = sim.register_occupant(Vec3::new(0.0, 0.0, 90.0));
        assert_ne!(a, b);
        assert_eq!(sim.occupant_count(), 2);
        assert_eq!(sim.effective_direction(a), Some(Vec3::NEG_X));
        assert_eq!(sim.effective_direction(b), Some(Vec3::Z));

        assert!(sim.unregister_occupant(a).is_some());
        assert!(sim.unregister_occupant(a).is_none());
        assert!(!sim.contains(a));
    }

    #[test]
    fn test_ids_wrap_and_skip_live_occupants() {
        let mut sim = RingSimulation::default();
        let first = sim.register_occupant(Vec3::new(110.0, 0.0, 0.0));
        assert_eq!(first, OccupantId(0));

        sim.next_id = u32::MAX;
        let last = sim.register_occupant(Vec3::new(120.0, 0.0, 0.0));
        assert_eq!(last, OccupantId(u32::MAX));

        // 0 is still registered
        let wrapped = sim.register_occupant(Vec3::new(130.0, 0.0, 0.0));
        assert_eq!(wrapped, OccupantId(1));
        assert_eq!(sim.occupant_count(), 3);
    }

    #[test]
    fn test_missing_occupant_calls_are_noops() {
        let mut sim = RingSimulation::default();
        let ghost = OccupantId(42);
        assert!(!sim.enter_selection_mode(ghost));
        assert!(!sim.update_aim(ghost, Vec2::ONE));
        assert!(!sim.start_flip(ghost, Vec3::X));
        assert_eq!(sim.commit_flip(ghost), CommitOutcome::NotSelecting);
        assert!(sim.effective_direction(ghost).is_none());
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_missing_body_is_skipped() {
        let mut sim = RingSimulation::default();
        let mut bodies = BodySet::new();
        let with_body = sim.register_occupant(Vec3::new(120.0, 0.0, 0.0));
        sim.register_occupant(Vec3::new(130.0, 0.0, 0.0));
        bodies.insert(with_body, SimBody::new(Vec3::new(120.0, 0.0, 0.0), Vec3::ZERO));

        assert_eq!(sim.tick(0.1, &mut bodies), 1);
        assert_eq!(sim.tick(0.0, &mut bodies), 0);
        assert_eq!(sim.stats().ticks, 1);
    }

    #[test]
    fn test_up_rotation_aligns_y_with_up() {
        let mut sim = RingSimulation::default();
        let id = sim.register_occupant(Vec3::new(150.0, 0.0, 0.0));
        let rotation = sim.up_rotation(id).unwrap();
        assert!((rotation * Vec3::Y).distance(Vec3::X) < 1.0e-5);
    }
}

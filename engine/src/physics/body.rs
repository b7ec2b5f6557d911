//! Host body interface
//!
//! The engine never integrates rigid bodies itself. Each tick it reads
//! position, velocity and orientation from the host's physics engine
//! through [`OccupantBodies`] and hands back a velocity (after damping and
//! orbital nudges) plus an acceleration to apply over the step.
//!
//! [`BodySet`] is a minimal implementation of that interface with
//! semi-implicit Euler integration, used by the headless driver and tests.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};

use crate::gravity::OccupantId;

/// Snapshot of an occupant's rigid body at tick start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyKinematics {
    /// World-space position (meters)
    pub position: Vec3,
    /// World-space velocity (meters/second)
    pub velocity: Vec3,
    /// Body orientation; its local X/Z axes drive aim input
    pub orientation: Quat,
}

/// Access to the host's rigid bodies, keyed by occupant.
pub trait OccupantBodies {
    /// Current kinematics, or `None` if the host has no body for `id`.
    fn kinematics(&self, id: OccupantId) -> Option<BodyKinematics>;

    /// Replace the body's velocity and apply `acceleration` for this step.
    fn apply(&mut self, id: OccupantId, velocity: Vec3, acceleration: Vec3);
}

/// A point-mass body integrated with semi-implicit Euler.
#[derive(Debug, Clone, Copy)]
pub struct SimBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Quat,
    /// Acceleration accumulated since the last integration (m/s²)
    pub acceleration: Vec3,
}

impl SimBody {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            orientation: Quat::IDENTITY,
            acceleration: Vec3::ZERO,
        }
    }

    /// Integrate over a time step.
    ///
    /// - velocity += acceleration * dt
    /// - position += velocity * dt
    pub fn integrate(&mut self, dt: f32) {
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
        self.acceleration = Vec3::ZERO;
    }
}

/// Reference body store implementing [`OccupantBodies`].
#[derive(Debug, Clone, Default)]
pub struct BodySet {
    bodies: BTreeMap<OccupantId, SimBody>,
}

impl BodySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: OccupantId, body: SimBody) {
        self.bodies.insert(id, body);
    }

    pub fn remove(&mut self, id: OccupantId) -> Option<SimBody> {
        self.bodies.remove(&id)
    }

    pub fn get(&self, id: OccupantId) -> Option<&SimBody> {
        self.bodies.get(&id)
    }

    pub fn get_mut(&mut self, id: OccupantId) -> Option<&mut SimBody> {
        self.bodies.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Step every body forward by `dt` seconds.
    pub fn integrate(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        for body in self.bodies.values_mut() {
            body.integrate(dt);
        }
    }
}

impl OccupantBodies for BodySet {
    fn kinematics(&self, id: OccupantId) -> Option<BodyKinematics> {
        self.bodies.get(&id).map(|body| BodyKinematics {
            position: body.position,
            velocity: body.velocity,
            orientation: body.orientation,
        })
    }

    fn apply(&mut self, id: OccupantId, velocity: Vec3, acceleration: Vec3) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = velocity;
            body.acceleration += acceleration;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semi_implicit_euler_step() {
        let mut body = SimBody::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        body.acceleration = Vec3::new(0.0, -10.0, 0.0);
        body.integrate(0.1);

        // Velocity is updated before position
        assert!((body.velocity.y + 1.0).abs() < 1.0e-6);
        assert!((body.position.y + 0.1).abs() < 1.0e-6);
        assert!((body.position.x - 0.1).abs() < 1.0e-6);
        assert_eq!(body.acceleration, Vec3::ZERO);
    }

    #[test]
    fn test_apply_ignores_unknown_ids() {
        let mut set = BodySet::new();
        set.insert(OccupantId(1), SimBody::new(Vec3::ONE, Vec3::ZERO));

        set.apply(OccupantId(7), Vec3::X, Vec3::X);
        assert!(set.kinematics(OccupantId(7)).is_none());

        set.apply(OccupantId(1), Vec3::Y, Vec3::Z);
        let body = set.get(OccupantId(1)).unwrap();
        assert_eq!(body.velocity, Vec3::Y);
        assert_eq!(body.acceleration, Vec3::Z);
    }
}

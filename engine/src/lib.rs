//! Ring Gravity Engine Library
//!
//! Gravity and orbital mechanics for occupants of a ring-shaped world.
//! Gravity pulls toward the ring surface, occupants can flip their personal
//! "down", float bands cancel gravity at a set altitude, and fast enough
//! tangential motion turns into a maintained orbit.
//!
//! # Modules
//!
//! - [`physics`] - Ring geometry, the gravity field and the host body interface
//! - [`gravity`] - Per-occupant gravity state, direction flips and events
//! - [`zones`] - Float bands with weightlessness, damping and bob
//! - [`orbit`] - Stable-orbit detection, correction and decay
//! - [`config`] - JSON configuration loading and sanitizing
//! - [`world`] - The simulation context tying it together
//!
//! # Example
//!
//! ```ignore
//! use ring_gravity_engine::{BodySet, RingSimulation, RingWorldConfig, SimBody};
//! use glam::Vec3;
//!
//! let mut sim = RingSimulation::new(RingWorldConfig::default());
//! let mut bodies = BodySet::new();
//!
//! let spawn = Vec3::new(130.0, 0.0, 0.0);
//! let id = sim.register_occupant(spawn);
//! bodies.insert(id, SimBody::new(spawn, Vec3::ZERO));
//!
//! for _ in 0..60 {
//!     sim.tick(1.0 / 60.0, &mut bodies);
//!     bodies.integrate(1.0 / 60.0);
//! }
//!
//! for event in sim.drain_events() {
//!     println!("{event:?}");
//! }
//! ```

pub mod config;
pub mod gravity;
pub mod orbit;
pub mod physics;
pub mod world;
pub mod zones;

// Re-export the types most hosts touch
pub use config::{ConfigError, RingWorldConfig};
pub use gravity::{
    CommitOutcome, DirectionConfig, DirectionMode, GravityDirectionController, GravityEvent, OccupantGravityState,
    OccupantId,
};
pub use orbit::{OrbitConfig, OrbitalMaintainer};
pub use physics::{BodyKinematics, BodySet, GravityField, OccupantBodies, RingGeometry, SimBody};
pub use world::{ForceBreakdown, RingSimulation, SimulationStats};
pub use zones::{FloatZone, FloatZoneConfig};

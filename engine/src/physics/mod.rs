//! Physics module for the ring gravity engine
//!
//! Geometry and field math for a toroidal habitat. Rigid-body integration
//! belongs to the host; this module only describes the field and the
//! interface the host exposes its bodies through.
//!
//! # Unit System
//!
//! **1 unit = 1 meter** (SI units throughout)
//!
//! - Distances in meters
//! - Velocities in m/s
//! - Accelerations in m/s²
//!
//! # Submodules
//!
//! - [`types`] - Core mathematical types re-exported from glam, vector helpers
//! - [`ring`] - Ring geometry and gravity falloff curves
//! - [`field`] - Gravity field evaluation (distance, direction, vector)
//! - [`body`] - Host body interface and a reference integrator

pub mod body;
pub mod field;
pub mod ring;
pub mod types;

pub use body::{BodyKinematics, BodySet, OccupantBodies, SimBody};
pub use field::{GravityField, GravityFieldConfig};
pub use ring::{FalloffCurve, RingGeometry};
pub use types::{Quat, Vec2, Vec3};

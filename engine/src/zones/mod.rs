//! Zones Module
//!
//! Altitude bands with special gravity rules.
//!
//! - [`float_zone`] - Zero-gravity float bands with damping, bob and
//!   residency tracking

pub mod float_zone;

pub use float_zone::{CapacityPolicy, FloatZone, FloatZoneConfig, FloatZoneMembership, FloatZoneUpdate};

//! Orbit Module
//!
//! - [`maintainer`] - Stable-orbit detection, correction and decay

pub mod maintainer;

pub use maintainer::{OrbitConfig, OrbitPhase, OrbitUpdate, OrbitalMaintainer};

//! World Module
//!
//! The simulation context that owns the gravity services and runs them in
//! a fixed order each tick.

pub mod simulation;

pub use simulation::{ForceBreakdown, RingSimulation, SimulationStats};

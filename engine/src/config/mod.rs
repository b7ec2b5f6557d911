//! Config Module
//!
//! Loading and sanitizing the ring world configuration document.

pub mod world_config;

pub use world_config::{ConfigError, RingConfig, RingWorldConfig};

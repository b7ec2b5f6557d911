//! Gravity Module
//!
//! Per-occupant gravity state and the omnidirectional gravity controller.
//!
//! - [`state`] - `OccupantGravityState`, the record every component shares
//! - [`direction`] - Flip and selection state machines
//! - [`easing`] - Flip progress curves
//! - [`events`] - Events raised for audio/UI/camera collaborators

pub mod direction;
pub mod easing;
pub mod events;
pub mod state;

pub use direction::{
    CommitOutcome, DirectionConfig, DirectionMode, FlipTransition, GravityDirectionController, SelectionAim,
};
pub use easing::EasingCurve;
pub use events::{EventQueue, GravityEvent};
pub use state::{OccupantGravityState, OccupantId};

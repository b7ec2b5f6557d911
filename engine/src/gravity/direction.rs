//! Omnidirectional Gravity Controller
//!
//! Owns the per-occupant state machines that re-aim "down":
//!
//! - **Selection**: the occupant aims a candidate direction interactively,
//!   then commits it (or backs out).
//! - **Flip**: a timed spherical interpolation from the current direction
//!   to a committed target.
//!
//! # States
//!
//! - `Stable`: direction follows the committed custom direction, or the
//!   field direction when none was committed
//! - `Selecting`: aim input is accepted, direction still follows `Stable` rules
//! - `Flipping`: direction is interpolated; new flips and selection are rejected
//!
//! Flips are sticky: once one completes, the occupant keeps the committed
//! direction instead of reverting to the radial field direction. The only
//! non-sticky flip is the reset back to the field direction.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut controller = GravityDirectionController::new(id, DirectionConfig::default());
//!
//! if controller.enter_selection_mode(&state, &mut events) {
//!     controller.update_aim(mouse_delta, orientation, &state);
//!     controller.commit_flip(&state, orientation, &mut events);
//! }
//!
//! // Each tick:
//! controller.tick(dt, field.direction(position), &mut state, &mut events);
//! ```

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::easing::EasingCurve;
use super::events::{EventQueue, GravityEvent};
use super::state::{OccupantGravityState, OccupantId};
use crate::physics::types::{angle_between, checked_direction, rotation_axis, slerp_direction};

/// Shortest flip duration accepted (seconds)
pub const MIN_FLIP_DURATION: f32 = 0.01;

/// Relative tolerance on elapsed time when deciding that a flip has
/// finished. Covers the rounding of `dt` sums that land on `duration`, and
/// nothing coarser: a flip never completes a whole tick early.
pub const COMPLETION_TOLERANCE: f64 = 1.0e-6;

/// Tuning for flips and interactive aiming.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionConfig {
    /// Time a flip takes from start to target (seconds)
    pub flip_duration: f32,
    /// Commits closer than this to the current direction are ignored (degrees)
    pub min_flip_angle_deg: f32,
    /// Largest angle from the current direction considered a valid aim (degrees)
    pub max_aim_angle_deg: f32,
    /// Aim is kept within this cone around the occupant's "up" (degrees)
    pub aim_cone_angle_deg: f32,
    /// Radians of aim rotation per unit of aim input
    pub aim_sensitivity: f32,
    /// Progress curve applied to flips
    pub easing: EasingCurve,
    /// Only allow selection while fully inside a float band
    pub require_float_band: bool,
}

impl Default for DirectionConfig {
    fn default() -> Self {
        Self {
            flip_duration: 0.5,
            min_flip_angle_deg: 15.0,
            max_aim_angle_deg: 180.0,
            aim_cone_angle_deg: 180.0,
            aim_sensitivity: 0.005,
            easing: EasingCurve::SmoothStep,
            require_float_band: true,
        }
    }
}

impl DirectionConfig {
    pub fn min_flip_angle(&self) -> f32 {
        self.min_flip_angle_deg.to_radians()
    }

    pub fn max_aim_angle(&self) -> f32 {
        self.max_aim_angle_deg.to_radians()
    }

    pub fn aim_cone_angle(&self) -> f32 {
        self.aim_cone_angle_deg.to_radians()
    }
}

/// Controller state machine modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectionMode {
    #[default]
    Stable,
    Selecting,
    Flipping,
}

/// An in-progress flip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipTransition {
    start: Vec3,
    target: Vec3,
    axis: Vec3,
    elapsed: f64,
    duration: f32,
    sticky: bool,
}

impl FlipTransition {
    fn new(start: Vec3, target: Vec3, duration: f32, hint: Vec3, sticky: bool) -> Self {
        Self {
            start,
            target,
            axis: rotation_axis(start, target, hint),
            elapsed: 0.0,
            duration: duration.max(MIN_FLIP_DURATION),
            sticky,
        }
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Linear progress in [0, 1]
    pub fn progress(&self) -> f32 {
        (self.elapsed / f64::from(self.duration)).min(1.0) as f32
    }

    /// Seconds ticked since the flip started
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Advance by `dt`; returns true once the flip has completed.
    fn advance(&mut self, dt: f32) -> bool {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += f64::from(dt);
        }
        let duration = f64::from(self.duration);
        if self.elapsed >= duration * (1.0 - COMPLETION_TOLERANCE) {
            self.elapsed = self.elapsed.max(duration);
            return true;
        }
        false
    }

    fn direction(&self, easing: EasingCurve) -> Vec3 {
        slerp_direction(self.start, self.target, easing.evaluate(self.progress()), self.axis)
    }
}

/// Aim held while the occupant is in selection mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionAim {
    aimed_direction: Vec3,
}

impl SelectionAim {
    pub fn aimed_direction(&self) -> Vec3 {
        self.aimed_direction
    }
}

/// Result of [`GravityDirectionController::commit_flip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A flip toward the aimed direction started
    Started,
    /// The aim was too close to the current direction; selection ended
    BelowMinimumAngle,
    /// Nothing to commit (not selecting, or occupant missing)
    NotSelecting,
}

/// Per-occupant gravity direction controller.
#[derive(Debug, Clone)]
pub struct GravityDirectionController {
    occupant: OccupantId,
    config: DirectionConfig,
    flip: Option<FlipTransition>,
    selection: Option<SelectionAim>,
}

impl GravityDirectionController {
    pub fn new(occupant: OccupantId, config: DirectionConfig) -> Self {
        Self {
            occupant,
            config,
            flip: None,
            selection: None,
        }
    }

    pub fn occupant(&self) -> OccupantId {
        self.occupant
    }

    pub fn config(&self) -> &DirectionConfig {
        &self.config
    }

    /// Replace tuning. An in-progress flip keeps its original duration.
    pub fn set_config(&mut self, config: DirectionConfig) {
        self.config = config;
    }

    pub fn mode(&self) -> DirectionMode {
        if self.flip.is_some() {
            DirectionMode::Flipping
        } else if self.selection.is_some() {
            DirectionMode::Selecting
        } else {
            DirectionMode::Stable
        }
    }

    pub fn is_flipping(&self) -> bool {
        self.flip.is_some()
    }

    pub fn is_selecting(&self) -> bool {
        self.selection.is_some()
    }

    pub fn flip(&self) -> Option<&FlipTransition> {
        self.flip.as_ref()
    }

    pub fn aimed_direction(&self) -> Option<Vec3> {
        self.selection.map(|s| s.aimed_direction)
    }

    // =========================================================================
    // SELECTION MODE
    // =========================================================================

    /// Start aiming a new gravity direction.
    ///
    /// Rejected while flipping, while already selecting, and (when
    /// `require_float_band` is set) unless the occupant is fully inside a
    /// float band. The aim starts at the current effective direction.
    ///
    /// That start is "down", 180 degrees from up. With an aim cone narrower
    /// than 180 degrees it lies outside the cone, so the first aim update
    /// moves it onto the cone boundary in one step.
    pub fn enter_selection_mode(&mut self, state: &OccupantGravityState, events: &mut EventQueue) -> bool {
        if self.flip.is_some() || self.selection.is_some() {
            return false;
        }
        if self.config.require_float_band && !state.is_fully_floating() {
            return false;
        }
        let Some(current) = checked_direction(state.effective_direction) else {
            return false;
        };

        self.selection = Some(SelectionAim {
            aimed_direction: current,
        });
        events.push(GravityEvent::SelectionEntered {
            occupant: self.occupant,
        });
        debug!(occupant = self.occupant.0, "gravity selection entered");
        true
    }

    /// Leave selection mode without committing.
    pub fn exit_selection_mode(&mut self, events: &mut EventQueue) -> bool {
        if self.selection.take().is_none() {
            return false;
        }
        events.push(GravityEvent::SelectionExited {
            occupant: self.occupant,
        });
        debug!(occupant = self.occupant.0, "gravity selection exited");
        true
    }

    /// Rotate the aim by a 2D input delta.
    ///
    /// The delta moves the aim along two tangent vectors at the aimed
    /// direction, built from the occupant's local right axis (`x`) and the
    /// direction perpendicular to it (`y`). The result is clamped to the aim
    /// cone around the occupant's up vector, which may move a fresh aim by
    /// `180 - aim_cone_angle_deg` degrees on the first call.
    ///
    /// # Arguments
    /// * `input` - Aim delta (e.g. mouse movement in pixels)
    /// * `orientation` - Occupant body orientation
    /// * `state` - Occupant state, for the current up vector
    pub fn update_aim(&mut self, input: Vec2, orientation: Quat, state: &OccupantGravityState) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        if !input.is_finite() {
            return false;
        }

        let aimed = selection.aimed_direction;
        let right = orientation * Vec3::X;
        let tangent_x = tangent_at(aimed, right).or_else(|| tangent_at(aimed, orientation * Vec3::NEG_Z));
        let Some(tangent_x) = tangent_x else {
            return false;
        };
        let tangent_y = aimed.cross(tangent_x);

        let offset = (tangent_x * input.x + tangent_y * input.y) * self.config.aim_sensitivity;
        let angle = offset.length();
        let rotated = if angle > 0.0 {
            let axis = aimed.cross(offset / angle).normalize_or(tangent_y);
            (Quat::from_axis_angle(axis, angle) * aimed).normalize_or(aimed)
        } else {
            aimed
        };

        selection.aimed_direction =
            clamp_to_cone(rotated, state.up(), self.config.aim_cone_angle(), right);
        true
    }

    /// Set the aim directly (e.g. from a pointer-to-world mapping).
    ///
    /// Zero-length or non-finite directions are rejected.
    pub fn set_aimed_direction(
        &mut self,
        direction: Vec3,
        orientation: Quat,
        state: &OccupantGravityState,
    ) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        let Some(direction) = checked_direction(direction) else {
            return false;
        };
        selection.aimed_direction = clamp_to_cone(
            direction,
            state.up(),
            self.config.aim_cone_angle(),
            orientation * Vec3::X,
        );
        true
    }

    /// Commit the aimed direction.
    ///
    /// Aims below the minimum flip angle end selection without flipping.
    pub fn commit_flip(
        &mut self,
        state: &OccupantGravityState,
        orientation: Quat,
        events: &mut EventQueue,
    ) -> CommitOutcome {
        let Some(selection) = self.selection else {
            return CommitOutcome::NotSelecting;
        };
        let aimed = selection.aimed_direction;
        let angle = angle_between(state.effective_direction, aimed);
        self.exit_selection_mode(events);

        if angle < self.config.min_flip_angle() {
            debug!(
                occupant = self.occupant.0,
                angle_deg = angle.to_degrees(),
                "flip commit below minimum angle"
            );
            return CommitOutcome::BelowMinimumAngle;
        }

        if self.begin_flip(state.effective_direction, aimed, orientation * Vec3::X, true, events) {
            CommitOutcome::Started
        } else {
            CommitOutcome::NotSelecting
        }
    }

    // =========================================================================
    // PROGRAMMATIC FLIPS
    // =========================================================================

    /// Flip toward `direction`. Ignored while a flip is in progress or when
    /// `direction` is degenerate; an open selection is closed first.
    pub fn start_flip(
        &mut self,
        direction: Vec3,
        state: &OccupantGravityState,
        orientation: Quat,
        events: &mut EventQueue,
    ) -> bool {
        if self.flip.is_some() {
            return false;
        }
        let Some(target) = checked_direction(direction) else {
            return false;
        };
        if self.selection.is_some() {
            self.exit_selection_mode(events);
        }
        self.begin_flip(state.effective_direction, target, orientation * Vec3::X, true, events)
    }

    /// Flip to the exact opposite of the current direction.
    pub fn flip_to_antipode(
        &mut self,
        state: &OccupantGravityState,
        orientation: Quat,
        events: &mut EventQueue,
    ) -> bool {
        self.start_flip(-state.effective_direction, state, orientation, events)
    }

    /// Flip so that "down" points from the occupant toward `world_position`.
    pub fn flip_toward(
        &mut self,
        world_position: Vec3,
        occupant_position: Vec3,
        state: &OccupantGravityState,
        orientation: Quat,
        events: &mut EventQueue,
    ) -> bool {
        self.start_flip(world_position - occupant_position, state, orientation, events)
    }

    /// Flip back to the field direction and drop the custom override on
    /// completion.
    pub fn reset_to_field(
        &mut self,
        field_direction: Vec3,
        state: &OccupantGravityState,
        orientation: Quat,
        events: &mut EventQueue,
    ) -> bool {
        if self.flip.is_some() || state.custom_direction.is_none() {
            return false;
        }
        let Some(target) = checked_direction(field_direction) else {
            return false;
        };
        if self.selection.is_some() {
            self.exit_selection_mode(events);
        }
        self.begin_flip(state.effective_direction, target, orientation * Vec3::X, false, events)
    }

    fn begin_flip(&mut self, from: Vec3, to: Vec3, hint: Vec3, sticky: bool, events: &mut EventQueue) -> bool {
        let Some(start) = checked_direction(from) else {
            return false;
        };
        self.flip = Some(FlipTransition::new(start, to, self.config.flip_duration, hint, sticky));
        events.push(GravityEvent::FlipStarted {
            occupant: self.occupant,
            from: start,
            to,
        });
        debug!(occupant = self.occupant.0, from = ?start, to = ?to, "gravity flip started");
        true
    }

    /// Whether `direction` would be a reasonable flip target.
    ///
    /// Presentation layers use this to color aim feedback; only the minimum
    /// angle is enforced, at commit time.
    pub fn is_valid_direction(&self, direction: Vec3, state: &OccupantGravityState) -> bool {
        if checked_direction(direction).is_none() {
            return false;
        }
        let angle = angle_between(state.effective_direction, direction);
        angle >= self.config.min_flip_angle() && angle <= self.config.max_aim_angle()
    }

    // =========================================================================
    // PER-TICK UPDATE
    // =========================================================================

    /// Update the occupant's effective direction.
    ///
    /// # Arguments
    /// * `dt` - Tick length in seconds
    /// * `field_direction` - Field-derived direction at the occupant
    /// * `state` - Occupant state to write `effective_direction` into
    /// * `events` - Receives `FlipCompleted` when a flip finishes
    pub fn tick(
        &mut self,
        dt: f32,
        field_direction: Vec3,
        state: &mut OccupantGravityState,
        events: &mut EventQueue,
    ) {
        let Some(flip) = self.flip.as_mut() else {
            state.effective_direction = state.custom_direction.unwrap_or(field_direction);
            return;
        };

        if !flip.advance(dt) {
            state.effective_direction = flip.direction(self.config.easing);
            return;
        }

        let target = flip.target;
        let sticky = flip.sticky;
        self.flip = None;

        state.effective_direction = target;
        state.custom_direction = sticky.then_some(target);
        events.push(GravityEvent::FlipCompleted {
            occupant: self.occupant,
            direction: target,
        });
        debug!(occupant = self.occupant.0, direction = ?target, sticky, "gravity flip completed");
    }
}

/// Unit tangent at `direction` built from `reference`, or `None` when the
/// reference is parallel to the direction.
fn tangent_at(direction: Vec3, reference: Vec3) -> Option<Vec3> {
    checked_direction(reference - direction * reference.dot(direction))
}

/// Rotate `direction` back onto the cone of half-angle `max_angle` around
/// `up` if it lies outside it.
fn clamp_to_cone(direction: Vec3, up: Vec3, max_angle: f32, hint: Vec3) -> Vec3 {
    let Some(up) = checked_direction(up) else {
        return direction;
    };
    if angle_between(direction, up) <= max_angle {
        return direction;
    }
    let axis = rotation_axis(up, direction, hint);
    (Quat::from_axis_angle(axis, max_angle) * up).normalize_or(direction)
}

//! Float Zone
//!
//! A zero-gravity band at a fixed altitude above (or below) the ring
//! surface. Occupants inside the band have gravity attenuated toward zero,
//! their velocity damped and a gentle bob applied along their local up.
//!
//! # Membership Factor
//!
//! ```text
//!   factor
//!   1 |        ___________
//!     |       /           \
//!   0 |______/             \______  altitude
//!          core-w  core   core+w
//! ```
//!
//! - 1 inside the core `[altitude - height/2, altitude + height/2]`
//! - 0 beyond the transition margin on either side
//! - linear across each margin
//!
//! # Events
//!
//! - `FloatBandEntered` when the factor rises above 0
//! - `FloatBandExited` when it returns to 0
//! - `FullyImmersed` once per continuous stretch at factor 1, after the
//!   occupant has been in the band for `immersion_delay` seconds
//!
//! The number of tracked memberships is capped. Occupants that overflow
//! the cap still get the blend factor and forces but no membership record
//! or events until they leave the band.

use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::gravity::{EventQueue, GravityEvent, OccupantId};

/// Factor at or above which an occupant counts as fully immersed.
pub const FULL_IMMERSION: f32 = 1.0;

/// What happens when a new occupant enters a zone at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// Keep existing memberships; the newcomer is not tracked
    #[default]
    RejectNewest,
    /// Drop the longest-held membership to make room
    EvictOldest,
}

/// Configuration for one float band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatZoneConfig {
    /// Center altitude of the band relative to the ring surface (meters)
    pub altitude: f32,
    /// Thickness of the fully-floating core (meters)
    pub height: f32,
    /// Blend margin on each side of the core (meters)
    pub transition_width: f32,
    /// Velocity multiplier per tick at full immersion (1 = no damping)
    pub damping: f32,
    /// Peak bob acceleration at full immersion (m/s²)
    pub oscillation_amplitude: f32,
    /// Bob frequency (Hz)
    pub oscillation_frequency: f32,
    /// Time in the band before `FullyImmersed` can fire (seconds)
    pub immersion_delay: f32,
    /// Maximum concurrently tracked memberships
    pub max_tracked: usize,
    pub capacity_policy: CapacityPolicy,
}

impl Default for FloatZoneConfig {
    fn default() -> Self {
        Self {
            altitude: 50.0,
            height: 10.0,
            transition_width: 5.0,
            damping: 0.98,
            oscillation_amplitude: 0.3,
            oscillation_frequency: 0.5,
            immersion_delay: 0.5,
            max_tracked: 64,
            capacity_policy: CapacityPolicy::RejectNewest,
        }
    }
}

/// Residency record for an occupant inside the band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatZoneMembership {
    /// Seconds since the occupant entered the band
    pub time_in_band: f32,
    immersion_notified: bool,
    sequence: u64,
}

/// Result of updating one occupant against the zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatZoneUpdate {
    /// Membership factor in [0, 1]
    pub factor: f32,
    /// Velocity after damping
    pub velocity: Vec3,
    /// Bob acceleration to apply this step
    pub acceleration: Vec3,
}

/// A float band and its memberships.
#[derive(Debug, Clone)]
pub struct FloatZone {
    index: usize,
    config: FloatZoneConfig,
    memberships: HashMap<OccupantId, FloatZoneMembership>,
    overflowed: HashSet<OccupantId>,
    next_sequence: u64,
    dropped_entries: u64,
    clock: f32,
}

impl FloatZone {
    /// Create a zone. `index` identifies it in events.
    pub fn new(index: usize, config: FloatZoneConfig) -> Self {
        let config = FloatZoneConfig {
            height: config.height.max(0.0),
            transition_width: config.transition_width.max(0.0),
            damping: config.damping.clamp(0.0, 1.0),
            immersion_delay: config.immersion_delay.max(0.0),
            max_tracked: config.max_tracked.max(1),
            ..config
        };
        Self {
            index,
            config,
            memberships: HashMap::new(),
            overflowed: HashSet::new(),
            next_sequence: 0,
            dropped_entries: 0,
            clock: 0.0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn config(&self) -> &FloatZoneConfig {
        &self.config
    }

    /// Membership factor for a signed altitude above the ring surface.
    pub fn membership_factor(&self, altitude: f32) -> f32 {
        if !altitude.is_finite() {
            return 0.0;
        }
        let half = self.config.height * 0.5;
        let core_low = self.config.altitude - half;
        let core_high = self.config.altitude + half;

        let outside_by = if altitude < core_low {
            core_low - altitude
        } else if altitude > core_high {
            altitude - core_high
        } else {
            return 1.0;
        };

        let width = self.config.transition_width;
        if width <= 0.0 || outside_by >= width {
            0.0
        } else {
            (1.0 - outside_by / width).clamp(0.0, 1.0)
        }
    }

    pub fn contains_altitude(&self, altitude: f32) -> bool {
        self.membership_factor(altitude) > 0.0
    }

    pub fn is_tracking(&self, occupant: OccupantId) -> bool {
        self.memberships.contains_key(&occupant)
    }

    pub fn membership(&self, occupant: OccupantId) -> Option<&FloatZoneMembership> {
        self.memberships.get(&occupant)
    }

    pub fn tracked_count(&self) -> usize {
        self.memberships.len()
    }

    /// Entries that could not be tracked because the zone was full.
    pub fn dropped_entries(&self) -> u64 {
        self.dropped_entries
    }

    /// Advance the zone clock used for untracked occupants' bob phase.
    pub fn advance_clock(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.clock += dt;
        }
    }

    /// Update one occupant.
    ///
    /// # Arguments
    /// * `occupant` - Occupant being updated
    /// * `dt` - Tick length in seconds
    /// * `altitude` - Occupant altitude above the ring surface
    /// * `up` - Occupant's local up (opposite its effective gravity)
    /// * `velocity` - Occupant velocity at tick start
    /// * `apply_forces` - Whether damping and bob should be applied
    /// * `events` - Receives enter/exit/immersion events
    #[allow(clippy::too_many_arguments)]
    pub fn update_occupant(
        &mut self,
        occupant: OccupantId,
        dt: f32,
        altitude: f32,
        up: Vec3,
        velocity: Vec3,
        apply_forces: bool,
        events: &mut EventQueue,
    ) -> FloatZoneUpdate {
        let factor = self.membership_factor(altitude);
        let mut update = FloatZoneUpdate {
            factor,
            velocity,
            acceleration: Vec3::ZERO,
        };

        if factor <= 0.0 {
            self.overflowed.remove(&occupant);
            if self.memberships.remove(&occupant).is_some() {
                events.push(GravityEvent::FloatBandExited {
                    occupant,
                    zone: self.index,
                });
                debug!(occupant = occupant.0, zone = self.index, "float band exited");
            }
            return update;
        }

        if !self.memberships.contains_key(&occupant) {
            self.try_track(occupant, events);
        }

        let phase_time = match self.memberships.get_mut(&occupant) {
            Some(membership) => {
                if dt.is_finite() && dt > 0.0 {
                    membership.time_in_band += dt;
                }
                if factor >= FULL_IMMERSION {
                    if !membership.immersion_notified && membership.time_in_band >= self.config.immersion_delay {
                        membership.immersion_notified = true;
                        events.push(GravityEvent::FullyImmersed {
                            occupant,
                            zone: self.index,
                        });
                        debug!(occupant = occupant.0, zone = self.index, "fully immersed");
                    }
                } else {
                    membership.immersion_notified = false;
                }
                membership.time_in_band
            }
            None => self.clock,
        };

        if apply_forces {
            let damping = 1.0 + (self.config.damping - 1.0) * factor;
            update.velocity = velocity * damping;

            let bob = (TAU * self.config.oscillation_frequency * phase_time).sin();
            update.acceleration = up * (self.config.oscillation_amplitude * bob * factor);
        }

        update
    }

    fn try_track(&mut self, occupant: OccupantId, events: &mut EventQueue) -> bool {
        if self.overflowed.contains(&occupant) {
            return false;
        }

        if self.memberships.len() >= self.config.max_tracked {
            match self.config.capacity_policy {
                CapacityPolicy::RejectNewest => {
                    self.dropped_entries += 1;
                    self.overflowed.insert(occupant);
                    warn!(
                        occupant = occupant.0,
                        zone = self.index,
                        capacity = self.config.max_tracked,
                        "float zone full, membership not tracked"
                    );
                    return false;
                }
                CapacityPolicy::EvictOldest => {
                    let oldest = self
                        .memberships
                        .iter()
                        .min_by_key(|(_, m)| m.sequence)
                        .map(|(id, _)| *id);
                    if let Some(evicted) = oldest {
                        self.memberships.remove(&evicted);
                        self.overflowed.insert(evicted);
                        self.dropped_entries += 1;
                        events.push(GravityEvent::FloatBandExited {
                            occupant: evicted,
                            zone: self.index,
                        });
                        warn!(
                            evicted = evicted.0,
                            occupant = occupant.0,
                            zone = self.index,
                            "float zone full, evicted oldest membership"
                        );
                    }
                }
            }
        }

        self.memberships.insert(
            occupant,
            FloatZoneMembership {
                time_in_band: 0.0,
                immersion_notified: false,
                sequence: self.next_sequence,
            },
        );
        self.next_sequence += 1;
        events.push(GravityEvent::FloatBandEntered {
            occupant,
            zone: self.index,
        });
        debug!(occupant = occupant.0, zone = self.index, "float band entered");
        true
    }

    /// Drop all bookkeeping for an occupant leaving the world.
    pub fn forget(&mut self, occupant: OccupantId) {
        self.memberships.remove(&occupant);
        self.overflowed.remove(&occupant);
    }

    /// Scale `base` gravity by `1 - float_blend`. At full immersion the
    /// result is exactly zero rather than whatever rounding leaves behind,
    /// so no separate counter-gravity term is needed.
    pub fn attenuate_gravity(float_blend: f32, base: Vec3) -> Vec3 {
        if float_blend >= FULL_IMMERSION {
            Vec3::ZERO
        } else {
            base * (1.0 - float_blend.max(0.0))
        }
    }
}

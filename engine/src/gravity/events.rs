//! Gravity events
//!
//! Components push events into an [`EventQueue`] owned by the simulation;
//! collaborators (audio, UI, camera, scoring) drain it once per tick.

use glam::Vec3;

use super::state::OccupantId;

/// Something observable that happened during a tick or an API call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GravityEvent {
    SelectionEntered {
        occupant: OccupantId,
    },
    SelectionExited {
        occupant: OccupantId,
    },
    FlipStarted {
        occupant: OccupantId,
        from: Vec3,
        to: Vec3,
    },
    FlipCompleted {
        occupant: OccupantId,
        direction: Vec3,
    },
    FloatBandEntered {
        occupant: OccupantId,
        zone: usize,
    },
    FloatBandExited {
        occupant: OccupantId,
        zone: usize,
    },
    FullyImmersed {
        occupant: OccupantId,
        zone: usize,
    },
    OrbitEstablished {
        occupant: OccupantId,
        altitude: f32,
    },
    OrbitDecayed {
        occupant: OccupantId,
    },
}

impl GravityEvent {
    pub fn occupant(&self) -> OccupantId {
        match *self {
            GravityEvent::SelectionEntered { occupant }
            | GravityEvent::SelectionExited { occupant }
            | GravityEvent::FlipStarted { occupant, .. }
            | GravityEvent::FlipCompleted { occupant, .. }
            | GravityEvent::FloatBandEntered { occupant, .. }
            | GravityEvent::FloatBandExited { occupant, .. }
            | GravityEvent::FullyImmersed { occupant, .. }
            | GravityEvent::OrbitEstablished { occupant, .. }
            | GravityEvent::OrbitDecayed { occupant } => occupant,
        }
    }
}

/// FIFO of pending events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<GravityEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GravityEvent) {
        self.events.push(event);
    }

    /// Pending events, oldest first.
    pub fn events(&self) -> &[GravityEvent] {
        &self.events
    }

    /// Take every pending event, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<GravityEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let mut queue = EventQueue::new();
        queue.push(GravityEvent::SelectionEntered { occupant: OccupantId(1) });
        queue.push(GravityEvent::OrbitDecayed { occupant: OccupantId(2) });

        let drained = queue.drain();
        assert!(queue.is_empty());
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].occupant(), OccupantId(1));
        assert_eq!(drained[1].occupant(), OccupantId(2));
    }
}

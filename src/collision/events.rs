//! Contact and intersection transition events, and the sinks that receive them.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::collision::collider::ColliderHandle;

/// A transition of a non-sensor contact pair across the touching boundary.
///
/// Emitted when the number of touching contact points of a pair transitions
/// between zero and non-zero. Fluctuations in the point count that stay at
/// one or more points emit nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactEvent {
    /// The first collider of the pair.
    pub collider1: ColliderHandle,
    /// The second collider of the pair.
    pub collider2: ColliderHandle,
    /// `true` when the colliders started touching, `false` when they stopped.
    pub started: bool,
}

/// A transition of a sensor pair across the intersecting boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct IntersectionEvent {
    /// The first collider of the pair.
    pub collider1: ColliderHandle,
    /// The second collider of the pair.
    pub collider2: ColliderHandle,
    /// `true` when the colliders started intersecting, `false` when they
    /// stopped.
    pub intersecting: bool,
}

/// A sink receiving collision events as they are detected by the narrow phase.
///
/// Two interchangeable delivery modes exist behind this one interface:
///
/// - **Handler mode**: implement this trait yourself; the methods are invoked
///   inline at the moment each transition is detected during the step.
/// - **Queue mode**: pass a [`CollisionEventQueue`], which buffers events for
///   explicit draining between steps.
///
/// The unit type `()` implements this trait by discarding every event.
///
/// Methods take `&self`: a sink shared across threads must provide its own
/// interior mutability, as [`CollisionEventQueue`] does.
pub trait EventHandler: Send + Sync {
    /// Called once at the beginning of each step, before any events are
    /// emitted. Buffered sinks use this to apply their clearing policy.
    fn step_started(&self) {}

    /// Receives a contact transition event.
    fn handle_contact_event(&self, event: ContactEvent);

    /// Receives an intersection transition event.
    fn handle_intersection_event(&self, event: IntersectionEvent);
}

impl EventHandler for () {
    fn handle_contact_event(&self, _event: ContactEvent) {}
    fn handle_intersection_event(&self, _event: IntersectionEvent) {}
}

/// What a [`CollisionEventQueue`] does with events left over from
/// previous steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum QueuePolicy {
    /// Undrained events are dropped at the start of each step. The queues
    /// never grow past one step's worth of events, but events are lost if
    /// the caller does not drain between steps.
    #[default]
    AutoClear,
    /// Events accumulate until drained. Nothing is lost, but the queues grow
    /// without bound if the caller never drains them.
    Accumulate,
}

/// An [`EventHandler`] that buffers events in queues drained explicitly by
/// the caller.
///
/// The queues are mutex-backed, so draining from one thread while a step on
/// another thread appends is safe. Whether stale events are dropped or kept
/// is the caller's choice through [`QueuePolicy`].
#[derive(Debug, Default)]
pub struct CollisionEventQueue {
    policy: QueuePolicy,
    contact_events: Mutex<VecDeque<ContactEvent>>,
    intersection_events: Mutex<VecDeque<IntersectionEvent>>,
}

impl CollisionEventQueue {
    /// Creates an empty queue with the given policy.
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            policy,
            contact_events: Mutex::new(VecDeque::new()),
            intersection_events: Mutex::new(VecDeque::new()),
        }
    }

    /// Removes and returns all buffered contact events, oldest first.
    pub fn drain_contact_events(&self) -> Vec<ContactEvent> {
        let mut queue = self.contact_events.lock().unwrap_or_else(|e| e.into_inner());
        queue.drain(..).collect()
    }

    /// Removes and returns all buffered intersection events, oldest first.
    pub fn drain_intersection_events(&self) -> Vec<IntersectionEvent> {
        let mut queue = self
            .intersection_events
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        queue.drain(..).collect()
    }
}

impl EventHandler for CollisionEventQueue {
    fn step_started(&self) {
        if self.policy == QueuePolicy::AutoClear {
            self.contact_events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clear();
            self.intersection_events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clear();
        }
    }

    fn handle_contact_event(&self, event: ContactEvent) {
        self.contact_events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(event);
    }

    fn handle_intersection_event(&self, event: IntersectionEvent) {
        self.intersection_events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Handle;

    fn event(started: bool) -> ContactEvent {
        ContactEvent {
            collider1: ColliderHandle(Handle::from_raw_parts(0, 0)),
            collider2: ColliderHandle(Handle::from_raw_parts(1, 0)),
            started,
        }
    }

    #[test]
    fn auto_clear_drops_undrained_events() {
        let queue = CollisionEventQueue::new(QueuePolicy::AutoClear);
        queue.handle_contact_event(event(true));

        queue.step_started();
        queue.handle_contact_event(event(false));

        let events = queue.drain_contact_events();
        assert_eq!(events.len(), 1);
        assert!(!events[0].started);
    }

    #[test]
    fn accumulate_keeps_events_across_steps() {
        let queue = CollisionEventQueue::new(QueuePolicy::Accumulate);
        queue.handle_contact_event(event(true));
        queue.step_started();
        queue.handle_contact_event(event(false));

        let events = queue.drain_contact_events();
        assert_eq!(events.len(), 2);
        assert!(events[0].started);
        assert!(queue.drain_contact_events().is_empty());
    }
}

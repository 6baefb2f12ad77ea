//! Fixed-capacity FIFO of events waiting to be injected.

use crate::codec::LogEntry;
use crate::host::InjectedEvent;
use std::collections::VecDeque;

/// A reconstructed event and the session time it should fire at.
#[derive(Clone, Debug, PartialEq)]
pub struct QueuedEvent {
    pub entry: LogEntry,
    pub event: InjectedEvent,
    /// Microseconds since the replay session started.
    pub fire_at_us: u64,
}

/// Bounded queue; never grows past the capacity it was created with.
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<QueuedEvent>,
    capacity: usize,
}

impl EventQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.events.len() >= self.capacity
    }

    /// Append an event, handing it back if the queue is full.
    pub fn push(&mut self, event: QueuedEvent) -> Result<(), QueuedEvent> {
        if self.is_full() {
            return Err(event);
        }
        self.events.push_back(event);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<QueuedEvent> {
        self.events.pop_front()
    }

    /// Fire time of the head, if any.
    pub fn next_fire_at(&self) -> Option<u64> {
        self.events.front().map(|e| e.fire_at_us)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EventKind;
    use crate::host::WindowId;

    fn queued(fire_at_us: u64) -> QueuedEvent {
        QueuedEvent {
            entry: LogEntry {
                timestamp_us: fire_at_us,
                kind: EventKind::MouseMotion,
                x: 1,
                y: 1,
                code: 0,
                modifiers: 0,
            },
            event: InjectedEvent::MouseMotion {
                window: WindowId(0),
                x: 1,
                y: 1,
                xrel: 0,
                yrel: 0,
                state: 0,
            },
            fire_at_us,
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = EventQueue::with_capacity(4);
        queue.push(queued(10)).unwrap();
        queue.push(queued(20)).unwrap();

        assert_eq!(queue.next_fire_at(), Some(10));
        assert_eq!(queue.pop().unwrap().fire_at_us, 10);
        assert_eq!(queue.pop().unwrap().fire_at_us, 20);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_push_rejected_when_full() {
        let mut queue = EventQueue::with_capacity(2);
        queue.push(queued(1)).unwrap();
        queue.push(queued(2)).unwrap();
        assert!(queue.is_full());

        let rejected = queue.push(queued(3)).unwrap_err();
        assert_eq!(rejected.fire_at_us, 3);
        assert_eq!(queue.len(), 2);

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 2);
    }
}

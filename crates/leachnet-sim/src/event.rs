//! Event ordering for the discrete-event engine.

use std::cmp::Ordering;

use leachnet_protocol::{Address, Message, Timer, Timestamp};

/// Events the engine delivers.
#[derive(Debug, Clone)]
pub enum SimEvent {
    /// Deliver a timer back to the node that requested it.
    Timer { node: Address, timer: Timer },
    /// Deliver a message to one receiver.
    Deliver {
        to: Address,
        from: Address,
        message: Message,
    },
}

/// An event with its due time and queue position.
///
/// Ordering is reversed so a `BinaryHeap` pops the earliest event first;
/// events due at the same instant run in insertion (FIFO) order via the
/// sequence number. The protocol must not rely on anything beyond this
/// being some total order.
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub time: Timestamp,
    pub seq: u64,
    pub event: SimEvent,
}

impl ScheduledEvent {
    pub fn new(time: Timestamp, seq: u64, event: SimEvent) -> Self {
        Self { time, seq, event }
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.time.cmp(&self.time) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            ord => ord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    fn timer_at(ms: u64, seq: u64) -> ScheduledEvent {
        ScheduledEvent::new(
            Timestamp::from_millis(ms),
            seq,
            SimEvent::Timer {
                node: Address::new(1),
                timer: Timer::RoundTick,
            },
        )
    }

    #[test]
    fn earliest_event_pops_first() {
        let mut heap = BinaryHeap::new();
        heap.push(timer_at(300, 0));
        heap.push(timer_at(100, 1));
        heap.push(timer_at(200, 2));

        assert_eq!(heap.pop().unwrap().time, Timestamp::from_millis(100));
        assert_eq!(heap.pop().unwrap().time, Timestamp::from_millis(200));
        assert_eq!(heap.pop().unwrap().time, Timestamp::from_millis(300));
    }

    #[test]
    fn same_time_runs_in_fifo_order() {
        let mut heap = BinaryHeap::new();
        heap.push(timer_at(100, 5));
        heap.push(timer_at(100, 3));
        heap.push(timer_at(100, 4));

        assert_eq!(heap.pop().unwrap().seq, 3);
        assert_eq!(heap.pop().unwrap().seq, 4);
        assert_eq!(heap.pop().unwrap().seq, 5);
    }
}

//! Min-heap event scheduling over simulated time.
//!
//! `BinaryHeap` is a max-heap, so `Event`'s ordering is reversed: the
//! earliest time pops first, and a monotonically increasing id breaks ties
//! so simultaneous events keep their insertion order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::frame::Frame;

/// What happens when an event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A DATA frame reaches the receiver.
    FrameArrive,
    /// A control frame (ACK or NAK) reaches the sender.
    AckArrive,
}

/// A scheduled occurrence in simulated time.
#[derive(Debug, Clone)]
pub struct Event {
    /// Absolute simulated time, seconds.
    pub time: f64,
    /// Insertion counter; orders simultaneous events.
    pub id: u64,
    pub kind: EventKind,
    pub frame: Frame,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so the earliest deadline pops first; ids break
        // ties in insertion order.
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Time-ordered event queue.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Event>,
    next_id: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `frame` to fire at absolute simulated time `at`.
    pub fn schedule(&mut self, at: f64, kind: EventKind, frame: Frame) {
        let id = self.next_id;
        self.next_id += 1;
        self.heap.push(Event {
            time: at,
            id,
            kind,
            frame,
        });
    }

    /// Earliest scheduled time, if any event is queued.
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|event| event.time)
    }

    /// Remove and return the earliest event.
    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ack(seq: u64) -> Frame {
        Frame::Ack { seq }
    }

    #[test]
    fn pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.schedule(3.0, EventKind::FrameArrive, ack(3));
        queue.schedule(1.0, EventKind::FrameArrive, ack(1));
        queue.schedule(2.0, EventKind::AckArrive, ack(2));

        let times: Vec<f64> = std::iter::from_fn(|| queue.pop().map(|e| e.time)).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn equal_times_keep_insertion_order() {
        let mut queue = EventQueue::new();
        for seq in 0..16u64 {
            queue.schedule(0.5, EventKind::FrameArrive, ack(seq));
        }
        let seqs: Vec<u64> = std::iter::from_fn(|| queue.pop().map(|e| e.frame.seq())).collect();
        assert_eq!(seqs, (0..16).collect::<Vec<u64>>());
    }

    #[test]
    fn peek_does_not_consume() {
        let mut queue = EventQueue::new();
        queue.schedule(0.25, EventKind::AckArrive, ack(0));
        assert_eq!(queue.peek_time(), Some(0.25));
        assert_eq!(queue.len(), 1);
        assert!(queue.pop().is_some());
        assert!(queue.is_empty());
        assert_eq!(queue.peek_time(), None);
    }
}

//! Selective Repeat sender window.

use std::collections::BTreeMap;

use bytes::Bytes;
use tracing::trace;

use crate::frame::Frame;

/// Book-keeping for one outstanding DATA frame.
///
/// The stored frame is the clean retransmission copy; only the in-flight
/// clone ever carries a corruption verdict.
#[derive(Debug, Clone)]
pub struct SendSlot {
    /// Clean copy kept for retransmission.
    pub frame: Frame,
    /// Retransmission timer expiry, simulated seconds.
    pub expiry: f64,
    /// Time of the first transmission.
    pub first_sent: f64,
    /// Total transmissions so far (1 = never retransmitted).
    pub transmits: u32,
}

/// Selective Repeat sender state machine.
///
/// Sequence numbers are unbounded: a run transfers a finite stream, so the
/// space never wraps and window membership is plain integer comparison.
/// The slot map doubles as retransmission buffer and timer table, keyed by
/// sequence number -- a sequence has a timer exactly while it is buffered.
#[derive(Debug)]
pub struct SelectiveRepeatSender {
    base: u64,
    next_seq: u64,
    window_size: usize,
    timeout: f64,
    slots: BTreeMap<u64, SendSlot>,
    retransmissions: u64,
}

impl SelectiveRepeatSender {
    pub fn new(window_size: usize, timeout: f64) -> Self {
        Self {
            base: 0,
            next_seq: 0,
            window_size,
            timeout,
            slots: BTreeMap::new(),
            retransmissions: 0,
        }
    }

    /// True while fewer than `window_size` frames are outstanding.
    pub fn can_send(&self) -> bool {
        self.slots.len() < self.window_size
    }

    /// True while any frame awaits acknowledgement.
    pub fn has_pending(&self) -> bool {
        !self.slots.is_empty()
    }

    /// Lowest unacknowledged sequence number.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Next sequence number to assign.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Number of unacknowledged frames in flight.
    pub fn outstanding(&self) -> usize {
        self.slots.len()
    }

    /// Total retransmissions over the sender's lifetime.
    pub fn retransmissions(&self) -> u64 {
        self.retransmissions
    }

    /// Wrap `payload` into the next DATA frame, buffer it, and start its
    /// timer. Returns `None` when the window is full.
    pub fn send_frame(&mut self, payload: Bytes, now: f64) -> Option<Frame> {
        if !self.can_send() {
            return None;
        }
        let seq = self.next_seq;
        let frame = Frame::data(seq, payload);
        self.slots.insert(
            seq,
            SendSlot {
                frame: frame.clone(),
                expiry: now + self.timeout,
                first_sent: now,
                transmits: 1,
            },
        );
        self.next_seq += 1;
        trace!(seq, outstanding = self.slots.len(), "data frame buffered");
        Some(frame)
    }

    /// Retire `seq` and slide the window past the acknowledged prefix.
    ///
    /// Duplicate or unknown ACKs are no-ops. Returns the retired slot so
    /// the caller can harvest timing information.
    pub fn receive_ack(&mut self, seq: u64) -> Option<SendSlot> {
        let slot = self.slots.remove(&seq)?;
        while self.base != self.next_seq && !self.slots.contains_key(&self.base) {
            self.base += 1;
        }
        trace!(seq, base = self.base, "ack accepted");
        Some(slot)
    }

    /// Immediate retransmission in response to a NAK.
    ///
    /// If `seq` is still buffered, its timer is reset, the retransmission
    /// counter bumped, and a clean copy returned for transmission. NAKs for
    /// unknown sequence numbers are no-ops.
    pub fn receive_nak(&mut self, seq: u64, now: f64) -> Option<Frame> {
        let slot = self.slots.get_mut(&seq)?;
        slot.expiry = now + self.timeout;
        slot.transmits += 1;
        self.retransmissions += 1;
        trace!(seq, transmits = slot.transmits, "nak retransmit");
        Some(slot.frame.clone())
    }

    /// Collect clean copies of every frame whose timer has expired, in
    /// ascending sequence order, resetting each timer to `now + timeout`.
    pub fn check_timeouts(&mut self, now: f64) -> Vec<Frame> {
        let mut expired = Vec::new();
        for (&seq, slot) in self.slots.iter_mut() {
            if slot.expiry <= now {
                slot.expiry = now + self.timeout;
                slot.transmits += 1;
                self.retransmissions += 1;
                trace!(seq, transmits = slot.transmits, "timeout retransmit");
                expired.push(slot.frame.clone());
            }
        }
        expired
    }
}

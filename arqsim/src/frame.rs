//! Link-layer frame model.
//!
//! Frames are a closed three-case union: DATA carries a sequence number and
//! a payload; ACK and NAK carry only the sequence number they refer to. The
//! `corrupted` flag on DATA is transient -- the channel sets it on the
//! in-flight copy at transmission time, while the sender's buffered copy
//! stays clean for retransmission.

use bytes::Bytes;

/// Frame type discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Data,
    Ack,
    Nak,
}

/// A link-layer frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Payload-carrying frame.
    Data {
        seq: u64,
        payload: Bytes,
        corrupted: bool,
    },
    /// Positive acknowledgement for `seq`.
    Ack { seq: u64 },
    /// Negative acknowledgement: `seq` arrived corrupted, retransmit it.
    Nak { seq: u64 },
}

impl Frame {
    /// A clean DATA frame.
    pub fn data(seq: u64, payload: Bytes) -> Self {
        Frame::Data {
            seq,
            payload,
            corrupted: false,
        }
    }

    /// Return the frame type discriminant.
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Data { .. } => FrameType::Data,
            Frame::Ack { .. } => FrameType::Ack,
            Frame::Nak { .. } => FrameType::Nak,
        }
    }

    /// Sequence number carried by any variant.
    pub fn seq(&self) -> u64 {
        match self {
            Frame::Data { seq, .. } | Frame::Ack { seq } | Frame::Nak { seq } => *seq,
        }
    }

    /// On-the-wire size in bits, link header included.
    pub fn size_bits(&self, link_header_size: usize) -> u64 {
        let payload_len = match self {
            Frame::Data { payload, .. } => payload.len(),
            Frame::Ack { .. } | Frame::Nak { .. } => 0,
        };
        ((link_header_size + payload_len) * 8) as u64
    }

    pub fn is_corrupted(&self) -> bool {
        matches!(self, Frame::Data { corrupted: true, .. })
    }

    /// Set the corruption verdict on a DATA frame; no-op for control frames.
    pub fn set_corrupted(&mut self, verdict: bool) {
        if let Frame::Data { corrupted, .. } = self {
            *corrupted = verdict;
        }
    }
}

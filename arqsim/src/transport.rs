//! Transport-layer segmentation and reassembly.
//!
//! `TransportSender` slices a source byte stream into segments sized to fit
//! one link frame; `TransportReceiver` reassembles them, holding
//! out-of-order segments in a capacity-bounded pending buffer. Backpressure
//! is the receive-window flow control above the ARQ layer: while pending
//! bytes fill the buffer, the driver must stop pulling new segments from
//! the source.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};

/// One slice of the source byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position of this slice in the stream.
    pub index: u64,
    pub payload: Bytes,
    /// Set on the final slice.
    pub is_last: bool,
}

/// Segments a byte stream for transmission.
///
/// Segmentation is zero-copy: each payload is a refcounted slice of the
/// source buffer.
#[derive(Debug)]
pub struct TransportSender {
    data: Bytes,
    segment_size: usize,
    offset: usize,
    next_index: u64,
}

impl TransportSender {
    pub fn new(data: Bytes, segment_size: usize) -> Self {
        Self {
            data,
            segment_size,
            offset: 0,
            next_index: 0,
        }
    }

    /// True while unsent source bytes remain.
    pub fn has_data(&self) -> bool {
        self.offset < self.data.len()
    }

    /// Number of segments the whole stream produces.
    pub fn total_segments(&self) -> u64 {
        self.data.len().div_ceil(self.segment_size) as u64
    }

    /// Source length in bytes.
    pub fn source_len(&self) -> usize {
        self.data.len()
    }

    /// Yield the next segment, or `None` once the stream is exhausted.
    /// Only the last segment may be shorter than the segment size.
    pub fn next_segment(&mut self) -> Option<Segment> {
        if !self.has_data() {
            return None;
        }
        let end = usize::min(self.offset + self.segment_size, self.data.len());
        let segment = Segment {
            index: self.next_index,
            payload: self.data.slice(self.offset..end),
            is_last: end == self.data.len(),
        };
        self.offset = end;
        self.next_index += 1;
        Some(segment)
    }
}

/// Reassembles segments with receive-buffer flow control.
///
/// In-order segments drain straight into the delivered stream; out-of-order
/// segments wait in a pending map whose bytes count against the configured
/// capacity. Re-delivery of an already reassembled segment is a no-op, so
/// feeding the same delivery list twice yields the same byte stream.
#[derive(Debug)]
pub struct TransportReceiver {
    capacity: usize,
    pending: BTreeMap<u64, Segment>,
    pending_bytes: usize,
    next_expected: u64,
    delivered: BytesMut,
    buffer_full_events: u64,
    saw_last: bool,
}

impl TransportReceiver {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pending: BTreeMap::new(),
            pending_bytes: 0,
            next_expected: 0,
            delivered: BytesMut::new(),
            buffer_full_events: 0,
            saw_last: false,
        }
    }

    /// True once pending bytes have reached the buffer capacity.
    pub fn is_backpressure_active(&self) -> bool {
        self.pending_bytes >= self.capacity
    }

    /// Bytes released to the delivered stream so far.
    pub fn bytes_delivered(&self) -> usize {
        self.delivered.len()
    }

    /// Times a segment was rejected because the buffer was full.
    pub fn buffer_full_events(&self) -> u64 {
        self.buffer_full_events
    }

    /// Index of the next segment the reassembler is waiting for.
    pub fn next_expected(&self) -> u64 {
        self.next_expected
    }

    /// True once the last segment has been reassembled and nothing is
    /// pending.
    pub fn is_complete(&self) -> bool {
        self.saw_last && self.pending.is_empty()
    }

    /// Accept one segment.
    ///
    /// Returns `false` (and counts a buffer-full event) when the pending
    /// buffer cannot hold it; the caller is expected to retry after
    /// backpressure clears.
    pub fn receive_segment(&mut self, segment: Segment) -> bool {
        if segment.index < self.next_expected {
            // Already reassembled; idempotent.
            return true;
        }

        let len = segment.payload.len();
        if self.pending_bytes + len > self.capacity {
            self.buffer_full_events += 1;
            return false;
        }

        if let Some(previous) = self.pending.insert(segment.index, segment) {
            self.pending_bytes -= previous.payload.len();
        }
        self.pending_bytes += len;
        self.drain();
        true
    }

    fn drain(&mut self) {
        while let Some(segment) = self.pending.remove(&self.next_expected) {
            self.pending_bytes -= segment.payload.len();
            self.delivered.put_slice(&segment.payload);
            if segment.is_last {
                self.saw_last = true;
            }
            self.next_expected += 1;
        }
    }

    /// The reassembled stream so far.
    pub fn data(&self) -> &[u8] {
        &self.delivered
    }

    /// Consume the receiver, yielding the reassembled stream.
    pub fn into_data(self) -> Bytes {
        self.delivered.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(len: usize) -> Bytes {
        Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>())
    }

    #[test]
    fn segmentation_round_trips() {
        let data = source(10_000);
        let mut tx = TransportSender::new(data.clone(), 1016);

        let mut segments = Vec::new();
        while let Some(segment) = tx.next_segment() {
            segments.push(segment);
        }

        assert_eq!(segments.len(), 10_000usize.div_ceil(1016));
        assert!(segments.last().unwrap().is_last);
        assert!(segments[..segments.len() - 1].iter().all(|s| !s.is_last));
        // Only the final segment may be short.
        assert!(segments[..segments.len() - 1]
            .iter()
            .all(|s| s.payload.len() == 1016));

        let mut joined = Vec::new();
        for segment in &segments {
            joined.extend_from_slice(&segment.payload);
        }
        assert_eq!(joined, data);
    }

    #[test]
    fn exact_multiple_has_full_last_segment() {
        let mut tx = TransportSender::new(source(2048), 1024);
        assert_eq!(tx.total_segments(), 2);
        let first = tx.next_segment().unwrap();
        let last = tx.next_segment().unwrap();
        assert!(!first.is_last);
        assert!(last.is_last);
        assert_eq!(last.payload.len(), 1024);
        assert!(tx.next_segment().is_none());
    }

    #[test]
    fn in_order_segments_drain_immediately() {
        let data = source(3000);
        let mut tx = TransportSender::new(data.clone(), 1000);
        let mut rx = TransportReceiver::new(4096);

        while let Some(segment) = tx.next_segment() {
            assert!(rx.receive_segment(segment));
            assert!(!rx.is_backpressure_active());
        }
        assert!(rx.is_complete());
        assert_eq!(rx.into_data(), data);
    }

    #[test]
    fn out_of_order_segments_reassemble() {
        let data = source(3000);
        let mut tx = TransportSender::new(data.clone(), 1000);
        let segments: Vec<Segment> = std::iter::from_fn(|| tx.next_segment()).collect();

        let mut rx = TransportReceiver::new(4096);
        rx.receive_segment(segments[2].clone());
        rx.receive_segment(segments[0].clone());
        assert_eq!(rx.bytes_delivered(), 1000);
        rx.receive_segment(segments[1].clone());
        assert!(rx.is_complete());
        assert_eq!(rx.into_data(), data);
    }

    #[test]
    fn redelivery_is_idempotent() {
        let data = source(2000);
        let mut tx = TransportSender::new(data.clone(), 1000);
        let segments: Vec<Segment> = std::iter::from_fn(|| tx.next_segment()).collect();

        let mut rx = TransportReceiver::new(4096);
        for segment in segments.iter().chain(segments.iter()) {
            assert!(rx.receive_segment(segment.clone()));
        }
        assert_eq!(rx.into_data(), data);
    }

    #[test]
    fn backpressure_activates_on_pending_bytes() {
        let mut rx = TransportReceiver::new(1000);
        // Hold a gap at index 0 so nothing drains.
        let pending = Segment {
            index: 1,
            payload: Bytes::from(vec![0u8; 1000]),
            is_last: false,
        };
        assert!(rx.receive_segment(pending));
        assert!(rx.is_backpressure_active());

        let rejected = Segment {
            index: 2,
            payload: Bytes::from(vec![0u8; 10]),
            is_last: false,
        };
        assert!(!rx.receive_segment(rejected));
        assert_eq!(rx.buffer_full_events(), 1);

        // Filling the gap drains everything and releases backpressure.
        let gap = Segment {
            index: 0,
            payload: Bytes::from(vec![1u8; 100]),
            is_last: false,
        };
        assert!(rx.receive_segment(gap));
        assert!(!rx.is_backpressure_active());
        assert_eq!(rx.bytes_delivered(), 1100);
    }
}

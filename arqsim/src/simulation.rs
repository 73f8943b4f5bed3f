//! The simulation driver.
//!
//! Wires the channel, the Selective Repeat state machines, the transport
//! adapter and the event queue, and owns simulated time. Single-threaded
//! cooperative: the only "suspension" is advancing `now` to the next
//! event's timestamp.

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::channel::GilbertElliotChannel;
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::frame::Frame;
use crate::link::{SelectiveRepeatReceiver, SelectiveRepeatSender};
use crate::metrics::{Metrics, SimReport};
use crate::scheduler::{Event, EventKind, EventQueue};
use crate::transport::{Segment, TransportReceiver, TransportSender};

/// Simulated-time step used only when the event heap runs dry while
/// retransmissions are still pending; not exercised in steady state.
const STARVATION_STEP: f64 = 0.001;

/// Run a configured simulation against `data` and return its result record.
///
/// The single entry point sweep collaborators build on.
pub fn run_simulation(config: SimConfig, data: Bytes) -> Result<SimReport> {
    let mut simulation = Simulation::new(config)?;
    simulation.load_data(data);
    simulation.run()
}

/// One isolated simulation instance owning all protocol state.
pub struct Simulation {
    config: SimConfig,
    now: f64,
    channel: GilbertElliotChannel,
    sender: SelectiveRepeatSender,
    receiver: SelectiveRepeatReceiver,
    transport_tx: Option<TransportSender>,
    transport_rx: TransportReceiver,
    events: EventQueue,
    metrics: Metrics,
    /// Stream index for the next in-order payload handed to the reassembler.
    deliver_index: u64,
    total_segments: u64,
}

impl Simulation {
    /// Build a simulation from a validated configuration.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let channel = GilbertElliotChannel::new(
            config.good_ber,
            config.bad_ber,
            config.p_good_to_bad,
            config.p_bad_to_good,
            config.seed,
        );
        let sender = SelectiveRepeatSender::new(config.window_size, config.timeout());
        let receiver = SelectiveRepeatReceiver::new(config.window_size);
        let transport_rx = TransportReceiver::new(config.receiver_buffer_size);
        Ok(Self {
            now: 0.0,
            channel,
            sender,
            receiver,
            transport_tx: None,
            transport_rx,
            events: EventQueue::new(),
            metrics: Metrics::default(),
            deliver_index: 0,
            total_segments: 0,
            config,
        })
    }

    /// Load the byte stream to transfer. Replaces any previously loaded
    /// source.
    pub fn load_data(&mut self, data: Bytes) {
        let transport_tx = TransportSender::new(data, self.config.segment_size());
        self.total_segments = transport_tx.total_segments();
        self.transport_tx = Some(transport_tx);
    }

    /// Current simulated time, seconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Bytes reassembled on the receive side so far.
    pub fn delivered_data(&self) -> &[u8] {
        self.transport_rx.data()
    }

    /// Run to completion (or to the event cap) and build the result record.
    pub fn run(&mut self) -> Result<SimReport> {
        let Some(source_len) = self.transport_tx.as_ref().map(TransportSender::source_len) else {
            return Err(SimError::NoDataLoaded);
        };
        debug!(
            window = self.config.window_size,
            payload = self.config.frame_payload_size,
            segments = self.total_segments,
            seed = self.config.seed,
            "simulation start"
        );

        let mut completed = true;
        let mut iterations: u64 = 0;
        loop {
            let has_data = self
                .transport_tx
                .as_ref()
                .is_some_and(TransportSender::has_data);
            if !has_data && !self.sender.has_pending() && self.events.is_empty() {
                break;
            }
            if iterations >= self.config.max_events {
                warn!(
                    delivered = self.transport_rx.bytes_delivered(),
                    expected = source_len,
                    retransmissions = self.sender.retransmissions(),
                    "event cap reached, marking run incomplete"
                );
                completed = false;
                break;
            }
            iterations += 1;

            self.fill_window();

            // Fire every timer due before the next event.
            let horizon = self.events.peek_time().unwrap_or(self.now);
            for frame in self.sender.check_timeouts(horizon) {
                self.transmit_data(frame, true);
            }

            match self.events.pop() {
                Some(event) => {
                    // Simulated time never moves backwards.
                    debug_assert!(event.time >= self.now);
                    self.now = event.time;
                    self.dispatch(event);
                }
                None => {
                    // Heap drained with retransmissions still pending; let
                    // starved timers fire on the next pass.
                    self.now += STARVATION_STEP;
                }
            }
        }

        debug!(
            time = self.now,
            events = iterations,
            delivered = self.transport_rx.bytes_delivered(),
            "simulation finished"
        );
        Ok(self.build_report(completed))
    }

    /// Keep the pipe full: emit new DATA frames while the window has room,
    /// the source has bytes, and the reassembler is not pushing back.
    fn fill_window(&mut self) {
        while self.sender.can_send() && !self.transport_rx.is_backpressure_active() {
            let Some(segment) = self
                .transport_tx
                .as_mut()
                .and_then(TransportSender::next_segment)
            else {
                break;
            };
            // One DATA frame per segment; sequence numbers align with
            // segment indices. The window was checked, so this cannot fail.
            if let Some(frame) = self.sender.send_frame(segment.payload, self.now) {
                self.transmit_data(frame, false);
            }
        }
    }

    /// Push one DATA frame into the channel and schedule its arrival.
    ///
    /// The corruption verdict is drawn here, at transmission time, and
    /// travels with the in-flight copy; the sender's buffered copy stays
    /// clean. Every retransmission is a fresh channel call.
    fn transmit_data(&mut self, mut frame: Frame, retransmission: bool) {
        let bits = frame.size_bits(self.config.link_header_size);
        let tx_time = bits as f64 / self.config.bit_rate;
        let corrupted = self.channel.transmit_frame(bits);
        frame.set_corrupted(corrupted);
        self.metrics
            .record_frame_sent((bits / 8) as usize, retransmission);

        let at = self.now + tx_time + self.config.forward_delay + self.config.processing_delay;
        trace!(seq = frame.seq(), corrupted, retransmission, at, "data frame in flight");
        self.events.schedule(at, EventKind::FrameArrive, frame);
    }

    fn dispatch(&mut self, event: Event) {
        match event.kind {
            EventKind::FrameArrive => self.on_frame_arrive(event.frame),
            EventKind::AckArrive => self.on_ack_arrive(event.frame),
        }
    }

    /// A DATA frame reaches the receiver: hand newly in-order payloads to
    /// the reassembler and send the response back. Control frames are
    /// lossless and their transmission time is negligible, so only the
    /// reverse and processing delays apply.
    fn on_frame_arrive(&mut self, frame: Frame) {
        let (response, payloads) = self.receiver.receive_frame(&frame);
        for payload in payloads {
            self.deliver_payload(payload);
        }
        self.metrics.record_ack_sent();
        let at = self.now + self.config.reverse_delay + self.config.processing_delay;
        self.events.schedule(at, EventKind::AckArrive, response);
    }

    fn deliver_payload(&mut self, payload: Bytes) {
        let index = self.deliver_index;
        self.deliver_index += 1;
        self.metrics.record_frame_delivered(payload.len());
        let segment = Segment {
            index,
            payload,
            is_last: index + 1 == self.total_segments,
        };
        if !self.transport_rx.receive_segment(segment) {
            // Cannot happen for in-order delivery; counted for diagnostics.
            trace!(index, "reassembly buffer rejected a segment");
        }
    }

    /// A control frame reaches the sender. Unknown sequence numbers are
    /// silent no-ops.
    fn on_ack_arrive(&mut self, frame: Frame) {
        match frame {
            Frame::Ack { seq } => {
                self.metrics.record_ack_received();
                if let Some(slot) = self.sender.receive_ack(seq) {
                    // Karn: only never-retransmitted frames yield samples.
                    if slot.transmits == 1 {
                        self.metrics.record_rtt(self.now - slot.first_sent);
                    }
                }
            }
            Frame::Nak { seq } => {
                self.metrics.record_ack_received();
                if let Some(copy) = self.sender.receive_nak(seq, self.now) {
                    self.transmit_data(copy, true);
                }
            }
            // DATA is never scheduled as an AckArrive event.
            Frame::Data { .. } => {}
        }
    }

    fn build_report(&self, completed: bool) -> SimReport {
        // Guard against a zero-length run.
        let total_time = if self.now > 0.0 { self.now } else { 1.0 };
        let bytes_delivered = self.transport_rx.bytes_delivered() as u64;
        let goodput = bytes_delivered as f64 / total_time;
        let utilization = goodput / (self.config.bit_rate / 8.0);

        SimReport {
            window_size: self.config.window_size,
            frame_payload_size: self.config.frame_payload_size,
            seed: self.config.seed,
            goodput,
            utilization,
            avg_rtt: self.metrics.avg_rtt(),
            retransmissions: self.sender.retransmissions(),
            total_time,
            bytes_delivered,
            completed,
            frames_sent: self.metrics.frames_sent,
            frames_received: self.metrics.frames_received,
            acks_sent: self.metrics.acks_sent,
            acks_received: self.metrics.acks_received,
            bytes_sent: self.metrics.bytes_sent,
            throughput: self.metrics.throughput(total_time),
            efficiency: self.metrics.efficiency(),
            retransmission_rate: self.metrics.retransmission_rate(),
            buffer_full_events: self.transport_rx.buffer_full_events(),
            channel: self.channel.stats(),
        }
    }
}

//! Run counters and the per-run result record.

use serde::Serialize;

use crate::channel::ChannelStats;

/// Counters accumulated while a simulation runs.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub frames_retransmitted: u64,
    pub acks_sent: u64,
    pub acks_received: u64,
    /// Link bytes pushed, headers and retransmissions included.
    pub bytes_sent: u64,
    /// Payload bytes released in order to the transport layer.
    pub bytes_delivered: u64,
    pub rtt_samples: Vec<f64>,
}

impl Metrics {
    pub fn record_frame_sent(&mut self, frame_bytes: usize, retransmission: bool) {
        self.frames_sent += 1;
        self.bytes_sent += frame_bytes as u64;
        if retransmission {
            self.frames_retransmitted += 1;
        }
    }

    pub fn record_frame_delivered(&mut self, payload_bytes: usize) {
        self.frames_received += 1;
        self.bytes_delivered += payload_bytes as u64;
    }

    pub fn record_ack_sent(&mut self) {
        self.acks_sent += 1;
    }

    pub fn record_ack_received(&mut self) {
        self.acks_received += 1;
    }

    pub fn record_rtt(&mut self, sample: f64) {
        self.rtt_samples.push(sample);
    }

    /// Mean of the recorded RTT samples, or zero without samples.
    pub fn avg_rtt(&self) -> f64 {
        if self.rtt_samples.is_empty() {
            0.0
        } else {
            self.rtt_samples.iter().sum::<f64>() / self.rtt_samples.len() as f64
        }
    }

    /// Raw link throughput in bits per second over `total_time`.
    pub fn throughput(&self, total_time: f64) -> f64 {
        if total_time <= 0.0 {
            0.0
        } else {
            self.bytes_sent as f64 * 8.0 / total_time
        }
    }

    /// Useful bytes delivered per byte pushed onto the link.
    pub fn efficiency(&self) -> f64 {
        if self.bytes_sent == 0 {
            0.0
        } else {
            self.bytes_delivered as f64 / self.bytes_sent as f64
        }
    }

    /// Retransmitted share of all frame transmissions.
    pub fn retransmission_rate(&self) -> f64 {
        if self.frames_sent == 0 {
            0.0
        } else {
            self.frames_retransmitted as f64 / self.frames_sent as f64
        }
    }
}

/// Result record of a single simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub window_size: usize,
    pub frame_payload_size: usize,
    pub seed: u64,
    /// Useful bytes delivered per simulated second.
    pub goodput: f64,
    /// Goodput over the theoretical byte rate, 0..1.
    pub utilization: f64,
    /// Mean round-trip time over never-retransmitted frames, seconds.
    pub avg_rtt: f64,
    pub retransmissions: u64,
    /// Simulated seconds from start to termination.
    pub total_time: f64,
    pub bytes_delivered: u64,
    /// False when the event cap cut the run short.
    pub completed: bool,
    pub frames_sent: u64,
    pub frames_received: u64,
    pub acks_sent: u64,
    pub acks_received: u64,
    pub bytes_sent: u64,
    /// Raw link bits per second, retransmissions included.
    pub throughput: f64,
    pub efficiency: f64,
    pub retransmission_rate: f64,
    pub buffer_full_events: u64,
    pub channel: ChannelStats,
}

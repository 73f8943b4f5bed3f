//! Per-run simulation configuration.
//!
//! Every parameter a component needs travels in one `SimConfig` value that
//! is passed in explicitly; nothing is read from process-wide state.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Retransmission timeout as a multiple of the round-trip time.
pub const TIMEOUT_MULTIPLIER: f64 = 2.5;
/// Floor for the retransmission timeout, in seconds.
pub const MIN_TIMEOUT: f64 = 0.1;

/// Window sizes covered by the reference parameter sweep.
pub const WINDOW_SIZES: &[usize] = &[2, 4, 8, 16, 32, 64];
/// Frame payload sizes covered by the reference parameter sweep, in bytes.
pub const FRAME_PAYLOADS: &[usize] = &[128, 256, 512, 1024, 2048, 4096];
/// Simulation runs per (window, payload) configuration.
pub const RUNS_PER_CONFIG: usize = 10;
/// Default size of the transferred byte stream: 100 MiB.
pub const DEFAULT_FILE_SIZE: usize = 100 * 1024 * 1024;

/// Configuration of a single simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Send/receive window size W.
    pub window_size: usize,
    /// Link-layer payload size L, bytes.
    pub frame_payload_size: usize,
    /// Size of the byte stream to transfer, bytes.
    pub file_size: usize,
    /// Transport header overhead per segment, bytes.
    pub transport_header_size: usize,
    /// Link header overhead per frame, bytes.
    pub link_header_size: usize,
    /// Reassembly buffer capacity on the receive side, bytes.
    pub receiver_buffer_size: usize,
    /// Link bit rate, bits per second.
    pub bit_rate: f64,
    /// Data-frame propagation delay, seconds.
    pub forward_delay: f64,
    /// Control-frame propagation delay, seconds.
    pub reverse_delay: f64,
    /// Per-frame processing delay at either end, seconds.
    pub processing_delay: f64,
    /// Bit error rate in the channel's good state.
    pub good_ber: f64,
    /// Bit error rate in the channel's bad state.
    pub bad_ber: f64,
    /// Markov transition probability good -> bad.
    pub p_good_to_bad: f64,
    /// Markov transition probability bad -> good.
    pub p_bad_to_good: f64,
    /// RNG seed; runs with equal seeds and parameters are identical.
    pub seed: u64,
    /// Event-loop safety cap; reaching it marks the run incomplete.
    pub max_events: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            window_size: 8,
            frame_payload_size: 1024,
            file_size: DEFAULT_FILE_SIZE,
            transport_header_size: 8,
            link_header_size: 24,
            receiver_buffer_size: 256 * 1024,
            bit_rate: 10_000_000.0,
            forward_delay: 0.040,
            reverse_delay: 0.010,
            processing_delay: 0.002,
            good_ber: 1e-6,
            bad_ber: 5e-3,
            p_good_to_bad: 0.002,
            p_bad_to_good: 0.05,
            seed: 42,
            max_events: 1_000_000,
        }
    }
}

impl SimConfig {
    /// Round-trip time including processing at both ends, seconds.
    pub fn rtt(&self) -> f64 {
        self.forward_delay + self.reverse_delay + 2.0 * self.processing_delay
    }

    /// Static retransmission timeout for the run, seconds.
    pub fn timeout(&self) -> f64 {
        (self.rtt() * TIMEOUT_MULTIPLIER).max(MIN_TIMEOUT)
    }

    /// Transport payload bytes that fit into one link frame.
    pub fn segment_size(&self) -> usize {
        self.frame_payload_size.saturating_sub(self.transport_header_size)
    }

    /// Reject configurations the simulator cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(SimError::InvalidWindow);
        }
        if self.frame_payload_size <= self.transport_header_size {
            return Err(SimError::PayloadTooSmall {
                payload: self.frame_payload_size,
                header: self.transport_header_size,
            });
        }
        if self.bit_rate <= 0.0 {
            return Err(SimError::InvalidBitRate);
        }
        Ok(())
    }
}

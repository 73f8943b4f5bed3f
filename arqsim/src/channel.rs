//! Gilbert-Elliot burst-error channel.
//!
//! Two-state Markov model: a Good state with a low bit error rate and a Bad
//! state with a high one. The per-frame error model is used: each
//! `transmit_frame` call samples one state transition, then the whole frame
//! survives with probability `(1 - BER)^bits`. Verdicts are a pure function
//! of the seed and the sequence of prior calls.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use serde::Serialize;

/// Markov state of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Good,
    Bad,
}

/// Running counters accumulated over a channel's lifetime.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ChannelStats {
    /// Frames transmitted while the channel was in the good state.
    pub frames_in_good: u64,
    /// Frames transmitted while the channel was in the bad state.
    pub frames_in_bad: u64,
    /// Frames marked corrupted.
    pub corrupted_frames: u64,
    /// Total bits pushed through the channel.
    pub total_bits: u64,
}

impl ChannelStats {
    /// Fraction of transmissions that saw the bad state.
    pub fn bad_state_ratio(&self) -> f64 {
        let total = self.frames_in_good + self.frames_in_bad;
        if total == 0 {
            0.0
        } else {
            self.frames_in_bad as f64 / total as f64
        }
    }

    /// Fraction of transmissions that were corrupted.
    pub fn frame_error_ratio(&self) -> f64 {
        let total = self.frames_in_good + self.frames_in_bad;
        if total == 0 {
            0.0
        } else {
            self.corrupted_frames as f64 / total as f64
        }
    }
}

/// Gilbert-Elliot channel with a seeded RNG.
#[derive(Debug)]
pub struct GilbertElliotChannel {
    good_ber: f64,
    bad_ber: f64,
    p_gb: f64,
    p_bg: f64,
    state: ChannelState,
    rng: StdRng,
    stats: ChannelStats,
}

impl GilbertElliotChannel {
    /// Create a channel starting in the good state.
    pub fn new(good_ber: f64, bad_ber: f64, p_gb: f64, p_bg: f64, seed: u64) -> Self {
        Self {
            good_ber,
            bad_ber,
            p_gb,
            p_bg,
            state: ChannelState::Good,
            rng: StdRng::seed_from_u64(seed),
            stats: ChannelStats::default(),
        }
    }

    fn step_state(&mut self) {
        let u: f64 = self.rng.random();
        self.state = match self.state {
            ChannelState::Good if u < self.p_gb => ChannelState::Bad,
            ChannelState::Bad if u < self.p_bg => ChannelState::Good,
            state => state,
        };
    }

    /// Pass one frame of `frame_bits` bits through the channel.
    ///
    /// Returns `true` if the frame arrives corrupted. One transition draw
    /// and one error draw per call; the channel never retries or recovers.
    pub fn transmit_frame(&mut self, frame_bits: u64) -> bool {
        self.step_state();

        let ber = match self.state {
            ChannelState::Good => {
                self.stats.frames_in_good += 1;
                self.good_ber
            }
            ChannelState::Bad => {
                self.stats.frames_in_bad += 1;
                self.bad_ber
            }
        };
        self.stats.total_bits += frame_bits;

        let p_clean = (1.0 - ber).powf(frame_bits as f64);
        let corrupted = self.rng.random::<f64>() >= p_clean;
        if corrupted {
            self.stats.corrupted_frames += 1;
        }
        corrupted
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_seeds_give_identical_verdicts() {
        let mut a = GilbertElliotChannel::new(1e-6, 5e-3, 0.002, 0.05, 9);
        let mut b = GilbertElliotChannel::new(1e-6, 5e-3, 0.002, 0.05, 9);
        for _ in 0..10_000 {
            assert_eq!(a.transmit_frame(8192), b.transmit_frame(8192));
        }
    }

    #[test]
    fn zero_ber_never_corrupts() {
        let mut channel = GilbertElliotChannel::new(0.0, 0.0, 0.5, 0.5, 1);
        for _ in 0..1_000 {
            assert!(!channel.transmit_frame(32_768));
        }
        assert_eq!(channel.stats().corrupted_frames, 0);
    }

    #[test]
    fn unit_ber_always_corrupts() {
        let mut channel = GilbertElliotChannel::new(0.0, 1.0, 1.0, 0.0, 42);
        // p_gb = 1 forces the bad state on the first transition and
        // p_bg = 0 keeps it there.
        for _ in 0..100 {
            assert!(channel.transmit_frame(2048));
            assert_eq!(channel.state(), ChannelState::Bad);
        }
    }

    #[test]
    fn frozen_good_state_with_zero_transition() {
        let mut channel = GilbertElliotChannel::new(0.0, 1.0, 0.0, 1.0, 7);
        for _ in 0..100 {
            channel.transmit_frame(1024);
        }
        assert_eq!(channel.state(), ChannelState::Good);
        assert_eq!(channel.stats().frames_in_bad, 0);
    }

    #[test]
    fn stats_accumulate_bits() {
        let mut channel = GilbertElliotChannel::new(0.0, 0.0, 0.0, 1.0, 0);
        channel.transmit_frame(100);
        channel.transmit_frame(28);
        assert_eq!(channel.stats().total_bits, 128);
        assert_eq!(channel.stats().frames_in_good, 2);
    }
}

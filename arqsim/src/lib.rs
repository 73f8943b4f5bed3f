//! Discrete-event simulator for a Selective Repeat ARQ link over a
//! Gilbert-Elliot burst-error channel.
//!
//! Three pieces carry the protocol:
//! - **channel**: two-state Markov error model deciding per-frame corruption
//! - **link**: Selective Repeat sender/receiver window state machines
//! - **simulation**: the event-driven driver that owns simulated time
//!
//! Around them sit the transport adapter (segmentation, reassembly,
//! backpressure), the event scheduler, and the metrics that become the
//! per-run [`SimReport`]. A run transfers a caller-provided byte buffer
//! under one [`SimConfig`] and is fully deterministic given its seed; the
//! `arqsweep` binary sweeps (window, payload) grids on top of
//! [`run_simulation`].

pub mod channel;
pub mod config;
pub mod error;
pub mod frame;
pub mod link;
pub mod metrics;
pub mod scheduler;
pub mod simulation;
pub mod transport;

// Re-export key public types at crate root.
pub use channel::{ChannelState, ChannelStats, GilbertElliotChannel};
pub use config::SimConfig;
pub use error::{Result, SimError};
pub use frame::{Frame, FrameType};
pub use link::{SelectiveRepeatReceiver, SelectiveRepeatSender};
pub use metrics::{Metrics, SimReport};
pub use simulation::{run_simulation, Simulation};
pub use transport::{Segment, TransportReceiver, TransportSender};

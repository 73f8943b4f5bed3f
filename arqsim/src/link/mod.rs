//! Selective Repeat ARQ link layer.
//!
//! The sender keeps a window of unacknowledged DATA frames with per-frame
//! retransmission timers; the receiver buffers out-of-order arrivals and
//! releases payloads strictly in order.

pub mod receiver;
pub mod sender;

pub use receiver::SelectiveRepeatReceiver;
pub use sender::{SelectiveRepeatSender, SendSlot};

//! Audio and Music Data Transport Protocol (IEC 61883-6)
//!
//! [`AmdtpTransmitter`] pulls event quadlets from an [`EventSource`] each
//! cycle, labels them and frames them behind a CIP header.
//! [`AmdtpReceiver`] latches dimension, rate and label mode from the first
//! timestamped packet and hands host-order quadlets to an [`EventSink`].

mod events;
mod receive;
mod transmit;


pub use events::{EventInfo, EventSink, EventSource};
pub use receive::{AmdtpReceiver, LatchedFormat, RECEIVE_MAX_PACKET_SIZE};
pub use transmit::AmdtpTransmitter;

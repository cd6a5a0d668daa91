//! Seam between the packetizers and the isochronous bus substrate
//!
//! The substrate owns channels, DMA rings and the event loop. It calls a
//! [`TransmitHandler`] or [`ReceiveHandler`] once per isochronous cycle; the
//! streams in this crate never reach back into the substrate from those
//! callbacks. Starting and stopping a stream goes through [`IsoBus`].

mod binding;
mod traits;

#[cfg(test)]
mod tests;

pub use binding::{StreamBinding, StreamControl};
pub use traits::{IsoBus, IsoParams, ReceiveHandler, RecvPacket, TransmitHandler, XmitCycle, XmitPacket};

/// Isochronous cycles per second
pub const CYCLES_PER_SECOND: u32 = 8000;

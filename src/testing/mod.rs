//! Test substrate and synthetic stream sources
//!
//! [`LoopbackBus`] stands in for a real isochronous substrate: it records
//! every call and clocks transmit handlers one cycle at a time.

pub mod loopback;
pub mod synthetic;

#[cfg(test)]
mod tests;

pub use loopback::{BusCall, CapturedPacket, LoopbackBus};
pub use synthetic::{SyntheticDv, SyntheticTs, ts_sequence, write_pcr};

//! Application-facing event source and sink

use crate::error::Result;

/// Per-packet context passed alongside event quadlets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventInfo {
    /// Events (data blocks) in the packet
    pub events: usize,
    /// Data block counter of the packet
    pub dbc: u8,
    /// Packets the substrate dropped since the previous callback
    pub dropped: u32,
}

/// Supplies host-order event quadlets for transmission
///
/// The stream ORs the AM824 label into the top byte and converts to wire
/// order afterwards, so implementations only write the 24-bit data field.
pub trait EventSource: Send {
    /// Fill `events` (`info.events * dimension` quadlets, zeroed)
    ///
    /// # Errors
    ///
    /// Returns an error if no data is available; the cycle fails.
    fn fill(&mut self, events: &mut [u32], info: EventInfo) -> Result<()>;
}

impl<F> EventSource for F
where
    F: FnMut(&mut [u32], EventInfo) -> Result<()> + Send,
{
    fn fill(&mut self, events: &mut [u32], info: EventInfo) -> Result<()> {
        self(events, info)
    }
}

/// Consumes host-order event quadlets from received packets
///
/// Quadlets keep their label byte.
pub trait EventSink: Send {
    /// Consume one packet's quadlets
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be accepted; the cycle fails.
    fn consume(&mut self, events: &[u32], info: EventInfo) -> Result<()>;
}

impl<F> EventSink for F
where
    F: FnMut(&[u32], EventInfo) -> Result<()> + Send,
{
    fn consume(&mut self, events: &[u32], info: EventInfo) -> Result<()> {
        self(events, info)
    }
}

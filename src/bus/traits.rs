//! Substrate and per-cycle handler traits

use crate::error::Result;
use crate::types::{Channel, Disposition, Speed, Tag};

/// Parameters handed to the substrate when a stream is bound to a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoParams {
    /// Packets of buffering
    pub buffer_packets: u32,
    /// Largest packet the stream will produce or accept, in bytes
    pub max_packet_size: usize,
    /// Channel to bind
    pub channel: Channel,
    /// Link speed (transmit only)
    pub speed: Speed,
    /// Packets between interrupts
    pub irq_interval: u32,
}

/// Isochronous bus substrate
///
/// Implemented outside this crate by whatever owns the host adapter.
pub trait IsoBus {
    /// Our node id; can change after every bus reset
    fn local_node_id(&self) -> u16;

    /// Allocate transmit resources
    ///
    /// # Errors
    ///
    /// Returns an error if the substrate cannot bind the channel.
    fn xmit_init(&mut self, params: &IsoParams) -> Result<()>;

    /// Begin transmitting, optionally at a given cycle
    ///
    /// # Errors
    ///
    /// Returns an error if transmission cannot start.
    fn xmit_start(&mut self, start_cycle: Option<u32>, prebuffer_packets: u32) -> Result<()>;

    /// Block until queued packets have been sent
    ///
    /// # Errors
    ///
    /// Returns an error if the substrate fails while draining.
    fn xmit_sync(&mut self) -> Result<()>;

    /// Allocate receive resources
    ///
    /// # Errors
    ///
    /// Returns an error if the substrate cannot bind the channel.
    fn recv_init(&mut self, params: &IsoParams) -> Result<()>;

    /// Begin receiving
    ///
    /// # Errors
    ///
    /// Returns an error if reception cannot start.
    fn recv_start(&mut self) -> Result<()>;

    /// Deliver packets already received before returning
    ///
    /// # Errors
    ///
    /// Returns an error if the substrate fails while flushing.
    fn recv_flush(&mut self) -> Result<()>;

    /// Release the channel and all substrate buffers
    fn shutdown(&mut self);
}

/// Per-cycle context supplied by the substrate on transmit
#[derive(Debug, Clone, Copy, Default)]
pub struct XmitCycle {
    /// Bus cycle number the packet will go out on
    pub cycle: u32,
    /// Packets the substrate dropped since the previous callback
    pub dropped: u32,
    /// Local node id at the time of the callback
    pub node_id: u16,
}

/// Packet produced by a transmit handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmitPacket {
    /// Bytes written into the buffer, CIP header included
    pub len: usize,
    /// Iso header tag
    pub tag: Tag,
    /// Iso header sync code
    pub sy: u8,
}

impl XmitPacket {
    /// A CIP-tagged packet of the given length
    #[must_use]
    pub fn with_cip(len: usize) -> Self {
        Self {
            len,
            tag: Tag::WithCip,
            sy: 0,
        }
    }
}

impl From<XmitPacket> for Disposition {
    fn from(_: XmitPacket) -> Self {
        Disposition::Ok
    }
}

/// Packet delivered to a receive handler
#[derive(Debug, Clone, Copy)]
pub struct RecvPacket<'a> {
    /// Payload, starting with the CIP header when tagged
    pub data: &'a [u8],
    /// Channel the packet arrived on
    pub channel: u8,
    /// Iso header tag
    pub tag: Tag,
    /// Iso header sync code
    pub sy: u8,
    /// Bus cycle the packet arrived in
    pub cycle: u32,
    /// Packets the substrate dropped since the previous callback
    pub dropped: u32,
}

/// Invoked by the substrate once per outgoing cycle
pub trait TransmitHandler {
    /// Fill `buffer` with this cycle's packet
    ///
    /// # Errors
    ///
    /// Returns an error if the packet could not be produced; the substrate
    /// decides whether to retry or abort.
    fn transmit(&mut self, buffer: &mut [u8], cycle: XmitCycle) -> Result<XmitPacket>;

    /// Largest packet `transmit` will write
    fn max_packet_size(&self) -> usize;
}

/// Invoked by the substrate once per incoming packet
pub trait ReceiveHandler {
    /// Process one received packet
    ///
    /// # Errors
    ///
    /// Returns an error if the packet is recognised but cannot be handled.
    fn receive(&mut self, packet: &RecvPacket<'_>) -> Result<Disposition>;
}

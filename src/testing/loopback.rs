//! In-memory bus substrate

use bytes::Bytes;

use crate::bus::{
    CYCLES_PER_SECOND, IsoBus, IsoParams, ReceiveHandler, RecvPacket, TransmitHandler, XmitCycle,
};
use crate::error::{Result, StreamError};
use crate::types::{Disposition, Tag};

/// Substrate call recorded by [`LoopbackBus`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusCall {
    /// `xmit_init`
    XmitInit(IsoParams),
    /// `xmit_start`
    XmitStart {
        /// Requested start cycle
        start_cycle: Option<u32>,
        /// Prebuffer depth
        prebuffer_packets: u32,
    },
    /// `xmit_sync`
    XmitSync,
    /// `recv_init`
    RecvInit(IsoParams),
    /// `recv_start`
    RecvStart,
    /// `recv_flush`
    RecvFlush,
    /// `shutdown`
    Shutdown,
}

/// Packet produced by a transmit handler
#[derive(Debug, Clone)]
pub struct CapturedPacket {
    /// Payload bytes, CIP header included
    pub data: Bytes,
    /// Iso tag
    pub tag: Tag,
    /// Iso sync code
    pub sy: u8,
    /// Cycle the packet was produced for
    pub cycle: u32,
}

impl CapturedPacket {
    /// View as a received packet
    #[must_use]
    pub fn as_received(&self, channel: u8, dropped: u32) -> RecvPacket<'_> {
        RecvPacket {
            data: &self.data,
            channel,
            tag: self.tag,
            sy: self.sy,
            cycle: self.cycle,
            dropped,
        }
    }
}

/// Bus substrate that records calls and drives handlers synchronously
///
/// Transmit handlers are clocked one cycle at a time; the packets they
/// produce can be fed straight into a receive handler.
#[derive(Debug)]
pub struct LoopbackBus {
    node_id: u16,
    calls: Vec<BusCall>,
    cycle: u32,
    pending_dropped: u32,
    fail_start: bool,
    buffer: Vec<u8>,
}

impl LoopbackBus {
    /// Create a bus on which we are `node_id`
    #[must_use]
    pub fn new(node_id: u16) -> Self {
        Self {
            node_id,
            calls: Vec::new(),
            cycle: 0,
            pending_dropped: 0,
            fail_start: false,
            buffer: Vec::new(),
        }
    }

    /// Calls made so far
    #[must_use]
    pub fn calls(&self) -> &[BusCall] {
        &self.calls
    }

    /// Parameters of the last `xmit_init` or `recv_init`
    #[must_use]
    pub fn last_params(&self) -> Option<IsoParams> {
        self.calls.iter().rev().find_map(|call| match call {
            BusCall::XmitInit(params) | BusCall::RecvInit(params) => Some(*params),
            _ => None,
        })
    }

    /// Cycle the next packet is produced for
    #[must_use]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Report `count` dropped packets on the next callback
    pub fn drop_packets(&mut self, count: u32) {
        self.pending_dropped += count;
    }

    /// Make the next `xmit_start` or `recv_start` fail
    pub fn fail_next_start(&mut self) {
        self.fail_start = true;
    }

    /// Clock one transmit cycle
    ///
    /// # Errors
    ///
    /// Returns the handler's error.
    pub fn clock<H: TransmitHandler + ?Sized>(&mut self, handler: &mut H) -> Result<CapturedPacket> {
        self.buffer.clear();
        self.buffer.resize(handler.max_packet_size(), 0);

        let cycle = XmitCycle {
            cycle: self.cycle,
            dropped: std::mem::take(&mut self.pending_dropped),
            node_id: self.node_id,
        };
        self.cycle = (self.cycle + 1) % CYCLES_PER_SECOND;

        let packet = handler.transmit(&mut self.buffer, cycle)?;
        Ok(CapturedPacket {
            data: Bytes::copy_from_slice(&self.buffer[..packet.len]),
            tag: packet.tag,
            sy: packet.sy,
            cycle: cycle.cycle,
        })
    }

    /// Clock `cycles` transmit cycles, stopping at the first error
    ///
    /// # Errors
    ///
    /// Returns the handler's first error.
    pub fn run<H: TransmitHandler + ?Sized>(
        &mut self,
        handler: &mut H,
        cycles: usize,
    ) -> Result<Vec<CapturedPacket>> {
        (0..cycles).map(|_| self.clock(handler)).collect()
    }

    /// Deliver one packet to a receive handler on `channel`
    pub fn deliver<H: ReceiveHandler + ?Sized>(
        &mut self,
        handler: &mut H,
        packet: &CapturedPacket,
        channel: u8,
    ) -> Disposition {
        let dropped = std::mem::take(&mut self.pending_dropped);
        Disposition::from_result(&handler.receive(&packet.as_received(channel, dropped)))
    }

    fn start(&mut self, call: BusCall) -> Result<()> {
        self.calls.push(call);
        if std::mem::take(&mut self.fail_start) {
            return Err(StreamError::Bus {
                message: "start refused".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for LoopbackBus {
    fn default() -> Self {
        Self::new(0xffc0)
    }
}

impl IsoBus for LoopbackBus {
    fn local_node_id(&self) -> u16 {
        self.node_id
    }

    fn xmit_init(&mut self, params: &IsoParams) -> Result<()> {
        self.calls.push(BusCall::XmitInit(*params));
        Ok(())
    }

    fn xmit_start(&mut self, start_cycle: Option<u32>, prebuffer_packets: u32) -> Result<()> {
        self.start(BusCall::XmitStart {
            start_cycle,
            prebuffer_packets,
        })
    }

    fn xmit_sync(&mut self) -> Result<()> {
        self.calls.push(BusCall::XmitSync);
        Ok(())
    }

    fn recv_init(&mut self, params: &IsoParams) -> Result<()> {
        self.calls.push(BusCall::RecvInit(*params));
        Ok(())
    }

    fn recv_start(&mut self) -> Result<()> {
        self.start(BusCall::RecvStart)
    }

    fn recv_flush(&mut self) -> Result<()> {
        self.calls.push(BusCall::RecvFlush);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.calls.push(BusCall::Shutdown);
    }
}

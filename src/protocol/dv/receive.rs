//! DV depacketizer

use tracing::warn;

use super::{DV_PACKET_SIZE, DifSink, FrameAssembler, FrameSink};
use crate::bus::{IsoBus, ReceiveHandler, RecvPacket, StreamBinding, StreamControl};
use crate::error::Result;
use crate::protocol::cip::CipHeader;
use crate::types::{Channel, Disposition, StreamConfig};

/// Receives DV packets and hands each DIF block to a [`DifSink`]
///
/// Empty packets and packets on other channels are ignored.
pub struct DvReceiver<K> {
    sink: K,
    binding: StreamBinding,
}

/// DV receiver that delivers whole frames
pub type DvFrameReceiver<F> = DvReceiver<FrameAssembler<F>>;

impl<K: DifSink> DvReceiver<K> {
    /// Create a receiver with DV receive defaults
    pub fn new(sink: K) -> Self {
        Self {
            sink,
            binding: StreamBinding::new(StreamConfig::dv_receive()),
        }
    }

    /// DIF block sink
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// DIF block sink, mutably
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Bind to `channel` and start receiving
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if already started, or the substrate's error.
    pub fn start<B: IsoBus + ?Sized>(&mut self, bus: &mut B, channel: Channel) -> Result<()> {
        self.binding.start_receive(bus, channel, DV_PACKET_SIZE)
    }

    /// Stop receiving, flushing first if `synch` is set
    pub fn stop<B: IsoBus + ?Sized>(&mut self, bus: &mut B) {
        self.binding.stop(bus);
    }
}

impl<F: FrameSink> DvReceiver<FrameAssembler<F>> {
    /// Create a receiver that reassembles frames for `sink`
    pub fn with_frames(sink: F) -> Self {
        Self::new(FrameAssembler::new(sink))
    }

    /// Frames delivered with missing blocks
    #[must_use]
    pub fn incomplete_frames(&self) -> u32 {
        self.sink.incomplete_frames()
    }
}

impl<K: DifSink> ReceiveHandler for DvReceiver<K> {
    fn receive(&mut self, packet: &RecvPacket<'_>) -> Result<Disposition> {
        self.binding.add_dropped(packet.dropped);

        let bound = self.binding.channel().map(Channel::number);
        if bound == Some(packet.channel) && packet.data.len() == DV_PACKET_SIZE {
            self.sink
                .consume(&packet.data[CipHeader::SIZE..], packet.dropped)?;
        }

        if packet.dropped > 0 {
            warn!(
                dropped = packet.dropped,
                total = self.binding.dropped(),
                "DV packets dropped"
            );
            return Ok(Disposition::Defer);
        }
        Ok(Disposition::Ok)
    }
}

impl<K> StreamControl for DvReceiver<K> {
    fn binding(&self) -> &StreamBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut StreamBinding {
        &mut self.binding
    }
}

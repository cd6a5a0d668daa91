//! MPEG-2 TS depacketizer

use byteorder::{BigEndian, ByteOrder};
use tracing::warn;

use super::{RECEIVE_MAX_PACKET_SIZE, TSP_SIZE, TsSink};
use crate::bus::{IsoBus, ReceiveHandler, RecvPacket, StreamBinding, StreamControl};
use crate::error::Result;
use crate::protocol::cip::{CipFormat, CipHeader};
use crate::types::{Channel, Disposition, StreamConfig};

/// DBS 6, FN 3 (8 blocks), QPC 0, SPH set
const TS_DBS_FN_QPC_SPH: u32 = 0x01b1;

fn is_ts_header(data: &[u8]) -> bool {
    let q0 = BigEndian::read_u32(&data[..4]);
    let fmt = data[4] & 0x3f;
    (q0 >> 10) & 0x3fff == TS_DBS_FN_QPC_SPH && fmt == CipFormat::Mpeg2.code()
}

/// Delivers each transport packet of matching packets to a [`TsSink`]
pub struct Mpeg2Receiver<K> {
    sink: K,
    binding: StreamBinding,
}

impl<K: TsSink> Mpeg2Receiver<K> {
    /// Create a receiver
    pub fn new(sink: K) -> Self {
        Self {
            sink,
            binding: StreamBinding::new(StreamConfig::mpeg2()),
        }
    }

    /// Transport packet sink
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Transport packet sink, mutably
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Bind to `channel` and start receiving
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if already started, or the substrate's error.
    pub fn start<B: IsoBus + ?Sized>(&mut self, bus: &mut B, channel: Channel) -> Result<()> {
        self.binding
            .start_receive(bus, channel, RECEIVE_MAX_PACKET_SIZE)
    }

    /// Stop receiving, flushing first if `synch` is set
    pub fn stop<B: IsoBus + ?Sized>(&mut self, bus: &mut B) {
        self.binding.stop(bus);
    }
}

impl<K: TsSink> ReceiveHandler for Mpeg2Receiver<K> {
    fn receive(&mut self, packet: &RecvPacket<'_>) -> Result<Disposition> {
        self.binding.add_dropped(packet.dropped);

        let bound = self.binding.channel().map(Channel::number);
        let data = packet.data;
        if bound == Some(packet.channel)
            && data.len() >= CipHeader::SIZE + TSP_SIZE
            && is_ts_header(data)
        {
            let mut dropped = packet.dropped;
            for tsp in data[CipHeader::SIZE..].chunks_exact(TSP_SIZE) {
                self.sink.consume(&tsp[4..], dropped)?;
                dropped = 0;
            }
        }

        if packet.dropped > 0 {
            warn!(
                dropped = packet.dropped,
                total = self.binding.dropped(),
                "MPEG-2 packets dropped"
            );
            return Ok(Disposition::Defer);
        }
        Ok(Disposition::Ok)
    }
}

impl<K> StreamControl for Mpeg2Receiver<K> {
    fn binding(&self) -> &StreamBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut StreamBinding {
        &mut self.binding
    }
}

//! DV packetizer

use tracing::{debug, trace};

use super::{DIF_BLOCK_SIZE, DifSource, DvSystem};
use crate::bus::{
    CYCLES_PER_SECOND, IsoBus, StreamBinding, StreamControl, TransmitHandler, XmitCycle,
    XmitPacket,
};
use crate::error::{Result, StreamError};
use crate::protocol::cip::{CipFormat, CipHeader, CipState, SYT_NO_INFO, TransmissionMode};
use crate::types::{Channel, StreamConfig};

/// Cycles between packetisation and presentation of a frame
const SYT_OFFSET: u32 = 3;

/// Empty/full packet duty cycle
#[derive(Debug, Clone, Default)]
struct Cadence {
    packet_num: u32,
    accum: u32,
    continuity: u8,
}

/// Sends one DIF block per full packet, one packet per bus cycle
pub struct DvTransmitter<S> {
    cip: CipState,
    system: DvSystem,
    cadence: Cadence,
    source: S,
    binding: StreamBinding,
}

impl<S: DifSource> DvTransmitter<S> {
    /// Create a transmitter for `system`
    ///
    /// # Errors
    ///
    /// Propagates CIP initialisation failures.
    pub fn new(system: DvSystem, source: S) -> Result<Self> {
        let dbs = u8::try_from(DIF_BLOCK_SIZE / 4)
            .map_err(|_| StreamError::invalid_parameter("dbs", "DIF block too large"))?;
        let mut cip = CipState::new(
            CipFormat::Dv,
            system.fdf(),
            system.block_rate(),
            dbs,
            system.blocks_per_frame(),
        )?;
        cip.set_transmission_mode(TransmissionMode::NonBlocking);

        Ok(Self {
            cip,
            system,
            cadence: Cadence::default(),
            source,
            binding: StreamBinding::new(StreamConfig::default()),
        })
    }

    /// Television system
    #[must_use]
    pub fn system(&self) -> DvSystem {
        self.system
    }

    /// DIF block source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// DIF block source, mutably
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Bind to `channel` and start transmitting as soon as possible
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if already started, or the substrate's error.
    pub fn start<B: IsoBus + ?Sized>(&mut self, bus: &mut B, channel: Channel) -> Result<()> {
        debug!(system = ?self.system, "Starting DV transmit");
        let max_packet_size = self.cip.max_packet_size();
        self.binding
            .start_transmit(bus, channel, max_packet_size, None)
    }

    /// Stop transmitting, draining first if `synch` is set
    pub fn stop<B: IsoBus + ?Sized>(&mut self, bus: &mut B) {
        self.binding.stop(bus);
    }

    fn next_syt(&self, cycle: u32) -> u16 {
        if self.cadence.packet_num != 0 {
            return SYT_NO_INFO;
        }
        let mut ts = cycle + SYT_OFFSET;
        if ts > CYCLES_PER_SECOND {
            ts -= CYCLES_PER_SECOND;
        }
        ((ts & 0x0f) << 12) as u16
    }

    fn next_blocks(&mut self) -> usize {
        let (num, denom) = self.system.cadence();
        let cadence = &mut self.cadence;
        if cadence.accum > denom - num {
            cadence.accum -= denom - num;
            0
        } else {
            cadence.accum += num;
            cadence.continuity = cadence.continuity.wrapping_add(1);
            cadence.packet_num += 1;
            if cadence.packet_num >= self.system.blocks_per_frame() {
                cadence.packet_num = 0;
            }
            1
        }
    }
}

impl<S: DifSource> TransmitHandler for DvTransmitter<S> {
    fn transmit(&mut self, buffer: &mut [u8], cycle: XmitCycle) -> Result<XmitPacket> {
        self.binding.add_dropped(cycle.dropped);

        let mut header = self.cip.fill_header(cycle.node_id).header;
        header.syt = self.next_syt(cycle.cycle);
        header.dbc = self.cadence.continuity;
        let blocks = self.next_blocks();

        let len = CipHeader::SIZE + blocks * DIF_BLOCK_SIZE;
        if buffer.len() < len {
            return Err(StreamError::BufferTooSmall {
                needed: len,
                have: buffer.len(),
            });
        }
        header.write_to(buffer)?;
        trace!(cycle = cycle.cycle, blocks, dbc = header.dbc, syt = header.syt, "DV cycle");

        self.source
            .fill(&mut buffer[CipHeader::SIZE..len], blocks, cycle.dropped)?;

        Ok(XmitPacket::with_cip(len))
    }

    fn max_packet_size(&self) -> usize {
        self.cip.max_packet_size()
    }
}

impl<S> StreamControl for DvTransmitter<S> {
    fn binding(&self) -> &StreamBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut StreamBinding {
        &mut self.binding
    }
}

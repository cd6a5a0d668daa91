//! MPEG-2 TS packetizer

use tracing::debug;

use super::{TRANSMIT_MAX_PACKET_SIZE, TsBuffer, TsBufferOptions, TsSource};
use crate::bus::{IsoBus, StreamBinding, StreamControl, TransmitHandler, XmitCycle, XmitPacket};
use crate::error::{Result, StreamError};
use crate::types::{Channel, StreamConfig};

/// Sends a transport stream paced by its own PCRs
pub struct Mpeg2Transmitter<S> {
    buffer: TsBuffer<S>,
    binding: StreamBinding,
}

impl<S: TsSource> Mpeg2Transmitter<S> {
    /// Create a transmitter with default smoothing
    pub fn new(source: S) -> Self {
        Self::with_options(source, TsBufferOptions::default())
    }

    /// Create a transmitter with custom smoothing
    pub fn with_options(source: S, options: TsBufferOptions) -> Self {
        Self {
            buffer: TsBuffer::new(source, options),
            binding: StreamBinding::new(StreamConfig::mpeg2()),
        }
    }

    /// Smoothing buffer
    pub fn buffer(&self) -> &TsBuffer<S> {
        &self.buffer
    }

    /// Smoothing buffer, mutably
    pub fn buffer_mut(&mut self) -> &mut TsBuffer<S> {
        &mut self.buffer
    }

    /// Prime the smoothing buffer on `pid`, bind `channel` and start
    ///
    /// `None` locks onto the PID of the first packet read.
    ///
    /// # Errors
    ///
    /// Returns `PcrNotFound` if the stream has no usable PCRs,
    /// `InvalidState` if already started, or the substrate's error.
    pub fn start<B: IsoBus + ?Sized>(
        &mut self,
        bus: &mut B,
        pid: Option<u16>,
        channel: Channel,
    ) -> Result<()> {
        if self.binding.is_running() {
            return Err(StreamError::invalid_state("stream already started"));
        }
        self.buffer.prime(pid)?;
        debug!(pid = self.buffer.pid(), "Starting MPEG-2 transmit");
        let started = self
            .binding
            .start_transmit(bus, channel, TRANSMIT_MAX_PACKET_SIZE, None);
        if started.is_err() {
            self.buffer.reset();
        }
        started
    }

    /// Stop transmitting and discard buffered packets
    pub fn stop<B: IsoBus + ?Sized>(&mut self, bus: &mut B) {
        self.binding.stop(bus);
        self.buffer.reset();
    }
}

impl<S: TsSource> TransmitHandler for Mpeg2Transmitter<S> {
    fn transmit(&mut self, buffer: &mut [u8], cycle: XmitCycle) -> Result<XmitPacket> {
        self.binding.add_dropped(cycle.dropped);
        let sid = (cycle.node_id & 0x3f) as u8;
        let len = self
            .buffer
            .send_iso_cycle(buffer, cycle.cycle, sid, cycle.dropped)?;
        Ok(XmitPacket::with_cip(len))
    }

    fn max_packet_size(&self) -> usize {
        TRANSMIT_MAX_PACKET_SIZE
    }
}

impl<S> StreamControl for Mpeg2Transmitter<S> {
    fn binding(&self) -> &StreamBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut StreamBinding {
        &mut self.binding
    }
}

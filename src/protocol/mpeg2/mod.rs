//! MPEG-2 transport streams over CIP (IEC 61883-4)
//!
//! Each 188-byte transport packet travels as a 192-byte source packet: a
//! 4-byte source packet header carrying a cycle timestamp, then the packet.
//! Transmission is paced by [`TsBuffer`], which locks the packet rate to the
//! stream's PCRs.

mod queue;
mod receive;
mod smoothing;
mod transmit;
mod ts;

#[cfg(test)]
mod tests;

use crate::error::Result;

pub use queue::LookaheadQueue;
pub use receive::Mpeg2Receiver;
pub use smoothing::{PCR_TICKS_PER_CYCLE, TsBuffer, TsBufferOptions, TspRate, make_sph};
pub use transmit::Mpeg2Transmitter;
pub use ts::{PCR_HZ, PCR_MODULUS, SYNC_BYTE, TsPacket, pcr_delta};

/// Size of one transport packet
pub const TS_PACKET_SIZE: usize = 188;

/// Size of one source packet: header plus transport packet
pub const TSP_SIZE: usize = TS_PACKET_SIZE + 4;

/// Largest packet sent: CIP header and five source packets
pub const TRANSMIT_MAX_PACKET_SIZE: usize = 5 * TSP_SIZE + 8;

/// Largest packet accepted on receive
pub const RECEIVE_MAX_PACKET_SIZE: usize = 2056;

/// Supplies transport packets for transmission
pub trait TsSource: Send {
    /// Fill `data` with `n_packets` transport packets
    ///
    /// `dropped` is the number of cycles the substrate dropped since the
    /// last call that reported any.
    ///
    /// # Errors
    ///
    /// Returns an error if no more packets are available.
    fn read(&mut self, data: &mut [u8], n_packets: usize, dropped: u32) -> Result<()>;
}

impl<F> TsSource for F
where
    F: FnMut(&mut [u8], usize, u32) -> Result<()> + Send,
{
    fn read(&mut self, data: &mut [u8], n_packets: usize, dropped: u32) -> Result<()> {
        self(data, n_packets, dropped)
    }
}

/// Consumes received transport packets
pub trait TsSink: Send {
    /// Consume one 188-byte transport packet
    ///
    /// # Errors
    ///
    /// Returns an error if the packet cannot be accepted; the cycle fails.
    fn consume(&mut self, packet: &[u8], dropped: u32) -> Result<()>;
}

impl<F> TsSink for F
where
    F: FnMut(&[u8], u32) -> Result<()> + Send,
{
    fn consume(&mut self, packet: &[u8], dropped: u32) -> Result<()> {
        self(packet, dropped)
    }
}

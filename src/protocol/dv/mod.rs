//! Digital Video over CIP (IEC 61883-2)
//!
//! DV travels as one 480-byte DIF block per full packet. The transmit side
//! interleaves empty packets with a fixed num/denom cadence so that exactly
//! one frame's worth of blocks goes out per frame period. The receive side
//! hands DIF blocks on as they arrive; [`FrameAssembler`] regroups them into
//! whole frames.

mod frame;
mod receive;
mod transmit;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use frame::{
    FRAME_BUFFER_SIZE, FrameAssembler, SECTION_AUDIO, SECTION_HEADER, SECTION_SUBCODE,
    SECTION_VAUX, SECTION_VIDEO, block_offset,
};
pub use receive::{DvFrameReceiver, DvReceiver};
pub use transmit::DvTransmitter;

/// Size of one DIF block
pub const DIF_BLOCK_SIZE: usize = 480;

/// Size of a full DV packet: CIP header plus one DIF block
pub const DV_PACKET_SIZE: usize = DIF_BLOCK_SIZE + 8;

/// DIF blocks per DIF sequence
pub const BLOCKS_PER_SEQUENCE: usize = 150;

/// DV television system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DvSystem {
    /// 525 lines, 29.97 frames per second
    Ntsc,
    /// 625 lines, 25 frames per second
    Pal,
}

impl DvSystem {
    /// Read the system from the DSF bit of a frame's header block
    #[must_use]
    pub fn from_header_block(block: &[u8]) -> Option<Self> {
        block.get(3).map(|b| if b & 0x80 == 0 { Self::Ntsc } else { Self::Pal })
    }

    /// DIF blocks per frame
    #[must_use]
    pub fn blocks_per_frame(self) -> u32 {
        match self {
            Self::Ntsc => 250,
            Self::Pal => 300,
        }
    }

    /// Bytes per frame
    #[must_use]
    pub fn frame_size(self) -> usize {
        self.blocks_per_frame() as usize * DIF_BLOCK_SIZE
    }

    /// FDF carried in every CIP header
    #[must_use]
    pub fn fdf(self) -> u8 {
        match self {
            Self::Ntsc => 0x00,
            Self::Pal => 0x80,
        }
    }

    /// Nominal DIF blocks per second
    #[must_use]
    pub fn block_rate(self) -> u32 {
        match self {
            Self::Ntsc => 7492,
            Self::Pal => 7500,
        }
    }

    /// Full packets per cycle as `num / denom`
    #[must_use]
    pub fn cadence(self) -> (u32, u32) {
        match self {
            Self::Ntsc => (68, 1068),
            Self::Pal => (1, 16),
        }
    }
}

/// Supplies DIF blocks for transmission
pub trait DifSource: Send {
    /// Fill `data` with `n_dif_blocks` blocks; called for empty packets too
    ///
    /// # Errors
    ///
    /// Returns an error if no data is available; the cycle fails.
    fn fill(&mut self, data: &mut [u8], n_dif_blocks: usize, dropped: u32) -> Result<()>;
}

impl<F> DifSource for F
where
    F: FnMut(&mut [u8], usize, u32) -> Result<()> + Send,
{
    fn fill(&mut self, data: &mut [u8], n_dif_blocks: usize, dropped: u32) -> Result<()> {
        self(data, n_dif_blocks, dropped)
    }
}

/// Consumes received DIF blocks, one per full packet
pub trait DifSink: Send {
    /// Consume one DIF block
    ///
    /// # Errors
    ///
    /// Returns an error if the block cannot be accepted; the cycle fails.
    fn consume(&mut self, data: &[u8], dropped: u32) -> Result<()>;
}

impl<F> DifSink for F
where
    F: FnMut(&[u8], u32) -> Result<()> + Send,
{
    fn consume(&mut self, data: &[u8], dropped: u32) -> Result<()> {
        self(data, dropped)
    }
}

/// Consumes reassembled DV frames
pub trait FrameSink: Send {
    /// Consume one frame; `complete` is false if blocks were missing
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be accepted.
    fn frame(&mut self, frame: &[u8], complete: bool) -> Result<()>;
}

impl<F> FrameSink for F
where
    F: FnMut(&[u8], bool) -> Result<()> + Send,
{
    fn frame(&mut self, frame: &[u8], complete: bool) -> Result<()> {
        self(frame, complete)
    }
}

//! Regroups a DIF block stream into whole frames

use tracing::debug;

use super::{BLOCKS_PER_SEQUENCE, DIF_BLOCK_SIZE, DifSink, DvSystem, FrameSink};
use crate::error::Result;

/// Frame buffer size: one PAL frame
pub const FRAME_BUFFER_SIZE: usize = 300 * DIF_BLOCK_SIZE;

/// Bytes per 80-byte DIF block slot inside a sequence
const SLOT_SIZE: usize = 80;

/// Header section, first block of each DIF sequence
pub const SECTION_HEADER: u8 = 0;
/// Subcode section
pub const SECTION_SUBCODE: u8 = 1;
/// Video auxiliary section
pub const SECTION_VAUX: u8 = 2;
/// Audio section
pub const SECTION_AUDIO: u8 = 3;
/// Video section
pub const SECTION_VIDEO: u8 = 4;

/// Slots of the header, two subcode and three VAUX blocks
const SUBCODE_BASE: usize = 1;
const VAUX_BASE: usize = 3;

/// Audio blocks each lead a run of one audio and fifteen video blocks
const AUDIO_BASE: usize = 6;
const AUDIO_STRIDE: usize = 16;
const VIDEO_BASE: usize = AUDIO_BASE + 1;
const VIDEO_RUN: usize = AUDIO_STRIDE - 1;

/// Byte offset of a DIF block inside the frame buffer
///
/// `section` is the section type (header, subcode, VAUX, audio, video),
/// `sequence` the DIF sequence number and `block` the block number within
/// the section. Returns `None` for unknown section types.
#[must_use]
pub fn block_offset(section: u8, sequence: u8, block: u8) -> Option<usize> {
    let block = usize::from(block);
    let slot = match section {
        SECTION_HEADER => 0,
        SECTION_SUBCODE => SUBCODE_BASE + block,
        SECTION_VAUX => VAUX_BASE + block,
        SECTION_AUDIO => AUDIO_BASE + block * AUDIO_STRIDE,
        SECTION_VIDEO => VIDEO_BASE + block / VIDEO_RUN + block,
        _ => return None,
    };
    Some(usize::from(sequence) * BLOCKS_PER_SEQUENCE * SLOT_SIZE + slot * SLOT_SIZE)
}

/// DIF sink that delivers one frame per frame-start block
///
/// Nothing is delivered until the first frame start; each later frame start
/// flushes the frame collected so far.
pub struct FrameAssembler<F> {
    data: Vec<u8>,
    len: usize,
    waiting_for_first: bool,
    incomplete: u32,
    sink: F,
}

impl<F: FrameSink> FrameAssembler<F> {
    /// Create an assembler waiting for its first frame
    pub fn new(sink: F) -> Self {
        Self {
            data: vec![0; FRAME_BUFFER_SIZE],
            len: 0,
            waiting_for_first: true,
            incomplete: 0,
            sink,
        }
    }

    /// Frames delivered with missing blocks
    #[must_use]
    pub fn incomplete_frames(&self) -> u32 {
        self.incomplete
    }

    /// Frame sink
    pub fn sink(&self) -> &F {
        &self.sink
    }

    /// Frame sink, mutably
    pub fn sink_mut(&mut self) -> &mut F {
        &mut self.sink
    }

    fn flush(&mut self) -> Result<()> {
        let system = DvSystem::from_header_block(&self.data).unwrap_or(DvSystem::Ntsc);
        let total = system.frame_size();
        let complete = self.len == total;
        if !complete {
            self.incomplete += 1;
            debug!(
                received = self.len,
                expected = total,
                incomplete = self.incomplete,
                "Incomplete DV frame"
            );
        }
        self.len = 0;
        self.sink.frame(&self.data[..total], complete)
    }
}

impl<F: FrameSink> DifSink for FrameAssembler<F> {
    fn consume(&mut self, data: &[u8], _dropped: u32) -> Result<()> {
        if data.len() < 3 {
            return Ok(());
        }
        let section = data[0] >> 5;
        let sequence = data[1] >> 4;
        let block = data[2];

        let mut result = Ok(());
        if section == SECTION_HEADER && sequence == 0 {
            if self.waiting_for_first {
                self.waiting_for_first = false;
            } else {
                result = self.flush();
            }
        }

        if !self.waiting_for_first {
            self.len += data.len();
            let size = data.len().min(DIF_BLOCK_SIZE);
            if let Some(offset) = block_offset(section, sequence, block) {
                if let Some(dest) = self.data.get_mut(offset..offset + size) {
                    dest.copy_from_slice(&data[..size]);
                }
            }
        }

        result
    }
}

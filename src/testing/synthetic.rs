//! Deterministic stream generators
//!
//! Sources that produce well-formed transport packets and DV frames without
//! any media files, for tests and benchmarks.

use crate::error::{Result, StreamError};
use crate::protocol::dv::{
    BLOCKS_PER_SEQUENCE, DIF_BLOCK_SIZE, DifSource, DvSystem, SECTION_AUDIO, SECTION_HEADER,
    SECTION_SUBCODE, SECTION_VAUX, SECTION_VIDEO,
};
use crate::protocol::mpeg2::{PCR_MODULUS, SYNC_BYTE, TS_PACKET_SIZE, TsSource};

/// Transport stream on one PID with a PCR every `pcr_interval` packets
///
/// Every packet carries its sequence number in its last four bytes.
#[derive(Debug, Clone)]
pub struct SyntheticTs {
    pid: u16,
    pcr_interval: u64,
    pcr_step: u64,
    start_pcr: u64,
    limit: Option<u64>,
    produced: u64,
    dropped_reports: u32,
}

impl SyntheticTs {
    /// Packets on `pid`, the PCR advancing `pcr_step` ticks every `pcr_interval` packets
    #[must_use]
    pub fn new(pid: u16, pcr_interval: u64, pcr_step: u64) -> Self {
        Self {
            pid: pid & 0x1fff,
            pcr_interval: pcr_interval.max(1),
            pcr_step,
            start_pcr: 0,
            limit: None,
            produced: 0,
            dropped_reports: 0,
        }
    }

    /// Start the PCR at `pcr` instead of zero
    #[must_use]
    pub fn with_start_pcr(mut self, pcr: u64) -> Self {
        self.start_pcr = pcr;
        self
    }

    /// Fail with `SourceExhausted` after `packets` packets
    #[must_use]
    pub fn with_limit(mut self, packets: u64) -> Self {
        self.limit = Some(packets);
        self
    }

    /// Packets produced so far
    #[must_use]
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Reads that reported a non-zero drop count
    #[must_use]
    pub fn dropped_reports(&self) -> u32 {
        self.dropped_reports
    }

    /// PCR carried by packet `seq`, if it carries one
    #[must_use]
    pub fn pcr_at(&self, seq: u64) -> Option<u64> {
        (seq % self.pcr_interval == 0).then(|| {
            (self.start_pcr + seq / self.pcr_interval * self.pcr_step) % PCR_MODULUS
        })
    }

    /// Build packet `seq`
    #[must_use]
    pub fn packet(&self, seq: u64) -> [u8; TS_PACKET_SIZE] {
        let mut p = [0xffu8; TS_PACKET_SIZE];
        p[0] = SYNC_BYTE;
        p[1] = (self.pid >> 8) as u8 & 0x1f;
        p[2] = self.pid as u8;
        let continuity = (seq & 0x0f) as u8;
        if let Some(pcr) = self.pcr_at(seq) {
            p[3] = 0x30 | continuity;
            p[4] = 7;
            p[5] = 0x10;
            write_pcr(&mut p[6..12], pcr);
        } else {
            p[3] = 0x10 | continuity;
        }
        p[TS_PACKET_SIZE - 4..].copy_from_slice(&(seq as u32).to_be_bytes());
        p
    }
}

/// Encode a 27 MHz PCR into its six-byte adaptation field form
pub fn write_pcr(out: &mut [u8], pcr: u64) {
    let base = pcr / 300;
    let extension = pcr % 300;
    out[0] = (base >> 25) as u8;
    out[1] = (base >> 17) as u8;
    out[2] = (base >> 9) as u8;
    out[3] = (base >> 1) as u8;
    out[4] = ((base & 1) as u8) << 7 | 0x7e | ((extension >> 8) as u8 & 0x01);
    out[5] = extension as u8;
}

/// Sequence number stamped into a packet built by [`SyntheticTs`]
#[must_use]
pub fn ts_sequence(packet: &[u8]) -> Option<u32> {
    let tail = packet.get(TS_PACKET_SIZE - 4..TS_PACKET_SIZE)?;
    Some(u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]]))
}

impl TsSource for SyntheticTs {
    fn read(&mut self, data: &mut [u8], n_packets: usize, dropped: u32) -> Result<()> {
        if dropped > 0 {
            self.dropped_reports += 1;
        }
        for chunk in data.chunks_exact_mut(TS_PACKET_SIZE).take(n_packets) {
            if self.limit.is_some_and(|limit| self.produced >= limit) {
                return Err(StreamError::SourceExhausted);
            }
            chunk.copy_from_slice(&self.packet(self.produced));
            self.produced += 1;
        }
        Ok(())
    }
}

/// Bytes per DIF block slot inside a sequence
const SLOT_SIZE: usize = 80;

/// Section type and block number of a slot within a DIF sequence
fn slot_id(slot: usize) -> (u8, u8) {
    match slot {
        0 => (SECTION_HEADER, 0),
        1 | 2 => (SECTION_SUBCODE, (slot - 1) as u8),
        3..=5 => (SECTION_VAUX, (slot - 3) as u8),
        _ => {
            let k = slot - 6;
            if k % 16 == 0 {
                (SECTION_AUDIO, (k / 16) as u8)
            } else {
                (SECTION_VIDEO, (k - 1 - k / 16) as u8)
            }
        }
    }
}

/// DV frames with correct DIF block ids, each frame filled with its index
#[derive(Debug, Clone)]
pub struct SyntheticDv {
    system: DvSystem,
    frame: Vec<u8>,
    frame_index: u64,
    position: usize,
}

impl SyntheticDv {
    /// Frames for `system`
    #[must_use]
    pub fn new(system: DvSystem) -> Self {
        Self {
            system,
            frame: Self::frame_data(system, 0),
            frame_index: 0,
            position: 0,
        }
    }

    /// Frames started so far, counting the one in progress
    #[must_use]
    pub fn frames_started(&self) -> u64 {
        self.frame_index + 1
    }

    /// Build frame `index`
    #[must_use]
    pub fn frame_data(system: DvSystem, index: u64) -> Vec<u8> {
        let mut frame = vec![index as u8; system.frame_size()];
        for (n, slot) in frame.chunks_exact_mut(SLOT_SIZE).enumerate() {
            let sequence = (n / BLOCKS_PER_SEQUENCE) as u8;
            let (section, block) = slot_id(n % BLOCKS_PER_SEQUENCE);
            slot[0] = section << 5 | 0x1f;
            slot[1] = sequence << 4 | 0x07;
            slot[2] = block;
            if section == SECTION_HEADER {
                slot[3] = match system {
                    DvSystem::Ntsc => 0x3f,
                    DvSystem::Pal => 0xbf,
                };
            }
        }
        frame
    }
}

impl DifSource for SyntheticDv {
    fn fill(&mut self, data: &mut [u8], n_dif_blocks: usize, _dropped: u32) -> Result<()> {
        for chunk in data.chunks_exact_mut(DIF_BLOCK_SIZE).take(n_dif_blocks) {
            if self.position >= self.frame.len() {
                self.frame_index += 1;
                self.frame = Self::frame_data(self.system, self.frame_index);
                self.position = 0;
            }
            chunk.copy_from_slice(&self.frame[self.position..self.position + DIF_BLOCK_SIZE]);
            self.position += DIF_BLOCK_SIZE;
        }
        Ok(())
    }
}

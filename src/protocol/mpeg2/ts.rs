//! 188-byte MPEG-2 transport stream packets

use bytes::Bytes;

use super::TS_PACKET_SIZE;
use crate::error::{Result, StreamError};

/// Sync byte at the start of every transport packet
pub const SYNC_BYTE: u8 = 0x47;

/// PCR ticks per second (27 MHz)
pub const PCR_HZ: u64 = 27_000_000;

/// PCR wraps at 2^33 base ticks of 300 extension ticks each
pub const PCR_MODULUS: u64 = (1 << 33) * 300;

/// One transport stream packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsPacket(Bytes);

impl TsPacket {
    /// Wrap exactly 188 bytes starting with the sync byte
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if `data` is shorter than a transport packet
    /// and `InvalidParameter` if it is longer or does not start with
    /// [`SYNC_BYTE`].
    pub fn new(data: Bytes) -> Result<Self> {
        if data.len() < TS_PACKET_SIZE {
            return Err(StreamError::BufferTooSmall {
                needed: TS_PACKET_SIZE,
                have: data.len(),
            });
        }
        if data.len() > TS_PACKET_SIZE {
            return Err(StreamError::invalid_parameter(
                "ts_packet",
                format!("{} bytes, expected {TS_PACKET_SIZE}", data.len()),
            ));
        }
        if data[0] != SYNC_BYTE {
            return Err(StreamError::invalid_parameter(
                "ts_packet",
                format!("sync byte {:#04x}, expected {SYNC_BYTE:#04x}", data[0]),
            ));
        }
        Ok(Self(data))
    }

    /// Raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Packet identifier (13 bits)
    #[must_use]
    pub fn pid(&self) -> u16 {
        u16::from_be_bytes([self.0[1], self.0[2]]) & 0x1fff
    }

    /// Whether the packet carries a PCR and belongs to `pid` (`None` matches any)
    #[must_use]
    pub fn has_pcr(&self, pid: Option<u16>) -> bool {
        if pid.is_some_and(|pid| pid != self.pid()) {
            return false;
        }
        let adaptation_present = self.0[3] & 0x20 != 0;
        let adaptation_len = self.0[4];
        let flags = self.0[5];
        adaptation_present && adaptation_len > 0 && flags & 0x10 != 0
    }

    /// Program clock reference in 27 MHz ticks, ignoring whether one is present
    #[must_use]
    pub fn pcr_field(&self) -> u64 {
        let b = &self.0[6..12];
        let base = (u64::from(b[0]) << 25)
            | (u64::from(b[1]) << 17)
            | (u64::from(b[2]) << 9)
            | (u64::from(b[3]) << 1)
            | (u64::from(b[4]) >> 7);
        let extension = (u64::from(b[4] & 0x01) << 8) | u64::from(b[5]);
        base * 300 + extension
    }

    /// Program clock reference, if the packet has one
    #[must_use]
    pub fn pcr(&self) -> Option<u64> {
        self.has_pcr(None).then(|| self.pcr_field())
    }
}

impl AsRef<[u8]> for TsPacket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Ticks from `earlier` to `later`, across a PCR wrap
#[must_use]
pub fn pcr_delta(earlier: u64, later: u64) -> u64 {
    (later % PCR_MODULUS + PCR_MODULUS - earlier % PCR_MODULUS) % PCR_MODULUS
}

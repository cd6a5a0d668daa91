//! CIP and iso packet header codecs
//!
//! Both headers are big-endian on the wire regardless of host order.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, StreamError};
use crate::types::Tag;

/// CIP format codes carried in the FMT field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CipFormat {
    /// IEC 61883-2 DV
    Dv = 0x00,
    /// IEC 61883-6 audio and music
    Amdtp = 0x10,
    /// IEC 61883-4 MPEG-2 transport stream
    Mpeg2 = 0x20,
}

impl CipFormat {
    /// Parse a 6-bit FMT value
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code & 0x3f {
            0x00 => Some(Self::Dv),
            0x10 => Some(Self::Amdtp),
            0x20 => Some(Self::Mpeg2),
            _ => None,
        }
    }

    /// 6-bit FMT value
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// SYT value meaning "no timestamp in this packet"
pub const SYT_NO_INFO: u16 = 0xffff;

/// FDF value of an AMDTP packet carrying only dummy events
pub const FDF_NO_DATA: u8 = 0xff;

/// Two-quadlet Common Isochronous Packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CipHeader {
    /// End-of-header marker of quadlet 0 (2 bits, 0)
    pub eoh0: u8,
    /// Source node id (6 bits)
    pub sid: u8,
    /// Data block size in quadlets
    pub dbs: u8,
    /// Fraction number (2 bits)
    pub fn_: u8,
    /// Quadlet padding count (3 bits)
    pub qpc: u8,
    /// Source packet header present
    pub sph: bool,
    /// Reserved (2 bits)
    pub reserved: u8,
    /// Data block counter
    pub dbc: u8,
    /// End-of-header marker of quadlet 1 (2 bits, 2)
    pub eoh1: u8,
    /// Format code (6 bits)
    pub fmt: u8,
    /// Format dependent field
    pub fdf: u8,
    /// Synchronisation timestamp: 4-bit cycle, 12-bit offset
    pub syt: u16,
}

impl CipHeader {
    /// Encoded size
    pub const SIZE: usize = 8;

    /// First quadlet as a host-order integer
    #[must_use]
    pub fn quadlet0(&self) -> u32 {
        (u32::from(self.eoh0 & 0x03) << 30)
            | (u32::from(self.sid & 0x3f) << 24)
            | (u32::from(self.dbs) << 16)
            | (u32::from(self.fn_ & 0x03) << 14)
            | (u32::from(self.qpc & 0x07) << 11)
            | (u32::from(self.sph) << 10)
            | (u32::from(self.reserved & 0x03) << 8)
            | u32::from(self.dbc)
    }

    /// Second quadlet as a host-order integer
    #[must_use]
    pub fn quadlet1(&self) -> u32 {
        (u32::from(self.eoh1 & 0x03) << 30)
            | (u32::from(self.fmt & 0x3f) << 24)
            | (u32::from(self.fdf) << 16)
            | u32::from(self.syt)
    }

    /// Encode to wire bytes
    #[must_use]
    pub fn encode(&self) -> [u8; 8] {
        let mut buf = [0u8; 8];
        BigEndian::write_u32(&mut buf[0..4], self.quadlet0());
        BigEndian::write_u32(&mut buf[4..8], self.quadlet1());
        buf
    }

    /// Encode into the first eight bytes of `buf`
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if `buf` is shorter than a header.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() < Self::SIZE {
            return Err(StreamError::BufferTooSmall {
                needed: Self::SIZE,
                have: buf.len(),
            });
        }
        buf[..Self::SIZE].copy_from_slice(&self.encode());
        Ok(())
    }

    /// Decode from wire bytes
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if `buf` is shorter than a header.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(StreamError::BufferTooSmall {
                needed: Self::SIZE,
                have: buf.len(),
            });
        }

        let q0 = BigEndian::read_u32(&buf[0..4]);
        let q1 = BigEndian::read_u32(&buf[4..8]);

        Ok(Self {
            eoh0: (q0 >> 30) as u8 & 0x03,
            sid: (q0 >> 24) as u8 & 0x3f,
            dbs: (q0 >> 16) as u8,
            fn_: (q0 >> 14) as u8 & 0x03,
            qpc: (q0 >> 11) as u8 & 0x07,
            sph: (q0 >> 10) & 0x01 != 0,
            reserved: (q0 >> 8) as u8 & 0x03,
            dbc: q0 as u8,
            eoh1: (q1 >> 30) as u8 & 0x03,
            fmt: (q1 >> 24) as u8 & 0x3f,
            fdf: (q1 >> 16) as u8,
            syt: q1 as u16,
        })
    }

    /// Format code, if it is one this crate knows
    #[must_use]
    pub fn format(&self) -> Option<CipFormat> {
        CipFormat::from_code(self.fmt)
    }

    /// Whether the packet carries a timestamp
    #[must_use]
    pub fn has_syt(&self) -> bool {
        self.syt != SYT_NO_INFO
    }
}

/// Transaction code of isochronous data blocks
pub const TCODE_ISO_DATA: u8 = 0x0a;

/// Iso packet header quadlet wrapping the CIP payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoHeader {
    /// Payload length in bytes
    pub data_length: u16,
    /// Tag
    pub tag: Tag,
    /// Channel (6 bits)
    pub channel: u8,
    /// Transaction code (4 bits)
    pub tcode: u8,
    /// Sync code (4 bits)
    pub sy: u8,
}

impl IsoHeader {
    /// Encoded size
    pub const SIZE: usize = 4;

    /// Header for an isochronous data block
    #[must_use]
    pub fn new(data_length: u16, tag: Tag, channel: u8, sy: u8) -> Self {
        Self {
            data_length,
            tag,
            channel: channel & 0x3f,
            tcode: TCODE_ISO_DATA,
            sy: sy & 0x0f,
        }
    }

    /// Encode to wire bytes
    #[must_use]
    pub fn encode(&self) -> [u8; 4] {
        let q = (u32::from(self.data_length) << 16)
            | (u32::from(self.tag as u8) << 14)
            | (u32::from(self.channel & 0x3f) << 8)
            | (u32::from(self.tcode & 0x0f) << 4)
            | u32::from(self.sy & 0x0f);
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, q);
        buf
    }

    /// Decode from wire bytes
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if `buf` is shorter than a quadlet.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(StreamError::BufferTooSmall {
                needed: Self::SIZE,
                have: buf.len(),
            });
        }
        let q = BigEndian::read_u32(&buf[0..4]);
        Ok(Self {
            data_length: (q >> 16) as u16,
            tag: Tag::from_bits((q >> 14) as u8),
            channel: (q >> 8) as u8 & 0x3f,
            tcode: (q >> 4) as u8 & 0x0f,
            sy: q as u8 & 0x0f,
        })
    }
}

//! AM824 quadlet labels
//!
//! Every AMDTP event quadlet carries an 8-bit label in its top byte and
//! 24 bits of data below it.

use super::format::SampleFormat;
use crate::error::{Result, StreamError};

/// Label of multi-bit linear audio; the low two bits hold the VBL code
pub const MBLA_LABEL: u8 = 0x40;

/// Highest label of IEC 60958 conformant data
pub const IEC60958_LABEL_MAX: u8 = 0x3f;

/// Label kinds the receiver can latch onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// Multi-bit linear audio with the given sample width
    Mbla(SampleFormat),
    /// IEC 60958 conformant data
    Iec60958,
}

impl Label {
    /// Classify a label byte
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedBitLength` for MBLA with the reserved VBL code and
    /// `UnsupportedLabel` for anything that is neither MBLA nor IEC 60958.
    pub fn parse(byte: u8) -> Result<Self> {
        if byte & !0x03 == MBLA_LABEL {
            Ok(Label::Mbla(SampleFormat::from_vbl(byte & 0x03)?))
        } else if byte <= IEC60958_LABEL_MAX {
            Ok(Label::Iec60958)
        } else {
            Err(StreamError::UnsupportedLabel(byte))
        }
    }

    /// Label byte written on transmit
    #[must_use]
    pub fn byte(self) -> u8 {
        match self {
            Label::Mbla(format) => MBLA_LABEL | format.vbl(),
            Label::Iec60958 => 0,
        }
    }
}

/// Label byte of a host-order quadlet
#[must_use]
pub fn label_of(quadlet: u32) -> u8 {
    (quadlet >> 24) as u8
}

/// OR a label into the top byte of a host-order quadlet
#[must_use]
pub fn with_label(quadlet: u32, label: u8) -> u32 {
    quadlet | (u32::from(label) << 24)
}

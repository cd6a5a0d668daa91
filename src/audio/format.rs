//! Audio format definitions

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreamError};

/// Sample width of AM824 multi-bit linear audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleFormat {
    /// 16-bit samples
    #[default]
    Bits16,
    /// 20-bit samples
    Bits20,
    /// 24-bit samples
    Bits24,
}

impl SampleFormat {
    /// Get bits per sample
    #[must_use]
    pub fn bits_per_sample(self) -> u8 {
        match self {
            SampleFormat::Bits16 => 16,
            SampleFormat::Bits20 => 20,
            SampleFormat::Bits24 => 24,
        }
    }

    /// AM824 valid-bit-length code
    #[must_use]
    pub fn vbl(self) -> u8 {
        match self {
            SampleFormat::Bits24 => 0,
            SampleFormat::Bits20 => 1,
            SampleFormat::Bits16 => 2,
        }
    }

    /// Parse a valid-bit-length code
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedBitLength` for the reserved code 3.
    pub fn from_vbl(vbl: u8) -> Result<Self> {
        match vbl & 0x03 {
            0 => Ok(SampleFormat::Bits24),
            1 => Ok(SampleFormat::Bits20),
            2 => Ok(SampleFormat::Bits16),
            code => Err(StreamError::UnsupportedBitLength(code)),
        }
    }

    /// Place a signed sample into the 24-bit AM824 data field, MSB aligned
    #[allow(clippy::cast_sign_loss)]
    #[must_use]
    pub fn to_data(self, sample: i32) -> u32 {
        let shift = 24 - u32::from(self.bits_per_sample());
        ((sample as u32) << shift) & 0x00ff_ffff
    }

    /// Recover the signed sample from a quadlet's 24-bit data field
    #[allow(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn from_data(self, quadlet: u32) -> i32 {
        // sign-extend the 24-bit field, then drop the unused low bits
        let data = ((quadlet << 8) as i32) >> 8;
        data >> (24 - u32::from(self.bits_per_sample()))
    }
}

/// Sample rate in Hz
///
/// Only the seven rates with an AMDTP sampling frequency code exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleRate {
    /// 32 kHz
    Hz32000,
    /// 44.1 kHz (CD quality)
    Hz44100,
    /// 48 kHz (DVD/standard digital audio)
    #[default]
    Hz48000,
    /// 88.2 kHz (double CD rate)
    Hz88200,
    /// 96 kHz (high resolution)
    Hz96000,
    /// 176.4 kHz
    Hz176400,
    /// 192 kHz
    Hz192000,
}

impl SampleRate {
    /// Every supported rate, in SFC order
    pub const ALL: [SampleRate; 7] = [
        SampleRate::Hz32000,
        SampleRate::Hz44100,
        SampleRate::Hz48000,
        SampleRate::Hz88200,
        SampleRate::Hz96000,
        SampleRate::Hz176400,
        SampleRate::Hz192000,
    ];

    /// Get the rate as u32
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            SampleRate::Hz32000 => 32000,
            SampleRate::Hz44100 => 44100,
            SampleRate::Hz48000 => 48000,
            SampleRate::Hz88200 => 88200,
            SampleRate::Hz96000 => 96000,
            SampleRate::Hz176400 => 176_400,
            SampleRate::Hz192000 => 192_000,
        }
    }

    /// Create from Hz value
    #[must_use]
    pub fn from_hz(hz: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|rate| rate.as_u32() == hz)
    }

    /// Sampling frequency code carried in the FDF
    #[must_use]
    pub fn sfc(self) -> u8 {
        self as u8
    }

    /// Parse a sampling frequency code
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedSampleRateCode` for codes above 6.
    pub fn from_sfc(code: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(StreamError::UnsupportedSampleRateCode(code))
    }

    /// Events between SYT timestamps
    #[must_use]
    pub fn syt_interval(self) -> u32 {
        match self {
            SampleRate::Hz32000 | SampleRate::Hz44100 | SampleRate::Hz48000 => 8,
            SampleRate::Hz88200 | SampleRate::Hz96000 => 16,
            SampleRate::Hz176400 | SampleRate::Hz192000 => 32,
        }
    }

    /// IEC 60958 channel-status sampling frequency code
    #[must_use]
    pub fn iec958_rate_code(self) -> u8 {
        match self {
            SampleRate::Hz32000 => 0x0c,
            SampleRate::Hz48000 => 0x04,
            _ => 0x00,
        }
    }
}

/// AMDTP payload subformat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AmdtpFormat {
    /// AM824 multi-bit linear audio
    #[default]
    Raw,
    /// IEC 60958 conformant PCM, at most two channels
    Iec958Pcm,
    /// IEC 60958 conformant AC-3
    Iec958Ac3,
}

impl std::fmt::Display for AmdtpFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmdtpFormat::Raw => write!(f, "AM824 raw"),
            AmdtpFormat::Iec958Pcm => write!(f, "IEC 60958 PCM"),
            AmdtpFormat::Iec958Ac3 => write!(f, "IEC 60958 AC-3"),
        }
    }
}

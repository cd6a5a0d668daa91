//! IEC 60958 subframes carried in AM824 quadlets
//!
//! Bit layout of the host-order quadlet:
//!
//! | bits  | field             |
//! |-------|-------------------|
//! | 0-23  | audio data        |
//! | 24    | validity          |
//! | 25    | user data         |
//! | 26    | channel status    |
//! | 27    | parity            |
//! | 28-29 | preamble code     |
//! | 30-31 | label (always 0)  |

/// Frames in one IEC 60958 channel-status block
pub const FRAMES_PER_BLOCK: u64 = 192;

/// Preamble code of a subframe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Preamble {
    /// Channel 2
    W = 0,
    /// Channel 1, not at a block start
    M = 1,
    /// Reserved; used for dummy samples
    Reserved = 2,
    /// Channel 1 at the start of a block
    B = 3,
}

impl Preamble {
    /// Parse the 2-bit code
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Preamble::W,
            1 => Preamble::M,
            2 => Preamble::Reserved,
            _ => Preamble::B,
        }
    }
}

/// One IEC 60958 subframe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subframe {
    /// 24-bit audio data
    pub data: u32,
    /// Sample is not suitable for conversion
    pub invalid: bool,
    /// User data bit
    pub user: bool,
    /// Channel status bit
    pub channel_status: bool,
    /// Preamble code
    pub preamble: Preamble,
}

impl Subframe {
    /// Unpack a host-order quadlet
    #[must_use]
    pub fn from_quadlet(quadlet: u32) -> Self {
        Self {
            data: quadlet & 0x00ff_ffff,
            invalid: quadlet & (1 << 24) != 0,
            user: quadlet & (1 << 25) != 0,
            channel_status: quadlet & (1 << 26) != 0,
            preamble: Preamble::from_bits((quadlet >> 28) as u8),
        }
    }

    /// Pack into a host-order quadlet with label 0 and even parity
    #[must_use]
    pub fn to_quadlet(self) -> u32 {
        let body = (self.data & 0x00ff_ffff)
            | (u32::from(self.invalid) << 24)
            | (u32::from(self.user) << 25)
            | (u32::from(self.channel_status) << 26);
        let parity = body.count_ones() & 1;
        body | (parity << 27) | (u32::from(self.preamble as u8) << 28)
    }

    /// Whether bits 0-27 carry even parity
    #[must_use]
    pub fn parity_ok(quadlet: u32) -> bool {
        (quadlet & 0x0fff_ffff).count_ones() % 2 == 0
    }
}

/// Labels IEC 60958 quadlets in place, tracking the block position
#[derive(Debug, Clone, Default)]
pub struct SubframeLabeler {
    frame: u64,
}

impl SubframeLabeler {
    /// Rewrite `nframes` frames of `dimension` quadlets each
    ///
    /// Real samples keep their data, user and channel-status bits. Dummy
    /// samples are marked invalid with the reserved preamble and do not
    /// advance the block position.
    pub fn label(&mut self, quadlets: &mut [u32], dimension: usize, dummy: bool) {
        if dimension == 0 {
            return;
        }
        for frame in quadlets.chunks_mut(dimension) {
            for (channel, quadlet) in frame.iter_mut().enumerate() {
                let mut subframe = Subframe::from_quadlet(*quadlet);
                if dummy {
                    subframe.invalid = true;
                    subframe.preamble = Preamble::Reserved;
                } else {
                    subframe.invalid = false;
                    subframe.preamble = if channel % 2 == 1 {
                        Preamble::W
                    } else if self.frame % FRAMES_PER_BLOCK == 0 {
                        Preamble::B
                    } else {
                        Preamble::M
                    };
                }
                *quadlet = subframe.to_quadlet();
            }
            if !dummy {
                self.frame += 1;
            }
        }
    }
}

//! Core types module

mod config;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreamError};

pub use config::{StreamConfig, StreamConfigBuilder};

/// Isochronous link speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Speed {
    /// 100 Mbit/s
    #[default]
    S100,
    /// 200 Mbit/s
    S200,
    /// 400 Mbit/s
    S400,
}

impl Speed {
    /// Nominal speed in Mbit/s
    #[must_use]
    pub fn mbps(self) -> u32 {
        match self {
            Speed::S100 => 100,
            Speed::S200 => 200,
            Speed::S400 => 400,
        }
    }
}

/// Logical isochronous channel number (0-63)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel(u8);

impl Channel {
    /// Highest channel number on the bus
    pub const MAX: u8 = 63;

    /// Create a channel, rejecting numbers outside 0-63
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `number` exceeds 63.
    pub fn new(number: u8) -> Result<Self> {
        if number > Self::MAX {
            return Err(StreamError::invalid_parameter(
                "channel",
                format!("{number} is outside 0-{}", Self::MAX),
            ));
        }
        Ok(Self(number))
    }

    /// Channel number
    #[must_use]
    pub fn number(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Channel {
    type Error = StreamError;

    fn try_from(number: u8) -> Result<Self> {
        Self::new(number)
    }
}

/// What the substrate should do after a per-cycle callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Cycle handled
    Ok,
    /// Packets were dropped; let the substrate catch up before the next cycle
    Defer,
    /// Cycle failed; the substrate decides whether to abort
    Error,
}

impl Disposition {
    /// Collapse a handler result into the disposition seen by the substrate
    #[must_use]
    pub fn from_result<T: Into<Disposition> + Copy>(result: &Result<T>) -> Self {
        match result {
            Ok(value) => (*value).into(),
            Err(_) => Disposition::Error,
        }
    }
}

/// Isochronous tag carried in the iso packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    /// Payload is not prefixed by a CIP header
    WithoutCip = 0,
    /// Payload starts with a two-quadlet CIP header
    WithCip = 1,
    /// Reserved
    Reserved1 = 2,
    /// Reserved
    Reserved2 = 3,
}

impl Tag {
    /// Parse from the 2-bit tag field
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Tag::WithoutCip,
            1 => Tag::WithCip,
            2 => Tag::Reserved1,
            _ => Tag::Reserved2,
        }
    }
}

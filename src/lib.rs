//! # iec61883
//!
//! Packetizers and depacketizers for IEC 61883 isochronous streams over
//! IEEE 1394.
//!
//! ## Features
//!
//! - CIP header generation with blocking and non-blocking timing
//! - AMDTP audio (IEC 61883-6) with AM824 and IEC 60958 labelling
//! - DV (IEC 61883-2) with frame reassembly
//! - MPEG-2 transport streams (IEC 61883-4) paced by their PCRs
//!
//! ## Example
//!
//! ```rust
//! use iec61883::prelude::*;
//! use iec61883::testing::{LoopbackBus, SyntheticTs};
//!
//! # fn example() -> iec61883::Result<()> {
//! let mut bus = LoopbackBus::default();
//! let mut tx = Mpeg2Transmitter::new(SyntheticTs::new(0x100, 200, 10_125_000));
//! tx.start(&mut bus, None, Channel::new(63)?)?;
//!
//! let packets = bus.run(&mut tx, 100)?;
//! assert_eq!(packets.len(), 100);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! # Architecture
//!
//! The crate never touches hardware. A bus substrate implements
//! [`bus::IsoBus`] and calls each stream once per isochronous cycle through
//! [`bus::TransmitHandler`] or [`bus::ReceiveHandler`]:
//!
//! - **Streams**: `AmdtpTransmitter`, `DvReceiver`, `Mpeg2Transmitter`, ...
//! - **Timing**: [`protocol::cip::CipState`] and the MPEG-2 smoothing buffer
//! - **Wire**: CIP and iso headers, AM824 labels, transport packets

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Error types
pub mod error;
/// Core types
pub mod types;

/// Testing utilities
pub mod testing;

pub mod audio;
pub mod bus;
pub mod protocol;

// Re-exports
pub use audio::{AmdtpFormat, SampleFormat, SampleRate};
pub use error::{Result, StreamError};
pub use protocol::amdtp::{AmdtpReceiver, AmdtpTransmitter};
pub use protocol::cip::TransmissionMode;
pub use protocol::dv::{DvFrameReceiver, DvReceiver, DvSystem, DvTransmitter};
pub use protocol::mpeg2::{Mpeg2Receiver, Mpeg2Transmitter, TsBufferOptions};
pub use types::{Channel, Disposition, Speed, StreamConfig, Tag};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
///
/// Convenient re-exports
pub mod prelude {
    pub use crate::bus::{IsoBus, ReceiveHandler, StreamControl, TransmitHandler};
    pub use crate::{
        AmdtpFormat, AmdtpReceiver, AmdtpTransmitter, Channel, Disposition, DvFrameReceiver,
        DvReceiver, DvSystem, DvTransmitter, Mpeg2Receiver, Mpeg2Transmitter, Result,
        SampleFormat, SampleRate, Speed, StreamConfig, StreamError, TransmissionMode,
        TsBufferOptions,
    };
}

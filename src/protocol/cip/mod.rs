//! Common Isochronous Packet layer
//!
//! [`CipState`] decides, once per bus cycle, how many events go into the
//! packet and which event carries the SYT presentation timestamp.
//! [`CipHeader`] and [`IsoHeader`] are the bit-exact wire codecs.

mod engine;
mod fraction;
mod header;


pub use engine::{CipCycle, CipState, TransmissionMode};
pub use fraction::Fraction;
pub use header::{CipFormat, CipHeader, FDF_NO_DATA, IsoHeader, SYT_NO_INFO, TCODE_ISO_DATA};

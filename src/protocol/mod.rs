//! Isochronous stream protocols
//!
//! [`cip`] is the common packet layer; the other modules are the three
//! payload formats carried on it.

pub mod amdtp;
pub mod cip;
pub mod dv;
pub mod mpeg2;

//! Audio sample formats and AM824 quadlet labelling

pub mod am824;
pub mod format;
pub mod iec60958;

#[cfg(test)]
mod tests;

pub use am824::Label;
pub use format::{AmdtpFormat, SampleFormat, SampleRate};
pub use iec60958::{Preamble, Subframe, SubframeLabeler};

use thiserror::Error;

/// Errors that can occur while configuring or driving an isochronous stream
#[derive(Debug, Error)]
pub enum StreamError {
    // ===== Construction Errors =====
    /// Invalid static parameter supplied at construction or start
    #[error("invalid parameter: {name} - {message}")]
    InvalidParameter {
        /// The name of the parameter
        name: String,
        /// Description of the error
        message: String,
    },

    // ===== Wire Errors =====
    /// Wire buffer shorter than the structure being read or written
    #[error("buffer too small: need {needed} bytes, have {have}")]
    BufferTooSmall {
        /// Bytes required
        needed: usize,
        /// Bytes available
        have: usize,
    },

    /// Sampling frequency code in the FDF is not one of the defined rates
    #[error("unsupported sampling frequency code: {0}")]
    UnsupportedSampleRateCode(u8),

    /// AM824 valid-bit-length code is reserved
    #[error("unsupported valid bit length code: {0}")]
    UnsupportedBitLength(u8),

    /// Data label is neither AM824 multi-bit linear audio nor IEC 60958
    #[error("unsupported data format label: 0x{0:02x}")]
    UnsupportedLabel(u8),

    /// Format recognised but not supported for this operation
    #[error("unsupported format: {format}")]
    UnsupportedFormat {
        /// The unsupported format
        format: String,
    },

    // ===== Callback Errors =====
    /// User data source or sink reported failure
    #[error("callback failed: {message}")]
    Callback {
        /// Description supplied by the callback
        message: String,
    },

    // ===== Smoothing Buffer Errors =====
    /// No PCR-bearing packet found within the lookahead bound
    #[error("no PCR found within {lookahead} packets")]
    PcrNotFound {
        /// Lookahead bound in packets
        lookahead: usize,
    },

    /// Consecutive PCRs in a lookahead window did not advance
    #[error("PCR did not advance across {packets} packets")]
    PcrStalled {
        /// Packets in the window
        packets: usize,
    },

    /// Transport packet source stopped delivering packets
    #[error("transport stream source exhausted")]
    SourceExhausted,

    // ===== State Errors =====
    /// Operation not valid in current state
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of why the state is invalid
        message: String,
    },

    // ===== Substrate Errors =====
    /// The isochronous bus substrate refused an operation
    #[error("bus error: {message}")]
    Bus {
        /// Description of the failure
        message: String,
    },
}

impl StreamError {
    /// Create a callback failure with the given message
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Check if this error ends the stream rather than a single cycle
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedSampleRateCode(_)
                | Self::UnsupportedBitLength(_)
                | Self::UnsupportedLabel(_)
                | Self::PcrNotFound { .. }
                | Self::PcrStalled { .. }
                | Self::SourceExhausted
        )
    }

    /// Check if this error was raised by a user source or sink
    #[must_use]
    pub fn is_callback(&self) -> bool {
        matches!(self, Self::Callback { .. })
    }
}

/// Result type alias for stream operations
pub type Result<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StreamError::UnsupportedLabel(0x85);
        assert_eq!(err.to_string(), "unsupported data format label: 0x85");

        let err = StreamError::BufferTooSmall {
            needed: 8,
            have: 4,
        };
        assert_eq!(err.to_string(), "buffer too small: need 8 bytes, have 4");
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(StreamError::UnsupportedSampleRateCode(7).is_fatal());
        assert!(StreamError::PcrNotFound { lookahead: 20000 }.is_fatal());
        assert!(!StreamError::callback("eof").is_fatal());
        assert!(!StreamError::invalid_state("running").is_fatal());
    }

    #[test]
    fn test_error_is_callback() {
        assert!(StreamError::callback("short read").is_callback());
        assert!(!StreamError::SourceExhausted.is_callback());
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StreamError>();
    }
}

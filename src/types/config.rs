use serde::{Deserialize, Serialize};

use super::Speed;

/// Substrate tuning for one isochronous stream
///
/// These values are handed to the bus substrate when the stream starts and
/// cannot change while it is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Packets of buffering in the substrate (default: 1000)
    pub buffer_packets: u32,

    /// Packets queued before transmission starts (default: 1000)
    pub prebuffer_packets: u32,

    /// Packets between substrate interrupts (default: 250)
    pub irq_interval: u32,

    /// Drain pending packets before shutting down on stop
    pub synch: bool,

    /// Link speed for transmission (default: S100)
    pub speed: Speed,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_packets: 1000,
            prebuffer_packets: 1000,
            irq_interval: 250,
            synch: false,
            speed: Speed::S100,
        }
    }
}

impl StreamConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> StreamConfigBuilder {
        StreamConfigBuilder::default()
    }

    /// Defaults for DV reception: small ring, interrupt on every packet
    #[must_use]
    pub fn dv_receive() -> Self {
        Self {
            buffer_packets: 775,
            prebuffer_packets: 0,
            irq_interval: 1,
            ..Self::default()
        }
    }

    /// Defaults for MPEG-2 transport streams
    #[must_use]
    pub fn mpeg2() -> Self {
        Self {
            speed: Speed::S200,
            ..Self::default()
        }
    }
}

/// Builder for `StreamConfig`
#[derive(Debug, Clone, Default)]
pub struct StreamConfigBuilder {
    config: StreamConfig,
}

impl StreamConfigBuilder {
    /// Start from an existing configuration
    #[must_use]
    pub fn from_config(config: StreamConfig) -> Self {
        Self { config }
    }

    /// Set substrate buffer depth in packets
    #[must_use]
    pub fn buffer_packets(mut self, packets: u32) -> Self {
        self.config.buffer_packets = packets;
        self
    }

    /// Set prebuffer depth in packets
    #[must_use]
    pub fn prebuffer_packets(mut self, packets: u32) -> Self {
        self.config.prebuffer_packets = packets;
        self
    }

    /// Set interrupt interval in packets
    #[must_use]
    pub fn irq_interval(mut self, packets: u32) -> Self {
        self.config.irq_interval = packets;
        self
    }

    /// Drain pending packets on stop
    #[must_use]
    pub fn synch(mut self, enable: bool) -> Self {
        self.config.synch = enable;
        self
    }

    /// Set link speed
    #[must_use]
    pub fn speed(mut self, speed: Speed) -> Self {
        self.config.speed = speed;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> StreamConfig {
        self.config
    }
}

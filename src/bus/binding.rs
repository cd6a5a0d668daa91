//! Start/stop lifecycle shared by every stream

use tracing::{debug, warn};

use super::traits::{IsoBus, IsoParams};
use crate::error::{Result, StreamError};
use crate::types::{Channel, Speed, StreamConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Transmit,
    Receive,
}

/// Substrate binding of one stream: its tuning, channel and drop counter
#[derive(Debug, Clone)]
pub struct StreamBinding {
    config: StreamConfig,
    channel: Option<Channel>,
    running: Option<Direction>,
    dropped: u64,
}

impl StreamBinding {
    /// Create an unbound binding
    #[must_use]
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            channel: None,
            running: None,
            dropped: 0,
        }
    }

    /// Current tuning
    #[must_use]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Channel bound at the last start
    #[must_use]
    pub fn channel(&self) -> Option<Channel> {
        self.channel
    }

    /// Whether the stream is between start and stop
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Packets the substrate reported dropped since the last start
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Accumulate a per-cycle drop count
    pub fn add_dropped(&mut self, dropped: u32) {
        self.dropped += u64::from(dropped);
    }

    /// Apply a change to the tuning
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` while the stream is running.
    pub fn update(&mut self, change: impl FnOnce(&mut StreamConfig)) -> Result<()> {
        if self.is_running() {
            return Err(StreamError::invalid_state(
                "stream parameters can only be changed before start",
            ));
        }
        change(&mut self.config);
        Ok(())
    }

    fn params(&self, channel: Channel, max_packet_size: usize) -> IsoParams {
        IsoParams {
            buffer_packets: self.config.buffer_packets,
            max_packet_size,
            channel,
            speed: self.config.speed,
            irq_interval: self.config.irq_interval,
        }
    }

    fn ensure_stopped(&self) -> Result<()> {
        if self.is_running() {
            return Err(StreamError::invalid_state("stream already started"));
        }
        Ok(())
    }

    /// Bind a transmit channel and start sending
    ///
    /// The drop counter is reset between `xmit_init` and `xmit_start`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if already running, or the substrate's error.
    pub fn start_transmit<B: IsoBus + ?Sized>(
        &mut self,
        bus: &mut B,
        channel: Channel,
        max_packet_size: usize,
        start_cycle: Option<u32>,
    ) -> Result<()> {
        self.ensure_stopped()?;
        let params = self.params(channel, max_packet_size);
        bus.xmit_init(&params)?;
        self.dropped = 0;
        if let Err(e) = bus.xmit_start(start_cycle, self.config.prebuffer_packets) {
            bus.shutdown();
            return Err(e);
        }
        debug!(
            channel = channel.number(),
            max_packet_size, "Transmit started"
        );
        self.channel = Some(channel);
        self.running = Some(Direction::Transmit);
        Ok(())
    }

    /// Bind a receive channel and start listening
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if already running, or the substrate's error.
    pub fn start_receive<B: IsoBus + ?Sized>(
        &mut self,
        bus: &mut B,
        channel: Channel,
        max_packet_size: usize,
    ) -> Result<()> {
        self.ensure_stopped()?;
        let params = self.params(channel, max_packet_size);
        bus.recv_init(&params)?;
        self.dropped = 0;
        if let Err(e) = bus.recv_start() {
            bus.shutdown();
            return Err(e);
        }
        debug!(
            channel = channel.number(),
            max_packet_size, "Receive started"
        );
        self.channel = Some(channel);
        self.running = Some(Direction::Receive);
        Ok(())
    }

    /// Drain if configured, then release the substrate
    ///
    /// Stopping a stream that is not running does nothing.
    pub fn stop<B: IsoBus + ?Sized>(&mut self, bus: &mut B) {
        let Some(direction) = self.running.take() else {
            return;
        };
        if self.config.synch {
            let drained = match direction {
                Direction::Transmit => bus.xmit_sync(),
                Direction::Receive => bus.recv_flush(),
            };
            if let Err(e) = drained {
                warn!(error = %e, "Failed to drain stream before shutdown");
            }
        }
        bus.shutdown();
        debug!(dropped = self.dropped, "Stream stopped");
    }
}

/// Substrate tuning accessors shared by every stream
///
/// Setters fail with `InvalidState` once the stream is started.
pub trait StreamControl {
    /// The stream's binding
    fn binding(&self) -> &StreamBinding;

    /// The stream's binding, mutably
    fn binding_mut(&mut self) -> &mut StreamBinding;

    /// Current tuning
    fn config(&self) -> &StreamConfig {
        self.binding().config()
    }

    /// Substrate buffer depth in packets
    fn buffers(&self) -> u32 {
        self.config().buffer_packets
    }

    /// Set substrate buffer depth
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once started.
    fn set_buffers(&mut self, packets: u32) -> Result<()> {
        self.binding_mut().update(|c| c.buffer_packets = packets)
    }

    /// Prebuffer depth in packets
    fn prebuffers(&self) -> u32 {
        self.config().prebuffer_packets
    }

    /// Set prebuffer depth
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once started.
    fn set_prebuffers(&mut self, packets: u32) -> Result<()> {
        self.binding_mut().update(|c| c.prebuffer_packets = packets)
    }

    /// Packets between substrate interrupts
    fn irq_interval(&self) -> u32 {
        self.config().irq_interval
    }

    /// Set interrupt interval
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once started.
    fn set_irq_interval(&mut self, packets: u32) -> Result<()> {
        self.binding_mut().update(|c| c.irq_interval = packets)
    }

    /// Whether stop drains pending packets
    fn synch(&self) -> bool {
        self.config().synch
    }

    /// Set drain-on-stop
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once started.
    fn set_synch(&mut self, enable: bool) -> Result<()> {
        self.binding_mut().update(|c| c.synch = enable)
    }

    /// Link speed
    fn speed(&self) -> Speed {
        self.config().speed
    }

    /// Set link speed
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once started.
    fn set_speed(&mut self, speed: Speed) -> Result<()> {
        self.binding_mut().update(|c| c.speed = speed)
    }

    /// Packets dropped by the substrate since the last start
    fn dropped(&self) -> u64 {
        self.binding().dropped()
    }

    /// Channel bound at the last start
    fn channel(&self) -> Option<Channel> {
        self.binding().channel()
    }

    /// Whether the stream is running
    fn is_running(&self) -> bool {
        self.binding().is_running()
    }
}

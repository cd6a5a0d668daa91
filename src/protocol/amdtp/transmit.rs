//! AMDTP packetizer

use byteorder::{BigEndian, ByteOrder};
use tracing::debug;

use super::events::{EventInfo, EventSource};
use crate::audio::am824::{Label, with_label};
use crate::audio::{AmdtpFormat, SampleFormat, SampleRate, SubframeLabeler};
use crate::bus::{IsoBus, StreamBinding, StreamControl, TransmitHandler, XmitCycle, XmitPacket};
use crate::error::{Result, StreamError};
use crate::protocol::cip::{CipFormat, CipHeader, CipState, TransmissionMode};
use crate::types::{Channel, StreamConfig};

/// Turns application events into AMDTP packets, one per bus cycle
pub struct AmdtpTransmitter<S> {
    cip: CipState,
    rate: SampleRate,
    format: AmdtpFormat,
    sample_format: SampleFormat,
    dimension: u8,
    labeler: SubframeLabeler,
    source: S,
    binding: StreamBinding,
    events: Vec<u32>,
}

impl<S: EventSource> AmdtpTransmitter<S> {
    /// Create a transmitter
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `rate_hz` is not one of the seven AMDTP
    /// rates, `dimension` is zero, or IEC 60958 PCM is asked to carry more
    /// than two channels.
    pub fn new(
        rate_hz: u32,
        format: AmdtpFormat,
        sample_format: SampleFormat,
        mode: TransmissionMode,
        dimension: u8,
        source: S,
    ) -> Result<Self> {
        let rate = SampleRate::from_hz(rate_hz).ok_or_else(|| {
            StreamError::invalid_parameter("rate", format!("{rate_hz} Hz is not an AMDTP rate"))
        })?;
        if dimension == 0 {
            return Err(StreamError::invalid_parameter(
                "dimension",
                "at least one channel is required",
            ));
        }
        if format == AmdtpFormat::Iec958Pcm && dimension > 2 {
            return Err(StreamError::invalid_parameter(
                "dimension",
                format!("{format} carries at most 2 channels, got {dimension}"),
            ));
        }

        let mut cip = CipState::new(
            CipFormat::Amdtp,
            rate.sfc(),
            rate.as_u32(),
            dimension,
            rate.syt_interval(),
        )?;
        cip.set_transmission_mode(mode);

        Ok(Self {
            cip,
            rate,
            format,
            sample_format,
            dimension,
            labeler: SubframeLabeler::default(),
            source,
            binding: StreamBinding::new(StreamConfig::default()),
            events: Vec::new(),
        })
    }

    /// Channels per event
    #[must_use]
    pub fn dimension(&self) -> u8 {
        self.dimension
    }

    /// Sampling rate
    #[must_use]
    pub fn rate(&self) -> SampleRate {
        self.rate
    }

    /// Payload subformat
    #[must_use]
    pub fn format(&self) -> AmdtpFormat {
        self.format
    }

    /// Sample width used for AM824 labels
    #[must_use]
    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    /// Timing state
    #[must_use]
    pub fn cip(&self) -> &CipState {
        &self.cip
    }

    /// Event source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Event source, mutably
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Bind to `channel` and start transmitting
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if already started, or the substrate's error.
    pub fn start<B: IsoBus + ?Sized>(&mut self, bus: &mut B, channel: Channel) -> Result<()> {
        debug!(
            rate = self.rate.as_u32(),
            dimension = self.dimension,
            format = %self.format,
            "Starting AMDTP transmit"
        );
        let max_packet_size = self.cip.max_packet_size();
        self.binding
            .start_transmit(bus, channel, max_packet_size, Some(0))
    }

    /// Stop transmitting, draining first if `synch` is set
    pub fn stop<B: IsoBus + ?Sized>(&mut self, bus: &mut B) {
        self.binding.stop(bus);
    }

    fn label(&mut self, dummy: bool) -> Result<()> {
        match self.format {
            AmdtpFormat::Raw => {
                let label = Label::Mbla(self.sample_format).byte();
                for quadlet in &mut self.events {
                    *quadlet = with_label(*quadlet, label);
                }
                Ok(())
            }
            AmdtpFormat::Iec958Pcm => {
                self.labeler
                    .label(&mut self.events, usize::from(self.dimension), dummy);
                Ok(())
            }
            AmdtpFormat::Iec958Ac3 => Err(StreamError::UnsupportedFormat {
                format: self.format.to_string(),
            }),
        }
    }
}

impl<S: EventSource> TransmitHandler for AmdtpTransmitter<S> {
    fn transmit(&mut self, buffer: &mut [u8], cycle: XmitCycle) -> Result<XmitPacket> {
        self.binding.add_dropped(cycle.dropped);

        let out = self.cip.fill_header(cycle.node_id);
        let dummy =
            out.events == 0 && self.cip.transmission_mode() == TransmissionMode::BlockingNoData;
        let nsamples = if dummy {
            self.cip.syt_interval() as usize
        } else {
            out.events
        };

        let quadlets = nsamples * usize::from(self.dimension);
        let len = CipHeader::SIZE + quadlets * 4;
        if buffer.len() < len {
            return Err(StreamError::BufferTooSmall {
                needed: len,
                have: buffer.len(),
            });
        }

        self.events.clear();
        self.events.resize(quadlets, 0);

        if out.events > 0 {
            let info = EventInfo {
                events: out.events,
                dbc: out.header.dbc,
                dropped: cycle.dropped,
            };
            self.source.fill(&mut self.events, info)?;
        }

        self.label(dummy)?;

        out.header.write_to(buffer)?;
        BigEndian::write_u32_into(&self.events, &mut buffer[CipHeader::SIZE..len]);

        Ok(XmitPacket::with_cip(len))
    }

    fn max_packet_size(&self) -> usize {
        self.cip.max_packet_size()
    }
}

impl<S> StreamControl for AmdtpTransmitter<S> {
    fn binding(&self) -> &StreamBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut StreamBinding {
        &mut self.binding
    }
}

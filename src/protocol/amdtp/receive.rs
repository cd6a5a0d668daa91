//! AMDTP depacketizer with format auto-detection

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, warn};

use super::events::{EventInfo, EventSink};
use crate::audio::am824::{Label, label_of};
use crate::audio::{AmdtpFormat, SampleFormat, SampleRate};
use crate::bus::{IsoBus, ReceiveHandler, RecvPacket, StreamBinding, StreamControl};
use crate::error::Result;
use crate::protocol::cip::{CipFormat, CipHeader};
use crate::types::{Channel, Disposition, StreamConfig, Tag};

/// Receive buffer size handed to the substrate
pub const RECEIVE_MAX_PACKET_SIZE: usize = 2048;

/// FDF bits holding the sampling frequency code
const FDF_SFC_MASK: u8 = 0x07;

/// FDF flag of the controlled (N) AM824 variant
const FDF_AM824_CONTROLLED: u8 = 0x08;

/// Format learned from the first timestamped packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatchedFormat {
    /// Channels per event
    pub dimension: u8,
    /// Sampling rate
    pub rate: SampleRate,
    /// Payload subformat
    pub format: AmdtpFormat,
    /// Sample width; `None` for IEC 60958 data
    pub sample_format: Option<SampleFormat>,
}

impl LatchedFormat {
    fn detect(header: &CipHeader, first_quadlet: u32) -> Result<Self> {
        let rate = SampleRate::from_sfc(header.fdf & FDF_SFC_MASK)?;
        let (format, sample_format) = match Label::parse(label_of(first_quadlet))? {
            Label::Mbla(sample_format) => (AmdtpFormat::Raw, Some(sample_format)),
            Label::Iec60958 => (AmdtpFormat::Iec958Pcm, None),
        };
        Ok(Self {
            dimension: header.dbs,
            rate,
            format,
            sample_format,
        })
    }
}

fn is_am824(fdf: u8) -> bool {
    fdf & !(FDF_SFC_MASK | FDF_AM824_CONTROLLED) == 0
}

/// Turns received AMDTP packets back into event quadlets
pub struct AmdtpReceiver<K> {
    latched: Option<LatchedFormat>,
    sink: K,
    binding: StreamBinding,
    events: Vec<u32>,
}

impl<K: EventSink> AmdtpReceiver<K> {
    /// Create a receiver; the format is learned from the stream
    pub fn new(sink: K) -> Self {
        Self {
            latched: None,
            sink,
            binding: StreamBinding::new(StreamConfig::default()),
            events: Vec::new(),
        }
    }

    /// Everything learned from the stream, once latched
    #[must_use]
    pub fn latched(&self) -> Option<LatchedFormat> {
        self.latched
    }

    /// Channels per event, once latched
    #[must_use]
    pub fn dimension(&self) -> Option<u8> {
        self.latched.map(|l| l.dimension)
    }

    /// Sampling rate, once latched
    #[must_use]
    pub fn rate(&self) -> Option<SampleRate> {
        self.latched.map(|l| l.rate)
    }

    /// Payload subformat, once latched
    #[must_use]
    pub fn format(&self) -> Option<AmdtpFormat> {
        self.latched.map(|l| l.format)
    }

    /// Sample width, once latched as AM824 raw audio
    #[must_use]
    pub fn sample_format(&self) -> Option<SampleFormat> {
        self.latched.and_then(|l| l.sample_format)
    }

    /// Event sink
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Event sink, mutably
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Bind to `channel` and start receiving
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if already started, or the substrate's error.
    pub fn start<B: IsoBus + ?Sized>(&mut self, bus: &mut B, channel: Channel) -> Result<()> {
        self.binding
            .start_receive(bus, channel, RECEIVE_MAX_PACKET_SIZE)
    }

    /// Stop receiving, flushing first if `synch` is set
    pub fn stop<B: IsoBus + ?Sized>(&mut self, bus: &mut B) {
        self.binding.stop(bus);
    }

    fn latch(&mut self, header: &CipHeader, payload: &[u8]) -> Result<()> {
        if payload.len() < 4 {
            return Ok(());
        }
        match LatchedFormat::detect(header, BigEndian::read_u32(payload)) {
            Ok(latched) => {
                debug!(
                    fdf = header.fdf,
                    dimension = latched.dimension,
                    rate = latched.rate.as_u32(),
                    format = %latched.format,
                    sample_format = ?latched.sample_format,
                    "Latched AMDTP stream format"
                );
                self.latched = Some(latched);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Cannot latch AMDTP stream format");
                Err(e)
            }
        }
    }

    fn deliver(&mut self, header: &CipHeader, payload: &[u8], dropped: u32) -> Result<()> {
        let Some(latched) = self.latched else {
            return Ok(());
        };
        let quadlets = payload.len() / 4;
        if quadlets == 0 {
            return Ok(());
        }

        self.events.clear();
        self.events.resize(quadlets, 0);
        BigEndian::read_u32_into(&payload[..quadlets * 4], &mut self.events);

        let info = EventInfo {
            events: quadlets / usize::from(latched.dimension.max(1)),
            dbc: header.dbc,
            dropped,
        };
        self.sink.consume(&self.events, info)
    }
}

impl<K: EventSink> ReceiveHandler for AmdtpReceiver<K> {
    fn receive(&mut self, packet: &RecvPacket<'_>) -> Result<Disposition> {
        self.binding.add_dropped(packet.dropped);

        if packet.tag == Tag::WithCip {
            if let Ok(header) = CipHeader::decode(packet.data) {
                if header.format() == Some(CipFormat::Amdtp) && is_am824(header.fdf) {
                    let payload = &packet.data[CipHeader::SIZE..];
                    if self.latched.is_none() && header.has_syt() {
                        self.latch(&header, payload)?;
                    }
                    self.deliver(&header, payload, packet.dropped)?;
                }
            }
        }

        Ok(if packet.dropped > 0 {
            Disposition::Defer
        } else {
            Disposition::Ok
        })
    }
}

impl<K> StreamControl for AmdtpReceiver<K> {
    fn binding(&self) -> &StreamBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut StreamBinding {
        &mut self.binding
    }
}

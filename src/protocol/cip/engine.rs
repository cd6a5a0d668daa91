//! Per-stream CIP timing state

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::fraction::Fraction;
use super::header::{CipFormat, CipHeader, FDF_NO_DATA, SYT_NO_INFO};
use crate::bus::CYCLES_PER_SECOND;
use crate::error::{Result, StreamError};

/// Delay between packetisation and presentation, in 24.576 MHz ticks
const TRANSFER_DELAY: i64 = 9000;

/// Ticks per bus cycle
const TICKS_PER_CYCLE: i64 = 3072;

/// Cycle-timer ticks per second
const TICKS_PER_SECOND: i64 = 24_576_000;

/// How empty cycles are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransmissionMode {
    /// Send `syt_interval` events or an empty packet
    #[default]
    BlockingEmpty,
    /// Send `syt_interval` events or `syt_interval` dummy events tagged NO-DATA
    BlockingNoData,
    /// Send as many events as are ready each cycle
    NonBlocking,
}

impl TransmissionMode {
    /// Whether packets always carry either zero or `syt_interval` events
    #[must_use]
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::BlockingEmpty | Self::BlockingNoData)
    }
}

/// Outcome of one cycle of the timing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipCycle {
    /// Header to put at the start of the packet
    pub header: CipHeader,
    /// Real events the packet must carry
    pub events: usize,
}

/// CIP timing state for one stream
///
/// Tracks how many events are ready each cycle and which of them carries
/// the presentation timestamp.
#[derive(Debug, Clone)]
pub struct CipState {
    rate: u32,
    format: CipFormat,
    fdf: u8,
    mode: TransmissionMode,
    dbs: u8,
    dbc: u8,
    syt_interval: u32,
    cycle_count: i64,
    samples_per_cycle: Fraction,
    ready_samples: Fraction,
    cycle_offset: Fraction,
    ticks_per_syt_offset: Fraction,
}

impl CipState {
    /// Initialise timing for a stream of `rate` events per second
    ///
    /// The mode starts as [`TransmissionMode::BlockingEmpty`] and dbc at 0.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `rate` or `syt_interval` is zero.
    pub fn new(format: CipFormat, fdf: u8, rate: u32, dbs: u8, syt_interval: u32) -> Result<Self> {
        if rate == 0 {
            return Err(StreamError::invalid_parameter("rate", "must be positive"));
        }
        if syt_interval == 0 {
            return Err(StreamError::invalid_parameter(
                "syt_interval",
                "must be positive",
            ));
        }

        let rate_i = i64::from(rate);
        Ok(Self {
            rate,
            format,
            fdf,
            mode: TransmissionMode::default(),
            dbs,
            dbc: 0,
            syt_interval,
            cycle_count: TRANSFER_DELAY / TICKS_PER_CYCLE,
            samples_per_cycle: Fraction::new(rate_i, i64::from(CYCLES_PER_SECOND)),
            ready_samples: Fraction::new(0, i64::from(CYCLES_PER_SECOND)),
            cycle_offset: Fraction::new((TRANSFER_DELAY % TICKS_PER_CYCLE) * rate_i, rate_i),
            ticks_per_syt_offset: Fraction::new(
                TICKS_PER_SECOND * i64::from(syt_interval),
                rate_i,
            ),
        })
    }

    /// Change how empty cycles are filled
    pub fn set_transmission_mode(&mut self, mode: TransmissionMode) {
        self.mode = mode;
    }

    /// Current transmission mode
    #[must_use]
    pub fn transmission_mode(&self) -> TransmissionMode {
        self.mode
    }

    /// Nominal events per second
    #[must_use]
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Format code
    #[must_use]
    pub fn format(&self) -> CipFormat {
        self.format
    }

    /// Format dependent field used for data packets
    #[must_use]
    pub fn fdf(&self) -> u8 {
        self.fdf
    }

    /// Data block size in quadlets
    #[must_use]
    pub fn dbs(&self) -> u8 {
        self.dbs
    }

    /// Data block counter of the next packet
    #[must_use]
    pub fn dbc(&self) -> u8 {
        self.dbc
    }

    /// Events between timestamps
    #[must_use]
    pub fn syt_interval(&self) -> u32 {
        self.syt_interval
    }

    /// Events per cycle as an exact fraction
    #[must_use]
    pub fn samples_per_cycle(&self) -> Fraction {
        self.samples_per_cycle
    }

    /// Events carried over to the next cycle
    #[must_use]
    pub fn ready_samples(&self) -> Fraction {
        self.ready_samples
    }

    /// Largest packet this stream produces, CIP header included
    #[must_use]
    pub fn max_packet_size(&self) -> usize {
        let max_events = if self.mode.is_blocking() {
            self.syt_interval as usize
        } else {
            usize::try_from(self.samples_per_cycle.ceil()).unwrap_or(0)
        };
        max_events * usize::from(self.dbs) * 4 + CipHeader::SIZE
    }

    /// Advance one cycle and produce its header
    ///
    /// `node_id` is read per packet since it changes on bus reset.
    pub fn fill_header(&mut self, node_id: u16) -> CipCycle {
        let syt_interval = i64::from(self.syt_interval);
        let next = self.ready_samples.add(&self.samples_per_cycle);

        let events = if self.mode.is_blocking() {
            if next.floor() >= syt_interval {
                syt_interval
            } else {
                0
            }
        } else {
            next.floor()
        };

        // NO-DATA packets still advance dbc by a full interval
        let events_dbc = if self.mode == TransmissionMode::BlockingNoData {
            syt_interval
        } else {
            events
        };

        self.ready_samples = next.sub_integer(events);

        let syt_index = (syt_interval - i64::from(self.dbc)).rem_euclid(syt_interval);
        let syt = if syt_index < events {
            let syt = ((self.cycle_count << 12) | self.cycle_offset.floor()) & 0xffff;
            self.cycle_offset.add_assign(&self.ticks_per_syt_offset);
            // only the low nibble of cycle_count reaches the wire
            self.cycle_count =
                (self.cycle_count + self.cycle_offset.wrap_integer(TICKS_PER_CYCLE)) & 0x0f;
            syt as u16
        } else {
            SYT_NO_INFO
        };

        let fdf = if events == 0 && self.mode == TransmissionMode::BlockingNoData {
            FDF_NO_DATA
        } else {
            self.fdf
        };

        let header = CipHeader {
            eoh0: 0,
            sid: (node_id & 0x3f) as u8,
            dbs: self.dbs,
            fn_: 0,
            qpc: 0,
            sph: false,
            reserved: 0,
            dbc: self.dbc,
            eoh1: 2,
            fmt: self.format.code(),
            fdf,
            syt,
        };

        self.dbc = self.dbc.wrapping_add(events_dbc as u8);
        trace!(events, dbc = header.dbc, syt = header.syt, "CIP cycle");

        CipCycle {
            header,
            events: usize::try_from(events).unwrap_or(0),
        }
    }
}

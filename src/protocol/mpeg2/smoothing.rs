//! PCR-locked transport stream smoothing
//!
//! The buffer reads ahead until it has seen `smooth_interval` PCRs of the
//! selected program, then sends the packets in that window spread evenly
//! over the bus cycles the PCRs say they span. 27 MHz divided by 8000
//! cycles per second is exactly 3375 ticks per cycle, so the rate
//! `n_packets * 3375 / delta_pcr` packets per cycle is exact and is
//! realised with an integer num/denom accumulator.

use byteorder::{BigEndian, ByteOrder};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::queue::LookaheadQueue;
use super::ts::{PCR_HZ, TsPacket, pcr_delta};
use super::{TS_PACKET_SIZE, TSP_SIZE, TsSource};
use crate::bus::CYCLES_PER_SECOND;
use crate::error::{Result, StreamError};
use crate::protocol::cip::CipHeader;

/// PCR ticks per bus cycle
pub const PCR_TICKS_PER_CYCLE: u64 = PCR_HZ / CYCLES_PER_SECOND as u64;

/// Sub-cycle offset between source packets sent in the same cycle
const SPH_OFFSET_STEP: u32 = 1000;

/// Tunables of the smoothing buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TsBufferOptions {
    /// PCRs averaged per rate estimate (default: 5)
    pub smooth_interval: usize,

    /// Packets read looking for a PCR before giving up (default: 20000)
    pub max_lookahead: usize,

    /// Cycles of transmission delay stamped into source packet headers (default: 7)
    pub syt_offset: u32,

    /// Re-synchronise when the estimated PCR drifts more than a second
    pub drift_correction: bool,

    /// Seconds between drift checks (default: 1)
    pub drift_interval_secs: u32,
}

impl Default for TsBufferOptions {
    fn default() -> Self {
        Self {
            smooth_interval: 5,
            max_lookahead: 20000,
            syt_offset: 7,
            drift_correction: cfg!(feature = "pcr-drift-correction"),
            drift_interval_secs: 1,
        }
    }
}

/// Packets per cycle as `whole + num / denom`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TspRate {
    /// Packets sent every cycle
    pub whole: u64,
    /// Numerator of the fractional part
    pub num: u64,
    /// Denominator of the fractional part (the window's PCR delta)
    pub denom: u64,
}

/// Lookahead window the current rate was computed from
#[derive(Debug, Clone, Copy, Default)]
struct Window {
    start_pcr: u64,
    packets: u64,
    delta_pcr: u64,
    sent: u64,
    /// Packets of earlier windows still queued when this one was read
    backlog: u64,
}

/// Source packet header: 13-bit cycle count, 12-bit cycle offset
#[must_use]
pub fn make_sph(cycle_count: u32, cycle_offset: u32) -> u32 {
    ((cycle_count & 0x1fff) << 12) | (cycle_offset & 0xfff)
}

/// Smoothing buffer between a [`TsSource`] and the bus
pub struct TsBuffer<S> {
    source: S,
    options: TsBufferOptions,
    queue: LookaheadQueue<TsPacket>,
    dropped: u32,
    selected_pid: Option<u16>,
    primed: bool,

    last_pcr: u64,
    window: Window,
    rate: TspRate,
    accum: u64,

    drift_ref: Option<u64>,
    drift_cycles: u64,

    iso_counter: u32,
    underflows: u64,
}

impl<S: TsSource> TsBuffer<S> {
    /// Create an unprimed buffer; nothing is read until [`TsBuffer::prime`]
    pub fn new(source: S, options: TsBufferOptions) -> Self {
        Self {
            source,
            options,
            queue: LookaheadQueue::with_capacity(options.max_lookahead),
            dropped: 0,
            selected_pid: None,
            primed: false,
            last_pcr: 0,
            window: Window::default(),
            rate: TspRate::default(),
            accum: 0,
            drift_ref: None,
            drift_cycles: 0,
            iso_counter: 0,
            underflows: 0,
        }
    }

    /// Create a buffer and prime it on `pid`
    ///
    /// # Errors
    ///
    /// Returns the first error raised while looking for PCRs.
    pub fn primed(source: S, pid: Option<u16>, options: TsBufferOptions) -> Result<Self> {
        let mut buffer = Self::new(source, options);
        buffer.prime(pid)?;
        Ok(buffer)
    }

    /// Skip to the first PCR of `pid` (`None` selects the first PID seen),
    /// then read the first lookahead window
    ///
    /// # Errors
    ///
    /// Returns `PcrNotFound` if no PCR appears within the lookahead bound,
    /// or the source's error.
    pub fn prime(&mut self, pid: Option<u16>) -> Result<()> {
        self.reset();
        self.selected_pid = pid;
        self.bootstrap()?;
        self.refill()?;
        self.top_up()?;
        self.primed = true;
        Ok(())
    }

    /// Forget all buffered packets and timing state
    pub fn reset(&mut self) {
        self.queue.clear();
        self.primed = false;
        self.last_pcr = 0;
        self.window = Window::default();
        self.rate = TspRate::default();
        self.accum = 0;
        self.drift_ref = None;
        self.drift_cycles = 0;
        self.iso_counter = 0;
        self.underflows = 0;
    }

    /// Whether [`TsBuffer::prime`] has succeeded since the last reset
    #[must_use]
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Change the program whose PCRs drive the rate
    pub fn set_pid(&mut self, pid: Option<u16>) {
        self.selected_pid = pid;
    }

    /// Program whose PCRs drive the rate
    #[must_use]
    pub fn pid(&self) -> Option<u16> {
        self.selected_pid
    }

    /// Current transmission rate
    #[must_use]
    pub fn rate(&self) -> TspRate {
        self.rate
    }

    /// Packets waiting to be sent
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Cycles on which the queue held fewer packets than the rate called for
    #[must_use]
    pub fn underflows(&self) -> u64 {
        self.underflows
    }

    /// Tunables
    #[must_use]
    pub fn options(&self) -> &TsBufferOptions {
        &self.options
    }

    /// Packet source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Packet source, mutably
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn read_ts(&mut self) -> Result<()> {
        let mut data = BytesMut::zeroed(TS_PACKET_SIZE);
        self.source.read(&mut data, 1, self.dropped)?;
        // only the first read after a drop reports it
        self.dropped = 0;
        self.queue.push_back(TsPacket::new(data.freeze())?);
        Ok(())
    }

    fn read_to_next_pcr(&mut self) -> Result<u64> {
        for _ in 0..=self.options.max_lookahead {
            self.read_ts()?;
            let Some(back) = self.queue.back() else {
                continue;
            };
            if self.selected_pid.is_none() {
                let pid = back.pid();
                debug!(pid, "Selected PCR PID");
                self.selected_pid = Some(pid);
            }
            if back.has_pcr(self.selected_pid) {
                return Ok(back.pcr_field());
            }
        }

        warn!(
            lookahead = self.options.max_lookahead,
            "No PCR found; reduce smooth_interval or raise max_lookahead"
        );
        Err(StreamError::PcrNotFound {
            lookahead: self.options.max_lookahead,
        })
    }

    /// Establish the baseline PCR and drop everything before it
    fn bootstrap(&mut self) -> Result<()> {
        self.last_pcr = self.read_to_next_pcr()?;
        self.queue.clear();
        Ok(())
    }

    /// Append the next lookahead window and recompute the rate
    ///
    /// The rate counts only the packets read here, from the one after the
    /// previous window's last PCR up to and including this window's last PCR.
    fn refill(&mut self) -> Result<()> {
        let backlog = self.queue.len();
        let mut pcr = self.last_pcr;
        for _ in 0..self.options.smooth_interval {
            pcr = self.read_to_next_pcr()?;
        }

        let packets = self.queue.len() - backlog;
        let delta_pcr = pcr_delta(self.last_pcr, pcr);
        if delta_pcr == 0 {
            return Err(StreamError::PcrStalled { packets });
        }

        if self.drift_ref.is_none() {
            self.drift_ref = Some(self.last_pcr);
            self.drift_cycles = 0;
        }

        let num = packets as u64 * PCR_TICKS_PER_CYCLE;
        // the accumulator carries over between windows
        self.rate = TspRate {
            whole: num / delta_pcr,
            num: num % delta_pcr,
            denom: delta_pcr,
        };
        self.window = Window {
            start_pcr: self.last_pcr,
            packets: packets as u64,
            delta_pcr,
            sent: 0,
            backlog: backlog as u64,
        };
        debug!(
            pid = self.selected_pid,
            packets,
            backlog,
            pcr,
            delta_pcr,
            whole = self.rate.whole,
            num = self.rate.num,
            denom = self.rate.denom,
            "Recomputed transport packet rate"
        );

        self.last_pcr = pcr;
        Ok(())
    }

    /// Estimated PCR of the next packet minus the PCR real time says it
    /// should have, in 27 MHz ticks
    ///
    /// `None` until a drift reference has been taken.
    #[must_use]
    pub fn drift(&self) -> Option<i64> {
        self.drift_at(self.drift_cycles)
    }

    fn drift_at(&self, cycles: u64) -> Option<i64> {
        let reference = self.drift_ref?;
        let window = &self.window;
        // packets still queued from earlier windows sit before the window start
        let progress = if window.packets == 0 {
            0
        } else {
            (i128::from(window.sent) - i128::from(window.backlog)) * i128::from(window.delta_pcr)
                / i128::from(window.packets)
        };
        let estimated = i128::from(pcr_delta(reference, window.start_pcr)) + progress;
        let elapsed = i128::from(cycles) * i128::from(PCR_TICKS_PER_CYCLE);
        i64::try_from(estimated - elapsed).ok()
    }

    /// Packets the next cycle may call for
    fn max_tsps(&self) -> usize {
        usize::try_from(self.rate.whole + u64::from(self.rate.num > 0)).unwrap_or(usize::MAX)
    }

    /// Read further windows until the queue covers the busiest next cycle
    fn top_up(&mut self) -> Result<()> {
        while self.queue.len() < self.max_tsps() {
            self.refill()?;
        }
        Ok(())
    }

    /// Packets to send this cycle and the accumulator value after sending them
    fn next_step(&self) -> (usize, u64) {
        let rate = self.rate;
        let (n, accum) = if self.accum > rate.denom - rate.num {
            (rate.whole + 1, self.accum - (rate.denom - rate.num))
        } else {
            (rate.whole, self.accum + rate.num)
        };
        (usize::try_from(n).unwrap_or(usize::MAX), accum)
    }

    /// Compare the estimated PCR with elapsed cycles at each check interval,
    /// re-synchronising when correction is enabled and the drift exceeds a second
    fn check_drift(&mut self) -> Result<()> {
        if self.drift_ref.is_none() {
            return Ok(());
        }
        let cycles = self.drift_cycles + 1;
        let interval =
            u64::from(self.options.drift_interval_secs.max(1)) * u64::from(CYCLES_PER_SECOND);
        if cycles % interval != 0 {
            return Ok(());
        }

        let Some(drift) = self.drift_at(cycles) else {
            return Ok(());
        };
        trace!(
            drift,
            seconds = cycles / u64::from(CYCLES_PER_SECOND),
            "PCR drift"
        );

        if !self.options.drift_correction || drift.unsigned_abs() <= PCR_HZ {
            return Ok(());
        }

        warn!(correction = -drift, "Applying PCR drift correction");
        self.drift_ref = None;
        self.drift_cycles = 0;
        self.accum = 0;
        self.queue.clear();
        self.bootstrap()?;
        self.refill()?;
        self.top_up()
    }

    /// Write one bus cycle's packet into `data` and return its length
    ///
    /// The packet is a CIP header followed by zero or more 192-byte source
    /// packets, each a 4-byte source packet header and a transport packet.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the buffer is not primed, `BufferTooSmall`
    /// if `data` cannot hold this cycle's packets, or any error raised while
    /// reading ahead. `BufferTooSmall` leaves the pacing state untouched.
    pub fn send_iso_cycle(
        &mut self,
        data: &mut [u8],
        iso_cycle: u32,
        node_id: u8,
        dropped: u32,
    ) -> Result<usize> {
        if !self.primed {
            return Err(StreamError::invalid_state("smoothing buffer is not primed"));
        }
        self.dropped = self.dropped.saturating_add(dropped);

        self.check_drift()?;
        let (n_tsps, accum) = self.next_step();
        let len = CipHeader::SIZE + n_tsps * TSP_SIZE;
        if data.len() < len {
            return Err(StreamError::BufferTooSmall {
                needed: len,
                have: data.len(),
            });
        }

        self.accum = accum;
        if self.drift_ref.is_some() {
            self.drift_cycles += 1;
        }
        if n_tsps > self.queue.len() {
            self.underflows += 1;
            while n_tsps > self.queue.len() {
                self.refill()?;
            }
        }

        data[..CipHeader::SIZE].copy_from_slice(&[
            node_id,
            0x06,
            0xc4,
            self.iso_counter as u8,
            0xa0,
            0x80,
            0x00,
            0x00,
        ]);

        let cycle_count = (iso_cycle + self.options.syt_offset) % CYCLES_PER_SECOND;
        for (i, chunk) in (0u32..).zip(data[CipHeader::SIZE..len].chunks_exact_mut(TSP_SIZE)) {
            let Some(packet) = self.queue.pop_front() else {
                return Err(StreamError::SourceExhausted);
            };
            BigEndian::write_u32(&mut chunk[..4], make_sph(cycle_count, SPH_OFFSET_STEP * i));
            chunk[4..].copy_from_slice(packet.as_bytes());
            self.window.sent += 1;
        }
        trace!(cycle = iso_cycle, tsps = n_tsps, queued = self.queue.len(), "MPEG-2 cycle");

        self.top_up()?;

        self.iso_counter = self.iso_counter.wrapping_add(8 * n_tsps as u32);
        Ok(len)
    }
}

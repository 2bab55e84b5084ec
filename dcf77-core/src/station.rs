//! Top-level assembly of the time keeping side.
//!
//! [`TimeKeeper`] wires the status controller, the local clock, and a
//! [`StatusSink`] together. Callers feed it the three things that happen to
//! a receiver (a symbol, a minute marker with its frame, a watchdog expiry)
//! plus clock ticks, and it publishes the resulting events.

use crate::clock::{ClockSnapshot, LocalClock};
use crate::config::ReceiverConfig;
use crate::decoder::{DecodeError, TimeSample, decode};
use crate::frame::{Frame, SymbolReport};
use crate::sink::{StatusSink, publish};
use crate::status::StatusController;

/// Status controller, clock, and sink behind one set of entry points.
#[derive(Debug)]
pub struct TimeKeeper<S> {
    config: ReceiverConfig,
    status: StatusController,
    clock: LocalClock,
    sink: S,
}

impl<S: StatusSink> TimeKeeper<S> {
    /// `start_ms` anchors the first drift measurement.
    #[must_use]
    pub const fn new(config: ReceiverConfig, start_ms: u64, sink: S) -> Self {
        Self {
            status: StatusController::new(),
            clock: LocalClock::new(&config, start_ms),
            config,
            sink,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    #[must_use]
    pub const fn status(&self) -> &StatusController {
        &self.status
    }

    #[must_use]
    pub const fn clock(&self) -> &LocalClock {
        &self.clock
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// A symbol was appended to the live frame.
    pub fn symbol_received(&mut self, report: SymbolReport) {
        let changes = self.status.signal_received();
        publish(&mut self.sink, changes);
        self.sink.on_symbol(Some(report));
    }

    /// The watchdog bound expired without an edge.
    pub fn signal_timeout(&mut self) {
        let changes = self.status.timeout();
        publish(&mut self.sink, changes);
        self.sink.on_symbol(None);
    }

    /// Validates a frame closed by a minute marker and realigns the clock.
    ///
    /// A valid frame resynchronises the calendar. Any failure still moves the
    /// clock onto the new minute so the display keeps running.
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] that rejected `frame`. The failure has
    /// already been reported to the sink.
    pub fn minute_complete(&mut self, frame: &Frame) -> Result<TimeSample, DecodeError> {
        let outcome = decode(frame, &self.config);
        let (changes, snapshot) = match outcome {
            Ok(sample) => (self.status.frame_ok(), self.clock.resync(&sample)),
            Err(DecodeError::Incomplete { length }) => (
                self.status.frame_incomplete(length),
                self.clock.start_new_minute(),
            ),
            Err(DecodeError::Parity(_)) => (
                self.status.frame_parity_error(),
                self.clock.start_new_minute(),
            ),
        };

        publish(&mut self.sink, changes);
        self.sink.on_time_tick(&snapshot);
        outcome
    }

    /// Advances the clock by one second. Returns the sleep before the next tick.
    pub fn tick(&mut self, now_ms: u64) -> u32 {
        let tick = self.clock.tick(now_ms);
        self.sink.on_time_tick(&tick.snapshot);
        tick.next_delay_ms
    }

    #[must_use]
    pub const fn snapshot(&self) -> ClockSnapshot {
        self.clock.calendar()
    }
}

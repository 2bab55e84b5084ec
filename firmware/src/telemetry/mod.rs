//! Status sink and logging helpers.
//!
//! [`LogSink`] is the firmware's [`StatusSink`]: every event is stored in the
//! status atomics for the display and mirrored to defmt on target, or stdout
//! on the host, with a `dcf77:<subsystem>` prefix.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use dcf77_core::clock::ClockSnapshot;
use dcf77_core::decoder::{DecodeError, TimeSample};
use dcf77_core::frame::SymbolReport;
use dcf77_core::sink::StatusSink;
use dcf77_core::status::{SignalHealth, SyncCause, TimeSyncHealth};

use crate::status::StatusBoard;

/// Records and logs every status event.
pub struct LogSink {
    board: &'static StatusBoard,
    ticks: u32,
}

impl LogSink {
    pub const fn new(board: &'static StatusBoard) -> Self {
        Self { board, ticks: 0 }
    }

    /// Ticks seen since boot.
    pub const fn ticks(&self) -> u32 {
        self.ticks
    }
}

impl StatusSink for LogSink {
    fn on_signal_health(&mut self, health: SignalHealth) {
        self.board.record_signal_health(health);
        emit_signal(health.label());
    }

    fn on_time_sync_health(
        &mut self,
        health: TimeSyncHealth,
        cause: SyncCause,
        diagnostic: Option<usize>,
    ) {
        self.board.record_time_sync_health(health);
        let reason = health.failure_reason().map(|reason| reason.label());
        emit_sync(health.label(), reason, cause.label(), diagnostic);
    }

    fn on_symbol(&mut self, report: Option<SymbolReport>) {
        self.board.record_symbol(report);
        if let Some(report) = report {
            emit_symbol(report.rank, report.symbol.as_char());
        }
    }

    fn on_time_tick(&mut self, snapshot: &ClockSnapshot) {
        self.ticks = self.ticks.wrapping_add(1);
        self.board.record_calendar(snapshot);
        emit_tick(snapshot);
    }
}

/// Logs the outcome of a decode attempt with its detail.
pub fn log_decode(outcome: &Result<TimeSample, DecodeError>) {
    match outcome {
        Ok(sample) => emit_decoded(sample),
        Err(error) => emit_decode_error(error),
    }
}

/// A frame was overwritten before the decoder collected it.
pub fn log_frame_dropped(length: usize) {
    emit_frame_dropped(length);
}

#[cfg(target_os = "none")]
fn emit_signal(health: &'static str) {
    defmt::info!("dcf77:signal {}", health);
}

#[cfg(not(target_os = "none"))]
fn emit_signal(health: &'static str) {
    println!("dcf77:signal {health}");
}

#[cfg(target_os = "none")]
fn emit_sync(
    health: &'static str,
    reason: Option<&'static str>,
    cause: &'static str,
    diagnostic: Option<usize>,
) {
    match (reason, diagnostic) {
        (Some(reason), Some(length)) => {
            defmt::warn!("dcf77:sync {} ({}) cause={} size={}", health, reason, cause, length);
        }
        (Some(reason), None) => defmt::warn!("dcf77:sync {} ({}) cause={}", health, reason, cause),
        (None, _) => defmt::info!("dcf77:sync {} cause={}", health, cause),
    }
}

#[cfg(not(target_os = "none"))]
fn emit_sync(
    health: &'static str,
    reason: Option<&'static str>,
    cause: &'static str,
    diagnostic: Option<usize>,
) {
    match (reason, diagnostic) {
        (Some(reason), Some(length)) => {
            println!("dcf77:sync {health} ({reason}) cause={cause} size={length}");
        }
        (Some(reason), None) => println!("dcf77:sync {health} ({reason}) cause={cause}"),
        (None, _) => println!("dcf77:sync {health} cause={cause}"),
    }
}

#[cfg(target_os = "none")]
fn emit_symbol(rank: usize, symbol: char) {
    defmt::debug!("dcf77:edge #{} {}", rank, symbol);
}

#[cfg(not(target_os = "none"))]
fn emit_symbol(rank: usize, symbol: char) {
    println!("dcf77:edge #{rank} {symbol}");
}

#[cfg(target_os = "none")]
fn emit_tick(snapshot: &ClockSnapshot) {
    defmt::debug!("dcf77:clock {}", defmt::Display2Format(snapshot));
}

#[cfg(not(target_os = "none"))]
fn emit_tick(snapshot: &ClockSnapshot) {
    println!("dcf77:clock {snapshot}");
}

#[cfg(target_os = "none")]
fn emit_decoded(sample: &TimeSample) {
    defmt::info!(
        "dcf77:sync decoded year={} month={} day={} {}:{} {}",
        sample.year,
        sample.month,
        sample.day,
        sample.hour,
        sample.minute,
        sample.time_zone().label()
    );
}

#[cfg(not(target_os = "none"))]
fn emit_decoded(sample: &TimeSample) {
    println!(
        "dcf77:sync decoded year={} month={} day={} {}:{} {}",
        sample.year,
        sample.month,
        sample.day,
        sample.hour,
        sample.minute,
        sample.time_zone().label()
    );
}

#[cfg(target_os = "none")]
fn emit_decode_error(error: &DecodeError) {
    defmt::warn!("dcf77:sync rejected: {}", defmt::Display2Format(error));
}

#[cfg(not(target_os = "none"))]
fn emit_decode_error(error: &DecodeError) {
    println!("dcf77:sync rejected: {error}");
}

#[cfg(target_os = "none")]
fn emit_frame_dropped(length: usize) {
    defmt::warn!("dcf77:edge frame of {} symbols dropped before decode", length);
}

#[cfg(not(target_os = "none"))]
fn emit_frame_dropped(length: usize) {
    println!("dcf77:edge frame of {length} symbols dropped before decode");
}

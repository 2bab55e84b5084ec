#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! Lightweight atomics keep the latest signal health and time-sync health
//! along with the last symbol and the calendar, so a display can build a
//! [`StatusSnapshot`] without locking the time keeper.

use dcf77_core::classifier::{Bit, Symbol};
use dcf77_core::clock::{Calendar, ClockSnapshot};
use dcf77_core::frame::SymbolReport;
use dcf77_core::status::{FailureReason, SignalHealth, TimeSyncHealth};
use portable_atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};

const NO_SYMBOL: u32 = 0;

/// Board read by the display.
pub static STATUS: StatusBoard = StatusBoard::new();

/// Everything a display needs for one refresh.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusSnapshot {
    pub signal: SignalHealth,
    pub time_sync: TimeSyncHealth,
    pub last_symbol: Option<SymbolReport>,
    pub calendar: ClockSnapshot,
}

const fn signal_code(health: SignalHealth) -> u8 {
    match health {
        SignalHealth::Init => 0,
        SignalHealth::Ok => 1,
        SignalHealth::Late => 2,
        SignalHealth::Lost => 3,
    }
}

const fn signal_from_code(code: u8) -> SignalHealth {
    match code {
        1 => SignalHealth::Ok,
        2 => SignalHealth::Late,
        3 => SignalHealth::Lost,
        _ => SignalHealth::Init,
    }
}

const fn time_sync_code(health: TimeSyncHealth) -> u8 {
    match health {
        TimeSyncHealth::Init => 0,
        TimeSyncHealth::OutOfSync => 1,
        TimeSyncHealth::InProgress => 2,
        TimeSyncHealth::Failed(FailureReason::ParityError) => 3,
        TimeSyncHealth::Failed(FailureReason::IncompleteFrame) => 4,
        TimeSyncHealth::Synced => 5,
    }
}

const fn time_sync_from_code(code: u8) -> TimeSyncHealth {
    match code {
        1 => TimeSyncHealth::OutOfSync,
        2 => TimeSyncHealth::InProgress,
        3 => TimeSyncHealth::Failed(FailureReason::ParityError),
        4 => TimeSyncHealth::Failed(FailureReason::IncompleteFrame),
        5 => TimeSyncHealth::Synced,
        _ => TimeSyncHealth::Init,
    }
}

fn encode_symbol(report: Option<SymbolReport>) -> u32 {
    let Some(report) = report else {
        return NO_SYMBOL;
    };
    let symbol = match report.symbol {
        Symbol::Data(Bit::Zero) => 0,
        Symbol::Data(Bit::One) => 1,
        Symbol::EndOfMinute => 2,
    };
    let rank = u32::try_from(report.rank).unwrap_or(u32::MAX >> 3);
    (rank.saturating_add(1) << 2) | symbol
}

fn decode_symbol(raw: u32) -> Option<SymbolReport> {
    if raw == NO_SYMBOL {
        return None;
    }
    let symbol = match raw & 0b11 {
        0 => Symbol::ZERO,
        1 => Symbol::ONE,
        _ => Symbol::EndOfMinute,
    };
    let rank = usize::try_from((raw >> 2) - 1).ok()?;
    Some(SymbolReport { rank, symbol })
}

fn pack_calendar(calendar: &Calendar) -> u64 {
    u64::from_le_bytes([
        calendar.year,
        calendar.month,
        calendar.day,
        calendar.weekday,
        calendar.hour,
        calendar.minute,
        calendar.second,
        calendar.timezone_code,
    ])
}

fn unpack_calendar(raw: u64) -> Calendar {
    let [year, month, day, weekday, hour, minute, second, timezone_code] = raw.to_le_bytes();
    Calendar {
        year,
        month,
        day,
        weekday,
        hour,
        minute,
        second,
        timezone_code,
    }
}

/// Latest status values, one atomic per field.
pub struct StatusBoard {
    /// Encoded [`SignalHealth`].
    signal: AtomicU8,
    /// Encoded [`TimeSyncHealth`].
    time_sync: AtomicU8,
    /// `(rank + 1) << 2 | symbol`, 0 == nothing to show.
    last_symbol: AtomicU32,
    /// Calendar fields packed one per byte.
    calendar: AtomicU64,
}

impl StatusBoard {
    pub const fn new() -> Self {
        Self {
            signal: AtomicU8::new(0),
            time_sync: AtomicU8::new(0),
            last_symbol: AtomicU32::new(NO_SYMBOL),
            calendar: AtomicU64::new(0),
        }
    }

    pub fn record_signal_health(&self, health: SignalHealth) {
        self.signal.store(signal_code(health), Ordering::Relaxed);
    }

    pub fn record_time_sync_health(&self, health: TimeSyncHealth) {
        self.time_sync.store(time_sync_code(health), Ordering::Relaxed);
    }

    /// Stores the last symbol; `None` clears it.
    pub fn record_symbol(&self, report: Option<SymbolReport>) {
        self.last_symbol.store(encode_symbol(report), Ordering::Relaxed);
    }

    pub fn record_calendar(&self, calendar: &Calendar) {
        self.calendar.store(pack_calendar(calendar), Ordering::Relaxed);
    }

    /// Builds a [`StatusSnapshot`] from the stored values.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            signal: signal_from_code(self.signal.load(Ordering::Relaxed)),
            time_sync: time_sync_from_code(self.time_sync.load(Ordering::Relaxed)),
            last_symbol: decode_symbol(self.last_symbol.load(Ordering::Relaxed)),
            calendar: unpack_calendar(self.calendar.load(Ordering::Relaxed)),
        }
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_values() {
        let calendar = Calendar {
            year: 26,
            month: 10,
            day: 18,
            weekday: 7,
            hour: 21,
            minute: 4,
            second: 33,
            timezone_code: 1,
        };
        let report = SymbolReport {
            rank: 59,
            symbol: Symbol::EndOfMinute,
        };

        let board = StatusBoard::new();
        assert_eq!(board.snapshot().signal, SignalHealth::Init);

        board.record_signal_health(SignalHealth::Late);
        board.record_time_sync_health(TimeSyncHealth::Failed(FailureReason::IncompleteFrame));
        board.record_symbol(Some(report));
        board.record_calendar(&calendar);

        let snapshot = board.snapshot();
        assert_eq!(snapshot.signal, SignalHealth::Late);
        assert_eq!(
            snapshot.time_sync,
            TimeSyncHealth::Failed(FailureReason::IncompleteFrame)
        );
        assert_eq!(snapshot.last_symbol, Some(report));
        assert_eq!(snapshot.calendar, calendar);

        board.record_symbol(None);
        assert_eq!(board.snapshot().last_symbol, None);
    }

    #[test]
    fn symbol_encoding_keeps_rank_zero_distinct_from_empty() {
        let first = SymbolReport {
            rank: 0,
            symbol: Symbol::ZERO,
        };
        assert_ne!(encode_symbol(Some(first)), NO_SYMBOL);
        assert_eq!(decode_symbol(encode_symbol(Some(first))), Some(first));
    }
}

//! Consumer side of the pipeline.
//!
//! The core never renders anything. It pushes health transitions, the last
//! received symbol, and the running calendar into a [`StatusSink`]. An
//! implementation must return promptly; it runs on the caller's task.

use crate::clock::ClockSnapshot;
use crate::frame::SymbolReport;
use crate::status::{SignalHealth, StatusChange, SyncCause, TimeSyncHealth};

/// Receives status events from a [`crate::station::TimeKeeper`].
pub trait StatusSink {
    fn on_signal_health(&mut self, health: SignalHealth);

    /// `diagnostic` carries the observed frame length for incomplete frames.
    fn on_time_sync_health(
        &mut self,
        health: TimeSyncHealth,
        cause: SyncCause,
        diagnostic: Option<usize>,
    );

    /// `None` clears the last-symbol display after a timeout.
    fn on_symbol(&mut self, report: Option<SymbolReport>);

    fn on_time_tick(&mut self, snapshot: &ClockSnapshot);
}

impl<S: StatusSink + ?Sized> StatusSink for &mut S {
    fn on_signal_health(&mut self, health: SignalHealth) {
        (**self).on_signal_health(health);
    }

    fn on_time_sync_health(
        &mut self,
        health: TimeSyncHealth,
        cause: SyncCause,
        diagnostic: Option<usize>,
    ) {
        (**self).on_time_sync_health(health, cause, diagnostic);
    }

    fn on_symbol(&mut self, report: Option<SymbolReport>) {
        (**self).on_symbol(report);
    }

    fn on_time_tick(&mut self, snapshot: &ClockSnapshot) {
        (**self).on_time_tick(snapshot);
    }
}

/// Sink that discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSink;

impl StatusSink for NoopSink {
    fn on_signal_health(&mut self, _health: SignalHealth) {}

    fn on_time_sync_health(
        &mut self,
        _health: TimeSyncHealth,
        _cause: SyncCause,
        _diagnostic: Option<usize>,
    ) {
    }

    fn on_symbol(&mut self, _report: Option<SymbolReport>) {}

    fn on_time_tick(&mut self, _snapshot: &ClockSnapshot) {}
}

/// Forwards controller transitions to `sink` in the order they were made.
pub fn publish<S, I>(sink: &mut S, changes: I)
where
    S: StatusSink + ?Sized,
    I: IntoIterator<Item = StatusChange>,
{
    for change in changes {
        match change {
            StatusChange::Signal(health) => sink.on_signal_health(health),
            StatusChange::TimeSync(update) => {
                sink.on_time_sync_health(update.health, update.cause, update.diagnostic);
            }
        }
    }
}

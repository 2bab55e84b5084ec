//! Signal-reception and time-sync health tracking.
//!
//! Two enums, one controller. Each entry point applies the transition table
//! and returns the [`StatusChange`]s it made, in order, so the caller decides
//! how to publish them. The cross-effects between the two machines live in
//! [`StatusController::enter_out_of_sync`] and
//! [`StatusController::restart_sync`].
//!
//! | trigger              | signal health           | time-sync health                     |
//! |----------------------|-------------------------|--------------------------------------|
//! | `signal_received`    | → `Ok`                  | `OutOfSync` → `InProgress` first     |
//! | `timeout` from Late  | → `Lost`                | → `OutOfSync`                        |
//! | `timeout` from Lost  | stays `Lost`            | unchanged                            |
//! | `timeout` otherwise  | → `Late`                | unchanged                            |
//! | `frame_ok`           |                         | → `Synced`                           |
//! | `frame_incomplete`   |                         | → `Failed(IncompleteFrame)` → `InProgress` |
//! | `frame_parity_error` |                         | → `Failed(ParityError)` → `InProgress`     |

use core::fmt;

use heapless::Vec;

/// Health of the received signal.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignalHealth {
    Init,
    Ok,
    Late,
    Lost,
}

impl SignalHealth {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            SignalHealth::Init => "init",
            SignalHealth::Ok => "reception-ok",
            SignalHealth::Late => "late",
            SignalHealth::Lost => "lost",
        }
    }
}

impl fmt::Display for SignalHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a decode attempt failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FailureReason {
    ParityError,
    IncompleteFrame,
}

impl FailureReason {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            FailureReason::ParityError => "parity-error",
            FailureReason::IncompleteFrame => "incomplete-frame",
        }
    }
}

/// Health of the local clock relative to the broadcast time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimeSyncHealth {
    Init,
    OutOfSync,
    InProgress,
    Failed(FailureReason),
    Synced,
}

impl TimeSyncHealth {
    #[must_use]
    pub const fn failure_reason(self) -> Option<FailureReason> {
        match self {
            TimeSyncHealth::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            TimeSyncHealth::Init => "init",
            TimeSyncHealth::OutOfSync => "out-of-sync",
            TimeSyncHealth::InProgress => "sync-in-progress",
            TimeSyncHealth::Failed(_) => "sync-failed",
            TimeSyncHealth::Synced => "synced",
        }
    }
}

impl fmt::Display for TimeSyncHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSyncHealth::Failed(reason) => write!(f, "sync-failed({})", reason.label()),
            other => f.write_str(other.label()),
        }
    }
}

/// Event that drove a time-sync transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SyncCause {
    SignalLost,
    SignalReceived,
    FrameOk,
    ParityError,
    MissingData,
    Rearmed,
}

impl SyncCause {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            SyncCause::SignalLost => "signal-lost",
            SyncCause::SignalReceived => "signal-received",
            SyncCause::FrameOk => "frame-ok",
            SyncCause::ParityError => "frame-parity-error",
            SyncCause::MissingData => "missing-data",
            SyncCause::Rearmed => "rearmed",
        }
    }
}

/// Time-sync transition with its trigger and optional diagnostic.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimeSyncUpdate {
    pub health: TimeSyncHealth,
    pub cause: SyncCause,
    /// Observed frame length for incomplete frames.
    pub diagnostic: Option<usize>,
}

/// A single state change reported by [`StatusController`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusChange {
    Signal(SignalHealth),
    TimeSync(TimeSyncUpdate),
}

/// Largest number of changes a single trigger can produce.
pub const MAX_STATUS_CHANGES: usize = 2;

/// Ordered changes produced by one trigger.
pub type StatusChanges = Vec<StatusChange, MAX_STATUS_CHANGES>;

/// Owns both health machines.
#[derive(Clone, Debug)]
pub struct StatusController {
    signal: SignalHealth,
    time_sync: TimeSyncHealth,
}

impl StatusController {
    /// Both machines start in `Init`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            signal: SignalHealth::Init,
            time_sync: TimeSyncHealth::Init,
        }
    }

    #[must_use]
    pub const fn signal(&self) -> SignalHealth {
        self.signal
    }

    #[must_use]
    pub const fn time_sync(&self) -> TimeSyncHealth {
        self.time_sync
    }

    /// A symbol was appended to the live frame.
    pub fn signal_received(&mut self) -> StatusChanges {
        let mut changes = StatusChanges::new();
        if self.time_sync == TimeSyncHealth::OutOfSync {
            record(&mut changes, self.restart_sync());
        }
        record(&mut changes, self.set_signal(SignalHealth::Ok));
        changes
    }

    /// The watchdog saw no edge within its bound.
    pub fn timeout(&mut self) -> StatusChanges {
        let mut changes = StatusChanges::new();
        match self.signal {
            SignalHealth::Late => {
                record(&mut changes, self.set_signal(SignalHealth::Lost));
                record(&mut changes, self.enter_out_of_sync());
            }
            SignalHealth::Lost => {
                record(&mut changes, self.set_signal(SignalHealth::Lost));
            }
            SignalHealth::Init | SignalHealth::Ok => {
                record(&mut changes, self.set_signal(SignalHealth::Late));
            }
        }
        changes
    }

    /// A complete frame passed every check.
    ///
    /// Decode outcomes leave `OutOfSync` in place; only a received signal clears it.
    pub fn frame_ok(&mut self) -> StatusChanges {
        let mut changes = StatusChanges::new();
        if self.time_sync == TimeSyncHealth::OutOfSync {
            return changes;
        }
        record(
            &mut changes,
            self.set_time_sync(TimeSyncHealth::Synced, SyncCause::FrameOk, None),
        );
        changes
    }

    /// A minute marker closed a frame of the wrong length.
    pub fn frame_incomplete(&mut self, length: usize) -> StatusChanges {
        self.sync_failed(
            FailureReason::IncompleteFrame,
            SyncCause::MissingData,
            Some(length),
        )
    }

    /// A complete frame failed a marker or parity check.
    pub fn frame_parity_error(&mut self) -> StatusChanges {
        self.sync_failed(FailureReason::ParityError, SyncCause::ParityError, None)
    }

    /// Cross-effect of signal loss on the time-sync machine.
    pub fn enter_out_of_sync(&mut self) -> StatusChange {
        self.set_time_sync(TimeSyncHealth::OutOfSync, SyncCause::SignalLost, None)
    }

    /// Cross-effect of signal recovery on the time-sync machine.
    pub fn restart_sync(&mut self) -> StatusChange {
        self.set_time_sync(TimeSyncHealth::InProgress, SyncCause::SignalReceived, None)
    }

    fn sync_failed(
        &mut self,
        reason: FailureReason,
        cause: SyncCause,
        diagnostic: Option<usize>,
    ) -> StatusChanges {
        let mut changes = StatusChanges::new();
        if self.time_sync == TimeSyncHealth::OutOfSync {
            return changes;
        }
        record(
            &mut changes,
            self.set_time_sync(TimeSyncHealth::Failed(reason), cause, diagnostic),
        );
        record(
            &mut changes,
            self.set_time_sync(TimeSyncHealth::InProgress, SyncCause::Rearmed, None),
        );
        changes
    }

    fn set_signal(&mut self, health: SignalHealth) -> StatusChange {
        self.signal = health;
        StatusChange::Signal(health)
    }

    fn set_time_sync(
        &mut self,
        health: TimeSyncHealth,
        cause: SyncCause,
        diagnostic: Option<usize>,
    ) -> StatusChange {
        self.time_sync = health;
        StatusChange::TimeSync(TimeSyncUpdate {
            health,
            cause,
            diagnostic,
        })
    }
}

impl Default for StatusController {
    fn default() -> Self {
        Self::new()
    }
}

fn record(changes: &mut StatusChanges, change: StatusChange) {
    // Capacity matches the longest transition chain in the table above.
    let _ = changes.push(change);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_sync_changes(changes: &StatusChanges) -> usize {
        changes
            .iter()
            .filter(|change| matches!(change, StatusChange::TimeSync(_)))
            .count()
    }

    #[test]
    fn starts_in_init() {
        let status = StatusController::new();
        assert_eq!(status.signal(), SignalHealth::Init);
        assert_eq!(status.time_sync(), TimeSyncHealth::Init);
    }

    #[test]
    fn timeouts_escalate_late_then_lost() {
        let mut status = StatusController::new();
        status.signal_received();

        let changes = status.timeout();
        assert_eq!(status.signal(), SignalHealth::Late);
        assert_eq!(time_sync_changes(&changes), 0);

        let changes = status.timeout();
        assert_eq!(status.signal(), SignalHealth::Lost);
        assert_eq!(status.time_sync(), TimeSyncHealth::OutOfSync);
        assert_eq!(time_sync_changes(&changes), 1);

        let changes = status.timeout();
        assert_eq!(status.signal(), SignalHealth::Lost);
        assert_eq!(time_sync_changes(&changes), 0);
        assert_eq!(changes.as_slice(), &[StatusChange::Signal(SignalHealth::Lost)]);
    }

    #[test]
    fn init_signal_goes_late_on_first_timeout() {
        let mut status = StatusController::new();
        status.timeout();
        assert_eq!(status.signal(), SignalHealth::Late);
        assert_eq!(status.time_sync(), TimeSyncHealth::Init);
    }

    #[test]
    fn failures_rearm_to_in_progress() {
        let mut status = StatusController::new();

        let changes = status.frame_incomplete(37);
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0],
            StatusChange::TimeSync(TimeSyncUpdate {
                health: TimeSyncHealth::Failed(FailureReason::IncompleteFrame),
                cause: SyncCause::MissingData,
                diagnostic: Some(37),
            })
        );
        assert_eq!(status.time_sync(), TimeSyncHealth::InProgress);

        let changes = status.frame_parity_error();
        assert_eq!(
            changes[0],
            StatusChange::TimeSync(TimeSyncUpdate {
                health: TimeSyncHealth::Failed(FailureReason::ParityError),
                cause: SyncCause::ParityError,
                diagnostic: None,
            })
        );
        assert_eq!(status.time_sync(), TimeSyncHealth::InProgress);
    }

    #[test]
    fn frame_ok_synchronises() {
        let mut status = StatusController::new();
        status.frame_ok();
        assert_eq!(status.time_sync(), TimeSyncHealth::Synced);
        assert_eq!(status.time_sync().failure_reason(), None);
    }

    #[test]
    fn decoder_does_not_clear_out_of_sync_signal_does() {
        let mut status = StatusController::new();
        status.timeout();
        status.timeout();
        assert_eq!(status.time_sync(), TimeSyncHealth::OutOfSync);

        assert!(status.frame_ok().is_empty());
        assert!(status.frame_incomplete(12).is_empty());
        assert!(status.frame_parity_error().is_empty());
        assert_eq!(status.time_sync(), TimeSyncHealth::OutOfSync);

        let changes = status.signal_received();
        assert_eq!(
            changes.as_slice(),
            &[
                StatusChange::TimeSync(TimeSyncUpdate {
                    health: TimeSyncHealth::InProgress,
                    cause: SyncCause::SignalReceived,
                    diagnostic: None,
                }),
                StatusChange::Signal(SignalHealth::Ok),
            ]
        );
    }
}

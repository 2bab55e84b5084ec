use dcf77_core::status::{
    FailureReason, SignalHealth, StatusChange, StatusController, SyncCause, TimeSyncHealth,
    TimeSyncUpdate,
};

fn out_of_sync_count(changes: &[StatusChange]) -> usize {
    changes
        .iter()
        .filter(|change| {
            matches!(
                change,
                StatusChange::TimeSync(TimeSyncUpdate {
                    health: TimeSyncHealth::OutOfSync,
                    ..
                })
            )
        })
        .count()
}

#[test]
fn repeated_timeouts_from_late_go_out_of_sync_once() {
    let mut status = StatusController::new();
    status.signal_received();
    status.timeout();
    assert_eq!(status.signal(), SignalHealth::Late);

    let first = status.timeout();
    let second = status.timeout();

    assert_eq!(status.signal(), SignalHealth::Lost);
    assert_eq!(out_of_sync_count(&first), 1);
    assert_eq!(out_of_sync_count(&second), 0);
    assert_eq!(
        first[1],
        StatusChange::TimeSync(TimeSyncUpdate {
            health: TimeSyncHealth::OutOfSync,
            cause: SyncCause::SignalLost,
            diagnostic: None,
        })
    );
}

#[test]
fn recovery_restarts_sync_before_signal_ok() {
    let mut status = StatusController::new();
    for _ in 0..3 {
        status.timeout();
    }
    assert_eq!(status.time_sync(), TimeSyncHealth::OutOfSync);

    let changes = status.signal_received();
    assert!(matches!(
        changes[0],
        StatusChange::TimeSync(TimeSyncUpdate {
            health: TimeSyncHealth::InProgress,
            cause: SyncCause::SignalReceived,
            ..
        })
    ));
    assert_eq!(changes[1], StatusChange::Signal(SignalHealth::Ok));
    assert_eq!(status.time_sync(), TimeSyncHealth::InProgress);
}

#[test]
fn signal_received_outside_out_of_sync_leaves_time_sync_alone() {
    let mut status = StatusController::new();
    status.frame_ok();

    let changes = status.signal_received();
    assert_eq!(changes.as_slice(), &[StatusChange::Signal(SignalHealth::Ok)]);
    assert_eq!(status.time_sync(), TimeSyncHealth::Synced);
}

#[test]
fn decode_outcomes_do_not_clear_out_of_sync_signal_does() {
    let mut status = StatusController::new();
    status.timeout();
    status.timeout();
    assert_eq!(status.time_sync(), TimeSyncHealth::OutOfSync);

    assert!(status.frame_incomplete(4).is_empty());
    assert_eq!(status.time_sync(), TimeSyncHealth::OutOfSync);
    assert!(status.frame_parity_error().is_empty());
    assert_eq!(status.time_sync(), TimeSyncHealth::OutOfSync);
    assert!(status.frame_ok().is_empty());
    assert_eq!(status.time_sync(), TimeSyncHealth::OutOfSync);

    status.timeout();
    assert_eq!(status.signal(), SignalHealth::Lost);
    assert_eq!(status.time_sync(), TimeSyncHealth::OutOfSync);

    status.signal_received();
    assert_eq!(status.time_sync(), TimeSyncHealth::InProgress);
    status.frame_ok();
    assert_eq!(status.time_sync(), TimeSyncHealth::Synced);
}

#[test]
fn failure_is_visible_before_rearming() {
    let mut status = StatusController::new();
    let changes = status.frame_parity_error();

    let healths: Vec<TimeSyncHealth> = changes
        .iter()
        .filter_map(|change| match change {
            StatusChange::TimeSync(update) => Some(update.health),
            StatusChange::Signal(_) => None,
        })
        .collect();

    assert_eq!(
        healths,
        vec![
            TimeSyncHealth::Failed(FailureReason::ParityError),
            TimeSyncHealth::InProgress,
        ]
    );
}

use dcf77_core::config::WATCHDOG_TIMEOUT_MS;
use embassy_time::{Duration, with_timeout};

use crate::handoff::Signals;
use crate::keeper::{FirmwareKeeper, SharedKeeper, with_keeper};

#[embassy_executor::task]
pub async fn run(signals: &'static Signals, keeper: &'static SharedKeeper) -> ! {
    let bound = Duration::from_millis(u64::from(WATCHDOG_TIMEOUT_MS));

    loop {
        match with_timeout(bound, signals.edge_seen.wait()).await {
            Ok(()) => signals.edge_seen.clear(),
            Err(_) => with_keeper(keeper, FirmwareKeeper::signal_timeout),
        }
    }
}

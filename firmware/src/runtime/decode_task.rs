use crate::handoff::Signals;
use crate::keeper::{SharedKeeper, with_keeper};
use crate::telemetry;

/// Decodes each completed frame. Waits without a bound; silence is the
/// watchdog's concern.
#[embassy_executor::task]
pub async fn run(signals: &'static Signals, keeper: &'static SharedKeeper) -> ! {
    loop {
        signals.frame_ready.wait().await;
        signals.frame_ready.clear();

        let Some(frame) = signals.frame.take() else {
            continue;
        };

        let outcome = with_keeper(keeper, |keeper| keeper.minute_complete(&frame));
        telemetry::log_decode(&outcome);
    }
}

use dcf77_core::config::{DEBOUNCE_MS, DEFAULT_CONFIG};
use dcf77_core::edge::Level;
use embassy_stm32::exti::ExtiInput;
use embassy_time::{Duration, Instant, Timer};

use crate::capture::EdgeCapture;
use crate::handoff::Signals;
use crate::keeper::{SharedKeeper, with_keeper};

#[embassy_executor::task]
pub async fn run(
    mut input: ExtiInput<'static>,
    signals: &'static Signals,
    keeper: &'static SharedKeeper,
) -> ! {
    let settle = Duration::from_millis(u64::from(DEBOUNCE_MS));
    let mut capture = EdgeCapture::new(
        Level::from_high(input.is_high()),
        DEFAULT_CONFIG.marker_policy,
    );

    loop {
        input.wait_for_any_edge().await;
        let edge_at = Instant::now();
        signals.edge_seen.set();

        // Chatter shorter than the settle window collapses into no transition.
        Timer::after(settle).await;
        let level = Level::from_high(input.is_high());

        let appended = capture.on_level(level, edge_at.as_millis(), signals);
        if !appended.is_empty() {
            with_keeper(keeper, |keeper| {
                for report in appended {
                    keeper.symbol_received(report);
                }
            });
        }
    }
}

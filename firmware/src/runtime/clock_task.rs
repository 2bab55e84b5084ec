use embassy_time::{Duration, Instant, Timer};

use crate::keeper::{SharedKeeper, with_keeper};

/// Self-paced one-second tick. The sleep before each tick comes from the
/// drift filter's measurement of the previous one.
#[embassy_executor::task]
pub async fn run(keeper: &'static SharedKeeper) -> ! {
    let mut delay_ms = with_keeper(keeper, |keeper| keeper.clock().next_delay_ms());

    loop {
        Timer::after(Duration::from_millis(u64::from(delay_ms))).await;
        let now_ms = Instant::now().as_millis();
        delay_ms = with_keeper(keeper, |keeper| keeper.tick(now_ms));
    }
}

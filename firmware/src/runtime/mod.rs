use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use dcf77_core::config::DEFAULT_CONFIG;
use dcf77_core::station::TimeKeeper;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Pull;
use embassy_time::Instant;
use static_cell::StaticCell;

use crate::handoff::Signals;
use crate::keeper::{self, SharedKeeper};
use crate::status::STATUS;
use crate::telemetry::LogSink;

mod clock_task;
mod decode_task;
mod edge_task;
mod watchdog_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static SIGNALS: Signals = Signals::new();
static KEEPER: StaticCell<SharedKeeper> = StaticCell::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals { PA0, EXTI0, .. } = hal::init(config);

    // Demodulated receiver output; the module drives it push-pull.
    let input = ExtiInput::new(PA0, EXTI0, Pull::None);

    let keeper: &'static SharedKeeper = KEEPER.init(keeper::shared(TimeKeeper::new(
        DEFAULT_CONFIG,
        Instant::now().as_millis(),
        LogSink::new(&STATUS),
    )));

    spawner
        .spawn(edge_task::run(input, &SIGNALS, keeper))
        .expect("failed to spawn edge capture task");

    spawner
        .spawn(decode_task::run(&SIGNALS, keeper))
        .expect("failed to spawn decode task");

    spawner
        .spawn(watchdog_task::run(&SIGNALS, keeper))
        .expect("failed to spawn signal watchdog task");

    spawner
        .spawn(clock_task::run(keeper))
        .expect("failed to spawn clock task");

    core::future::pending::<()>().await;
}

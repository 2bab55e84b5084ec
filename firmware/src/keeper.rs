//! Time keeper shared by the firmware tasks.
//!
//! Tasks lock it only for the duration of a synchronous call, never across
//! an await point, so the thread-mode mutex never contends.

use core::cell::RefCell;

use dcf77_core::station::TimeKeeper;
use embassy_sync::blocking_mutex::Mutex;

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;

use crate::telemetry::LogSink;

#[cfg(target_os = "none")]
type KeeperMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type KeeperMutex = NoopRawMutex;

pub type FirmwareKeeper = TimeKeeper<LogSink>;

pub type SharedKeeper = Mutex<KeeperMutex, RefCell<FirmwareKeeper>>;

pub const fn shared(keeper: FirmwareKeeper) -> SharedKeeper {
    Mutex::new(RefCell::new(keeper))
}

/// Runs `f` with exclusive access to the keeper.
pub fn with_keeper<R>(shared: &SharedKeeper, f: impl FnOnce(&mut FirmwareKeeper) -> R) -> R {
    shared.lock(|cell| f(&mut cell.borrow_mut()))
}

//! Completed-frame hand-off between the edge task and the decode task.

use core::cell::RefCell;

use dcf77_core::frame::Frame;
use embassy_sync::blocking_mutex::CriticalSectionMutex;

use crate::flag::WakeFlag;

/// Single-slot mailbox holding the most recent completed frame.
///
/// The producer moves a detached [`Frame`] in and the consumer moves it out,
/// so neither side can observe the other's buffer mid-update.
pub struct FrameSlot {
    cell: CriticalSectionMutex<RefCell<Option<Frame>>>,
}

impl FrameSlot {
    pub const fn new() -> Self {
        Self {
            cell: CriticalSectionMutex::new(RefCell::new(None)),
        }
    }

    /// Stores `frame`, returning an earlier frame nobody collected.
    pub fn store(&self, frame: Frame) -> Option<Frame> {
        self.cell.lock(|cell| cell.borrow_mut().replace(frame))
    }

    pub fn take(&self) -> Option<Frame> {
        self.cell.lock(|cell| cell.borrow_mut().take())
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifications and the frame slot fed by the edge task.
pub struct Signals {
    /// Raised on every raw edge; consumed by the watchdog.
    pub edge_seen: WakeFlag,
    /// Raised when `frame` holds a completed frame; consumed by the decoder.
    pub frame_ready: WakeFlag,
    pub frame: FrameSlot,
}

impl Signals {
    pub const fn new() -> Self {
        Self {
            edge_seen: WakeFlag::new(),
            frame_ready: WakeFlag::new(),
            frame: FrameSlot::new(),
        }
    }

    /// Publishes a completed frame and wakes the decoder.
    ///
    /// Returns `true` when an undecoded frame was overwritten.
    pub fn publish_frame(&self, frame: Frame) -> bool {
        let overwritten = self.frame.store(frame).is_some();
        self.frame_ready.set();
        overwritten
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}

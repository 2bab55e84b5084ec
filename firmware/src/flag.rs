//! Binary wake flag shared between the edge task and its consumers.

use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::waitqueue::AtomicWaker;
use portable_atomic::{AtomicBool, Ordering};

/// Level-triggered notification.
///
/// `set` is idempotent, so a burst of sets before the consumer runs wakes it
/// once. `wait` returns while the flag is raised without lowering it; the
/// consumer calls `clear` once it has handled the notification.
pub struct WakeFlag {
    raised: AtomicBool,
    waker: AtomicWaker,
}

impl WakeFlag {
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
            waker: AtomicWaker::new(),
        }
    }

    pub fn set(&self) {
        self.raised.store(true, Ordering::Release);
        self.waker.wake();
    }

    pub fn clear(&self) {
        self.raised.store(false, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Suspends until the flag is raised.
    pub async fn wait(&self) {
        poll_fn(|cx| {
            self.waker.register(cx.waker());
            if self.is_set() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await;
    }
}

impl Default for WakeFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::{block_on, poll_once};

    #[test]
    fn wait_is_pending_until_set() {
        let flag = WakeFlag::new();
        assert!(poll_once(flag.wait()).is_pending());

        flag.set();
        assert!(poll_once(flag.wait()).is_ready());
    }

    #[test]
    fn sets_coalesce_and_wait_does_not_consume() {
        let flag = WakeFlag::new();
        flag.set();
        flag.set();
        flag.set();

        block_on(flag.wait());
        assert!(flag.is_set());
        block_on(flag.wait());

        flag.clear();
        assert!(!flag.is_set());
        assert!(poll_once(flag.wait()).is_pending());
    }
}

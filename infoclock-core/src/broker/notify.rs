//! Per-task one-shot notification
//!
//! Each registered client owns one of these, so the arbitration loop can wake
//! exactly the task it granted without disturbing any other waiter.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

/// One-shot notify/wait primitive carrying a value.
///
/// A notification given while nobody waits is latched until the next
/// [`wait`](Self::wait) or [`reset`](Self::reset). Giving twice before it is
/// taken overwrites the latched value; there is no counting.
pub struct Notification<M: RawMutex, T = ()> {
    signal: Signal<M, T>,
}

impl<M: RawMutex, T> Default for Notification<M, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, T> Notification<M, T> {
    /// Create an empty notification
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }
}

impl<M: RawMutex, T: Send> Notification<M, T> {
    /// Give the notification, waking the waiter if there is one
    pub fn notify(&self, value: T) {
        self.signal.signal(value);
    }

    /// Wait until notified, consuming the latched value
    pub async fn wait(&self) -> T {
        self.signal.wait().await
    }

    /// Discard any latched notification
    pub fn reset(&self) {
        self.signal.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use futures::FutureExt;

    #[test]
    fn test_notify_before_wait_is_latched() {
        let n: Notification<NoopRawMutex, u8> = Notification::new();
        n.notify(7);
        assert_eq!(n.wait().now_or_never(), Some(7));
        assert_eq!(n.wait().now_or_never(), None);
    }

    #[test]
    fn test_wait_blocks_until_notified() {
        let n: Notification<NoopRawMutex> = Notification::new();
        let mut wait = core::pin::pin!(n.wait());
        assert!(wait.as_mut().now_or_never().is_none());
        n.notify(());
        assert_eq!(wait.now_or_never(), Some(()));
    }

    #[test]
    fn test_second_notify_overwrites() {
        let n: Notification<NoopRawMutex, u8> = Notification::new();
        n.notify(1);
        n.notify(2);
        assert_eq!(n.wait().now_or_never(), Some(2));
        assert_eq!(n.wait().now_or_never(), None);
    }

    #[test]
    fn test_reset_discards_latched_value() {
        let n: Notification<NoopRawMutex> = Notification::new();
        n.notify(());
        n.reset();
        assert!(n.wait().now_or_never().is_none());
    }
}

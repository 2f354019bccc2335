//! Bounded request queue
//!
//! Fixed-capacity FIFO shared between many producers (clients enqueueing
//! their ids) and a single consumer (the arbitration loop). Enqueue never
//! blocks; the consumer can wait asynchronously for the queue to fill.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::{Context, Poll};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;
use heapless::Deque;

struct Inner<T, const N: usize> {
    items: Deque<T, N>,
    consumer: WakerRegistration,
}

/// Fixed-capacity FIFO with non-blocking enqueue and an async readiness wait.
///
/// Only one task may wait on [`ready`](Self::ready) at a time; a second
/// consumer would steal the first one's waker registration.
pub struct RequestQueue<M: RawMutex, T, const N: usize> {
    inner: Mutex<M, RefCell<Inner<T, N>>>,
}

impl<M: RawMutex, T, const N: usize> Default for RequestQueue<M, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, T, const N: usize> RequestQueue<M, T, N> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                items: Deque::new(),
                consumer: WakerRegistration::new(),
            })),
        }
    }

    /// Append an item at the back, failing fast when full
    ///
    /// On failure the item is handed back to the caller.
    pub fn try_enqueue(&self, item: T) -> Result<(), T> {
        self.inner.lock(|inner| {
            let mut inner = inner.borrow_mut();
            inner.items.push_back(item)?;
            inner.consumer.wake();
            Ok(())
        })
    }

    /// Remove the item at the front, if any
    pub fn try_dequeue(&self) -> Option<T> {
        self.inner.lock(|inner| inner.borrow_mut().items.pop_front())
    }

    /// Poll until the queue holds at least one item
    pub fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<()> {
        self.inner.lock(|inner| {
            let mut inner = inner.borrow_mut();
            if inner.items.is_empty() {
                inner.consumer.register(cx.waker());
                Poll::Pending
            } else {
                Poll::Ready(())
            }
        })
    }

    /// Wait until the queue holds at least one item, without removing it
    pub async fn ready(&self) {
        poll_fn(|cx| self.poll_ready(cx)).await
    }

    /// Remove the first item matching `pred`, keeping the others in order
    pub fn withdraw(&self, mut pred: impl FnMut(&T) -> bool) -> Option<T> {
        self.inner.lock(|inner| {
            let mut inner = inner.borrow_mut();
            let items = &mut inner.items;
            let mut found = None;
            for _ in 0..items.len() {
                let Some(item) = items.pop_front() else {
                    break;
                };
                if found.is_none() && pred(&item) {
                    found = Some(item);
                } else {
                    // Cannot overflow: at least one slot was just freed.
                    let _ = items.push_back(item);
                }
            }
            found
        })
    }

    /// Check whether any queued item matches `pred`
    pub fn contains(&self, mut pred: impl FnMut(&T) -> bool) -> bool {
        self.inner
            .lock(|inner| inner.borrow().items.iter().any(|item| pred(item)))
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.inner.lock(|inner| inner.borrow().items.len())
    }

    /// Check if the queue is at capacity
    pub fn is_full(&self) -> bool {
        self.inner.lock(|inner| inner.borrow().items.is_full())
    }
}

//! Exclusive-access broker
//!
//! Owns a single device and lends it to one registered client at a time.
//! Clients queue up in a bounded FIFO; a dedicated arbitration loop
//! ([`AccessBroker::run`]) hands out grants in arrival order and waits for
//! each owner to release before serving the next.
//!
//! State transitions of the loop:
//!
//! ```text
//!   Idle ──dequeue t──▶ Granted(t) ──release by t──▶ Releasing(t) ──loop resumes──▶ Idle
//! ```
//!
//! The current owner does not occupy a queue slot: `QUEUE` counts only
//! waiting clients.
//!
//! Requests, releases and device access all go through a [`Client`]. Ids
//! cannot be built outside this crate, so no task can act on a grant that
//! was handed to another.

use core::cell::Cell;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

use super::client::Client;
use super::error::BrokerError;
use super::notify::Notification;
use super::queue::RequestQueue;
use crate::log::{debug, info, trace, warn};

/// Identity of a registered client
///
/// Only [`AccessBroker::register`] hands these out. An id is not a
/// capability on its own; the broker only acts on it through the owning
/// [`Client`]:
///
/// ```compile_fail
/// use embassy_sync::blocking_mutex::raw::NoopRawMutex;
/// use infoclock_core::broker::{AccessBroker, TaskId};
///
/// let broker = AccessBroker::<NoopRawMutex, u8, 1, 1>::new(0);
/// let _ = broker.release(TaskId::from_index(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(u8);

impl TaskId {
    /// Build an id from a raw slot index
    ///
    /// Ids not handed out by [`AccessBroker::register`] are rejected with
    /// [`BrokerError::UnknownClient`].
    #[cfg(test)]
    pub(crate) const fn from_index(index: u8) -> Self {
        Self(index)
    }

    /// Slot index of this id
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Who holds the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Holder {
    /// No grant outstanding
    Idle,
    /// Granted to this client
    Granted(TaskId),
    /// Released by this client; the loop has not resumed yet
    Releasing(TaskId),
}

impl Holder {
    /// The client currently allowed to use the device
    pub fn owner(self) -> Option<TaskId> {
        match self {
            Holder::Granted(id) => Some(id),
            Holder::Idle | Holder::Releasing(_) => None,
        }
    }
}

/// Outcome delivered to a waiting client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Granted,
    ShutDown,
}

#[derive(Debug, Clone, Copy)]
struct Control {
    holder: Holder,
    registered: usize,
    running: bool,
    stopped: bool,
}

impl Control {
    const fn new() -> Self {
        Self {
            holder: Holder::Idle,
            registered: 0,
            running: false,
            stopped: false,
        }
    }
}

/// Exclusive-access arbiter for one device of type `R`.
///
/// - `M`: raw mutex flavour guarding the broker state
/// - `QUEUE`: number of clients that may wait at once
/// - `CLIENTS`: number of client identities that can be registered (max 256)
///
/// Lock order is always control, then queue, then notifications.
pub struct AccessBroker<M: RawMutex, R, const QUEUE: usize, const CLIENTS: usize> {
    device: Mutex<M, R>,
    control: BlockingMutex<M, Cell<Control>>,
    pending: RequestQueue<M, TaskId, QUEUE>,
    grants: [Notification<M, Verdict>; CLIENTS],
    released: Notification<M>,
    shutdown: Notification<M>,
}

impl<M: RawMutex, R, const QUEUE: usize, const CLIENTS: usize> AccessBroker<M, R, QUEUE, CLIENTS> {
    /// Take ownership of `resource` and allocate the pending queue
    ///
    /// Requests may be made before [`run`](Self::run) starts; they wait
    /// in the queue until the loop is spawned.
    pub const fn new(resource: R) -> Self {
        Self {
            device: Mutex::new(resource),
            control: BlockingMutex::new(Cell::new(Control::new())),
            pending: RequestQueue::new(),
            grants: [const { Notification::new() }; CLIENTS],
            released: Notification::new(),
            shutdown: Notification::new(),
        }
    }

    /// Hand out a client handle with a fresh identity
    pub fn register(&self) -> Result<Client<'_, M, R, QUEUE, CLIENTS>, BrokerError> {
        let id = self.update(|ctl| {
            if ctl.registered >= CLIENTS || ctl.registered > u8::MAX as usize {
                return Err(BrokerError::TooManyClients);
            }
            let id = TaskId(ctl.registered as u8);
            ctl.registered += 1;
            Ok(id)
        })?;
        debug!("broker: registered client {}", id.index());
        Ok(Client::new(self, id))
    }

    /// Queue for the device and wait until it is granted
    ///
    /// Fails immediately, without queueing, when the queue is full or the
    /// request is misuse (see [`BrokerError`]). Dropping the returned future
    /// before it resolves withdraws the request; a grant that already
    /// arrived is released on the spot.
    pub(crate) async fn request(&self, id: TaskId) -> Result<(), BrokerError> {
        self.admit(id)?;

        let mut waiting = Waiting {
            broker: self,
            id,
            armed: true,
        };
        let verdict = self.grants[id.index()].wait().await;
        waiting.armed = false;

        match verdict {
            Verdict::Granted => Ok(()),
            Verdict::ShutDown => Err(BrokerError::ShutDown),
        }
    }

    /// Queue for the device and wait until it is granted
    ///
    /// Returns `false` immediately when the request was not admitted.
    pub(crate) async fn acquire(&self, id: TaskId) -> bool {
        self.request(id).await.is_ok()
    }

    /// End the grant held by `id`
    ///
    /// Only the current owner can release. Any other caller gets
    /// [`BrokerError::NotOwner`] and the broker state is left untouched.
    pub(crate) fn release(&self, id: TaskId) -> Result<(), BrokerError> {
        let result = self.update(|ctl| {
            if ctl.holder != Holder::Granted(id) {
                return Err(BrokerError::NotOwner);
            }
            ctl.holder = Holder::Releasing(id);
            self.released.notify(());
            Ok(())
        });
        if result.is_err() {
            warn!("broker: ignoring release from non-owner {}", id.index());
        }
        result
    }

    /// Lock the device on behalf of the current owner
    pub(crate) async fn resource(&self, id: TaskId) -> Result<MutexGuard<'_, M, R>, BrokerError> {
        if self.owner() != Some(id) {
            return Err(BrokerError::NotOwner);
        }
        Ok(self.device.lock().await)
    }

    /// Arbitration loop
    ///
    /// Grants the device in FIFO order, one owner at a time. Returns after
    /// [`shutdown`](Self::shutdown), once the current owner has released.
    pub async fn run(&self) {
        info!("broker: arbitration loop started, {} queue slots", QUEUE);
        self.update(|ctl| ctl.running = true);

        loop {
            if let Either::First(()) = select(self.shutdown.wait(), self.pending.ready()).await {
                break;
            }

            let Some(id) = self.grant_next() else {
                // Withdrawn between wake-up and dequeue
                continue;
            };
            debug!("broker: granted client {}", id.index());

            self.released.wait().await;
            self.update(|ctl| ctl.holder = Holder::Idle);
            trace!(
                "broker: client {} released, {} waiting",
                id.index(),
                self.pending.len()
            );
        }

        self.drain();
        info!("broker: arbitration loop stopped");
    }

    /// Ask the arbitration loop to stop
    ///
    /// New requests are refused from now on. The loop finishes once the
    /// device is idle and rejects everyone still waiting.
    pub fn shutdown(&self) {
        self.update(|ctl| ctl.stopped = true);
        self.shutdown.notify(());
    }

    /// Tear the broker down and take the device back
    pub fn into_resource(self) -> R {
        self.device.into_inner()
    }

    /// Current holder state
    pub fn holder(&self) -> Holder {
        self.control().holder
    }

    /// Client currently allowed to use the device
    pub fn owner(&self) -> Option<TaskId> {
        self.holder().owner()
    }

    /// Number of clients waiting for a grant
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Maximum number of waiting clients
    pub const fn capacity(&self) -> usize {
        QUEUE
    }

    /// Check whether the arbitration loop is running
    pub fn is_running(&self) -> bool {
        self.control().running
    }

    /// Number of registered clients
    pub fn registered(&self) -> usize {
        self.control().registered
    }

    fn control(&self) -> Control {
        self.control.lock(Cell::get)
    }

    fn update<U>(&self, f: impl FnOnce(&mut Control) -> U) -> U {
        self.control.lock(|cell| {
            let mut ctl = cell.get();
            let out = f(&mut ctl);
            cell.set(ctl);
            out
        })
    }

    fn admit(&self, id: TaskId) -> Result<(), BrokerError> {
        let result = self.update(|ctl| {
            if id.index() >= ctl.registered {
                return Err(BrokerError::UnknownClient);
            }
            if ctl.stopped {
                return Err(BrokerError::ShutDown);
            }
            if ctl.holder.owner() == Some(id) {
                return Err(BrokerError::AlreadyOwner);
            }
            if self.pending.contains(|&t| t == id) {
                return Err(BrokerError::AlreadyPending);
            }
            // A verdict left behind by an abandoned request must not satisfy this one
            self.grants[id.index()].reset();
            self.pending
                .try_enqueue(id)
                .map_err(|_| BrokerError::QueueFull)
        });
        if let Err(e) = result {
            warn!("broker: request from {} refused: {:?}", id.index(), e);
        }
        result
    }

    fn grant_next(&self) -> Option<TaskId> {
        self.update(|ctl| {
            let id = self.pending.try_dequeue()?;
            ctl.holder = Holder::Granted(id);
            self.grants[id.index()].notify(Verdict::Granted);
            Some(id)
        })
    }

    fn abandon(&self, id: TaskId) {
        self.update(|ctl| {
            if self.pending.withdraw(|&t| t == id).is_some() {
                debug!("broker: client {} withdrew its request", id.index());
            } else if ctl.holder == Holder::Granted(id) {
                debug!("broker: client {} left before using its grant", id.index());
                ctl.holder = Holder::Releasing(id);
                self.released.notify(());
            }
        });
    }

    fn drain(&self) {
        self.update(|ctl| {
            ctl.running = false;
            ctl.stopped = true;
            while let Some(id) = self.pending.try_dequeue() {
                self.grants[id.index()].notify(Verdict::ShutDown);
            }
        });
    }

    pub(super) fn device(&self) -> &Mutex<M, R> {
        &self.device
    }
}

/// Withdraws an in-flight request if its future is dropped early
struct Waiting<'a, M: RawMutex, R, const QUEUE: usize, const CLIENTS: usize> {
    broker: &'a AccessBroker<M, R, QUEUE, CLIENTS>,
    id: TaskId,
    armed: bool,
}

impl<M: RawMutex, R, const QUEUE: usize, const CLIENTS: usize> Drop
    for Waiting<'_, M, R, QUEUE, CLIENTS>
{
    fn drop(&mut self) {
        if self.armed {
            self.broker.abandon(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::future::Future;
    use core::pin::{pin, Pin};
    use core::task::{Context, Poll};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use futures::FutureExt;

    /// Device stand-in recording which client drew on it
    type Log = Vec<u8>;

    type TestBroker<const QUEUE: usize> = AccessBroker<NoopRawMutex, Log, QUEUE, 4>;

    fn poll_once<F: Future>(fut: Pin<&mut F>) -> Poll<F::Output> {
        fut.poll(&mut Context::from_waker(futures::task::noop_waker_ref()))
    }

    #[test]
    fn test_first_request_granted_when_idle() {
        let broker = TestBroker::<2>::new(Log::new());
        let x = broker.register().unwrap();
        let mut run = pin!(broker.run());

        let mut ax = pin!(x.acquire());
        assert!(poll_once(ax.as_mut()).is_pending());
        assert!(poll_once(run.as_mut()).is_pending());

        assert_eq!(poll_once(ax.as_mut()), Poll::Ready(true));
        assert_eq!(broker.owner(), Some(x.id()));
        assert_eq!(broker.pending_len(), 0);
    }

    #[test]
    fn test_three_callers_before_loop_runs_rejects_third() {
        // Capacity 2, loop not yet scheduled: X and Y fill the queue
        let broker = TestBroker::<2>::new(Log::new());
        let x = broker.register().unwrap();
        let y = broker.register().unwrap();
        let z = broker.register().unwrap();
        let mut run = pin!(broker.run());

        let mut ax = pin!(x.acquire());
        let mut ay = pin!(y.acquire());
        let mut az = pin!(z.acquire());
        assert!(poll_once(ax.as_mut()).is_pending());
        assert!(poll_once(ay.as_mut()).is_pending());
        assert_eq!(poll_once(az.as_mut()), Poll::Ready(false));

        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(poll_once(ax.as_mut()), Poll::Ready(true));
        assert!(poll_once(ay.as_mut()).is_pending());

        x.release().unwrap();
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(poll_once(ay.as_mut()), Poll::Ready(true));
        assert_eq!(broker.owner(), Some(y.id()));
    }

    #[test]
    fn test_three_callers_after_first_grant_admits_all() {
        // Capacity 2, X already granted: owner holds no slot, Y and Z both wait
        let broker = TestBroker::<2>::new(Log::new());
        let x = broker.register().unwrap();
        let y = broker.register().unwrap();
        let z = broker.register().unwrap();
        let mut run = pin!(broker.run());

        let mut ax = pin!(x.acquire());
        assert!(poll_once(ax.as_mut()).is_pending());
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(poll_once(ax.as_mut()), Poll::Ready(true));

        let mut ay = pin!(y.acquire());
        let mut az = pin!(z.acquire());
        assert!(poll_once(ay.as_mut()).is_pending());
        assert!(poll_once(az.as_mut()).is_pending());
        assert_eq!(broker.pending_len(), 2);

        x.release().unwrap();
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(poll_once(ay.as_mut()), Poll::Ready(true));
        assert!(poll_once(az.as_mut()).is_pending());

        y.release().unwrap();
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(poll_once(az.as_mut()), Poll::Ready(true));
        assert_eq!(broker.owner(), Some(z.id()));
    }

    #[test]
    fn test_grants_follow_arrival_order() {
        let broker = TestBroker::<3>::new(Log::new());
        let clients: Vec<_> = (0..4).map(|_| broker.register().unwrap()).collect();
        let mut run = pin!(broker.run());

        // Enqueue in the order 2, 0, 3 (client 1 never asks)
        let mut a2 = pin!(clients[2].acquire());
        let mut a0 = pin!(clients[0].acquire());
        let mut a3 = pin!(clients[3].acquire());
        assert!(poll_once(a2.as_mut()).is_pending());
        assert!(poll_once(a0.as_mut()).is_pending());
        assert!(poll_once(a3.as_mut()).is_pending());

        let mut order = Vec::new();
        let mut waiting: [Option<Pin<&mut _>>; 3] = [Some(a2.as_mut()), Some(a0.as_mut()), Some(a3.as_mut())];
        for _ in 0..3 {
            assert!(poll_once(run.as_mut()).is_pending());
            let owner = broker.owner().unwrap();
            order.push(owner.index());
            for slot in waiting.iter_mut() {
                if let Some(fut) = slot {
                    if let Poll::Ready(granted) = poll_once(fut.as_mut()) {
                        assert!(granted);
                        *slot = None;
                    }
                }
            }
            broker.release(owner).unwrap();
        }
        assert_eq!(order, [2, 0, 3]);
    }

    #[test]
    fn test_release_by_non_owner_is_ignored() {
        let broker = TestBroker::<2>::new(Log::new());
        let x = broker.register().unwrap();
        let y = broker.register().unwrap();
        let z = broker.register().unwrap();
        let mut run = pin!(broker.run());

        let mut ax = pin!(x.acquire());
        let mut ay = pin!(y.acquire());
        assert!(poll_once(ax.as_mut()).is_pending());
        assert!(poll_once(run.as_mut()).is_pending());
        assert!(poll_once(ay.as_mut()).is_pending());
        assert_eq!(poll_once(ax.as_mut()), Poll::Ready(true));

        assert_eq!(y.release(), Err(BrokerError::NotOwner));
        assert_eq!(z.release(), Err(BrokerError::NotOwner));
        assert_eq!(broker.holder(), Holder::Granted(x.id()));
        assert_eq!(broker.pending_len(), 1);

        // The loop must still be parked on X's release
        assert!(poll_once(run.as_mut()).is_pending());
        assert!(poll_once(ay.as_mut()).is_pending());
        assert_eq!(broker.owner(), Some(x.id()));
    }

    #[test]
    fn test_double_release_triggers_one_cycle() {
        let broker = TestBroker::<2>::new(Log::new());
        let x = broker.register().unwrap();
        let y = broker.register().unwrap();
        let mut run = pin!(broker.run());

        let mut ax = pin!(x.acquire());
        assert!(poll_once(ax.as_mut()).is_pending());
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(poll_once(ax.as_mut()), Poll::Ready(true));

        assert_eq!(x.release(), Ok(()));
        assert_eq!(x.release(), Err(BrokerError::NotOwner));
        assert_eq!(broker.holder(), Holder::Releasing(x.id()));

        // Y is granted once the loop resumes, and keeps the grant
        let mut ay = pin!(y.acquire());
        assert!(poll_once(ay.as_mut()).is_pending());
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(poll_once(ay.as_mut()), Poll::Ready(true));
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(broker.holder(), Holder::Granted(y.id()));
    }

    #[test]
    fn test_resource_only_for_owner() {
        let broker = TestBroker::<2>::new(Log::new());
        let x = broker.register().unwrap();
        let y = broker.register().unwrap();
        let mut run = pin!(broker.run());

        assert!(matches!(
            broker.resource(x.id()).now_or_never(),
            Some(Err(BrokerError::NotOwner))
        ));

        let mut ax = pin!(x.acquire());
        assert!(poll_once(ax.as_mut()).is_pending());
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(poll_once(ax.as_mut()), Poll::Ready(true));

        {
            let mut log = broker.resource(x.id()).now_or_never().unwrap().unwrap();
            log.push(x.id().index() as u8);
        }
        assert!(matches!(
            broker.resource(y.id()).now_or_never(),
            Some(Err(BrokerError::NotOwner))
        ));

        x.release().unwrap();
        assert!(matches!(
            broker.resource(x.id()).now_or_never(),
            Some(Err(BrokerError::NotOwner))
        ));
    }

    #[test]
    fn test_misuse_is_refused_without_queueing() {
        let broker = TestBroker::<2>::new(Log::new());
        let x = broker.register().unwrap();
        let mut run = pin!(broker.run());

        let forged = TaskId::from_index(3);
        assert_eq!(
            broker.request(forged).now_or_never(),
            Some(Err(BrokerError::UnknownClient))
        );

        let mut ax = pin!(x.request());
        assert!(poll_once(ax.as_mut()).is_pending());
        assert_eq!(
            x.request().now_or_never(),
            Some(Err(BrokerError::AlreadyPending))
        );
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(poll_once(ax.as_mut()), Poll::Ready(Ok(())));
        assert_eq!(
            x.request().now_or_never(),
            Some(Err(BrokerError::AlreadyOwner))
        );
        assert_eq!(broker.pending_len(), 0);
    }

    #[test]
    fn test_register_limit() {
        let broker = TestBroker::<2>::new(Log::new());
        for _ in 0..4 {
            broker.register().unwrap();
        }
        assert_eq!(broker.register().err(), Some(BrokerError::TooManyClients));
        assert_eq!(broker.registered(), 4);
    }

    #[test]
    fn test_dropped_request_is_withdrawn() {
        let broker = TestBroker::<2>::new(Log::new());
        let x = broker.register().unwrap();
        let y = broker.register().unwrap();
        let mut run = pin!(broker.run());

        let mut ax = pin!(x.acquire());
        assert!(poll_once(ax.as_mut()).is_pending());
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(poll_once(ax.as_mut()), Poll::Ready(true));

        {
            let mut ay = core::pin::pin!(y.acquire());
            assert!(poll_once(ay.as_mut()).is_pending());
            assert_eq!(broker.pending_len(), 1);
        }
        assert_eq!(broker.pending_len(), 0);

        x.release().unwrap();
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(broker.holder(), Holder::Idle);
    }

    #[test]
    fn test_grant_to_dropped_request_is_returned() {
        let broker = TestBroker::<2>::new(Log::new());
        let x = broker.register().unwrap();
        let y = broker.register().unwrap();
        let mut run = pin!(broker.run());

        {
            let mut ay = core::pin::pin!(y.acquire());
            assert!(poll_once(ay.as_mut()).is_pending());
            // Loop grants Y, but Y goes away before observing it
            assert!(poll_once(run.as_mut()).is_pending());
            assert_eq!(broker.owner(), Some(y.id()));
        }
        assert_eq!(broker.holder(), Holder::Releasing(y.id()));
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(broker.holder(), Holder::Idle);

        // The stale grant must not leak into Y's next request
        let mut ay = pin!(y.acquire());
        assert!(poll_once(ay.as_mut()).is_pending());
        let mut ax = pin!(x.acquire());
        assert!(poll_once(ax.as_mut()).is_pending());
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(poll_once(ay.as_mut()), Poll::Ready(true));
        assert!(poll_once(ax.as_mut()).is_pending());
    }

    #[test]
    fn test_shutdown_rejects_waiters_and_returns_device() {
        let broker = TestBroker::<2>::new(Log::new());

        {
            let x = broker.register().unwrap();
            let y = broker.register().unwrap();
            let mut run = pin!(broker.run());
            let mut ax = pin!(x.request());
            assert!(poll_once(ax.as_mut()).is_pending());
            assert!(poll_once(run.as_mut()).is_pending());
            assert_eq!(poll_once(ax.as_mut()), Poll::Ready(Ok(())));
            assert!(broker.is_running());

            let mut ay = pin!(y.request());
            assert!(poll_once(ay.as_mut()).is_pending());

            broker.shutdown();
            assert_eq!(
                x.request().now_or_never(),
                Some(Err(BrokerError::ShutDown))
            );

            // Loop only stops once the owner lets go
            assert!(poll_once(run.as_mut()).is_pending());
            x.release().unwrap();
            assert_eq!(poll_once(run.as_mut()), Poll::Ready(()));
            assert_eq!(poll_once(ay.as_mut()), Poll::Ready(Err(BrokerError::ShutDown)));
            assert!(!broker.is_running());
        }

        let log = broker.into_resource();
        assert!(log.is_empty());
    }
}

//! Client handles
//!
//! A [`Client`] binds a registered identity to its broker so that tasks do
//! not pass raw ids around. A [`Session`] is a held grant that releases the
//! device when it goes out of scope.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::MutexGuard;

use super::access::{AccessBroker, TaskId};
use super::error::BrokerError;

/// Registered client of an [`AccessBroker`]
pub struct Client<'a, M: RawMutex, R, const QUEUE: usize, const CLIENTS: usize> {
    broker: &'a AccessBroker<M, R, QUEUE, CLIENTS>,
    id: TaskId,
}

impl<'a, M: RawMutex, R, const QUEUE: usize, const CLIENTS: usize> Client<'a, M, R, QUEUE, CLIENTS> {
    pub(super) fn new(broker: &'a AccessBroker<M, R, QUEUE, CLIENTS>, id: TaskId) -> Self {
        Self { broker, id }
    }

    /// Identity of this client
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The broker this client is registered with
    pub fn broker(&self) -> &'a AccessBroker<M, R, QUEUE, CLIENTS> {
        self.broker
    }

    /// Queue for the device; `false` when the request was not admitted
    pub async fn acquire(&self) -> bool {
        self.broker.acquire(self.id).await
    }

    /// Queue for the device, reporting why a request was refused
    pub async fn request(&self) -> Result<(), BrokerError> {
        self.broker.request(self.id).await
    }

    /// End this client's grant
    pub fn release(&self) -> Result<(), BrokerError> {
        self.broker.release(self.id)
    }

    /// Lock the device while holding the grant
    ///
    /// The guard keeps the client mutably borrowed, so the grant cannot be
    /// released (or asked for again) while the device is still locked:
    ///
    /// ```compile_fail
    /// use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    /// use infoclock_core::broker::AccessBroker;
    ///
    /// let broker = AccessBroker::<NoopRawMutex, Vec<u8>, 1, 1>::new(Vec::new());
    /// let mut client = broker.register().unwrap();
    /// futures::executor::block_on(async {
    ///     let mut device = client.resource().await.unwrap();
    ///     client.release().unwrap();
    ///     device.push(0xAA);
    /// });
    /// ```
    pub async fn resource(&mut self) -> Result<MutexGuard<'_, M, R>, BrokerError> {
        self.broker.resource(self.id).await
    }

    /// Wait for a grant and hold it as a scoped [`Session`]
    pub async fn session(&self) -> Result<Session<'a, M, R, QUEUE, CLIENTS>, BrokerError> {
        self.broker.request(self.id).await?;
        Ok(Session {
            broker: self.broker,
            id: self.id,
            held: true,
        })
    }
}

/// A held grant
///
/// Dropping the session releases the device.
pub struct Session<'a, M: RawMutex, R, const QUEUE: usize, const CLIENTS: usize> {
    broker: &'a AccessBroker<M, R, QUEUE, CLIENTS>,
    id: TaskId,
    held: bool,
}

impl<M: RawMutex, R, const QUEUE: usize, const CLIENTS: usize> Session<'_, M, R, QUEUE, CLIENTS> {
    /// Identity of the owning client
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Lock the device
    ///
    /// The guard borrows the session, so it cannot outlive the grant.
    pub async fn resource(&self) -> MutexGuard<'_, M, R> {
        self.broker.device().lock().await
    }

    /// End the grant now
    pub fn release(mut self) {
        self.held = false;
        let _ = self.broker.release(self.id);
    }
}

impl<M: RawMutex, R, const QUEUE: usize, const CLIENTS: usize> Drop
    for Session<'_, M, R, QUEUE, CLIENTS>
{
    fn drop(&mut self) {
        if self.held {
            let _ = self.broker.release(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::Holder;
    use core::future::Future;
    use core::pin::{pin, Pin};
    use core::task::{Context, Poll};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use futures::FutureExt;

    type TestBroker = AccessBroker<NoopRawMutex, [u8; 4], 2, 2>;

    fn poll_once<F: Future>(fut: Pin<&mut F>) -> Poll<F::Output> {
        fut.poll(&mut Context::from_waker(futures::task::noop_waker_ref()))
    }

    #[test]
    fn test_session_releases_on_drop() {
        let broker = TestBroker::new([0; 4]);
        let a = broker.register().unwrap();
        let mut b = broker.register().unwrap();
        let mut run = pin!(broker.run());

        let mut session = pin!(a.session());
        assert!(poll_once(session.as_mut()).is_pending());
        assert!(poll_once(run.as_mut()).is_pending());
        let Poll::Ready(Ok(session)) = poll_once(session.as_mut()) else {
            panic!("session not granted");
        };

        {
            let mut pixels = pin!(session.resource());
            let Poll::Ready(mut pixels) = poll_once(pixels.as_mut()) else {
                panic!("device locked");
            };
            pixels[0] = 0xFF;
        }

        {
            let mut wait_b = pin!(b.acquire());
            assert!(poll_once(wait_b.as_mut()).is_pending());

            drop(session);
            assert_eq!(broker.holder(), Holder::Releasing(a.id()));
            assert!(poll_once(run.as_mut()).is_pending());
            assert_eq!(poll_once(wait_b.as_mut()), Poll::Ready(true));
        }

        let mut pixels = pin!(b.resource());
        let Poll::Ready(Ok(pixels)) = poll_once(pixels.as_mut()) else {
            panic!("owner could not lock the device");
        };
        assert_eq!(pixels[0], 0xFF);
    }

    #[test]
    fn test_explicit_release_does_not_release_twice() {
        let broker = TestBroker::new([0; 4]);
        let a = broker.register().unwrap();
        let mut run = pin!(broker.run());

        let mut session = pin!(a.session());
        assert!(poll_once(session.as_mut()).is_pending());
        assert!(poll_once(run.as_mut()).is_pending());
        let Poll::Ready(Ok(session)) = poll_once(session.as_mut()) else {
            panic!("session not granted");
        };

        session.release();
        assert!(poll_once(run.as_mut()).is_pending());
        assert_eq!(broker.holder(), Holder::Idle);
        assert_eq!(a.release(), Err(BrokerError::NotOwner));
    }

    #[test]
    fn test_resource_refused_once_grant_moves_on() {
        let broker = TestBroker::new([0; 4]);
        let mut a = broker.register().unwrap();
        let mut b = broker.register().unwrap();
        let mut run = pin!(broker.run());

        {
            let mut wait_a = pin!(a.acquire());
            assert!(poll_once(wait_a.as_mut()).is_pending());
            assert!(poll_once(run.as_mut()).is_pending());
            assert_eq!(poll_once(wait_a.as_mut()), Poll::Ready(true));
        }
        {
            let mut wait_b = pin!(b.acquire());
            assert!(poll_once(wait_b.as_mut()).is_pending());
            a.release().unwrap();
            assert!(poll_once(run.as_mut()).is_pending());
            assert_eq!(poll_once(wait_b.as_mut()), Poll::Ready(true));
        }

        assert!(matches!(
            a.resource().now_or_never(),
            Some(Err(BrokerError::NotOwner))
        ));
        let mut pixels = b.resource().now_or_never().unwrap().unwrap();
        pixels[1] = 0x42;
        assert_eq!(*pixels, [0, 0x42, 0, 0]);
    }
}

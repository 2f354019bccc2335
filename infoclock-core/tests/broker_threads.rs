use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::thread;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use futures::executor::block_on;
use infoclock_core::broker::{AccessBroker, BrokerError, Holder};

// ---------------------------------------------------------------------------
// Shared device stand-in
// ---------------------------------------------------------------------------

/// Display stand-in recording who drew on it
#[derive(Default)]
struct Panel {
    frames: Vec<u8>,
}

impl Panel {
    fn draw(&mut self, who: u8) {
        thread::sleep(Duration::from_micros(200));
        self.frames.push(who);
    }
}

/// Counts clients that believe they hold the grant, outside any broker lock
#[derive(Default)]
struct Holders {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Holders {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

type Broker = AccessBroker<CriticalSectionRawMutex, Panel, 2, 4>;

const ROUNDS: usize = 25;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_threads_take_turns_and_all_finish() {
    let broker = Broker::new(Panel::default());
    let holders = Holders::default();
    let rejected = AtomicUsize::new(0);

    thread::scope(|s| {
        let run = s.spawn(|| block_on(broker.run()));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let mut client = broker.register().unwrap();
                let holders = &holders;
                let rejected = &rejected;
                s.spawn(move || {
                    let mut done = 0;
                    while done < ROUNDS {
                        if !block_on(client.acquire()) {
                            rejected.fetch_add(1, Ordering::SeqCst);
                            thread::yield_now();
                            continue;
                        }
                        holders.enter();
                        assert_eq!(client.broker().owner(), Some(client.id()));
                        {
                            let who = client.id().index() as u8;
                            let mut panel = block_on(client.resource()).unwrap();
                            panel.draw(who);
                        }
                        // Widen the window a second grant would have to hit
                        thread::sleep(Duration::from_micros(100));
                        holders.leave();
                        client.release().unwrap();
                        done += 1;
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        broker.shutdown();
        run.join().unwrap();
    });

    assert_eq!(holders.peak.load(Ordering::SeqCst), 1);
    assert_eq!(holders.current.load(Ordering::SeqCst), 0);
    assert!(!broker.is_running());
    assert_eq!(broker.holder(), Holder::Idle);

    let panel = broker.into_resource();
    assert_eq!(panel.frames.len(), 4 * ROUNDS);
    for who in 0..4u8 {
        assert_eq!(panel.frames.iter().filter(|&&w| w == who).count(), ROUNDS);
    }
}

#[test]
fn test_waiting_threads_are_served_in_arrival_order() {
    let broker = AccessBroker::<CriticalSectionRawMutex, Panel, 3, 4>::new(Panel::default());
    let first = broker.register().unwrap();
    let served = StdMutex::new(Vec::new());

    thread::scope(|s| {
        let run = s.spawn(|| block_on(broker.run()));
        assert_eq!(block_on(first.request()), Ok(()));

        // Enqueue three waiters one at a time so their order is known
        let mut arrivals = Vec::new();
        let mut waiters = Vec::new();
        for _ in 0..3 {
            let client = broker.register().unwrap();
            arrivals.push(client.id());
            let queued = broker.pending_len();
            let served = &served;
            waiters.push(s.spawn(move || {
                assert_eq!(block_on(client.request()), Ok(()));
                served.lock().unwrap().push(client.id());
                client.release().unwrap();
            }));
            while broker.pending_len() == queued {
                thread::yield_now();
            }
        }

        first.release().unwrap();
        for waiter in waiters {
            waiter.join().unwrap();
        }
        broker.shutdown();
        run.join().unwrap();

        assert_eq!(*served.lock().unwrap(), arrivals);
    });
}

#[test]
fn test_sessions_across_threads() {
    let broker = AccessBroker::<CriticalSectionRawMutex, Panel, 4, 4>::new(Panel::default());
    let holders = Holders::default();

    thread::scope(|s| {
        let run = s.spawn(|| block_on(broker.run()));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let client = broker.register().unwrap();
                let holders = &holders;
                s.spawn(move || {
                    for _ in 0..ROUNDS {
                        let session = block_on(client.session()).unwrap();
                        holders.enter();
                        block_on(session.resource()).draw(session.id().index() as u8);
                        holders.leave();
                        session.release();
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        broker.shutdown();
        run.join().unwrap();
    });

    assert_eq!(holders.peak.load(Ordering::SeqCst), 1);
    let panel = broker.into_resource();
    assert_eq!(panel.frames.len(), 4 * ROUNDS);
}

#[test]
fn test_waiter_blocked_at_shutdown_is_rejected() {
    let broker = Broker::new(Panel::default());
    let holder = broker.register().unwrap();
    let waiter = broker.register().unwrap();

    thread::scope(|s| {
        let run = s.spawn(|| block_on(broker.run()));

        assert_eq!(block_on(holder.request()), Ok(()));
        let blocked = s.spawn(move || block_on(waiter.request()));

        while broker.pending_len() == 0 {
            thread::yield_now();
        }
        broker.shutdown();
        holder.release().unwrap();

        assert_eq!(blocked.join().unwrap(), Err(BrokerError::ShutDown));
        run.join().unwrap();
    });

    assert!(!broker.is_running());
}

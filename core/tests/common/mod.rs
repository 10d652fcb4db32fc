//! Shared test utilities and fixtures
//!
//! Producers that behave like real asynchronous sources: they emit from
//! their own threads, late, or not at all.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tarry::logging;
use tarry::producer::{self, FnProducer};
use tarry::{Event, EventSink, Subscription};

/// Generous bound for waits that are expected to complete.
pub const LONG: Duration = Duration::from_secs(5);
/// Bound for waits that are expected to time out.
pub const SHORT: Duration = Duration::from_millis(100);

pub fn init() {
    logging::init_test_tracing();
}

type SinkFn<T, E> = Box<dyn FnOnce(EventSink<T, E>) -> Subscription>;

/// Emits `events` from a separate thread, pausing `gap` before each one.
pub fn threaded<T, E>(events: Vec<Event<T, E>>, gap: Duration) -> FnProducer<SinkFn<T, E>, T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    producer::from_fn(Box::new(move |sink: EventSink<T, E>| {
        thread::spawn(move || {
            for event in events {
                thread::sleep(gap);
                match event {
                    Event::Value(value) => {
                        if !sink.send(value) {
                            return;
                        }
                    }
                    Event::Finished => return sink.finish(),
                    Event::Failed(error) => return sink.fail(error),
                }
            }
        });
        Subscription::detached()
    }) as SinkFn<T, E>)
}

/// A producer whose subscription teardown flips a flag.
pub struct TeardownProbe {
    cancelled: Arc<AtomicBool>,
}

impl TeardownProbe {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscription(&self) -> Subscription {
        let cancelled = Arc::clone(&self.cancelled);
        Subscription::new(move || cancelled.store(true, Ordering::SeqCst))
    }

    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Keeps a producer thread's handle so a test can inspect what the producer
/// saw after the wait returned.
pub struct Late<R> {
    handle: Arc<Mutex<Option<JoinHandle<R>>>>,
}

impl<R> Clone for Late<R> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<R: Send + 'static> Late<R> {
    pub fn new() -> Self {
        Self {
            handle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn spawn(&self, work: impl FnOnce() -> R + Send + 'static) {
        *self.handle.lock().unwrap() = Some(thread::spawn(work));
    }

    pub fn join(&self) -> R {
        self.handle
            .lock()
            .unwrap()
            .take()
            .expect("producer thread was spawned")
            .join()
            .expect("producer thread panicked")
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn eventually(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

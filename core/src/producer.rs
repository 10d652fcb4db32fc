//! Push-based producers and the channel they push into.
//!
//! A [`Producer`] is subscribed exactly once with an [`EventSink`]. It may push
//! from any thread; the waiter on the other end of the channel is the only
//! reader. Releasing the [`Subscription`] closes the channel, so anything the
//! producer sends afterwards is dropped on the floor.
//!
//! Terminal methods consume the sink, so a second terminal event cannot be
//! expressed:
//!
//! ```compile_fail
//! fn twice(sink: tarry::EventSink<u8, String>) {
//!     sink.finish();
//!     sink.fail("late".to_string());
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::pin::pin;

use futures_util::future::{self, AbortHandle, Abortable};
use futures_util::stream::{self, Stream, StreamExt};
use tokio::sync::mpsc;

use tarry_types::Event;

/// Producer-facing half of a subscription.
pub struct EventSink<T, E> {
    tx: mpsc::UnboundedSender<Event<T, E>>,
}

impl<T, E> EventSink<T, E> {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Event<T, E>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit an intermediate value.
    ///
    /// Returns `false` once the waiter has released the subscription; the value
    /// is discarded in that case.
    pub fn send(&self, value: T) -> bool {
        self.tx.send(Event::Value(value)).is_ok()
    }

    /// Terminate successfully.
    pub fn finish(self) {
        let _ = self.tx.send(Event::Finished);
    }

    /// Terminate with an error.
    pub fn fail(self, error: E) {
        let _ = self.tx.send(Event::Failed(error));
    }

    /// Whether the waiter has stopped listening.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<T, E> fmt::Debug for EventSink<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("released", &self.is_released())
            .finish()
    }
}

/// Handle to a live subscription, owned by the waiter.
///
/// Cancelling (or dropping) runs the producer's teardown exactly once.
#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with no teardown of its own.
    ///
    /// Enough for producers that check [`EventSink::send`] or
    /// [`EventSink::is_released`] to stop.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn from_abort_handle(handle: AbortHandle) -> Self {
        Self::new(move || handle.abort())
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// An asynchronous, push-based value source.
pub trait Producer {
    type Output: Send + 'static;
    type Error: Send + 'static;

    /// Start emitting into `sink`.
    ///
    /// Called once, on the waiting thread, inside the waiter's tokio runtime
    /// context, so `tokio::spawn` is available here.
    fn subscribe(self, sink: EventSink<Self::Output, Self::Error>) -> Subscription;
}

/// Adapts a `Stream` of `Result`s: `Err` terminates with a failure, the end of
/// the stream terminates successfully.
#[derive(Debug)]
pub struct StreamProducer<S> {
    stream: S,
}

pub fn from_stream<S, T, E>(stream: S) -> StreamProducer<S>
where
    S: Stream<Item = Result<T, E>>,
{
    StreamProducer { stream }
}

impl<S, T, E> Producer for StreamProducer<S>
where
    S: Stream<Item = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn subscribe(self, sink: EventSink<T, E>) -> Subscription {
        let (abort_handle, abort_registration) = AbortHandle::new_pair();
        let stream = self.stream;

        let task = async move {
            let mut stream = pin!(stream);
            while let Some(item) = stream.next().await {
                match item {
                    Ok(value) => {
                        if !sink.send(value) {
                            return;
                        }
                    }
                    Err(error) => {
                        sink.fail(error);
                        return;
                    }
                }
            }
            sink.finish();
        };

        tokio::spawn(async move {
            let _ = Abortable::new(task, abort_registration).await;
        });

        Subscription::from_abort_handle(abort_handle)
    }
}

/// Adapts a callback-style subscribe function.
pub struct FnProducer<F, T, E> {
    subscribe: F,
    _events: PhantomData<fn() -> (T, E)>,
}

pub fn from_fn<F, T, E>(subscribe: F) -> FnProducer<F, T, E>
where
    F: FnOnce(EventSink<T, E>) -> Subscription,
{
    FnProducer {
        subscribe,
        _events: PhantomData,
    }
}

impl<F, T, E> Producer for FnProducer<F, T, E>
where
    F: FnOnce(EventSink<T, E>) -> Subscription,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn subscribe(self, sink: EventSink<T, E>) -> Subscription {
        (self.subscribe)(sink)
    }
}

impl<F, T, E> fmt::Debug for FnProducer<F, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProducer").finish_non_exhaustive()
    }
}

/// Emits `value`, then finishes.
pub fn just<T, E>(value: T) -> impl Producer<Output = T, Error = E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    from_stream(stream::once(future::ready(Ok::<T, E>(value))))
}

/// Emits each value in order, then finishes.
pub fn sequence<I, E>(values: I) -> impl Producer<Output = I::Item, Error = E>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
    E: Send + 'static,
{
    from_stream(stream::iter(values.into_iter().map(Ok::<I::Item, E>)))
}

/// Fails immediately with `error`.
pub fn fail<T, E>(error: E) -> impl Producer<Output = T, Error = E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    from_stream(stream::once(future::ready(Err::<T, E>(error))))
}

/// Finishes without emitting.
pub fn empty<T, E>() -> impl Producer<Output = T, Error = E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    from_stream(stream::empty::<Result<T, E>>())
}

/// Never emits and never terminates.
pub fn never<T, E>() -> impl Producer<Output = T, Error = E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    from_stream(stream::pending::<Result<T, E>>())
}

use futures_core::stream::Stream;
use parking_lot::Mutex;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, UnboundedReceiver};

type Handler<T> = Arc<Mutex<Box<dyn FnMut(&T) + Send>>>;

/// Something that pushes values to registered handlers.
///
/// Implemented by [`Subject`] (events, no memory) and
/// [`Replay`](crate::Replay) (keeps and replays its latest value).
pub trait Source<T>: Send + Sync + 'static {
    /// Registers `handler` for values emitted after this call.
    fn subscribe_changes<H>(&self, handler: H) -> Subscription
    where
        H: FnMut(&T) + Send + 'static;

    /// Registers `handler`. Sources that keep a latest value hand it over
    /// before returning.
    fn subscribe<H>(&self, handler: H) -> Subscription
    where
        H: FnMut(&T) + Send + 'static,
    {
        self.subscribe_changes(handler)
    }

    /// Returns an owned stream of every value delivered to a fresh
    /// subscription. Dropping the stream unsubscribes it.
    fn to_stream(&self) -> SubjectStream<T>
    where
        T: Clone + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |value: &T| {
            let _ = tx.send(value.clone());
        });
        SubjectStream::new(rx, subscription)
    }
}

/// Terminal teardown for anything the lifecycle manager holds on to.
pub trait Close: Send + Sync {
    fn close(&self);
    fn is_closed(&self) -> bool;
}

struct Registry<T> {
    next_id: u64,
    closed: bool,
    handlers: Vec<(u64, Handler<T>)>,
}

/// A multicast, push-only event emitter.
///
/// `emit` hands the value to every current handler in registration order and
/// never blocks on a slow consumer: stream subscribers sit behind unbounded
/// channels. After `close` the subject drops every handler, `emit` does
/// nothing and `subscribe` returns an already-closed [`Subscription`].
///
/// A handler must not emit on, or close, the subject that is calling it.
pub struct Subject<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Subject {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> Default for Subject<T> {
    fn default() -> Self {
        Subject {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                closed: false,
                handlers: Vec::new(),
            })),
        }
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("Subject")
            .field("subscribers", &registry.handlers.len())
            .field("closed", &registry.closed)
            .finish()
    }
}

impl<T: 'static> Subject<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, value: &T) {
        // Snapshot so handlers run without the registry lock held and may
        // subscribe or unsubscribe from inside a callback.
        let handlers: Vec<Handler<T>> = {
            let registry = self.registry.lock();
            if registry.closed {
                return;
            }
            registry.handlers.iter().map(|(_, h)| Arc::clone(h)).collect()
        };
        for handler in handlers {
            let mut handler = handler.lock();
            // `close` may have run since the snapshot was taken.
            if self.registry.lock().closed {
                return;
            }
            (*handler)(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().handlers.len()
    }

    fn register(&self, handler: Box<dyn FnMut(&T) + Send>) -> Subscription {
        let mut registry = self.registry.lock();
        if registry.closed {
            return Subscription::closed();
        }
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, Arc::new(Mutex::new(handler))));

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                registry.lock().handlers.retain(|(other, _)| *other != id);
            }
        })
    }
}

impl<T: Send + 'static> Source<T> for Subject<T> {
    fn subscribe_changes<H>(&self, handler: H) -> Subscription
    where
        H: FnMut(&T) + Send + 'static,
    {
        self.register(Box::new(handler))
    }
}

impl<T: Send + 'static> Close for Subject<T> {
    fn close(&self) {
        let dropped = {
            let mut registry = self.registry.lock();
            registry.closed = true;
            std::mem::take(&mut registry.handlers)
        };
        // A delivery already running on another thread finishes before close
        // returns; later ones see the closed flag and stop.
        for (_, handler) in &dropped {
            drop(handler.lock());
        }
        // Handlers (and the stream senders they own) are released outside the
        // lock so receivers observe the end of their streams.
        drop(dropped);
    }

    fn is_closed(&self) -> bool {
        self.registry.lock().closed
    }
}

/// Handle to one registered handler.
///
/// Dropping a `Subscription` keeps the handler registered; call
/// [`unsubscribe`](Subscription::unsubscribe) or hand it to the
/// [`Lifecycle`](crate::Lifecycle) to have it released on dispose.
#[must_use = "a subscription stays registered until unsubscribed"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Subscription {
            detach: Some(Box::new(detach)),
        }
    }

    /// A subscription to a source that had already closed.
    pub fn closed() -> Self {
        Subscription { detach: None }
    }

    pub fn is_closed(&self) -> bool {
        self.detach.is_none()
    }

    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// An owned stream fed by a subscription.
///
/// Ends when its source closes. Dropping it releases the subscription.
#[must_use = "Streams do nothing unless polled"]
pub struct SubjectStream<T> {
    rx: UnboundedReceiver<T>,
    subscription: Option<Subscription>,
}

impl<T> SubjectStream<T> {
    fn new(rx: UnboundedReceiver<T>, subscription: Subscription) -> Self {
        SubjectStream {
            rx,
            subscription: Some(subscription),
        }
    }

    /// Returns the next value if one is already buffered.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Stream for SubjectStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl<T> Drop for SubjectStream<T> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

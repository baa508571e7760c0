use crate::subject::{Close, Source, Subject, Subscription};
use futures_signals::signal::{Mutable, MutableSignalCloned};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A hot, last-value-replaying stream.
///
/// Holds the latest value in a [`Mutable`] and fans changes out through a
/// [`Subject`]. A new subscriber receives the current value first (the seed
/// until something is emitted), then every later emission. Only the latest
/// value is retained.
///
/// Whatever computes the values runs once per upstream emission no matter how
/// many subscribers are attached.
pub struct Replay<T> {
    latest: Mutable<T>,
    subject: Subject<T>,
    // Serializes emission against subscription so a late subscriber gets
    // either the old value plus the new one, or only the new one.
    gate: Arc<Mutex<()>>,
}

impl<T> Clone for Replay<T> {
    fn clone(&self) -> Self {
        Replay {
            latest: self.latest.clone(),
            subject: self.subject.clone(),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Replay<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replay")
            .field("latest", &self.latest.get_cloned())
            .field("subject", &self.subject)
            .finish()
    }
}

impl<T> Replay<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(seed: T) -> Self {
        Replay {
            latest: Mutable::new(seed),
            subject: Subject::new(),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// The latest value, or the seed.
    pub fn get(&self) -> T {
        self.latest.get_cloned()
    }

    pub fn emit(&self, value: T) {
        let _gate = self.gate.lock();
        if self.subject.is_closed() {
            return;
        }
        self.latest.set(value.clone());
        self.subject.emit(&value);
    }

    /// Emits only if `value` differs from the latest one.
    pub fn emit_distinct(&self, value: T)
    where
        T: PartialEq,
    {
        let _gate = self.gate.lock();
        if self.subject.is_closed() || *self.latest.lock_ref() == value {
            return;
        }
        self.latest.set(value.clone());
        self.subject.emit(&value);
    }

    /// Replaces the latest value with `reducer(latest)` and emits it.
    pub fn update<F>(&self, reducer: F)
    where
        F: FnOnce(T) -> T,
    {
        let _gate = self.gate.lock();
        if self.subject.is_closed() {
            return;
        }
        let next = reducer(self.latest.get_cloned());
        self.latest.set(next.clone());
        self.subject.emit(&next);
    }

    /// A lossy view for renderers: intermediate values may be skipped but the
    /// latest one is always observed.
    pub fn to_signal(&self) -> MutableSignalCloned<T> {
        self.latest.signal_cloned()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subject.subscriber_count()
    }
}

impl<T> Source<T> for Replay<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe_changes<H>(&self, handler: H) -> Subscription
    where
        H: FnMut(&T) + Send + 'static,
    {
        self.subject.subscribe_changes(handler)
    }

    fn subscribe<H>(&self, mut handler: H) -> Subscription
    where
        H: FnMut(&T) + Send + 'static,
    {
        let _gate = self.gate.lock();
        if self.subject.is_closed() {
            return Subscription::closed();
        }
        handler(&self.latest.get_cloned());
        self.subject.subscribe_changes(handler)
    }
}

impl<T> Close for Replay<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn close(&self) {
        let _gate = self.gate.lock();
        self.subject.close();
    }

    fn is_closed(&self) -> bool {
        self.subject.is_closed()
    }
}

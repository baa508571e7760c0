use crate::subject::{Close, Source, Subscription};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Observes values flowing through a named stream.
///
/// Attached per stream by [`Lifecycle::observe`]; the engine never writes to
/// a console on its own.
pub trait Probe: Send + Sync + 'static {
    fn record(&self, engine: &str, stream: &str, value: &dyn fmt::Debug);
}

/// A [`Probe`] that turns every value into a `tracing` event at `TRACE`
/// level under the `formrx::stream` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProbe;

impl Probe for TracingProbe {
    fn record(&self, engine: &str, stream: &str, value: &dyn fmt::Debug) {
        tracing::trace!(target: "formrx::stream", engine, stream, value = ?value);
    }
}

/// Owns every subject and subscription of one engine instance.
///
/// [`dispose`](Lifecycle::dispose) releases every subscription, then closes
/// every subject. It is idempotent and safe to call from any thread. Anything
/// registered after disposal is torn down on the spot.
pub struct Lifecycle {
    name: String,
    disposed: AtomicBool,
    token: CancellationToken,
    subscriptions: Mutex<Vec<Subscription>>,
    subjects: Mutex<Vec<Box<dyn Close>>>,
    probe: Option<Arc<dyn Probe>>,
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("name", &self.name)
            .field("disposed", &self.is_disposed())
            .field("subscriptions", &self.subscriptions.lock().len())
            .field("subjects", &self.subjects.lock().len())
            .field("probe", &self.probe.is_some())
            .finish()
    }
}

impl Lifecycle {
    pub fn new(name: impl Into<String>, probe: Option<Arc<dyn Probe>>) -> Self {
        Lifecycle {
            name: name.into(),
            disposed: AtomicBool::new(false),
            token: CancellationToken::new(),
            subscriptions: Mutex::new(Vec::new()),
            subjects: Mutex::new(Vec::new()),
            probe,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cancelled once [`dispose`](Lifecycle::dispose) starts.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn own(&self, subscription: Subscription) {
        if self.is_disposed() {
            subscription.unsubscribe();
            return;
        }
        self.subscriptions.lock().push(subscription);
    }

    pub fn track<S>(&self, subject: &S)
    where
        S: Close + Clone + 'static,
    {
        if self.is_disposed() {
            subject.close();
            return;
        }
        self.subjects.lock().push(Box::new(subject.clone()));
    }

    /// Hands every value of `source` to the configured probe, if any.
    pub fn observe<T, S>(&self, stream: impl Into<String>, source: &S)
    where
        T: fmt::Debug + 'static,
        S: Source<T>,
    {
        let Some(probe) = self.probe.clone() else {
            return;
        };
        let engine = self.name.clone();
        let stream = stream.into();
        let subscription =
            source.subscribe_changes(move |value: &T| probe.record(&engine, &stream, value));
        self.own(subscription);
    }

    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.token.cancel();

        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        let released = subscriptions.len();
        for subscription in subscriptions {
            subscription.unsubscribe();
        }

        let subjects = std::mem::take(&mut *self.subjects.lock());
        let closed = subjects.len();
        for subject in subjects {
            subject.close();
        }
        debug!(engine = %self.name, released, closed, "engine disposed");
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.dispose();
    }
}

//! The handful of combinators the engine is wired with.
//!
//! Every combinator is hot: it subscribes immediately, hands its subscription
//! to the [`Lifecycle`] and registers the stream it produces for closing. All
//! of them run synchronously inside the emission that triggers them, so the
//! ordering of the engine timeline carries through unchanged.

use crate::lifecycle::Lifecycle;
use crate::replay::Replay;
use crate::subject::{Source, Subject};
use std::sync::Arc;

/// Maps every value of `source` and replays the result, skipping consecutive
/// duplicates. The seed is computed from the current value of `source`.
pub fn map_distinct<T, U, M>(source: &Replay<T>, lifecycle: &Lifecycle, mut map: M) -> Replay<U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + PartialEq + Send + Sync + 'static,
    M: FnMut(&T) -> U + Send + 'static,
{
    let target = Replay::new(map(&source.get()));
    lifecycle.track(&target);

    let downstream = target.clone();
    lifecycle.own(source.subscribe_changes(move |value| downstream.emit_distinct(map(value))));
    target
}

/// Combines the latest values of two replayed streams, emitting whenever
/// either side changes and the combined value differs from the previous one.
pub fn combine_latest<A, B, U, F>(
    left: &Replay<A>,
    right: &Replay<B>,
    lifecycle: &Lifecycle,
    combine: F,
) -> Replay<U>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    U: Clone + PartialEq + Send + Sync + 'static,
    F: Fn(&A, &B) -> U + Send + Sync + 'static,
{
    let combine = Arc::new(combine);
    let target = Replay::new(combine(&left.get(), &right.get()));
    lifecycle.track(&target);

    {
        let (downstream, other, combine) = (target.clone(), right.clone(), combine.clone());
        lifecycle.own(left.subscribe_changes(move |a| {
            downstream.emit_distinct(combine(a, &other.get()));
        }));
    }
    {
        let (downstream, other) = (target.clone(), left.clone());
        lifecycle.own(right.subscribe_changes(move |b| {
            downstream.emit_distinct(combine(&other.get(), b));
        }));
    }
    target
}

/// Pairs each value of `trigger` with the latest value of `latest`, without
/// waiting for `latest` to emit again.
pub fn with_latest_from<A, B, S, H>(
    trigger: &S,
    latest: &Replay<B>,
    lifecycle: &Lifecycle,
    mut handler: H,
) where
    S: Source<A>,
    B: Clone + Send + Sync + 'static,
    H: FnMut(&A, B) + Send + 'static,
{
    let latest = latest.clone();
    lifecycle.own(trigger.subscribe_changes(move |a| handler(a, latest.get())));
}

/// Interleaves two sources into one subject in the order values are emitted.
pub fn merge<A, B, U, SA, SB, FA, FB>(
    left: &SA,
    right: &SB,
    lifecycle: &Lifecycle,
    lift_left: FA,
    lift_right: FB,
) -> Subject<U>
where
    SA: Source<A>,
    SB: Source<B>,
    U: Send + 'static,
    FA: Fn(&A) -> U + Send + 'static,
    FB: Fn(&B) -> U + Send + 'static,
{
    let target = Subject::new();
    lifecycle.track(&target);

    let downstream = target.clone();
    lifecycle.own(left.subscribe_changes(move |a| downstream.emit(&lift_left(a))));
    let downstream = target.clone();
    lifecycle.own(right.subscribe_changes(move |b| downstream.emit(&lift_right(b))));
    target
}

/// Folds every value of `source` into an accumulated, replayed state.
pub fn fold<T, U, S, F>(source: &S, lifecycle: &Lifecycle, seed: U, mut step: F) -> Replay<U>
where
    S: Source<T>,
    U: Clone + Send + Sync + 'static,
    F: FnMut(U, &T) -> U + Send + 'static,
{
    let target = Replay::new(seed);
    lifecycle.track(&target);

    let downstream = target.clone();
    lifecycle.own(source.subscribe_changes(move |value| {
        downstream.update(|state| step(state, value));
    }));
    target
}

//! Sequence operators and terminal reducers.
//!
//! Every operator here is a plain composition over the public bridge
//! contract: transforming operators wrap an inner production routine that
//! [`drive`]s the upstream sequence and yields into a downstream
//! [`Producer`](crate::Producer); terminal reducers drive the sequence and
//! fold items into a result. None of them touch the bridge internals, so
//! they all inherit its ordering, cancellation, and disposal guarantees.

use std::collections::HashMap;
use std::hash::Hash;

use async_trait::async_trait;

use crate::drive::{LoopContext, drive};
use crate::producer::Producer;
use crate::sequence::{PushSequence, Sequence};

mod collect;
mod concat;
mod distinct;
mod filter;
mod first;
mod fold;
mod join;
mod skip;
mod take;
mod transform;
mod zip;

/// Pump every item of `sequence` into `producer`.
///
/// The backbone of most operators: drive upstream, republish downstream.
pub(crate) async fn pump<T, S>(sequence: &S, producer: &Producer<T>) -> anyhow::Result<()>
where
    T: Send + 'static,
    S: Sequence<T> + ?Sized,
{
    drive(sequence, move |ctx: LoopContext<T>| {
        let producer = producer.clone();
        async move {
            producer.yield_value(ctx.item).await?;
            Ok(())
        }
    })
    .await
}

/// Chainable operators over any [`Sequence`].
///
/// Blanket-implemented; bring the trait into scope and compose:
///
/// ```rust
/// use pullseq::{SequenceExt, from_iter};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let result = from_iter(0u64..100)
///     .map(|n| n * 3)
///     .filter(|n| n % 2 == 0)
///     .take(3)
///     .to_vec()
///     .await?;
/// assert_eq!(result, vec![0, 6, 12]);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait SequenceExt<T>: Sequence<T> + Sized + Send + Sync + 'static
where
    T: Send + 'static,
{
    /// Transform every item.
    fn map<U, F>(self, transform: F) -> PushSequence<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        transform::map(self, transform)
    }

    /// Transform every item together with its 0-based position.
    fn map_indexed<U, F>(self, transform: F) -> PushSequence<U>
    where
        U: Send + 'static,
        F: Fn(T, u64) -> U + Send + Sync + 'static,
    {
        transform::map_indexed(self, transform)
    }

    /// Map each item to an inner sequence and flatten the results in order.
    fn flat_map<U, S2, F>(self, transform: F) -> PushSequence<U>
    where
        U: Send + 'static,
        S2: Sequence<U> + Send + Sync + 'static,
        F: Fn(T) -> S2 + Send + Sync + 'static,
    {
        transform::flat_map(self, transform)
    }

    /// Keep only items matching the predicate.
    fn filter<F>(self, predicate: F) -> PushSequence<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        filter::filter(self, predicate)
    }

    /// At most the first `count` items; upstream is abandoned right after
    /// the last one, so it works on infinite sequences.
    fn take(self, count: u64) -> PushSequence<T> {
        take::take(self, count)
    }

    /// Items until the predicate first fails (that item is not included).
    fn take_while<F>(self, predicate: F) -> PushSequence<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        take::take_while(self, predicate)
    }

    /// Everything after the first `count` items.
    fn skip(self, count: u64) -> PushSequence<T> {
        skip::skip(self, count)
    }

    /// Everything starting from the first item that fails the predicate.
    fn skip_while<F>(self, predicate: F) -> PushSequence<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        skip::skip_while(self, predicate)
    }

    /// This sequence, then `other`.
    fn concat<S2>(self, other: S2) -> PushSequence<T>
    where
        S2: Sequence<T> + Send + Sync + 'static,
    {
        concat::concat(self, other)
    }

    /// Pairs of items pulled in lockstep; ends with the shorter side.
    fn zip<U, S2>(self, other: S2) -> PushSequence<(T, U)>
    where
        U: Send + 'static,
        S2: Sequence<U> + Send + Sync + 'static,
    {
        zip::zip(self, other)
    }

    /// Drop items already seen earlier in the run.
    fn distinct(self) -> PushSequence<T>
    where
        T: Eq + Hash + Clone,
    {
        distinct::distinct(self)
    }

    /// Distinct items of this sequence and then of `other`.
    fn union<S2>(self, other: S2) -> PushSequence<T>
    where
        T: Eq + Hash + Clone,
        S2: Sequence<T> + Send + Sync + 'static,
    {
        distinct::union(self, other)
    }

    /// Distinct items of this sequence that also occur in `other`.
    fn intersect<S2>(self, other: S2) -> PushSequence<T>
    where
        T: Eq + Hash,
        S2: Sequence<T> + Send + Sync + 'static,
    {
        distinct::intersect(self, other)
    }

    /// Hash join with `inner` on matching keys.
    ///
    /// The inner sequence is materialized into key buckets first; outer
    /// items then stream through in order, emitting one merged item per
    /// match.
    fn join<U, K, R, S2, OK, IK, F>(
        self,
        inner: S2,
        outer_key: OK,
        inner_key: IK,
        merge: F,
    ) -> PushSequence<R>
    where
        U: Send + 'static,
        K: Eq + Hash + Send + 'static,
        R: Send + 'static,
        S2: Sequence<U> + Send + Sync + 'static,
        OK: Fn(&T) -> K + Send + Sync + 'static,
        IK: Fn(&U) -> K + Send + Sync + 'static,
        F: Fn(&T, &U) -> R + Send + Sync + 'static,
    {
        join::join(self, inner, outer_key, inner_key, merge)
    }

    /// Items sorted ascending by key (stable). Materializes the whole run
    /// first.
    fn order_by<K, F>(self, key: F) -> PushSequence<T>
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        collect::order_by(self, key)
    }

    /// Items in reverse order. Materializes the whole run first.
    fn reverse(self) -> PushSequence<T> {
        collect::reverse(self)
    }

    /// Reduce the sequence with an accumulator.
    async fn fold<A, F>(self, seed: A, fold: F) -> anyhow::Result<A>
    where
        A: Send + 'static,
        F: FnMut(A, T) -> A + Send,
    {
        fold::fold(&self, seed, fold).await
    }

    /// Number of items in the sequence.
    async fn count(self) -> anyhow::Result<u64> {
        fold::count(&self).await
    }

    /// Sum of all items; the additive zero for an empty sequence.
    async fn sum(self) -> anyhow::Result<T>
    where
        T: std::ops::Add<Output = T> + Default,
    {
        fold::sum(&self).await
    }

    /// Arithmetic mean of the items, or `None` for an empty sequence.
    async fn average(self) -> anyhow::Result<Option<f64>>
    where
        T: Into<f64>,
    {
        fold::average(&self).await
    }

    /// Smallest item, or `None` for an empty sequence.
    async fn min(self) -> anyhow::Result<Option<T>>
    where
        T: Ord,
    {
        fold::min(&self).await
    }

    /// Largest item, or `None` for an empty sequence.
    async fn max(self) -> anyhow::Result<Option<T>>
    where
        T: Ord,
    {
        fold::max(&self).await
    }

    /// True if `needle` occurs in the sequence; stops pulling at the first
    /// match.
    async fn contains(self, needle: T) -> anyhow::Result<bool>
    where
        T: PartialEq + Send,
    {
        fold::contains(&self, needle).await
    }

    /// The first item, abandoning the rest of the sequence.
    async fn first(self) -> anyhow::Result<Option<T>> {
        first::first_where(&self, |_| true).await
    }

    /// The first item matching the predicate, abandoning the rest.
    async fn first_where<F>(self, predicate: F) -> anyhow::Result<Option<T>>
    where
        F: Fn(&T) -> bool + Send,
    {
        first::first_where(&self, predicate).await
    }

    /// The item of a one-item sequence.
    ///
    /// Fails if the sequence is empty or holds more than one item; a second
    /// item stops the pull immediately.
    async fn single(self) -> anyhow::Result<T> {
        first::single(&self).await
    }

    /// The final item of the sequence.
    async fn last(self) -> anyhow::Result<Option<T>> {
        first::last(&self).await
    }

    /// True if both sequences yield equal items in the same order and end
    /// together. Stops pulling at the first difference.
    async fn sequence_equal<S2>(self, other: S2) -> anyhow::Result<bool>
    where
        T: PartialEq,
        S2: Sequence<T> + Send + Sync + 'static,
    {
        zip::sequence_equal(&self, &other).await
    }

    /// Collect the whole run, in order.
    async fn to_vec(self) -> anyhow::Result<Vec<T>> {
        collect::to_vec(&self).await
    }

    /// Collect into a map keyed by `key`; later items win on collision.
    async fn to_map<K, F>(self, key: F) -> anyhow::Result<HashMap<K, T>>
    where
        K: Eq + Hash + Send + 'static,
        F: Fn(&T) -> K + Send,
    {
        collect::to_map(&self, key).await
    }
}

impl<T, S> SequenceExt<T> for S
where
    T: Send + 'static,
    S: Sequence<T> + Send + Sync + 'static,
{
}

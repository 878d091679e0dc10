//! Set-flavored operators: `distinct`, `union`, `intersect`.
//!
//! Each run keeps its own seen-set; state never leaks between iterations of
//! the same sequence value.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::drive::{LoopContext, drive};
use crate::producer::Producer;
use crate::sequence::{PushSequence, Sequence, create};

/// Pump `sequence` into `producer`, dropping items already in `seen`.
async fn pump_distinct<T, S>(
    sequence: &S,
    producer: &Producer<T>,
    seen: &Mutex<HashSet<T>>,
) -> anyhow::Result<()>
where
    T: Eq + Hash + Clone + Send + 'static,
    S: Sequence<T> + ?Sized,
{
    drive(sequence, move |ctx: LoopContext<T>| {
        let producer = producer.clone();
        let fresh = seen.lock().insert(ctx.item.clone());
        async move {
            if fresh {
                producer.yield_value(ctx.item).await?;
            }
            Ok(())
        }
    })
    .await
}

pub(crate) fn distinct<T, S>(upstream: S) -> PushSequence<T>
where
    T: Eq + Hash + Clone + Send + 'static,
    S: Sequence<T> + Send + Sync + 'static,
{
    let upstream = Arc::new(upstream);
    create(move |producer| {
        let upstream = Arc::clone(&upstream);
        async move {
            let seen = Mutex::new(HashSet::new());
            pump_distinct(&*upstream, &producer, &seen).await
        }
    })
}

pub(crate) fn union<T, S1, S2>(left: S1, right: S2) -> PushSequence<T>
where
    T: Eq + Hash + Clone + Send + 'static,
    S1: Sequence<T> + Send + Sync + 'static,
    S2: Sequence<T> + Send + Sync + 'static,
{
    let left = Arc::new(left);
    let right = Arc::new(right);
    create(move |producer| {
        let left = Arc::clone(&left);
        let right = Arc::clone(&right);
        async move {
            // One seen-set across both inputs, so duplicates between the two
            // sides collapse as well.
            let seen = Mutex::new(HashSet::new());
            pump_distinct(&*left, &producer, &seen).await?;
            pump_distinct(&*right, &producer, &seen).await?;
            Ok(())
        }
    })
}

pub(crate) fn intersect<T, S1, S2>(left: S1, right: S2) -> PushSequence<T>
where
    T: Eq + Hash + Send + 'static,
    S1: Sequence<T> + Send + Sync + 'static,
    S2: Sequence<T> + Send + Sync + 'static,
{
    let left = Arc::new(left);
    let right = Arc::new(right);
    create(move |producer| {
        let left = Arc::clone(&left);
        let right = Arc::clone(&right);
        async move {
            let keep: Arc<Mutex<HashSet<T>>> = Arc::new(Mutex::new(HashSet::new()));
            let sink = Arc::clone(&keep);
            drive(&*right, move |ctx: LoopContext<T>| {
                sink.lock().insert(ctx.item);
                std::future::ready(Ok(()))
            })
            .await?;

            // Removing as we match makes the output distinct: each shared
            // value appears at most once.
            drive(&*left, move |ctx: LoopContext<T>| {
                let producer = producer.clone();
                let matched = keep.lock().remove(&ctx.item);
                async move {
                    if matched {
                        producer.yield_value(ctx.item).await?;
                    }
                    Ok(())
                }
            })
            .await
        }
    })
}

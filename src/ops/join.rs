//! The `join` operator: hash join of two sequences on matching keys.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::drive::{LoopContext, drive};
use crate::sequence::{PushSequence, Sequence, create};

/// Build phase materializes the inner sequence into key buckets; probe phase
/// streams the outer sequence against them. Outer order is preserved, and
/// inner matches for one outer item come out in inner arrival order.
pub(crate) fn join<T, U, K, R, S1, S2, OK, IK, F>(
    outer: S1,
    inner: S2,
    outer_key: OK,
    inner_key: IK,
    merge: F,
) -> PushSequence<R>
where
    T: Send + 'static,
    U: Send + 'static,
    K: Eq + Hash + Send + 'static,
    R: Send + 'static,
    S1: Sequence<T> + Send + Sync + 'static,
    S2: Sequence<U> + Send + Sync + 'static,
    OK: Fn(&T) -> K + Send + Sync + 'static,
    IK: Fn(&U) -> K + Send + Sync + 'static,
    F: Fn(&T, &U) -> R + Send + Sync + 'static,
{
    let outer = Arc::new(outer);
    let inner = Arc::new(inner);
    let outer_key = Arc::new(outer_key);
    let inner_key = Arc::new(inner_key);
    let merge = Arc::new(merge);
    create(move |producer| {
        let outer = Arc::clone(&outer);
        let inner = Arc::clone(&inner);
        let outer_key = Arc::clone(&outer_key);
        let inner_key = Arc::clone(&inner_key);
        let merge = Arc::clone(&merge);
        async move {
            let buckets: Arc<Mutex<HashMap<K, Vec<U>>>> = Arc::new(Mutex::new(HashMap::new()));
            {
                let sink = Arc::clone(&buckets);
                drive(&*inner, move |ctx: LoopContext<U>| {
                    let key = (*inner_key)(&ctx.item);
                    sink.lock().entry(key).or_default().push(ctx.item);
                    std::future::ready(Ok(()))
                })
                .await?;
            }

            drive(&*outer, move |ctx: LoopContext<T>| {
                let producer = producer.clone();
                let merged: Vec<R> = match buckets.lock().get(&(*outer_key)(&ctx.item)) {
                    Some(matches) => matches.iter().map(|m| (*merge)(&ctx.item, m)).collect(),
                    None => Vec::new(),
                };
                async move {
                    for item in merged {
                        producer.yield_value(item).await?;
                    }
                    Ok(())
                }
            })
            .await
        }
    })
}

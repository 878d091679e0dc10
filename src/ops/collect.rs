//! Materializing operators: `to_vec`, `to_map`, `order_by`, `reverse`.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::drive::{LoopContext, drive};
use crate::sequence::{PushSequence, Sequence, create};

pub(crate) async fn to_vec<T, S>(sequence: &S) -> anyhow::Result<Vec<T>>
where
    T: Send + 'static,
    S: Sequence<T> + ?Sized,
{
    let items: Mutex<Vec<T>> = Mutex::new(Vec::new());
    {
        let items = &items;
        drive(sequence, move |ctx: LoopContext<T>| {
            items.lock().push(ctx.item);
            std::future::ready(Ok(()))
        })
        .await?;
    }
    Ok(items.into_inner())
}

pub(crate) async fn to_map<T, S, K, F>(sequence: &S, key: F) -> anyhow::Result<HashMap<K, T>>
where
    T: Send + 'static,
    S: Sequence<T> + ?Sized,
    K: Eq + Hash + Send + 'static,
    F: Fn(&T) -> K + Send,
{
    let map: Mutex<HashMap<K, T>> = Mutex::new(HashMap::new());
    {
        let map = &map;
        drive(sequence, move |ctx: LoopContext<T>| {
            let k = key(&ctx.item);
            map.lock().insert(k, ctx.item);
            std::future::ready(Ok(()))
        })
        .await?;
    }
    Ok(map.into_inner())
}

pub(crate) fn order_by<T, K, S, F>(upstream: S, key: F) -> PushSequence<T>
where
    T: Send + 'static,
    K: Ord,
    S: Sequence<T> + Send + Sync + 'static,
    F: Fn(&T) -> K + Send + Sync + 'static,
{
    let upstream = Arc::new(upstream);
    let key = Arc::new(key);
    create(move |producer| {
        let upstream = Arc::clone(&upstream);
        let key = Arc::clone(&key);
        async move {
            let mut items = to_vec(&*upstream).await?;
            // Stable: items with equal keys keep their arrival order.
            items.sort_by(|a, b| (*key)(a).cmp(&(*key)(b)));
            for item in items {
                producer.yield_value(item).await?;
            }
            Ok(())
        }
    })
}

pub(crate) fn reverse<T, S>(upstream: S) -> PushSequence<T>
where
    T: Send + 'static,
    S: Sequence<T> + Send + Sync + 'static,
{
    let upstream = Arc::new(upstream);
    create(move |producer| {
        let upstream = Arc::clone(&upstream);
        async move {
            let mut items = to_vec(&*upstream).await?;
            items.reverse();
            for item in items {
                producer.yield_value(item).await?;
            }
            Ok(())
        }
    })
}

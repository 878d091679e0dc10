//! Item-rewriting operators: `map`, `map_indexed`, `flat_map`.

use std::sync::Arc;

use crate::drive::{LoopContext, drive};
use crate::sequence::{PushSequence, Sequence, create};

pub(crate) fn map<T, U, S, F>(upstream: S, transform: F) -> PushSequence<U>
where
    T: Send + 'static,
    U: Send + 'static,
    S: Sequence<T> + Send + Sync + 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let upstream = Arc::new(upstream);
    let transform = Arc::new(transform);
    create(move |producer| {
        let upstream = Arc::clone(&upstream);
        let transform = Arc::clone(&transform);
        async move {
            drive(&*upstream, move |ctx: LoopContext<T>| {
                let producer = producer.clone();
                let transform = Arc::clone(&transform);
                async move {
                    producer.yield_value((*transform)(ctx.item)).await?;
                    Ok(())
                }
            })
            .await
        }
    })
}

pub(crate) fn map_indexed<T, U, S, F>(upstream: S, transform: F) -> PushSequence<U>
where
    T: Send + 'static,
    U: Send + 'static,
    S: Sequence<T> + Send + Sync + 'static,
    F: Fn(T, u64) -> U + Send + Sync + 'static,
{
    let upstream = Arc::new(upstream);
    let transform = Arc::new(transform);
    create(move |producer| {
        let upstream = Arc::clone(&upstream);
        let transform = Arc::clone(&transform);
        async move {
            drive(&*upstream, move |ctx: LoopContext<T>| {
                let producer = producer.clone();
                let transform = Arc::clone(&transform);
                async move {
                    producer.yield_value((*transform)(ctx.item, ctx.index)).await?;
                    Ok(())
                }
            })
            .await
        }
    })
}

pub(crate) fn flat_map<T, U, S, S2, F>(upstream: S, transform: F) -> PushSequence<U>
where
    T: Send + 'static,
    U: Send + 'static,
    S: Sequence<T> + Send + Sync + 'static,
    S2: Sequence<U> + Send + Sync + 'static,
    F: Fn(T) -> S2 + Send + Sync + 'static,
{
    let upstream = Arc::new(upstream);
    let transform = Arc::new(transform);
    create(move |producer| {
        let upstream = Arc::clone(&upstream);
        let transform = Arc::clone(&transform);
        async move {
            drive(&*upstream, move |ctx: LoopContext<T>| {
                let producer = producer.clone();
                let transform = Arc::clone(&transform);
                async move {
                    let inner = (*transform)(ctx.item);
                    super::pump(&inner, &producer).await
                }
            })
            .await
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::convert::from_iter;
    use crate::ops::SequenceExt;

    #[tokio::test]
    async fn map_rewrites_every_item_in_order() {
        let doubled = from_iter(vec![1u32, 2, 3])
            .map(|n| n * 2)
            .to_vec()
            .await
            .expect("to_vec");
        assert_eq!(doubled, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn map_indexed_sees_dense_positions() {
        let tagged = from_iter(vec!["a", "b", "c"])
            .map_indexed(|item, index| format!("{index}:{item}"))
            .to_vec()
            .await
            .expect("to_vec");
        assert_eq!(tagged, vec!["0:a", "1:b", "2:c"]);
    }

    #[tokio::test]
    async fn flat_map_flattens_inner_runs_in_order() {
        let flattened = from_iter(vec![1u32, 3])
            .flat_map(|n| from_iter(vec![n, n + 1]))
            .to_vec()
            .await
            .expect("to_vec");
        assert_eq!(flattened, vec![1, 2, 3, 4]);
    }
}

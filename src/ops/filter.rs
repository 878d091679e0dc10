//! The `filter` operator.

use std::sync::Arc;

use crate::drive::{LoopContext, drive};
use crate::sequence::{PushSequence, Sequence, create};

pub(crate) fn filter<T, S, F>(upstream: S, predicate: F) -> PushSequence<T>
where
    T: Send + 'static,
    S: Sequence<T> + Send + Sync + 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    let upstream = Arc::new(upstream);
    let predicate = Arc::new(predicate);
    create(move |producer| {
        let upstream = Arc::clone(&upstream);
        let predicate = Arc::clone(&predicate);
        async move {
            drive(&*upstream, move |ctx: LoopContext<T>| {
                let producer = producer.clone();
                let keep = (*predicate)(&ctx.item);
                async move {
                    if keep {
                        producer.yield_value(ctx.item).await?;
                    }
                    Ok(())
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
    async fn filter_keeps_only_matching_items() {
        let evens = from_iter(0u32..8)
            .filter(|n| n % 2 == 0)
            .to_vec()
            .await
            .expect("to_vec");
        assert_eq!(evens, vec![0, 2, 4, 6]);
    }

    #[tokio::test]
    async fn filter_of_nothing_is_empty() {
        let none = from_iter(0u32..8)
            .filter(|_| false)
            .to_vec()
            .await
            .expect("to_vec");
        assert!(none.is_empty());
    }
}

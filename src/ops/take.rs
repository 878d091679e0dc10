//! Prefix operators: `take`, `take_while`.
//!
//! Both stop pulling upstream as soon as the prefix ends, so they are safe
//! over infinite sequences: the upstream run is abandoned and its producer
//! cancelled by the driver loop's disposal.

use std::sync::Arc;

use crate::drive::{LoopContext, drive};
use crate::sequence::{PushSequence, Sequence, create};

pub(crate) fn take<T, S>(upstream: S, count: u64) -> PushSequence<T>
where
    T: Send + 'static,
    S: Sequence<T> + Send + Sync + 'static,
{
    let upstream = Arc::new(upstream);
    create(move |producer| {
        let upstream = Arc::clone(&upstream);
        async move {
            if count == 0 {
                return Ok(());
            }
            drive(&*upstream, move |ctx: LoopContext<T>| {
                let producer = producer.clone();
                async move {
                    if ctx.index + 1 >= count {
                        ctx.break_loop();
                    }
                    producer.yield_value(ctx.item).await?;
                    Ok(())
                }
            })
            .await
        }
    })
}

pub(crate) fn take_while<T, S, F>(upstream: S, predicate: F) -> PushSequence<T>
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
                    if !keep {
                        ctx.break_loop();
                        return Ok(());
                    }
                    producer.yield_value(ctx.item).await?;
                    Ok(())
                }
            })
            .await
        }
    })
}

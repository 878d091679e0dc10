//! Suffix operators: `skip`, `skip_while`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::drive::{LoopContext, drive};
use crate::sequence::{PushSequence, Sequence, create};

pub(crate) fn skip<T, S>(upstream: S, count: u64) -> PushSequence<T>
where
    T: Send + 'static,
    S: Sequence<T> + Send + Sync + 'static,
{
    let upstream = Arc::new(upstream);
    create(move |producer| {
        let upstream = Arc::clone(&upstream);
        async move {
            drive(&*upstream, move |ctx: LoopContext<T>| {
                let producer = producer.clone();
                async move {
                    if ctx.index >= count {
                        producer.yield_value(ctx.item).await?;
                    }
                    Ok(())
                }
            })
            .await
        }
    })
}

pub(crate) fn skip_while<T, S, F>(upstream: S, predicate: F) -> PushSequence<T>
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
        // Per-run state: once the predicate fails, every later item passes.
        let emitting = Arc::new(AtomicBool::new(false));
        async move {
            drive(&*upstream, move |ctx: LoopContext<T>| {
                let producer = producer.clone();
                if !emitting.load(Ordering::Relaxed) && !(*predicate)(&ctx.item) {
                    emitting.store(true, Ordering::Relaxed);
                }
                let emit = emitting.load(Ordering::Relaxed);
                async move {
                    if emit {
                        producer.yield_value(ctx.item).await?;
                    }
                    Ok(())
                }
            })
            .await
        }
    })
}

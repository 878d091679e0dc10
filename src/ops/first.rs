//! Positional reducers: `first`, `first_where`, `single`, `last`.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::drive::{LoopContext, drive};
use crate::sequence::Sequence;

pub(crate) async fn first_where<T, S, F>(sequence: &S, predicate: F) -> anyhow::Result<Option<T>>
where
    T: Send + 'static,
    S: Sequence<T> + ?Sized,
    F: Fn(&T) -> bool + Send,
{
    let slot: Mutex<Option<T>> = Mutex::new(None);
    {
        let slot = &slot;
        drive(sequence, move |ctx: LoopContext<T>| {
            if predicate(&ctx.item) {
                ctx.break_loop();
                *slot.lock() = Some(ctx.item);
            }
            std::future::ready(Ok(()))
        })
        .await?;
    }
    Ok(slot.into_inner())
}

pub(crate) async fn single<T, S>(sequence: &S) -> anyhow::Result<T>
where
    T: Send + 'static,
    S: Sequence<T> + ?Sized,
{
    let slot: Mutex<Option<T>> = Mutex::new(None);
    let extra = AtomicBool::new(false);
    {
        let slot = &slot;
        let extra = &extra;
        drive(sequence, move |ctx: LoopContext<T>| {
            let mut slot = slot.lock();
            if slot.is_none() {
                *slot = Some(ctx.item);
            } else {
                extra.store(true, Ordering::Relaxed);
                ctx.break_loop();
            }
            std::future::ready(Ok(()))
        })
        .await?;
    }
    if extra.into_inner() {
        anyhow::bail!("sequence contained more than one item");
    }
    slot.into_inner()
        .ok_or_else(|| anyhow::anyhow!("sequence contained no items"))
}

pub(crate) async fn last<T, S>(sequence: &S) -> anyhow::Result<Option<T>>
where
    T: Send + 'static,
    S: Sequence<T> + ?Sized,
{
    let slot: Mutex<Option<T>> = Mutex::new(None);
    {
        let slot = &slot;
        drive(sequence, move |ctx: LoopContext<T>| {
            *slot.lock() = Some(ctx.item);
            std::future::ready(Ok(()))
        })
        .await?;
    }
    Ok(slot.into_inner())
}

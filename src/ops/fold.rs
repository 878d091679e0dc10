//! Folding reducers: `fold`, `count`, `sum`, `average`, `min`, `max`,
//! `contains`.

use std::cmp;
use std::ops::Add;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::drive::{LoopContext, drive};
use crate::sequence::Sequence;

pub(crate) async fn fold<T, S, A, F>(sequence: &S, seed: A, mut fold: F) -> anyhow::Result<A>
where
    T: Send + 'static,
    S: Sequence<T> + ?Sized,
    A: Send + 'static,
    F: FnMut(A, T) -> A + Send,
{
    let state = Mutex::new(Some(seed));
    {
        let state = &state;
        drive(sequence, move |ctx: LoopContext<T>| {
            let mut slot = state.lock();
            if let Some(acc) = slot.take() {
                *slot = Some(fold(acc, ctx.item));
            }
            std::future::ready(Ok(()))
        })
        .await?;
    }
    state
        .into_inner()
        .ok_or_else(|| anyhow::anyhow!("fold accumulator vanished mid-run"))
}

pub(crate) async fn count<T, S>(sequence: &S) -> anyhow::Result<u64>
where
    T: Send + 'static,
    S: Sequence<T> + ?Sized,
{
    let total = AtomicU64::new(0);
    {
        let total = &total;
        drive(sequence, move |_ctx: LoopContext<T>| {
            total.fetch_add(1, Ordering::Relaxed);
            std::future::ready(Ok(()))
        })
        .await?;
    }
    Ok(total.into_inner())
}

pub(crate) async fn sum<T, S>(sequence: &S) -> anyhow::Result<T>
where
    T: Add<Output = T> + Default + Send + 'static,
    S: Sequence<T> + ?Sized,
{
    fold(sequence, T::default(), |acc, item| acc + item).await
}

pub(crate) async fn average<T, S>(sequence: &S) -> anyhow::Result<Option<f64>>
where
    T: Into<f64> + Send + 'static,
    S: Sequence<T> + ?Sized,
{
    let (total, count) = fold(sequence, (0.0f64, 0u64), |(total, count), item| {
        (total + item.into(), count + 1)
    })
    .await?;
    Ok((count > 0).then(|| total / count as f64))
}

pub(crate) async fn min<T, S>(sequence: &S) -> anyhow::Result<Option<T>>
where
    T: Ord + Send + 'static,
    S: Sequence<T> + ?Sized,
{
    // Ties keep the earlier item.
    fold(sequence, None, |best, item| {
        Some(match best {
            None => item,
            Some(current) => cmp::min(current, item),
        })
    })
    .await
}

pub(crate) async fn max<T, S>(sequence: &S) -> anyhow::Result<Option<T>>
where
    T: Ord + Send + 'static,
    S: Sequence<T> + ?Sized,
{
    fold(sequence, None, |best, item| {
        Some(match best {
            None => item,
            Some(current) => cmp::max(current, item),
        })
    })
    .await
}

pub(crate) async fn contains<T, S>(sequence: &S, needle: T) -> anyhow::Result<bool>
where
    T: PartialEq + Send + 'static,
    S: Sequence<T> + ?Sized,
{
    let found = AtomicBool::new(false);
    {
        let found = &found;
        drive(sequence, move |ctx: LoopContext<T>| {
            if ctx.item == needle {
                found.store(true, Ordering::Relaxed);
                ctx.break_loop();
            }
            std::future::ready(Ok(()))
        })
        .await?;
    }
    Ok(found.into_inner())
}

#[cfg(test)]
mod tests {
    use crate::convert::from_iter;
    use crate::ops::SequenceExt;
    use crate::sequence::empty;

    #[tokio::test]
    async fn fold_threads_the_accumulator_in_order() {
        let joined = from_iter(vec!["a", "b", "c"])
            .fold(String::new(), |mut acc, item| {
                acc.push_str(item);
                acc
            })
            .await
            .expect("fold");
        assert_eq!(joined, "abc");
    }

    #[tokio::test]
    async fn count_and_extrema() {
        assert_eq!(from_iter(vec![5u32, 1, 9, 3]).count().await.expect("count"), 4);
        assert_eq!(
            from_iter(vec![5u32, 1, 9, 3]).min().await.expect("min"),
            Some(1)
        );
        assert_eq!(
            from_iter(vec![5u32, 1, 9, 3]).max().await.expect("max"),
            Some(9)
        );
        assert_eq!(empty::<u32>().min().await.expect("min"), None);
    }

    #[tokio::test]
    async fn sum_and_average() {
        assert_eq!(from_iter(vec![1u32, 2, 3, 4]).sum().await.expect("sum"), 10);
        assert_eq!(from_iter(Vec::<u32>::new()).sum().await.expect("sum"), 0);
        assert_eq!(
            from_iter(vec![1.0f64, 2.0, 6.0]).average().await.expect("average"),
            Some(3.0)
        );
        assert_eq!(
            from_iter(Vec::<u32>::new()).average().await.expect("average"),
            None
        );
    }

    #[tokio::test]
    async fn contains_stops_at_the_first_match() {
        let haystack = from_iter(0u64..1_000_000);
        assert!(haystack.clone().contains(3).await.expect("contains"));
        assert!(!from_iter(0u64..10).contains(42).await.expect("contains"));
    }
}

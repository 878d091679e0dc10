//! Lockstep operators: `zip` and `sequence_equal`.
//!
//! These cannot be written as a single driver loop: they hold two upstream
//! iterators open at once and advance them in lockstep. Both iterators are
//! disposed on every exit path, and a disposal failure never shadows the
//! fault that ended the run.

use std::sync::Arc;

use crate::drive::merge_with_disposal;
use crate::sequence::{PushSequence, Sequence, create};

pub(crate) fn zip<T, U, S1, S2>(left: S1, right: S2) -> PushSequence<(T, U)>
where
    T: Send + 'static,
    U: Send + 'static,
    S1: Sequence<T> + Send + Sync + 'static,
    S2: Sequence<U> + Send + Sync + 'static,
{
    let left = Arc::new(left);
    let right = Arc::new(right);
    create(move |producer| {
        let left = Arc::clone(&left);
        let right = Arc::clone(&right);
        async move {
            let mut lhs = left.create_iterator();
            let mut rhs = right.create_iterator();

            let outcome: anyhow::Result<()> = async {
                loop {
                    if !lhs.move_next().await? {
                        return Ok(());
                    }
                    let Some(a) = lhs.current() else {
                        return Ok(());
                    };
                    if !rhs.move_next().await? {
                        return Ok(());
                    }
                    let Some(b) = rhs.current() else {
                        return Ok(());
                    };
                    producer.yield_value((a, b)).await?;
                }
            }
            .await;

            let disposal = match (lhs.dispose().await, rhs.dispose().await) {
                (Ok(()), Ok(())) => Ok(()),
                (Err(error), _) | (Ok(()), Err(error)) => Err(error),
            };
            merge_with_disposal(outcome, disposal)
        }
    })
}

pub(crate) async fn sequence_equal<T, S1, S2>(left: &S1, right: &S2) -> anyhow::Result<bool>
where
    T: PartialEq + Send + 'static,
    S1: Sequence<T> + ?Sized,
    S2: Sequence<T> + ?Sized,
{
    let mut lhs = left.create_iterator();
    let mut rhs = right.create_iterator();

    let mut equal = true;
    let outcome: anyhow::Result<()> = async {
        loop {
            let left_has = lhs.move_next().await?;
            let right_has = rhs.move_next().await?;
            if !left_has || !right_has {
                equal = left_has == right_has;
                return Ok(());
            }
            match (lhs.current(), rhs.current()) {
                (Some(a), Some(b)) if a == b => {}
                _ => {
                    equal = false;
                    return Ok(());
                }
            }
        }
    }
    .await;

    let disposal = match (lhs.dispose().await, rhs.dispose().await) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(error), _) | (Ok(()), Err(error)) => Err(error),
    };
    merge_with_disposal(outcome, disposal)?;
    Ok(equal)
}

#[cfg(test)]
mod tests {
    use crate::convert::from_iter;
    use crate::ops::SequenceExt;
    use crate::sequence::create;

    #[tokio::test]
    async fn zip_pairs_in_lockstep() {
        let pairs = from_iter(vec![1u32, 2, 3])
            .zip(from_iter(vec!["one", "two", "three"]))
            .to_vec()
            .await
            .expect("to_vec");
        assert_eq!(pairs, vec![(1, "one"), (2, "two"), (3, "three")]);
    }

    #[tokio::test]
    async fn zip_ends_with_the_shorter_side() {
        let naturals = create(|producer| async move {
            let mut n = 0u64;
            loop {
                producer.yield_value(n).await?;
                n += 1;
            }
        });
        let pairs = from_iter(vec!['a', 'b'])
            .zip(naturals)
            .to_vec()
            .await
            .expect("to_vec");
        assert_eq!(pairs, vec![('a', 0), ('b', 1)]);
    }

    #[tokio::test]
    async fn sequence_equal_compares_pairwise() {
        let reference = from_iter(vec![1u32, 2, 3]);
        assert!(
            reference
                .clone()
                .sequence_equal(from_iter(vec![1, 2, 3]))
                .await
                .expect("equal")
        );
        assert!(
            !reference
                .clone()
                .sequence_equal(from_iter(vec![1, 2]))
                .await
                .expect("proper prefix differs")
        );
        assert!(
            !reference
                .sequence_equal(from_iter(vec![1, 9, 3]))
                .await
                .expect("differing item")
        );
    }

    #[tokio::test]
    async fn sequence_equal_stops_at_the_first_mismatch() {
        let naturals = create(|producer| async move {
            let mut n = 0u64;
            loop {
                producer.yield_value(n).await?;
                n += 1;
            }
        });
        assert!(
            !from_iter(vec![0u64, 1, 99])
                .sequence_equal(naturals)
                .await
                .expect("mismatch on an infinite side")
        );
    }
}

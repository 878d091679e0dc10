//! The `concat` operator.

use std::sync::Arc;

use crate::sequence::{PushSequence, Sequence, create};

pub(crate) fn concat<T, S1, S2>(head: S1, tail: S2) -> PushSequence<T>
where
    T: Send + 'static,
    S1: Sequence<T> + Send + Sync + 'static,
    S2: Sequence<T> + Send + Sync + 'static,
{
    let head = Arc::new(head);
    let tail = Arc::new(tail);
    create(move |producer| {
        let head = Arc::clone(&head);
        let tail = Arc::clone(&tail);
        async move {
            super::pump(&*head, &producer).await?;
            super::pump(&*tail, &producer).await?;
            Ok(())
        }
    })
}

//! Boundary adapters between pull sequences and other sequence forms.

use futures_util::Stream;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::SequenceError;
use crate::sequence::{PushSequence, Sequence, create};

/// Lift an ordinary in-memory collection into a lazy pull sequence.
///
/// The source must be `Clone` because every iterator is an independent run.
pub fn from_iter<I, T>(source: I) -> PushSequence<T>
where
    I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
    I::IntoIter: Send,
    T: Send + 'static,
{
    create(move |producer| {
        let source = source.clone();
        async move {
            for item in source {
                producer.yield_value(item).await?;
            }
            Ok(())
        }
    })
}

/// Adapt a push-style event source (an mpsc receiver) into a pull sequence.
///
/// Items arrive whenever the sender side emits them, but are handed to the
/// consumer one at a time on demand; the channel's own capacity provides the
/// only buffering. A receiver can be consumed once, so this sequence supports
/// a single iteration; a second `create_iterator` run fails on first advance.
pub fn from_receiver<T: Send + 'static>(receiver: mpsc::Receiver<T>) -> PushSequence<T> {
    let receiver = Arc::new(Mutex::new(Some(receiver)));
    create(move |producer| {
        let receiver = Arc::clone(&receiver);
        async move {
            let Some(mut receiver) = receiver.lock().take() else {
                anyhow::bail!("a channel-backed sequence supports only a single iteration");
            };
            while let Some(item) = receiver.recv().await {
                producer.yield_value(item).await?;
            }
            Ok(())
        }
    })
}

/// Convert one run of a sequence into a [`Stream`].
///
/// The stream yields `Ok(item)` per element and ends after clean completion;
/// a fault is delivered as one final `Err` item. The iterator is disposed
/// when the stream ends either way. Dropping the stream mid-run abandons the
/// iterator, which cancels the producer on a best-effort basis.
pub fn into_stream<T, S>(sequence: S) -> impl Stream<Item = Result<T, SequenceError>>
where
    T: Send + 'static,
    S: Sequence<T> + Send + Sync + 'static,
{
    let iterator = sequence.create_iterator();
    futures_util::stream::unfold(Some(iterator), |state| async move {
        let mut iterator = state?;
        match iterator.move_next().await {
            Ok(true) => match iterator.current() {
                Some(item) => Some((Ok(item), Some(iterator))),
                None => {
                    let _ = iterator.dispose().await;
                    None
                }
            },
            Ok(false) => {
                iterator.dispose().await.err().map(|disposal| (Err(disposal), None))
            }
            Err(error) => {
                let error = match iterator.dispose().await {
                    Ok(()) => error,
                    Err(disposal) => SequenceError::Aggregate {
                        primary: error.into(),
                        disposal: Box::new(disposal),
                    },
                };
                Some((Err(error), None))
            }
        }
    })
}

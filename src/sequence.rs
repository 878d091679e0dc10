//! Sequence contracts and the factory.
//!
//! A [`Sequence`] is a recipe for runs: each [`Sequence::create_iterator`]
//! call starts an independent enumeration.
//! [`create`] is the composition root that wires a push-style production
//! routine into a fresh [`BridgeIterator`] per run; everything else in the
//! crate (operators, the driver loop, adapters) works purely through these
//! two traits.

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::bridge::{BridgeIterator, ProducerRoutine};
use crate::error::SequenceError;
use crate::producer::Producer;

/// Pull side of one enumeration run.
///
/// The contract mirrors classic iterator protocols: `move_next` suspends
/// until the next item is available and reports whether there is one;
/// `current` hands the item over. `dispose` must be called on every exit
/// path (the [driver loop](crate::drive) does this for you); it cancels the
/// producer, waits for it to unwind, and surfaces any fault the consumer
/// never observed.
#[async_trait]
pub trait PullIterator<T: Send + 'static>: Send {
    /// Advance to the next item. `Ok(true)` means `current` now holds it.
    ///
    /// After the sequence ends, faults, or is disposed, further calls return
    /// `Ok(false)`.
    ///
    /// Not cancel-safe: a pending `move_next` future must be polled to
    /// completion, not dropped (as a lost `tokio::select!` branch would).
    /// Dropping it mid-advance and calling `move_next` again can re-arm the
    /// advance signal while an item is still undelivered, which overwrites
    /// that item and breaks the producer/consumer alternation. Race an
    /// advance against a timer by wrapping the whole run instead, e.g. with
    /// [`into_stream`](crate::into_stream) and a stream timeout, and dispose
    /// on expiry.
    async fn move_next(&mut self) -> Result<bool, SequenceError>;

    /// Take the pending item.
    ///
    /// Returns `Some` exactly once after each `move_next` that returned
    /// `Ok(true)`; ownership of the item moves to the caller.
    fn current(&mut self) -> Option<T>;

    /// Tear the run down: cancel the producer, wake it if parked, and await
    /// its completion. Idempotent. Abandonment unwinds count as clean; any
    /// other producer fault not yet seen by the consumer is returned here.
    async fn dispose(&mut self) -> Result<(), SequenceError>;
}

/// A lazy pull sequence; each iterator is an independent run.
pub trait Sequence<T: Send + 'static>: Send + Sync {
    /// Start a new, not-yet-running enumeration of this sequence.
    fn create_iterator(&self) -> Box<dyn PullIterator<T>>;
}

impl<T: Send + 'static, S: Sequence<T> + ?Sized> Sequence<T> for Arc<S> {
    fn create_iterator(&self) -> Box<dyn PullIterator<T>> {
        (**self).create_iterator()
    }
}

/// A sequence backed by a push-style production routine.
///
/// Built with [`create`]; cheap to clone (the routine is shared).
pub struct PushSequence<T> {
    routine: ProducerRoutine<T>,
}

impl<T> Clone for PushSequence<T> {
    fn clone(&self) -> Self {
        Self {
            routine: Arc::clone(&self.routine),
        }
    }
}

impl<T: Send + 'static> Sequence<T> for PushSequence<T> {
    fn create_iterator(&self) -> Box<dyn PullIterator<T>> {
        Box::new(BridgeIterator::new(Arc::clone(&self.routine)))
    }
}

/// Build a sequence from a push-style production routine.
///
/// The routine receives a [`Producer`] handle and generates items by calling
/// [`Producer::yield_value`]; returning `Ok(())` ends the sequence cleanly,
/// returning any other error faults it. The routine is invoked once per
/// iterator, lazily, on the first `move_next`, inside a spawned tokio task;
/// iteration must therefore happen within a tokio runtime.
///
/// ```rust
/// use pullseq::{create, drive};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let squares = create(|producer| async move {
///     for n in 0..4u64 {
///         producer.yield_value(n * n).await?;
///     }
///     Ok(())
/// });
///
/// drive(&squares, |ctx| async move {
///     println!("#{}: {}", ctx.index, ctx.item);
///     Ok(())
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub fn create<T, F, Fut>(routine: F) -> PushSequence<T>
where
    T: Send + 'static,
    F: Fn(Producer<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    PushSequence {
        routine: Arc::new(move |producer| Box::pin(routine(producer))),
    }
}

/// The sequence with no items.
pub struct EmptySequence<T> {
    _marker: PhantomData<fn() -> T>,
}

/// An always-finished sequence of any item type.
pub fn empty<T: Send + 'static>() -> EmptySequence<T> {
    EmptySequence {
        _marker: PhantomData,
    }
}

struct EmptyIterator<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> Sequence<T> for EmptySequence<T> {
    fn create_iterator(&self) -> Box<dyn PullIterator<T>> {
        Box::new(EmptyIterator {
            _marker: PhantomData,
        })
    }
}

#[async_trait]
impl<T: Send + 'static> PullIterator<T> for EmptyIterator<T> {
    async fn move_next(&mut self) -> Result<bool, SequenceError> {
        Ok(false)
    }

    fn current(&mut self) -> Option<T> {
        None
    }

    async fn dispose(&mut self) -> Result<(), SequenceError> {
        Ok(())
    }
}

/// Type-erased view of a typed iterator.
///
/// Lets generic plumbing drive any iterator without knowing its element type:
/// items come out as `Box<dyn Any + Send>` and can be downcast at the edge.
pub struct ErasedIterator<T: Send + 'static> {
    inner: Box<dyn PullIterator<T>>,
}

impl<T: Send + 'static> ErasedIterator<T> {
    /// Wrap a typed iterator.
    pub fn new(inner: Box<dyn PullIterator<T>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Send + 'static> PullIterator<Box<dyn Any + Send>> for ErasedIterator<T> {
    async fn move_next(&mut self) -> Result<bool, SequenceError> {
        self.inner.move_next().await
    }

    fn current(&mut self) -> Option<Box<dyn Any + Send>> {
        self.inner
            .current()
            .map(|item| Box::new(item) as Box<dyn Any + Send>)
    }

    async fn dispose(&mut self) -> Result<(), SequenceError> {
        self.inner.dispose().await
    }
}

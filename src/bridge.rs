//! The producer/consumer bridge.
//!
//! A [`BridgeIterator`] turns a push-style production routine into a pull
//! iterator by ping-ponging control over two [`Rendezvous`] cells:
//! `request_next` (consumer to producer: "advance") and `value_ready`
//! (producer to consumer: "here is the next item", end of sequence, or a
//! fault). The production routine runs as a separate tokio task, but the
//! rendezvous discipline guarantees producer user code and consumer per-item
//! code never execute concurrently: at most one side is runnable at any
//! instant, and at most one item is ever in flight.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{SequenceError, is_abandonment};
use crate::producer::Producer;
use crate::rendezvous::Rendezvous;
use crate::sequence::PullIterator;

/// A production routine, boxed so one sequence can start any number of
/// independent runs.
pub(crate) type ProducerRoutine<T> =
    Arc<dyn Fn(Producer<T>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Diagnostic id seed; ids are opaque and only appear in trace output.
static NEXT_BRIDGE_ID: AtomicU64 = AtomicU64::new(1);

/// Outcome deposited into `value_ready` by the producer side.
pub(crate) enum Step {
    /// An item was written to the `current` slot.
    Value,
    /// The production routine finished (normally or by abandonment unwind).
    End,
    /// The production routine failed.
    Fault(SequenceError),
}

/// State shared between the consumer-side iterator and the producer task.
///
/// The producer task and the [`Producer`] handle only ever hold a [`Weak`] to
/// this; the iterator owns the sole long-lived [`Arc`]. Once the consumer
/// drops the iterator, the whole graph becomes reclaimable as soon as the
/// production routine observes cancellation and unwinds.
pub(crate) struct BridgeShared<T> {
    id: u64,
    request_next: Rendezvous<()>,
    value_ready: Rendezvous<Step>,
    current: Mutex<Option<T>>,
    disposed: AtomicBool,
    /// Set once the abandonment error has been handed to the routine; a
    /// later yield is a swallowed-cancellation bug, not a fresh abandonment.
    abandonment_delivered: AtomicBool,
    cancel: CancellationToken,
}

impl<T> BridgeShared<T> {
    fn new() -> Self {
        Self {
            id: NEXT_BRIDGE_ID.fetch_add(1, Ordering::Relaxed),
            request_next: Rendezvous::new(),
            value_ready: Rendezvous::new(),
            current: Mutex::new(None),
            disposed: AtomicBool::new(false),
            abandonment_delivered: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Deposit one item and park until the consumer requests the next one.
    ///
    /// Invoked by the [`Producer`] handle on behalf of user code.
    pub(crate) async fn yield_item(&self, value: T) -> Result<(), SequenceError> {
        if self.is_disposed() {
            if self.abandonment_delivered.swap(true, Ordering::AcqRel) {
                debug!(id = self.id, "producer yielded after abandonment");
                return Err(SequenceError::YieldAfterAbandonment);
            }
            return Err(SequenceError::Abandoned);
        }

        // The previous item was taken by the consumer before it asked for
        // this round, so the slot is empty here under the baton discipline.
        *self.current.lock() = Some(value);
        trace!(id = self.id, "producer: item ready");
        self.value_ready.signal(Step::Value);

        self.request_next.wait().await;

        if self.is_disposed() {
            trace!(id = self.id, "producer: woken by disposal, unwinding");
            self.abandonment_delivered.store(true, Ordering::Release);
            return Err(SequenceError::Abandoned);
        }
        Ok(())
    }

    /// Synchronous part of disposal: flip the flag, cancel, and wake a
    /// producer parked inside `yield_item`. Returns false if disposal had
    /// already begun.
    fn begin_dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        trace!(id = self.id, "disposing bridge");
        self.cancel.cancel();
        self.request_next.signal(());
        true
    }
}

/// Pull-side iterator over one run of a production routine.
///
/// Created by [`PushSequence::create_iterator`][crate::PushSequence]; the
/// production task is started lazily on the first `move_next`.
pub struct BridgeIterator<T> {
    shared: Arc<BridgeShared<T>>,
    routine: ProducerRoutine<T>,
    task: Option<JoinHandle<Result<(), SequenceError>>>,
    finished: bool,
}

impl<T: Send + 'static> BridgeIterator<T> {
    pub(crate) fn new(routine: ProducerRoutine<T>) -> Self {
        Self {
            shared: Arc::new(BridgeShared::new()),
            routine,
            task: None,
            finished: false,
        }
    }

    /// Spawn the producer wrapper task.
    ///
    /// The wrapper parks on `request_next` before touching user code, so a
    /// sequence that is never pulled never runs its routine. It holds only a
    /// weak reference to the bridge between rendezvous; the strong side lives
    /// in the iterator.
    fn spawn_producer(&self) -> JoinHandle<Result<(), SequenceError>> {
        let weak: Weak<BridgeShared<T>> = Arc::downgrade(&self.shared);
        let producer = Producer::new(Arc::downgrade(&self.shared), self.shared.cancel.clone());
        let routine_future = (*self.routine)(producer);
        let id = self.shared.id;

        tokio::spawn(async move {
            match weak.upgrade() {
                Some(shared) => {
                    shared.request_next.wait().await;
                    // A wake from disposal, not from an advance: the routine
                    // never starts.
                    if shared.is_disposed() {
                        trace!(id, "producer: disposed before first advance");
                        return Ok(());
                    }
                }
                // Consumer vanished before the first advance.
                None => return Ok(()),
            }

            trace!(id, "producer: routine started");
            let outcome = AssertUnwindSafe(routine_future).catch_unwind().await;

            let Some(shared) = weak.upgrade() else {
                return Ok(());
            };
            match outcome {
                Ok(Ok(())) => {
                    trace!(id, "producer: end of sequence");
                    shared.value_ready.signal(Step::End);
                    Ok(())
                }
                Ok(Err(error)) if is_abandonment(&error) => {
                    trace!(id, "producer: unwound after abandonment");
                    shared.value_ready.signal(Step::End);
                    Ok(())
                }
                Ok(Err(error)) => {
                    debug!(id, error = %error, "producer: routine faulted");
                    let fault = Arc::new(error);
                    shared
                        .value_ready
                        .signal(Step::Fault(SequenceError::Fault(Arc::clone(&fault))));
                    Err(SequenceError::Fault(fault))
                }
                Err(payload) => {
                    let fault = Arc::new(anyhow::anyhow!(
                        "production routine panicked: {}",
                        panic_message(payload.as_ref())
                    ));
                    debug!(id, error = %fault, "producer: routine panicked");
                    shared
                        .value_ready
                        .signal(Step::Fault(SequenceError::Fault(Arc::clone(&fault))));
                    Err(SequenceError::Fault(fault))
                }
            }
        })
    }

    /// Await the producer task, surfacing any fault it carried out.
    async fn drain_task(&mut self) -> Result<(), SequenceError> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        match task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(error),
            Err(join_error) => Err(SequenceError::fault(anyhow::Error::new(join_error))),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> PullIterator<T> for BridgeIterator<T> {
    async fn move_next(&mut self) -> Result<bool, SequenceError> {
        if self.finished || self.shared.is_disposed() {
            return Ok(false);
        }
        if self.task.is_none() {
            self.task = Some(self.spawn_producer());
        }

        trace!(id = self.shared.id, "consumer: advance");
        self.shared.request_next.signal(());
        match self.shared.value_ready.wait().await {
            Step::Value => Ok(true),
            Step::End => {
                self.finished = true;
                // Propagate a fault the wrapper may have carried past the
                // end-of-stream signal.
                self.drain_task().await?;
                Ok(false)
            }
            Step::Fault(error) => {
                self.finished = true;
                // The wrapper returns the same fault; the signalled copy is
                // the one we surface.
                let _ = self.drain_task().await;
                Err(error)
            }
        }
    }

    fn current(&mut self) -> Option<T> {
        self.shared.current.lock().take()
    }

    async fn dispose(&mut self) -> Result<(), SequenceError> {
        self.shared.begin_dispose();
        match self.drain_task().await {
            Ok(()) => Ok(()),
            Err(error) if error.is_abandonment() => Ok(()),
            Err(error) => Err(error),
        }
    }
}

impl<T> Drop for BridgeIterator<T> {
    fn drop(&mut self) {
        // Best-effort abandonment for consumers that never disposed: a
        // producer parked in yield_item still wakes, observes the flag and
        // unwinds. The detached task finishes on its own.
        self.shared.begin_dispose();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

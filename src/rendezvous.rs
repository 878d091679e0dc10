//! Single-slot rendezvous signal.
//!
//! A [`Rendezvous`] is the hand-off primitive underneath the bridge: one side
//! deposits exactly one result, the other side awaits it, and consuming the
//! result resets the slot for the next round. The same cell is reused for
//! every round-trip of a sequence; nothing is reallocated per item.
//!
//! Wake-ups always go through the stored task [`Waker`], which enqueues the
//! waiting task on the tokio run queue. The waiter's continuation is never run
//! inline in the signaller's call stack, so arbitrarily long sequences cannot
//! grow the stack one frame per item.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

/// A reusable single-slot synchronization cell.
///
/// Invariant: at any instant at most one of {pending result, parked waiter}
/// is present. The ping-pong discipline of the bridge guarantees that a new
/// result is never deposited before the previous one was consumed; the one
/// deliberate exception is the disposal wake-up, which may overwrite an
/// unconsumed advance request (both carry `()` and mean "wake up and look at
/// the disposed flag").
pub(crate) struct Rendezvous<R> {
    slot: Mutex<Slot<R>>,
}

struct Slot<R> {
    pending: Option<R>,
    waiter: Option<Waker>,
}

impl<R> Rendezvous<R> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                pending: None,
                waiter: None,
            }),
        }
    }

    /// Deposit a result and wake the waiter, if one is parked.
    ///
    /// The waiter is woken through its `Waker`, i.e. rescheduled by the
    /// runtime rather than called synchronously here.
    pub(crate) fn signal(&self, result: R) {
        let waker = {
            let mut slot = self.slot.lock();
            slot.pending = Some(result);
            slot.waiter.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Wait for the next deposited result, consuming it and resetting the
    /// slot for the following round.
    pub(crate) fn wait(&self) -> Wait<'_, R> {
        Wait { cell: self }
    }
}

/// Future returned by [`Rendezvous::wait`].
pub(crate) struct Wait<'a, R> {
    cell: &'a Rendezvous<R>,
}

impl<R> Future for Wait<'_, R> {
    type Output = R;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<R> {
        let mut slot = self.cell.slot.lock();
        match slot.pending.take() {
            Some(result) => {
                slot.waiter = None;
                Poll::Ready(result)
            }
            None => {
                slot.waiter = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn signal_before_wait_completes_immediately() {
        let cell = Rendezvous::new();
        cell.signal(7u32);
        assert_eq!(cell.wait().await, 7);
    }

    #[tokio::test]
    async fn wait_parks_until_signalled() {
        let cell = Arc::new(Rendezvous::new());
        let signaller = {
            let cell = Arc::clone(&cell);
            tokio::spawn(async move {
                // Let the waiter park first.
                tokio::task::yield_now().await;
                cell.signal("ready");
            })
        };
        assert_eq!(cell.wait().await, "ready");
        signaller.await.expect("signaller task");
    }

    #[tokio::test]
    async fn slot_resets_between_rounds() {
        let cell = Rendezvous::new();
        for round in 0..100u64 {
            cell.signal(round);
            assert_eq!(cell.wait().await, round);
        }
    }

    #[tokio::test]
    async fn later_signal_overwrites_unconsumed_wakeup() {
        // The disposal path may signal over a pending advance request.
        let cell = Rendezvous::new();
        cell.signal(1u8);
        cell.signal(2u8);
        assert_eq!(cell.wait().await, 2);
    }
}
